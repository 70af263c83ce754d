//! Arrakis - Spice Exchange Server
//!
//! Hosting loop. Architecture:
//!
//! ```text
//! ┌──────────┐    ┌──────────┐    ┌────────────┐    ┌──────────┐
//! │  Config  │───▶│ Factory  │───▶│  Sessions  │───▶│  Report  │
//! │  (YAML)  │    │(Lifetime)│    │ (Engines)  │    │  (JSON)  │
//! └──────────┘    └──────────┘    └────────────┘    └──────────┘
//!                       ▲                │
//!                       └── last release ┘ → shutdown signal
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use arrakis::VERSION_INDEPENDENT_PROG_ID;
use arrakis::config::AppConfig;
use arrakis::factory::ArrakeenerFactory;
use arrakis::lifecycle::ServerLifetime;
use arrakis::registry;
use arrakis::session::{SessionReport, load_script, run_session};

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

/// Get session script override from command line (--script argument)
fn get_script_override() -> Option<String> {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if args[i] == "--script" && i + 1 < args.len() {
            return Some(args[i + 1].clone());
        }
    }
    None
}

#[tokio::main]
async fn main() -> Result<()> {
    let env = get_env();
    let app_config = AppConfig::load(&env)?;
    let _log_guard = arrakis::logging::init_logging(&app_config);

    tracing::info!(
        "Starting Arrakis server ({}) in {} mode",
        env!("GIT_HASH"),
        env
    );

    let script_path =
        get_script_override().unwrap_or_else(|| app_config.server.session_script.clone());
    let script = load_script(&script_path)?;
    if script.sessions.is_empty() {
        tracing::warn!("No sessions in {}, nothing to host", script_path);
        return Ok(());
    }

    let lifetime = Arc::new(ServerLifetime::new());
    let factory = ArrakeenerFactory::new(Arc::clone(&lifetime));
    let served = registry::class_id_for(VERSION_INDEPENDENT_PROG_ID)
        .filter(|id| *id == ArrakeenerFactory::CLASS_ID)
        .and_then(|id| registry::entry(&id));
    if let Some(class) = served {
        tracing::info!(
            class_id = %class.class_id,
            prog_id = class.prog_id,
            "Serving {} for {} sessions",
            class.description,
            script.sessions.len()
        );
    }

    // Hold the server while instances are created so an early finisher
    // cannot signal shutdown before the rest exist.
    let startup = factory.lock_server()?;
    let mut tasks = Vec::with_capacity(script.sessions.len());
    for session in script.sessions {
        let handle = factory
            .create()
            .with_context(|| format!("Failed to create instance for session {}", session.name))?;
        tracing::info!(session = %session.name, instance = handle.id(), "session started");
        tasks.push(tokio::task::spawn_blocking(move || {
            run_session(&session.name, &handle, &session.commands)
        }));
    }
    drop(startup);

    let mut reports: Vec<SessionReport> = Vec::with_capacity(tasks.len());
    for task in tasks {
        reports.push(task.await.context("Session task panicked")?);
    }
    for report in &reports {
        println!("{}", serde_json::to_string_pretty(report)?);
    }

    let grace = Duration::from_millis(app_config.server.shutdown_grace_ms);
    match tokio::time::timeout(grace, lifetime.stopped()).await {
        Ok(()) => tracing::info!("All instances released, server stopped"),
        Err(_) => tracing::warn!(
            holds = lifetime.holds(),
            "Shutdown signal not raised within {:?}",
            grace
        ),
    }

    Ok(())
}
