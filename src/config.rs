use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    /// Per-operation engine and lifetime events (`ARRAKIS::*` targets)
    pub enable_tracing: bool,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Hosting loop settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    /// Session script run at startup (overridden by `--script`)
    pub session_script: String,
    /// How long to wait for the shutdown signal once all sessions are done
    pub shutdown_grace_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            session_script: "fixtures/sessions.yaml".to_string(),
            shutdown_grace_ms: 5_000,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_dir: "./logs".to_string(),
            log_file: "arrakis.log".to_string(),
            use_json: false,
            rotation: "daily".to_string(),
            enable_tracing: false,
            server: ServerConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn load(env: &str) -> Result<Self> {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path))?;
        Self::parse(&content).with_context(|| format!("Failed to parse config yaml: {}", config_path))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }
}
