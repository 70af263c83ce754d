//! Session scripts - load YAML command lists and drive them against an
//! Arrakeener.
//!
//! # Script format
//!
//! ```yaml
//! sessions:
//!   - name: paul
//!     commands:
//!       - { op: set, field: first_name, value: Paul }
//!       - { op: mine_spice, harvesters: 1 }
//!       - { op: sell_spice, units: 1 }
//! ```

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::engine::Arrakeener;
use crate::error::ExchangeError;
use crate::messages::{Command, Outcome, Property, Reply};

const TARGET_SESSION: &str = "ARRAKIS::SESSION";

/// A whole script: one session per instance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionScript {
    #[serde(default)]
    pub sessions: Vec<SessionSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSpec {
    pub name: String,
    #[serde(default)]
    pub commands: Vec<Command>,
}

/// What one session did, in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    pub session: String,
    pub outcomes: Vec<Outcome>,
}

impl SessionReport {
    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_ok()).count()
    }
}

/// Load a session script from a YAML file.
pub fn load_script(path: impl AsRef<Path>) -> Result<SessionScript> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read session script: {}", path.display()))?;
    parse_script(&content).with_context(|| format!("Invalid session script: {}", path.display()))
}

pub fn parse_script(content: &str) -> Result<SessionScript> {
    Ok(serde_yaml::from_str(content)?)
}

/// Execute one command.
pub fn dispatch<A: Arrakeener>(target: &A, command: &Command) -> Result<Reply, ExchangeError> {
    match command {
        Command::Get { property } => Ok(match property.text_field() {
            Some(field) => Reply::Text(target.text(field)),
            None => {
                let balances = target.balances();
                Reply::Amount(match property {
                    Property::Energy => balances.energy,
                    Property::Solaris => balances.solaris,
                    _ => balances.spice,
                })
            }
        }),
        Command::Set { field, value } => {
            target.set_text(*field, value.as_deref())?;
            Ok(Reply::Done)
        }
        Command::EatSpice { units } => target.eat_spice(*units).map(Reply::Amount),
        Command::SellSpice { units } => target.sell_spice(*units).map(Reply::Amount),
        Command::MineSpice { harvesters } => target.mine_spice(*harvesters).map(Reply::Amount),
    }
}

/// Execute every command in order. A failing command never stops the session.
pub fn run_session<A: Arrakeener>(name: &str, target: &A, commands: &[Command]) -> SessionReport {
    let outcomes: Vec<Outcome> = commands
        .iter()
        .map(|command| Outcome::new(command.clone(), dispatch(target, command)))
        .collect();

    let report = SessionReport {
        session: name.to_string(),
        outcomes,
    };
    tracing::info!(
        target: TARGET_SESSION,
        session = name,
        commands = commands.len(),
        failures = report.failures(),
        "session finished"
    );
    report
}
