//! Messages - one remote call and its outcome, as data
//!
//! These records are what a transport would marshal: a [`Command`] names an
//! operation on one Arrakeener plus its arguments, and an [`Outcome`] carries
//! either the [`Reply`] or the structured [`ErrorInfo`].
//!
//! # Message Flow
//!
//! ```text
//! Script/Transport → Command → session::dispatch → Arrakeener → Outcome
//!                                                      ↓
//!                                        Reply  |  ErrorInfo (source + description)
//! ```

use serde::{Deserialize, Serialize};

use crate::account::TextField;
use crate::core_types::Amount;
use crate::error::{ErrorInfo, ExchangeError};

// ============================================================
// PROPERTIES
// ============================================================

/// Every readable property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Property {
    FirstName,
    LastName,
    Affiliation,
    Occupation,
    Energy,
    Solaris,
    Spice,
}

impl Property {
    /// The text field behind this property, if it is one.
    pub fn text_field(&self) -> Option<TextField> {
        match self {
            Property::FirstName => Some(TextField::FirstName),
            Property::LastName => Some(TextField::LastName),
            Property::Affiliation => Some(TextField::Affiliation),
            Property::Occupation => Some(TextField::Occupation),
            Property::Energy | Property::Solaris | Property::Spice => None,
        }
    }
}

// ============================================================
// COMMANDS (caller → Arrakeener)
// ============================================================

/// One call against an Arrakeener.
///
/// Only text properties are settable; resources change through the three
/// economic operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    Get {
        property: Property,
    },
    Set {
        field: TextField,
        #[serde(default)]
        value: Option<String>,
    },
    EatSpice {
        units: Amount,
    },
    SellSpice {
        units: Amount,
    },
    MineSpice {
        harvesters: Amount,
    },
}

// ============================================================
// REPLIES (Arrakeener → caller)
// ============================================================

/// Successful result of a [`Command`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reply {
    /// Setter completed
    Done,
    /// Text property value
    Text(String),
    /// Resource value, or the delta gained by an economic operation
    Amount(Amount),
}

/// A command paired with what came back.
///
/// Exactly one of `reply` / `error` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub command: Command,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply: Option<Reply>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

impl Outcome {
    pub fn new(command: Command, result: Result<Reply, ExchangeError>) -> Self {
        match result {
            Ok(reply) => Self {
                command,
                reply: Some(reply),
                error: None,
            },
            Err(e) => Self {
                command,
                reply: None,
                error: Some(e.into()),
            },
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// The amount an economic operation returned; zero when it failed.
    pub fn amount(&self) -> Amount {
        match self.reply {
            Some(Reply::Amount(v)) => v,
            _ => 0,
        }
    }
}
