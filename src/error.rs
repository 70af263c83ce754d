//! Exchange Error Types
//!
//! Every failing call returns an [`ExchangeError`] directly. Callers that need
//! the structured record (source + description) ask the error for its
//! [`ErrorInfo`]; there is no separate "fetch last error" step.

use std::collections::TryReserveError;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core_types::PROG_ID;
use crate::safe_math::ArithmeticOverflow;

/// Error taxonomy.
///
/// The economic kinds (`InvalidArgument`, `InsufficientResource`,
/// `Overflow`) are expected and recoverable by retrying with corrected
/// arguments. The rest are rare policy or allocation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    InvalidArgument,
    InsufficientResource,
    Overflow,
    OutOfMemory,
    Unsupported,
    ServerStopping,
}

impl ErrorKind {
    /// Stable code for logs and reports
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::InvalidArgument => "INVALID_ARGUMENT",
            ErrorKind::InsufficientResource => "INSUFFICIENT_RESOURCE",
            ErrorKind::Overflow => "OVERFLOW",
            ErrorKind::OutOfMemory => "OUT_OF_MEMORY",
            ErrorKind::Unsupported => "UNSUPPORTED",
            ErrorKind::ServerStopping => "SERVER_STOPPING",
        }
    }

    /// True for the frequent, caller-recoverable kinds
    pub fn is_economic(&self) -> bool {
        matches!(
            self,
            ErrorKind::InvalidArgument | ErrorKind::InsufficientResource | ErrorKind::Overflow
        )
    }
}

/// Exchange error types
///
/// `Display` is the exact description handed to callers.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeError {
    // === Argument Errors ===
    #[error("Spice units must be greater than zero")]
    NonPositiveSpice,

    #[error("Cannot mine spice without a harvester")]
    NoHarvester,

    // === Resource Errors ===
    #[error("Insufficient spice")]
    InsufficientSpice,

    #[error("No energy")]
    NoEnergy,

    #[error("No solaris")]
    NoSolaris,

    #[error("Integer overflow")]
    Overflow,

    // === System Errors ===
    #[error("Out of memory")]
    OutOfMemory,

    #[error("Aggregation is not supported")]
    AggregationUnsupported,

    #[error("Server is stopping")]
    ServerStopping,
}

impl ExchangeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExchangeError::NonPositiveSpice | ExchangeError::NoHarvester => {
                ErrorKind::InvalidArgument
            }
            ExchangeError::InsufficientSpice | ExchangeError::NoEnergy | ExchangeError::NoSolaris => {
                ErrorKind::InsufficientResource
            }
            ExchangeError::Overflow => ErrorKind::Overflow,
            ExchangeError::OutOfMemory => ErrorKind::OutOfMemory,
            ExchangeError::AggregationUnsupported => ErrorKind::Unsupported,
            ExchangeError::ServerStopping => ErrorKind::ServerStopping,
        }
    }

    /// Get the error code for reports
    pub fn code(&self) -> &'static str {
        self.kind().code()
    }

    /// Structured failure record as seen by a remote caller
    pub fn info(&self) -> ErrorInfo {
        ErrorInfo {
            source: PROG_ID.to_string(),
            kind: self.kind(),
            description: self.to_string(),
        }
    }
}

impl From<ArithmeticOverflow> for ExchangeError {
    fn from(_: ArithmeticOverflow) -> Self {
        ExchangeError::Overflow
    }
}

impl From<TryReserveError> for ExchangeError {
    fn from(_: TryReserveError) -> Self {
        ExchangeError::OutOfMemory
    }
}

/// Structured failure record: who raised it and what went wrong.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub source: String,
    pub kind: ErrorKind,
    pub description: String,
}

impl From<ExchangeError> for ErrorInfo {
    fn from(e: ExchangeError) -> Self {
        e.info()
    }
}
