//! Arrakis - Spice Exchange Server
//!
//! Hosts "Arrakeener" accounts: four descriptive strings plus energy, solaris
//! and spice balances, traded through three randomized, overflow-checked
//! operations. Instances are reference counted and keep the server alive;
//! releasing the last one signals shutdown.
//!
//! # Modules
//!
//! - [`core_types`] - Amount alias, yield ranges, identity constants
//! - [`random`] - Randomized yields (entropy-seeded or scripted)
//! - [`safe_math`] - Overflow-checked add/multiply
//! - [`account`] - Enforced account type
//! - [`error`] - Error taxonomy and structured error records
//! - [`engine`] - Guarded account + eat/sell/mine/clone
//! - [`lifecycle`] - Process-wide holds and shutdown signal
//! - [`factory`] - Instance creation and reference-counted handles
//! - [`registry`] - Name → creation key lookup
//! - [`messages`] - Commands, replies and outcomes as data
//! - [`session`] - YAML session scripts
//! - [`config`] / [`logging`] - Ambient configuration and tracing setup

// Core types - must be first!
pub mod core_types;

// Exchange components
pub mod account;
pub mod engine;
pub mod error;
pub mod random;
pub mod safe_math;

// Hosting
pub mod factory;
pub mod lifecycle;
pub mod messages;
pub mod registry;
pub mod session;

// Ambient
pub mod config;
pub mod logging;

// Convenient re-exports at crate root
pub use account::{Balances, ResourceAccount, TextField};
pub use core_types::{Amount, CLASS_ID, InstanceId, PROG_ID, VERSION_INDEPENDENT_PROG_ID};
pub use engine::{Arrakeener, ExchangeEngine};
pub use error::{ErrorInfo, ErrorKind, ExchangeError};
pub use factory::{Activation, ArrakeenerFactory, ArrakeenerHandle};
pub use lifecycle::{ServerHold, ServerLifetime};
pub use messages::{Command, Outcome, Property, Reply};
pub use random::{RandomYield, ScriptedYield, YieldSource};
