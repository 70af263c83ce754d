//! Arrakeener factory and reference-counted handles
//!
//! The factory is the only way to create a hosted instance. Each instance
//! owns one server hold, taken at creation and released when the last handle
//! to it goes away.
//!
//! # Reference counting
//!
//! A handle is an `Arc` around the instance, so `retain`/`release` are atomic
//! and independent of the engine's data lock. An operation in flight borrows
//! the handle it was called through, which keeps the count above zero; the
//! instance is therefore only destroyed after every in-flight call returned.

use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use crate::account::{Balances, ResourceAccount, TextField};
use crate::core_types::{Amount, CLASS_ID, InstanceId};
use crate::engine::{Arrakeener, ExchangeEngine};
use crate::error::ExchangeError;
use crate::lifecycle::{ServerHold, ServerLifetime};

const TARGET_LIFETIME: &str = "ARRAKIS::LIFETIME";

/// How the caller wants the new instance to be activated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Activation {
    /// A standalone instance with its own identity.
    #[default]
    Standalone,
    /// Composition inside an outer object. Not supported.
    Aggregated,
}

// ============================================================
// FACTORY
// ============================================================

/// Creates Arrakeener instances bound to one [`ServerLifetime`].
#[derive(Debug, Clone)]
pub struct ArrakeenerFactory {
    lifetime: Arc<ServerLifetime>,
}

impl ArrakeenerFactory {
    /// Creation key this factory serves.
    pub const CLASS_ID: Uuid = CLASS_ID;

    pub fn new(lifetime: Arc<ServerLifetime>) -> Self {
        Self { lifetime }
    }

    pub fn lifetime(&self) -> &Arc<ServerLifetime> {
        &self.lifetime
    }

    /// Standalone instance with freshly seeded balances.
    ///
    /// # Errors
    /// - `ServerStopping` if the server has already stopped
    pub fn create(&self) -> Result<ArrakeenerHandle, ExchangeError> {
        self.create_instance(Activation::Standalone)
    }

    /// # Errors
    /// - `ServerStopping` if the server has already stopped (checked first)
    /// - `AggregationUnsupported` for [`Activation::Aggregated`]
    pub fn create_instance(&self, activation: Activation) -> Result<ArrakeenerHandle, ExchangeError> {
        self.host(activation, ExchangeEngine::new)
    }

    /// Host a pre-built engine (fixed account, deterministic yields, ...).
    ///
    /// # Errors
    /// - `ServerStopping` if the server has already stopped
    pub fn create_with(&self, engine: ExchangeEngine) -> Result<ArrakeenerHandle, ExchangeError> {
        self.host(Activation::Standalone, move || engine)
    }

    /// Explicit external hold on the server (see [`ServerLifetime::lock_server`]).
    ///
    /// # Errors
    /// - `ServerStopping` if the server has already stopped
    pub fn lock_server(&self) -> Result<ServerHold, ExchangeError> {
        self.lifetime.lock_server()
    }

    fn host<F>(&self, activation: Activation, build: F) -> Result<ArrakeenerHandle, ExchangeError>
    where
        F: FnOnce() -> ExchangeEngine,
    {
        if self.lifetime.is_stopping() {
            return Err(ExchangeError::ServerStopping);
        }
        if activation == Activation::Aggregated {
            return Err(ExchangeError::AggregationUnsupported);
        }

        // The hold is the authoritative stop check: it races release atomically.
        let hold = self.lifetime.acquire()?;
        Ok(ArrakeenerHandle::adopt(build(), hold))
    }
}

// ============================================================
// HANDLE
// ============================================================

struct Instance {
    id: InstanceId,
    engine: ExchangeEngine,
    hold: ServerHold,
}

impl Drop for Instance {
    fn drop(&mut self) {
        tracing::debug!(target: TARGET_LIFETIME, instance = self.id, "instance destroyed");
    }
}

/// Reference-counted handle to one hosted instance.
///
/// `Clone` (or [`ArrakeenerHandle::retain`]) adds a reference to the *same*
/// instance. [`Arrakeener::clone_instance`] makes a new, independent one.
#[derive(Clone)]
pub struct ArrakeenerHandle {
    inner: Arc<Instance>,
}

impl ArrakeenerHandle {
    fn adopt(engine: ExchangeEngine, hold: ServerHold) -> Self {
        let id = hold.lifetime().next_instance_id();
        tracing::debug!(target: TARGET_LIFETIME, instance = id, holds = hold.lifetime().holds(), "instance created");
        Self {
            inner: Arc::new(Instance {
                id,
                engine,
                hold,
            }),
        }
    }

    /// Add a reference to this instance.
    pub fn retain(&self) -> Self {
        self.clone()
    }

    /// Drop this reference; the instance is destroyed with the last one.
    pub fn release(self) {
        drop(self);
    }

    /// Current reference count. Informational only: other threads may change
    /// it at any time.
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    pub fn id(&self) -> InstanceId {
        self.inner.id
    }

    /// Consistent copy of the whole account.
    pub fn snapshot(&self) -> ResourceAccount {
        self.inner.engine.snapshot()
    }

    /// True if both handles refer to the same instance.
    pub fn same_instance(&self, other: &ArrakeenerHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Arrakeener for ArrakeenerHandle {
    fn text(&self, field: TextField) -> String {
        self.inner.engine.text(field)
    }

    fn set_text(&self, field: TextField, value: Option<&str>) -> Result<(), ExchangeError> {
        self.inner.engine.set_text(field, value)
    }

    fn balances(&self) -> Balances {
        self.inner.engine.balances()
    }

    fn eat_spice(&self, units: Amount) -> Result<Amount, ExchangeError> {
        self.inner.engine.eat_spice(units)
    }

    fn sell_spice(&self, units: Amount) -> Result<Amount, ExchangeError> {
        self.inner.engine.sell_spice(units)
    }

    fn mine_spice(&self, harvesters: Amount) -> Result<Amount, ExchangeError> {
        self.inner.engine.mine_spice(harvesters)
    }

    /// Independent copy with its own lock, reference count and server hold.
    fn clone_instance(&self) -> Result<Self, ExchangeError> {
        let engine = self.inner.engine.clone_instance()?;
        let hold = self.inner.hold.duplicate();
        let ghola = Self::adopt(engine, hold);
        tracing::debug!(target: TARGET_LIFETIME, source = self.id(), instance = ghola.id(), "instance cloned");
        Ok(ghola)
    }
}

impl fmt::Debug for ArrakeenerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrakeenerHandle")
            .field("id", &self.inner.id)
            .field("ref_count", &self.ref_count())
            .field("engine", &self.inner.engine)
            .finish()
    }
}
