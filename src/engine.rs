//! Exchange Engine - guarded Arrakeener state and its economic operations
//!
//! The engine handles:
//! 1. Serializing every read and write of one account behind one lock
//! 2. Converting spice into energy (eat) or solaris (sell)
//! 3. Mining spice with harvesters, paid for in energy and solaris
//! 4. Deep-copying the account into a brand-new, independently locked engine
//!
//! # Validation
//!
//! Each operation first computes the complete next set of balances from the
//! current one (a *plan*), checking arguments, sufficiency and overflow in a
//! fixed order. Only a plan that passes every check is committed, so a failed
//! call leaves the account byte-for-byte unchanged.

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::account::{Balances, ResourceAccount, TextField};
use crate::core_types::{
    Amount, ENERGY_PER_SPICE, MINING_ENERGY_COST, SOLARIS_PER_HARVESTER, SOLARIS_PER_SPICE,
    SPICE_PER_HARVESTER, YieldRange,
};
use crate::error::ExchangeError;
use crate::random::{RandomYield, YieldSource};
use crate::safe_math::{checked_add, checked_multiply};

// Logging target (silenced unless `enable_tracing` is set)
const TARGET_ENGINE: &str = "ARRAKIS::ENGINE";

// ============================================================
// ARRAKEENER INTERFACE
// ============================================================

/// The statically typed surface of an Arrakeener.
///
/// Implemented by [`ExchangeEngine`] itself and by the reference-counted
/// [`ArrakeenerHandle`](crate::factory::ArrakeenerHandle) callers hold.
pub trait Arrakeener: Sized {
    /// Current value of a text field.
    fn text(&self, field: TextField) -> String;

    /// Replace a text field; `None` resets it to empty.
    ///
    /// # Errors
    /// `OutOfMemory` if the new value cannot be allocated.
    fn set_text(&self, field: TextField, value: Option<&str>) -> Result<(), ExchangeError>;

    /// All three balances, read under one lock acquisition.
    fn balances(&self) -> Balances;

    /// Eat `units` of spice, returning the energy gained.
    ///
    /// # Errors
    /// - `NonPositiveSpice` if `units < 1`
    /// - `InsufficientSpice` if the account holds fewer than `units`
    /// - `Overflow` if the gain or the new energy balance overflows
    fn eat_spice(&self, units: Amount) -> Result<Amount, ExchangeError>;

    /// Sell `units` of spice, returning the solaris gained.
    ///
    /// # Errors
    /// Same as [`Arrakeener::eat_spice`], applied to solaris.
    fn sell_spice(&self, units: Amount) -> Result<Amount, ExchangeError>;

    /// Mine with `harvesters`, returning the spice gained.
    ///
    /// # Errors
    /// - `NoHarvester` if `harvesters < 1`
    /// - `NoEnergy` if energy is below the drawn mining cost
    /// - `Overflow` if the solaris cost or spice gain overflows
    /// - `NoSolaris` if solaris is below the solaris cost
    /// - `Overflow` if the new spice balance overflows
    fn mine_spice(&self, harvesters: Amount) -> Result<Amount, ExchangeError>;

    /// Deep copy into a new, independent instance.
    ///
    /// # Errors
    /// `OutOfMemory` only.
    fn clone_instance(&self) -> Result<Self, ExchangeError>;

    // ------------------------------------------------------------
    // Named accessors
    // ------------------------------------------------------------

    fn first_name(&self) -> String {
        self.text(TextField::FirstName)
    }

    fn set_first_name(&self, value: Option<&str>) -> Result<(), ExchangeError> {
        self.set_text(TextField::FirstName, value)
    }

    fn last_name(&self) -> String {
        self.text(TextField::LastName)
    }

    fn set_last_name(&self, value: Option<&str>) -> Result<(), ExchangeError> {
        self.set_text(TextField::LastName, value)
    }

    fn affiliation(&self) -> String {
        self.text(TextField::Affiliation)
    }

    fn set_affiliation(&self, value: Option<&str>) -> Result<(), ExchangeError> {
        self.set_text(TextField::Affiliation, value)
    }

    fn occupation(&self) -> String {
        self.text(TextField::Occupation)
    }

    fn set_occupation(&self, value: Option<&str>) -> Result<(), ExchangeError> {
        self.set_text(TextField::Occupation, value)
    }

    fn energy(&self) -> Amount {
        self.balances().energy
    }

    fn solaris(&self) -> Amount {
        self.balances().solaris
    }

    fn spice(&self) -> Amount {
        self.balances().spice
    }
}

// ============================================================
// EXCHANGE ENGINE
// ============================================================

struct EngineState {
    account: ResourceAccount,
    yields: Box<dyn YieldSource>,
}

/// One account plus the lock that guards it.
///
/// Engines never share state: two engines never contend, and a clone gets its
/// own account, lock and yield source.
pub struct ExchangeEngine {
    state: Mutex<EngineState>,
}

impl ExchangeEngine {
    /// New engine with a freshly seeded account and an entropy-seeded source.
    pub fn new() -> Self {
        Self::with_source(Box::new(RandomYield::from_entropy()))
    }

    /// New engine whose starting balances and later yields come from `yields`.
    pub fn with_source(mut yields: Box<dyn YieldSource>) -> Self {
        let account = ResourceAccount::seeded(yields.as_mut());
        Self::from_account(account, yields)
    }

    /// Host an existing account.
    pub fn from_account(account: ResourceAccount, yields: Box<dyn YieldSource>) -> Self {
        Self {
            state: Mutex::new(EngineState { account, yields }),
        }
    }

    /// Consistent copy of the whole account.
    pub fn snapshot(&self) -> ResourceAccount {
        self.lock().account.clone()
    }

    // The guarded state is only mutated through whole-plan commits, so a
    // panic on another thread can never leave it half-written.
    fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run one economic operation: plan against the current balances under
    /// the lock, commit on success, leave everything untouched on failure.
    fn exchange<F>(&self, op: &'static str, amount: Amount, plan: F) -> Result<Amount, ExchangeError>
    where
        F: FnOnce(Balances, &mut dyn YieldSource) -> Result<(Balances, Amount), ExchangeError>,
    {
        let mut guard = self.lock();
        let EngineState { account, yields } = &mut *guard;

        match plan(account.balances(), yields.as_mut()) {
            Ok((next, delta)) => {
                account.commit(next);
                tracing::debug!(
                    target: TARGET_ENGINE,
                    op,
                    amount,
                    delta,
                    energy = next.energy,
                    solaris = next.solaris,
                    spice = next.spice,
                    "committed"
                );
                Ok(delta)
            }
            Err(e) => {
                tracing::debug!(target: TARGET_ENGINE, op, amount, code = e.code(), "rejected: {}", e);
                Err(e)
            }
        }
    }
}

impl Default for ExchangeEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ExchangeEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.state.try_lock() {
            Ok(state) => f
                .debug_struct("ExchangeEngine")
                .field("account", &state.account)
                .finish(),
            Err(_) => f.write_str("ExchangeEngine { <locked> }"),
        }
    }
}

impl Arrakeener for ExchangeEngine {
    fn text(&self, field: TextField) -> String {
        self.lock().account.text(field).to_string()
    }

    fn set_text(&self, field: TextField, value: Option<&str>) -> Result<(), ExchangeError> {
        self.lock().account.set_text(field, value)
    }

    fn balances(&self) -> Balances {
        self.lock().account.balances()
    }

    fn eat_spice(&self, units: Amount) -> Result<Amount, ExchangeError> {
        self.exchange("eat_spice", units, |balances, yields| {
            plan_conversion(balances, yields, units, ENERGY_PER_SPICE, |b| &mut b.energy)
        })
    }

    fn sell_spice(&self, units: Amount) -> Result<Amount, ExchangeError> {
        self.exchange("sell_spice", units, |balances, yields| {
            plan_conversion(balances, yields, units, SOLARIS_PER_SPICE, |b| &mut b.solaris)
        })
    }

    fn mine_spice(&self, harvesters: Amount) -> Result<Amount, ExchangeError> {
        self.exchange("mine_spice", harvesters, |balances, yields| {
            plan_mining(balances, yields, harvesters)
        })
    }

    fn clone_instance(&self) -> Result<Self, ExchangeError> {
        let account = self.lock().account.try_clone()?;
        Ok(Self::from_account(
            account,
            Box::new(RandomYield::from_entropy()),
        ))
    }
}

// ============================================================
// PLANS
// ============================================================

/// Spice → `target` resource at a randomized per-unit `rate`.
///
/// # Order:
/// 1. units < 1 → NonPositiveSpice
/// 2. spice < units → InsufficientSpice
/// 3. rate * units overflows → Overflow
/// 4. target + gain overflows → Overflow
fn plan_conversion(
    balances: Balances,
    yields: &mut dyn YieldSource,
    units: Amount,
    rate: YieldRange,
    target: fn(&mut Balances) -> &mut Amount,
) -> Result<(Balances, Amount), ExchangeError> {
    if units < 1 {
        return Err(ExchangeError::NonPositiveSpice);
    }
    if balances.spice < units {
        return Err(ExchangeError::InsufficientSpice);
    }

    let gain = checked_multiply(yields.draw(rate), units)?;

    let mut next = balances;
    let slot = target(&mut next);
    *slot = checked_add(*slot, gain)?;
    next.spice -= units; // Cannot underflow: checked above

    Ok((next, gain))
}

/// Harvesters → spice, paid in energy and solaris.
///
/// The energy cost is a single draw regardless of harvester count; the
/// solaris cost and spice gain scale with harvesters.
///
/// # Order:
/// 1. harvesters < 1 → NoHarvester
/// 2. energy < cost → NoEnergy
/// 3. solaris cost or spice gain overflows → Overflow
/// 4. solaris < solaris cost → NoSolaris
/// 5. spice + gain overflows → Overflow
fn plan_mining(
    balances: Balances,
    yields: &mut dyn YieldSource,
    harvesters: Amount,
) -> Result<(Balances, Amount), ExchangeError> {
    if harvesters < 1 {
        return Err(ExchangeError::NoHarvester);
    }

    let energy_cost = yields.draw(MINING_ENERGY_COST);
    if balances.energy < energy_cost {
        return Err(ExchangeError::NoEnergy);
    }

    let solaris_cost = checked_multiply(yields.draw(SOLARIS_PER_HARVESTER), harvesters)?;
    let spice_gain = checked_multiply(yields.draw(SPICE_PER_HARVESTER), harvesters)?;

    if balances.solaris < solaris_cost {
        return Err(ExchangeError::NoSolaris);
    }

    let next = Balances {
        energy: balances.energy - energy_cost,
        solaris: balances.solaris - solaris_cost,
        spice: checked_add(balances.spice, spice_gain)?,
    };

    Ok((next, spice_gain))
}
