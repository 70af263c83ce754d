//! ENFORCED ACCOUNT TYPE - Used by ExchangeEngine
//!
//! The mutable record behind every Arrakeener: four descriptive strings and
//! three resource balances.
//!
//! # Enforcement Strategy:
//! 1. Fields are PRIVATE - no direct access
//! 2. Balances change only through `commit`, one whole-plan replacement
//! 3. Text changes go through fallible setters (allocation is reported)
//! 4. Increases are computed with `safe_math` BEFORE anything is committed

use serde::{Deserialize, Serialize};

use crate::core_types::{Amount, INITIAL_ENERGY, INITIAL_SOLARIS};
use crate::error::ExchangeError;
use crate::random::YieldSource;

/// The three resource balances, as one value.
///
/// Engines compute the next `Balances` from the current one and hand it to
/// [`ResourceAccount::commit`] in a single step, which is what makes every
/// operation all-or-nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balances {
    pub energy: Amount,
    pub solaris: Amount,
    pub spice: Amount,
}

impl Balances {
    #[inline(always)]
    pub const fn is_valid(&self) -> bool {
        self.energy >= 0 && self.solaris >= 0 && self.spice >= 0
    }
}

/// Descriptive text fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextField {
    FirstName,
    LastName,
    Affiliation,
    Occupation,
}

impl TextField {
    pub const ALL: [TextField; 4] = [
        TextField::FirstName,
        TextField::LastName,
        TextField::Affiliation,
        TextField::Occupation,
    ];
}

/// Resource account for a single Arrakeener
///
/// # Invariants (ENFORCED by private fields):
/// - energy >= 0, solaris >= 0, spice >= 0 after every completed operation
/// - No balance ever wraps: increases are checked before commit
/// - Absent text is stored as empty text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceAccount {
    first_name: String,  // PRIVATE - use text()/set_text()
    last_name: String,   // PRIVATE
    affiliation: String, // PRIVATE
    occupation: String,  // PRIVATE
    balances: Balances,  // PRIVATE - ONLY modified through commit()
}

impl ResourceAccount {
    /// New account with freshly drawn starting balances:
    /// energy in [1, 100], solaris in [200000, 400000], no spice, empty text.
    pub fn seeded(yields: &mut dyn YieldSource) -> Self {
        let energy = yields.draw(INITIAL_ENERGY);
        let solaris = yields.draw(INITIAL_SOLARIS);
        Self {
            balances: Balances {
                energy,
                solaris,
                spice: 0,
            },
            ..Default::default()
        }
    }

    /// Account with explicit starting balances and empty text.
    ///
    /// # Errors
    /// - "Balances must not be negative" if any balance is below zero
    pub fn with_balances(
        energy: Amount,
        solaris: Amount,
        spice: Amount,
    ) -> Result<Self, &'static str> {
        let balances = Balances {
            energy,
            solaris,
            spice,
        };
        if !balances.is_valid() {
            return Err("Balances must not be negative");
        }
        Ok(Self {
            balances,
            ..Default::default()
        })
    }

    // ============================================================
    // READ-ONLY GETTERS
    // ============================================================

    #[inline(always)]
    pub const fn balances(&self) -> Balances {
        self.balances
    }

    #[inline(always)]
    pub const fn energy(&self) -> Amount {
        self.balances.energy
    }

    #[inline(always)]
    pub const fn solaris(&self) -> Amount {
        self.balances.solaris
    }

    #[inline(always)]
    pub const fn spice(&self) -> Amount {
        self.balances.spice
    }

    pub fn text(&self, field: TextField) -> &str {
        match field {
            TextField::FirstName => &self.first_name,
            TextField::LastName => &self.last_name,
            TextField::Affiliation => &self.affiliation,
            TextField::Occupation => &self.occupation,
        }
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn affiliation(&self) -> &str {
        &self.affiliation
    }

    pub fn occupation(&self) -> &str {
        &self.occupation
    }

    // ============================================================
    // VALIDATED MUTATIONS
    // ============================================================

    /// Replace a text field. `None` resets it to empty.
    ///
    /// # Errors
    /// - `OutOfMemory` if the copy cannot be allocated; the field is unchanged
    pub fn set_text(&mut self, field: TextField, value: Option<&str>) -> Result<(), ExchangeError> {
        let copy = copy_text(value.unwrap_or_default())?;
        let slot = match field {
            TextField::FirstName => &mut self.first_name,
            TextField::LastName => &mut self.last_name,
            TextField::Affiliation => &mut self.affiliation,
            TextField::Occupation => &mut self.occupation,
        };
        *slot = copy;
        Ok(())
    }

    /// Replace all three balances at once.
    ///
    /// Callers validate and compute `next` up front from the current
    /// balances; a plan with a negative balance is a logic error.
    #[inline]
    pub fn commit(&mut self, next: Balances) {
        debug_assert!(next.is_valid(), "commit would break invariants: {next:?}");
        self.balances = next;
    }

    /// Deep copy that reports allocation failure instead of aborting.
    ///
    /// # Errors
    /// - `OutOfMemory` if any text copy cannot be allocated
    pub fn try_clone(&self) -> Result<Self, ExchangeError> {
        Ok(Self {
            first_name: copy_text(&self.first_name)?,
            last_name: copy_text(&self.last_name)?,
            affiliation: copy_text(&self.affiliation)?,
            occupation: copy_text(&self.occupation)?,
            balances: self.balances,
        })
    }
}

fn copy_text(value: &str) -> Result<String, ExchangeError> {
    let mut out = String::new();
    out.try_reserve_exact(value.len())?;
    out.push_str(value);
    Ok(out)
}

// ============================================================
// TESTS - Prove enforcement works
// ============================================================
