//! Core types used throughout the system
//!
//! Type aliases, yield ranges, and the identity constants an Arrakeener is
//! known by.

use uuid::Uuid;

/// Amount of any resource (energy, solaris, spice) or a count of units.
///
/// Signed 64-bit on purpose: callers may pass non-positive counts, which are
/// rejected as invalid arguments rather than being unrepresentable.
pub type Amount = i64;

/// Instance ID - assigned by the lifetime coordinator, used for logging only.
pub type InstanceId = u64;

/// Versioned human-readable name. Also the `source` of every error record.
pub const PROG_ID: &str = "Arrakis.Arrakeener.1";

/// Version-independent human-readable name.
pub const VERSION_INDEPENDENT_PROG_ID: &str = "Arrakis.Arrakeener";

/// Human-readable description of the class.
pub const CLASS_DESCRIPTION: &str = "Person of Arrakis";

/// Opaque creation key the registry resolves names to.
pub const CLASS_ID: Uuid = uuid::uuid!("FDB559CB-A723-11EC-B743-DC41A9695036");

// ============================================================
// YIELD RANGES
// ============================================================

/// Inclusive range a randomized yield or cost is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YieldRange {
    pub low: Amount,
    pub high: Amount,
}

impl YieldRange {
    pub const fn new(low: Amount, high: Amount) -> Self {
        Self { low, high }
    }

    #[inline(always)]
    pub const fn contains(&self, value: Amount) -> bool {
        value >= self.low && value <= self.high
    }
}

/// Energy seeded into a new account.
pub const INITIAL_ENERGY: YieldRange = YieldRange::new(1, 100);

/// Solaris seeded into a new account.
pub const INITIAL_SOLARIS: YieldRange = YieldRange::new(200_000, 400_000);

/// Energy gained per unit of spice eaten.
pub const ENERGY_PER_SPICE: YieldRange = YieldRange::new(1, 100);

/// Solaris gained per unit of spice sold.
pub const SOLARIS_PER_SPICE: YieldRange = YieldRange::new(200_000, 700_000);

/// Energy cost of one mining attempt, independent of harvester count.
pub const MINING_ENERGY_COST: YieldRange = YieldRange::new(1, 10);

/// Solaris cost per harvester.
pub const SOLARIS_PER_HARVESTER: YieldRange = YieldRange::new(100_000, 200_000);

/// Spice gained per harvester.
pub const SPICE_PER_HARVESTER: YieldRange = YieldRange::new(1, 50);
