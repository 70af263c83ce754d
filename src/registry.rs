//! Name → creation key lookup
//!
//! Read-only view of how the Arrakeener class is registered: callers resolve a
//! human-readable name (versioned or version-independent) to the creation key
//! the factory serves, and back. Writing registrations is the installer's job
//! and lives outside this crate.

use uuid::Uuid;

use crate::core_types::{CLASS_DESCRIPTION, CLASS_ID, PROG_ID, VERSION_INDEPENDENT_PROG_ID};

/// One registered class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassEntry {
    pub class_id: Uuid,
    pub prog_id: &'static str,
    pub version_independent_prog_id: &'static str,
    pub description: &'static str,
    pub version: &'static str,
}

/// Every class this server exposes.
pub const CLASSES: &[ClassEntry] = &[ClassEntry {
    class_id: CLASS_ID,
    prog_id: PROG_ID,
    version_independent_prog_id: VERSION_INDEPENDENT_PROG_ID,
    description: CLASS_DESCRIPTION,
    version: "1.0",
}];

/// Resolve a name to its creation key. Names compare case-insensitively.
pub fn class_id_for(name: &str) -> Option<Uuid> {
    CLASSES
        .iter()
        .find(|c| {
            c.prog_id.eq_ignore_ascii_case(name)
                || c.version_independent_prog_id.eq_ignore_ascii_case(name)
        })
        .map(|c| c.class_id)
}

/// The versioned name registered for a creation key.
pub fn prog_id_for(class_id: &Uuid) -> Option<&'static str> {
    entry(class_id).map(|c| c.prog_id)
}

pub fn entry(class_id: &Uuid) -> Option<&'static ClassEntry> {
    CLASSES.iter().find(|c| c.class_id == *class_id)
}
