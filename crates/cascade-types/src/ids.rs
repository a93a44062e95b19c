//! Type-safe identifier wrappers.
//!
//! Actors receive sequential numeric identifiers at creation so that a
//! seeded run assigns the same ids every time. Runs themselves are tagged
//! with a UUID v7 ([`RunId`]) for log correlation; the run id never feeds
//! into the simulation's random stream.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Unique identifier for an actor (Citizen or Security) in the simulation.
///
/// Identifiers are immutable once assigned and are handed out in creation
/// order starting at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct AgentId(pub u64);

impl AgentId {
    /// Wrap a raw identifier value.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Return the inner numeric value.
    pub const fn into_inner(self) -> u64 {
        self.0
    }

    /// Return the identifier that follows this one, or `None` on overflow.
    pub fn next(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }
}

impl core::fmt::Display for AgentId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "agent-{}", self.0)
    }
}

impl From<u64> for AgentId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

/// Unique identifier for a single simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RunId(pub Uuid);

impl RunId {
    /// Create a new run identifier using UUID v7 (time-ordered).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Return the inner [`Uuid`] value.
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for RunId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}
