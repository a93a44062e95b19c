//! Enumeration types for the Resistance Cascade simulation.
//!
//! Every state tag the engine branches on is a closed enum so that adding
//! a variant forces every consumer to be updated.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Condition
// ---------------------------------------------------------------------------

/// The public stance of an actor.
///
/// Citizens move between `Support`, `Oppose`, `Active` and `Jailed`.
/// Security actors always report `Security`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum Condition {
    /// Publicly supports the regime.
    Support,
    /// Publicly opposes the regime without rebelling.
    Oppose,
    /// Actively rebels against the regime.
    Active,
    /// Arrested and serving a sentence; absent from the field.
    Jailed,
    /// A security officer.
    Security,
}

impl Condition {
    /// Stable lowercase label used in logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Support => "support",
            Self::Oppose => "oppose",
            Self::Active => "active",
            Self::Jailed => "jailed",
            Self::Security => "security",
        }
    }
}

impl core::fmt::Display for Condition {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// AgentKind
// ---------------------------------------------------------------------------

/// The type of an actor, used to index the scheduler.
///
/// Variant order is significant: the commit phase runs the `Citizen`
/// sub-phase before the `Security` sub-phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum AgentKind {
    /// A member of the population deciding its public stance.
    Citizen,
    /// A security officer that arrests visible dissidents.
    Security,
}

impl AgentKind {
    /// All kinds in commit order.
    pub const ALL: [Self; 2] = [Self::Citizen, Self::Security];
}

// ---------------------------------------------------------------------------
// MoveMode
// ---------------------------------------------------------------------------

/// Which adjacent cells an actor may step into.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub enum MoveMode {
    /// All eight surrounding cells.
    #[default]
    Moore,
    /// Only the four orthogonal cells.
    VonNeumann,
}

// ---------------------------------------------------------------------------
// RunState
// ---------------------------------------------------------------------------

/// Lifecycle of a whole simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum RunState {
    /// The simulation is still advancing.
    Running,
    /// Active plus jailed citizens reached the tipping point.
    RevolutionWon,
    /// The step counter exceeded the configured maximum.
    MaxIterationsReached,
}

impl RunState {
    /// Whether the run has ended.
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Running)
    }
}
