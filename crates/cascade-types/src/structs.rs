//! Core value types and reporting records.
//!
//! [`AgentRecord`] and [`ModelReport`] are the read-only surface handed to
//! reporting collaborators after every step. Every quantity is a plain
//! named field so a reporter never has to recompute anything. Quantities
//! that do not apply to an actor kind are `None` rather than a sentinel.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{AgentKind, Condition, RunState};
use crate::ids::AgentId;

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// An integer cell coordinate on the toroidal field.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub struct Position {
    /// Column, `0..width`.
    pub x: u32,
    /// Row, `0..height`.
    pub y: u32,
}

impl Position {
    /// Create a position from its coordinates.
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

impl core::fmt::Display for Position {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

// ---------------------------------------------------------------------------
// AgentRecord
// ---------------------------------------------------------------------------

/// Per-actor snapshot of state and derived decision quantities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct AgentRecord {
    /// Actor identifier.
    pub id: AgentId,
    /// Actor kind.
    pub kind: AgentKind,
    /// Current cell, `None` while jailed.
    pub position: Option<Position>,
    /// Committed public condition.
    pub condition: Condition,
    /// Innate disposition toward the regime (negative = opposed).
    pub private_preference: f64,
    /// Opinion from the latest decide phase.
    pub opinion: Option<f64>,
    /// `sigmoid(opinion)` from the latest decide phase.
    pub activation: Option<f64>,
    /// Perception noise magnitude.
    pub epsilon: Option<f64>,
    /// `sigmoid(epsilon)`.
    pub epsilon_probability: Option<f64>,
    /// Threshold for public opposition.
    pub oppose_threshold: Option<f64>,
    /// Threshold for active rebellion.
    pub active_threshold: Option<f64>,
    /// Steps remaining in jail.
    pub jail_sentence: Option<u32>,
    /// Active citizens in vision, self included.
    pub actives_in_vision: Option<u32>,
    /// Opposing citizens in vision.
    pub opposed_in_vision: Option<u32>,
    /// Supporting citizens in vision, self included.
    pub support_in_vision: Option<u32>,
    /// Security officers in vision.
    pub security_in_vision: Option<u32>,
    /// Noise-adjusted estimate of visible unrest.
    pub perception: Option<f64>,
    /// Estimated probability of arrest.
    pub arrest_probability: Option<f64>,
    /// Activation level for rebellion after deterrence.
    pub active_level: Option<f64>,
    /// Activation level for opposition after deterrence.
    pub oppose_level: Option<f64>,
    /// Whether the actor became Active this step.
    pub flip: Option<bool>,
    /// Whether the actor has ever become Active.
    pub ever_flipped: Option<bool>,
}

// ---------------------------------------------------------------------------
// ModelReport
// ---------------------------------------------------------------------------

/// Aggregate, per-step view of the whole simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ModelReport {
    /// Seed that initialized the random stream.
    pub seed: u64,
    /// Steps completed so far.
    pub step: u64,
    /// Total citizens (constant for the run).
    pub citizen_count: u32,
    /// Total security officers (constant for the run).
    pub security_count: u32,
    /// Citizens currently Active.
    pub active_count: u32,
    /// Citizens currently Support.
    pub support_count: u32,
    /// Citizens currently Oppose.
    pub oppose_count: u32,
    /// Citizens currently Jailed.
    pub jail_count: u32,
    /// Fraction of citizens that flipped to Active this step.
    pub speed_of_spread: f64,
    /// Configured security density.
    pub security_density: f64,
    /// Configured mean of the private preference distribution.
    pub private_preference_mean: f64,
    /// Configured epsilon spread.
    pub epsilon: f64,
    /// Configured global threshold.
    pub threshold: f64,
    /// Whether the revolution condition has been met.
    pub revolution: bool,
    /// Whether the run is still advancing.
    pub running: bool,
    /// Lifecycle state.
    pub state: RunState,
}
