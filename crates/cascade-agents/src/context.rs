//! Per-run constants handed to every actor during a phase.

use crate::sampling;

/// Model-wide values every actor may read but none may change.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StepContext {
    /// `sigmoid(threshold)`: the population-level visibility bar Security
    /// uses to decide whether an opposing citizen is worth arresting.
    pub threshold_sigmoid: f64,
    /// Longest sentence Security can hand out, inclusive.
    pub max_jail_term: u32,
    /// Whether actors take a random step when they commit.
    pub movement: bool,
}

impl StepContext {
    /// Build the context from the global threshold and run flags.
    pub fn new(threshold: f64, max_jail_term: u32, movement: bool) -> Self {
        Self {
            threshold_sigmoid: sampling::sigmoid(threshold),
            max_jail_term,
            movement,
        }
    }
}
