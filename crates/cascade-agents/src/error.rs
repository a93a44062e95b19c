//! Error types for the cascade-agents crate.
//!
//! Agent operations never panic. Failures that concern a single actor are
//! returned to the scheduler, which decides whether the step can continue.

use cascade_types::AgentId;
use cascade_world::FieldError;

/// Errors that can occur while an actor senses, moves or commits.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// A field operation failed.
    #[error("field error: {source}")]
    Field {
        /// The underlying field error.
        #[from]
        source: FieldError,
    },

    /// A jailed citizen is due for release but no cell can take it.
    #[error("no empty cell to release {agent} into")]
    NoEmptyCell {
        /// The citizen that stays jailed this step.
        agent: AgentId,
    },
}
