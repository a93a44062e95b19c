//! Error types for the `cascade-world` crate.
//!
//! All fallible operations in this crate return [`FieldError`] through the
//! standard [`Result`] type alias.

use cascade_types::{AgentId, Position};

/// Errors that can occur during field operations.
#[derive(Debug, thiserror::Error)]
pub enum FieldError {
    /// The field must have at least one row and one column.
    #[error("invalid field dimensions {width}x{height}")]
    InvalidDimensions {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },

    /// A coordinate lies outside the field.
    #[error("position {0} is outside the field")]
    OutOfBounds(Position),

    /// The actor is already placed somewhere on the field.
    #[error("agent {0} is already placed on the field")]
    AlreadyPlaced(AgentId),

    /// The actor is not on the field.
    #[error("agent {0} is not on the field")]
    NotPlaced(AgentId),

    /// Single-occupancy mode and the target cell is taken.
    #[error("cell {0} is already occupied")]
    CellOccupied(Position),

    /// No empty cell remains for a placement.
    #[error("no empty cell available")]
    NoEmptyCell,

    /// Arithmetic overflow while computing a cell index.
    #[error("arithmetic overflow in field calculation")]
    ArithmeticOverflow,
}
