//! Spatial field for the Resistance Cascade simulation.
//!
//! The field is a toroidal 2-D grid that indexes which actors sit in
//! which cell. It answers neighborhood and occupancy queries and performs
//! placement, removal and movement. It holds no actor state beyond
//! identity and position.
//!
//! # Modules
//!
//! - [`error`] -- Error types for field operations.
//! - [`field`] -- The [`Field`] grid itself.

pub mod error;
pub mod field;

// Re-export primary types at crate root.
pub use error::FieldError;
pub use field::Field;
