//! Shared type definitions for the Resistance Cascade simulation.
//!
//! This crate is the single source of truth for identifiers, state tags
//! and reporting records used across the workspace. Types defined here
//! flow downstream to `TypeScript` via `ts-rs` for dashboards.
//!
//! # Modules
//!
//! - [`ids`] -- Actor and run identifiers
//! - [`enums`] -- Closed state tags (condition, actor kind, move mode, run state)
//! - [`structs`] -- Grid positions and per-step reporting records

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{AgentKind, Condition, MoveMode, RunState};
pub use ids::{AgentId, RunId};
pub use structs::{AgentRecord, ModelReport, Position};

#[cfg(test)]
mod tests {
    //! Binding generation for dashboard consumers.

    #[test]
    fn export_bindings() {
        use ts_rs::TS;

        let _ = crate::ids::AgentId::export_all();
        let _ = crate::ids::RunId::export_all();

        let _ = crate::enums::Condition::export_all();
        let _ = crate::enums::AgentKind::export_all();
        let _ = crate::enums::MoveMode::export_all();
        let _ = crate::enums::RunState::export_all();

        let _ = crate::structs::Position::export_all();
        let _ = crate::structs::AgentRecord::export_all();
        let _ = crate::structs::ModelReport::export_all();
    }
}
