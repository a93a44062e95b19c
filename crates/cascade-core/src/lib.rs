//! Configuration, scheduling, and the run loop for the Resistance Cascade
//! simulation.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `cascade-config.yaml` into
//!   strongly-typed structs, with validation.
//! - [`scheduler`] -- Type-indexed actor registry and two-phase stepping.
//! - [`model`] -- [`Simulation`]: population setup and the run state
//!   machine.
//! - [`report`] -- Aggregate counters and per-step summaries.
//! - [`runner`] -- [`run_simulation`] and the [`StepCallback`] hook.
//!
//! [`Simulation`]: model::Simulation
//! [`run_simulation`]: runner::run_simulation
//! [`StepCallback`]: runner::StepCallback

pub mod config;
pub mod model;
pub mod report;
pub mod runner;
pub mod scheduler;

pub use config::{CascadeConfig, ConfigError};
pub use model::{Simulation, SimulationError};
pub use report::{ConditionCounts, StepSummary};
pub use runner::{NoOpCallback, RunnerError, SimulationResult, StepCallback, run_simulation};
pub use scheduler::{PhaseReport, Scheduler, SchedulerError};
