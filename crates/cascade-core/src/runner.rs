//! Simulation loop runner.
//!
//! [`run_simulation`] steps a [`Simulation`] until its state machine leaves
//! `Running`, handing every [`StepSummary`] to a [`StepCallback`] so a
//! caller can log, record, or render progress without owning the loop.

use chrono::{DateTime, Utc};
use tracing::info;

use cascade_types::{ModelReport, RunId, RunState};

use crate::model::{Simulation, SimulationError};
use crate::report::StepSummary;

/// Errors that can occur during the simulation run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A step failed.
    #[error("step error: {source}")]
    Step {
        /// The underlying simulation error.
        #[from]
        source: SimulationError,
    },
}

/// Result of the simulation run.
#[derive(Debug, Clone)]
pub struct SimulationResult {
    /// The run that produced this result.
    pub run_id: RunId,
    /// Terminal state the run ended in.
    pub end_state: RunState,
    /// Number of steps executed by this call.
    pub total_steps: u64,
    /// The last step summary, if any step ran.
    pub final_summary: Option<StepSummary>,
    /// Aggregate report after the last step.
    pub final_report: ModelReport,
    /// When the loop started.
    pub started_at: DateTime<Utc>,
    /// When the loop finished.
    pub finished_at: DateTime<Utc>,
}

/// Callback invoked after each step completes.
pub trait StepCallback {
    /// Called after a step completes successfully.
    fn on_step(&mut self, summary: &StepSummary, simulation: &Simulation);
}

/// A no-op step callback for testing.
pub struct NoOpCallback;

impl StepCallback for NoOpCallback {
    fn on_step(&mut self, _summary: &StepSummary, _simulation: &Simulation) {}
}

/// Run the simulation until a termination condition is met.
///
/// A simulation that has already ended returns immediately with zero
/// steps.
///
/// # Errors
///
/// Returns [`RunnerError`] if a step fails.
pub fn run_simulation(
    simulation: &mut Simulation,
    callback: &mut dyn StepCallback,
) -> Result<SimulationResult, RunnerError> {
    let started_at = Utc::now();
    let mut total_steps: u64 = 0;
    let mut final_summary = None;

    info!(
        run_id = %simulation.run_id(),
        seed = simulation.seed(),
        max_iters = simulation.config().simulation.max_iters,
        "Simulation starting"
    );

    while simulation.is_running() {
        let summary = simulation.step()?;
        total_steps = total_steps.saturating_add(1);
        callback.on_step(&summary, simulation);
        final_summary = Some(summary);
    }

    Ok(SimulationResult {
        run_id: simulation.run_id(),
        end_state: simulation.state(),
        total_steps,
        final_summary,
        final_report: simulation.report(),
        started_at,
        finished_at: Utc::now(),
    })
}

/// Log the simulation end sequence.
pub fn log_simulation_end(result: &SimulationResult) {
    let elapsed_ms = result
        .finished_at
        .signed_duration_since(result.started_at)
        .num_milliseconds();
    info!(
        run_id = %result.run_id,
        state = ?result.end_state,
        total_steps = result.total_steps,
        revolution = result.final_report.revolution,
        active = result.final_report.active_count,
        jailed = result.final_report.jail_count,
        elapsed_ms,
        "Simulation ended"
    );
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::CascadeConfig;

    struct Recorder {
        steps: Vec<u64>,
    }

    impl StepCallback for Recorder {
        fn on_step(&mut self, summary: &StepSummary, simulation: &Simulation) {
            assert_eq!(summary.step, simulation.step_count());
            self.steps.push(summary.step);
        }
    }

    fn quiet_config() -> CascadeConfig {
        let mut config = CascadeConfig::default();
        config.world.width = 8;
        config.world.height = 8;
        config.world.seed = Some(21);
        config.population.citizen_vision = 2;
        config.population.security_vision = 2;
        config.preferences.private_preference_mean = 5.0;
        config.simulation.max_iters = 3;
        config
    }

    #[test]
    fn runs_to_max_iterations() {
        let mut sim = Simulation::new(quiet_config()).unwrap();
        let mut recorder = Recorder { steps: Vec::new() };
        let result = run_simulation(&mut sim, &mut recorder).unwrap();

        assert_eq!(result.end_state, RunState::MaxIterationsReached);
        assert_eq!(result.total_steps, 4);
        assert_eq!(recorder.steps, vec![1, 2, 3, 4]);
        assert_eq!(result.final_summary.unwrap().step, 4);
        assert!(!result.final_report.running);
        assert!(result.finished_at >= result.started_at);
        log_simulation_end(&result);
    }

    #[test]
    fn ended_run_takes_no_steps() {
        let mut sim = Simulation::new(quiet_config()).unwrap();
        run_simulation(&mut sim, &mut NoOpCallback).unwrap();
        let again = run_simulation(&mut sim, &mut NoOpCallback).unwrap();
        assert_eq!(again.total_steps, 0);
        assert!(again.final_summary.is_none());
    }
}
