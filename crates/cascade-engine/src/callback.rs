//! Step callback that logs progress at a fixed interval.

use cascade_core::{Simulation, StepCallback, StepSummary};
use tracing::info;

/// Logs the model report every `interval` steps, and always on the step
/// that ends the run.
pub struct LoggingCallback {
    interval: u64,
}

impl LoggingCallback {
    /// An interval of 0 logs only the final step.
    pub const fn new(interval: u64) -> Self {
        Self { interval }
    }

    fn is_due(&self, summary: &StepSummary) -> bool {
        summary.state.is_terminal() || summary.step.checked_rem(self.interval) == Some(0)
    }
}

impl StepCallback for LoggingCallback {
    fn on_step(&mut self, summary: &StepSummary, simulation: &Simulation) {
        if !self.is_due(summary) {
            return;
        }
        let report = simulation.report();
        info!(
            step = report.step,
            active = report.active_count,
            oppose = report.oppose_count,
            support = report.support_count,
            jailed = report.jail_count,
            speed_of_spread = report.speed_of_spread,
            arrests = summary.arrests,
            releases = summary.releases,
            state = ?report.state,
            "Progress"
        );
    }
}
