//! Aggregate counters and per-step summaries.

use cascade_types::{AgentKind, Condition, RunState};

use crate::scheduler::{PhaseReport, Scheduler};

/// Share of citizens that must be Active or Jailed for the revolution to
/// succeed.
pub const REVOLUTION_FRACTION: f64 = 0.95;

/// Citizens per committed condition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ConditionCounts {
    /// Publicly supporting the regime.
    pub support: u32,
    /// Publicly opposing.
    pub oppose: u32,
    /// Actively rebelling.
    pub active: u32,
    /// In jail.
    pub jailed: u32,
}

impl ConditionCounts {
    /// Count the citizens registered with a scheduler.
    pub fn from_scheduler(scheduler: &Scheduler) -> Self {
        let count = |condition: Condition| {
            let n = scheduler.count(AgentKind::Citizen, |a| a.condition() == condition);
            u32::try_from(n).unwrap_or(u32::MAX)
        };
        Self {
            support: count(Condition::Support),
            oppose: count(Condition::Oppose),
            active: count(Condition::Active),
            jailed: count(Condition::Jailed),
        }
    }

    /// Sum over all four conditions.
    pub const fn total(&self) -> u32 {
        self.support
            .saturating_add(self.oppose)
            .saturating_add(self.active)
            .saturating_add(self.jailed)
    }

    /// `(active + jailed) / citizen_count`, 0 when there are no citizens.
    pub fn revolution_fraction(&self, citizen_count: u32) -> f64 {
        if citizen_count == 0 {
            return 0.0;
        }
        f64::from(self.active.saturating_add(self.jailed)) / f64::from(citizen_count)
    }

    /// Whether the revolution threshold has been reached.
    pub fn is_revolution(&self, citizen_count: u32) -> bool {
        self.revolution_fraction(citizen_count) >= REVOLUTION_FRACTION
    }
}

/// Fraction of citizens that flipped to Active this step.
pub fn speed_of_spread(flips: u32, citizen_count: u32) -> f64 {
    if citizen_count == 0 {
        return 0.0;
    }
    f64::from(flips) / f64::from(citizen_count)
}

/// What one call to `Simulation::step` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StepSummary {
    /// Step counter after this step.
    pub step: u64,
    /// Citizens jailed this step.
    pub arrests: u32,
    /// Citizens released this step.
    pub releases: u32,
    /// Releases postponed for lack of a free cell.
    pub deferred_releases: u32,
    /// Actors that changed cell.
    pub moves: u32,
    /// Citizens that became Active from a non-Active condition.
    pub flips: u32,
    /// Committed condition counts after the step.
    pub counts: ConditionCounts,
    /// Run state after the step.
    pub state: RunState,
}

impl StepSummary {
    /// Combine a scheduler phase report with the post-step aggregates.
    pub const fn new(
        step: u64,
        phase: PhaseReport,
        counts: ConditionCounts,
        state: RunState,
    ) -> Self {
        Self {
            step,
            arrests: phase.arrests,
            releases: phase.releases,
            deferred_releases: phase.deferred_releases,
            moves: phase.moves,
            flips: phase.flips,
            counts,
            state,
        }
    }
}
