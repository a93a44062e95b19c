//! The simulation: field, population, scheduler, and run state machine.
//!
//! A [`Simulation`] is built from a validated [`CascadeConfig`]. All
//! randomness in a run comes from one `StdRng` seeded at construction, so
//! a run is reproduced exactly by its reported seed and configuration.
//!
//! Construction places the population, then runs one decide phase (no
//! commit) so that the first report already carries derived quantities.

use cascade_agents::{
    Actor, AgentError, Citizen, CitizenTraits, Security, StepContext, TraitDistribution, sampling,
};
use cascade_types::{
    AgentId, AgentKind, AgentRecord, Condition, ModelReport, MoveMode, Position, RunId, RunState,
};
use cascade_world::{Field, FieldError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::config::{CascadeConfig, ConfigError};
use crate::report::{ConditionCounts, StepSummary, speed_of_spread};
use crate::scheduler::{Scheduler, SchedulerError};

/// Errors that can occur while building or stepping a simulation.
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    /// The run has already reached a terminal state.
    #[error("simulation already ended at step {step} ({state:?})")]
    Terminated {
        /// Step counter at termination.
        step: u64,
        /// The terminal state.
        state: RunState,
    },

    /// The configuration is unusable.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ConfigError,
    },

    /// A field operation failed during setup.
    #[error("field error: {source}")]
    Field {
        /// The underlying field error.
        #[from]
        source: FieldError,
    },

    /// An actor operation failed during setup.
    #[error("agent error: {source}")]
    Agent {
        /// The underlying agent error.
        #[from]
        source: AgentError,
    },

    /// The scheduler rejected a registration or failed a step.
    #[error("scheduler error: {source}")]
    Scheduler {
        /// The underlying scheduler error.
        #[from]
        source: SchedulerError,
    },

    /// The id space is exhausted.
    #[error("agent id overflow")]
    IdOverflow,
}

/// A complete Resistance Cascade run.
#[derive(Debug)]
pub struct Simulation {
    run_id: RunId,
    config: CascadeConfig,
    seed: u64,
    rng: StdRng,
    field: Field,
    scheduler: Scheduler,
    ctx: StepContext,
    next_id: AgentId,
    citizen_count: u32,
    security_count: u32,
    step: u64,
    state: RunState,
    counts: ConditionCounts,
    speed_of_spread: f64,
}

impl Simulation {
    /// Validate the configuration, place the population, and run the
    /// initial decide phase.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::Config`] for an invalid configuration,
    /// or a field/scheduler error if placement fails.
    pub fn new(config: CascadeConfig) -> Result<Self, SimulationError> {
        config.validate()?;

        let seed = if config.world.random_seed {
            rand::rng().random::<u64>()
        } else {
            config.world.seed_or_default()
        };

        let field = Field::new(
            config.world.width,
            config.world.height,
            config.population.multiple_agents_per_cell,
        )?;
        let ctx = StepContext::new(
            config.preferences.threshold,
            config.simulation.max_jail_term,
            config.population.movement,
        );

        let mut sim = Self {
            run_id: RunId::new(),
            citizen_count: config.citizen_count(),
            security_count: config.security_count(),
            seed,
            rng: StdRng::seed_from_u64(seed),
            field,
            scheduler: Scheduler::new(),
            ctx,
            next_id: AgentId::new(1),
            step: 0,
            state: RunState::Running,
            counts: ConditionCounts::default(),
            speed_of_spread: 0.0,
            config,
        };

        sim.populate()?;
        let flips = sim.scheduler.decide_all(&sim.field, &mut sim.rng)?;
        sim.refresh_aggregates(flips);

        info!(
            run_id = %sim.run_id,
            seed = sim.seed,
            width = sim.field.width(),
            height = sim.field.height(),
            citizens = sim.citizen_count,
            security = sim.security_count,
            "Simulation initialized"
        );
        Ok(sim)
    }

    /// Advance the whole population by one step.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::Terminated`] once the run has ended, or a
    /// scheduler error if an actor and the field disagree.
    pub fn step(&mut self) -> Result<StepSummary, SimulationError> {
        if self.state.is_terminal() {
            return Err(SimulationError::Terminated {
                step: self.step,
                state: self.state,
            });
        }

        let phase = self
            .scheduler
            .step(&mut self.field, &self.ctx, &mut self.rng)?;
        self.step = self.step.saturating_add(1);
        self.refresh_aggregates(phase.flips);

        if self.counts.is_revolution(self.citizen_count) {
            self.state = RunState::RevolutionWon;
            info!(
                step = self.step,
                active = self.counts.active,
                jailed = self.counts.jailed,
                "Revolution succeeded"
            );
        } else if self.step > self.config.simulation.max_iters {
            self.state = RunState::MaxIterationsReached;
            info!(step = self.step, "Maximum iterations reached");
        }

        let summary = StepSummary::new(self.step, phase, self.counts, self.state);
        debug!(
            step = summary.step,
            active = summary.counts.active,
            oppose = summary.counts.oppose,
            support = summary.counts.support,
            jailed = summary.counts.jailed,
            arrests = summary.arrests,
            releases = summary.releases,
            flips = summary.flips,
            "Step complete"
        );
        Ok(summary)
    }

    /// Aggregate state after the latest step.
    pub fn report(&self) -> ModelReport {
        ModelReport {
            seed: self.seed,
            step: self.step,
            citizen_count: self.citizen_count,
            security_count: self.security_count,
            active_count: self.counts.active,
            support_count: self.counts.support,
            oppose_count: self.counts.oppose,
            jail_count: self.counts.jailed,
            speed_of_spread: self.speed_of_spread,
            security_density: self.config.population.security_density,
            private_preference_mean: self.config.preferences.private_preference_mean,
            epsilon: self.config.preferences.epsilon,
            threshold: self.config.preferences.threshold,
            revolution: self.revolution(),
            running: self.is_running(),
            state: self.state,
        }
    }

    /// Per-actor snapshot in registration order.
    pub fn agent_records(&self) -> Vec<AgentRecord> {
        self.scheduler.iter().map(Actor::to_record).collect()
    }

    /// Identifier of this run.
    pub const fn run_id(&self) -> RunId {
        self.run_id
    }

    /// The seed the random stream was built from.
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Steps completed so far.
    pub const fn step_count(&self) -> u64 {
        self.step
    }

    /// Current run state.
    pub const fn state(&self) -> RunState {
        self.state
    }

    /// Whether further steps are allowed.
    pub const fn is_running(&self) -> bool {
        !self.state.is_terminal()
    }

    /// Whether the revolution threshold was reached.
    pub const fn revolution(&self) -> bool {
        matches!(self.state, RunState::RevolutionWon)
    }

    /// Citizen counts by committed condition.
    pub const fn counts(&self) -> ConditionCounts {
        self.counts
    }

    /// Fraction of citizens that flipped in the latest step.
    pub const fn speed_of_spread(&self) -> f64 {
        self.speed_of_spread
    }

    /// Number of citizens created.
    pub const fn citizen_count(&self) -> u32 {
        self.citizen_count
    }

    /// Number of security officers created.
    pub const fn security_count(&self) -> u32 {
        self.security_count
    }

    /// The configuration this run was built from.
    pub const fn config(&self) -> &CascadeConfig {
        &self.config
    }

    /// The spatial field.
    pub const fn field(&self) -> &Field {
        &self.field
    }

    /// The actor registry.
    pub const fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Look up one actor.
    pub fn agent(&self, id: AgentId) -> Option<&Actor> {
        self.scheduler.get(id)
    }

    /// Citizens in registration order.
    pub fn citizens(&self) -> impl Iterator<Item = &Citizen> + '_ {
        self.scheduler
            .agents_of_kind(AgentKind::Citizen)
            .filter_map(Actor::as_citizen)
    }

    /// Number of citizens currently in `condition`.
    pub fn count_condition(&self, condition: Condition) -> usize {
        self.scheduler
            .count(AgentKind::Citizen, |a| a.condition() == condition)
    }

    // -------------------------------------------------------------------
    // Setup
    // -------------------------------------------------------------------

    /// Create citizens, then security, in that order.
    ///
    /// Per citizen the draws are: cell, private preference, epsilon, two
    /// thresholds. Per officer: cell, private preference.
    fn populate(&mut self) -> Result<(), SimulationError> {
        let dist = TraitDistribution {
            private_preference_mean: self.config.preferences.private_preference_mean,
            standard_deviation: self.config.preferences.standard_deviation,
            epsilon: self.config.preferences.epsilon,
            threshold: self.config.preferences.threshold,
        };

        for _ in 0..self.citizen_count {
            let id = self.allocate_id()?;
            let cell = self.placement_cell();
            let traits = CitizenTraits::draw(&mut self.rng, &dist);
            self.field.place(id, cell)?;
            let citizen = Citizen::new(
                id,
                Some(cell),
                self.config.population.citizen_vision,
                MoveMode::Moore,
                traits,
            );
            self.scheduler.add(citizen.into())?;
        }

        for _ in 0..self.security_count {
            let id = self.allocate_id()?;
            let cell = self.placement_cell();
            let private_preference = sampling::gaussian(
                &mut self.rng,
                dist.private_preference_mean,
                dist.standard_deviation,
            );
            self.field.place(id, cell)?;
            let officer = Security::new(
                id,
                Some(cell),
                self.config.population.security_vision,
                MoveMode::Moore,
                private_preference,
            );
            self.scheduler.add(officer.into())?;
        }
        Ok(())
    }

    /// A random empty cell in single-occupancy mode, any random cell
    /// otherwise.
    fn placement_cell(&mut self) -> Position {
        if !self.field.allows_multiple() {
            let empty = self.field.empty_count();
            if let Some(cell) = sampling::choose_index(&mut self.rng, empty)
                .and_then(|i| self.field.empties().nth(i))
            {
                return cell;
            }
        }
        let x = self.rng.random_range(0..self.field.width());
        let y = self.rng.random_range(0..self.field.height());
        Position::new(x, y)
    }

    fn allocate_id(&mut self) -> Result<AgentId, SimulationError> {
        let id = self.next_id;
        self.next_id = id.next().ok_or(SimulationError::IdOverflow)?;
        Ok(id)
    }

    fn refresh_aggregates(&mut self, flips: u32) {
        self.counts = ConditionCounts::from_scheduler(&self.scheduler);
        self.speed_of_spread = speed_of_spread(flips, self.citizen_count);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn small_config() -> CascadeConfig {
        let mut config = CascadeConfig::default();
        config.world.width = 12;
        config.world.height = 12;
        config.world.seed = Some(3);
        config.population.citizen_vision = 2;
        config.population.security_vision = 2;
        config.population.security_density = 0.05;
        config.simulation.max_iters = 5;
        config.simulation.max_jail_term = 4;
        config
    }

    #[test]
    fn population_matches_densities() {
        let sim = Simulation::new(small_config()).unwrap();
        assert_eq!(sim.citizen_count(), 101);
        assert_eq!(sim.security_count(), 7);
        assert_eq!(sim.scheduler().len(), 108);
        assert_eq!(sim.field().agent_count(), 108);
        assert_eq!(sim.seed(), 3);
        assert!(sim.is_running());
    }

    #[test]
    fn ids_start_at_one_citizens_first() {
        let sim = Simulation::new(small_config()).unwrap();
        let records = sim.agent_records();
        assert_eq!(records.first().unwrap().id, AgentId::new(1));
        assert_eq!(records.first().unwrap().kind, AgentKind::Citizen);
        assert_eq!(records.last().unwrap().id, AgentId::new(108));
        assert_eq!(records.last().unwrap().kind, AgentKind::Security);
    }

    #[test]
    fn initial_report_carries_derived_quantities() {
        let sim = Simulation::new(small_config()).unwrap();
        assert!(sim.citizens().all(|c| c.last_decision().is_some()));
        let report = sim.report();
        assert_eq!(report.step, 0);
        assert!(report.running);
        assert_eq!(report.state, RunState::Running);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = small_config();
        config.population.citizen_density = 2.0;
        assert!(matches!(
            Simulation::new(config),
            Err(SimulationError::Config { .. })
        ));
    }

    #[test]
    fn stepping_past_the_end_is_an_error() {
        let mut sim = Simulation::new(small_config()).unwrap();
        while sim.is_running() {
            sim.step().unwrap();
        }
        assert!(matches!(
            sim.step(),
            Err(SimulationError::Terminated { .. })
        ));
    }

    #[test]
    fn random_seed_run_replays_from_recorded_seed() {
        let mut config = small_config();
        config.world.seed = None;
        config.world.random_seed = true;
        let mut first = Simulation::new(config).unwrap();
        let recorded = first.seed();
        assert_eq!(first.report().seed, recorded);

        let mut replay_config = small_config();
        replay_config.world.seed = Some(recorded);
        replay_config.world.random_seed = false;
        let mut replay = Simulation::new(replay_config).unwrap();
        assert_eq!(replay.seed(), recorded);
        assert_eq!(first.agent_records(), replay.agent_records());

        let mut first_steps = Vec::new();
        while first.is_running() {
            first_steps.push(first.step().unwrap());
        }
        let mut replay_steps = Vec::new();
        while replay.is_running() {
            replay_steps.push(replay.step().unwrap());
        }
        assert_eq!(first_steps, replay_steps);
        assert_eq!(first.report(), replay.report());
        assert_eq!(first.agent_records(), replay.agent_records());
    }

    #[test]
    fn single_occupancy_places_one_per_cell() {
        let mut config = small_config();
        config.population.multiple_agents_per_cell = false;
        config.population.citizen_density = 0.9;
        config.population.security_density = 0.1;
        let sim = Simulation::new(config).unwrap();
        assert_eq!(sim.field().empty_count(), 0);
    }
}
