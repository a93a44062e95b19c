//! Two-phase simultaneous activation.
//!
//! Every step is split into a decide phase and a commit phase:
//!
//! 1. **Decide** -- each free citizen reads the committed state of its
//!    neighbors and computes a pending condition. Nothing is written until
//!    every citizen has decided, so iteration order cannot leak into the
//!    outcome.
//! 2. **Commit** -- citizens publish their pending conditions (or serve,
//!    or are released) in registration order. Security then acts in
//!    registration order on the post-commit conditions of the same step:
//!    arrest at most one citizen, then patrol.
//!
//! Actors live in an arena of slots. A removed actor leaves a tombstone so
//! the slot of every other actor, and therefore registration order, is
//! stable.

use std::collections::BTreeMap;

use cascade_agents::{
    Actor, AgentError, Arrest, CitizenOutcome, Mover, NeighborView, Sighting, StepContext,
};
use cascade_types::{AgentId, AgentKind};
use cascade_world::{Field, FieldError};
use rand::Rng;
use tracing::{debug, trace, warn};

/// Errors that can occur while registering or stepping actors.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// An actor with this id is already registered.
    #[error("agent {0} is already registered")]
    DuplicateAgent(AgentId),

    /// An actor operation failed.
    #[error("agent error: {source}")]
    Agent {
        /// The underlying agent error.
        #[from]
        source: AgentError,
    },

    /// A field operation failed while applying an arrest.
    #[error("field error: {source}")]
    Field {
        /// The underlying field error.
        #[from]
        source: FieldError,
    },
}

/// What happened during one scheduler step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhaseReport {
    /// Citizens that became Active from a non-Active condition.
    pub flips: u32,
    /// Citizens jailed by Security.
    pub arrests: u32,
    /// Citizens released from jail.
    pub releases: u32,
    /// Releases postponed because no cell could take the citizen.
    pub deferred_releases: u32,
    /// Actors that moved to another cell.
    pub moves: u32,
}

/// Type-indexed registry of actors with two-phase stepping.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    /// Registration-ordered arena; `None` marks a removed actor.
    slots: Vec<Option<Actor>>,
    /// Flat index from id to slot.
    index: BTreeMap<AgentId, usize>,
    /// Per-kind index from id to slot.
    by_kind: BTreeMap<AgentKind, BTreeMap<AgentId, usize>>,
}

impl Scheduler {
    /// Create an empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an actor at the end of the activation order.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::DuplicateAgent`] if the id is taken.
    pub fn add(&mut self, actor: Actor) -> Result<(), SchedulerError> {
        let id = actor.id();
        if self.index.contains_key(&id) {
            return Err(SchedulerError::DuplicateAgent(id));
        }
        let slot = self.slots.len();
        self.by_kind
            .entry(actor.kind())
            .or_default()
            .insert(id, slot);
        self.index.insert(id, slot);
        self.slots.push(Some(actor));
        Ok(())
    }

    /// Unregister an actor, returning it. The caller owns any field cleanup.
    pub fn remove(&mut self, id: AgentId) -> Option<Actor> {
        let slot = self.index.remove(&id)?;
        let actor = self.slots.get_mut(slot)?.take()?;
        if let Some(kind_index) = self.by_kind.get_mut(&actor.kind()) {
            kind_index.remove(&id);
        }
        Some(actor)
    }

    /// Look up a registered actor.
    pub fn get(&self, id: AgentId) -> Option<&Actor> {
        let slot = *self.index.get(&id)?;
        self.slots.get(slot)?.as_ref()
    }

    /// Number of registered actors.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether no actors are registered.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// All registered actors in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Actor> + '_ {
        self.slots.iter().flatten()
    }

    /// Registered actors of one kind, in id order.
    pub fn agents_of_kind(&self, kind: AgentKind) -> impl Iterator<Item = &Actor> + '_ {
        self.by_kind
            .get(&kind)
            .into_iter()
            .flat_map(|ids| ids.values())
            .filter_map(|&slot| self.slots.get(slot).and_then(Option::as_ref))
    }

    /// Number of registered actors of one kind.
    pub fn count_kind(&self, kind: AgentKind) -> usize {
        self.by_kind.get(&kind).map_or(0, BTreeMap::len)
    }

    /// Number of actors of one kind matching a predicate. Read-only.
    pub fn count<P>(&self, kind: AgentKind, predicate: P) -> usize
    where
        P: Fn(&Actor) -> bool,
    {
        self.agents_of_kind(kind).filter(|&a| predicate(a)).count()
    }

    /// Run one full step: decide for everyone, then commit for everyone.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError`] if the field and an actor disagree about
    /// the actor's position. Deferred releases are not errors.
    pub fn step<R: Rng + ?Sized>(
        &mut self,
        field: &mut Field,
        ctx: &StepContext,
        rng: &mut R,
    ) -> Result<PhaseReport, SchedulerError> {
        let flips = self.decide_all(field, rng)?;
        let mut report = self.commit_all(field, ctx, rng)?;
        report.flips = flips;
        Ok(report)
    }

    /// Decide phase for every citizen, then stage the results.
    ///
    /// All decisions are computed against the same committed state before
    /// any of them is stored. Returns the number of flips.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Agent`] if a citizen cannot sense.
    pub fn decide_all<R: Rng + ?Sized>(
        &mut self,
        field: &Field,
        rng: &mut R,
    ) -> Result<u32, SchedulerError> {
        let mut staged = Vec::with_capacity(self.count_kind(AgentKind::Citizen));
        for (slot, actor) in self.slots.iter().enumerate() {
            if let Some(Actor::Citizen(citizen)) = actor {
                let decision = citizen.decide(field, &*self, rng)?;
                if let Some(d) = &decision {
                    trace!(
                        agent = %citizen.id(),
                        opinion = d.opinion,
                        arrest_probability = d.arrest_probability,
                        next = %d.next_condition,
                        "Citizen decided"
                    );
                }
                staged.push((slot, decision));
            }
        }

        let mut flips: u32 = 0;
        for (slot, decision) in staged {
            if let Some(Some(Actor::Citizen(citizen))) = self.slots.get_mut(slot) {
                if citizen.stage(decision) {
                    flips = flips.saturating_add(1);
                }
            }
        }
        Ok(flips)
    }

    /// Commit phase: the citizen sub-phase, then the security sub-phase.
    fn commit_all<R: Rng + ?Sized>(
        &mut self,
        field: &mut Field,
        ctx: &StepContext,
        rng: &mut R,
    ) -> Result<PhaseReport, SchedulerError> {
        let mut report = PhaseReport::default();

        for slot in 0..self.slots.len() {
            let Some(Some(Actor::Citizen(citizen))) = self.slots.get_mut(slot) else {
                continue;
            };
            match citizen.advance(field, ctx, rng) {
                Ok(CitizenOutcome::Serving { .. }) => {}
                Ok(CitizenOutcome::Released { .. }) => {
                    report.releases = report.releases.saturating_add(1);
                }
                Ok(CitizenOutcome::Committed { moved_to, .. }) => {
                    if moved_to.is_some() {
                        report.moves = report.moves.saturating_add(1);
                    }
                }
                Err(AgentError::NoEmptyCell { agent }) => {
                    warn!(agent = %agent, "No empty cell for release, citizen stays jailed");
                    report.deferred_releases = report.deferred_releases.saturating_add(1);
                }
                Err(e) => return Err(e.into()),
            }
        }

        for slot in 0..self.slots.len() {
            let arrest = match self.slots.get(slot) {
                Some(Some(Actor::Security(officer))) => {
                    officer.select_arrest(&*field, &*self, ctx, rng)?
                }
                _ => continue,
            };
            if let Some(arrest) = arrest {
                if self.apply_arrest(field, arrest)? {
                    report.arrests = report.arrests.saturating_add(1);
                }
            }
            if let Some(Some(Actor::Security(officer))) = self.slots.get_mut(slot) {
                if officer.patrol(field, ctx, rng)?.is_some() {
                    report.moves = report.moves.saturating_add(1);
                }
            }
        }

        Ok(report)
    }

    /// Jail the target and take it off the field. Returns whether the
    /// target was a registered citizen.
    fn apply_arrest(&mut self, field: &mut Field, arrest: Arrest) -> Result<bool, SchedulerError> {
        let Some(&slot) = self.index.get(&arrest.target) else {
            return Ok(false);
        };
        let Some(Some(Actor::Citizen(citizen))) = self.slots.get_mut(slot) else {
            return Ok(false);
        };
        field.remove(arrest.target)?;
        citizen.jail(arrest.sentence);
        debug!(agent = %arrest.target, sentence = arrest.sentence, "Citizen arrested");
        Ok(true)
    }
}

impl NeighborView for Scheduler {
    fn sighting(&self, id: AgentId) -> Option<Sighting> {
        self.get(id).map(Actor::sighting)
    }
}
