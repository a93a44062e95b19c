//! The Citizen decision model.
//!
//! Each step a free citizen looks at its neighborhood, estimates how much
//! unrest is visible and how likely it is to be arrested, forms an opinion,
//! and then draws once against two deterrence-adjusted activation levels to
//! pick its next public condition. The decision is computed from a frozen
//! view of everyone else ([`Citizen::decide`]), stored as pending
//! ([`Citizen::stage`]), and only becomes visible when the scheduler
//! commits it ([`Citizen::advance`]).
//!
//! # Decision terms
//!
//! With census counts `A` (actives, self included), `O` (opposed), `S`
//! (support, self included) and `K` (security), and the citizen's
//! `epsilon` and `p = sigmoid(epsilon)`:
//!
//! - active ratio `= (A + O) / max(S, 1)`
//! - perception `= (A + O * p) ^ (1 / (epsilon^2 + 1))`
//! - arrest probability `= 1 - exp(-2.3 * (K / A) * 2p)`
//! - opinion `= -private_preference + perception * active_ratio`
//! - active level `= sigmoid(opinion - active_threshold) - arrest probability`
//! - oppose level `= sigmoid(opinion - oppose_threshold) - arrest probability`
//!
//! A uniform draw `r` selects Active if `active level > r`, else Oppose if
//! `oppose level > r`, else Support. Active is always checked first.

use cascade_types::{AgentId, AgentKind, AgentRecord, Condition, MoveMode, Position};
use cascade_world::Field;
use rand::Rng;
use tracing::{debug, warn};

use crate::context::StepContext;
use crate::error::AgentError;
use crate::mover::Mover;
use crate::sampling;
use crate::sensing::{NeighborCensus, NeighborView};

/// Calibration constant: one officer against a lone active observer with
/// `p = 0.5` yields an arrest estimate of about 0.9.
const ARREST_CALIBRATION: f64 = 2.3;

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Parameters of the distributions citizen traits are drawn from.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TraitDistribution {
    /// Mean of the private preference distribution.
    pub private_preference_mean: f64,
    /// Spread of the private preference distribution.
    pub standard_deviation: f64,
    /// Spread of the epsilon distribution (centered at 0).
    pub epsilon: f64,
    /// Center of the threshold distribution.
    pub threshold: f64,
}

/// Fixed, innate characteristics of one citizen.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CitizenTraits {
    /// Disposition toward the regime (negative = opposed).
    private_preference: f64,
    /// Perception noise magnitude.
    epsilon: f64,
    /// `sigmoid(epsilon)`.
    epsilon_probability: f64,
    /// The smaller of the two threshold draws.
    oppose_threshold: f64,
    /// The larger of the two threshold draws.
    active_threshold: f64,
}

impl CitizenTraits {
    /// Build traits from explicit values. The two threshold values may be
    /// given in either order; the smaller becomes the oppose threshold.
    pub fn new(private_preference: f64, epsilon: f64, threshold_a: f64, threshold_b: f64) -> Self {
        Self {
            private_preference,
            epsilon,
            epsilon_probability: sampling::sigmoid(epsilon),
            oppose_threshold: threshold_a.min(threshold_b),
            active_threshold: threshold_a.max(threshold_b),
        }
    }

    /// Draw a citizen's traits.
    ///
    /// Draw order is fixed: private preference, epsilon, then two thresholds
    /// centered at the global threshold with spread equal to this citizen's
    /// own epsilon.
    pub fn draw<R: Rng + ?Sized>(rng: &mut R, dist: &TraitDistribution) -> Self {
        let private_preference =
            sampling::gaussian(rng, dist.private_preference_mean, dist.standard_deviation);
        let epsilon = sampling::gaussian(rng, 0.0, dist.epsilon);
        let first = sampling::gaussian(rng, dist.threshold, epsilon);
        let second = sampling::gaussian(rng, dist.threshold, epsilon);
        Self::new(private_preference, epsilon, first, second)
    }

    /// Disposition toward the regime.
    pub const fn private_preference(&self) -> f64 {
        self.private_preference
    }

    /// Perception noise magnitude.
    pub const fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// `sigmoid(epsilon)`.
    pub const fn epsilon_probability(&self) -> f64 {
        self.epsilon_probability
    }

    /// Threshold for public opposition.
    pub const fn oppose_threshold(&self) -> f64 {
        self.oppose_threshold
    }

    /// Threshold for active rebellion.
    pub const fn active_threshold(&self) -> f64 {
        self.active_threshold
    }
}

// ---------------------------------------------------------------------------
// Decision
// ---------------------------------------------------------------------------

/// Everything a citizen derived during one decide phase.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Decision {
    /// Who the citizen saw.
    pub census: NeighborCensus,
    /// Contentious-to-compliant neighbor ratio.
    pub active_ratio: f64,
    /// Noise-adjusted estimate of visible unrest.
    pub perception: f64,
    /// Estimated probability of arrest.
    pub arrest_probability: f64,
    /// Net inclination to rebel.
    pub opinion: f64,
    /// `sigmoid(opinion)`, reported only.
    pub activation: f64,
    /// Deterrence-adjusted level for rebellion.
    pub active_level: f64,
    /// Deterrence-adjusted level for opposition.
    pub oppose_level: f64,
    /// The uniform draw the levels were compared against.
    pub draw: f64,
    /// Condition to commit.
    pub next_condition: Condition,
}

/// Run the decision model for a census, a set of traits and a draw.
///
/// Pure: the same inputs always give the same decision. A non-finite
/// opinion falls back to Support.
pub fn evaluate(census: NeighborCensus, traits: &CitizenTraits, draw: f64) -> Decision {
    let actives = f64::from(census.actives);
    let opposed = f64::from(census.opposed);
    let support = f64::from(census.support.max(1));
    let security = f64::from(census.security);
    let p = traits.epsilon_probability;

    let active_ratio = (actives + opposed) / support;
    let perception = opposed
        .mul_add(p, actives)
        .powf(1.0 / traits.epsilon.mul_add(traits.epsilon, 1.0));
    let arrest_probability =
        1.0 - (-ARREST_CALIBRATION * (security / actives.max(1.0)) * (2.0 * p)).exp();
    let opinion = perception.mul_add(active_ratio, -traits.private_preference);

    let activation = sampling::sigmoid(opinion);
    let active_level = sampling::sigmoid(opinion - traits.active_threshold) - arrest_probability;
    let oppose_level = sampling::sigmoid(opinion - traits.oppose_threshold) - arrest_probability;

    let next_condition = if !opinion.is_finite() {
        warn!(
            perception,
            active_ratio,
            private_preference = traits.private_preference,
            "Non-finite opinion, defaulting to Support"
        );
        Condition::Support
    } else if active_level > draw {
        Condition::Active
    } else if oppose_level > draw {
        Condition::Oppose
    } else {
        Condition::Support
    };

    Decision {
        census,
        active_ratio,
        perception,
        arrest_probability,
        opinion,
        activation,
        active_level,
        oppose_level,
        draw,
        next_condition,
    }
}

// ---------------------------------------------------------------------------
// Citizen
// ---------------------------------------------------------------------------

/// What a citizen did in its commit phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CitizenOutcome {
    /// Still jailed; the sentence was decremented.
    Serving {
        /// Steps left after this one.
        remaining: u32,
    },
    /// Sentence complete; back on the field as Support.
    Released {
        /// Cell the citizen was placed in.
        at: Position,
    },
    /// The pending condition became public.
    Committed {
        /// The newly committed condition.
        condition: Condition,
        /// Cell moved to, if the citizen moved.
        moved_to: Option<Position>,
    },
}

/// A member of the population.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Citizen {
    id: AgentId,
    position: Option<Position>,
    vision: u32,
    move_mode: MoveMode,
    traits: CitizenTraits,
    /// Publicly visible condition.
    condition: Condition,
    /// Condition chosen in the last decide phase, not yet visible.
    pending: Condition,
    jail_sentence: u32,
    last_decision: Option<Decision>,
    flip: bool,
    ever_flipped: bool,
}

impl Citizen {
    /// Create a citizen in the Support condition.
    pub const fn new(
        id: AgentId,
        position: Option<Position>,
        vision: u32,
        move_mode: MoveMode,
        traits: CitizenTraits,
    ) -> Self {
        Self {
            id,
            position,
            vision,
            move_mode,
            traits,
            condition: Condition::Support,
            pending: Condition::Support,
            jail_sentence: 0,
            last_decision: None,
            flip: false,
            ever_flipped: false,
        }
    }

    /// Seed the committed and pending condition of a free citizen.
    ///
    /// Only Support, Oppose and Active are accepted; jailing goes through
    /// [`Citizen::jail`] so the field stays consistent.
    #[must_use]
    pub const fn with_condition(mut self, condition: Condition) -> Self {
        if matches!(
            condition,
            Condition::Support | Condition::Oppose | Condition::Active
        ) {
            self.condition = condition;
            self.pending = condition;
        }
        self
    }

    /// Innate traits.
    pub const fn traits(&self) -> &CitizenTraits {
        &self.traits
    }

    /// Publicly visible condition.
    pub const fn condition(&self) -> Condition {
        self.condition
    }

    /// Condition waiting to be committed.
    pub const fn pending_condition(&self) -> Condition {
        self.pending
    }

    /// Steps left in jail.
    pub const fn jail_sentence(&self) -> u32 {
        self.jail_sentence
    }

    /// Whether the citizen became Active in the latest decide phase.
    pub const fn flip(&self) -> bool {
        self.flip
    }

    /// Whether the citizen has ever become Active.
    pub const fn ever_flipped(&self) -> bool {
        self.ever_flipped
    }

    /// Derived quantities from the latest decide phase.
    pub const fn last_decision(&self) -> Option<&Decision> {
        self.last_decision.as_ref()
    }

    /// `sigmoid(opinion)` from the latest decide phase.
    pub fn activation(&self) -> Option<f64> {
        self.last_decision.map(|d| d.activation)
    }

    /// Whether the citizen skips its decide phase.
    pub const fn is_jailed(&self) -> bool {
        self.jail_sentence > 0 || matches!(self.condition, Condition::Jailed)
    }

    /// Decide phase: sense the neighborhood and choose the next condition.
    ///
    /// Reads only committed state. Returns `None` for a jailed citizen,
    /// which neither senses nor draws.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Field`] if the citizen's position is not on
    /// the field.
    pub fn decide<V, R>(
        &self,
        field: &Field,
        view: &V,
        rng: &mut R,
    ) -> Result<Option<Decision>, AgentError>
    where
        V: NeighborView + ?Sized,
        R: Rng + ?Sized,
    {
        if self.is_jailed() {
            return Ok(None);
        }
        let neighbors = self.sense(field)?;
        let census = NeighborCensus::tally(&neighbors, view);
        let draw = sampling::unit_draw(rng);
        Ok(Some(evaluate(census, &self.traits, draw)))
    }

    /// Store a decide-phase result as pending. Returns whether the citizen
    /// flipped to Active.
    ///
    /// `flip` is cleared for every citizen, jailed or not, and set only when
    /// the decision moves a non-Active citizen to Active.
    pub fn stage(&mut self, decision: Option<Decision>) -> bool {
        self.flip = false;
        let Some(decision) = decision else {
            return false;
        };
        if decision.next_condition == Condition::Active && self.condition != Condition::Active {
            self.flip = true;
            self.ever_flipped = true;
        }
        self.pending = decision.next_condition;
        self.last_decision = Some(decision);
        self.flip
    }

    /// Commit phase.
    ///
    /// - Serving a sentence: decrement it and do nothing else.
    /// - Jailed with a finished sentence: re-place on a random empty cell
    ///   (any cell when none is empty and sharing is allowed) as Support.
    /// - Otherwise: make the pending condition public, then take a random
    ///   step if movement is enabled.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::NoEmptyCell`] when a release finds no cell; the
    /// citizen is left jailed and untouched. Returns [`AgentError::Field`]
    /// if the field and the citizen disagree about its position.
    pub fn advance<R: Rng + ?Sized>(
        &mut self,
        field: &mut Field,
        ctx: &StepContext,
        rng: &mut R,
    ) -> Result<CitizenOutcome, AgentError> {
        if self.jail_sentence > 0 {
            self.jail_sentence = self.jail_sentence.saturating_sub(1);
            return Ok(CitizenOutcome::Serving {
                remaining: self.jail_sentence,
            });
        }

        if self.condition == Condition::Jailed {
            let cell = self.release_cell(field, rng)?;
            field.place(self.id, cell)?;
            self.position = Some(cell);
            self.condition = Condition::Support;
            self.pending = Condition::Support;
            debug!(agent = %self.id, cell = %cell, "Citizen released");
            return Ok(CitizenOutcome::Released { at: cell });
        }

        self.condition = self.pending;
        let moved_to = if ctx.movement {
            self.random_move(field, rng)?
        } else {
            None
        };
        Ok(CitizenOutcome::Committed {
            condition: self.condition,
            moved_to,
        })
    }

    /// Put the citizen in jail. The caller removes it from the field.
    pub const fn jail(&mut self, sentence: u32) {
        self.condition = Condition::Jailed;
        self.jail_sentence = sentence;
        self.position = None;
    }

    /// Reporting snapshot.
    pub fn to_record(&self) -> AgentRecord {
        let d = self.last_decision.as_ref();
        AgentRecord {
            id: self.id,
            kind: AgentKind::Citizen,
            position: self.position,
            condition: self.condition,
            private_preference: self.traits.private_preference,
            opinion: d.map(|d| d.opinion),
            activation: d.map(|d| d.activation),
            epsilon: Some(self.traits.epsilon),
            epsilon_probability: Some(self.traits.epsilon_probability),
            oppose_threshold: Some(self.traits.oppose_threshold),
            active_threshold: Some(self.traits.active_threshold),
            jail_sentence: Some(self.jail_sentence),
            actives_in_vision: d.map(|d| d.census.actives),
            opposed_in_vision: d.map(|d| d.census.opposed),
            support_in_vision: d.map(|d| d.census.support),
            security_in_vision: d.map(|d| d.census.security),
            perception: d.map(|d| d.perception),
            arrest_probability: d.map(|d| d.arrest_probability),
            active_level: d.map(|d| d.active_level),
            oppose_level: d.map(|d| d.oppose_level),
            flip: Some(self.flip),
            ever_flipped: Some(self.ever_flipped),
        }
    }

    /// Pick the cell a released citizen returns to.
    fn release_cell<R: Rng + ?Sized>(
        &self,
        field: &Field,
        rng: &mut R,
    ) -> Result<Position, AgentError> {
        let empty = field.empty_count();
        if empty > 0 {
            return sampling::choose_index(rng, empty)
                .and_then(|i| field.empties().nth(i))
                .ok_or(AgentError::NoEmptyCell { agent: self.id });
        }
        if !field.allows_multiple() {
            return Err(AgentError::NoEmptyCell { agent: self.id });
        }
        let x = rng.random_range(0..field.width());
        let y = rng.random_range(0..field.height());
        Ok(Position::new(x, y))
    }
}

impl Mover for Citizen {
    fn id(&self) -> AgentId {
        self.id
    }

    fn position(&self) -> Option<Position> {
        self.position
    }

    fn set_position(&mut self, position: Option<Position>) {
        self.position = position;
    }

    fn vision(&self) -> u32 {
        self.vision
    }

    fn move_mode(&self) -> MoveMode {
        self.move_mode
    }
}
