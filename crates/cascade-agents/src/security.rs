//! Security officers: sense, arrest at most one citizen, patrol.

use cascade_types::{AgentId, AgentKind, AgentRecord, Condition, MoveMode, Position};
use cascade_world::Field;
use rand::Rng;

use crate::context::StepContext;
use crate::error::AgentError;
use crate::mover::Mover;
use crate::sampling;
use crate::sensing::{NeighborView, Sighting};

/// An arrest chosen by a Security officer, not yet applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arrest {
    /// Citizen to jail.
    pub target: AgentId,
    /// Sentence length, in `0..=max_jail_term`.
    pub sentence: u32,
}

/// A state enforcement agent.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Security {
    id: AgentId,
    position: Option<Position>,
    vision: u32,
    move_mode: MoveMode,
    private_preference: f64,
}

impl Security {
    /// Create an officer.
    pub const fn new(
        id: AgentId,
        position: Option<Position>,
        vision: u32,
        move_mode: MoveMode,
        private_preference: f64,
    ) -> Self {
        Self {
            id,
            position,
            vision,
            move_mode,
            private_preference,
        }
    }

    /// Drawn at construction, reported only.
    pub const fn private_preference(&self) -> f64 {
        self.private_preference
    }

    /// Pick at most one citizen to arrest.
    ///
    /// Active citizens in vision are the candidates. If there are none,
    /// Opposing citizens whose activation exceeds `sigmoid(threshold)` are.
    /// One candidate is drawn uniformly, then a sentence in
    /// `0..=max_jail_term`. No candidates means no draws.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Field`] if the officer's position is not on the
    /// field.
    pub fn select_arrest<V, R>(
        &self,
        field: &Field,
        view: &V,
        ctx: &StepContext,
        rng: &mut R,
    ) -> Result<Option<Arrest>, AgentError>
    where
        V: NeighborView + ?Sized,
        R: Rng + ?Sized,
    {
        let neighbors = self.sense(field)?;
        let mut candidates: Vec<AgentId> = neighbors
            .iter()
            .copied()
            .filter(|&id| {
                matches!(
                    view.sighting(id),
                    Some(Sighting::Citizen {
                        condition: Condition::Active,
                        ..
                    })
                )
            })
            .collect();

        if candidates.is_empty() {
            candidates = neighbors
                .iter()
                .copied()
                .filter(|&id| match view.sighting(id) {
                    Some(Sighting::Citizen {
                        condition: Condition::Oppose,
                        activation: Some(activation),
                    }) => activation > ctx.threshold_sigmoid,
                    _ => false,
                })
                .collect();
        }

        let Some(target) =
            sampling::choose_index(rng, candidates.len()).and_then(|i| candidates.get(i).copied())
        else {
            return Ok(None);
        };
        let sentence = rng.random_range(0..=ctx.max_jail_term);
        Ok(Some(Arrest { target, sentence }))
    }

    /// Take a random step if movement is enabled.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Field`] if the field and the officer disagree
    /// about its position.
    pub fn patrol<R: Rng + ?Sized>(
        &mut self,
        field: &mut Field,
        ctx: &StepContext,
        rng: &mut R,
    ) -> Result<Option<Position>, AgentError> {
        if !ctx.movement {
            return Ok(None);
        }
        Ok(self.random_move(field, rng)?)
    }

    /// Reporting snapshot. Citizen-only quantities are absent.
    pub const fn to_record(&self) -> AgentRecord {
        AgentRecord {
            id: self.id,
            kind: AgentKind::Security,
            position: self.position,
            condition: Condition::Security,
            private_preference: self.private_preference,
            opinion: None,
            activation: None,
            epsilon: None,
            epsilon_probability: None,
            oppose_threshold: None,
            active_threshold: None,
            jail_sentence: None,
            actives_in_vision: None,
            opposed_in_vision: None,
            support_in_vision: None,
            security_in_vision: None,
            perception: None,
            arrest_probability: None,
            active_level: None,
            oppose_level: None,
            flip: None,
            ever_flipped: None,
        }
    }
}

impl Mover for Security {
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
