//! Sensing and random relocation, shared by every actor kind.
//!
//! [`Mover`] is a capability: an actor that knows its id, cell, vision and
//! movement mode gets neighborhood sensing and a one-cell random walk for
//! free. Citizens and Security implement it independently; there is no
//! shared base state.

use cascade_types::{AgentId, MoveMode, Position};
use cascade_world::{Field, FieldError};
use rand::Rng;

use crate::sampling;

/// Neighbor sensing and random-walk capability.
pub trait Mover {
    /// The actor's identifier.
    fn id(&self) -> AgentId;

    /// The actor's current cell, `None` while it is off the field.
    fn position(&self) -> Option<Position>;

    /// Record a new cell for the actor.
    fn set_position(&mut self, position: Option<Position>);

    /// Sensing radius in cells.
    fn vision(&self) -> u32;

    /// Which adjacent cells the actor may step into.
    fn move_mode(&self) -> MoveMode;

    /// Actors within `vision` (Moore distance), excluding the actor's own
    /// cell. An actor that is off the field senses nobody.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError`] if the recorded position is not on the field.
    fn sense(&self, field: &Field) -> Result<Vec<AgentId>, FieldError> {
        let Some(pos) = self.position() else {
            return Ok(Vec::new());
        };
        let cells = field.neighborhood(pos, self.vision(), MoveMode::Moore, false)?;
        Ok(field.occupants(&cells))
    }

    /// Step to a uniformly random adjacent cell.
    ///
    /// In single-occupancy mode only empty cells qualify. Returns the new
    /// cell, or `None` when the actor is off the field or has nowhere to
    /// go, in which case it stays put.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError`] only if the field and the actor disagree about
    /// where the actor is.
    fn random_move<R: Rng + ?Sized>(
        &mut self,
        field: &mut Field,
        rng: &mut R,
    ) -> Result<Option<Position>, FieldError> {
        let Some(pos) = self.position() else {
            return Ok(None);
        };
        let mut moves = field.neighborhood(pos, 1, self.move_mode(), false)?;
        if !field.allows_multiple() {
            moves.retain(|cell| field.is_cell_empty(*cell));
        }
        let Some(next) =
            sampling::choose_index(rng, moves.len()).and_then(|i| moves.get(i).copied())
        else {
            return Ok(None);
        };
        field.move_agent(self.id(), next)?;
        self.set_position(Some(next));
        Ok(Some(next))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    struct Walker {
        id: AgentId,
        position: Option<Position>,
        mode: MoveMode,
    }

    impl Mover for Walker {
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
            1
        }
        fn move_mode(&self) -> MoveMode {
            self.mode
        }
    }

    fn walker_on(field: &mut Field, id: u64, pos: Position, mode: MoveMode) -> Walker {
        field.place(AgentId::new(id), pos).unwrap();
        Walker {
            id: AgentId::new(id),
            position: Some(pos),
            mode,
        }
    }

    #[test]
    fn moves_to_an_adjacent_cell() {
        let mut field = Field::new(5, 5, true).unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        let start = Position::new(2, 2);
        let mut w = walker_on(&mut field, 1, start, MoveMode::Moore);

        let next = w.random_move(&mut field, &mut rng).unwrap().unwrap();
        assert!(field.torus_distance(start, next) < 1.5);
        assert_ne!(next, start);
        assert_eq!(field.position_of(w.id), Some(next));
        assert_eq!(w.position, Some(next));
    }

    #[test]
    fn own_cell_is_never_a_move_target() {
        let mut field = Field::new(5, 5, true).unwrap();
        let mut rng = StdRng::seed_from_u64(29);
        let mut w = walker_on(&mut field, 1, Position::new(2, 2), MoveMode::Moore);
        for _ in 0..200 {
            let before = w.position.unwrap();
            let after = w.random_move(&mut field, &mut rng).unwrap().unwrap();
            assert_ne!(after, before);
        }
    }

    #[test]
    fn von_neumann_moves_orthogonally() {
        let mut field = Field::new(5, 5, true).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let mut w = walker_on(&mut field, 1, Position::new(2, 2), MoveMode::VonNeumann);
        for _ in 0..20 {
            let before = w.position.unwrap();
            let after = w.random_move(&mut field, &mut rng).unwrap().unwrap();
            assert!((field.torus_distance(before, after) - 1.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn boxed_in_actor_stays_put() {
        let mut field = Field::new(3, 3, false).unwrap();
        let mut rng = StdRng::seed_from_u64(2);
        let mut id = 2;
        for x in 0..3 {
            for y in 0..3 {
                if (x, y) != (1, 1) {
                    field.place(AgentId::new(id), Position::new(x, y)).unwrap();
                    id += 1;
                }
            }
        }
        let mut w = walker_on(&mut field, 1, Position::new(1, 1), MoveMode::Moore);
        assert_eq!(w.random_move(&mut field, &mut rng).unwrap(), None);
        assert_eq!(w.position, Some(Position::new(1, 1)));
    }

    #[test]
    fn single_occupancy_move_picks_the_only_gap() {
        let mut field = Field::new(3, 3, false).unwrap();
        let mut rng = StdRng::seed_from_u64(4);
        let mut id = 2;
        for x in 0..3 {
            for y in 0..3 {
                if (x, y) != (1, 1) && (x, y) != (0, 0) {
                    field.place(AgentId::new(id), Position::new(x, y)).unwrap();
                    id += 1;
                }
            }
        }
        let mut w = walker_on(&mut field, 1, Position::new(1, 1), MoveMode::Moore);
        assert_eq!(
            w.random_move(&mut field, &mut rng).unwrap(),
            Some(Position::new(0, 0))
        );
    }

    #[test]
    fn off_field_actor_neither_senses_nor_moves() {
        let mut field = Field::new(3, 3, true).unwrap();
        let mut rng = StdRng::seed_from_u64(4);
        let mut w = Walker {
            id: AgentId::new(1),
            position: None,
            mode: MoveMode::Moore,
        };
        assert!(w.sense(&field).unwrap().is_empty());
        assert_eq!(w.random_move(&mut field, &mut rng).unwrap(), None);
    }

    #[test]
    fn sensing_excludes_own_cell() {
        let mut field = Field::new(5, 5, true).unwrap();
        let w = walker_on(&mut field, 1, Position::new(2, 2), MoveMode::Moore);
        field.place(AgentId::new(2), Position::new(2, 2)).unwrap();
        field.place(AgentId::new(3), Position::new(3, 3)).unwrap();
        field.place(AgentId::new(4), Position::new(4, 4)).unwrap();
        assert_eq!(w.sense(&field).unwrap(), vec![AgentId::new(3)]);
    }
}
