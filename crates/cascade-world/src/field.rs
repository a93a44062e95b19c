//! The spatial field: a toroidal grid holding zero or more actors per cell.
//!
//! The [`Field`] is the positional index of the simulation. It knows which
//! actor ids sit in which cell and nothing else about them; conditions and
//! traits live with the actors. Every coordinate wraps on both axes.
//!
//! Occupancy is either multi-actor (the default) or single-actor, selected
//! at construction. In single-actor mode [`Field::place`] and
//! [`Field::move_agent`] reject occupied targets.

use std::collections::{BTreeMap, BTreeSet};

use cascade_types::{AgentId, MoveMode, Position};

use crate::error::FieldError;

/// Toroidal grid with per-cell actor lists.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Field {
    /// Number of columns.
    width: u32,
    /// Number of rows.
    height: u32,
    /// Whether more than one actor may share a cell.
    multiple_per_cell: bool,
    /// Row-major cell contents, in placement order.
    cells: Vec<Vec<AgentId>>,
    /// Reverse index: actor -> cell.
    positions: BTreeMap<AgentId, Position>,
}

impl Field {
    /// Create an empty field.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::InvalidDimensions`] if either dimension is zero,
    /// or [`FieldError::ArithmeticOverflow`] if the cell count does not fit
    /// in memory indexing.
    pub fn new(width: u32, height: u32, multiple_per_cell: bool) -> Result<Self, FieldError> {
        if width == 0 || height == 0 {
            return Err(FieldError::InvalidDimensions { width, height });
        }
        let area = usize::try_from(u64::from(width).saturating_mul(u64::from(height)))
            .map_err(|_err| FieldError::ArithmeticOverflow)?;
        Ok(Self {
            width,
            height,
            multiple_per_cell,
            cells: vec![Vec::new(); area],
            positions: BTreeMap::new(),
        })
    }

    /// Number of columns.
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows.
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Total number of cells.
    pub fn area(&self) -> u64 {
        u64::from(self.width).saturating_mul(u64::from(self.height))
    }

    /// Whether several actors may share a cell.
    pub const fn allows_multiple(&self) -> bool {
        self.multiple_per_cell
    }

    /// Number of actors currently placed.
    pub fn agent_count(&self) -> usize {
        self.positions.len()
    }

    /// Whether the coordinate lies on the field.
    pub const fn contains(&self, pos: Position) -> bool {
        pos.x < self.width && pos.y < self.height
    }

    // -------------------------------------------------------------------
    // Neighborhood queries
    // -------------------------------------------------------------------

    /// Cells within `radius` of `pos`, wrapping around both edges.
    ///
    /// Moore neighborhoods use Chebyshev distance, Von Neumann neighborhoods
    /// use Manhattan distance. Each cell appears at most once even when the
    /// radius wraps onto itself. The center is included only when asked for.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::OutOfBounds`] if `pos` is not on the field.
    pub fn neighborhood(
        &self,
        pos: Position,
        radius: u32,
        mode: MoveMode,
        include_center: bool,
    ) -> Result<Vec<Position>, FieldError> {
        if !self.contains(pos) {
            return Err(FieldError::OutOfBounds(pos));
        }
        let r = i64::from(radius);
        let mut seen = BTreeSet::new();
        let mut cells = Vec::new();

        for dx in -r..=r {
            for dy in -r..=r {
                if mode == MoveMode::VonNeumann && dx.abs().saturating_add(dy.abs()) > r {
                    continue;
                }
                let cell = self.offset(pos, dx, dy)?;
                if cell == pos && !include_center {
                    continue;
                }
                if seen.insert(cell) {
                    cells.push(cell);
                }
            }
        }
        Ok(cells)
    }

    /// Actors in the given cells, in cell order then placement order.
    pub fn occupants(&self, cells: &[Position]) -> Vec<AgentId> {
        cells
            .iter()
            .flat_map(|&cell| self.cell_contents(cell).iter().copied())
            .collect()
    }

    /// Actors in a single cell. Off-field coordinates are empty.
    pub fn cell_contents(&self, pos: Position) -> &[AgentId] {
        self.index(pos)
            .ok()
            .and_then(|idx| self.cells.get(idx))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Whether a cell holds no actors.
    pub fn is_cell_empty(&self, pos: Position) -> bool {
        self.cell_contents(pos).is_empty()
    }

    /// The cell an actor occupies, if it is on the field.
    pub fn position_of(&self, id: AgentId) -> Option<Position> {
        self.positions.get(&id).copied()
    }

    /// Lazily enumerate empty cells in row-major order.
    pub fn empties(&self) -> impl Iterator<Item = Position> + '_ {
        let width = self.width;
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, contents)| contents.is_empty())
            .filter_map(move |(idx, _)| {
                let idx = u64::try_from(idx).ok()?;
                let x = u32::try_from(idx.checked_rem(u64::from(width))?).ok()?;
                let y = u32::try_from(idx.checked_div(u64::from(width))?).ok()?;
                Some(Position::new(x, y))
            })
    }

    /// Number of empty cells.
    pub fn empty_count(&self) -> usize {
        self.cells.iter().filter(|contents| contents.is_empty()).count()
    }

    /// Euclidean distance between two cells, taking the shorter way around
    /// each axis.
    #[allow(clippy::cast_precision_loss)]
    pub fn torus_distance(&self, a: Position, b: Position) -> f64 {
        let dx = a.x.abs_diff(b.x);
        let dy = a.y.abs_diff(b.y);
        let dx = dx.min(self.width.saturating_sub(dx));
        let dy = dy.min(self.height.saturating_sub(dy));
        f64::from(dx).hypot(f64::from(dy))
    }

    // -------------------------------------------------------------------
    // Mutation
    // -------------------------------------------------------------------

    /// Put an actor into a cell.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::AlreadyPlaced`] if the actor is already on the
    /// field, [`FieldError::OutOfBounds`] for an off-field cell, or
    /// [`FieldError::CellOccupied`] in single-occupancy mode when the cell
    /// is taken.
    pub fn place(&mut self, id: AgentId, pos: Position) -> Result<(), FieldError> {
        if self.positions.contains_key(&id) {
            return Err(FieldError::AlreadyPlaced(id));
        }
        let idx = self.index(pos)?;
        let cell = self.cells.get_mut(idx).ok_or(FieldError::OutOfBounds(pos))?;
        if !self.multiple_per_cell && !cell.is_empty() {
            return Err(FieldError::CellOccupied(pos));
        }
        cell.push(id);
        self.positions.insert(id, pos);
        Ok(())
    }

    /// Take an actor off the field, returning the cell it occupied.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::NotPlaced`] if the actor is not on the field.
    pub fn remove(&mut self, id: AgentId) -> Result<Position, FieldError> {
        let pos = self.positions.remove(&id).ok_or(FieldError::NotPlaced(id))?;
        let idx = self.index(pos)?;
        if let Some(cell) = self.cells.get_mut(idx) {
            cell.retain(|occupant| *occupant != id);
        }
        Ok(pos)
    }

    /// Relocate an actor, returning the cell it left.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::NotPlaced`] if the actor is not on the field,
    /// [`FieldError::OutOfBounds`] for an off-field target, or
    /// [`FieldError::CellOccupied`] in single-occupancy mode when the target
    /// is taken by another actor. On error the actor stays where it was.
    pub fn move_agent(&mut self, id: AgentId, to: Position) -> Result<Position, FieldError> {
        let from = self.position_of(id).ok_or(FieldError::NotPlaced(id))?;
        if from == to {
            return Ok(from);
        }
        let to_idx = self.index(to)?;
        if !self.multiple_per_cell && !self.is_cell_empty(to) {
            return Err(FieldError::CellOccupied(to));
        }
        let from_idx = self.index(from)?;
        if let Some(cell) = self.cells.get_mut(from_idx) {
            cell.retain(|occupant| *occupant != id);
        }
        let cell = self.cells.get_mut(to_idx).ok_or(FieldError::OutOfBounds(to))?;
        cell.push(id);
        self.positions.insert(id, to);
        Ok(from)
    }

    // -------------------------------------------------------------------
    // Internal helpers
    // -------------------------------------------------------------------

    /// Row-major index of an on-field cell.
    fn index(&self, pos: Position) -> Result<usize, FieldError> {
        if !self.contains(pos) {
            return Err(FieldError::OutOfBounds(pos));
        }
        let row = u64::from(pos.y)
            .checked_mul(u64::from(self.width))
            .and_then(|r| r.checked_add(u64::from(pos.x)))
            .ok_or(FieldError::ArithmeticOverflow)?;
        usize::try_from(row).map_err(|_err| FieldError::ArithmeticOverflow)
    }

    /// Shift a cell by `(dx, dy)` with toroidal wrap.
    fn offset(&self, pos: Position, dx: i64, dy: i64) -> Result<Position, FieldError> {
        let x = wrap_axis(pos.x, dx, self.width)?;
        let y = wrap_axis(pos.y, dy, self.height)?;
        Ok(Position::new(x, y))
    }
}

/// Wrap `coord + delta` into `0..extent`.
fn wrap_axis(coord: u32, delta: i64, extent: u32) -> Result<u32, FieldError> {
    let shifted = i64::from(coord)
        .checked_add(delta)
        .ok_or(FieldError::ArithmeticOverflow)?;
    let wrapped = shifted
        .checked_rem_euclid(i64::from(extent))
        .ok_or(FieldError::ArithmeticOverflow)?;
    u32::try_from(wrapped).map_err(|_err| FieldError::ArithmeticOverflow)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn field(multi: bool) -> Field {
        Field::new(10, 10, multi).unwrap()
    }

    #[test]
    fn zero_dimension_is_rejected() {
        assert!(matches!(
            Field::new(0, 5, true),
            Err(FieldError::InvalidDimensions { width: 0, height: 5 })
        ));
    }

    #[test]
    fn moore_radius_one_has_eight_cells() {
        let f = field(true);
        let cells = f
            .neighborhood(Position::new(5, 5), 1, MoveMode::Moore, false)
            .unwrap();
        assert_eq!(cells.len(), 8);
        assert!(!cells.contains(&Position::new(5, 5)));
    }

    #[test]
    fn von_neumann_radius_one_has_four_cells() {
        let f = field(true);
        let cells = f
            .neighborhood(Position::new(5, 5), 1, MoveMode::VonNeumann, false)
            .unwrap();
        assert_eq!(cells.len(), 4);
        assert!(cells.contains(&Position::new(5, 4)));
        assert!(!cells.contains(&Position::new(4, 4)));
    }

    #[test]
    fn moore_radius_two_includes_center_on_request() {
        let f = field(true);
        let cells = f
            .neighborhood(Position::new(2, 2), 2, MoveMode::Moore, true)
            .unwrap();
        assert_eq!(cells.len(), 25);
        assert!(cells.contains(&Position::new(2, 2)));
    }

    #[test]
    fn neighborhood_wraps_at_corner() {
        let f = field(true);
        let cells = f
            .neighborhood(Position::new(0, 0), 1, MoveMode::Moore, false)
            .unwrap();
        assert_eq!(cells.len(), 8);
        assert!(cells.contains(&Position::new(9, 9)));
        assert!(cells.contains(&Position::new(9, 0)));
        assert!(cells.contains(&Position::new(0, 9)));
    }

    #[test]
    fn oversized_radius_does_not_double_count() {
        let f = Field::new(3, 3, true).unwrap();
        let cells = f
            .neighborhood(Position::new(1, 1), 3, MoveMode::Moore, false)
            .unwrap();
        assert_eq!(cells.len(), 8);
    }

    #[test]
    fn neighborhood_of_off_field_cell_errors() {
        let f = field(true);
        assert!(f
            .neighborhood(Position::new(10, 0), 1, MoveMode::Moore, false)
            .is_err());
    }

    #[test]
    fn place_move_remove_roundtrip() {
        let mut f = field(true);
        let id = AgentId::new(1);
        f.place(id, Position::new(1, 1)).unwrap();
        assert_eq!(f.position_of(id), Some(Position::new(1, 1)));
        assert!(!f.is_cell_empty(Position::new(1, 1)));

        let from = f.move_agent(id, Position::new(2, 1)).unwrap();
        assert_eq!(from, Position::new(1, 1));
        assert!(f.is_cell_empty(Position::new(1, 1)));
        assert_eq!(f.cell_contents(Position::new(2, 1)), &[id]);

        let left = f.remove(id).unwrap();
        assert_eq!(left, Position::new(2, 1));
        assert_eq!(f.position_of(id), None);
        assert_eq!(f.agent_count(), 0);
    }

    #[test]
    fn double_place_is_rejected() {
        let mut f = field(true);
        let id = AgentId::new(1);
        f.place(id, Position::new(0, 0)).unwrap();
        assert!(matches!(
            f.place(id, Position::new(1, 0)),
            Err(FieldError::AlreadyPlaced(_))
        ));
    }

    #[test]
    fn single_occupancy_rejects_shared_cells() {
        let mut f = field(false);
        f.place(AgentId::new(1), Position::new(3, 3)).unwrap();
        assert!(matches!(
            f.place(AgentId::new(2), Position::new(3, 3)),
            Err(FieldError::CellOccupied(_))
        ));
        f.place(AgentId::new(2), Position::new(4, 3)).unwrap();
        assert!(f.move_agent(AgentId::new(2), Position::new(3, 3)).is_err());
        assert_eq!(f.position_of(AgentId::new(2)), Some(Position::new(4, 3)));
    }

    #[test]
    fn multi_occupancy_shares_cells() {
        let mut f = field(true);
        f.place(AgentId::new(1), Position::new(3, 3)).unwrap();
        f.place(AgentId::new(2), Position::new(3, 3)).unwrap();
        assert_eq!(
            f.occupants(&[Position::new(3, 3)]),
            vec![AgentId::new(1), AgentId::new(2)]
        );
    }

    #[test]
    fn empties_are_lazy_and_row_major() {
        let mut f = Field::new(2, 2, true).unwrap();
        f.place(AgentId::new(1), Position::new(0, 0)).unwrap();
        let empties: Vec<Position> = f.empties().collect();
        assert_eq!(
            empties,
            vec![Position::new(1, 0), Position::new(0, 1), Position::new(1, 1)]
        );
        assert_eq!(f.empty_count(), 3);
        assert_eq!(f.empties().next(), Some(Position::new(1, 0)));
    }

    #[test]
    fn torus_distance_takes_short_way() {
        let f = field(true);
        let d = f.torus_distance(Position::new(0, 0), Position::new(9, 0));
        assert!((d - 1.0).abs() < f64::EPSILON);
        let d = f.torus_distance(Position::new(0, 0), Position::new(3, 4));
        assert!((d - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn field_serializes() {
        let mut f = Field::new(2, 1, true).unwrap();
        f.place(AgentId::new(7), Position::new(1, 0)).unwrap();
        let json = serde_json::to_string(&f);
        assert!(json.is_ok());
    }
}
