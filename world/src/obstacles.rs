//! Sparse obstacle grid: a true partial function from grid cell to obstacle.

use std::collections::{BTreeMap, HashMap};

use centipede_core::{Bounds, GridCell, GridSpacing, ObstacleId, Position};

use crate::pool::IdPool;

/// State stored for a single live obstacle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct ObstacleState {
    pub(crate) cell: GridCell,
    pub(crate) position: Position,
    pub(crate) health: u8,
    pub(crate) poisoned: bool,
}

/// Result of a spawn request, distinguishing fresh leases from cell hits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct SpawnOutcome {
    pub(crate) obstacle: ObstacleId,
    pub(crate) cell: GridCell,
    /// True when a new obstacle was leased rather than an existing one found.
    pub(crate) created: bool,
    /// True when the request flipped an existing obstacle to poisoned.
    pub(crate) newly_poisoned: bool,
}

/// Result of poisoning the obstacle at a position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PoisonResult {
    /// The obstacle transitioned to the poisoned state.
    Poisoned(ObstacleId),
    /// The obstacle was already poisoned; nothing changed.
    AlreadyPoisoned(ObstacleId),
    /// No obstacle occupies the cell.
    Missing,
}

/// Mapping from grid cell to leased obstacle, with occupancy and poison
/// queries driving the chain movement planner.
#[derive(Clone, Debug)]
pub(crate) struct ObstacleGrid {
    spacing: GridSpacing,
    bounds: Bounds,
    max_health: u8,
    entries: BTreeMap<ObstacleId, ObstacleState>,
    cells: HashMap<GridCell, ObstacleId>,
    pool: IdPool,
}

impl ObstacleGrid {
    pub(crate) fn new(spacing: GridSpacing, bounds: Bounds, max_health: u8) -> Self {
        Self {
            spacing,
            bounds,
            max_health,
            entries: BTreeMap::new(),
            cells: HashMap::new(),
            pool: IdPool::new(),
        }
    }

    /// Spawns an obstacle at the cell owning `position`, snapping and
    /// clamping into the playfield first.
    ///
    /// If the cell is already occupied the existing obstacle is returned
    /// instead of leasing a duplicate; this is the mechanism that guarantees
    /// at most one live obstacle per cell.
    pub(crate) fn spawn(&mut self, position: Position, poisoned: bool) -> SpawnOutcome {
        let snapped = self.bounds.clamp(self.spacing.snap(position));
        let cell = self.spacing.cell_of(snapped);

        if let Some(&existing) = self.cells.get(&cell) {
            let mut newly_poisoned = false;
            if poisoned {
                if let Some(state) = self.entries.get_mut(&existing) {
                    newly_poisoned = !state.poisoned;
                    state.poisoned = true;
                }
            }
            return SpawnOutcome {
                obstacle: existing,
                cell,
                created: false,
                newly_poisoned,
            };
        }

        let obstacle = ObstacleId::new(self.pool.lease());
        let state = ObstacleState {
            cell,
            position: snapped,
            health: self.max_health,
            poisoned,
        };
        let _ = self.entries.insert(obstacle, state);
        let _ = self.cells.insert(cell, obstacle);
        SpawnOutcome {
            obstacle,
            cell,
            created: true,
            newly_poisoned: false,
        }
    }

    /// Removes the obstacle and returns its final state, or `None` when the
    /// identifier is stale.
    pub(crate) fn release(&mut self, obstacle: ObstacleId) -> Option<ObstacleState> {
        let state = self.entries.remove(&obstacle)?;
        let _ = self.cells.remove(&state.cell);
        self.pool.release(obstacle.get());
        Some(state)
    }

    /// Decrements health and reports the remaining value, or `None` for a
    /// stale identifier. Release at zero health stays with the caller.
    pub(crate) fn damage(&mut self, obstacle: ObstacleId) -> Option<u8> {
        let state = self.entries.get_mut(&obstacle)?;
        state.health = state.health.saturating_sub(1);
        Some(state.health)
    }

    /// Marks the obstacle owning `position` as poisoned, if one exists.
    pub(crate) fn poison(&mut self, position: Position) -> PoisonResult {
        let cell = self.spacing.cell_of(position);
        let Some(&obstacle) = self.cells.get(&cell) else {
            return PoisonResult::Missing;
        };
        match self.entries.get_mut(&obstacle) {
            Some(state) if !state.poisoned => {
                state.poisoned = true;
                PoisonResult::Poisoned(obstacle)
            }
            Some(_) => PoisonResult::AlreadyPoisoned(obstacle),
            None => PoisonResult::Missing,
        }
    }

    pub(crate) fn occupied_cell(&self, cell: GridCell) -> bool {
        self.cells.contains_key(&cell)
    }

    pub(crate) fn occupied(&self, position: Position) -> bool {
        self.occupied_cell(self.spacing.cell_of(position))
    }

    /// Returns the poisoned obstacle owning `position`, if any.
    pub(crate) fn poisoned_at(&self, position: Position) -> Option<ObstacleId> {
        let cell = self.spacing.cell_of(position);
        let obstacle = *self.cells.get(&cell)?;
        let state = self.entries.get(&obstacle)?;
        state.poisoned.then_some(obstacle)
    }

    /// Reports whether any of the eight surrounding cells is occupied.
    pub(crate) fn has_neighbor(&self, cell: GridCell) -> bool {
        for column_offset in -1..=1 {
            for row_offset in -1..=1 {
                if column_offset == 0 && row_offset == 0 {
                    continue;
                }
                let neighbor =
                    GridCell::new(cell.column() + column_offset, cell.row() + row_offset);
                if self.cells.contains_key(&neighbor) {
                    return true;
                }
            }
        }
        false
    }

    /// Counts live obstacles whose world position falls inside `area`.
    pub(crate) fn count_in_area(&self, area: &Bounds) -> usize {
        self.entries
            .values()
            .filter(|state| area.contains(state.position))
            .count()
    }

    pub(crate) fn get(&self, obstacle: ObstacleId) -> Option<&ObstacleState> {
        self.entries.get(&obstacle)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Releases every obstacle and empties the cell index.
    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.cells.clear();
        self.pool.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::{ObstacleGrid, PoisonResult};
    use centipede_core::{Bounds, GridSpacing, Position};

    fn grid() -> ObstacleGrid {
        ObstacleGrid::new(
            GridSpacing::new(0.4, 0.4),
            Bounds::new(-8.5, 8.5, -4.28, 4.2),
            4,
        )
    }

    #[test]
    fn spawning_twice_at_one_cell_returns_the_same_obstacle() {
        let mut grid = grid();
        let first = grid.spawn(Position::new(1.23, -0.77), false);
        let second = grid.spawn(Position::new(1.21, -0.79), false);

        assert!(first.created);
        assert!(!second.created);
        assert_eq!(first.obstacle, second.obstacle);
        assert_eq!(grid.len(), 1);
    }

    #[test]
    fn spawn_onto_occupied_cell_can_poison_the_occupant() {
        let mut grid = grid();
        let first = grid.spawn(Position::new(0.0, 0.0), false);
        let second = grid.spawn(Position::new(0.0, 0.0), true);

        assert!(second.newly_poisoned);
        assert!(grid.poisoned_at(Position::new(0.0, 0.0)).is_some());

        // A repeat request changes nothing further.
        let third = grid.spawn(Position::new(0.0, 0.0), true);
        assert!(!third.newly_poisoned);
        assert_eq!(third.obstacle, first.obstacle);
    }

    #[test]
    fn spawn_clamps_into_the_playfield() {
        let mut grid = grid();
        let outcome = grid.spawn(Position::new(40.0, -40.0), false);
        let state = *grid.get(outcome.obstacle).expect("live obstacle");
        assert!(state.position.x() <= 8.5);
        assert!(state.position.y() >= -4.4 - 1e-6);
    }

    #[test]
    fn occupied_cell_count_matches_live_obstacles() {
        let mut grid = grid();
        let positions = [
            Position::new(0.0, 0.0),
            Position::new(0.4, 0.0),
            Position::new(0.01, 0.02), // same cell as the first spawn
            Position::new(-2.0, 1.6),
        ];
        for position in positions {
            let _ = grid.spawn(position, false);
        }
        assert_eq!(grid.len(), 3);
    }

    #[test]
    fn poison_misses_report_missing() {
        let mut grid = grid();
        assert_eq!(grid.poison(Position::new(2.0, 2.0)), PoisonResult::Missing);

        let outcome = grid.spawn(Position::new(2.0, 2.0), false);
        assert_eq!(
            grid.poison(Position::new(2.0, 2.0)),
            PoisonResult::Poisoned(outcome.obstacle)
        );
        assert_eq!(
            grid.poison(Position::new(2.0, 2.0)),
            PoisonResult::AlreadyPoisoned(outcome.obstacle)
        );
    }

    #[test]
    fn damage_counts_down_and_leaves_release_to_the_caller() {
        let mut grid = grid();
        let outcome = grid.spawn(Position::new(0.8, 0.8), false);

        assert_eq!(grid.damage(outcome.obstacle), Some(3));
        assert_eq!(grid.damage(outcome.obstacle), Some(2));
        assert_eq!(grid.damage(outcome.obstacle), Some(1));
        assert_eq!(grid.damage(outcome.obstacle), Some(0));
        // Health bottoms out; the obstacle stays until released.
        assert_eq!(grid.damage(outcome.obstacle), Some(0));
        assert_eq!(grid.len(), 1);

        let state = grid.release(outcome.obstacle).expect("release");
        assert_eq!(state.health, 0);
        assert_eq!(grid.len(), 0);
        assert!(grid.release(outcome.obstacle).is_none());
    }

    #[test]
    fn neighbor_query_scans_the_surrounding_ring() {
        let mut grid = grid();
        let outcome = grid.spawn(Position::new(0.0, 0.0), false);
        let cell = outcome.cell;

        assert!(!grid.has_neighbor(cell));
        let _ = grid.spawn(Position::new(0.4, 0.4), false);
        assert!(grid.has_neighbor(cell));
    }

    #[test]
    fn area_count_filters_by_world_position() {
        let mut grid = grid();
        let _ = grid.spawn(Position::new(-1.0, -1.0), false);
        let _ = grid.spawn(Position::new(1.0, 1.0), false);
        let _ = grid.spawn(Position::new(4.0, 4.0), false);

        let area = Bounds::new(-2.0, 2.0, -2.0, 2.0);
        assert_eq!(grid.count_in_area(&area), 2);
    }

    #[test]
    fn clear_releases_everything() {
        let mut grid = grid();
        let _ = grid.spawn(Position::new(0.0, 0.0), false);
        let _ = grid.spawn(Position::new(1.2, 0.0), true);
        grid.clear();
        assert_eq!(grid.len(), 0);
        assert!(!grid.occupied(Position::new(0.0, 0.0)));
    }
}
