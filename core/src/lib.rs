#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Centipede Garden simulation.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters and systems submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! for collaborators to react to deterministically. Scoring, audio, and
//! difficulty concerns live entirely behind the event outbox; the simulation
//! core never tracks them.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Centipede Garden.";

/// Number of historical head positions retained per chain.
///
/// Must exceed the largest legal chain length; [`SimulationConfig::validate`]
/// enforces this before a world is constructed.
pub const PATH_HISTORY_CAPACITY: usize = 64;

/// Tolerance applied when comparing world positions for equality.
pub const POSITION_EPSILON: f32 = 1e-4;

/// Continuous world position on the playfield plane.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    x: f32,
    y: f32,
}

impl Position {
    /// Creates a new position from explicit axis values.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Horizontal world coordinate.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    /// Vertical world coordinate.
    #[must_use]
    pub const fn y(&self) -> f32 {
        self.y
    }

    /// Reports whether two positions coincide within [`POSITION_EPSILON`].
    #[must_use]
    pub fn approx_eq(&self, other: Position) -> bool {
        (self.x - other.x).abs() <= POSITION_EPSILON
            && (self.y - other.y).abs() <= POSITION_EPSILON
    }
}

/// Discrete grid coordinate derived from a continuous world position.
///
/// The playfield is centered on the origin, so both axes may be negative.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct GridCell {
    column: i32,
    row: i32,
}

impl GridCell {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: i32, row: i32) -> Self {
        Self { column, row }
    }

    /// Column index of the cell.
    #[must_use]
    pub const fn column(&self) -> i32 {
        self.column
    }

    /// Row index of the cell.
    #[must_use]
    pub const fn row(&self) -> i32 {
        self.row
    }
}

/// Horizontal and vertical distances between adjacent grid cells.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridSpacing {
    horizontal: f32,
    vertical: f32,
}

impl GridSpacing {
    /// Creates a new spacing descriptor.
    #[must_use]
    pub const fn new(horizontal: f32, vertical: f32) -> Self {
        Self {
            horizontal,
            vertical,
        }
    }

    /// Distance between adjacent columns in world units.
    #[must_use]
    pub const fn horizontal(&self) -> f32 {
        self.horizontal
    }

    /// Distance between adjacent rows in world units.
    #[must_use]
    pub const fn vertical(&self) -> f32 {
        self.vertical
    }

    /// Rounds each axis of the position to the nearest multiple of its
    /// spacing. Ties round to even so that limit rows shared with the
    /// playfield boundary resolve consistently.
    #[must_use]
    pub fn snap(&self, position: Position) -> Position {
        Position::new(
            (position.x() / self.horizontal).round_ties_even() * self.horizontal,
            (position.y() / self.vertical).round_ties_even() * self.vertical,
        )
    }

    /// Derives the grid cell that owns the provided position.
    ///
    /// Snapping does not change the owning cell: `cell_of(snap(p))` equals
    /// `cell_of(p)` for every position.
    #[must_use]
    pub fn cell_of(&self, position: Position) -> GridCell {
        GridCell::new(
            (position.x() / self.horizontal).round_ties_even() as i32,
            (position.y() / self.vertical).round_ties_even() as i32,
        )
    }
}

/// Axis-aligned rectangle expressed in world coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    left: f32,
    right: f32,
    bottom: f32,
    top: f32,
}

impl Bounds {
    /// Creates a new rectangle from its four limits.
    #[must_use]
    pub const fn new(left: f32, right: f32, bottom: f32, top: f32) -> Self {
        Self {
            left,
            right,
            bottom,
            top,
        }
    }

    /// Leftmost world coordinate.
    #[must_use]
    pub const fn left(&self) -> f32 {
        self.left
    }

    /// Rightmost world coordinate.
    #[must_use]
    pub const fn right(&self) -> f32 {
        self.right
    }

    /// Lowest world coordinate.
    #[must_use]
    pub const fn bottom(&self) -> f32 {
        self.bottom
    }

    /// Highest world coordinate.
    #[must_use]
    pub const fn top(&self) -> f32 {
        self.top
    }

    /// Clamps each axis of the position into the rectangle.
    #[must_use]
    pub fn clamp(&self, position: Position) -> Position {
        Position::new(
            position.x().clamp(self.left, self.right),
            position.y().clamp(self.bottom, self.top),
        )
    }

    /// Reports whether the position lies inside the rectangle, inclusive of
    /// its edges.
    #[must_use]
    pub fn contains(&self, position: Position) -> bool {
        position.x() >= self.left
            && position.x() <= self.right
            && position.y() >= self.bottom
            && position.y() <= self.top
    }
}

/// Lateral traversal direction of a chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HorizontalDir {
    /// Movement toward decreasing x coordinates.
    Left,
    /// Movement toward increasing x coordinates.
    Right,
}

impl HorizontalDir {
    /// Sign of the direction along the x axis.
    #[must_use]
    pub const fn sign(&self) -> f32 {
        match self {
            Self::Left => -1.0,
            Self::Right => 1.0,
        }
    }

    /// Opposite lateral direction.
    #[must_use]
    pub const fn reversed(&self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

/// Vertical traversal direction of a chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VerticalDir {
    /// Movement toward increasing y coordinates.
    Up,
    /// Movement toward decreasing y coordinates.
    Down,
}

impl VerticalDir {
    /// Sign of the direction along the y axis.
    #[must_use]
    pub const fn sign(&self) -> f32 {
        match self {
            Self::Up => 1.0,
            Self::Down => -1.0,
        }
    }

    /// Opposite vertical direction.
    #[must_use]
    pub const fn reversed(&self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
        }
    }
}

/// Unique identifier assigned to a chain.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ChainId(u32);

impl ChainId {
    /// Creates a new chain identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a leased body segment.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct SegmentId(u32);

impl SegmentId {
    /// Creates a new segment identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a leased obstacle.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ObstacleId(u32);

impl ObstacleId {
    /// Creates a new obstacle identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Complete outcome of one fixed-step movement decision for a single chain.
///
/// The movement system computes one decision per chain from a consistent
/// snapshot of the world, and only afterwards are the decisions applied, so
/// a chain's decision never observes another chain already moved within the
/// same step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepDecision {
    /// World position the chain head advances to.
    pub next_head: Position,
    /// Lateral direction after the step is applied.
    pub horizontal: HorizontalDir,
    /// Vertical direction after the step is applied.
    pub vertical: VerticalDir,
    /// Whether the chain is committed to a dive after the step.
    pub diving: bool,
    /// Marks the step on which a dive begins, for the notification outbox.
    pub dive_started: bool,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Releases every chain, segment, and obstacle back to the pools.
    Reset,
    /// Requests construction of a new chain streaming in from above.
    SpawnChain {
        /// Snapped world position of the chain head at spawn time.
        origin: Position,
        /// Number of segments to lease for the chain.
        segment_count: u32,
        /// Initial lateral traversal direction.
        horizontal: HorizontalDir,
    },
    /// Applies one fixed-step movement decision to a chain.
    AdvanceChain {
        /// Identifier of the chain being advanced.
        chain: ChainId,
        /// Decision computed by the movement planner for this step.
        decision: StepDecision,
    },
    /// Requests an obstacle at the cell owning the provided position.
    SpawnObstacle {
        /// World position to snap and clamp into the playfield.
        position: Position,
        /// Whether the obstacle starts poisoned.
        poisoned: bool,
    },
    /// Decrements the health of an existing obstacle.
    ///
    /// Releasing a fully damaged obstacle remains the caller's
    /// responsibility; health and scoring are deliberately decoupled.
    DamageObstacle {
        /// Identifier of the obstacle taking the hit.
        obstacle: ObstacleId,
    },
    /// Returns an obstacle to the pool and vacates its cell.
    ReleaseObstacle {
        /// Identifier of the obstacle to release.
        obstacle: ObstacleId,
    },
    /// Marks the obstacle at the provided position as poisoned, if present.
    PoisonObstacle {
        /// World position whose owning cell is inspected.
        position: Position,
    },
    /// Resolves an external collision against a chain segment.
    HitSegment {
        /// Identifier of the struck segment; stale identifiers are ignored.
        segment: SegmentId,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that the world returned to its empty initial state.
    GameReset,
    /// Confirms that a chain entered the active set.
    ChainSpawned {
        /// Identifier assigned to the new chain.
        chain: ChainId,
        /// Number of segments leased for the chain.
        segment_count: u32,
    },
    /// Announces that a chain committed to a dive this step.
    DiveStarted {
        /// Identifier of the diving chain.
        chain: ChainId,
    },
    /// Confirms that a chain was divided into two independent chains.
    ChainSplit {
        /// Chain that retained the leading segments.
        source: ChainId,
        /// Newly registered chain carrying the trailing segments.
        spawned: ChainId,
    },
    /// Confirms that an emptied chain left the active set.
    ChainRemoved {
        /// Identifier of the removed chain.
        chain: ChainId,
    },
    /// Signals that the active-chain set transitioned to empty.
    ///
    /// Emitted exactly once per wave; the difficulty collaborator reacts by
    /// advancing the level and requesting the next wave.
    WaveCleared,
    /// Confirms that a struck segment was removed and returned to the pool.
    SegmentDestroyed {
        /// Identifier of the destroyed segment.
        segment: SegmentId,
        /// Points value for the scoring collaborator.
        points: u32,
    },
    /// Confirms that an obstacle was created and indexed.
    ObstacleSpawned {
        /// Identifier assigned to the obstacle.
        obstacle: ObstacleId,
        /// Cell the obstacle occupies.
        cell: GridCell,
    },
    /// Announces that an obstacle transitioned to the poisoned state.
    ObstaclePoisoned {
        /// Identifier of the poisoned obstacle.
        obstacle: ObstacleId,
    },
    /// Reports the remaining health of a damaged obstacle.
    ObstacleDamaged {
        /// Identifier of the damaged obstacle.
        obstacle: ObstacleId,
        /// Health left after the hit; release stays with the caller at zero.
        remaining_health: u8,
        /// Points value for the scoring collaborator.
        points: u32,
    },
    /// Confirms that an obstacle was released with its health exhausted.
    ObstacleDestroyed {
        /// Identifier of the destroyed obstacle.
        obstacle: ObstacleId,
        /// Cell the obstacle vacated.
        cell: GridCell,
        /// Bonus points value for the scoring collaborator.
        points: u32,
    },
    /// Confirms that a healthy obstacle was released, e.g. during a reset.
    ObstacleReleased {
        /// Identifier of the released obstacle.
        obstacle: ObstacleId,
        /// Cell the obstacle vacated.
        cell: GridCell,
    },
}

/// Tuning values governing chain construction and traversal speed.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Base traversal speed in world units per second.
    pub base_speed: f32,
    /// Linear speed multiplier growth per difficulty level.
    pub speed_growth_per_level: f32,
    /// Fewest segments a spawned chain may carry.
    pub min_segments: u32,
    /// Most segments a spawned chain may carry.
    pub max_segments: u32,
    /// Chains spawned per wave at difficulty zero.
    pub initial_chain_count: u32,
    /// Upper bound on chains spawned per wave.
    pub max_chain_count: u32,
    /// Difficulty levels required to add one chain to a wave.
    pub levels_per_extra_chain: u32,
    /// Vertical offset above the top limit where chains materialize.
    pub spawn_height_offset: f32,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            base_speed: 6.0,
            speed_growth_per_level: 0.15,
            min_segments: 10,
            max_segments: 16,
            initial_chain_count: 1,
            max_chain_count: 3,
            levels_per_extra_chain: 5,
            spawn_height_offset: 0.5,
        }
    }
}

/// Tuning values governing the obstacle grid and its initial field.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObstacleConfig {
    /// Health assigned to every freshly spawned obstacle.
    pub max_health: u8,
    /// Number of obstacles generated when the field resets.
    pub field_count: u32,
    /// Region of the playfield seeded with the initial obstacle field.
    pub field_area: Bounds,
    /// Points awarded per obstacle hit.
    pub hit_points: u32,
    /// Bonus points awarded when an obstacle is destroyed.
    pub destroy_bonus: u32,
}

impl Default for ObstacleConfig {
    fn default() -> Self {
        Self {
            max_health: 4,
            field_count: 30,
            field_area: Bounds::new(-8.2, 8.2, -2.0, 4.0),
            hit_points: 1,
            destroy_bonus: 3,
        }
    }
}

/// Read-only configuration supplied to the world and systems at construction.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Playfield limits that clamp obstacle placement and chain travel.
    pub bounds: Bounds,
    /// Grid spacing shared by every coordinate conversion.
    pub spacing: GridSpacing,
    /// Chain construction and speed tuning.
    pub chain: ChainConfig,
    /// Obstacle grid tuning.
    pub obstacle: ObstacleConfig,
    /// Points awarded per destroyed segment.
    pub segment_points: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            bounds: Bounds::new(-8.5, 8.5, -4.28, 4.2),
            spacing: GridSpacing::new(0.4, 0.4),
            chain: ChainConfig::default(),
            obstacle: ObstacleConfig::default(),
            segment_points: 25,
        }
    }
}

impl SimulationConfig {
    /// Validates the configuration invariants the simulation relies on.
    ///
    /// The world refuses construction on failure; past this point the core
    /// treats the values as trusted and never re-checks them.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.spacing.horizontal() > 0.0) || !(self.spacing.vertical() > 0.0) {
            return Err(ConfigError::NonPositiveSpacing);
        }
        if self.bounds.left() >= self.bounds.right()
            || self.bounds.bottom() >= self.bounds.top()
        {
            return Err(ConfigError::InvertedBounds);
        }
        if self.obstacle.field_area.left() > self.obstacle.field_area.right()
            || self.obstacle.field_area.bottom() > self.obstacle.field_area.top()
        {
            return Err(ConfigError::InvertedFieldArea);
        }
        if self.chain.min_segments == 0 || self.chain.min_segments > self.chain.max_segments {
            return Err(ConfigError::EmptySegmentRange {
                min: self.chain.min_segments,
                max: self.chain.max_segments,
            });
        }
        if self.chain.max_segments as usize > PATH_HISTORY_CAPACITY {
            return Err(ConfigError::SegmentRangeExceedsPath {
                max: self.chain.max_segments,
                capacity: PATH_HISTORY_CAPACITY,
            });
        }
        if self.chain.max_chain_count == 0 {
            return Err(ConfigError::ZeroChainCount);
        }
        if self.chain.levels_per_extra_chain == 0 {
            return Err(ConfigError::ZeroLevelsPerExtraChain);
        }
        if self.obstacle.max_health == 0 {
            return Err(ConfigError::ZeroObstacleHealth);
        }
        Ok(())
    }
}

/// Reasons a [`SimulationConfig`] may be rejected at construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// One of the grid spacings is zero, negative, or not finite.
    #[error("grid spacing must be strictly positive")]
    NonPositiveSpacing,
    /// The playfield limits do not describe a non-empty rectangle.
    #[error("playfield bounds are inverted or empty")]
    InvertedBounds,
    /// The obstacle field region does not describe a rectangle.
    #[error("obstacle field area is inverted")]
    InvertedFieldArea,
    /// The chain segment range contains no legal chain length.
    #[error("chain segment range {min}..={max} is empty")]
    EmptySegmentRange {
        /// Configured minimum chain length.
        min: u32,
        /// Configured maximum chain length.
        max: u32,
    },
    /// Chains could grow past the fixed path-history capacity.
    #[error("chains of {max} segments exceed the path history capacity of {capacity}")]
    SegmentRangeExceedsPath {
        /// Configured maximum chain length.
        max: u32,
        /// Fixed ring-buffer capacity.
        capacity: usize,
    },
    /// Waves would spawn no chains at all.
    #[error("maximum chain count must be at least 1")]
    ZeroChainCount,
    /// Extra-chain scaling would divide by zero.
    #[error("levels per extra chain must be at least 1")]
    ZeroLevelsPerExtraChain,
    /// Obstacles would be destroyed on creation.
    #[error("obstacle max health must be at least 1")]
    ZeroObstacleHealth,
}

#[cfg(test)]
mod tests {
    use super::{
        Bounds, ChainId, ConfigError, GridCell, GridSpacing, HorizontalDir, ObstacleId,
        Position, SegmentId, SimulationConfig, VerticalDir, PATH_HISTORY_CAPACITY,
    };
    use serde::{de::DeserializeOwned, Serialize};

    #[test]
    fn snapping_does_not_change_the_owning_cell() {
        let spacing = GridSpacing::new(0.4, 0.4);
        let samples = [
            Position::new(0.0, 0.0),
            Position::new(0.19, -0.19),
            Position::new(-8.37, 4.11),
            Position::new(6.2, -4.28),
            Position::new(0.2, 0.6),
            Position::new(-0.2, -0.6),
        ];

        for position in samples {
            let snapped = spacing.snap(position);
            assert_eq!(
                spacing.cell_of(snapped),
                spacing.cell_of(position),
                "cell changed after snapping {position:?}"
            );
            assert_eq!(
                spacing.snap(snapped),
                snapped,
                "snapping is not idempotent for {position:?}"
            );
        }
    }

    #[test]
    fn ties_round_to_even_multiples() {
        let spacing = GridSpacing::new(0.4, 0.4);
        // 4.2 / 0.4 = 10.5 sits exactly between rows 10 and 11.
        let snapped = spacing.snap(Position::new(4.2, 4.2));
        assert_eq!(spacing.cell_of(snapped).row(), 10);
        assert!((snapped.y() - 4.0).abs() < 1e-6);
    }

    #[test]
    fn bounds_clamp_each_axis_independently() {
        let bounds = Bounds::new(-1.0, 1.0, -2.0, 2.0);
        let clamped = bounds.clamp(Position::new(5.0, -9.0));
        assert!(clamped.approx_eq(Position::new(1.0, -2.0)));
        assert!(bounds.contains(clamped));
        assert!(!bounds.contains(Position::new(1.5, 0.0)));
    }

    #[test]
    fn direction_reversal_is_an_involution() {
        assert_eq!(HorizontalDir::Left.reversed(), HorizontalDir::Right);
        assert_eq!(HorizontalDir::Left.reversed().reversed(), HorizontalDir::Left);
        assert_eq!(VerticalDir::Up.reversed(), VerticalDir::Down);
        assert_eq!(VerticalDir::Down.sign(), -1.0);
    }

    #[test]
    fn default_config_passes_validation() {
        SimulationConfig::default().validate().expect("default config");
    }

    #[test]
    fn validation_rejects_degenerate_spacing() {
        let mut config = SimulationConfig::default();
        config.spacing = GridSpacing::new(0.0, 0.4);
        assert_eq!(config.validate(), Err(ConfigError::NonPositiveSpacing));
    }

    #[test]
    fn validation_rejects_chains_longer_than_the_path_history() {
        let mut config = SimulationConfig::default();
        config.chain.max_segments = PATH_HISTORY_CAPACITY as u32 + 1;
        assert_eq!(
            config.validate(),
            Err(ConfigError::SegmentRangeExceedsPath {
                max: PATH_HISTORY_CAPACITY as u32 + 1,
                capacity: PATH_HISTORY_CAPACITY,
            })
        );
    }

    #[test]
    fn validation_rejects_inverted_bounds() {
        let mut config = SimulationConfig::default();
        config.bounds = Bounds::new(1.0, -1.0, -2.0, 2.0);
        assert_eq!(config.validate(), Err(ConfigError::InvertedBounds));
    }

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn identifiers_round_trip_through_bincode() {
        assert_round_trip(&ChainId::new(3));
        assert_round_trip(&SegmentId::new(17));
        assert_round_trip(&ObstacleId::new(42));
    }

    #[test]
    fn grid_cell_round_trips_through_bincode() {
        assert_round_trip(&GridCell::new(-21, 10));
    }

    #[test]
    fn config_round_trips_through_bincode() {
        assert_round_trip(&SimulationConfig::default());
    }
}
