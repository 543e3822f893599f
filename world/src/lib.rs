#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state for the Centipede Garden simulation.
//!
//! The world owns the obstacle grid, the active-chain collection, and the
//! pools that lease segment and obstacle instances. All mutation flows
//! through [`apply`], which executes one [`Command`] and appends the
//! resulting [`Event`]s to a caller-provided outbox. Systems and adapters
//! observe the world exclusively through the [`query`] module.

mod chains;
mod obstacles;
mod pool;

use std::collections::BTreeMap;

use centipede_core::{
    ChainId, Command, ConfigError, Event, HorizontalDir, Position, SegmentId,
    SimulationConfig, WELCOME_BANNER,
};

use chains::Chain;
use obstacles::{ObstacleGrid, PoisonResult};
use pool::IdPool;

/// Membership record for a leased segment.
#[derive(Clone, Copy, Debug)]
struct SegmentState {
    chain: ChainId,
    index: usize,
    target: Position,
}

/// Represents the authoritative simulation state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    config: SimulationConfig,
    obstacles: ObstacleGrid,
    chains: BTreeMap<ChainId, Chain>,
    segments: BTreeMap<SegmentId, SegmentState>,
    segment_pool: IdPool,
    next_chain_id: u32,
}

impl World {
    /// Creates a new world from validated configuration.
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            banner: WELCOME_BANNER,
            obstacles: ObstacleGrid::new(config.spacing, config.bounds, config.obstacle.max_health),
            chains: BTreeMap::new(),
            segments: BTreeMap::new(),
            segment_pool: IdPool::new(),
            next_chain_id: 0,
            config,
        })
    }

    fn reset(&mut self) {
        self.chains.clear();
        self.segments.clear();
        self.segment_pool.clear();
        self.obstacles.clear();
        self.next_chain_id = 0;
    }

    fn allocate_chain_id(&mut self) -> ChainId {
        let id = ChainId::new(self.next_chain_id);
        self.next_chain_id = self.next_chain_id.wrapping_add(1);
        id
    }

    fn spawn_chain(
        &mut self,
        origin: Position,
        segment_count: u32,
        horizontal: HorizontalDir,
        out_events: &mut Vec<Event>,
    ) {
        if segment_count == 0 {
            return;
        }

        let chain_id = self.allocate_chain_id();
        let stack_spacing = self.config.spacing.horizontal();
        let count = segment_count as usize;

        let mut segment_ids = Vec::with_capacity(count);
        let mut positions = Vec::with_capacity(count);
        for index in 0..count {
            let segment = SegmentId::new(self.segment_pool.lease());
            let position =
                Position::new(origin.x(), origin.y() + index as f32 * stack_spacing);
            let _ = self.segments.insert(
                segment,
                SegmentState {
                    chain: chain_id,
                    index,
                    target: position,
                },
            );
            segment_ids.push(segment);
            positions.push(position);
        }

        let _ = self
            .chains
            .insert(chain_id, Chain::new(segment_ids, &positions, horizontal));
        out_events.push(Event::ChainSpawned {
            chain: chain_id,
            segment_count,
        });
    }

    /// Rewrites chain/index membership and buffer-derived targets for every
    /// segment of the chain, so index 0 is always the current head.
    fn refresh_chain(&mut self, chain_id: ChainId) {
        let Some(chain) = self.chains.get(&chain_id) else {
            return;
        };
        for (index, segment) in chain.segments.iter().enumerate() {
            if let Some(state) = self.segments.get_mut(segment) {
                state.chain = chain_id;
                state.index = index;
                state.target = chain.target_for(index);
            }
        }
    }

    fn handle_segment_hit(&mut self, segment: SegmentId, out_events: &mut Vec<Event>) {
        // Stale identifiers are benign double notifications.
        let Some(seg_state) = self.segments.get(&segment).copied() else {
            return;
        };
        let chain_id = seg_state.chain;
        let index = seg_state.index;
        {
            let Some(chain) = self.chains.get(&chain_id) else {
                return;
            };
            if chain.segments.get(index) != Some(&segment) {
                return;
            }
        }

        // An obstacle grows where the segment fell.
        let outcome = self.obstacles.spawn(seg_state.target, false);
        if outcome.created {
            out_events.push(Event::ObstacleSpawned {
                obstacle: outcome.obstacle,
                cell: outcome.cell,
            });
        }
        out_events.push(Event::SegmentDestroyed {
            segment,
            points: self.config.segment_points,
        });

        let _ = self.segments.remove(&segment);
        self.segment_pool.release(segment.get());

        let (emptied, spawned) = {
            let Some(chain) = self.chains.get_mut(&chain_id) else {
                return;
            };
            let _ = chain.segments.remove(index);
            if chain.is_empty() {
                (true, None)
            } else {
                (false, chain.split(index))
            }
        };

        if emptied {
            let _ = self.chains.remove(&chain_id);
            out_events.push(Event::ChainRemoved { chain: chain_id });
            if self.chains.is_empty() {
                out_events.push(Event::WaveCleared);
            }
            return;
        }

        if let Some(new_chain) = spawned {
            let new_id = self.allocate_chain_id();
            let _ = self.chains.insert(new_id, new_chain);
            out_events.push(Event::ChainSplit {
                source: chain_id,
                spawned: new_id,
            });
            self.refresh_chain(new_id);
        }
        self.refresh_chain(chain_id);
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => {
            out_events.push(Event::TimeAdvanced { dt });
        }
        Command::Reset => {
            world.reset();
            out_events.push(Event::GameReset);
        }
        Command::SpawnChain {
            origin,
            segment_count,
            horizontal,
        } => {
            world.spawn_chain(origin, segment_count, horizontal, out_events);
        }
        Command::AdvanceChain { chain, decision } => {
            let applied = match world.chains.get_mut(&chain) {
                Some(state) if !state.is_empty() => {
                    state.advance_path(decision.next_head);
                    state.horizontal = decision.horizontal;
                    state.vertical = decision.vertical;
                    state.diving = decision.diving;
                    true
                }
                _ => false,
            };
            if applied {
                if decision.dive_started {
                    out_events.push(Event::DiveStarted { chain });
                }
                world.refresh_chain(chain);
            }
        }
        Command::SpawnObstacle { position, poisoned } => {
            let outcome = world.obstacles.spawn(position, poisoned);
            if outcome.created {
                out_events.push(Event::ObstacleSpawned {
                    obstacle: outcome.obstacle,
                    cell: outcome.cell,
                });
            } else if outcome.newly_poisoned {
                out_events.push(Event::ObstaclePoisoned {
                    obstacle: outcome.obstacle,
                });
            }
        }
        Command::DamageObstacle { obstacle } => {
            if let Some(remaining_health) = world.obstacles.damage(obstacle) {
                out_events.push(Event::ObstacleDamaged {
                    obstacle,
                    remaining_health,
                    points: world.config.obstacle.hit_points,
                });
            }
        }
        Command::ReleaseObstacle { obstacle } => {
            if let Some(state) = world.obstacles.release(obstacle) {
                if state.health == 0 {
                    out_events.push(Event::ObstacleDestroyed {
                        obstacle,
                        cell: state.cell,
                        points: world.config.obstacle.destroy_bonus,
                    });
                } else {
                    out_events.push(Event::ObstacleReleased {
                        obstacle,
                        cell: state.cell,
                    });
                }
            }
        }
        Command::PoisonObstacle { position } => {
            if let PoisonResult::Poisoned(obstacle) = world.obstacles.poison(position) {
                out_events.push(Event::ObstaclePoisoned { obstacle });
            }
        }
        Command::HitSegment { segment } => {
            world.handle_segment_hit(segment, out_events);
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use centipede_core::{
        Bounds, ChainId, GridCell, HorizontalDir, ObstacleId, Position, SegmentId,
        SimulationConfig, VerticalDir,
    };

    use super::{obstacles::ObstacleGrid, World};

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Provides read-only access to the simulation configuration.
    #[must_use]
    pub fn config(world: &World) -> &SimulationConfig {
        &world.config
    }

    /// Number of chains currently in the active set.
    #[must_use]
    pub fn active_chain_count(world: &World) -> usize {
        world.chains.len()
    }

    /// Number of segment instances currently leased from the pool.
    #[must_use]
    pub fn leased_segment_count(world: &World) -> usize {
        world.segment_pool.live_count()
    }

    /// Captures a read-only view of the active chains in identifier order.
    #[must_use]
    pub fn chain_view(world: &World) -> ChainView {
        let snapshots = world
            .chains
            .iter()
            .map(|(id, chain)| ChainSnapshot {
                id: *id,
                head: chain.head_position(),
                horizontal: chain.horizontal,
                vertical: chain.vertical,
                diving: chain.diving,
                segment_count: chain.len(),
            })
            .collect();
        ChainView { snapshots }
    }

    /// Captures a read-only view of every leased segment in identifier order.
    #[must_use]
    pub fn segment_view(world: &World) -> SegmentView {
        let snapshots = world
            .segments
            .iter()
            .map(|(id, state)| SegmentSnapshot {
                id: *id,
                chain: state.chain,
                index: state.index,
                target: state.target,
            })
            .collect();
        SegmentView { snapshots }
    }

    /// Exposes the obstacle grid's read-only occupancy and poison queries.
    #[must_use]
    pub fn obstacle_view(world: &World) -> ObstacleView<'_> {
        ObstacleView {
            grid: &world.obstacles,
        }
    }

    /// Captures the state of a single obstacle, if it is live.
    #[must_use]
    pub fn obstacle_snapshot(world: &World, obstacle: ObstacleId) -> Option<ObstacleSnapshot> {
        world.obstacles.get(obstacle).map(|state| ObstacleSnapshot {
            id: obstacle,
            cell: state.cell,
            position: state.position,
            health: state.health,
            poisoned: state.poisoned,
        })
    }

    /// Read-only snapshot describing all active chains.
    #[derive(Clone, Debug)]
    pub struct ChainView {
        snapshots: Vec<ChainSnapshot>,
    }

    impl ChainView {
        /// Iterator over the captured chain snapshots in identifier order.
        pub fn iter(&self) -> impl Iterator<Item = &ChainSnapshot> {
            self.snapshots.iter()
        }

        /// Consumes the view, yielding the underlying snapshots.
        #[must_use]
        pub fn into_vec(self) -> Vec<ChainSnapshot> {
            self.snapshots
        }

        /// Number of chains captured by the view.
        #[must_use]
        pub fn len(&self) -> usize {
            self.snapshots.len()
        }

        /// Reports whether the active set was empty when captured.
        #[must_use]
        pub fn is_empty(&self) -> bool {
            self.snapshots.is_empty()
        }
    }

    /// Immutable representation of a single chain's state used for queries.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct ChainSnapshot {
        /// Unique identifier assigned to the chain.
        pub id: ChainId,
        /// Current head position read from the path buffer.
        pub head: Position,
        /// Lateral traversal direction.
        pub horizontal: HorizontalDir,
        /// Vertical traversal direction.
        pub vertical: VerticalDir,
        /// Whether the chain is committed to a dive.
        pub diving: bool,
        /// Number of segments the chain currently carries.
        pub segment_count: usize,
    }

    /// Read-only snapshot describing all leased segments.
    #[derive(Clone, Debug)]
    pub struct SegmentView {
        snapshots: Vec<SegmentSnapshot>,
    }

    impl SegmentView {
        /// Iterator over the captured segment snapshots in identifier order.
        pub fn iter(&self) -> impl Iterator<Item = &SegmentSnapshot> {
            self.snapshots.iter()
        }

        /// Consumes the view, yielding the underlying snapshots.
        #[must_use]
        pub fn into_vec(self) -> Vec<SegmentSnapshot> {
            self.snapshots
        }
    }

    /// Immutable representation of a single segment's membership record.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct SegmentSnapshot {
        /// Unique identifier assigned to the segment.
        pub id: SegmentId,
        /// Chain that currently owns the segment.
        pub chain: ChainId,
        /// Zero-based position within the owning chain; 0 is the head.
        pub index: usize,
        /// World position the segment is moving toward.
        pub target: Position,
    }

    /// Immutable representation of a single obstacle's state.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct ObstacleSnapshot {
        /// Unique identifier assigned to the obstacle.
        pub id: ObstacleId,
        /// Cell the obstacle occupies.
        pub cell: GridCell,
        /// Snapped world position of the obstacle.
        pub position: Position,
        /// Remaining health.
        pub health: u8,
        /// Whether the obstacle forces approaching chains into a dive.
        pub poisoned: bool,
    }

    /// Read-only view into the sparse obstacle grid.
    #[derive(Clone, Copy, Debug)]
    pub struct ObstacleView<'a> {
        grid: &'a ObstacleGrid,
    }

    impl ObstacleView<'_> {
        /// Reports whether the cell owning `position` holds an obstacle.
        #[must_use]
        pub fn occupied(&self, position: Position) -> bool {
            self.grid.occupied(position)
        }

        /// Reports whether the cell holds an obstacle.
        #[must_use]
        pub fn occupied_cell(&self, cell: GridCell) -> bool {
            self.grid.occupied_cell(cell)
        }

        /// Returns the poisoned obstacle owning `position`, if any.
        #[must_use]
        pub fn poisoned_at(&self, position: Position) -> Option<ObstacleId> {
            self.grid.poisoned_at(position)
        }

        /// Reports whether any of the eight surrounding cells is occupied.
        #[must_use]
        pub fn has_neighbor(&self, cell: GridCell) -> bool {
            self.grid.has_neighbor(cell)
        }

        /// Counts live obstacles whose position falls inside `area`.
        #[must_use]
        pub fn count_in_area(&self, area: &Bounds) -> usize {
            self.grid.count_in_area(area)
        }

        /// Number of live obstacles.
        #[must_use]
        pub fn len(&self) -> usize {
            self.grid.len()
        }

        /// Reports whether the grid holds no obstacles.
        #[must_use]
        pub fn is_empty(&self) -> bool {
            self.grid.len() == 0
        }
    }
}
