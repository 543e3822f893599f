#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic spawning system emitting wave and obstacle-field commands.
//!
//! The spawner reacts to [`Event::GameReset`] by regenerating the obstacle
//! field and requesting the level-zero wave. Later waves are requested
//! explicitly by the difficulty collaborator through [`Spawning::request_wave`]
//! once it observes `WaveCleared`. All randomness flows through a linear
//! congruential generator seeded at construction, so identical seeds replay
//! identical campaigns.

use std::collections::HashSet;

use centipede_core::{
    Command, Event, GridCell, HorizontalDir, Position, SimulationConfig,
};

const RNG_MULTIPLIER: u64 = 6_364_136_223_846_793_005;
const RNG_INCREMENT: u64 = 1;

/// Pure system that deterministically emits spawn commands.
#[derive(Clone, Debug)]
pub struct Spawning {
    config: SimulationConfig,
    rng_state: u64,
}

impl Spawning {
    /// Creates a new spawning system over the shared configuration.
    #[must_use]
    pub fn new(config: SimulationConfig, rng_seed: u64) -> Self {
        Self {
            config,
            rng_state: rng_seed,
        }
    }

    /// Consumes world events and emits spawn commands for fresh games.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Command>) {
        for event in events {
            if matches!(event, Event::GameReset) {
                self.generate_field(out);
                self.request_wave(0, out);
            }
        }
    }

    /// Emits the chain spawns for one wave at the provided difficulty level.
    ///
    /// Chains per wave grow by one for every configured block of levels, up
    /// to the cap. The segment floor rises with the level until only maximal
    /// chains spawn; the exact count per chain stays random within range.
    pub fn request_wave(&mut self, level: u32, out: &mut Vec<Command>) {
        let chain = self.config.chain;
        let extra_chains = level / chain.levels_per_extra_chain;
        let chain_count =
            (chain.initial_chain_count + extra_chains).clamp(1, chain.max_chain_count);

        let spread = chain.max_segments - chain.min_segments;
        let min_segments = chain.min_segments + level.min(spread);
        let spawn_y = self.config.bounds.top() + chain.spawn_height_offset;

        for _ in 0..chain_count {
            let segment_count = self.range_u32(min_segments, chain.max_segments);
            let x = self.range_f32(self.config.bounds.left(), self.config.bounds.right());
            let origin = self.config.spacing.snap(Position::new(x, spawn_y));
            let horizontal = if self.coin_flip() {
                HorizontalDir::Right
            } else {
                HorizontalDir::Left
            };
            out.push(Command::SpawnChain {
                origin,
                segment_count,
                horizontal,
            });
        }
    }

    /// Scatters the initial obstacle field across unique cells of the
    /// configured rectangle.
    ///
    /// Cells are drawn at random and deduplicated locally; the attempt
    /// budget of ten draws per obstacle bounds the loop when the rectangle
    /// is smaller than the requested count.
    fn generate_field(&mut self, out: &mut Vec<Command>) {
        let spacing = self.config.spacing;
        let area = self.config.obstacle.field_area;
        let min_column = (area.left() / spacing.horizontal()).ceil() as i32;
        let max_column = (area.right() / spacing.horizontal()).floor() as i32;
        let min_row = (area.bottom() / spacing.vertical()).ceil() as i32;
        let max_row = (area.top() / spacing.vertical()).floor() as i32;

        let target = self.config.obstacle.field_count as usize;
        let max_attempts = target * 10;
        let mut used: HashSet<GridCell> = HashSet::new();
        let mut attempts = 0;

        while used.len() < target && attempts < max_attempts {
            attempts += 1;
            let cell = GridCell::new(
                self.range_i32(min_column, max_column),
                self.range_i32(min_row, max_row),
            );
            if used.insert(cell) {
                let position = Position::new(
                    cell.column() as f32 * spacing.horizontal(),
                    cell.row() as f32 * spacing.vertical(),
                );
                out.push(Command::SpawnObstacle {
                    position,
                    poisoned: false,
                });
            }
        }
    }

    fn advance_rng(&mut self) -> u64 {
        self.rng_state = self
            .rng_state
            .wrapping_mul(RNG_MULTIPLIER)
            .wrapping_add(RNG_INCREMENT);
        self.rng_state
    }

    /// Uniform draw from the inclusive range, tolerating a collapsed range.
    fn range_u32(&mut self, min: u32, max: u32) -> u32 {
        if min >= max {
            return min;
        }
        let span = u64::from(max - min) + 1;
        min + (self.advance_rng() % span) as u32
    }

    fn range_i32(&mut self, min: i32, max: i32) -> i32 {
        if min >= max {
            return min;
        }
        let span = (i64::from(max) - i64::from(min) + 1) as u64;
        min + (self.advance_rng() % span) as i32
    }

    /// Uniform draw from `[min, max)` using the top 24 bits of the state.
    fn range_f32(&mut self, min: f32, max: f32) -> f32 {
        let unit = (self.advance_rng() >> 40) as f32 / (1u32 << 24) as f32;
        min + unit * (max - min)
    }

    // The low bits of an LCG cycle quickly; decide on the top bit.
    fn coin_flip(&mut self) -> bool {
        self.advance_rng() >> 63 == 0
    }
}

#[cfg(test)]
mod tests {
    use super::Spawning;
    use centipede_core::{Command, Event, SimulationConfig};

    fn spawner(seed: u64) -> Spawning {
        Spawning::new(SimulationConfig::default(), seed)
    }

    fn wave_commands(level: u32, seed: u64) -> Vec<Command> {
        let mut out = Vec::new();
        spawner(seed).request_wave(level, &mut out);
        out
    }

    #[test]
    fn chain_count_scales_with_difficulty_up_to_the_cap() {
        assert_eq!(wave_commands(0, 7).len(), 1);
        assert_eq!(wave_commands(5, 7).len(), 2);
        assert_eq!(wave_commands(10, 7).len(), 3);
        // The cap holds no matter how far the level climbs.
        assert_eq!(wave_commands(100, 7).len(), 3);
    }

    #[test]
    fn segment_counts_stay_inside_the_configured_range() {
        let config = SimulationConfig::default();
        for level in [0, 3, 6, 40] {
            for command in wave_commands(level, 11) {
                match command {
                    Command::SpawnChain { segment_count, .. } => {
                        assert!(segment_count >= config.chain.min_segments);
                        assert!(segment_count <= config.chain.max_segments);
                    }
                    other => panic!("unexpected command: {other:?}"),
                }
            }
        }
    }

    #[test]
    fn high_levels_raise_the_segment_floor_to_the_maximum() {
        let config = SimulationConfig::default();
        for command in wave_commands(50, 13) {
            match command {
                Command::SpawnChain { segment_count, .. } => {
                    assert_eq!(segment_count, config.chain.max_segments);
                }
                other => panic!("unexpected command: {other:?}"),
            }
        }
    }

    #[test]
    fn wave_origins_are_snapped_above_the_top_limit() {
        let config = SimulationConfig::default();
        for command in wave_commands(0, 17) {
            match command {
                Command::SpawnChain { origin, .. } => {
                    assert!(origin.x() >= config.bounds.left() - 1e-4);
                    assert!(origin.x() <= config.bounds.right() + 1e-4);
                    assert!(origin.y() > config.bounds.top());
                    assert!(config.spacing.snap(origin).approx_eq(origin));
                }
                other => panic!("unexpected command: {other:?}"),
            }
        }
    }

    #[test]
    fn reset_generates_a_deduplicated_field_and_the_first_wave() {
        let config = SimulationConfig::default();
        let mut out = Vec::new();
        spawner(23).handle(&[Event::GameReset], &mut out);

        let mut cells = std::collections::HashSet::new();
        let mut chains = 0;
        for command in &out {
            match command {
                Command::SpawnObstacle { position, poisoned } => {
                    assert!(!poisoned);
                    assert!(config.obstacle.field_area.contains(*position));
                    assert!(cells.insert(config.spacing.cell_of(*position)));
                }
                Command::SpawnChain { .. } => chains += 1,
                other => panic!("unexpected command: {other:?}"),
            }
        }
        assert_eq!(cells.len(), config.obstacle.field_count as usize);
        assert_eq!(chains, 1);
    }

    #[test]
    fn identical_seeds_replay_identical_campaigns() {
        let mut first = Vec::new();
        let mut second = Vec::new();
        let mut left = spawner(0x4d59_5df4_d0f3_3173);
        let mut right = spawner(0x4d59_5df4_d0f3_3173);

        left.handle(&[Event::GameReset], &mut first);
        right.handle(&[Event::GameReset], &mut second);
        left.request_wave(3, &mut first);
        right.request_wave(3, &mut second);

        assert_eq!(first, second);
    }

    #[test]
    fn different_seeds_diverge() {
        let mut first = Vec::new();
        let mut second = Vec::new();
        spawner(1).handle(&[Event::GameReset], &mut first);
        spawner(2).handle(&[Event::GameReset], &mut second);
        assert_ne!(first, second);
    }
}
