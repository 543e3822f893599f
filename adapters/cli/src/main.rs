#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless command-line driver for the Centipede Garden simulation.
//!
//! The binary owns the collaborator roles the simulation core deliberately
//! externalizes: it advances the difficulty level when a wave clears, tallies
//! the points carried on destruction events, and optionally plays a scripted
//! shooter so splits and scoring are observable without a player.

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use centipede_core::{Command, Event, SimulationConfig};
use centipede_system_movement::Movement;
use centipede_system_spawning::Spawning;
use centipede_world::{self as world, query, World};

#[derive(Debug, Parser)]
#[command(name = "centipede-garden", about = "Deterministic Centipede Garden simulation driver")]
struct Args {
    /// Number of fixed simulation ticks to run.
    #[arg(long, default_value_t = 600)]
    ticks: u32,

    /// Milliseconds of simulated time per tick.
    #[arg(long, default_value_t = 16)]
    tick_ms: u64,

    /// Spawner seed; drawn at random when omitted.
    #[arg(long)]
    seed: Option<u64>,

    /// Starting difficulty level.
    #[arg(long, default_value_t = 0)]
    difficulty: u32,

    /// Shoot the lowest segment every N ticks; 0 disables the shooter.
    #[arg(long, default_value_t = 0)]
    shoot_every: u32,
}

/// Counters accumulated from the event stream over the whole run.
#[derive(Debug, Default)]
struct Tally {
    chains_spawned: u32,
    chains_split: u32,
    dives_started: u32,
    waves_cleared: u32,
    segments_destroyed: u32,
    obstacles_spawned: u32,
    points: u64,
}

impl Tally {
    fn record(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::ChainSpawned { .. } => self.chains_spawned += 1,
                Event::ChainSplit { .. } => self.chains_split += 1,
                Event::DiveStarted { .. } => self.dives_started += 1,
                Event::WaveCleared => self.waves_cleared += 1,
                Event::SegmentDestroyed { points, .. } => {
                    self.segments_destroyed += 1;
                    self.points += u64::from(*points);
                }
                Event::ObstacleSpawned { .. } => self.obstacles_spawned += 1,
                Event::ObstacleDamaged { points, .. }
                | Event::ObstacleDestroyed { points, .. } => {
                    self.points += u64::from(*points);
                }
                _ => {}
            }
        }
    }
}

/// Difficulty and scoring collaborator wrapped around the pure systems.
struct Driver {
    movement: Movement,
    spawning: Spawning,
    level: u32,
    tally: Tally,
}

impl Driver {
    fn new(config: SimulationConfig, seed: u64, level: u32) -> Self {
        let mut movement = Movement::new(config);
        movement.set_difficulty(level);
        Self {
            movement,
            spawning: Spawning::new(config, seed),
            level,
            tally: Tally::default(),
        }
    }

    /// Feeds events through the systems and applies the commands they emit,
    /// looping until the world goes quiet for this tick.
    fn pump(&mut self, world: &mut World, pending_events: Vec<Event>) {
        let mut events = pending_events;

        loop {
            if events.is_empty() {
                break;
            }
            self.tally.record(&events);

            let mut commands = Vec::new();
            for event in &events {
                if matches!(event, Event::WaveCleared) {
                    self.level += 1;
                    self.movement.set_difficulty(self.level);
                    self.spawning.request_wave(self.level, &mut commands);
                }
            }
            self.spawning.handle(&events, &mut commands);

            let chain_view = query::chain_view(world);
            let obstacle_view = query::obstacle_view(world);
            self.movement
                .handle(&events, &chain_view, obstacle_view, &mut commands);

            if commands.is_empty() {
                break;
            }

            events.clear();
            for command in commands {
                let mut generated = Vec::new();
                world::apply(world, command, &mut generated);
                events.extend(generated);
            }
        }
    }
}

/// Identifies the segment nearest the bottom of the playfield.
fn lowest_segment(world: &World) -> Option<centipede_core::SegmentId> {
    query::segment_view(world)
        .into_vec()
        .into_iter()
        .min_by(|a, b| {
            a.target
                .y()
                .partial_cmp(&b.target.y())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|snapshot| snapshot.id)
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = SimulationConfig::default();

    let base_seed = args.seed.unwrap_or_else(rand::random);
    let spawner_seed = ChaCha8Rng::seed_from_u64(base_seed).next_u64();

    let mut world = World::new(config)?;
    println!("{}", query::welcome_banner(&world));
    println!("seed: {base_seed:#018x}");

    let mut driver = Driver::new(config, spawner_seed, args.difficulty);

    let mut events = Vec::new();
    world::apply(&mut world, Command::Reset, &mut events);
    driver.pump(&mut world, events);

    let dt = Duration::from_millis(args.tick_ms);
    for tick in 1..=args.ticks {
        if args.shoot_every > 0 && tick % args.shoot_every == 0 {
            if let Some(segment) = lowest_segment(&world) {
                let mut events = Vec::new();
                world::apply(&mut world, Command::HitSegment { segment }, &mut events);
                driver.pump(&mut world, events);
            }
        }

        let mut events = Vec::new();
        world::apply(&mut world, Command::Tick { dt }, &mut events);
        driver.pump(&mut world, events);
    }

    let tally = &driver.tally;
    println!("ticks simulated:    {}", args.ticks);
    println!("difficulty reached: {}", driver.level);
    println!("waves cleared:      {}", tally.waves_cleared);
    println!("chains spawned:     {}", tally.chains_spawned);
    println!("chains split:       {}", tally.chains_split);
    println!("dives started:      {}", tally.dives_started);
    println!("segments destroyed: {}", tally.segments_destroyed);
    println!("obstacles spawned:  {}", tally.obstacles_spawned);
    println!("points awarded:     {}", tally.points);
    println!(
        "obstacles alive:    {} ({} inside the field rectangle)",
        query::obstacle_view(&world).len(),
        query::obstacle_view(&world).count_in_area(&config.obstacle.field_area),
    );
    println!("chains active:      {}", query::active_chain_count(&world));

    Ok(())
}
