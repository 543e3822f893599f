#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic movement system that plans fixed-step chain advances.
//!
//! The planner consumes [`Event::TimeAdvanced`] notifications together with
//! immutable world views, integrates elapsed time into grid-sized steps, and
//! emits one [`Command::AdvanceChain`] per chain per step. Every decision in
//! a step is computed from the same snapshot before any decision is applied,
//! so chains only interact through the shared obstacle grid, never through
//! each other's movement within a step.

use std::time::Duration;

use centipede_core::{
    Command, Event, Position, SimulationConfig, StepDecision, VerticalDir,
    POSITION_EPSILON,
};
use centipede_world::query::{ChainSnapshot, ChainView, ObstacleView};

/// Pure system that reacts to world events and emits movement commands.
#[derive(Clone, Debug)]
pub struct Movement {
    config: SimulationConfig,
    accumulator: Duration,
    difficulty: u32,
    paused: bool,
}

impl Movement {
    /// Creates a movement planner over the shared simulation configuration.
    #[must_use]
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            config,
            accumulator: Duration::ZERO,
            difficulty: 0,
            paused: false,
        }
    }

    /// Updates the difficulty level supplied by the external collaborator.
    pub fn set_difficulty(&mut self, level: u32) {
        self.difficulty = level;
    }

    /// Pauses or resumes stepping. Paused chains skip steps indefinitely
    /// rather than erroring; elapsed time is simply not integrated.
    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Current traversal speed: the configured base scaled linearly with the
    /// difficulty level, or zero while paused.
    #[must_use]
    pub fn effective_speed(&self) -> f32 {
        if self.paused {
            return 0.0;
        }
        let growth = self.config.chain.speed_growth_per_level;
        self.config.chain.base_speed * (1.0 + growth * self.difficulty as f32)
    }

    /// Consumes world events and immutable views to emit movement commands.
    ///
    /// A step fires once the accumulated time covers one grid cell at the
    /// current speed; the accumulator then resets. With a non-positive
    /// effective speed no time is integrated and no step is taken.
    pub fn handle(
        &mut self,
        events: &[Event],
        chains: &ChainView,
        obstacles: ObstacleView<'_>,
        out: &mut Vec<Command>,
    ) {
        let speed = self.effective_speed();
        if speed <= 0.0 {
            return;
        }

        let mut accumulated = Duration::ZERO;
        for event in events {
            if let Event::TimeAdvanced { dt } = event {
                accumulated = accumulated.saturating_add(*dt);
            }
        }
        if accumulated.is_zero() {
            return;
        }

        self.accumulator = self.accumulator.saturating_add(accumulated);
        let step_seconds = self.config.spacing.horizontal() / speed;
        if !(step_seconds > 0.0 && step_seconds.is_finite()) {
            return;
        }
        let time_per_step = Duration::from_secs_f32(step_seconds);
        if time_per_step.is_zero() || self.accumulator < time_per_step {
            return;
        }
        self.accumulator = Duration::ZERO;

        for chain in chains.iter().filter(|chain| chain.segment_count > 0) {
            let decision = self.plan_step(chain, &obstacles);
            out.push(Command::AdvanceChain {
                chain: chain.id,
                decision,
            });
        }
    }

    /// Decides the next head cell for a single chain.
    fn plan_step(&self, chain: &ChainSnapshot, obstacles: &ObstacleView<'_>) -> StepDecision {
        let bounds = self.config.bounds;
        let head = chain.head;

        if head.y() > bounds.top() {
            return self.entering_step(chain);
        }
        if chain.diving {
            return self.diving_step(chain);
        }
        self.horizontal_step(chain, obstacles)
    }

    /// Streams the chain onto the field one row at a time, ignoring
    /// obstacles. The descent is not clamped against the top limit, so a
    /// chain spawned several rows up takes one step per row to arrive.
    fn entering_step(&self, chain: &ChainSnapshot) -> StepDecision {
        let spacing = self.config.spacing;
        let lowered = (chain.head.y() - spacing.vertical()).max(self.config.bounds.bottom());
        StepDecision {
            next_head: spacing.snap(Position::new(chain.head.x(), lowered)),
            horizontal: chain.horizontal,
            vertical: chain.vertical,
            diving: chain.diving,
            dive_started: false,
        }
    }

    /// Continues a committed dive; flips to ascend once the floor is hit.
    fn diving_step(&self, chain: &ChainSnapshot) -> StepDecision {
        let next = self.vertical_step(chain.head, VerticalDir::Down);
        let floor_reached = next.y() <= self.config.bounds.bottom() + POSITION_EPSILON
            || next.approx_eq(chain.head);
        StepDecision {
            next_head: next,
            horizontal: chain.horizontal,
            vertical: if floor_reached {
                VerticalDir::Up
            } else {
                chain.vertical
            },
            diving: !floor_reached,
            dive_started: false,
        }
    }

    /// Normal lateral traversal: advance, dive on poison, or bounce.
    fn horizontal_step(
        &self,
        chain: &ChainSnapshot,
        obstacles: &ObstacleView<'_>,
    ) -> StepDecision {
        let bounds = self.config.bounds;
        let spacing = self.config.spacing;
        let candidate = Position::new(
            chain.head.x() + chain.horizontal.sign() * spacing.horizontal(),
            chain.head.y(),
        );

        if obstacles.poisoned_at(candidate).is_some() {
            // The dive begins immediately rather than stepping onto the
            // poisoned cell.
            return StepDecision {
                next_head: self.vertical_step(chain.head, VerticalDir::Down),
                horizontal: chain.horizontal,
                vertical: chain.vertical,
                diving: true,
                dive_started: true,
            };
        }

        let blocked = candidate.x() < bounds.left()
            || candidate.x() > bounds.right()
            || obstacles.occupied(candidate);
        if blocked {
            return self.blocked_step(chain);
        }

        StepDecision {
            next_head: spacing.snap(candidate),
            horizontal: chain.horizontal,
            vertical: chain.vertical,
            diving: false,
            dive_started: false,
        }
    }

    /// Bounces off a blocked cell: reverse laterally and take one vertical
    /// step, turning around at whichever limit the step lands on.
    fn blocked_step(&self, chain: &ChainSnapshot) -> StepDecision {
        let bounds = self.config.bounds;
        let horizontal = chain.horizontal.reversed();
        let mut vertical = chain.vertical;
        let mut step = self.vertical_step(chain.head, vertical);

        if step.approx_eq(chain.head) {
            vertical = vertical.reversed();
            step = self.vertical_step(chain.head, vertical);
        }

        if step.y() <= bounds.bottom() + POSITION_EPSILON {
            vertical = VerticalDir::Up;
        } else if step.y() >= bounds.top() - POSITION_EPSILON {
            vertical = VerticalDir::Down;
        }

        StepDecision {
            next_head: step,
            horizontal,
            vertical,
            diving: false,
            dive_started: false,
        }
    }

    /// One grid row in the provided direction, clamped into the playfield
    /// and snapped back to the grid.
    fn vertical_step(&self, head: Position, direction: VerticalDir) -> Position {
        let bounds = self.config.bounds;
        let spacing = self.config.spacing;
        let lowered = (head.y() + direction.sign() * spacing.vertical())
            .clamp(bounds.bottom(), bounds.top());
        spacing.snap(Position::new(head.x(), lowered))
    }
}
