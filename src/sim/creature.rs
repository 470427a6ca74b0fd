//! Creature movement, growth, and collision
//!
//! The body is an ordered run of cells, head first. A tick asks for the
//! candidate head with `move_head`, checks it with `collision`, then commits
//! it with either `step` (length unchanged) or `grow` (length + 1).

use std::collections::{HashSet, VecDeque};

use glam::IVec2;
use serde::{Deserialize, Serialize};

use super::events::CollisionCause;
use super::state::{Cell, Direction};

/// Starting body, head first
pub const START_BODY: [(i32, i32); 3] = [(5, 10), (4, 10), (3, 10)];

/// Whether the body is still a live creature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Vitality {
    Alive,
    /// Body handed to the particle engine after a terminal collision
    Collapsed,
}

/// What the tick is about to do with a candidate head
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    /// Ordinary movement: the tail vacates its cell this tick
    Step,
    /// Consumption: the tail stays
    Grow,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Creature {
    body: VecDeque<Cell>,
    /// Direction committed by the last `move_head`
    heading: Direction,
    /// Direction the next `move_head` will commit
    queued: Direction,
    tile_count: i32,
    vitality: Vitality,
}

impl Creature {
    pub fn new(tile_count: i32) -> Self {
        let mut creature = Self {
            body: VecDeque::new(),
            heading: Direction::Right,
            queued: Direction::Right,
            tile_count,
            vitality: Vitality::Alive,
        };
        creature.reset(tile_count);
        creature
    }

    /// Rebuild the starting body for a grid of `tile_count` cells
    pub fn reset(&mut self, tile_count: i32) {
        self.tile_count = tile_count;
        self.body = START_BODY
            .iter()
            .map(|&(x, y)| IVec2::new(x, y))
            .collect();
        self.clamp_into_grid();
        self.heading = Direction::Right;
        self.queued = Direction::Right;
        self.vitality = Vitality::Alive;
    }

    /// Adopt a new grid size, pulling any out-of-bounds segment back inside
    pub fn set_tile_count(&mut self, tile_count: i32) {
        self.tile_count = tile_count;
        self.clamp_into_grid();
    }

    fn clamp_into_grid(&mut self) {
        let max = IVec2::splat((self.tile_count - 1).max(0));
        let mut seen = HashSet::with_capacity(self.body.len());
        // Clamping can fold segments onto each other; keep the first of each
        self.body = self
            .body
            .iter()
            .map(|cell| cell.clamp(IVec2::ZERO, max))
            .filter(|cell| seen.insert(*cell))
            .collect();
    }

    pub fn body(&self) -> &VecDeque<Cell> {
        &self.body
    }

    pub fn head(&self) -> Option<Cell> {
        self.body.front().copied()
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    pub fn heading(&self) -> Direction {
        self.heading
    }

    pub fn queued(&self) -> Direction {
        self.queued
    }

    pub fn tile_count(&self) -> i32 {
        self.tile_count
    }

    pub fn is_collapsed(&self) -> bool {
        self.vitality == Vitality::Collapsed
    }

    pub fn occupies(&self, cell: Cell) -> bool {
        self.body.contains(&cell)
    }

    /// Queue a direction for the next tick.
    ///
    /// Returns false (and changes nothing) when `candidate` reverses the
    /// committed heading.
    pub fn set_direction(&mut self, candidate: Direction) -> bool {
        if candidate == self.heading.opposite() {
            return false;
        }
        self.queued = candidate;
        true
    }

    /// Commit the queued direction and return the candidate head.
    ///
    /// The body is not touched.
    pub fn move_head(&mut self) -> Cell {
        self.heading = self.queued;
        let head = self.head().unwrap_or(IVec2::ZERO);
        head + self.heading.delta()
    }

    /// Classify a candidate head, or `None` if the move is legal.
    ///
    /// The current head is never an obstacle. The tail only counts for
    /// `StepKind::Grow`, since on an ordinary step it moves out of the way
    /// on the same tick.
    pub fn collision(&self, candidate: Cell, kind: StepKind) -> Option<CollisionCause> {
        let bounds = 0..self.tile_count;
        if !bounds.contains(&candidate.x) || !bounds.contains(&candidate.y) {
            return Some(CollisionCause::Wall);
        }

        let obstacles = match kind {
            StepKind::Grow => self.body.len(),
            StepKind::Step => self.body.len().saturating_sub(1),
        };
        let hit = self
            .body
            .iter()
            .take(obstacles)
            .skip(1)
            .any(|&segment| segment == candidate);

        hit.then_some(CollisionCause::SelfHit)
    }

    /// Boolean form of [`Creature::collision`]
    pub fn check_collision(&self, candidate: Cell, kind: StepKind) -> bool {
        self.collision(candidate, kind).is_some()
    }

    /// Prepend `head` and keep the tail (length + 1)
    pub fn grow(&mut self, head: Cell) {
        self.body.push_front(head);
    }

    /// Prepend `head` and drop the tail (length unchanged)
    pub fn step(&mut self, head: Cell) {
        self.body.pop_back();
        self.body.push_front(head);
    }

    /// Enter the terminal phase. The body stays in place; the returned
    /// copy of the segments feeds the disintegration burst.
    pub fn collapse(&mut self) -> Vec<Cell> {
        self.vitality = Vitality::Collapsed;
        self.body.iter().copied().collect()
    }
}
