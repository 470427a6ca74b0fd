//! Simulation state and core types
//!
//! `SimulationState` is owned by the scheduler and lent to the tick for the
//! duration of a single call.

use glam::{IVec2, Vec2};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::creature::Creature;
use super::events::GameEvent;
use super::placement::{Placement, place_item};
use crate::color::{self, Color};
use crate::settings::Settings;

/// A grid cell; `x` grows rightward, `y` grows downward
pub type Cell = IVec2;

/// Movement direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// Unit displacement in grid space
    pub fn delta(self) -> IVec2 {
        match self {
            Direction::Up => IVec2::new(0, -1),
            Direction::Down => IVec2::new(0, 1),
            Direction::Left => IVec2::new(-1, 0),
            Direction::Right => IVec2::new(1, 0),
        }
    }
}

/// Rarity class of an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemTier {
    Plain,
    TierA,
    TierB,
}

impl ItemTier {
    pub fn is_special(self) -> bool {
        !matches!(self, ItemTier::Plain)
    }
}

/// The single live item on the board
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub cell: Cell,
    pub tier: ItemTier,
    /// Randomized color, only set for plain items
    pub color: Option<Color>,
}

impl Item {
    /// Color the item should be drawn with
    pub fn display_color(&self) -> Color {
        match self.tier {
            ItemTier::Plain => self.color.unwrap_or(Color::WHITE),
            ItemTier::TierA => color::TIER_A,
            ItemTier::TierB => color::TIER_B,
        }
    }
}

/// Current phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunPhase {
    /// Reset done, waiting for `start()`
    Ready,
    /// Ticks are being executed
    Running,
    /// Ticks suppressed; particles keep decaying
    Paused,
    /// Terminal collision happened
    GameOver,
}

/// Consecutive captures inside the combo window
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Combo {
    pub count: u32,
    pub last_capture_ms: Option<f64>,
}

impl Combo {
    /// Record a capture at `now_ms`, returning the new combo count
    pub fn register(&mut self, now_ms: f64, window_ms: f64) -> u32 {
        self.count = match self.last_capture_ms {
            Some(last) if now_ms - last < window_ms => self.count + 1,
            _ => 1,
        };
        self.last_capture_ms = Some(now_ms);
        self.count
    }
}

/// Board geometry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    /// Pixel size of one cell
    pub cell_size: f32,
    /// Cells per side (the board is square)
    pub tile_count: i32,
}

impl Grid {
    pub fn contains(&self, cell: Cell) -> bool {
        (0..self.tile_count).contains(&cell.x) && (0..self.tile_count).contains(&cell.y)
    }

    pub fn cell_center(&self, cell: Cell) -> Vec2 {
        crate::cell_center(cell, self.cell_size)
    }

    /// Board side length in pixels
    pub fn board_size(&self) -> f32 {
        self.tile_count as f32 * self.cell_size
    }
}

/// Everything one run needs; exclusively owned by the scheduler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationState {
    pub grid: Grid,
    pub phase: RunPhase,
    /// Every capture counts
    pub score: u32,
    /// Tier-A and tier-B captures only
    pub special_captures: u32,
    pub level: u32,
    pub combo: Combo,
    /// Tick rate multiplier (tick interval = base / speed)
    pub speed: f32,
    pub item: Item,
    pub creature: Creature,
    /// Current creature color
    pub tint: Color,
    /// Simulation ticks executed this run
    pub time_ticks: u64,
}

impl SimulationState {
    /// Create a state ready for a first run
    pub fn new<R: Rng + ?Sized>(settings: &Settings, rng: &mut R) -> (Self, Vec<GameEvent>) {
        let grid = Grid {
            cell_size: settings.cell_size,
            tile_count: settings.tile_count,
        };
        let creature = Creature::new(grid.tile_count);
        let mut state = Self {
            grid,
            phase: RunPhase::Ready,
            score: 0,
            special_captures: 0,
            level: 1,
            combo: Combo::default(),
            speed: settings.speed,
            item: Item {
                cell: IVec2::ONE,
                tier: ItemTier::Plain,
                color: None,
            },
            creature,
            tint: color::CREATURE_NEUTRAL,
            time_ticks: 0,
        };
        let events = state.reset(settings, rng);
        (state, events)
    }

    /// Start over: new creature, zeroed counters, fresh item
    pub fn reset<R: Rng + ?Sized>(&mut self, settings: &Settings, rng: &mut R) -> Vec<GameEvent> {
        self.creature.reset(self.grid.tile_count);
        self.phase = RunPhase::Ready;
        self.score = 0;
        self.special_captures = 0;
        self.level = 1;
        self.combo = Combo::default();
        self.speed = settings.speed;
        self.tint = color::CREATURE_NEUTRAL;
        self.time_ticks = 0;

        let mut events = vec![GameEvent::RunReset];
        self.respawn_item(settings.placement_attempts, rng, &mut events);
        events
    }

    /// Place the item for the next capture and report it
    pub fn respawn_item<R: Rng + ?Sized>(
        &mut self,
        attempts: u32,
        rng: &mut R,
        events: &mut Vec<GameEvent>,
    ) {
        let Placement {
            item,
            attempts: used,
            fallback,
        } = place_item(
            self.creature.body(),
            self.grid.tile_count,
            self.score + 1,
            attempts,
            rng,
        );
        if fallback {
            log::warn!(
                "Item placement fell back after {} attempts; accepting ({}, {})",
                used,
                item.cell.x,
                item.cell.y
            );
            events.push(GameEvent::PlacementFallback {
                attempts: used,
                cell: item.cell,
            });
        }
        self.item = item;
        events.push(GameEvent::ItemSpawned {
            cell: item.cell,
            tier: item.tier,
            color: item.display_color(),
        });
    }

    /// Current tick interval in milliseconds
    pub fn tick_interval_ms(&self, base_tick_ms: f64) -> f64 {
        base_tick_ms / self.speed.max(crate::consts::MIN_SPEED) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_direction_opposites() {
        for dir in Direction::ALL {
            assert_eq!(dir.opposite().opposite(), dir);
            assert_eq!(dir.delta() + dir.opposite().delta(), IVec2::ZERO);
        }
    }

    #[test]
    fn test_combo_window() {
        let mut combo = Combo::default();
        assert_eq!(combo.register(1000.0, 2000.0), 1);
        assert_eq!(combo.register(2500.0, 2000.0), 2);
        assert_eq!(combo.register(4000.0, 2000.0), 3);
        // Gap equal to the window breaks the chain
        assert_eq!(combo.register(6000.0, 2000.0), 1);
    }

    #[test]
    fn test_new_state_has_one_item_off_body() {
        let settings = Settings::default();
        let mut rng = Pcg32::seed_from_u64(7);
        let (state, events) = SimulationState::new(&settings, &mut rng);

        assert_eq!(state.phase, RunPhase::Ready);
        assert_eq!(state.creature.len(), 3);
        assert!(!state.creature.occupies(state.item.cell));
        assert!(matches!(events[0], GameEvent::RunReset));
        assert!(
            events
                .iter()
                .any(|e| matches!(e, GameEvent::ItemSpawned { .. }))
        );
    }

    #[test]
    fn test_tick_interval_scales_with_speed() {
        let settings = Settings::default();
        let mut rng = Pcg32::seed_from_u64(1);
        let (mut state, _) = SimulationState::new(&settings, &mut rng);
        state.speed = 2.0;
        assert!((state.tick_interval_ms(150.0) - 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_tiered_items_ignore_random_color() {
        let item = Item {
            cell: IVec2::ONE,
            tier: ItemTier::TierB,
            color: Some(Color::WHITE),
        };
        assert_eq!(item.display_color(), color::TIER_B);
    }
}
