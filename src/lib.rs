//! Cyber Serpent - a grid serpent arcade core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (creature, item placement, tick rules)
//! - `particles`: Pooled particle physics for visual bursts
//! - `scheduler`: Fixed-timestep loop that owns all state and drives both
//! - `observers`: Event sinks and channel subscribers for audio/log/decor
//! - `snapshot`: Read-only frame data handed to the renderer
//! - `settings`: Data-driven configuration

pub mod autopilot;
pub mod color;
pub mod observers;
pub mod particles;
pub mod scheduler;
pub mod settings;
pub mod sim;
pub mod snapshot;

pub use color::Color;
pub use observers::{EventSink, SinkError};
pub use scheduler::{PulseReport, Scheduler};
pub use settings::{QualityPreset, Settings, SettingsError};
pub use snapshot::{FrameRenderer, FrameSnapshot, ParticleSnapshot};

use glam::{IVec2, Vec2};

/// Game configuration constants
pub mod consts {
    /// Base simulation tick interval at speed 1.0 (milliseconds)
    pub const BASE_TICK_MS: f64 = 150.0;
    /// Pulses with a larger delta are treated as a stall and discarded
    pub const STALL_THRESHOLD_MS: f64 = 1000.0;
    /// Maximum ticks per pulse to prevent spiral of death
    pub const MAX_TICKS_PER_PULSE: u32 = 5;

    /// Pulse rate the particle decay is expressed against
    pub const ASSUMED_FPS: f32 = 60.0;

    /// Captures closer together than this extend the combo
    pub const COMBO_WINDOW_MS: f64 = 2000.0;
    /// Speed multiplier gained on every level up
    pub const SPEED_STEP_PER_LEVEL: f32 = 0.1;
    /// Captures needed per level
    pub const CAPTURES_PER_LEVEL: u32 = 4;
    pub const MIN_SPEED: f32 = 0.1;
    pub const MAX_SPEED: f32 = 10.0;

    /// Rejection-sampling budget for item placement
    pub const PLACEMENT_ATTEMPTS: u32 = 500;

    /// Board defaults
    pub const DEFAULT_CELL_SIZE: f32 = 20.0;
    pub const DEFAULT_TILE_COUNT: i32 = 30;
    /// Smallest board that fits the starting body with a free inner ring
    pub const MIN_TILE_COUNT: i32 = 8;

    /// Particle records allocated up front
    pub const POOL_PREWARM: usize = 200;

    /// Run-ending explosion
    pub const EXPLOSION_BASE_PARTICLES: u32 = 110;
    pub const EXPLOSION_WAVES: u32 = 4;
    pub const EXPLOSION_WAVE_SPACING_MS: f64 = 70.0;
}

/// Pixel-space center of a grid cell
#[inline]
pub fn cell_center(cell: IVec2, cell_size: f32) -> Vec2 {
    cell.as_vec2() * cell_size + Vec2::splat(cell_size / 2.0)
}

/// Manhattan distance between two cells
#[inline]
pub fn manhattan(a: IVec2, b: IVec2) -> i32 {
    let d = (a - b).abs();
    d.x + d.y
}
