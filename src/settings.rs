//! Game settings
//!
//! Loaded from JSON; every field has a default so partial files are fine.

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// Settings load/validation failure
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("settings parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid setting: {0}")]
    Invalid(String),
}

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    /// Particle capacity for this preset
    pub fn max_particles(&self) -> usize {
        match self {
            QualityPreset::Low => 200,
            QualityPreset::Medium => 800,
            QualityPreset::High => 1600,
        }
    }
}

impl FromStr for QualityPreset {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(QualityPreset::Low),
            "medium" | "med" => Ok(QualityPreset::Medium),
            "high" => Ok(QualityPreset::High),
            other => Err(SettingsError::Invalid(format!("unknown quality preset '{other}'"))),
        }
    }
}

/// Core configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Board ===
    /// Pixel size of one cell
    pub cell_size: f32,
    /// Cells per side
    pub tile_count: i32,

    // === Pace ===
    /// Tick interval at speed 1.0 (ms)
    pub base_tick_ms: f64,
    /// Starting speed multiplier
    pub speed: f32,
    pub speed_step_per_level: f32,
    pub captures_per_level: u32,
    pub combo_window_ms: f64,

    // === Scheduler ===
    /// Catch-up cap for slow pulses
    pub max_ticks_per_pulse: u32,
    /// Deltas above this are discarded as stalls (ms)
    pub stall_threshold_ms: f64,
    pub placement_attempts: u32,

    // === Effects ===
    /// Scales burst particle counts (0 disables capture bursts)
    pub burst_intensity: f32,
    pub quality: QualityPreset,
    /// Master switch for particle effects
    pub particles: bool,
    /// Pulse rate particle lifetimes are expressed against
    pub assumed_fps: f32,

    /// Fixed RNG seed; `None` picks one per process
    pub seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cell_size: DEFAULT_CELL_SIZE,
            tile_count: DEFAULT_TILE_COUNT,

            base_tick_ms: BASE_TICK_MS,
            speed: 1.0,
            speed_step_per_level: SPEED_STEP_PER_LEVEL,
            captures_per_level: CAPTURES_PER_LEVEL,
            combo_window_ms: COMBO_WINDOW_MS,

            max_ticks_per_pulse: MAX_TICKS_PER_PULSE,
            stall_threshold_ms: STALL_THRESHOLD_MS,
            placement_attempts: PLACEMENT_ATTEMPTS,

            burst_intensity: 1.0,
            quality: QualityPreset::Medium,
            particles: true,
            assumed_fps: ASSUMED_FPS,

            seed: None,
        }
    }
}

impl Settings {
    /// Settings for a canvas `width_px` wide split into `cell_size` cells
    pub fn from_canvas(width_px: f32, cell_size: f32) -> Self {
        Self {
            cell_size,
            tile_count: (width_px / cell_size).floor() as i32,
            ..Self::default()
        }
    }

    /// Parse and validate a JSON document
    pub fn from_json_str(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings.sanitized())
    }

    /// Load from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let settings = Self::from_json_str(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Reject values the core cannot run with
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(self.cell_size > 0.0) {
            return Err(SettingsError::Invalid(format!(
                "cell_size must be positive, got {}",
                self.cell_size
            )));
        }
        if self.tile_count < MIN_TILE_COUNT {
            return Err(SettingsError::Invalid(format!(
                "tile_count must be at least {MIN_TILE_COUNT}, got {}",
                self.tile_count
            )));
        }
        if !(self.base_tick_ms > 0.0) {
            return Err(SettingsError::Invalid("base_tick_ms must be positive".into()));
        }
        if !(self.assumed_fps > 0.0) {
            return Err(SettingsError::Invalid("assumed_fps must be positive".into()));
        }
        if !(self.stall_threshold_ms > 0.0) {
            return Err(SettingsError::Invalid(
                "stall_threshold_ms must be positive".into(),
            ));
        }
        if self.captures_per_level == 0 {
            return Err(SettingsError::Invalid("captures_per_level must be at least 1".into()));
        }
        if self.max_ticks_per_pulse == 0 {
            return Err(SettingsError::Invalid("max_ticks_per_pulse must be at least 1".into()));
        }
        Ok(())
    }

    /// Clamp tunables into their supported ranges
    pub fn sanitized(mut self) -> Self {
        self.speed = self.speed.clamp(MIN_SPEED, MAX_SPEED);
        self.burst_intensity = self.burst_intensity.clamp(0.0, 5.0);
        self.placement_attempts = self.placement_attempts.max(1);
        self
    }

    /// Effective particle capacity
    pub fn max_particles(&self) -> usize {
        if !self.particles {
            0
        } else {
            self.quality.max_particles()
        }
    }

    /// Records allocated before the first burst
    pub fn particle_prewarm(&self) -> usize {
        POOL_PREWARM.min(self.max_particles())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let s = Settings::default();
        assert!(s.validate().is_ok());
        assert_eq!(s.max_particles(), 800);
        assert_eq!(s.particle_prewarm(), 200);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let s = Settings::from_json_str(r#"{ "tile_count": 24, "quality": "High" }"#)
            .expect("valid settings");
        assert_eq!(s.tile_count, 24);
        assert_eq!(s.quality, QualityPreset::High);
        assert_eq!(s.base_tick_ms, BASE_TICK_MS);
        assert_eq!(s.max_particles(), 1600);
    }

    #[test]
    fn test_rejects_tiny_board() {
        let err = Settings::from_json_str(r#"{ "tile_count": 3 }"#).unwrap_err();
        assert!(matches!(err, SettingsError::Invalid(_)));
    }

    #[test]
    fn test_rejects_bad_json() {
        let err = Settings::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, SettingsError::Parse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = Settings::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, SettingsError::Io(_)));
    }

    #[test]
    fn test_sanitized_clamps() {
        let s = Settings::from_json_str(r#"{ "speed": 50.0, "burst_intensity": -1.0 }"#)
            .expect("valid settings");
        assert_eq!(s.speed, MAX_SPEED);
        assert_eq!(s.burst_intensity, 0.0);
    }

    #[test]
    fn test_particles_disabled() {
        let s = Settings {
            particles: false,
            ..Settings::default()
        };
        assert_eq!(s.max_particles(), 0);
        assert_eq!(s.particle_prewarm(), 0);
    }

    #[test]
    fn test_from_canvas() {
        let s = Settings::from_canvas(610.0, 20.0);
        assert_eq!(s.tile_count, 30);
    }

    #[test]
    fn test_quality_from_str() {
        assert_eq!("med".parse::<QualityPreset>().ok(), Some(QualityPreset::Medium));
        assert!("ultra".parse::<QualityPreset>().is_err());
        assert_eq!(QualityPreset::Low.as_str(), "Low");
    }
}
