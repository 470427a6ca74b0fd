//! Decorative particle effects triggered by game events
//!
//! Each function only spawns particles; the engine drops whatever does not
//! fit in the pool. The run-ending explosion is staggered over several
//! pulses through `EffectQueue`.

use std::collections::VecDeque;

use glam::Vec2;
use rand::Rng;
use rand::seq::IndexedRandom;

use super::{ParticleEngine, Physics, Shape, Visual};
use crate::color::{self, Color};
use crate::consts::{EXPLOSION_BASE_PARTICLES, EXPLOSION_WAVE_SPACING_MS, EXPLOSION_WAVES};
use crate::sim::{Cell, ItemTier};

/// Particles in the ring shown when an item appears
pub const SPAWN_RING_PARTICLES: u32 = 8;

/// Shake strength used on collision; sparks are spawned twice, the second
/// time 20% stronger
pub const COLLISION_SHAKE: f32 = 1.8;

/// Radial ring marking a freshly placed item
pub fn spawn_ring<R: Rng + ?Sized>(
    engine: &mut ParticleEngine,
    center: Vec2,
    color: Color,
    rng: &mut R,
) -> u32 {
    let mut spawned = 0;
    for i in 0..SPAWN_RING_PARTICLES {
        let angle = (i as f32 * 45.0).to_radians();
        let speed = rng.random::<f32>() * 2.0 + 1.0;
        let physics = Physics::vector(Vec2::new(angle.cos(), angle.sin()) * speed)
            .with_gravity(0.1)
            .with_friction(0.95);
        let visual = Visual {
            size: 4.0,
            duration: 0.6,
            shape: Shape::Rect,
        };
        if engine.spawn(center, color, physics, visual) {
            spawned += 1;
        }
    }
    spawned
}

/// Particle count of a capture burst; grows with the combo and scales with
/// the burst intensity (0 disables the burst)
pub fn capture_burst_count(combo: u32, intensity: f32) -> u32 {
    ((25.0 + 9.0 * combo as f32) * intensity.max(0.0)).floor() as u32
}

/// Burst at the capture point, colored by tier
pub fn capture_burst<R: Rng + ?Sized>(
    engine: &mut ParticleEngine,
    center: Vec2,
    tier: ItemTier,
    item_color: Color,
    combo: u32,
    intensity: f32,
    rng: &mut R,
) -> u32 {
    let plain = [
        item_color,
        color::PLAIN_BURST_ACCENTS[0],
        color::PLAIN_BURST_ACCENTS[1],
    ];
    let palette: &[Color] = match tier {
        ItemTier::Plain => &plain,
        ItemTier::TierA => &color::TIER_A_BURST,
        ItemTier::TierB => &color::TIER_B_BURST,
    };
    let gravity = if tier == ItemTier::TierB { 0.3 } else { 0.2 };
    let shape = if tier == ItemTier::TierA {
        Shape::Circle
    } else {
        Shape::Rect
    };
    let combo_boost = 1.0 + 0.2 * combo as f32;

    let mut spawned = 0;
    for _ in 0..capture_burst_count(combo, intensity) {
        let angle = rng.random::<f32>() * std::f32::consts::TAU;
        let speed = (rng.random::<f32>() * 5.0 + 2.0) * combo_boost;
        let physics = Physics::vector(Vec2::new(angle.cos(), angle.sin()) * speed)
            .with_gravity(gravity)
            .with_friction(0.96)
            .with_spin(rng.random::<f32>() * 10.0 - 5.0);
        let visual = Visual {
            size: rng.random::<f32>() * 6.0 + 2.0,
            duration: 1.5 + rng.random::<f32>() * 0.5,
            shape,
        };
        let color = palette.choose(rng).copied().unwrap_or(item_color);
        if engine.spawn(center, color, physics, visual) {
            spawned += 1;
        }
    }
    spawned
}

/// Random sparks across the whole board
pub fn shake_sparks<R: Rng + ?Sized>(
    engine: &mut ParticleEngine,
    board_size: f32,
    strength: f32,
    rng: &mut R,
) -> u32 {
    let count = (10.0 * strength.max(0.0)).floor() as u32;
    let mut spawned = 0;
    for _ in 0..count {
        let pos = Vec2::new(rng.random::<f32>(), rng.random::<f32>()) * board_size;
        let vel = Vec2::new(rng.random::<f32>() - 0.5, rng.random::<f32>() - 0.5) * 10.0;
        let color = Color::from_hsl(rng.random::<f32>() * 360.0, 1.0, 0.6);
        let visual = Visual {
            size: rng.random::<f32>() * 3.0 + 1.0,
            duration: 0.5,
            shape: Shape::Rect,
        };
        if engine.spawn(pos, color, Physics::vector(vel).with_friction(0.9), visual) {
            spawned += 1;
        }
    }
    spawned
}

/// One tumbling block per body segment, in the creature's tint
pub fn disintegrate<R: Rng + ?Sized>(
    engine: &mut ParticleEngine,
    segments: &[Cell],
    cell_size: f32,
    tint: Color,
    rng: &mut R,
) -> u32 {
    let mut spawned = 0;
    for &segment in segments {
        let vel = Vec2::new(rng.random::<f32>() - 0.5, rng.random::<f32>() - 0.5) * 5.0;
        let physics = Physics::vector(vel)
            .with_gravity(0.2)
            .with_friction(0.98)
            .with_spin(rng.random::<f32>() * 20.0 - 10.0);
        let visual = Visual {
            size: cell_size * 0.8,
            duration: 1.5,
            shape: Shape::Rect,
        };
        if engine.spawn(crate::cell_center(segment, cell_size), tint, physics, visual) {
            spawned += 1;
        }
    }
    spawned
}

/// One pending wave of the run-ending explosion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExplosionWave {
    /// Pulse timestamp at or after which the wave is released
    pub due_ms: f64,
    pub origin: Vec2,
    /// 0 for the first wave; later waves fly faster and fall harder
    pub wave: u32,
    pub count: u32,
    pub intensity: f32,
}

impl ExplosionWave {
    fn release<R: Rng + ?Sized>(&self, engine: &mut ParticleEngine, rng: &mut R) -> u32 {
        let wave = self.wave as f32;
        let power = 1.0 + 0.15 * self.intensity;
        let mut spawned = 0;
        for _ in 0..self.count {
            let speed = (rng.random::<f32>() * 400.0 + 150.0 + wave * 70.0) * power;
            let physics = Physics::polar(speed, rng.random::<f32>() * 360.0)
                .with_gravity(160.0 + wave * 25.0)
                .with_friction(0.96)
                .with_spin(rng.random::<f32>() * 450.0 - 225.0);
            let visual = Visual {
                size: rng.random::<f32>() * 22.0 + 8.0,
                duration: 2.2 + rng.random::<f32>() * 1.2,
                shape: if rng.random_bool(0.8) {
                    Shape::Rect
                } else {
                    Shape::Circle
                },
            };
            let color = color::EXPLOSION.choose(rng).copied().unwrap_or(Color::WHITE);
            if engine.spawn(self.origin, color, physics, visual) {
                spawned += 1;
            }
        }
        spawned
    }
}

/// Effects scheduled for later pulses
#[derive(Debug, Clone, Default)]
pub struct EffectQueue {
    pending: VecDeque<ExplosionWave>,
}

impl EffectQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn pending(&self) -> impl Iterator<Item = &ExplosionWave> {
        self.pending.iter()
    }

    /// Queue the staggered explosion; the first wave is due at `now_ms`
    pub fn schedule_explosion(&mut self, origin: Vec2, now_ms: f64, intensity: f32) {
        let intensity = intensity.max(0.0);
        let total = (EXPLOSION_BASE_PARTICLES as f32 * (1.0 + 0.25 * intensity)).floor() as u32;
        // Equal waves; any remainder is not emitted
        let per_wave = total / EXPLOSION_WAVES;

        for wave in 0..EXPLOSION_WAVES {
            self.pending.push_back(ExplosionWave {
                due_ms: now_ms + wave as f64 * EXPLOSION_WAVE_SPACING_MS,
                origin,
                wave,
                count: per_wave,
                intensity,
            });
        }
        log::debug!(
            "Explosion scheduled: {} particles in {EXPLOSION_WAVES} waves",
            per_wave * EXPLOSION_WAVES
        );
    }

    /// Spawn every wave due at `now_ms`. Returns the particles spawned.
    pub fn release_due<R: Rng + ?Sized>(
        &mut self,
        now_ms: f64,
        engine: &mut ParticleEngine,
        rng: &mut R,
    ) -> u32 {
        let mut spawned = 0;
        while let Some(wave) = self.pending.front() {
            if wave.due_ms > now_ms {
                break;
            }
            let wave = *wave;
            self.pending.pop_front();
            spawned += wave.release(engine, rng);
        }
        spawned
    }

    /// Drop everything still pending (used on reset)
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
