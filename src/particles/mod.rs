//! Pooled particle engine
//!
//! Independent of game rules: callers spawn particles with a position,
//! color, physics, and look, and the scheduler calls `advance` once per
//! pulse. Lifetimes and physics are expressed per pulse, so a particle's
//! on-screen duration assumes the pulse rate stays near `assumed_fps`.

pub mod effects;
pub mod pool;

pub use effects::{EffectQueue, ExplosionWave};
pub use pool::{LIFE_EPSILON, Particle, ParticlePool, Shape};

use glam::Vec2;

use crate::color::Color;
use crate::snapshot::ParticleSnapshot;

/// Polar speed to units/pulse
pub const POLAR_SPEED_SCALE: f32 = 0.016;
/// Polar gravity to units/pulse²
pub const POLAR_GRAVITY_SCALE: f32 = 0.001;

/// Initial velocity in one of two forms
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Motion {
    /// Scaled speed along `angle_deg` (0 = +x, clockwise on screen);
    /// see `POLAR_SPEED_SCALE`
    Polar { speed: f32, angle_deg: f32 },
    /// Velocity in units/pulse
    Vector(Vec2),
}

/// Physical behaviour of a spawned particle.
///
/// With `Motion::Polar`, gravity is scaled by `POLAR_GRAVITY_SCALE`; with
/// `Motion::Vector` it is already per pulse. Angular velocity (degrees) and
/// friction (velocity multiplier) are always per pulse.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Physics {
    pub motion: Motion,
    pub gravity: f32,
    pub friction: f32,
    pub angular_velocity: f32,
}

impl Physics {
    pub fn polar(speed: f32, angle_deg: f32) -> Self {
        Self {
            motion: Motion::Polar { speed, angle_deg },
            gravity: 0.0,
            friction: 0.98,
            angular_velocity: 0.0,
        }
    }

    pub fn vector(velocity: Vec2) -> Self {
        Self {
            motion: Motion::Vector(velocity),
            gravity: 0.0,
            friction: 0.98,
            angular_velocity: 0.0,
        }
    }

    pub fn with_gravity(mut self, gravity: f32) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn with_friction(mut self, friction: f32) -> Self {
        self.friction = friction;
        self
    }

    pub fn with_spin(mut self, angular_velocity: f32) -> Self {
        self.angular_velocity = angular_velocity;
        self
    }
}

/// Look of a spawned particle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Visual {
    pub size: f32,
    /// Seconds from spawn to expiry at the assumed pulse rate
    pub duration: f32,
    pub shape: Shape,
}

impl Default for Visual {
    fn default() -> Self {
        Self {
            size: 2.0,
            duration: 1.0,
            shape: Shape::Rect,
        }
    }
}

/// Particle simulation over a bounded pool
#[derive(Debug, Clone)]
pub struct ParticleEngine {
    pool: ParticlePool,
    assumed_fps: f32,
    dropped: u64,
}

impl ParticleEngine {
    pub fn new(capacity: usize, prewarm: usize, assumed_fps: f32) -> Self {
        Self {
            pool: ParticlePool::new(capacity, prewarm),
            assumed_fps: assumed_fps.max(1.0),
            dropped: 0,
        }
    }

    pub fn pool(&self) -> &ParticlePool {
        &self.pool
    }

    pub fn active_count(&self) -> usize {
        self.pool.active_len()
    }

    /// Spawn requests refused because the pool was full
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Spawn one particle. Returns false (dropping the request) at capacity.
    pub fn spawn(&mut self, pos: Vec2, color: Color, physics: Physics, visual: Visual) -> bool {
        let fps = self.assumed_fps;
        let Some(p) = self.pool.acquire() else {
            self.dropped += 1;
            return false;
        };

        p.pos = pos;
        p.color = color;
        p.friction = physics.friction;
        match physics.motion {
            Motion::Polar { speed, angle_deg } => {
                let angle = angle_deg.to_radians();
                p.vel = Vec2::new(angle.cos(), angle.sin()) * (speed * POLAR_SPEED_SCALE);
                p.gravity = physics.gravity * POLAR_GRAVITY_SCALE;
                p.angular_velocity = physics.angular_velocity;
            }
            Motion::Vector(velocity) => {
                p.vel = velocity;
                p.gravity = physics.gravity;
                p.angular_velocity = physics.angular_velocity;
            }
        }

        p.size = visual.size;
        p.shape = visual.shape;
        p.life = 1.0;
        p.decay = if visual.duration > 0.0 {
            1.0 / (visual.duration * fps)
        } else {
            1.0
        };
        true
    }

    /// Advance every active particle by one pulse. Returns how many expired.
    pub fn advance(&mut self) -> usize {
        self.pool.step()
    }

    /// Retire all active particles (used on reset)
    pub fn clear(&mut self) {
        self.pool.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.pool.iter()
    }

    /// Draw data for every active particle
    pub fn snapshots(&self) -> Vec<ParticleSnapshot> {
        self.pool.iter().map(ParticleSnapshot::from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(capacity: usize) -> ParticleEngine {
        ParticleEngine::new(capacity, capacity.min(16), 60.0)
    }

    fn visual(duration: f32) -> Visual {
        Visual {
            duration,
            ..Visual::default()
        }
    }

    #[test]
    fn test_decay_timing_one_second() {
        let mut e = engine(4);
        assert!(e.spawn(
            Vec2::ZERO,
            Color::WHITE,
            Physics::vector(Vec2::ZERO),
            visual(1.0)
        ));
        for pulse in 1..60 {
            e.advance();
            assert_eq!(e.active_count(), 1, "expired early at pulse {pulse}");
        }
        e.advance();
        assert_eq!(e.active_count(), 0);
    }

    #[test]
    fn test_spawn_dropped_at_capacity() {
        let mut e = engine(2);
        let physics = Physics::vector(Vec2::ONE);
        assert!(e.spawn(Vec2::ZERO, Color::WHITE, physics, visual(1.0)));
        assert!(e.spawn(Vec2::ZERO, Color::WHITE, physics, visual(1.0)));
        assert!(!e.spawn(Vec2::ZERO, Color::WHITE, physics, visual(1.0)));
        assert_eq!(e.active_count(), 2);
        assert_eq!(e.dropped(), 1);
    }

    #[test]
    fn test_polar_form_uses_fixed_scales() {
        let mut e = engine(1);
        let physics = Physics::polar(600.0, 90.0).with_gravity(160.0).with_spin(120.0);
        e.spawn(Vec2::ZERO, Color::WHITE, physics, visual(2.0));
        let p = e.iter().next().expect("spawned");
        assert!(p.vel.x.abs() < 1e-4);
        assert!((p.vel.y - 9.6).abs() < 1e-4);
        assert!((p.gravity - 0.16).abs() < 1e-6);
        assert!((p.angular_velocity - 120.0).abs() < 1e-6);
    }

    #[test]
    fn test_polar_scales_ignore_assumed_fps() {
        let physics = Physics::polar(500.0, 0.0).with_gravity(200.0);
        let mut slow = ParticleEngine::new(1, 0, 30.0);
        let mut fast = ParticleEngine::new(1, 0, 120.0);
        slow.spawn(Vec2::ZERO, Color::WHITE, physics, visual(1.0));
        fast.spawn(Vec2::ZERO, Color::WHITE, physics, visual(1.0));
        let a = slow.iter().next().expect("spawned");
        let b = fast.iter().next().expect("spawned");
        assert_eq!(a.vel, b.vel);
        assert_eq!(a.gravity, b.gravity);
    }

    #[test]
    fn test_vector_form_kept_verbatim() {
        let mut e = engine(1);
        let physics = Physics::vector(Vec2::new(1.5, -2.0))
            .with_gravity(0.2)
            .with_friction(0.9)
            .with_spin(-4.0);
        e.spawn(Vec2::new(5.0, 5.0), Color::WHITE, physics, visual(1.0));
        let p = e.iter().next().expect("spawned");
        assert_eq!(p.vel, Vec2::new(1.5, -2.0));
        assert_eq!(p.gravity, 0.2);
        assert_eq!(p.friction, 0.9);
        assert_eq!(p.angular_velocity, -4.0);
        assert_eq!(p.life, 1.0);
    }

    #[test]
    fn test_pool_conservation_after_burst() {
        let mut e = ParticleEngine::new(100, 20, 60.0);
        let free_before = e.pool().free_len();
        let allocated_before = e.pool().allocated();

        for i in 0..50 {
            let physics = Physics::vector(Vec2::new(i as f32, 0.0));
            e.spawn(Vec2::ZERO, Color::WHITE, physics, visual(0.5 + i as f32 * 0.01));
        }
        let newly_allocated = e.pool().allocated() - allocated_before;
        assert_eq!(newly_allocated, 30);

        while e.active_count() > 0 {
            e.advance();
        }
        assert_eq!(e.pool().free_len(), free_before + newly_allocated);
    }

    #[test]
    fn test_clear_retires_everything() {
        let mut e = engine(8);
        for _ in 0..5 {
            e.spawn(Vec2::ZERO, Color::WHITE, Physics::vector(Vec2::ZERO), visual(5.0));
        }
        e.clear();
        assert_eq!(e.active_count(), 0);
        assert!(e.snapshots().is_empty());
    }

    #[test]
    fn test_snapshot_shrinks_with_life() {
        let mut e = engine(1);
        e.spawn(
            Vec2::new(3.0, 4.0),
            Color::WHITE,
            Physics::vector(Vec2::ZERO),
            Visual {
                size: 10.0,
                duration: 1.0,
                shape: Shape::Circle,
            },
        );
        for _ in 0..30 {
            e.advance();
        }
        let snap = e.snapshots()[0];
        assert!((snap.size - 5.0).abs() < 1e-3);
        assert_eq!(snap.shape(), Shape::Circle);
    }
}
