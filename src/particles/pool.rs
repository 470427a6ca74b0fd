//! Fixed-capacity particle arena
//!
//! Records live in `slots` and are never freed; `free` is a stack of slot
//! indices ready for reuse and `active` lists the slots being simulated.
//! Every allocated slot is in exactly one of the two lists.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::color::Color;

/// Life at or below this counts as expired (absorbs f32 rounding of decay sums)
pub const LIFE_EPSILON: f32 = 1e-5;

/// Draw shape of a particle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Shape {
    #[default]
    Rect,
    Circle,
}

/// A particle for visual effects
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub pos: Vec2,
    /// Units per pulse
    pub vel: Vec2,
    pub color: Color,
    pub shape: Shape,
    /// Full size at life 1.0
    pub size: f32,
    /// Degrees
    pub rotation: f32,
    /// Degrees per pulse
    pub angular_velocity: f32,
    /// Added to `vel.y` every pulse
    pub gravity: f32,
    /// Velocity multiplier applied every pulse
    pub friction: f32,
    /// Remaining life, 1.0 down to 0.0
    pub life: f32,
    /// Life lost per pulse
    pub decay: f32,
}

impl Default for Particle {
    fn default() -> Self {
        Self {
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            color: Color::WHITE,
            shape: Shape::Rect,
            size: 2.0,
            rotation: 0.0,
            angular_velocity: 0.0,
            gravity: 0.0,
            friction: 0.98,
            life: 1.0,
            decay: 0.02,
        }
    }
}

impl Particle {
    /// Size to draw at; particles shrink as they decay
    pub fn rendered_size(&self) -> f32 {
        self.size * self.life.clamp(0.0, 1.0)
    }

    /// Integrate one pulse. Returns false once the particle has expired.
    fn integrate(&mut self) -> bool {
        self.pos += self.vel;
        self.vel.y += self.gravity;
        self.vel *= self.friction;
        self.rotation += self.angular_velocity;
        self.life -= self.decay;
        self.life > LIFE_EPSILON
    }
}

/// Pool of reusable particle records bounded by `capacity` active particles
#[derive(Debug, Clone)]
pub struct ParticlePool {
    slots: Vec<Particle>,
    free: Vec<u32>,
    active: Vec<u32>,
    capacity: usize,
}

impl ParticlePool {
    /// Create a pool, allocating `prewarm` records up front (capped at capacity)
    pub fn new(capacity: usize, prewarm: usize) -> Self {
        let prewarm = prewarm.min(capacity);
        let slots = vec![Particle::default(); prewarm];
        // Reverse so the first pops hand out low indices
        let free = (0..prewarm as u32).rev().collect();
        Self {
            slots,
            free,
            active: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    pub fn free_len(&self) -> usize {
        self.free.len()
    }

    /// Records ever allocated (free + active)
    pub fn allocated(&self) -> usize {
        self.slots.len()
    }

    pub fn is_full(&self) -> bool {
        self.active.len() >= self.capacity
    }

    /// Take a record from the free stack (allocating one if the stack is
    /// empty), reset it, and mark it active.
    ///
    /// Returns `None` only when `capacity` particles are already active.
    pub fn acquire(&mut self) -> Option<&mut Particle> {
        if self.is_full() {
            return None;
        }
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.slots.push(Particle::default());
                (self.slots.len() - 1) as u32
            }
        };
        self.active.push(index);
        let particle = &mut self.slots[index as usize];
        *particle = Particle::default();
        Some(particle)
    }

    /// Integrate every active particle once, retiring the expired ones.
    /// Returns how many were retired.
    pub fn step(&mut self) -> usize {
        let mut retired = 0;
        let mut i = self.active.len();
        while i > 0 {
            i -= 1;
            let index = self.active[i];
            if !self.slots[index as usize].integrate() {
                self.active.swap_remove(i);
                self.free.push(index);
                retired += 1;
            }
        }
        retired
    }

    /// Retire every active particle
    pub fn clear(&mut self) {
        self.free.append(&mut self.active);
    }

    /// Active particles, read-only
    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.active.iter().map(|&i| &self.slots[i as usize])
    }
}
