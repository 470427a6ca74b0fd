//! Read-only frame data for the renderer
//!
//! Built once per pulse after the simulation and particles have advanced.
//! The renderer never sees the live state.

use bytemuck::{Pod, Zeroable};
use glam::IVec2;

use crate::color::Color;
use crate::observers::SinkError;
use crate::particles::{Particle, Shape};
use crate::sim::{ItemTier, RunPhase, SimulationState};

/// GPU-friendly particle record
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ParticleSnapshot {
    pub pos: [f32; 2],
    pub color: [f32; 4],
    /// Degrees
    pub rotation: f32,
    /// Current draw size (shrinks with life)
    pub size: f32,
    /// Remaining life, usable as alpha
    pub alpha: f32,
    /// `SHAPE_RECT` or `SHAPE_CIRCLE`
    pub shape: u32,
}

impl ParticleSnapshot {
    pub const SHAPE_RECT: u32 = 0;
    pub const SHAPE_CIRCLE: u32 = 1;

    pub fn shape(&self) -> Shape {
        if self.shape == Self::SHAPE_CIRCLE {
            Shape::Circle
        } else {
            Shape::Rect
        }
    }
}

impl From<&Particle> for ParticleSnapshot {
    fn from(p: &Particle) -> Self {
        Self {
            pos: p.pos.to_array(),
            color: p.color.to_array(),
            rotation: p.rotation,
            size: p.rendered_size(),
            alpha: p.life.clamp(0.0, 1.0),
            shape: match p.shape {
                Shape::Rect => Self::SHAPE_RECT,
                Shape::Circle => Self::SHAPE_CIRCLE,
            },
        }
    }
}

/// The item as drawn
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemView {
    pub cell: IVec2,
    pub tier: ItemTier,
    pub color: Color,
}

/// Everything needed to draw one frame
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSnapshot {
    pub tile_count: i32,
    pub cell_size: f32,
    /// Head first; frozen in place once `collapsed` is set
    pub body: Vec<IVec2>,
    pub collapsed: bool,
    pub tint: Color,
    pub item: ItemView,
    pub particles: Vec<ParticleSnapshot>,
    pub score: u32,
    pub special_captures: u32,
    pub level: u32,
    pub combo: u32,
    pub phase: RunPhase,
}

impl FrameSnapshot {
    pub fn capture(state: &SimulationState, particles: Vec<ParticleSnapshot>) -> Self {
        Self {
            tile_count: state.grid.tile_count,
            cell_size: state.grid.cell_size,
            body: state.creature.body().iter().copied().collect(),
            collapsed: state.creature.is_collapsed(),
            tint: state.tint,
            item: ItemView {
                cell: state.item.cell,
                tier: state.item.tier,
                color: state.item.display_color(),
            },
            particles,
            score: state.score,
            special_captures: state.special_captures,
            level: state.level,
            combo: state.combo.count,
            phase: state.phase,
        }
    }

    pub fn head(&self) -> Option<IVec2> {
        self.body.first().copied()
    }

    /// Particle records as raw bytes for upload
    pub fn particle_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.particles)
    }
}

/// External drawing collaborator, called once at the end of every pulse
pub trait FrameRenderer {
    fn draw(&mut self, frame: &FrameSnapshot) -> Result<(), SinkError>;
}
