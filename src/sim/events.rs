//! Events emitted by the core for external collaborators
//!
//! Every consumer (audio, log presentation, decorative spawners) matches on
//! these enums exhaustively; nothing is dispatched by string tag.

use glam::IVec2;
use serde::{Deserialize, Serialize};

use super::state::ItemTier;
use crate::color::Color;

/// Why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollisionCause {
    /// Head left the grid
    Wall,
    /// Head entered a live segment
    SelfHit,
}

/// Structured, one-way event stream out of the core
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// `start()` moved the run from Ready to Running
    RunStarted,
    /// Fresh creature, counters zeroed, particles cleared
    RunReset,
    ItemSpawned {
        cell: IVec2,
        tier: ItemTier,
        /// Display color the item was placed with
        color: Color,
    },
    ItemConsumed {
        cell: IVec2,
        tier: ItemTier,
        combo: u32,
        score: u32,
    },
    LevelUp {
        level: u32,
        speed: f32,
    },
    /// Terminal for the current run
    Collision {
        cell: IVec2,
        cause: CollisionCause,
    },
    Paused,
    Resumed,
    /// Placement gave up sampling and accepted a possibly occupied cell
    PlacementFallback {
        attempts: u32,
        cell: IVec2,
    },
    VisibilityChanged {
        active: bool,
    },
    /// A collaborator failed while handling an event
    SinkFault {
        sink: String,
        message: String,
    },
}

/// Sound hooks for an external audio sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioCue {
    ConsumedPlain,
    ConsumedTierA,
    ConsumedTierB,
    Collision,
    LevelUp,
    /// One layer of the run-ending blast (0 = loudest, played first)
    Explosion { layer: u8 },
    Pause,
    Resume,
}

impl AudioCue {
    /// Suggested playback volume
    pub fn volume(&self) -> f32 {
        match self {
            AudioCue::Explosion { layer } => match layer {
                0 => 0.85,
                1 => 0.55,
                _ => 0.35,
            },
            AudioCue::LevelUp => 0.9,
            _ => 1.0,
        }
    }

    /// Suggested delay after the triggering event
    pub fn delay_ms(&self) -> f64 {
        match self {
            AudioCue::Explosion { layer } => *layer as f64 * 100.0,
            _ => 0.0,
        }
    }
}

impl GameEvent {
    /// Short stable tag for presentation layers
    pub fn tag(&self) -> &'static str {
        match self {
            GameEvent::RunStarted => "run-started",
            GameEvent::RunReset => "run-reset",
            GameEvent::ItemSpawned { tier, .. } => match tier {
                ItemTier::Plain => "spawn-plain",
                ItemTier::TierA => "spawn-tier-a",
                ItemTier::TierB => "spawn-tier-b",
            },
            GameEvent::ItemConsumed { tier, .. } => match tier {
                ItemTier::Plain => "consumed-plain",
                ItemTier::TierA => "consumed-tier-a",
                ItemTier::TierB => "consumed-tier-b",
            },
            GameEvent::LevelUp { .. } => "level-up",
            GameEvent::Collision { .. } => "collision",
            GameEvent::Paused => "paused",
            GameEvent::Resumed => "resumed",
            GameEvent::PlacementFallback { .. } => "placement-fallback",
            GameEvent::VisibilityChanged { .. } => "visibility",
            GameEvent::SinkFault { .. } => "sink-fault",
        }
    }

    /// Audio cues this event should trigger (fire-and-forget)
    pub fn audio_cues(&self) -> &'static [AudioCue] {
        match self {
            GameEvent::ItemConsumed { tier, .. } => match tier {
                ItemTier::Plain => &[AudioCue::ConsumedPlain],
                ItemTier::TierA => &[AudioCue::ConsumedTierA],
                ItemTier::TierB => &[AudioCue::ConsumedTierB],
            },
            GameEvent::Collision { .. } => &[
                AudioCue::Collision,
                AudioCue::Explosion { layer: 0 },
                AudioCue::Explosion { layer: 1 },
                AudioCue::Explosion { layer: 2 },
            ],
            GameEvent::LevelUp { .. } => &[AudioCue::LevelUp],
            GameEvent::Paused => &[AudioCue::Pause],
            GameEvent::Resumed => &[AudioCue::Resume],
            GameEvent::RunStarted
            | GameEvent::RunReset
            | GameEvent::ItemSpawned { .. }
            | GameEvent::PlacementFallback { .. }
            | GameEvent::VisibilityChanged { .. }
            | GameEvent::SinkFault { .. } => &[],
        }
    }
}
