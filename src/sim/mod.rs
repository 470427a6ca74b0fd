//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Runs only when the scheduler calls `tick`
//! - Seeded RNG only, passed in by the caller
//! - Timestamps come from the pulse, never from the wall clock
//! - No rendering, audio, or particle dependencies

pub mod creature;
pub mod events;
pub mod placement;
pub mod state;
pub mod tick;

pub use creature::{Creature, StepKind, Vitality};
pub use events::{AudioCue, CollisionCause, GameEvent};
pub use placement::{Placement, place_item, tier_for_sequence};
pub use state::{Cell, Combo, Direction, Grid, Item, ItemTier, RunPhase, SimulationState};
pub use tick::{Collapse, TickOutcome, tick};
