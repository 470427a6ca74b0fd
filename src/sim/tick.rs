//! Fixed timestep simulation tick
//!
//! One tick moves the creature one cell and applies the capture rules.
//! A tick is atomic: all state mutations happen here, and the caller only
//! reacts to the returned outcome.

use rand::Rng;

use super::creature::StepKind;
use super::events::GameEvent;
use super::state::{Cell, ItemTier, RunPhase, SimulationState};
use crate::color;
use crate::settings::Settings;

/// Terminal collision details
#[derive(Debug, Clone)]
pub struct Collapse {
    /// Cell the head tried to enter
    pub at: Cell,
    /// Body segments at the moment of impact, head first
    pub segments: Vec<Cell>,
}

/// What happened during one tick
#[derive(Debug, Clone, Default)]
pub struct TickOutcome {
    pub events: Vec<GameEvent>,
    /// Item consumed this tick (cell, tier, combo)
    pub consumed: Option<(Cell, ItemTier, u32)>,
    pub collapse: Option<Collapse>,
}

/// Advance the run by one tick. No-op unless the run is `Running`.
pub fn tick<R: Rng + ?Sized>(
    state: &mut SimulationState,
    settings: &Settings,
    now_ms: f64,
    rng: &mut R,
) -> TickOutcome {
    let mut outcome = TickOutcome::default();
    if state.phase != RunPhase::Running {
        return outcome;
    }

    state.time_ticks += 1;

    let head = state.creature.move_head();
    let kind = if head == state.item.cell {
        StepKind::Grow
    } else {
        StepKind::Step
    };

    if let Some(cause) = state.creature.collision(head, kind) {
        state.phase = RunPhase::GameOver;
        let segments = state.creature.collapse();
        log::info!(
            "Run over at ({}, {}) by {:?}: score {}, level {}",
            head.x,
            head.y,
            cause,
            state.score,
            state.level
        );
        outcome.events.push(GameEvent::Collision { cell: head, cause });
        outcome.collapse = Some(Collapse { at: head, segments });
        return outcome;
    }

    match kind {
        StepKind::Step => state.creature.step(head),
        StepKind::Grow => {
            state.creature.grow(head);
            consume(state, settings, now_ms, head, &mut outcome);
            state.respawn_item(settings.placement_attempts, rng, &mut outcome.events);
        }
    }

    outcome
}

fn consume(
    state: &mut SimulationState,
    settings: &Settings,
    now_ms: f64,
    head: Cell,
    outcome: &mut TickOutcome,
) {
    let tier = state.item.tier;
    let combo = state.combo.register(now_ms, settings.combo_window_ms);

    match tier {
        ItemTier::Plain => {}
        ItemTier::TierA => {
            state.special_captures += 1;
            state.tint = color::TIER_A;
        }
        ItemTier::TierB => {
            state.special_captures += 1;
            state.tint = color::TIER_B;
        }
    }
    state.score += 1;

    outcome.events.push(GameEvent::ItemConsumed {
        cell: head,
        tier,
        combo,
        score: state.score,
    });
    outcome.consumed = Some((head, tier, combo));

    if state.score.is_multiple_of(settings.captures_per_level.max(1)) {
        state.level += 1;
        state.speed = (state.speed + settings.speed_step_per_level)
            .clamp(crate::consts::MIN_SPEED, crate::consts::MAX_SPEED);
        log::info!("Level {} reached, speed {:.2}x", state.level, state.speed);
        outcome.events.push(GameEvent::LevelUp {
            level: state.level,
            speed: state.speed,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::events::CollisionCause;
    use crate::sim::state::{Direction, Item};
    use glam::IVec2;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn running_state(seed: u64) -> (SimulationState, Settings, Pcg32) {
        let settings = Settings::default();
        let mut rng = Pcg32::seed_from_u64(seed);
        let (mut state, _) = SimulationState::new(&settings, &mut rng);
        state.phase = RunPhase::Running;
        (state, settings, rng)
    }

    fn put_item_ahead(state: &mut SimulationState, tier: ItemTier) -> Cell {
        let head = state.creature.head().unwrap_or(IVec2::ZERO);
        let cell = head + state.creature.queued().delta();
        state.item = Item {
            cell,
            tier,
            color: None,
        };
        cell
    }

    #[test]
    fn test_tick_ignored_unless_running() {
        let (mut state, settings, mut rng) = running_state(1);
        state.phase = RunPhase::Paused;
        let before: Vec<_> = state.creature.body().iter().copied().collect();
        let outcome = tick(&mut state, &settings, 0.0, &mut rng);
        assert!(outcome.events.is_empty());
        assert_eq!(state.time_ticks, 0);
        assert_eq!(
            state.creature.body().iter().copied().collect::<Vec<_>>(),
            before
        );
    }

    #[test]
    fn test_ordinary_tick_keeps_length() {
        let (mut state, settings, mut rng) = running_state(2);
        state.item.cell = IVec2::new(1, 1);
        let outcome = tick(&mut state, &settings, 0.0, &mut rng);
        assert!(outcome.consumed.is_none());
        assert_eq!(state.creature.len(), 3);
        assert_eq!(state.creature.head(), Some(IVec2::new(6, 10)));
    }

    #[test]
    fn test_capture_grows_scores_and_respawns() {
        let (mut state, settings, mut rng) = running_state(3);
        let cell = put_item_ahead(&mut state, ItemTier::Plain);

        let outcome = tick(&mut state, &settings, 100.0, &mut rng);
        assert_eq!(state.creature.len(), 4);
        assert_eq!(state.score, 1);
        assert_eq!(state.combo.count, 1);
        assert_eq!(outcome.consumed, Some((cell, ItemTier::Plain, 1)));
        assert_ne!(state.item.cell, cell);
        assert!(!state.creature.occupies(state.item.cell));
        assert!(
            outcome
                .events
                .iter()
                .any(|e| matches!(e, GameEvent::ItemSpawned { .. }))
        );
    }

    #[test]
    fn test_next_item_tier_follows_score() {
        let (mut state, settings, mut rng) = running_state(4);
        state.score = 6;
        put_item_ahead(&mut state, ItemTier::Plain);
        tick(&mut state, &settings, 0.0, &mut rng);
        // Capture #7 done, the next item is capture #8
        assert_eq!(state.score, 7);
        assert_eq!(state.item.tier, ItemTier::TierA);
    }

    #[test]
    fn test_tiered_capture_tints_and_counts() {
        let (mut state, settings, mut rng) = running_state(5);
        put_item_ahead(&mut state, ItemTier::TierB);
        tick(&mut state, &settings, 0.0, &mut rng);
        assert_eq!(state.special_captures, 1);
        assert_eq!(state.tint, color::TIER_B);
    }

    #[test]
    fn test_level_up_every_four_captures() {
        let (mut state, settings, mut rng) = running_state(6);
        state.score = 3;
        put_item_ahead(&mut state, ItemTier::Plain);
        let outcome = tick(&mut state, &settings, 0.0, &mut rng);
        assert_eq!(state.level, 2);
        assert!((state.speed - 1.1).abs() < 1e-6);
        assert!(
            outcome
                .events
                .iter()
                .any(|e| matches!(e, GameEvent::LevelUp { level: 2, .. }))
        );
    }

    #[test]
    fn test_combo_chain_within_window() {
        let (mut state, settings, mut rng) = running_state(7);
        put_item_ahead(&mut state, ItemTier::Plain);
        tick(&mut state, &settings, 1000.0, &mut rng);
        put_item_ahead(&mut state, ItemTier::Plain);
        tick(&mut state, &settings, 1500.0, &mut rng);
        assert_eq!(state.combo.count, 2);
        put_item_ahead(&mut state, ItemTier::Plain);
        tick(&mut state, &settings, 9000.0, &mut rng);
        assert_eq!(state.combo.count, 1);
    }

    #[test]
    fn test_wall_collision_ends_run() {
        let (mut state, settings, mut rng) = running_state(8);
        state.item.cell = IVec2::new(1, 1);
        state.creature.set_direction(Direction::Down);
        let mut last = TickOutcome::default();
        for _ in 0..settings.tile_count {
            last = tick(&mut state, &settings, 0.0, &mut rng);
            if state.phase == RunPhase::GameOver {
                break;
            }
        }
        assert_eq!(state.phase, RunPhase::GameOver);
        let collapse = last.collapse.expect("collapse reported");
        assert_eq!(collapse.segments.len(), 3);
        assert_eq!(collapse.at.y, settings.tile_count);
        assert!(matches!(
            last.events[0],
            GameEvent::Collision {
                cause: CollisionCause::Wall,
                ..
            }
        ));
        assert!(state.creature.is_collapsed());

        // Further ticks do nothing
        let after = tick(&mut state, &settings, 0.0, &mut rng);
        assert!(after.events.is_empty());
    }

    #[test]
    fn test_growth_monotonic_over_run() {
        let (mut state, settings, mut rng) = running_state(9);
        for i in 0..200 {
            if i % 3 == 0 {
                put_item_ahead(&mut state, ItemTier::Plain);
            }
            if i % 7 == 0 {
                let dir = Direction::ALL[i % 4];
                state.creature.set_direction(dir);
            }
            let before = state.creature.len();
            tick(&mut state, &settings, i as f64 * 150.0, &mut rng);
            assert!(state.creature.len() >= before);
            if state.phase == RunPhase::GameOver {
                break;
            }
        }
    }

    #[test]
    fn test_collision_tick_keeps_body() {
        let (mut state, settings, mut rng) = running_state(10);
        state.item.cell = IVec2::new(1, 1);
        state.creature.set_direction(Direction::Down);
        let mut collapse = None;
        for _ in 0..=settings.tile_count {
            let before: Vec<_> = state.creature.body().iter().copied().collect();
            let outcome = tick(&mut state, &settings, 0.0, &mut rng);
            assert!(state.creature.len() >= before.len());
            if let Some(c) = outcome.collapse {
                // The body is frozen where it stood at impact
                assert_eq!(
                    state.creature.body().iter().copied().collect::<Vec<_>>(),
                    before
                );
                assert_eq!(c.segments, before);
                collapse = Some(c);
                break;
            }
        }
        assert!(collapse.is_some());
        assert_eq!(state.creature.len(), 3);
    }
}
