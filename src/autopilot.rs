//! Greedy steering for unattended runs
//!
//! Looks one cell ahead: never reverses, skips moves that would collide,
//! and heads for whichever remaining cell is closest to the item.

use crate::sim::{Direction, SimulationState, StepKind};

/// Pick the direction for the next tick
pub fn steer(state: &SimulationState) -> Direction {
    let creature = &state.creature;
    let heading = creature.heading();
    let Some(head) = creature.head() else {
        return heading;
    };
    let target = state.item.cell;

    Direction::ALL
        .into_iter()
        .filter(|&dir| dir != heading.opposite())
        .filter_map(|dir| {
            let next = head + dir.delta();
            let kind = if next == target {
                StepKind::Grow
            } else {
                StepKind::Step
            };
            if creature.check_collision(next, kind) {
                return None;
            }
            // Ties go to the current heading
            let turn_cost = i32::from(dir != heading);
            Some((crate::manhattan(next, target) * 2 + turn_cost, dir))
        })
        .min_by_key(|&(score, _)| score)
        .map(|(_, dir)| dir)
        .unwrap_or(heading)
}
