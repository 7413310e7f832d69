//! Lane-following movement for enemies.

use breach_defence_core::{lanes::Lane, EnemyId};

use crate::entities::Enemy;

/// Advances every active enemy along its lane and expires elapsed slow
/// effects. Enemies that finish their lane are marked `reached_core`; the
/// caller routes those through leak resolution afterwards.
///
/// The engaged boss, if any, holds position while the encounter runs.
pub(crate) fn advance(
    enemies: &mut [Enemy],
    lanes: &[Lane],
    dt: f32,
    sim_time: f64,
    held: Option<EnemyId>,
) {
    for enemy in enemies.iter_mut() {
        if !enemy.is_active() {
            continue;
        }
        if let Some(slow) = enemy.slow {
            if sim_time >= slow.expires_at {
                enemy.slow = None;
            }
        }
        enemy.current_speed = match enemy.slow {
            Some(slow) => enemy.base_speed * slow.multiplier,
            None => enemy.base_speed,
        };

        let Some(lane) = lanes.get(enemy.lane.get() as usize) else {
            continue;
        };
        if held == Some(enemy.id) {
            enemy.position = lane.position_at(enemy.progress);
            continue;
        }

        enemy.progress = (enemy.progress + enemy.current_speed * dt / lane.total_length()).min(1.0);
        enemy.position = lane.position_at(enemy.progress);
        if enemy.progress >= 1.0 {
            enemy.reached_core = true;
        }
    }
}
