#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that turns tower targets into predictive firing commands.
//!
//! Enemies move continuously between attack ticks, so aiming at the target's
//! instantaneous position systematically undershoots fast movers. The lead
//! position adds the target's estimated velocity over the projectile's
//! flight time, capped so erratic path curvature cannot produce wild
//! overshoot.

use breach_defence_core::{
    config::TargetingTuning, Command, EnemyView, LaneId, TowerTarget, TowerView,
};
use glam::Vec2;

/// Ballistics system that emits `Command::FireProjectile` for ready towers.
#[derive(Debug, Default)]
pub struct Ballistics;

impl Ballistics {
    /// Creates a new ballistics system.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Emits one firing command per ready tower with a live target. The
    /// lane sampler maps `(lane, progress)` to a world position and returns
    /// `None` for stale lanes or out-of-range progress.
    pub fn handle<F>(
        &mut self,
        towers: &TowerView,
        enemies: &EnemyView,
        targets: &[TowerTarget],
        tuning: &TargetingTuning,
        lane_position: F,
        out: &mut Vec<Command>,
    ) where
        F: Fn(LaneId, f32) -> Option<Vec2>,
    {
        for target in targets {
            let Some(tower) = towers.get(target.tower) else {
                continue;
            };
            if !tower.ready {
                continue;
            }
            let Some(enemy) = enemies.get(target.enemy) else {
                continue;
            };

            let velocity = estimate_velocity(
                enemy.lane,
                enemy.progress,
                enemy.speed,
                tuning.progress_sample_delta,
                &lane_position,
            );
            let distance = tower.position.distance(enemy.position);
            let flight_time = if tower.projectile_speed > 0.0 {
                (distance / tower.projectile_speed).min(tuning.max_prediction_secs)
            } else {
                0.0
            };
            let aim = enemy.position + velocity * flight_time;

            out.push(Command::FireProjectile {
                tower: target.tower,
                target: target.enemy,
                aim,
            });
        }
    }
}

/// Samples two nearby lane positions a small progress delta apart and scales
/// the chord direction by the enemy's current speed.
fn estimate_velocity<F>(
    lane: LaneId,
    progress: f32,
    speed: f32,
    sample_delta: f32,
    lane_position: &F,
) -> Vec2
where
    F: Fn(LaneId, f32) -> Option<Vec2>,
{
    let ahead = (progress + sample_delta).min(1.0);
    let (Some(here), Some(there)) = (lane_position(lane, progress), lane_position(lane, ahead))
    else {
        return Vec2::ZERO;
    };
    (there - here).normalize_or_zero() * speed
}
