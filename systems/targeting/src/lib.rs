#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that computes deterministic tower targets from world snapshots.

use breach_defence_core::{EnemyId, EnemySnapshot, EnemyView, TowerTarget, TowerView};
use breach_defence_world::SpatialGrid;
use glam::Vec2;

/// Tower targeting system that reuses scratch buffers to avoid repeated
/// allocations.
#[derive(Debug, Default)]
pub struct Targeting {
    candidates: Vec<(EnemyId, Vec2)>,
}

impl Targeting {
    /// Creates a new targeting system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects one target per tower: the eligible in-range enemy with the
    /// greatest lane progress, ties broken by lower id so the choice is
    /// stable under iteration-order perturbations.
    ///
    /// The output buffer is cleared before populating it with the latest
    /// assignments.
    pub fn handle(
        &mut self,
        towers: &TowerView,
        enemies: &EnemyView,
        grid: &SpatialGrid,
        out: &mut Vec<TowerTarget>,
    ) {
        out.clear();
        if towers.iter().next().is_none() || enemies.iter().next().is_none() {
            return;
        }

        for tower in towers.iter() {
            grid.query(tower.position, tower.range, &mut self.candidates);
            self.candidates.sort_by_key(|(id, _)| *id);

            let mut best: Option<&EnemySnapshot> = None;
            for &(candidate, _) in &self.candidates {
                let Some(enemy) = enemies.get(candidate) else {
                    continue;
                };
                if !eligible(enemy) {
                    continue;
                }
                if tower.position.distance(enemy.position) > tower.range {
                    continue;
                }
                let better = match best {
                    Some(current) => enemy.progress > current.progress,
                    None => true,
                };
                if better {
                    best = Some(enemy);
                }
            }

            if let Some(enemy) = best {
                out.push(TowerTarget {
                    tower: tower.id,
                    enemy: enemy.id,
                    tower_position: tower.position,
                    enemy_position: enemy.position,
                });
            }
        }
    }
}

/// Bosses and other tower-immune enemies never receive tower fire.
fn eligible(enemy: &EnemySnapshot) -> bool {
    !enemy.immune_to_towers && !enemy.is_boss
}
