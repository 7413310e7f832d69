//! Projectile motion and swept-circle collision resolution.

use breach_defence_core::{
    geometry::{segment_circle_intersects, Bounds},
    EnemyId, Event,
};
use glam::Vec2;

use crate::entities::{Enemy, Projectile, SlowEffect};
use crate::spatial::SpatialGrid;

/// Margin added to the candidate query radius so the largest enemies are
/// always covered.
const CANDIDATE_MARGIN: f32 = 64.0;

/// Reusable buffers for the collision pass.
#[derive(Debug, Default)]
pub(crate) struct CombatScratch {
    candidates: Vec<(EnemyId, Vec2)>,
    splash: Vec<(EnemyId, Vec2)>,
}

/// Advances every live projectile: homing correction, then integration.
/// The previous position is stamped at the start of each projectile's own
/// movement step so the swept segment always covers exactly one step.
pub(crate) fn advance_projectiles(
    projectiles: &mut [Projectile],
    enemies: &[Enemy],
    bounds: Bounds,
    dt: f32,
) {
    for projectile in projectiles.iter_mut() {
        if projectile.consumed {
            continue;
        }
        projectile.lifetime -= dt;
        if projectile.lifetime <= 0.0 {
            projectile.consumed = true;
            continue;
        }

        if let Some(homing) = projectile.homing {
            if let Some(target) = find_enemy(enemies, homing.target).filter(|e| e.is_active()) {
                let desired = (target.position - projectile.position).normalize_or_zero();
                let speed = projectile.velocity.length();
                if desired != Vec2::ZERO && speed > 0.0 {
                    let current = projectile.velocity / speed;
                    let max_turn = homing.turn_rate * dt;
                    let angle = current.angle_between(desired).clamp(-max_turn, max_turn);
                    projectile.velocity = Vec2::from_angle(angle).rotate(current) * speed;
                }
            }
        }

        projectile.previous_position = projectile.position;
        projectile.position += projectile.velocity * dt;
        if !bounds.contains(projectile.position) {
            projectile.consumed = true;
        }
    }
}

/// Resolves every live tower projectile against the swept segment between
/// its previous and current position. Newly dead enemies are appended to
/// `kills` in resolution order; the caller credits rewards.
pub(crate) fn resolve_collisions(
    projectiles: &mut [Projectile],
    enemies: &mut [Enemy],
    grid: &SpatialGrid,
    sim_time: f64,
    scratch: &mut CombatScratch,
    kills: &mut Vec<EnemyId>,
    events: &mut Vec<Event>,
) {
    for projectile in projectiles.iter_mut() {
        if projectile.consumed || projectile.enemy_sourced {
            continue;
        }

        let segment_start = projectile.previous_position;
        let segment_end = projectile.position;
        let midpoint = (segment_start + segment_end) * 0.5;
        let query_radius = segment_start.distance(segment_end) * 0.5
            + projectile.radius
            + CANDIDATE_MARGIN;
        grid.query(midpoint, query_radius, &mut scratch.candidates);

        // Earliest hit first: order candidates along the flight segment,
        // tie-broken by id so resolution is deterministic.
        scratch.candidates.sort_by(|a, b| {
            let da = segment_start.distance_squared(a.1);
            let db = segment_start.distance_squared(b.1);
            da.partial_cmp(&db)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });

        for index in 0..scratch.candidates.len() {
            let candidate = scratch.candidates[index].0;
            if projectile.hit.contains(&candidate) {
                continue;
            }
            let Some(enemy) = find_enemy_mut(enemies, candidate) else {
                continue;
            };
            if !enemy.is_active() || enemy.immune_to_towers {
                continue;
            }
            let hit_radius = projectile.radius + enemy.size * 0.5;
            if !segment_circle_intersects(segment_start, segment_end, enemy.position, hit_radius)
            {
                continue;
            }

            let impact = enemy.position;
            strike(enemy, projectile.damage, projectile, sim_time, kills, events);

            if projectile.payload.splash_radius > 0.0 {
                apply_splash(
                    projectile,
                    candidate,
                    impact,
                    enemies,
                    grid,
                    sim_time,
                    &mut scratch.splash,
                    kills,
                    events,
                );
            }
            if projectile.payload.chain_count > 0 {
                apply_chain(projectile, impact, enemies, sim_time, kills, events);
            }

            if projectile.pierce_remaining > 0 {
                projectile.pierce_remaining -= 1;
            } else {
                projectile.consumed = true;
                break;
            }
        }
    }
}

/// Applies a direct hit: damage, hit-set bookkeeping, slow payload, death.
fn strike(
    enemy: &mut Enemy,
    damage: f32,
    projectile: &mut Projectile,
    sim_time: f64,
    kills: &mut Vec<EnemyId>,
    events: &mut Vec<Event>,
) {
    enemy.health -= damage;
    projectile.hit.push(enemy.id);
    events.push(Event::ProjectileHit {
        projectile: projectile.id,
        enemy: enemy.id,
        damage,
    });
    if projectile.payload.slow_amount > 0.0 {
        apply_slow(enemy, projectile, sim_time);
    }
    if enemy.health <= 0.0 {
        enemy.is_dead = true;
        kills.push(enemy.id);
    }
}

fn apply_slow(enemy: &mut Enemy, projectile: &Projectile, sim_time: f64) {
    let multiplier = (1.0 - projectile.payload.slow_amount).clamp(0.0, 1.0);
    let expires_at = sim_time + f64::from(projectile.payload.slow_duration);
    // A fresh slow replaces a weaker or shorter one, never strengthens it.
    let effect = match enemy.slow {
        Some(existing) if existing.multiplier <= multiplier && existing.expires_at >= expires_at => {
            existing
        }
        _ => SlowEffect {
            multiplier,
            expires_at,
        },
    };
    enemy.slow = Some(effect);
}

/// Secondary area damage around the primary impact. Excludes the primary
/// target and tower-immune enemies; splash victims do not join the hit set
/// and so do not consume pierce.
#[allow(clippy::too_many_arguments)]
fn apply_splash(
    projectile: &mut Projectile,
    primary: EnemyId,
    impact: Vec2,
    enemies: &mut [Enemy],
    grid: &SpatialGrid,
    sim_time: f64,
    splash_candidates: &mut Vec<(EnemyId, Vec2)>,
    kills: &mut Vec<EnemyId>,
    events: &mut Vec<Event>,
) {
    let radius = projectile.payload.splash_radius;
    let damage = projectile.damage * projectile.payload.splash_damage_fraction;
    grid.query(impact, radius + CANDIDATE_MARGIN, splash_candidates);
    splash_candidates.sort_by_key(|(id, _)| *id);

    for &(candidate, _) in splash_candidates.iter() {
        if candidate == primary {
            continue;
        }
        let Some(enemy) = find_enemy_mut(enemies, candidate) else {
            continue;
        };
        if !enemy.is_active() || enemy.immune_to_towers {
            continue;
        }
        if enemy.position.distance(impact) > radius + enemy.size * 0.5 {
            continue;
        }
        enemy.health -= damage;
        events.push(Event::ProjectileHit {
            projectile: projectile.id,
            enemy: enemy.id,
            damage,
        });
        if projectile.payload.slow_amount > 0.0 {
            apply_slow(enemy, projectile, sim_time);
        }
        if enemy.health <= 0.0 {
            enemy.is_dead = true;
            kills.push(enemy.id);
        }
    }
}

/// Chain lightning: successive jumps to the nearest unhit live enemy within
/// chain range, each at a compounding damage fraction. Chained enemies join
/// the hit set so a pierce pass never strikes them again.
fn apply_chain(
    projectile: &mut Projectile,
    impact: Vec2,
    enemies: &mut [Enemy],
    sim_time: f64,
    kills: &mut Vec<EnemyId>,
    events: &mut Vec<Event>,
) {
    let mut origin = impact;
    let mut damage = projectile.damage * projectile.payload.chain_damage_fraction;
    for _ in 0..projectile.payload.chain_count {
        let next = enemies
            .iter()
            .filter(|enemy| {
                enemy.is_active()
                    && !enemy.immune_to_towers
                    && !projectile.hit.contains(&enemy.id)
                    && enemy.position.distance(origin) <= projectile.payload.chain_range
            })
            .min_by(|a, b| {
                let da = a.position.distance_squared(origin);
                let db = b.position.distance_squared(origin);
                da.partial_cmp(&db)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.id.cmp(&b.id))
            })
            .map(|enemy| enemy.id);
        let Some(next) = next else {
            break;
        };
        let Some(enemy) = find_enemy_mut(enemies, next) else {
            break;
        };
        enemy.health -= damage;
        projectile.hit.push(enemy.id);
        events.push(Event::ProjectileHit {
            projectile: projectile.id,
            enemy: enemy.id,
            damage,
        });
        if projectile.payload.slow_amount > 0.0 {
            apply_slow(enemy, projectile, sim_time);
        }
        if enemy.health <= 0.0 {
            enemy.is_dead = true;
            kills.push(enemy.id);
        }
        origin = enemy.position;
        damage *= projectile.payload.chain_damage_fraction;
    }
}

/// Enemies are stored in ascending id order, so lookups binary-search.
fn find_enemy(enemies: &[Enemy], id: EnemyId) -> Option<&Enemy> {
    enemies
        .binary_search_by_key(&id, |enemy| enemy.id)
        .ok()
        .map(|index| &enemies[index])
}

fn find_enemy_mut(enemies: &mut [Enemy], id: EnemyId) -> Option<&mut Enemy> {
    enemies
        .binary_search_by_key(&id, |enemy| enemy.id)
        .ok()
        .map(move |index| &mut enemies[index])
}

#[cfg(test)]
mod tests {
    use super::{advance_projectiles, resolve_collisions, CombatScratch};
    use crate::entities::{Enemy, Projectile, ProjectilePayload};
    use crate::spatial::SpatialGrid;
    use breach_defence_core::{
        geometry::Bounds, EnemyArchetype, EnemyId, EnemyKind, Event, LaneId, ProjectileId,
        SpawnSource,
    };
    use glam::Vec2;

    fn enemy(id: u32, position: Vec2) -> Enemy {
        Enemy {
            id: EnemyId::new(id),
            archetype: EnemyArchetype::Ordinary(EnemyKind::Script),
            lane: LaneId::new(0),
            source: SpawnSource::Idle,
            position,
            progress: 0.5,
            base_speed: 20.0,
            current_speed: 20.0,
            health: 10.0,
            max_health: 10.0,
            size: 10.0,
            reward_flat: 5,
            reward_scaled: 2,
            is_dead: false,
            reached_core: false,
            is_boss: false,
            immune_to_towers: false,
            slow: None,
        }
    }

    fn projectile(id: u32, from: Vec2, to: Vec2) -> Projectile {
        Projectile {
            id: ProjectileId::new(id),
            position: to,
            previous_position: from,
            velocity: (to - from).normalize_or_zero() * 400.0,
            damage: 4.0,
            radius: 3.0,
            lifetime: 1.0,
            pierce_remaining: 0,
            hit: Vec::new(),
            homing: None,
            payload: ProjectilePayload::default(),
            consumed: false,
            enemy_sourced: false,
        }
    }

    fn grid_for(enemies: &[Enemy]) -> SpatialGrid {
        let mut grid = SpatialGrid::new(Bounds::new(Vec2::ZERO, Vec2::new(800.0, 600.0)));
        grid.rebuild(enemies.iter().map(|e| (e.id, e.position)));
        grid
    }

    fn resolve(
        projectiles: &mut [Projectile],
        enemies: &mut [Enemy],
    ) -> (Vec<EnemyId>, Vec<Event>) {
        let grid = grid_for(enemies);
        let mut scratch = CombatScratch::default();
        let mut kills = Vec::new();
        let mut events = Vec::new();
        resolve_collisions(
            projectiles,
            enemies,
            &grid,
            1.0,
            &mut scratch,
            &mut kills,
            &mut events,
        );
        (kills, events)
    }

    #[test]
    fn swept_segment_hits_enemy_between_endpoints() {
        // Neither endpoint is near the enemy; only the sweep covers it.
        let mut enemies = vec![enemy(1, Vec2::new(100.0, 50.0))];
        let mut projectiles = vec![projectile(
            1,
            Vec2::new(20.0, 50.0),
            Vec2::new(180.0, 50.0),
        )];
        let (kills, events) = resolve(&mut projectiles, &mut enemies);
        assert_eq!(events.len(), 1);
        assert!(kills.is_empty());
        assert_eq!(enemies[0].health, 6.0);
        assert!(projectiles[0].consumed);
    }

    #[test]
    fn pierce_zero_consumes_after_one_hit() {
        let mut enemies = vec![
            enemy(1, Vec2::new(80.0, 50.0)),
            enemy(2, Vec2::new(120.0, 50.0)),
        ];
        let mut projectiles = vec![projectile(
            1,
            Vec2::new(20.0, 50.0),
            Vec2::new(180.0, 50.0),
        )];
        let (_, events) = resolve(&mut projectiles, &mut enemies);
        assert_eq!(events.len(), 1);
        assert_eq!(enemies[0].health, 6.0);
        assert_eq!(enemies[1].health, 10.0);
    }

    #[test]
    fn pierce_continues_in_the_same_step_without_repeat_hits() {
        let mut enemies = vec![
            enemy(1, Vec2::new(80.0, 50.0)),
            enemy(2, Vec2::new(120.0, 50.0)),
            enemy(3, Vec2::new(160.0, 50.0)),
        ];
        let mut projectiles = vec![projectile(
            1,
            Vec2::new(20.0, 50.0),
            Vec2::new(200.0, 50.0),
        )];
        projectiles[0].pierce_remaining = 1;
        let (_, events) = resolve(&mut projectiles, &mut enemies);

        // pierce = 1: at most two hits, nearest first along the segment.
        assert_eq!(events.len(), 2);
        assert_eq!(enemies[0].health, 6.0);
        assert_eq!(enemies[1].health, 6.0);
        assert_eq!(enemies[2].health, 10.0);
        assert!(projectiles[0].consumed);
        assert_eq!(projectiles[0].hit.len(), 2);
    }

    #[test]
    fn splash_damages_neighbours_but_not_the_primary_twice() {
        let mut enemies = vec![
            enemy(1, Vec2::new(100.0, 50.0)),
            enemy(2, Vec2::new(120.0, 50.0)),
            enemy(3, Vec2::new(400.0, 400.0)),
        ];
        let mut projectiles = vec![projectile(
            1,
            Vec2::new(20.0, 50.0),
            Vec2::new(110.0, 50.0),
        )];
        projectiles[0].payload.splash_radius = 40.0;
        projectiles[0].payload.splash_damage_fraction = 0.5;
        let (_, events) = resolve(&mut projectiles, &mut enemies);

        assert_eq!(events.len(), 2);
        assert_eq!(enemies[0].health, 6.0);
        assert_eq!(enemies[1].health, 8.0);
        assert_eq!(enemies[2].health, 10.0);
    }

    #[test]
    fn slow_payload_applies_on_hit() {
        let mut enemies = vec![enemy(1, Vec2::new(100.0, 50.0))];
        let mut projectiles = vec![projectile(
            1,
            Vec2::new(20.0, 50.0),
            Vec2::new(180.0, 50.0),
        )];
        projectiles[0].payload.slow_amount = 0.4;
        projectiles[0].payload.slow_duration = 2.0;
        let _ = resolve(&mut projectiles, &mut enemies);

        let slow = enemies[0].slow.expect("slow applied");
        assert!((slow.multiplier - 0.6).abs() < 1.0e-6);
        assert_eq!(slow.expires_at, 3.0);
    }

    #[test]
    fn immune_enemies_are_never_struck() {
        let mut enemies = vec![enemy(1, Vec2::new(100.0, 50.0))];
        enemies[0].immune_to_towers = true;
        let mut projectiles = vec![projectile(
            1,
            Vec2::new(20.0, 50.0),
            Vec2::new(180.0, 50.0),
        )];
        let (_, events) = resolve(&mut projectiles, &mut enemies);
        assert!(events.is_empty());
        assert!(!projectiles[0].consumed);
    }

    #[test]
    fn lethal_hit_marks_dead_and_reports_the_kill() {
        let mut enemies = vec![enemy(1, Vec2::new(100.0, 50.0))];
        enemies[0].health = 3.0;
        let mut projectiles = vec![projectile(
            1,
            Vec2::new(20.0, 50.0),
            Vec2::new(180.0, 50.0),
        )];
        let (kills, _) = resolve(&mut projectiles, &mut enemies);
        assert_eq!(kills, vec![EnemyId::new(1)]);
        assert!(enemies[0].is_dead);
    }

    #[test]
    fn chain_jumps_to_nearest_unhit_enemy() {
        let mut enemies = vec![
            enemy(1, Vec2::new(100.0, 50.0)),
            enemy(2, Vec2::new(130.0, 50.0)),
            enemy(3, Vec2::new(170.0, 50.0)),
        ];
        let mut projectiles = vec![projectile(
            1,
            Vec2::new(20.0, 50.0),
            Vec2::new(105.0, 50.0),
        )];
        projectiles[0].payload.chain_count = 2;
        projectiles[0].payload.chain_range = 50.0;
        projectiles[0].payload.chain_damage_fraction = 0.5;
        let (_, events) = resolve(&mut projectiles, &mut enemies);

        // Primary hit plus two chain jumps at halving damage.
        assert_eq!(events.len(), 3);
        assert_eq!(enemies[0].health, 6.0);
        assert_eq!(enemies[1].health, 8.0);
        assert_eq!(enemies[2].health, 9.0);
    }

    #[test]
    fn expired_and_out_of_bounds_projectiles_are_consumed() {
        let bounds = Bounds::new(Vec2::ZERO, Vec2::new(200.0, 200.0));
        let mut projectiles = vec![
            projectile(1, Vec2::new(50.0, 50.0), Vec2::new(50.0, 50.0)),
            projectile(2, Vec2::new(190.0, 50.0), Vec2::new(190.0, 50.0)),
        ];
        projectiles[0].lifetime = 0.05;
        projectiles[0].velocity = Vec2::ZERO;
        projectiles[1].velocity = Vec2::new(400.0, 0.0);

        advance_projectiles(&mut projectiles, &[], bounds, 0.1);
        assert!(projectiles[0].consumed);
        assert!(projectiles[1].consumed);
    }

    #[test]
    fn homing_turns_toward_the_target() {
        let enemies = vec![enemy(1, Vec2::new(100.0, 100.0))];
        let mut projectiles = vec![projectile(1, Vec2::new(50.0, 50.0), Vec2::new(50.0, 50.0))];
        projectiles[0].velocity = Vec2::new(200.0, 0.0);
        projectiles[0].homing = Some(crate::entities::Homing {
            target: EnemyId::new(1),
            turn_rate: 10.0,
        });
        let bounds = Bounds::new(Vec2::ZERO, Vec2::new(400.0, 400.0));

        advance_projectiles(&mut projectiles, &enemies, bounds, 0.05);
        assert!(projectiles[0].velocity.y > 0.0);
        // Speed is preserved by the turn.
        assert!((projectiles[0].velocity.length() - 200.0).abs() < 1.0e-2);
    }
}
