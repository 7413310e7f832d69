//! Mutable entity records owned by the authoritative world.

use breach_defence_core::{
    config::ProtocolStats, EnemyArchetype, EnemyId, LaneId, ProjectileId, ProtocolKind, SlotId,
    SpawnSource, TowerId,
};
use glam::Vec2;

/// Slow effect applied by a projectile payload.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SlowEffect {
    /// Speed multiplier while the effect is active, in `(0, 1]`.
    pub(crate) multiplier: f32,
    /// Simulation time at which the effect wears off.
    pub(crate) expires_at: f64,
}

#[derive(Clone, Debug)]
pub(crate) struct Enemy {
    pub(crate) id: EnemyId,
    pub(crate) archetype: EnemyArchetype,
    pub(crate) lane: LaneId,
    pub(crate) source: SpawnSource,
    pub(crate) position: Vec2,
    pub(crate) progress: f32,
    pub(crate) base_speed: f32,
    pub(crate) current_speed: f32,
    pub(crate) health: f32,
    pub(crate) max_health: f32,
    pub(crate) size: f32,
    pub(crate) reward_flat: u64,
    pub(crate) reward_scaled: u64,
    pub(crate) is_dead: bool,
    pub(crate) reached_core: bool,
    pub(crate) is_boss: bool,
    pub(crate) immune_to_towers: bool,
    pub(crate) slow: Option<SlowEffect>,
}

impl Enemy {
    /// Live and still walking: the only state movement and towers act on.
    pub(crate) fn is_active(&self) -> bool {
        !self.is_dead && !self.reached_core
    }
}

/// Effective per-level combat stats derived from a protocol block.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct EffectiveStats {
    pub(crate) damage: f32,
    pub(crate) range: f32,
    pub(crate) attack_speed: f32,
}

/// Applies the per-level multipliers to a protocol's base stats.
pub(crate) fn effective_stats(stats: &ProtocolStats, level: u32) -> EffectiveStats {
    let steps = level.saturating_sub(1) as i32;
    EffectiveStats {
        damage: stats.damage * stats.damage_per_level.powi(steps),
        range: stats.range * stats.range_per_level.powi(steps),
        attack_speed: stats.attack_speed * stats.attack_speed_per_level.powi(steps),
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Tower {
    pub(crate) id: TowerId,
    pub(crate) protocol: ProtocolKind,
    pub(crate) slot: SlotId,
    pub(crate) position: Vec2,
    pub(crate) level: u32,
    /// Total hash sunk into the tower, for sell refunds.
    pub(crate) invested: u64,
    pub(crate) last_attack_time: f64,
    pub(crate) target: Option<EnemyId>,
}

impl Tower {
    /// Seconds between volleys at the given attack speed.
    pub(crate) fn cooldown(attack_speed: f32) -> f64 {
        f64::from(1.0 / attack_speed)
    }

    pub(crate) fn ready(&self, attack_speed: f32, sim_time: f64) -> bool {
        sim_time - self.last_attack_time >= Self::cooldown(attack_speed)
    }
}

/// Area, slow, and chain payload carried by a projectile.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct ProjectilePayload {
    pub(crate) splash_radius: f32,
    pub(crate) splash_damage_fraction: f32,
    pub(crate) slow_amount: f32,
    pub(crate) slow_duration: f32,
    pub(crate) chain_count: u32,
    pub(crate) chain_range: f32,
    pub(crate) chain_damage_fraction: f32,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct Homing {
    pub(crate) target: EnemyId,
    pub(crate) turn_rate: f32,
}

#[derive(Clone, Debug)]
pub(crate) struct Projectile {
    pub(crate) id: ProjectileId,
    pub(crate) position: Vec2,
    /// Position at the start of the projectile's own movement step; the
    /// swept collision segment runs from here to `position`.
    pub(crate) previous_position: Vec2,
    pub(crate) velocity: Vec2,
    pub(crate) damage: f32,
    pub(crate) radius: f32,
    pub(crate) lifetime: f32,
    pub(crate) pierce_remaining: u32,
    /// Enemies already struck; bounded by pierce + 1 entries.
    pub(crate) hit: Vec<EnemyId>,
    pub(crate) homing: Option<Homing>,
    pub(crate) payload: ProjectilePayload,
    pub(crate) consumed: bool,
    pub(crate) enemy_sourced: bool,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct TowerSlot {
    pub(crate) id: SlotId,
    pub(crate) position: Vec2,
    pub(crate) tower: Option<TowerId>,
}

#[cfg(test)]
mod tests {
    use super::{effective_stats, Tower};
    use breach_defence_core::config::ProtocolTable;

    #[test]
    fn effective_stats_compound_per_level() {
        let table = ProtocolTable::default();
        let base = table.firewall;
        let level_one = effective_stats(&base, 1);
        assert_eq!(level_one.damage, base.damage);
        assert_eq!(level_one.range, base.range);

        let level_three = effective_stats(&base, 3);
        let expected = base.damage * base.damage_per_level * base.damage_per_level;
        assert!((level_three.damage - expected).abs() < 1.0e-3);
    }

    #[test]
    fn tower_readiness_respects_cooldown() {
        let tower = Tower {
            id: breach_defence_core::TowerId::new(1),
            protocol: breach_defence_core::ProtocolKind::Firewall,
            slot: breach_defence_core::SlotId::new(0),
            position: glam::Vec2::ZERO,
            level: 1,
            invested: 100,
            last_attack_time: 10.0,
            target: None,
        };
        assert!(!tower.ready(2.0, 10.25));
        assert!(tower.ready(2.0, 10.5));
    }
}
