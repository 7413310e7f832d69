#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Breach Defence.
//!
//! All mutation flows through [`apply`]; adapters and systems read back via
//! the [`query`] module. One orchestrator holds the exclusive mutable
//! reference per tick, so no interior locking is needed.

use breach_defence_core::{
    BossDifficulty, Bounds, Command, EnemyArchetype, EnemyId, EnemyKind, Event, KillRecord, Lane,
    LaneId, OutcomeError, OverclockError, PlacementError, ProjectileId, ProtocolKind,
    RecoveryError, SellError, SlotDescriptor, SlotId, SpawnError, SpawnSource, TowerId,
    UpgradeError,
};
use breach_defence_core::config::BalanceTable;
use glam::Vec2;
use std::time::Duration;

mod boss;
mod combat;
mod economy;
mod entities;
mod movement;
mod spatial;

pub use spatial::SpatialGrid;

use boss::BossState;
use combat::CombatScratch;
use economy::{Economy, LeakOutcome, Threat};
use entities::{
    effective_stats, Enemy, Homing, Projectile, ProjectilePayload, Tower, TowerSlot,
};

/// The single authoritative aggregate for one defense session.
#[derive(Debug)]
pub struct World {
    balance: BalanceTable,
    lanes: Vec<Lane>,
    unlocked_lanes: u32,
    bounds: Bounds,
    slots: Vec<TowerSlot>,
    unlocked_protocols: Vec<ProtocolKind>,
    enemies: Vec<Enemy>,
    towers: Vec<Tower>,
    projectiles: Vec<Projectile>,
    economy: Economy,
    threat: Threat,
    boss: BossState,
    grid: SpatialGrid,
    scratch: CombatScratch,
    kill_buffer: Vec<EnemyId>,
    /// Enemies left in the current wave; zero outside wave mode.
    wave_remaining: u32,
    next_enemy: u32,
    next_tower: u32,
    next_projectile: u32,
    sim_time: f64,
}

impl World {
    /// Creates a fresh world under the provided balance table. Level layout
    /// arrives later through [`Command::ConfigureLevel`].
    #[must_use]
    pub fn new(balance: BalanceTable) -> Self {
        let bounds = Bounds::new(Vec2::ZERO, Vec2::splat(800.0));
        let economy = Economy::new(balance.economy.starting_hash);
        let boss = BossState::new(&balance.boss);
        Self {
            lanes: Vec::new(),
            unlocked_lanes: 0,
            bounds,
            slots: Vec::new(),
            unlocked_protocols: vec![ProtocolKind::Firewall],
            enemies: Vec::new(),
            towers: Vec::new(),
            projectiles: Vec::new(),
            economy,
            threat: Threat::new(),
            boss,
            grid: SpatialGrid::new(bounds),
            scratch: CombatScratch::default(),
            kill_buffer: Vec::new(),
            wave_remaining: 0,
            next_enemy: 0,
            next_tower: 0,
            next_projectile: 0,
            sim_time: 0.0,
            balance,
        }
    }

    fn allocate_enemy_id(&mut self) -> EnemyId {
        let id = EnemyId::new(self.next_enemy);
        self.next_enemy += 1;
        id
    }

    fn allocate_tower_id(&mut self) -> TowerId {
        let id = TowerId::new(self.next_tower);
        self.next_tower += 1;
        id
    }

    fn allocate_projectile_id(&mut self) -> ProjectileId {
        let id = ProjectileId::new(self.next_projectile);
        self.next_projectile += 1;
        id
    }

    fn enemy(&self, id: EnemyId) -> Option<&Enemy> {
        self.enemies
            .binary_search_by_key(&id, |enemy| enemy.id)
            .ok()
            .map(|index| &self.enemies[index])
    }

    fn tower_index(&self, id: TowerId) -> Option<usize> {
        self.towers.iter().position(|tower| tower.id == id)
    }

    fn power_used(&self) -> f32 {
        self.towers
            .iter()
            .map(|tower| self.balance.protocols.stats(tower.protocol).power_draw)
            .sum()
    }

    fn power_budget(&self) -> f32 {
        self.balance.power.base_budget * self.threat.power_multiplier(&self.balance.overclock)
    }

    /// Instantiates an ordinary enemy with the current threat scaling applied.
    fn spawn_ordinary(&mut self, kind: EnemyKind, lane: LaneId, source: SpawnSource) -> EnemyId {
        let stats = *self.balance.enemies.stats(kind);
        let scaling = &self.balance.threat;
        let level = self.threat.level;
        let health = stats.health * (1.0 + level * scaling.health_scaling);
        let speed = stats.speed * (1.0 + level * scaling.speed_scaling);
        let id = self.allocate_enemy_id();
        let start = self.lanes[lane.get() as usize].start();
        self.enemies.push(Enemy {
            id,
            archetype: EnemyArchetype::Ordinary(kind),
            lane,
            source,
            position: start,
            progress: 0.0,
            base_speed: speed,
            current_speed: speed,
            health,
            max_health: health,
            size: stats.size,
            reward_flat: stats.reward_flat,
            reward_scaled: stats.reward_scaled,
            is_dead: false,
            reached_core: false,
            is_boss: false,
            immune_to_towers: false,
            slow: None,
        });
        if source == SpawnSource::Wave {
            self.wave_remaining += 1;
        }
        id
    }

    fn spawn_boss(&mut self, kind: breach_defence_core::BossKind, lane: LaneId) -> EnemyId {
        let stats = *self.balance.bosses.stats(kind);
        let health = stats.health * (1.0 + self.threat.level * self.balance.threat.health_scaling);
        let id = self.allocate_enemy_id();
        let start = self.lanes[lane.get() as usize].start();
        self.enemies.push(Enemy {
            id,
            archetype: EnemyArchetype::Boss(kind),
            lane,
            source: SpawnSource::Idle,
            position: start,
            progress: 0.0,
            base_speed: stats.speed,
            current_speed: stats.speed,
            health,
            max_health: health,
            size: stats.size,
            reward_flat: 0,
            reward_scaled: 0,
            is_dead: false,
            reached_core: false,
            is_boss: true,
            immune_to_towers: true,
            slow: None,
        });
        id
    }

    fn mark_enemy_dead(&mut self, id: EnemyId) {
        if let Ok(index) = self.enemies.binary_search_by_key(&id, |enemy| enemy.id) {
            self.enemies[index].is_dead = true;
        }
    }

    /// Scans enemies that finished their lane this tick and converts each
    /// into economy or boss-lifecycle state changes.
    fn resolve_leaks(&mut self, out_events: &mut Vec<Event>) {
        let arrived: Vec<EnemyId> = self
            .enemies
            .iter()
            .filter(|enemy| enemy.reached_core && !enemy.is_dead)
            .map(|enemy| enemy.id)
            .collect();

        for id in arrived {
            if self.boss.active.map(|active| active.enemy) == Some(id) {
                self.boss_reached_core(out_events);
                continue;
            }
            let outcome = self.economy.apply_leaks(1, &self.balance.economy);
            out_events.push(Event::EnemyLeaked {
                enemy: id,
                leak_counter: outcome.leak_counter,
                efficiency: outcome.efficiency,
            });
            self.emit_boundary_events(outcome, out_events);
            self.mark_enemy_dead(id);
        }
    }

    fn emit_boundary_events(&self, outcome: LeakOutcome, out_events: &mut Vec<Event>) {
        if outcome.warning_crossed {
            out_events.push(Event::EfficiencyWarning {
                efficiency: outcome.efficiency,
            });
        }
        if outcome.froze {
            out_events.push(Event::SystemFrozen {
                freeze_count: self.economy.freeze_count,
            });
        }
    }

    fn boss_reached_core(&mut self, out_events: &mut Vec<Event>) {
        let Some(departed) = self.boss.complete_departure(&self.balance.boss) else {
            return;
        };
        self.mark_enemy_dead(departed.enemy);
        let outcome = self
            .economy
            .apply_leaks(self.balance.boss.leak_penalty, &self.balance.economy);
        out_events.push(Event::BossReachedCore {
            kind: departed.kind,
        });
        self.emit_boundary_events(outcome, out_events);
    }

    /// Removes dead and arrived enemies plus consumed projectiles, clears
    /// stale tower targets, and settles the wave tally.
    fn cleanup(&mut self, out_events: &mut Vec<Event>) {
        let before_wave = self.wave_remaining;
        let mut removed_wave = 0;
        self.enemies.retain(|enemy| {
            if enemy.is_active() {
                return true;
            }
            if enemy.source == SpawnSource::Wave {
                removed_wave += 1;
            }
            false
        });
        self.wave_remaining = self.wave_remaining.saturating_sub(removed_wave);
        if before_wave > 0 && self.wave_remaining == 0 && removed_wave > 0 {
            out_events.push(Event::WaveCleared);
        }

        self.projectiles.retain(|projectile| !projectile.consumed);

        for tower in &mut self.towers {
            let stale = tower
                .target
                .map(|target| {
                    self.enemies
                        .binary_search_by_key(&target, |enemy| enemy.id)
                        .map(|index| !self.enemies[index].is_active())
                        .unwrap_or(true)
                })
                .unwrap_or(false);
            if stale {
                tower.target = None;
            }
        }
    }

    /// Credits kill rewards in resolution order and emits the loot handoff
    /// records.
    fn settle_kills(&mut self, out_events: &mut Vec<Event>) {
        let kills = std::mem::take(&mut self.kill_buffer);
        for id in &kills {
            let Some(enemy) = self.enemy(*id) else {
                continue;
            };
            let EnemyArchetype::Ordinary(kind) = enemy.archetype else {
                continue;
            };
            let position = enemy.position;
            let scaled = self
                .balance
                .reward_scaling
                .apply(enemy.reward_scaled, self.threat.level);
            let reward = enemy.reward_flat + scaled;
            let credited = self
                .economy
                .add_hash(reward, self.balance.economy.storage_capacity);
            out_events.push(Event::EnemyKilled {
                record: KillRecord {
                    enemy: *id,
                    kind,
                    position,
                    reward,
                    credited,
                },
            });
        }
        self.kill_buffer = kills;
        self.kill_buffer.clear();
    }

    fn rebuild_spatial_index(&mut self) {
        let entries: Vec<(EnemyId, Vec2)> = self
            .enemies
            .iter()
            .filter(|enemy| enemy.is_active())
            .map(|enemy| (enemy.id, enemy.position))
            .collect();
        self.grid.rebuild(entries.into_iter());
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(BalanceTable::default())
    }
}

/// Applies the provided command to the world, mutating state
/// deterministically and appending the resulting events.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureLevel {
            lanes,
            slots,
            bounds,
            unlocked_lanes,
        } => configure_level(world, lanes, slots, bounds, unlocked_lanes, out_events),
        Command::UnlockLane => {
            if (world.unlocked_lanes as usize) < world.lanes.len() {
                let lane = LaneId::new(world.unlocked_lanes);
                world.unlocked_lanes += 1;
                out_events.push(Event::LaneUnlocked { lane });
            }
        }
        Command::UnlockProtocol { protocol } => {
            if !world.unlocked_protocols.contains(&protocol) {
                world.unlocked_protocols.push(protocol);
                out_events.push(Event::ProtocolUnlocked { protocol });
            }
        }
        Command::SpawnEnemy { kind, lane, source } => {
            spawn_enemy(world, kind, lane, source, out_events);
        }
        Command::PlaceTower { protocol, slot } => place_tower(world, protocol, slot, out_events),
        Command::SellTower { tower } => sell_tower(world, tower, out_events),
        Command::UpgradeTower { tower } => upgrade_tower(world, tower, out_events),
        Command::EngageBoss { difficulty } => match world.boss.engage(difficulty) {
            Ok(active) => out_events.push(Event::BossEngaged {
                kind: active.kind,
                difficulty,
            }),
            Err(reason) => out_events.push(Event::BossEngageRejected { reason }),
        },
        Command::ReportBossOutcome { won } => report_boss_outcome(world, won, out_events),
        Command::ActivateOverclock => activate_overclock(world, out_events),
        Command::RequestFreezeRecovery { method } => recover(world, method, out_events),
        Command::Tick { dt } => tick(world, dt, out_events),
        Command::FireProjectile { tower, target, aim } => {
            fire_projectile(world, tower, target, aim, out_events);
        }
        Command::ResolveCombat { dt } => resolve_combat(world, dt, out_events),
    }
}

fn configure_level(
    world: &mut World,
    lanes: Vec<Vec<Vec2>>,
    slots: Vec<SlotDescriptor>,
    bounds: Bounds,
    unlocked_lanes: u32,
    out_events: &mut Vec<Event>,
) {
    world.lanes = lanes
        .into_iter()
        .filter_map(Lane::from_waypoints)
        .collect();
    world.bounds = bounds;
    world.slots = slots
        .into_iter()
        .map(|descriptor| TowerSlot {
            id: descriptor.id,
            position: descriptor.position,
            tower: None,
        })
        .collect();
    let lane_count = world.lanes.len() as u32;
    world.unlocked_lanes = unlocked_lanes.clamp(u32::from(lane_count > 0), lane_count);
    world.unlocked_protocols = vec![ProtocolKind::Firewall];
    world.enemies.clear();
    world.towers.clear();
    world.projectiles.clear();
    world.economy = Economy::new(world.balance.economy.starting_hash);
    world.threat = Threat::new();
    world.boss = BossState::new(&world.balance.boss);
    world.grid = SpatialGrid::new(bounds);
    world.wave_remaining = 0;
    world.next_enemy = 0;
    world.next_tower = 0;
    world.next_projectile = 0;
    world.sim_time = 0.0;

    out_events.push(Event::LevelConfigured {
        lanes: lane_count,
        slots: world.slots.len() as u32,
    });
}

fn spawn_enemy(
    world: &mut World,
    kind: EnemyKind,
    lane: LaneId,
    source: SpawnSource,
    out_events: &mut Vec<Event>,
) {
    let reject = |reason| Event::SpawnRejected { kind, lane, reason };
    if world.economy.frozen {
        out_events.push(reject(SpawnError::SystemFrozen));
        return;
    }
    if lane.get() as usize >= world.lanes.len() {
        out_events.push(reject(SpawnError::UnknownLane));
        return;
    }
    if lane.get() >= world.unlocked_lanes {
        out_events.push(reject(SpawnError::LaneLocked));
        return;
    }
    let enemy = world.spawn_ordinary(kind, lane, source);
    out_events.push(Event::EnemySpawned { enemy, kind, lane });
}

fn place_tower(
    world: &mut World,
    protocol: ProtocolKind,
    slot: SlotId,
    out_events: &mut Vec<Event>,
) {
    let reject = |reason| Event::TowerPlacementRejected {
        protocol,
        slot,
        reason,
    };
    let Some(slot_index) = world.slots.iter().position(|entry| entry.id == slot) else {
        out_events.push(reject(PlacementError::UnknownSlot));
        return;
    };
    if world.slots[slot_index].tower.is_some() {
        out_events.push(reject(PlacementError::SlotOccupied));
        return;
    }
    if !world.unlocked_protocols.contains(&protocol) {
        out_events.push(reject(PlacementError::ProtocolLocked));
        return;
    }
    let stats = *world.balance.protocols.stats(protocol);
    if world.economy.hash < stats.cost {
        out_events.push(reject(PlacementError::InsufficientHash {
            required: stats.cost,
            available: world.economy.hash,
        }));
        return;
    }
    let available_power = world.power_budget() - world.power_used();
    if stats.power_draw > available_power {
        out_events.push(reject(PlacementError::InsufficientPower {
            required: stats.power_draw,
            available: available_power,
        }));
        return;
    }

    world.economy.debit(stats.cost);
    let id = world.allocate_tower_id();
    let position = world.slots[slot_index].position;
    world.slots[slot_index].tower = Some(id);
    world.towers.push(Tower {
        id,
        protocol,
        slot,
        position,
        level: 1,
        invested: stats.cost,
        last_attack_time: f64::NEG_INFINITY,
        target: None,
    });
    out_events.push(Event::TowerPlaced {
        tower: id,
        protocol,
        slot,
        cost: stats.cost,
    });
}

fn sell_tower(world: &mut World, tower: TowerId, out_events: &mut Vec<Event>) {
    let Some(index) = world.tower_index(tower) else {
        out_events.push(Event::TowerSaleRejected {
            tower,
            reason: SellError::UnknownTower,
        });
        return;
    };
    let removed = world.towers.remove(index);
    if let Some(slot) = world.slots.iter_mut().find(|slot| slot.id == removed.slot) {
        slot.tower = None;
    }
    let stats = world.balance.protocols.stats(removed.protocol);
    let refund = (removed.invested as f32 * stats.sell_refund) as u64;
    let credited = world
        .economy
        .add_hash(refund, world.balance.economy.storage_capacity);
    out_events.push(Event::TowerSold {
        tower,
        refund: credited,
    });
}

fn upgrade_tower(world: &mut World, tower: TowerId, out_events: &mut Vec<Event>) {
    let reject = |reason| Event::TowerUpgradeRejected { tower, reason };
    let Some(index) = world.tower_index(tower) else {
        out_events.push(reject(UpgradeError::UnknownTower));
        return;
    };
    let protocol = world.towers[index].protocol;
    let level = world.towers[index].level;
    let stats = *world.balance.protocols.stats(protocol);
    if level >= stats.max_level {
        out_events.push(reject(UpgradeError::MaxLevel));
        return;
    }
    let cost = (stats.upgrade_cost_base as f32
        * stats.upgrade_cost_growth.powi(level as i32 - 1))
    .round() as u64;
    if world.economy.hash < cost {
        out_events.push(reject(UpgradeError::InsufficientHash {
            required: cost,
            available: world.economy.hash,
        }));
        return;
    }
    world.economy.debit(cost);
    let entry = &mut world.towers[index];
    entry.level += 1;
    entry.invested += cost;
    out_events.push(Event::TowerUpgraded {
        tower,
        level: entry.level,
        cost,
    });
}

fn report_boss_outcome(world: &mut World, won: bool, out_events: &mut Vec<Event>) {
    let engaged = match world.boss.engaged() {
        Ok(active) => active,
        Err(reason) => {
            out_events.push(Event::BossOutcomeRejected { reason });
            return;
        }
    };
    if won {
        let difficulty = engaged.difficulty.unwrap_or(BossDifficulty::Standard);
        let tuning = world.balance.boss.difficulty(difficulty);
        let reward =
            (world.balance.boss.base_reward as f32 * tuning.reward_multiplier).round() as u64;
        let credited = world
            .economy
            .add_hash(reward, world.balance.economy.storage_capacity);
        world.threat.relieve(tuning.threat_relief);
        world.economy.clear_leaks();
        world.mark_enemy_dead(engaged.enemy);
        let Some(finished) = world.boss.complete_victory(&world.balance.boss) else {
            out_events.push(Event::BossOutcomeRejected {
                reason: OutcomeError::NoEngagedBoss,
            });
            return;
        };
        world
            .boss
            .realign_milestone(world.threat.level, &world.balance.boss);
        out_events.push(Event::BossDefeated {
            kind: finished.kind,
            reward: credited,
            threat_level: world.threat.level,
        });
    } else {
        world.mark_enemy_dead(engaged.enemy);
        let Some(departed) = world.boss.complete_departure(&world.balance.boss) else {
            return;
        };
        let outcome = world
            .economy
            .apply_leaks(world.balance.boss.leak_penalty, &world.balance.economy);
        out_events.push(Event::BossDeparted {
            kind: departed.kind,
        });
        world.emit_boundary_events(outcome, out_events);
    }
}

fn activate_overclock(world: &mut World, out_events: &mut Vec<Event>) {
    if world.economy.frozen {
        out_events.push(Event::OverclockRejected {
            reason: OverclockError::SystemFrozen,
        });
        return;
    }
    if world.threat.overclock_active() {
        out_events.push(Event::OverclockRejected {
            reason: OverclockError::AlreadyActive,
        });
        return;
    }
    world.threat.activate_overclock(&world.balance.overclock);
    out_events.push(Event::OverclockActivated {
        duration: Duration::from_secs_f32(world.balance.overclock.duration),
    });
}

fn recover(
    world: &mut World,
    method: breach_defence_core::RecoveryMethod,
    out_events: &mut Vec<Event>,
) {
    if !world.economy.frozen {
        out_events.push(Event::RecoveryRejected {
            method,
            reason: RecoveryError::NotFrozen,
        });
        return;
    }
    let cost = world.economy.recover(method, &world.balance.economy);

    // Full-board reboot: every live enemy dies without loot. The walking
    // boss departs penalty-free so the recovery cannot re-freeze the system.
    if let Some(departed) = world.boss.complete_departure(&world.balance.boss) {
        out_events.push(Event::BossDeparted {
            kind: departed.kind,
        });
    }
    for enemy in &mut world.enemies {
        enemy.is_dead = true;
    }

    out_events.push(Event::SystemRestored {
        method,
        cost,
        efficiency: world.economy.efficiency(&world.balance.economy),
    });
}

fn tick(world: &mut World, dt: Duration, out_events: &mut Vec<Event>) {
    let dt_secs = dt.as_secs_f32();
    world.sim_time += f64::from(dt_secs);
    out_events.push(Event::TimeAdvanced { dt });

    let overclock_expired =
        world
            .threat
            .advance(dt_secs, &world.balance.threat, &world.balance.overclock);
    if overclock_expired {
        out_events.push(Event::OverclockExpired);
    }

    world.boss.tick_cooldown(dt_secs);
    if world.boss.should_spawn(world.threat.level) && !world.lanes.is_empty() {
        let (kind, lane) = world
            .boss
            .next_spawn(world.unlocked_lanes, &world.balance.boss);
        let enemy = world.spawn_boss(kind, lane);
        world.boss.record_spawn(enemy, kind, lane);
        out_events.push(Event::BossSpawned { enemy, kind, lane });
    }

    movement::advance(
        &mut world.enemies,
        &world.lanes,
        dt_secs,
        world.sim_time,
        world.boss.held_enemy(),
    );
    world.resolve_leaks(out_events);
    world.rebuild_spatial_index();
}

fn fire_projectile(
    world: &mut World,
    tower: TowerId,
    target: EnemyId,
    aim: Vec2,
    out_events: &mut Vec<Event>,
) {
    // Stale references are expected every tick and skipped silently.
    let Some(tower_index) = world.tower_index(tower) else {
        return;
    };
    let alive = world
        .enemy(target)
        .map(|enemy| enemy.is_active() && !enemy.immune_to_towers)
        .unwrap_or(false);
    if !alive {
        return;
    }
    let protocol = world.towers[tower_index].protocol;
    let level = world.towers[tower_index].level;
    let stats = *world.balance.protocols.stats(protocol);
    let effective = effective_stats(&stats, level);
    if !world.towers[tower_index].ready(effective.attack_speed, world.sim_time) {
        return;
    }

    let origin = world.towers[tower_index].position;
    let direction = (aim - origin).normalize_or_zero();
    if direction == Vec2::ZERO {
        return;
    }
    let base_angle = direction.y.atan2(direction.x);
    let count = stats.projectile_count.max(1);
    let spread = stats.spread_degrees.to_radians();

    for index in 0..count {
        let offset = if count > 1 {
            -spread / 2.0 + spread * index as f32 / (count - 1) as f32
        } else {
            0.0
        };
        let angle = base_angle + offset;
        let velocity = Vec2::new(angle.cos(), angle.sin()) * stats.projectile_speed;
        let id = world.allocate_projectile_id();
        world.projectiles.push(Projectile {
            id,
            position: origin,
            previous_position: origin,
            velocity,
            damage: effective.damage,
            radius: stats.projectile_radius,
            lifetime: stats.projectile_lifetime,
            pierce_remaining: stats.pierce,
            hit: Vec::new(),
            homing: stats.homing_turn_rate.map(|turn_rate| Homing {
                target,
                turn_rate,
            }),
            payload: ProjectilePayload {
                splash_radius: stats.splash_radius,
                splash_damage_fraction: stats.splash_damage_fraction,
                slow_amount: stats.slow_amount,
                slow_duration: stats.slow_duration,
                chain_count: stats.chain_count,
                chain_range: stats.chain_range,
                chain_damage_fraction: stats.chain_damage_fraction,
            },
            consumed: false,
            enemy_sourced: false,
        });
    }

    world.towers[tower_index].last_attack_time = world.sim_time;
    world.towers[tower_index].target = Some(target);
    out_events.push(Event::ProjectileFired {
        tower,
        target,
        count,
    });
}

fn resolve_combat(world: &mut World, dt: Duration, out_events: &mut Vec<Event>) {
    let dt_secs = dt.as_secs_f32();
    combat::advance_projectiles(
        &mut world.projectiles,
        &world.enemies,
        world.bounds,
        dt_secs,
    );
    combat::resolve_collisions(
        &mut world.projectiles,
        &mut world.enemies,
        &world.grid,
        world.sim_time,
        &mut world.scratch,
        &mut world.kill_buffer,
        out_events,
    );
    world.settle_kills(out_events);
    world.cleanup(out_events);

    if !world.economy.frozen {
        let hash_multiplier = world.threat.hash_multiplier(&world.balance.overclock);
        world
            .economy
            .accrue(dt_secs, &world.balance.economy, hash_multiplier);
        world.economy.decay(dt_secs, &world.balance.economy);
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use super::{effective_stats, SpatialGrid, World};
    use breach_defence_core::config::BalanceTable;
    use breach_defence_core::{
        BossLifecycleSnapshot, EconomySnapshot, EnemySnapshot, EnemyView, Lane, LaneId,
        OfflineSnapshot, ProjectileSnapshot, ProjectileView, ThreatSnapshot, TowerSnapshot,
        TowerView,
    };
    use std::time::Duration;

    /// Captures a read-only view of all live, not-yet-arrived enemies.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        let snapshots: Vec<EnemySnapshot> = world
            .enemies
            .iter()
            .filter(|enemy| enemy.is_active())
            .map(|enemy| EnemySnapshot {
                id: enemy.id,
                archetype: enemy.archetype,
                position: enemy.position,
                lane: enemy.lane,
                progress: enemy.progress,
                speed: enemy.current_speed,
                health: enemy.health,
                max_health: enemy.max_health,
                size: enemy.size,
                is_boss: enemy.is_boss,
                immune_to_towers: enemy.immune_to_towers,
                slowed: enemy.slow.is_some(),
            })
            .collect();
        EnemyView::from_snapshots(snapshots)
    }

    /// Captures a read-only view of all placed towers with their effective
    /// per-level stats.
    #[must_use]
    pub fn tower_view(world: &World) -> TowerView {
        let snapshots: Vec<TowerSnapshot> = world
            .towers
            .iter()
            .map(|tower| {
                let stats = world.balance.protocols.stats(tower.protocol);
                let effective = effective_stats(stats, tower.level);
                TowerSnapshot {
                    id: tower.id,
                    protocol: tower.protocol,
                    slot: tower.slot,
                    position: tower.position,
                    level: tower.level,
                    damage: effective.damage,
                    range: effective.range,
                    attack_speed: effective.attack_speed,
                    projectile_count: stats.projectile_count,
                    projectile_speed: stats.projectile_speed,
                    ready: tower.ready(effective.attack_speed, world.sim_time),
                    target: tower.target,
                }
            })
            .collect();
        TowerView::from_snapshots(snapshots)
    }

    /// Captures a read-only view of all live projectiles.
    #[must_use]
    pub fn projectile_view(world: &World) -> ProjectileView {
        let snapshots: Vec<ProjectileSnapshot> = world
            .projectiles
            .iter()
            .filter(|projectile| !projectile.consumed)
            .map(|projectile| ProjectileSnapshot {
                id: projectile.id,
                position: projectile.position,
                velocity: projectile.velocity,
                radius: projectile.radius,
                enemy_sourced: projectile.enemy_sourced,
            })
            .collect();
        ProjectileView::from_snapshots(snapshots)
    }

    /// Aggregated economy state for UI display and persistence.
    #[must_use]
    pub fn economy_snapshot(world: &World) -> EconomySnapshot {
        let tuning = &world.balance.economy;
        let hash_multiplier = world.threat.hash_multiplier(&world.balance.overclock);
        EconomySnapshot {
            hash: world.economy.hash,
            capacity: tuning.storage_capacity,
            leak_counter: world.economy.leak_counter,
            efficiency: world.economy.efficiency(tuning),
            frozen: world.economy.frozen,
            freeze_count: world.economy.freeze_count,
            income_rate: world.economy.income_rate(tuning, hash_multiplier),
        }
    }

    /// Aggregated threat and overclock state.
    #[must_use]
    pub fn threat_snapshot(world: &World) -> ThreatSnapshot {
        ThreatSnapshot {
            level: world.threat.level,
            next_milestone: world.boss.next_milestone,
            overclock_active: world.threat.overclock_active(),
            overclock_remaining: Duration::from_secs_f32(
                world.threat.overclock_remaining.max(0.0),
            ),
        }
    }

    /// Aggregated boss lifecycle state.
    #[must_use]
    pub fn boss_snapshot(world: &World) -> BossLifecycleSnapshot {
        let (active, cooldown, defeated_lanes) = world.boss.snapshot();
        BossLifecycleSnapshot {
            active,
            cooldown_remaining: Duration::from_secs_f32(cooldown.max(0.0)),
            defeated_lanes,
        }
    }

    /// State persisted at session end for the offline extrapolator.
    #[must_use]
    pub fn offline_snapshot(world: &World) -> OfflineSnapshot {
        let total_dps: f32 = world
            .towers
            .iter()
            .map(|tower| {
                let stats = world.balance.protocols.stats(tower.protocol);
                let effective = effective_stats(stats, tower.level);
                effective.damage * effective.attack_speed * stats.projectile_count as f32
            })
            .sum();
        OfflineSnapshot {
            threat_level: world.threat.level,
            leak_counter: world.economy.leak_counter,
            total_dps,
            lane_count: world.unlocked_lanes,
            hash: world.economy.hash,
            capacity: world.balance.economy.storage_capacity,
        }
    }

    /// Balance table the world runs under.
    #[must_use]
    pub fn balance(world: &World) -> &BalanceTable {
        &world.balance
    }

    /// Spatial index over active enemy positions, rebuilt once per tick.
    #[must_use]
    pub fn spatial_index(world: &World) -> &SpatialGrid {
        &world.grid
    }

    /// Lane geometry by identifier.
    #[must_use]
    pub fn lane(world: &World, lane: LaneId) -> Option<&Lane> {
        world.lanes.get(lane.get() as usize)
    }

    /// Number of currently unlocked lanes.
    #[must_use]
    pub fn unlocked_lanes(world: &World) -> u32 {
        world.unlocked_lanes
    }

    /// Seconds of simulated time elapsed since level configuration.
    #[must_use]
    pub fn sim_time(world: &World) -> f64 {
        world.sim_time
    }
}

#[cfg(test)]
mod tests {
    use super::{apply, query, World};
    use breach_defence_core::{
        BossDifficulty, BossKind, Bounds, Command, EnemyKind, EngageError, Event, LaneId,
        OutcomeError, OverclockError, PlacementError, ProtocolKind, RecoveryError, RecoveryMethod,
        SellError, SlotDescriptor, SlotId, SpawnError, SpawnSource, TowerId, UpgradeError,
    };
    use glam::Vec2;
    use std::time::Duration;

    fn level_command() -> Command {
        Command::ConfigureLevel {
            lanes: vec![
                vec![Vec2::new(0.0, 100.0), Vec2::new(100.0, 100.0)],
                vec![Vec2::new(0.0, 200.0), Vec2::new(100.0, 200.0)],
            ],
            slots: vec![
                SlotDescriptor {
                    id: SlotId::new(0),
                    position: Vec2::new(50.0, 120.0),
                },
                SlotDescriptor {
                    id: SlotId::new(1),
                    position: Vec2::new(50.0, 220.0),
                },
            ],
            bounds: Bounds::new(Vec2::ZERO, Vec2::splat(400.0)),
            unlocked_lanes: 1,
        }
    }

    fn configured_world() -> World {
        let mut world = World::default();
        let _ = run(&mut world, level_command());
        world
    }

    fn run(world: &mut World, command: Command) -> Vec<Event> {
        let mut events = Vec::new();
        apply(world, command, &mut events);
        events
    }

    fn spawn_script(world: &mut World, lane: u32, source: SpawnSource) -> Vec<Event> {
        run(
            world,
            Command::SpawnEnemy {
                kind: EnemyKind::Script,
                lane: LaneId::new(lane),
                source,
            },
        )
    }

    /// Ticks a freshly configured single-lane world until the first boss
    /// milestone fires, returning the spawned kind.
    fn world_with_walking_boss(lane_length: f32) -> (World, BossKind) {
        let mut world = World::default();
        let _ = run(
            &mut world,
            Command::ConfigureLevel {
                lanes: vec![vec![Vec2::ZERO, Vec2::new(lane_length, 0.0)]],
                slots: Vec::new(),
                bounds: Bounds::new(Vec2::splat(-100.0), Vec2::new(lane_length + 100.0, 100.0)),
                unlocked_lanes: 1,
            },
        );
        for _ in 0..510 {
            let events = run(
                &mut world,
                Command::Tick {
                    dt: Duration::from_secs(1),
                },
            );
            let spawned = events.iter().find_map(|event| match event {
                Event::BossSpawned { kind, .. } => Some(*kind),
                _ => None,
            });
            if let Some(kind) = spawned {
                return (world, kind);
            }
        }
        panic!("no boss spawned within the milestone window");
    }

    #[test]
    fn configuring_a_level_resets_the_whole_session() {
        let mut world = configured_world();
        let _ = run(
            &mut world,
            Command::PlaceTower {
                protocol: ProtocolKind::Firewall,
                slot: SlotId::new(0),
            },
        );
        let _ = spawn_script(&mut world, 0, SpawnSource::Idle);
        let _ = run(
            &mut world,
            Command::Tick {
                dt: Duration::from_secs(1),
            },
        );

        let events = run(&mut world, level_command());
        assert!(events.contains(&Event::LevelConfigured { lanes: 2, slots: 2 }));
        assert_eq!(query::economy_snapshot(&world).hash, 150);
        assert!(query::tower_view(&world).into_vec().is_empty());
        assert!(query::enemy_view(&world).into_vec().is_empty());
        assert_eq!(query::sim_time(&world), 0.0);
        assert_eq!(query::unlocked_lanes(&world), 1);
    }

    #[test]
    fn locked_and_unknown_lanes_reject_spawns() {
        let mut world = configured_world();

        let events = spawn_script(&mut world, 1, SpawnSource::Idle);
        assert!(events.contains(&Event::SpawnRejected {
            kind: EnemyKind::Script,
            lane: LaneId::new(1),
            reason: SpawnError::LaneLocked,
        }));

        let events = spawn_script(&mut world, 5, SpawnSource::Idle);
        assert!(events.contains(&Event::SpawnRejected {
            kind: EnemyKind::Script,
            lane: LaneId::new(5),
            reason: SpawnError::UnknownLane,
        }));

        let events = run(&mut world, Command::UnlockLane);
        assert!(events.contains(&Event::LaneUnlocked {
            lane: LaneId::new(1)
        }));
        // No third lane exists, so a further unlock is a no-op.
        assert!(run(&mut world, Command::UnlockLane).is_empty());

        let events = spawn_script(&mut world, 1, SpawnSource::Idle);
        assert!(events.contains(&Event::EnemySpawned {
            enemy: breach_defence_core::EnemyId::new(0),
            kind: EnemyKind::Script,
            lane: LaneId::new(1),
        }));
    }

    #[test]
    fn placement_rejections_fire_in_check_order() {
        let mut world = configured_world();

        let events = run(
            &mut world,
            Command::PlaceTower {
                protocol: ProtocolKind::Firewall,
                slot: SlotId::new(9),
            },
        );
        assert!(events.contains(&Event::TowerPlacementRejected {
            protocol: ProtocolKind::Firewall,
            slot: SlotId::new(9),
            reason: PlacementError::UnknownSlot,
        }));

        let events = run(
            &mut world,
            Command::PlaceTower {
                protocol: ProtocolKind::Firewall,
                slot: SlotId::new(0),
            },
        );
        assert!(events.contains(&Event::TowerPlaced {
            tower: TowerId::new(0),
            protocol: ProtocolKind::Firewall,
            slot: SlotId::new(0),
            cost: 100,
        }));
        assert_eq!(query::economy_snapshot(&world).hash, 50);

        let events = run(
            &mut world,
            Command::PlaceTower {
                protocol: ProtocolKind::Firewall,
                slot: SlotId::new(0),
            },
        );
        assert!(events.contains(&Event::TowerPlacementRejected {
            protocol: ProtocolKind::Firewall,
            slot: SlotId::new(0),
            reason: PlacementError::SlotOccupied,
        }));

        let events = run(
            &mut world,
            Command::PlaceTower {
                protocol: ProtocolKind::Honeypot,
                slot: SlotId::new(1),
            },
        );
        assert!(events.contains(&Event::TowerPlacementRejected {
            protocol: ProtocolKind::Honeypot,
            slot: SlotId::new(1),
            reason: PlacementError::ProtocolLocked,
        }));

        let _ = run(
            &mut world,
            Command::UnlockProtocol {
                protocol: ProtocolKind::Honeypot,
            },
        );
        let events = run(
            &mut world,
            Command::PlaceTower {
                protocol: ProtocolKind::Honeypot,
                slot: SlotId::new(1),
            },
        );
        assert!(events.contains(&Event::TowerPlacementRejected {
            protocol: ProtocolKind::Honeypot,
            slot: SlotId::new(1),
            reason: PlacementError::InsufficientHash {
                required: 260,
                available: 50,
            },
        }));
    }

    #[test]
    fn power_budget_blocks_placement_once_spent() {
        let mut world = World::default();
        let slots = (0..11)
            .map(|index| SlotDescriptor {
                id: SlotId::new(index),
                position: Vec2::new(index as f32 * 30.0, 120.0),
            })
            .collect();
        let _ = run(
            &mut world,
            Command::ConfigureLevel {
                lanes: vec![vec![Vec2::new(0.0, 100.0), Vec2::new(400.0, 100.0)]],
                slots,
                bounds: Bounds::new(Vec2::ZERO, Vec2::splat(400.0)),
                unlocked_lanes: 1,
            },
        );
        world.economy.hash = 5_000;

        // Ten firewalls saturate the 100-point budget at 10 draw each.
        for index in 0..10 {
            let events = run(
                &mut world,
                Command::PlaceTower {
                    protocol: ProtocolKind::Firewall,
                    slot: SlotId::new(index),
                },
            );
            assert!(
                events
                    .iter()
                    .any(|event| matches!(event, Event::TowerPlaced { .. })),
                "placement {index} should succeed"
            );
        }
        let events = run(
            &mut world,
            Command::PlaceTower {
                protocol: ProtocolKind::Firewall,
                slot: SlotId::new(10),
            },
        );
        assert!(events.contains(&Event::TowerPlacementRejected {
            protocol: ProtocolKind::Firewall,
            slot: SlotId::new(10),
            reason: PlacementError::InsufficientPower {
                required: 10.0,
                available: 0.0,
            },
        }));
    }

    #[test]
    fn selling_refunds_and_frees_the_slot() {
        let mut world = configured_world();
        let _ = run(
            &mut world,
            Command::PlaceTower {
                protocol: ProtocolKind::Firewall,
                slot: SlotId::new(0),
            },
        );

        let events = run(
            &mut world,
            Command::SellTower {
                tower: TowerId::new(0),
            },
        );
        assert!(events.contains(&Event::TowerSold {
            tower: TowerId::new(0),
            refund: 60,
        }));
        assert_eq!(query::economy_snapshot(&world).hash, 110);

        let events = run(
            &mut world,
            Command::PlaceTower {
                protocol: ProtocolKind::Firewall,
                slot: SlotId::new(0),
            },
        );
        assert!(events
            .iter()
            .any(|event| matches!(event, Event::TowerPlaced { .. })));

        let events = run(
            &mut world,
            Command::SellTower {
                tower: TowerId::new(7),
            },
        );
        assert!(events.contains(&Event::TowerSaleRejected {
            tower: TowerId::new(7),
            reason: SellError::UnknownTower,
        }));
    }

    #[test]
    fn upgrade_costs_grow_and_stop_at_max_level() {
        let mut world = configured_world();
        world.economy.hash = 5_000;
        let _ = run(
            &mut world,
            Command::PlaceTower {
                protocol: ProtocolKind::Firewall,
                slot: SlotId::new(0),
            },
        );

        let events = run(
            &mut world,
            Command::UpgradeTower {
                tower: TowerId::new(0),
            },
        );
        assert!(events.contains(&Event::TowerUpgraded {
            tower: TowerId::new(0),
            level: 2,
            cost: 80,
        }));

        let events = run(
            &mut world,
            Command::UpgradeTower {
                tower: TowerId::new(0),
            },
        );
        assert!(events.contains(&Event::TowerUpgraded {
            tower: TowerId::new(0),
            level: 3,
            cost: 128,
        }));

        world.economy.hash = 0;
        let events = run(
            &mut world,
            Command::UpgradeTower {
                tower: TowerId::new(0),
            },
        );
        assert!(events.contains(&Event::TowerUpgradeRejected {
            tower: TowerId::new(0),
            reason: UpgradeError::InsufficientHash {
                required: 205,
                available: 0,
            },
        }));

        world.economy.hash = 100_000;
        world.towers[0].level = 10;
        let events = run(
            &mut world,
            Command::UpgradeTower {
                tower: TowerId::new(0),
            },
        );
        assert!(events.contains(&Event::TowerUpgradeRejected {
            tower: TowerId::new(0),
            reason: UpgradeError::MaxLevel,
        }));
    }

    #[test]
    fn boss_victory_pays_out_relieves_threat_and_clears_leaks() {
        let (mut world, kind) = world_with_walking_boss(10_000.0);
        assert_eq!(kind, BossKind::Cyberboss);
        let threat_at_spawn = query::threat_snapshot(&world).level;
        world.economy.leak_counter = 2;

        let events = run(
            &mut world,
            Command::EngageBoss {
                difficulty: BossDifficulty::Standard,
            },
        );
        assert!(events.contains(&Event::BossEngaged {
            kind,
            difficulty: BossDifficulty::Standard,
        }));

        let events = run(&mut world, Command::ReportBossOutcome { won: true });
        let defeated = events.iter().find_map(|event| match event {
            Event::BossDefeated {
                kind,
                reward,
                threat_level,
            } => Some((*kind, *reward, *threat_level)),
            _ => None,
        });
        let (defeated_kind, reward, threat_level) = defeated.expect("victory event");
        assert_eq!(defeated_kind, kind);
        assert_eq!(reward, 500);
        assert!(threat_level < threat_at_spawn);

        assert_eq!(query::economy_snapshot(&world).hash, 650);
        assert_eq!(query::economy_snapshot(&world).leak_counter, 0);
        let boss = query::boss_snapshot(&world);
        assert!(boss.active.is_none());
        assert!(boss.cooldown_remaining > Duration::ZERO);
        assert!(query::threat_snapshot(&world).next_milestone > threat_level);
    }

    #[test]
    fn boss_loss_applies_the_leak_penalty() {
        let (mut world, kind) = world_with_walking_boss(10_000.0);
        let _ = run(
            &mut world,
            Command::EngageBoss {
                difficulty: BossDifficulty::Hard,
            },
        );

        let events = run(&mut world, Command::ReportBossOutcome { won: false });
        assert!(events.contains(&Event::BossDeparted { kind }));
        let economy = query::economy_snapshot(&world);
        assert_eq!(economy.leak_counter, 3);
        assert_eq!(economy.efficiency, 85.0);
        assert!(query::boss_snapshot(&world).active.is_none());
    }

    #[test]
    fn ignored_boss_walks_to_the_core() {
        let (mut world, kind) = world_with_walking_boss(90.0);
        let mut reached = false;
        for _ in 0..8 {
            let events = run(
                &mut world,
                Command::Tick {
                    dt: Duration::from_secs(1),
                },
            );
            if events.contains(&Event::BossReachedCore { kind }) {
                reached = true;
                break;
            }
        }
        assert!(reached, "boss should finish a 90-unit lane at speed 18");
        assert_eq!(query::economy_snapshot(&world).leak_counter, 3);
        assert!(query::boss_snapshot(&world).active.is_none());
    }

    #[test]
    fn engagement_requires_a_walking_unengaged_boss() {
        let mut world = configured_world();
        let events = run(
            &mut world,
            Command::EngageBoss {
                difficulty: BossDifficulty::Standard,
            },
        );
        assert!(events.contains(&Event::BossEngageRejected {
            reason: EngageError::NoActiveBoss,
        }));

        let events = run(&mut world, Command::ReportBossOutcome { won: true });
        assert!(events.contains(&Event::BossOutcomeRejected {
            reason: OutcomeError::NoEngagedBoss,
        }));

        let (mut world, _) = world_with_walking_boss(10_000.0);
        let _ = run(
            &mut world,
            Command::EngageBoss {
                difficulty: BossDifficulty::Standard,
            },
        );
        let events = run(
            &mut world,
            Command::EngageBoss {
                difficulty: BossDifficulty::Brutal,
            },
        );
        assert!(events.contains(&Event::BossEngageRejected {
            reason: EngageError::AlreadyEngaged,
        }));
    }

    #[test]
    fn frozen_system_blocks_commands_until_recovery() {
        let mut world = configured_world();
        let _ = spawn_script(&mut world, 0, SpawnSource::Idle);
        let outcome = world.economy.apply_leaks(20, &world.balance.economy);
        assert!(outcome.froze);

        let events = spawn_script(&mut world, 0, SpawnSource::Idle);
        assert!(events.contains(&Event::SpawnRejected {
            kind: EnemyKind::Script,
            lane: LaneId::new(0),
            reason: SpawnError::SystemFrozen,
        }));
        let events = run(&mut world, Command::ActivateOverclock);
        assert!(events.contains(&Event::OverclockRejected {
            reason: OverclockError::SystemFrozen,
        }));

        let events = run(
            &mut world,
            Command::RequestFreezeRecovery {
                method: RecoveryMethod::Flush,
            },
        );
        // 25% of 150 hash sits under the 50-hash floor.
        assert!(events.contains(&Event::SystemRestored {
            method: RecoveryMethod::Flush,
            cost: 50,
            efficiency: 50.0,
        }));
        let economy = query::economy_snapshot(&world);
        assert_eq!(economy.hash, 100);
        assert_eq!(economy.leak_counter, 10);
        assert!(!economy.frozen);
        assert_eq!(economy.freeze_count, 1);
        // The reboot wipes the board.
        assert!(query::enemy_view(&world).into_vec().is_empty());

        let events = run(
            &mut world,
            Command::RequestFreezeRecovery {
                method: RecoveryMethod::MinigameSuccess,
            },
        );
        assert!(events.contains(&Event::RecoveryRejected {
            method: RecoveryMethod::MinigameSuccess,
            reason: RecoveryError::NotFrozen,
        }));
    }

    #[test]
    fn overclock_runs_its_duration_then_expires() {
        let mut world = configured_world();
        let events = run(&mut world, Command::ActivateOverclock);
        assert!(events.contains(&Event::OverclockActivated {
            duration: Duration::from_secs(30),
        }));
        assert!(query::threat_snapshot(&world).overclock_active);

        let events = run(&mut world, Command::ActivateOverclock);
        assert!(events.contains(&Event::OverclockRejected {
            reason: OverclockError::AlreadyActive,
        }));

        let events = run(
            &mut world,
            Command::Tick {
                dt: Duration::from_secs(31),
            },
        );
        assert!(events.contains(&Event::OverclockExpired));
        assert!(!query::threat_snapshot(&world).overclock_active);
    }

    #[test]
    fn leaked_wave_enemy_clears_the_wave_tally() {
        let mut world = World::default();
        let _ = run(
            &mut world,
            Command::ConfigureLevel {
                lanes: vec![vec![Vec2::ZERO, Vec2::new(90.0, 0.0)]],
                slots: Vec::new(),
                bounds: Bounds::new(Vec2::splat(-100.0), Vec2::splat(200.0)),
                unlocked_lanes: 1,
            },
        );
        let _ = spawn_script(&mut world, 0, SpawnSource::Wave);

        let mut leaked = false;
        for _ in 0..4 {
            let events = run(
                &mut world,
                Command::Tick {
                    dt: Duration::from_secs(1),
                },
            );
            if let Some(event) = events
                .iter()
                .find(|event| matches!(event, Event::EnemyLeaked { .. }))
            {
                assert_eq!(
                    *event,
                    Event::EnemyLeaked {
                        enemy: breach_defence_core::EnemyId::new(0),
                        leak_counter: 1,
                        efficiency: 95.0,
                    }
                );
                leaked = true;
                break;
            }
        }
        assert!(leaked, "a 90-unit lane at speed 40 leaks within 3 seconds");

        let events = run(
            &mut world,
            Command::ResolveCombat {
                dt: Duration::from_millis(50),
            },
        );
        assert!(events.contains(&Event::WaveCleared));
        assert_eq!(query::economy_snapshot(&world).leak_counter, 1);
    }
}
