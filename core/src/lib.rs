#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Breach Defence engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters and spawn policies submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! for presentation layers to react to deterministically. Systems consume
//! immutable snapshots and respond exclusively with new command batches.
//!
//! The leak/efficiency duality used by the stepped simulation, the recovery
//! paths, and the offline extrapolator is centralised here as
//! [`efficiency_for`] and [`leak_count_for`] so every caller derives the same
//! relationship in both directions.

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub mod config;
pub mod geometry;
pub mod lanes;

pub use config::{BalanceError, BalanceTable};
pub use geometry::Bounds;
pub use lanes::Lane;

use glam::Vec2;

/// Highest efficiency value the economy can report.
pub const MAX_EFFICIENCY: f32 = 100.0;

/// Derives the efficiency percentage for a given leak counter.
///
/// This is one half of the canonical leak/efficiency pair; the other half is
/// [`leak_count_for`]. All engine code routes through these two functions so
/// the stepped model and the offline extrapolator can never diverge.
#[must_use]
pub fn efficiency_for(leak_counter: u32, loss_per_leak: f32) -> f32 {
    (MAX_EFFICIENCY - leak_counter as f32 * loss_per_leak).clamp(0.0, MAX_EFFICIENCY)
}

/// Derives the leak counter corresponding to an efficiency percentage.
///
/// Round-trips with [`efficiency_for`] whenever
/// `leaks × loss_per_leak ≤ 100`.
#[must_use]
pub fn leak_count_for(efficiency: f32, loss_per_leak: f32) -> u32 {
    if loss_per_leak <= 0.0 {
        return 0;
    }
    let clamped = efficiency.clamp(0.0, MAX_EFFICIENCY);
    ((MAX_EFFICIENCY - clamped) / loss_per_leak).round() as u32
}

/// Unique identifier assigned to an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TowerId(u32);

impl TowerId {
    /// Creates a new tower identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a projectile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectileId(u32);

impl ProjectileId {
    /// Creates a new projectile identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a tower slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotId(u32);

impl SlotId {
    /// Creates a new slot identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Zero-based index identifying a lane within the configured level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LaneId(u32);

impl LaneId {
    /// Creates a new lane identifier with the provided index.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the zero-based lane index.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Closed set of ordinary enemy variants, resolved once at data-load time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyKind {
    /// Baseline intrusion with unremarkable stats.
    Script,
    /// Fast, fragile runner.
    Worm,
    /// Slow, heavily armoured carrier.
    Trojan,
    /// Mid-tier swarm unit.
    Botnet,
    /// Late-game elite.
    Rootkit,
}

impl EnemyKind {
    /// Every ordinary enemy variant in definition order.
    pub const ALL: [EnemyKind; 5] = [
        EnemyKind::Script,
        EnemyKind::Worm,
        EnemyKind::Trojan,
        EnemyKind::Botnet,
        EnemyKind::Rootkit,
    ];
}

/// Closed set of boss variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BossKind {
    /// Multi-phase flagship encounter.
    Cyberboss,
    /// Efficiency-draining stalker.
    ZeroDay,
    /// Slow siege variant.
    VoidPylon,
}

impl BossKind {
    /// Fixed spawn rotation keyed to lane unlock order.
    pub const ROTATION: [BossKind; 3] =
        [BossKind::Cyberboss, BossKind::ZeroDay, BossKind::VoidPylon];
}

/// Closed set of defensive protocols (the game's towers).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolKind {
    /// Single-target baseline turret.
    Firewall,
    /// Multi-shot spread turret.
    PacketFilter,
    /// Splash-damage area turret.
    Honeypot,
    /// Slowing turret with light damage.
    IceShard,
    /// Piercing-and-chaining heavy turret.
    NullRouter,
}

impl ProtocolKind {
    /// Every protocol variant in definition order.
    pub const ALL: [ProtocolKind; 5] = [
        ProtocolKind::Firewall,
        ProtocolKind::PacketFilter,
        ProtocolKind::Honeypot,
        ProtocolKind::IceShard,
        ProtocolKind::NullRouter,
    ];
}

/// Variant classification carried by every enemy record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyArchetype {
    /// Ordinary lane enemy produced by a spawn policy.
    Ordinary(EnemyKind),
    /// Distinguished tower-immune boss encounter.
    Boss(BossKind),
}

/// Difficulty selected when engaging a boss encounter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BossDifficulty {
    /// Baseline reward and threat relief.
    Standard,
    /// Increased reward and relief.
    Hard,
    /// Maximum reward and relief.
    Brutal,
}

/// Paths by which a frozen system can be restored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryMethod {
    /// Paid cache flush; cost scales with the current hash balance.
    Flush,
    /// Successful recovery minigame; free of charge.
    MinigameSuccess,
}

/// Which spawn policy produced an enemy creation request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnSource {
    /// Continuous threat-based idle spawner.
    Idle,
    /// Discrete wave generator; counts toward the wave-remaining tally.
    Wave,
}

/// Static description of a tower slot supplied at level configuration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SlotDescriptor {
    /// Identifier the slot keeps for its whole lifetime.
    pub id: SlotId,
    /// World position of the slot centre.
    pub position: Vec2,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Installs lanes, slots, and world bounds for a level.
    ConfigureLevel {
        /// Waypoint sequences for every lane, in unlock order.
        lanes: Vec<Vec<Vec2>>,
        /// Tower slots available for placement.
        slots: Vec<SlotDescriptor>,
        /// Rectangle that bounds all simulation positions.
        bounds: Bounds,
        /// Number of lanes unlocked from the start.
        unlocked_lanes: u32,
    },
    /// Unlocks the next lane in configuration order.
    UnlockLane,
    /// Marks a protocol as available for placement.
    UnlockProtocol {
        /// Protocol to unlock.
        protocol: ProtocolKind,
    },
    /// Creation request produced by an external spawn policy.
    SpawnEnemy {
        /// Enemy variant to instantiate.
        kind: EnemyKind,
        /// Lane the enemy walks.
        lane: LaneId,
        /// Policy that produced the request.
        source: SpawnSource,
    },
    /// Requests placement of a protocol tower on a slot.
    PlaceTower {
        /// Protocol to construct.
        protocol: ProtocolKind,
        /// Slot that should host the tower.
        slot: SlotId,
    },
    /// Requests removal of an existing tower, refunding part of its cost.
    SellTower {
        /// Identifier of the tower targeted for sale.
        tower: TowerId,
    },
    /// Requests a level increase for an existing tower.
    UpgradeTower {
        /// Identifier of the tower targeted for upgrade.
        tower: TowerId,
    },
    /// Engages the currently walking boss at the chosen difficulty.
    EngageBoss {
        /// Difficulty the player selected for the encounter.
        difficulty: BossDifficulty,
    },
    /// Reports the outcome of an engaged boss encounter.
    ReportBossOutcome {
        /// Whether the external combat mode ended in victory.
        won: bool,
    },
    /// Activates the overclock buff if it is not already running.
    ActivateOverclock,
    /// Requests recovery from a system freeze.
    RequestFreezeRecovery {
        /// Recovery path the player chose.
        method: RecoveryMethod,
    },
    /// Advances the simulation clock: threat, boss lifecycle, movement,
    /// leak resolution, and the spatial index rebuild.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Fires a volley from a tower toward an aim point computed by the
    /// ballistics system. Stale tower or target references are skipped.
    FireProjectile {
        /// Tower that fires.
        tower: TowerId,
        /// Enemy the volley was aimed at when the lead was computed.
        target: EnemyId,
        /// Predicted lead position to aim at.
        aim: Vec2,
    },
    /// Resolves projectile motion, collisions, cleanup, and — when the
    /// system is not frozen — the economy accrual and decay tick.
    ResolveCombat {
        /// Duration of simulated time covered by the combat step.
        dt: Duration,
    },
}

/// Reasons a tower placement request may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum PlacementError {
    /// No slot with the provided identifier exists.
    UnknownSlot,
    /// The slot already hosts a tower.
    SlotOccupied,
    /// The protocol has not been unlocked yet.
    ProtocolLocked,
    /// The hash balance cannot cover the placement cost.
    InsufficientHash {
        /// Hash required by the placement.
        required: u64,
        /// Hash currently available.
        available: u64,
    },
    /// The power grid cannot cover the tower's draw.
    InsufficientPower {
        /// Power the tower would draw.
        required: f32,
        /// Power remaining in the budget.
        available: f32,
    },
}

/// Reasons a tower sale request may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SellError {
    /// No tower with the provided identifier exists.
    UnknownTower,
}

/// Reasons a tower upgrade request may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum UpgradeError {
    /// No tower with the provided identifier exists.
    UnknownTower,
    /// The tower already sits at its maximum level.
    MaxLevel,
    /// The hash balance cannot cover the upgrade cost.
    InsufficientHash {
        /// Hash required by the upgrade.
        required: u64,
        /// Hash currently available.
        available: u64,
    },
}

/// Reasons a boss engagement request may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngageError {
    /// No boss is currently walking a lane.
    NoActiveBoss,
    /// The active boss is already engaged.
    AlreadyEngaged,
}

/// Reasons a boss outcome report may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutcomeError {
    /// No boss is currently engaged.
    NoEngagedBoss,
}

/// Reasons an overclock activation may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverclockError {
    /// Overclock is already running.
    AlreadyActive,
    /// The system is frozen; recovery must happen first.
    SystemFrozen,
}

/// Reasons a freeze recovery request may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecoveryError {
    /// The system is not frozen, so there is nothing to recover.
    NotFrozen,
}

/// Reasons an enemy spawn request may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpawnError {
    /// The lane index exceeds the configured lane count.
    UnknownLane,
    /// The lane exists but has not been unlocked.
    LaneLocked,
    /// The system is frozen; spawning is halted.
    SystemFrozen,
}

/// Record handed to the external loot collaborator when an enemy dies.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct KillRecord {
    /// Enemy that died.
    pub enemy: EnemyId,
    /// Variant of the dead enemy.
    pub kind: EnemyKind,
    /// World position where the enemy died.
    pub position: Vec2,
    /// Hash reward requested for the kill.
    pub reward: u64,
    /// Hash actually credited after the capacity cap.
    pub credited: u64,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that a level layout was installed.
    LevelConfigured {
        /// Number of lanes in the level.
        lanes: u32,
        /// Number of tower slots in the level.
        slots: u32,
    },
    /// Confirms that the next lane became available.
    LaneUnlocked {
        /// Lane that was unlocked.
        lane: LaneId,
    },
    /// Confirms that a protocol became available for placement.
    ProtocolUnlocked {
        /// Protocol that was unlocked.
        protocol: ProtocolKind,
    },
    /// Confirms that an enemy entered the simulation.
    EnemySpawned {
        /// Identifier assigned to the enemy.
        enemy: EnemyId,
        /// Variant of the spawned enemy.
        kind: EnemyKind,
        /// Lane the enemy walks.
        lane: LaneId,
    },
    /// Reports that an enemy spawn request was rejected.
    SpawnRejected {
        /// Variant requested by the spawn policy.
        kind: EnemyKind,
        /// Lane requested by the spawn policy.
        lane: LaneId,
        /// Specific reason the spawn failed.
        reason: SpawnError,
    },
    /// Reports that an enemy completed its lane and leaked.
    EnemyLeaked {
        /// Enemy that reached the core.
        enemy: EnemyId,
        /// Leak counter after the leak.
        leak_counter: u32,
        /// Efficiency after the leak.
        efficiency: f32,
    },
    /// Fires once when efficiency crosses below the warning threshold.
    EfficiencyWarning {
        /// Efficiency value after the crossing leak.
        efficiency: f32,
    },
    /// Fires once when efficiency newly reaches exactly zero.
    SystemFrozen {
        /// Total number of freezes this session, including this one.
        freeze_count: u32,
    },
    /// Confirms that a recovery command restored the system.
    SystemRestored {
        /// Recovery path that was applied.
        method: RecoveryMethod,
        /// Hash debited by the recovery.
        cost: u64,
        /// Efficiency after recovery.
        efficiency: f32,
    },
    /// Reports that a recovery request was rejected.
    RecoveryRejected {
        /// Recovery path that was requested.
        method: RecoveryMethod,
        /// Specific reason the recovery failed.
        reason: RecoveryError,
    },
    /// Confirms that the wave-remaining tally reached zero.
    WaveCleared,
    /// Confirms that a tower fired a volley.
    ProjectileFired {
        /// Tower that fired.
        tower: TowerId,
        /// Enemy the volley was aimed at.
        target: EnemyId,
        /// Number of projectiles in the volley.
        count: u32,
    },
    /// Confirms that a projectile struck an enemy.
    ProjectileHit {
        /// Projectile that struck.
        projectile: ProjectileId,
        /// Enemy that was struck.
        enemy: EnemyId,
        /// Damage applied by the strike.
        damage: f32,
    },
    /// Confirms that an enemy died; carries the loot handoff record.
    EnemyKilled {
        /// Kill record for the external loot collaborator.
        record: KillRecord,
    },
    /// Confirms that a tower was placed.
    TowerPlaced {
        /// Identifier assigned to the tower.
        tower: TowerId,
        /// Protocol that was constructed.
        protocol: ProtocolKind,
        /// Slot hosting the tower.
        slot: SlotId,
        /// Hash debited by the placement.
        cost: u64,
    },
    /// Reports that a tower placement request was rejected.
    TowerPlacementRejected {
        /// Protocol requested for placement.
        protocol: ProtocolKind,
        /// Slot provided in the placement request.
        slot: SlotId,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Confirms that a tower was sold.
    TowerSold {
        /// Tower that was removed.
        tower: TowerId,
        /// Hash credited back to the balance.
        refund: u64,
    },
    /// Reports that a tower sale request was rejected.
    TowerSaleRejected {
        /// Tower targeted for sale.
        tower: TowerId,
        /// Specific reason the sale failed.
        reason: SellError,
    },
    /// Confirms that a tower was upgraded.
    TowerUpgraded {
        /// Tower that was upgraded.
        tower: TowerId,
        /// Level after the upgrade.
        level: u32,
        /// Hash debited by the upgrade.
        cost: u64,
    },
    /// Reports that a tower upgrade request was rejected.
    TowerUpgradeRejected {
        /// Tower targeted for upgrade.
        tower: TowerId,
        /// Specific reason the upgrade failed.
        reason: UpgradeError,
    },
    /// Confirms that a boss spawned and started walking its lane.
    BossSpawned {
        /// Enemy record backing the boss.
        enemy: EnemyId,
        /// Boss variant that spawned.
        kind: BossKind,
        /// Lane the boss walks.
        lane: LaneId,
    },
    /// Confirms that the walking boss was engaged.
    BossEngaged {
        /// Boss variant that was engaged.
        kind: BossKind,
        /// Difficulty selected for the encounter.
        difficulty: BossDifficulty,
    },
    /// Reports that a boss engagement request was rejected.
    BossEngageRejected {
        /// Specific reason the engagement failed.
        reason: EngageError,
    },
    /// Confirms a boss victory reported by the external combat mode.
    BossDefeated {
        /// Boss variant that was defeated.
        kind: BossKind,
        /// Hash reward credited for the victory.
        reward: u64,
        /// Threat level after the difficulty-scaled relief.
        threat_level: f32,
    },
    /// Confirms that an engaged boss was let pass (encounter lost).
    BossDeparted {
        /// Boss variant that departed.
        kind: BossKind,
    },
    /// Confirms that an ignored boss walked all the way to the core.
    BossReachedCore {
        /// Boss variant that reached the core.
        kind: BossKind,
    },
    /// Reports that a boss outcome report was rejected.
    BossOutcomeRejected {
        /// Specific reason the report failed.
        reason: OutcomeError,
    },
    /// Confirms that overclock was activated.
    OverclockActivated {
        /// Duration the buff will run.
        duration: Duration,
    },
    /// Confirms that the overclock buff expired.
    OverclockExpired,
    /// Reports that an overclock activation was rejected.
    OverclockRejected {
        /// Specific reason the activation failed.
        reason: OverclockError,
    },
}

/// Immutable representation of a single enemy used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemySnapshot {
    /// Unique identifier assigned to the enemy.
    pub id: EnemyId,
    /// Variant classification of the enemy.
    pub archetype: EnemyArchetype,
    /// World position written back from lane progress.
    pub position: Vec2,
    /// Lane the enemy walks.
    pub lane: LaneId,
    /// Arc-length fraction of the lane already covered.
    pub progress: f32,
    /// Current speed after slow effects.
    pub speed: f32,
    /// Remaining health.
    pub health: f32,
    /// Health the enemy spawned with.
    pub max_health: f32,
    /// Collision radius.
    pub size: f32,
    /// Whether the enemy is a boss encounter.
    pub is_boss: bool,
    /// Whether towers must ignore the enemy.
    pub immune_to_towers: bool,
    /// Whether a slow effect is currently applied.
    pub slowed: bool,
}

/// Read-only snapshot describing all live, not-yet-arrived enemies.
#[derive(Clone, Debug, Default)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EnemySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in deterministic id order.
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Looks up a snapshot by enemy identifier.
    #[must_use]
    pub fn get(&self, id: EnemyId) -> Option<&EnemySnapshot> {
        self.snapshots
            .binary_search_by_key(&id, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<EnemySnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single tower used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerSnapshot {
    /// Identifier allocated to the tower by the world.
    pub id: TowerId,
    /// Protocol the tower implements.
    pub protocol: ProtocolKind,
    /// Slot hosting the tower.
    pub slot: SlotId,
    /// World position of the tower.
    pub position: Vec2,
    /// Current upgrade level, starting at 1.
    pub level: u32,
    /// Effective per-projectile damage at the current level.
    pub damage: f32,
    /// Effective targeting range at the current level.
    pub range: f32,
    /// Effective attacks per second at the current level.
    pub attack_speed: f32,
    /// Projectiles per volley.
    pub projectile_count: u32,
    /// Speed of spawned projectiles.
    pub projectile_speed: f32,
    /// Whether the fire cooldown has elapsed.
    pub ready: bool,
    /// Enemy the tower last aimed at, if it still resolves.
    pub target: Option<EnemyId>,
}

/// Read-only snapshot describing all placed towers.
#[derive(Clone, Debug, Default)]
pub struct TowerView {
    snapshots: Vec<TowerSnapshot>,
}

impl TowerView {
    /// Creates a new tower view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TowerSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in deterministic id order.
    pub fn iter(&self) -> impl Iterator<Item = &TowerSnapshot> {
        self.snapshots.iter()
    }

    /// Looks up a snapshot by tower identifier.
    #[must_use]
    pub fn get(&self, id: TowerId) -> Option<&TowerSnapshot> {
        self.snapshots
            .binary_search_by_key(&id, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<TowerSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single projectile used for rendering.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectileSnapshot {
    /// Identifier allocated to the projectile.
    pub id: ProjectileId,
    /// Current world position.
    pub position: Vec2,
    /// Current velocity.
    pub velocity: Vec2,
    /// Collision radius.
    pub radius: f32,
    /// Whether the projectile was produced by an enemy.
    pub enemy_sourced: bool,
}

/// Read-only snapshot describing all live projectiles.
#[derive(Clone, Debug, Default)]
pub struct ProjectileView {
    snapshots: Vec<ProjectileSnapshot>,
}

impl ProjectileView {
    /// Creates a new projectile view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<ProjectileSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in deterministic id order.
    pub fn iter(&self) -> impl Iterator<Item = &ProjectileSnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<ProjectileSnapshot> {
        self.snapshots
    }
}

/// Pairing of a tower with its selected target for the current tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerTarget {
    /// Tower that selected the target.
    pub tower: TowerId,
    /// Enemy the tower selected.
    pub enemy: EnemyId,
    /// Tower position at selection time.
    pub tower_position: Vec2,
    /// Enemy position at selection time.
    pub enemy_position: Vec2,
}

/// Aggregated economy state exposed for UI display and persistence.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EconomySnapshot {
    /// Current hash balance.
    pub hash: u64,
    /// Storage capacity capping the balance.
    pub capacity: u64,
    /// Current leak counter.
    pub leak_counter: u32,
    /// Efficiency derived from the leak counter.
    pub efficiency: f32,
    /// Whether the system is frozen.
    pub frozen: bool,
    /// Number of freezes this session.
    pub freeze_count: u32,
    /// Hash income per second after efficiency and overclock scaling.
    pub income_rate: f32,
}

/// Aggregated threat and overclock state.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThreatSnapshot {
    /// Continuous threat level.
    pub level: f32,
    /// Threat level that triggers the next boss spawn.
    pub next_milestone: f32,
    /// Whether overclock is currently running.
    pub overclock_active: bool,
    /// Time the overclock buff has left.
    pub overclock_remaining: Duration,
}

/// Identity and phase of the currently active boss encounter.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActiveBoss {
    /// Enemy record backing the boss.
    pub enemy: EnemyId,
    /// Boss variant.
    pub kind: BossKind,
    /// Lane the boss spawned on.
    pub lane: LaneId,
    /// Whether the boss has been engaged.
    pub engaged: bool,
    /// Difficulty selected at engagement, if engaged.
    pub difficulty: Option<BossDifficulty>,
}

/// Aggregated boss lifecycle state exposed for UI display.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BossLifecycleSnapshot {
    /// Currently active boss, if any.
    pub active: Option<ActiveBoss>,
    /// Time until the next spawn trigger may fire.
    pub cooldown_remaining: Duration,
    /// Lanes on which a boss has been defeated at least once.
    pub defeated_lanes: Vec<LaneId>,
}

/// Persisted state the offline extrapolator reads on next launch.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct OfflineSnapshot {
    /// Threat level when the session ended.
    pub threat_level: f32,
    /// Leak counter when the session ended.
    pub leak_counter: u32,
    /// Aggregate tower damage per second when the session ended.
    pub total_dps: f32,
    /// Number of unlocked lanes.
    pub lane_count: u32,
    /// Hash balance when the session ended.
    pub hash: u64,
    /// Storage capacity capping the balance.
    pub capacity: u64,
}
