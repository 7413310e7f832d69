//! Externally supplied balance configuration.
//!
//! Every numeric tuning value the engine consumes is injected through
//! [`BalanceTable`] so the same simulation can run under different tuning
//! without code changes. The `Default` implementation mirrors the shipped
//! balance sheet; adapters may replace any section from a JSON document and
//! must call [`BalanceTable::validate`] before handing the table to the
//! world.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{BossDifficulty, BossKind, EnemyKind, ProtocolKind};

/// Validation failures for an injected balance table.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum BalanceError {
    /// `loss_per_leak` must be positive for the efficiency duality to hold.
    #[error("loss_per_leak must be positive, got {0}")]
    NonPositiveLossPerLeak(f32),
    /// The warning threshold must sit strictly between 0 and 100.
    #[error("warning_threshold must lie in (0, 100), got {0}")]
    WarningThresholdOutOfRange(f32),
    /// The recovery target must sit strictly between 0 and 100.
    #[error("recovery_target_efficiency must lie in (0, 100], got {0}")]
    RecoveryTargetOutOfRange(f32),
    /// Threat must grow, otherwise boss milestones never trigger.
    #[error("threat growth_per_second must be positive, got {0}")]
    NonPositiveThreatGrowth(f32),
    /// A protocol's attack speed must be positive to derive a cooldown.
    #[error("attack_speed must be positive for protocol {0:?}")]
    NonPositiveAttackSpeed(ProtocolKind),
    /// An enemy's base speed must be positive so lanes always complete.
    #[error("speed must be positive for enemy {0:?}")]
    NonPositiveEnemySpeed(EnemyKind),
    /// The offline model needs a positive deficit threshold.
    #[error("offline defense_ratio_threshold must be positive, got {0}")]
    NonPositiveDefenseThreshold(f32),
}

/// Failures while loading a balance table from a JSON document.
#[derive(Debug, Error)]
pub enum BalanceLoadError {
    /// The document is not valid JSON for the table's shape.
    #[error("malformed balance JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// The document parsed but violates an engine invariant.
    #[error(transparent)]
    Invalid(#[from] BalanceError),
}

/// Complete injected tuning table for one simulation session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BalanceTable {
    /// Hash economy and efficiency tuning.
    pub economy: EconomyTuning,
    /// Threat level growth and enemy scaling.
    pub threat: ThreatTuning,
    /// Overclock buff tuning.
    pub overclock: OverclockTuning,
    /// Power grid tuning.
    pub power: PowerTuning,
    /// Boss lifecycle tuning.
    pub boss: BossTuning,
    /// Offline extrapolation tuning.
    pub offline: OfflineTuning,
    /// Targeting and lead-prediction tuning.
    pub targeting: TargetingTuning,
    /// Formula selecting how scaled enemy rewards grow with threat.
    pub reward_scaling: RewardScaling,
    /// Per-variant ordinary enemy stats.
    pub enemies: EnemyTable,
    /// Per-variant boss stats.
    pub bosses: BossTable,
    /// Per-variant protocol stats.
    pub protocols: ProtocolTable,
}

impl Default for BalanceTable {
    fn default() -> Self {
        Self {
            economy: EconomyTuning::default(),
            threat: ThreatTuning::default(),
            overclock: OverclockTuning::default(),
            power: PowerTuning::default(),
            boss: BossTuning::default(),
            offline: OfflineTuning::default(),
            targeting: TargetingTuning::default(),
            reward_scaling: RewardScaling::default(),
            enemies: EnemyTable::default(),
            bosses: BossTable::default(),
            protocols: ProtocolTable::default(),
        }
    }
}

impl BalanceTable {
    /// Parses a table from a JSON document and validates it. Omitted
    /// sections fall back to the shipped defaults.
    pub fn from_json_str(text: &str) -> Result<Self, BalanceLoadError> {
        let table: Self = serde_json::from_str(text)?;
        table.validate()?;
        Ok(table)
    }

    /// Checks the invariants the engine relies on.
    pub fn validate(&self) -> Result<(), BalanceError> {
        if self.economy.loss_per_leak <= 0.0 {
            return Err(BalanceError::NonPositiveLossPerLeak(
                self.economy.loss_per_leak,
            ));
        }
        if !(0.0..100.0).contains(&self.economy.warning_threshold)
            || self.economy.warning_threshold == 0.0
        {
            return Err(BalanceError::WarningThresholdOutOfRange(
                self.economy.warning_threshold,
            ));
        }
        if !(0.0..=100.0).contains(&self.economy.recovery_target_efficiency)
            || self.economy.recovery_target_efficiency == 0.0
        {
            return Err(BalanceError::RecoveryTargetOutOfRange(
                self.economy.recovery_target_efficiency,
            ));
        }
        if self.threat.growth_per_second <= 0.0 {
            return Err(BalanceError::NonPositiveThreatGrowth(
                self.threat.growth_per_second,
            ));
        }
        if self.offline.defense_ratio_threshold <= 0.0 {
            return Err(BalanceError::NonPositiveDefenseThreshold(
                self.offline.defense_ratio_threshold,
            ));
        }
        for kind in ProtocolKind::ALL {
            if self.protocols.stats(kind).attack_speed <= 0.0 {
                return Err(BalanceError::NonPositiveAttackSpeed(kind));
            }
        }
        for kind in EnemyKind::ALL {
            if self.enemies.stats(kind).speed <= 0.0 {
                return Err(BalanceError::NonPositiveEnemySpeed(kind));
            }
        }
        Ok(())
    }
}

/// Hash economy and efficiency tuning.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyTuning {
    /// Hash balance a fresh session starts with.
    pub starting_hash: u64,
    /// Base hash income per second at 100% efficiency.
    pub base_hash_per_second: f32,
    /// Storage capacity capping the hash balance.
    pub storage_capacity: u64,
    /// Efficiency percentage lost per leak.
    pub loss_per_leak: f32,
    /// Seconds between passive leak-counter decrements, before the
    /// regeneration multiplier is applied.
    pub leak_decay_interval: f32,
    /// Divides the decay interval; values above 1 recover faster.
    pub regeneration_multiplier: f32,
    /// Efficiency below which the warning event fires.
    pub warning_threshold: f32,
    /// Fraction of the current balance a flush costs.
    pub flush_cost_fraction: f32,
    /// Minimum flush cost regardless of balance.
    pub flush_cost_floor: u64,
    /// Efficiency both recovery paths restore the system to.
    pub recovery_target_efficiency: f32,
}

impl Default for EconomyTuning {
    fn default() -> Self {
        Self {
            starting_hash: 150,
            base_hash_per_second: 2.0,
            storage_capacity: 10_000,
            loss_per_leak: 5.0,
            leak_decay_interval: 12.0,
            regeneration_multiplier: 1.0,
            warning_threshold: 30.0,
            flush_cost_fraction: 0.25,
            flush_cost_floor: 50,
            recovery_target_efficiency: 50.0,
        }
    }
}

/// Threat level growth and the scaling it applies to spawned enemies.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThreatTuning {
    /// Threat gained per real second.
    pub growth_per_second: f32,
    /// Cap beyond which threat stops growing.
    pub cap: f32,
    /// Health multiplier gained per threat point.
    pub health_scaling: f32,
    /// Speed multiplier gained per threat point.
    pub speed_scaling: f32,
    /// Damage multiplier gained per threat point.
    pub damage_scaling: f32,
}

impl Default for ThreatTuning {
    fn default() -> Self {
        Self {
            growth_per_second: 0.05,
            cap: 500.0,
            health_scaling: 0.06,
            speed_scaling: 0.008,
            damage_scaling: 0.04,
        }
    }
}

/// Overclock buff tuning.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverclockTuning {
    /// Seconds the buff runs once activated.
    pub duration: f32,
    /// Multiplier applied to hash income while active.
    pub hash_multiplier: f32,
    /// Multiplier applied to threat growth while active.
    pub threat_multiplier: f32,
    /// Multiplier applied to the power budget while active.
    pub power_multiplier: f32,
}

impl Default for OverclockTuning {
    fn default() -> Self {
        Self {
            duration: 30.0,
            hash_multiplier: 2.0,
            threat_multiplier: 1.5,
            power_multiplier: 1.25,
        }
    }
}

/// Power grid tuning.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerTuning {
    /// Total power available to placed towers.
    pub base_budget: f32,
}

impl Default for PowerTuning {
    fn default() -> Self {
        Self { base_budget: 100.0 }
    }
}

/// Reward and threat-relief scaling for one boss difficulty.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DifficultyTuning {
    /// Multiplier applied to the base boss reward.
    pub reward_multiplier: f32,
    /// Fraction of the current threat level removed on victory.
    pub threat_relief: f32,
}

/// Boss lifecycle tuning.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BossTuning {
    /// Threat level at which the first boss spawns.
    pub first_milestone: f32,
    /// Threat distance between successive boss milestones.
    pub milestone_interval: f32,
    /// Seconds of cooldown after a victory.
    pub victory_cooldown: f32,
    /// Seconds of cooldown after a loss or an ignored boss.
    pub ignore_cooldown: f32,
    /// Leaks applied when a boss is lost or reaches the core.
    pub leak_penalty: u32,
    /// Base hash reward before difficulty scaling.
    pub base_reward: u64,
    /// Scaling when the encounter was fought on Standard.
    pub standard: DifficultyTuning,
    /// Scaling when the encounter was fought on Hard.
    pub hard: DifficultyTuning,
    /// Scaling when the encounter was fought on Brutal.
    pub brutal: DifficultyTuning,
}

impl BossTuning {
    /// Retrieves the scaling block for a difficulty.
    #[must_use]
    pub const fn difficulty(&self, difficulty: BossDifficulty) -> DifficultyTuning {
        match difficulty {
            BossDifficulty::Standard => self.standard,
            BossDifficulty::Hard => self.hard,
            BossDifficulty::Brutal => self.brutal,
        }
    }
}

impl Default for BossTuning {
    fn default() -> Self {
        Self {
            first_milestone: 25.0,
            milestone_interval: 25.0,
            victory_cooldown: 90.0,
            ignore_cooldown: 45.0,
            leak_penalty: 3,
            base_reward: 500,
            standard: DifficultyTuning {
                reward_multiplier: 1.0,
                threat_relief: 0.15,
            },
            hard: DifficultyTuning {
                reward_multiplier: 1.6,
                threat_relief: 0.25,
            },
            brutal: DifficultyTuning {
                reward_multiplier: 2.5,
                threat_relief: 0.40,
            },
        }
    }
}

/// Offline extrapolation tuning.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OfflineTuning {
    /// Hard cap on credited offline hours.
    pub max_hours: f32,
    /// Income multiplier applied while offline.
    pub earnings_rate: f32,
    /// Defense/offense ratio below which leaks start accruing.
    pub defense_ratio_threshold: f32,
    /// Leak rate at a total defense deficit.
    pub max_leaks_per_hour: f32,
    /// Assumed enemy toughness contributed per threat point per lane,
    /// expressed as damage-per-second the defense must match.
    pub toughness_per_threat: f32,
}

impl Default for OfflineTuning {
    fn default() -> Self {
        Self {
            max_hours: 24.0,
            earnings_rate: 0.2,
            defense_ratio_threshold: 1.0,
            max_leaks_per_hour: 40.0,
            toughness_per_threat: 1.5,
        }
    }
}

/// Targeting and lead-prediction tuning.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetingTuning {
    /// Cap on predicted flight time when computing a lead position.
    pub max_prediction_secs: f32,
    /// Progress delta used when sampling lane geometry for velocity.
    pub progress_sample_delta: f32,
}

impl Default for TargetingTuning {
    fn default() -> Self {
        Self {
            max_prediction_secs: 0.75,
            progress_sample_delta: 0.005,
        }
    }
}

/// Formula selecting how the scaled enemy reward grows with threat.
///
/// The original balance sheet carried two competing scalings for the same
/// concept; both are kept as distinct, named options so the table decides
/// which one a session runs under.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardScaling {
    /// `reward_scaled × (1 + threat) ^ exponent`.
    PowerCurve {
        /// Exponent of the power curve.
        exponent: f32,
    },
    /// `reward_scaled × (1 + threat × per_threat)`.
    Linear {
        /// Linear gain per threat point.
        per_threat: f32,
    },
}

impl RewardScaling {
    /// Applies the configured scaling to a base scaled reward.
    #[must_use]
    pub fn apply(&self, reward_scaled: u64, threat: f32) -> u64 {
        let factor = match *self {
            RewardScaling::PowerCurve { exponent } => (1.0 + threat.max(0.0)).powf(exponent),
            RewardScaling::Linear { per_threat } => 1.0 + threat.max(0.0) * per_threat,
        };
        (reward_scaled as f64 * f64::from(factor)).round() as u64
    }
}

impl Default for RewardScaling {
    fn default() -> Self {
        RewardScaling::Linear { per_threat: 0.02 }
    }
}

/// Base stats for one ordinary enemy variant.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnemyStats {
    /// Health before threat scaling.
    pub health: f32,
    /// Walk speed in world units per second.
    pub speed: f32,
    /// Damage dealt on leak (consumed by external systems).
    pub damage: f32,
    /// Collision radius.
    pub size: f32,
    /// Older flat reward field kept distinct pending product confirmation.
    pub reward_flat: u64,
    /// Current reward field, scaled by [`RewardScaling`].
    pub reward_scaled: u64,
}

/// Ordinary enemy stats, one block per variant.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyTable {
    /// Stats for [`EnemyKind::Script`].
    pub script: EnemyStats,
    /// Stats for [`EnemyKind::Worm`].
    pub worm: EnemyStats,
    /// Stats for [`EnemyKind::Trojan`].
    pub trojan: EnemyStats,
    /// Stats for [`EnemyKind::Botnet`].
    pub botnet: EnemyStats,
    /// Stats for [`EnemyKind::Rootkit`].
    pub rootkit: EnemyStats,
}

impl EnemyTable {
    /// Retrieves the stats block for a variant.
    #[must_use]
    pub const fn stats(&self, kind: EnemyKind) -> &EnemyStats {
        match kind {
            EnemyKind::Script => &self.script,
            EnemyKind::Worm => &self.worm,
            EnemyKind::Trojan => &self.trojan,
            EnemyKind::Botnet => &self.botnet,
            EnemyKind::Rootkit => &self.rootkit,
        }
    }
}

impl Default for EnemyTable {
    fn default() -> Self {
        Self {
            script: EnemyStats {
                health: 20.0,
                speed: 40.0,
                damage: 1.0,
                size: 8.0,
                reward_flat: 2,
                reward_scaled: 3,
            },
            worm: EnemyStats {
                health: 12.0,
                speed: 75.0,
                damage: 1.0,
                size: 6.0,
                reward_flat: 3,
                reward_scaled: 4,
            },
            trojan: EnemyStats {
                health: 80.0,
                speed: 22.0,
                damage: 3.0,
                size: 14.0,
                reward_flat: 8,
                reward_scaled: 10,
            },
            botnet: EnemyStats {
                health: 30.0,
                speed: 50.0,
                damage: 2.0,
                size: 9.0,
                reward_flat: 4,
                reward_scaled: 6,
            },
            rootkit: EnemyStats {
                health: 150.0,
                speed: 35.0,
                damage: 5.0,
                size: 12.0,
                reward_flat: 15,
                reward_scaled: 20,
            },
        }
    }
}

/// Base stats for one boss variant.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BossStats {
    /// Health before threat scaling. Bosses are tower-immune; health is
    /// consumed by the external combat mode.
    pub health: f32,
    /// Walk speed in world units per second.
    pub speed: f32,
    /// Collision radius.
    pub size: f32,
}

/// Boss stats, one block per variant.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BossTable {
    /// Stats for [`BossKind::Cyberboss`].
    pub cyberboss: BossStats,
    /// Stats for [`BossKind::ZeroDay`].
    pub zero_day: BossStats,
    /// Stats for [`BossKind::VoidPylon`].
    pub void_pylon: BossStats,
}

impl BossTable {
    /// Retrieves the stats block for a variant.
    #[must_use]
    pub const fn stats(&self, kind: BossKind) -> &BossStats {
        match kind {
            BossKind::Cyberboss => &self.cyberboss,
            BossKind::ZeroDay => &self.zero_day,
            BossKind::VoidPylon => &self.void_pylon,
        }
    }
}

impl Default for BossTable {
    fn default() -> Self {
        Self {
            cyberboss: BossStats {
                health: 5_000.0,
                speed: 18.0,
                size: 28.0,
            },
            zero_day: BossStats {
                health: 3_200.0,
                speed: 26.0,
                size: 22.0,
            },
            void_pylon: BossStats {
                health: 8_000.0,
                speed: 12.0,
                size: 34.0,
            },
        }
    }
}

/// Complete stat block for one protocol variant.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProtocolStats {
    /// Hash cost of placement.
    pub cost: u64,
    /// Per-projectile damage at level 1.
    pub damage: f32,
    /// Targeting range at level 1.
    pub range: f32,
    /// Attacks per second at level 1.
    pub attack_speed: f32,
    /// Projectiles per volley.
    pub projectile_count: u32,
    /// Total angular spread of a multi-projectile volley, in degrees.
    pub spread_degrees: f32,
    /// Projectile travel speed.
    pub projectile_speed: f32,
    /// Projectile collision radius.
    pub projectile_radius: f32,
    /// Seconds a projectile lives before expiring.
    pub projectile_lifetime: f32,
    /// Additional enemies a projectile may strike after the first.
    pub pierce: u32,
    /// Splash radius around the primary hit; zero disables splash.
    pub splash_radius: f32,
    /// Fraction of primary damage dealt by splash.
    pub splash_damage_fraction: f32,
    /// Speed reduction fraction applied on hit; zero disables slow.
    pub slow_amount: f32,
    /// Seconds the slow effect lasts.
    pub slow_duration: f32,
    /// Chain jumps after the primary hit; zero disables chaining.
    pub chain_count: u32,
    /// Maximum distance of one chain jump.
    pub chain_range: f32,
    /// Damage fraction retained per chain jump.
    pub chain_damage_fraction: f32,
    /// Turn rate in radians per second for homing projectiles, if any.
    pub homing_turn_rate: Option<f32>,
    /// Power drawn from the grid while placed.
    pub power_draw: f32,
    /// Hash cost of the first upgrade.
    pub upgrade_cost_base: u64,
    /// Multiplier applied to the upgrade cost per level.
    pub upgrade_cost_growth: f32,
    /// Highest reachable level.
    pub max_level: u32,
    /// Damage multiplier gained per level.
    pub damage_per_level: f32,
    /// Range multiplier gained per level.
    pub range_per_level: f32,
    /// Attack-speed multiplier gained per level.
    pub attack_speed_per_level: f32,
    /// Fraction of invested hash refunded on sale.
    pub sell_refund: f32,
}

/// Protocol stats, one block per variant.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolTable {
    /// Stats for [`ProtocolKind::Firewall`].
    pub firewall: ProtocolStats,
    /// Stats for [`ProtocolKind::PacketFilter`].
    pub packet_filter: ProtocolStats,
    /// Stats for [`ProtocolKind::Honeypot`].
    pub honeypot: ProtocolStats,
    /// Stats for [`ProtocolKind::IceShard`].
    pub ice_shard: ProtocolStats,
    /// Stats for [`ProtocolKind::NullRouter`].
    pub null_router: ProtocolStats,
}

impl ProtocolTable {
    /// Retrieves the stats block for a variant.
    #[must_use]
    pub const fn stats(&self, kind: ProtocolKind) -> &ProtocolStats {
        match kind {
            ProtocolKind::Firewall => &self.firewall,
            ProtocolKind::PacketFilter => &self.packet_filter,
            ProtocolKind::Honeypot => &self.honeypot,
            ProtocolKind::IceShard => &self.ice_shard,
            ProtocolKind::NullRouter => &self.null_router,
        }
    }
}

const fn base_protocol() -> ProtocolStats {
    ProtocolStats {
        cost: 100,
        damage: 8.0,
        range: 150.0,
        attack_speed: 1.0,
        projectile_count: 1,
        spread_degrees: 0.0,
        projectile_speed: 400.0,
        projectile_radius: 4.0,
        projectile_lifetime: 1.5,
        pierce: 0,
        splash_radius: 0.0,
        splash_damage_fraction: 0.0,
        slow_amount: 0.0,
        slow_duration: 0.0,
        chain_count: 0,
        chain_range: 0.0,
        chain_damage_fraction: 0.0,
        homing_turn_rate: None,
        power_draw: 10.0,
        upgrade_cost_base: 80,
        upgrade_cost_growth: 1.6,
        max_level: 10,
        damage_per_level: 1.25,
        range_per_level: 1.05,
        attack_speed_per_level: 1.08,
        sell_refund: 0.6,
    }
}

impl Default for ProtocolTable {
    fn default() -> Self {
        Self {
            firewall: base_protocol(),
            packet_filter: ProtocolStats {
                cost: 180,
                damage: 5.0,
                projectile_count: 3,
                spread_degrees: 24.0,
                power_draw: 14.0,
                ..base_protocol()
            },
            honeypot: ProtocolStats {
                cost: 260,
                damage: 12.0,
                attack_speed: 0.6,
                projectile_speed: 280.0,
                splash_radius: 60.0,
                splash_damage_fraction: 0.5,
                power_draw: 18.0,
                ..base_protocol()
            },
            ice_shard: ProtocolStats {
                cost: 220,
                damage: 3.0,
                slow_amount: 0.4,
                slow_duration: 2.0,
                homing_turn_rate: Some(6.0),
                power_draw: 12.0,
                ..base_protocol()
            },
            null_router: ProtocolStats {
                cost: 420,
                damage: 16.0,
                attack_speed: 0.8,
                pierce: 2,
                chain_count: 2,
                chain_range: 90.0,
                chain_damage_fraction: 0.6,
                power_draw: 24.0,
                ..base_protocol()
            },
        }
    }
}
