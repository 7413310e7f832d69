#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Closed-form extrapolation of the defense dynamics over elapsed offline
//! time.
//!
//! This is a pure function of the persisted snapshot and the elapsed
//! duration; it never steps a loop. Its leak and efficiency formulas are the
//! shared core pair, so the stepped and analytic models cannot diverge.

use breach_defence_core::{
    config::BalanceTable, efficiency_for, OfflineSnapshot, MAX_EFFICIENCY,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const SECONDS_PER_HOUR: f32 = 3_600.0;

/// Result of extrapolating one offline interval.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct OfflineReport {
    /// Interval actually credited after the configured cap.
    pub credited_secs: f32,
    /// Threat level at the end of the interval.
    pub threat_level: f32,
    /// Leaks attributed to the interval.
    pub leaks: u32,
    /// Leak counter at the end of the interval.
    pub leak_counter: u32,
    /// Efficiency at the start of the interval.
    pub start_efficiency: f32,
    /// Efficiency at the end of the interval.
    pub end_efficiency: f32,
    /// Hash earned over the interval, before the capacity clamp.
    pub hash_earned: u64,
    /// Hash balance after crediting, clamped at capacity.
    pub hash: u64,
}

/// Extrapolates threat growth, leak accumulation, efficiency decay, and hash
/// income over `elapsed` wall-clock time.
#[must_use]
pub fn extrapolate(
    snapshot: &OfflineSnapshot,
    balance: &BalanceTable,
    elapsed: Duration,
) -> OfflineReport {
    let tuning = &balance.offline;
    let credited_secs = elapsed
        .as_secs_f32()
        .min(tuning.max_hours * SECONDS_PER_HOUR);
    let hours = credited_secs / SECONDS_PER_HOUR;

    let threat_end = (snapshot.threat_level + balance.threat.growth_per_second * credited_secs)
        .min(balance.threat.cap);
    let threat_average = (snapshot.threat_level + threat_end) * 0.5;

    // Offense strength the lanes deliver on average over the interval; the
    // defense ratio compares persisted tower DPS against it.
    let offense = threat_average * tuning.toughness_per_threat * snapshot.lane_count.max(1) as f32;
    let defense_ratio = if offense > 0.0 {
        snapshot.total_dps / offense
    } else {
        f32::INFINITY
    };

    let leaks = if defense_ratio < tuning.defense_ratio_threshold {
        let deficit = 1.0 - defense_ratio / tuning.defense_ratio_threshold;
        let rate = tuning.max_leaks_per_hour * deficit;
        // Round up so even a short undefended absence registers.
        (rate * hours).ceil() as u32
    } else {
        0
    };

    let loss_per_leak = balance.economy.loss_per_leak;
    let leak_counter = snapshot.leak_counter.saturating_add(leaks);
    let start_efficiency = efficiency_for(snapshot.leak_counter, loss_per_leak);
    let end_efficiency = efficiency_for(leak_counter, loss_per_leak);
    let average_efficiency = (start_efficiency + end_efficiency) * 0.5;

    let hash_earned = (balance.economy.base_hash_per_second
        * (average_efficiency / MAX_EFFICIENCY)
        * tuning.earnings_rate
        * credited_secs)
        .floor() as u64;
    let hash = snapshot
        .hash
        .saturating_add(hash_earned)
        .min(snapshot.capacity);

    OfflineReport {
        credited_secs,
        threat_level: threat_end,
        leaks,
        leak_counter,
        start_efficiency,
        end_efficiency,
        hash_earned,
        hash,
    }
}
