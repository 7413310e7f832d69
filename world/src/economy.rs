//! Hash economy, leak-driven efficiency, freeze state, and the threat clock.

use breach_defence_core::{
    config::{EconomyTuning, OverclockTuning, ThreatTuning},
    efficiency_for, leak_count_for, RecoveryMethod, MAX_EFFICIENCY,
};

/// Result of routing one or more leaks through the economy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct LeakOutcome {
    pub(crate) leak_counter: u32,
    pub(crate) efficiency: f32,
    /// True the first time efficiency crosses below the warning threshold.
    pub(crate) warning_crossed: bool,
    /// True the first time efficiency reaches exactly zero.
    pub(crate) froze: bool,
}

/// Hash balance plus the leak counter it is throttled by.
#[derive(Clone, Debug)]
pub(crate) struct Economy {
    pub(crate) hash: u64,
    /// Fractional hash below one unit, carried between accrual ticks.
    accumulator: f32,
    pub(crate) leak_counter: u32,
    /// Seconds until the next leak-counter decay step.
    decay_timer: f32,
    pub(crate) frozen: bool,
    pub(crate) freeze_count: u32,
}

impl Economy {
    pub(crate) fn new(starting_hash: u64) -> Self {
        Self {
            hash: starting_hash,
            accumulator: 0.0,
            leak_counter: 0,
            decay_timer: 0.0,
            frozen: false,
            freeze_count: 0,
        }
    }

    pub(crate) fn efficiency(&self, tuning: &EconomyTuning) -> f32 {
        efficiency_for(self.leak_counter, tuning.loss_per_leak)
    }

    /// Hash income per second after efficiency and overclock scaling.
    pub(crate) fn income_rate(&self, tuning: &EconomyTuning, hash_multiplier: f32) -> f32 {
        tuning.base_hash_per_second * (self.efficiency(tuning) / MAX_EFFICIENCY) * hash_multiplier
    }

    /// Credits hash against the storage cap; returns what was actually added.
    pub(crate) fn add_hash(&mut self, amount: u64, capacity: u64) -> u64 {
        let credited = amount.min(capacity.saturating_sub(self.hash));
        self.hash += credited;
        credited
    }

    /// Debits hash, clamping at zero.
    pub(crate) fn debit(&mut self, amount: u64) {
        self.hash = self.hash.saturating_sub(amount);
    }

    /// Accrues passive income for `dt` seconds, crediting whole hash units
    /// and carrying the fraction.
    pub(crate) fn accrue(&mut self, dt: f32, tuning: &EconomyTuning, hash_multiplier: f32) {
        self.accumulator += self.income_rate(tuning, hash_multiplier) * dt;
        let whole = self.accumulator.floor();
        if whole >= 1.0 {
            self.accumulator -= whole;
            let _ = self.add_hash(whole as u64, tuning.storage_capacity);
        }
    }

    /// Advances leak decay: while unfrozen and leaked, the counter recovers
    /// one step every `leak_decay_interval / regeneration_multiplier` seconds.
    pub(crate) fn decay(&mut self, dt: f32, tuning: &EconomyTuning) {
        if self.frozen || self.leak_counter == 0 || tuning.regeneration_multiplier <= 0.0 {
            self.decay_timer = 0.0;
            return;
        }
        let interval = tuning.leak_decay_interval / tuning.regeneration_multiplier;
        self.decay_timer += dt;
        while self.decay_timer >= interval && self.leak_counter > 0 {
            self.decay_timer -= interval;
            self.leak_counter -= 1;
        }
        if self.leak_counter == 0 {
            self.decay_timer = 0.0;
        }
    }

    /// Applies `count` leaks at once, reporting boundary crossings exactly
    /// once even when a single batch crosses both thresholds.
    pub(crate) fn apply_leaks(&mut self, count: u32, tuning: &EconomyTuning) -> LeakOutcome {
        let before = self.efficiency(tuning);
        self.leak_counter = self.leak_counter.saturating_add(count);
        let after = self.efficiency(tuning);

        let warning_crossed =
            before > tuning.warning_threshold && after <= tuning.warning_threshold;
        let froze = before > 0.0 && after <= 0.0;
        if froze {
            self.frozen = true;
            self.freeze_count += 1;
        }
        LeakOutcome {
            leak_counter: self.leak_counter,
            efficiency: after,
            warning_crossed,
            froze,
        }
    }

    /// Resets the leak counter outright, as a boss victory does.
    pub(crate) fn clear_leaks(&mut self) {
        self.leak_counter = 0;
        self.decay_timer = 0.0;
    }

    /// Cost of the flush recovery path at the current balance.
    pub(crate) fn flush_cost(&self, tuning: &EconomyTuning) -> u64 {
        let fractional = (self.hash as f32 * tuning.flush_cost_fraction) as u64;
        fractional.max(tuning.flush_cost_floor)
    }

    /// Clears the freeze, debiting the flush cost when flushing, and resets
    /// the leak counter so efficiency lands on the recovery target.
    pub(crate) fn recover(&mut self, method: RecoveryMethod, tuning: &EconomyTuning) -> u64 {
        let cost = match method {
            RecoveryMethod::Flush => {
                let cost = self.flush_cost(tuning);
                self.debit(cost);
                cost
            }
            RecoveryMethod::MinigameSuccess => 0,
        };
        self.leak_counter =
            leak_count_for(tuning.recovery_target_efficiency, tuning.loss_per_leak);
        self.decay_timer = 0.0;
        self.frozen = false;
        cost
    }
}

/// Continuous threat level plus the overclock buff clock.
#[derive(Clone, Debug)]
pub(crate) struct Threat {
    pub(crate) level: f32,
    /// Seconds the overclock buff has left; zero when inactive.
    pub(crate) overclock_remaining: f32,
}

impl Threat {
    pub(crate) fn new() -> Self {
        Self {
            level: 0.0,
            overclock_remaining: 0.0,
        }
    }

    pub(crate) fn overclock_active(&self) -> bool {
        self.overclock_remaining > 0.0
    }

    pub(crate) fn hash_multiplier(&self, overclock: &OverclockTuning) -> f32 {
        if self.overclock_active() {
            overclock.hash_multiplier
        } else {
            1.0
        }
    }

    pub(crate) fn power_multiplier(&self, overclock: &OverclockTuning) -> f32 {
        if self.overclock_active() {
            overclock.power_multiplier
        } else {
            1.0
        }
    }

    /// Advances threat growth and the overclock clock. Returns true when the
    /// buff expired during this step. Threat grows regardless of freezes.
    pub(crate) fn advance(
        &mut self,
        dt: f32,
        tuning: &ThreatTuning,
        overclock: &OverclockTuning,
    ) -> bool {
        let growth_multiplier = if self.overclock_active() {
            overclock.threat_multiplier
        } else {
            1.0
        };
        self.level = (self.level + tuning.growth_per_second * growth_multiplier * dt)
            .min(tuning.cap);

        if self.overclock_active() {
            self.overclock_remaining = (self.overclock_remaining - dt).max(0.0);
            return self.overclock_remaining == 0.0;
        }
        false
    }

    pub(crate) fn activate_overclock(&mut self, overclock: &OverclockTuning) {
        self.overclock_remaining = overclock.duration;
    }

    /// Removes a fraction of the current threat after a boss victory.
    pub(crate) fn relieve(&mut self, fraction: f32) {
        self.level = (self.level * (1.0 - fraction)).max(0.0);
    }
}
