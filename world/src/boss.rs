//! Boss encounter lifecycle: milestone-triggered spawning, engagement,
//! and the terminal transitions back to idle.

use breach_defence_core::{
    config::BossTuning, ActiveBoss, BossDifficulty, BossKind, EnemyId, EngageError, LaneId,
    OutcomeError,
};

/// Identity of the boss currently walking or engaged.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct ActiveEncounter {
    pub(crate) enemy: EnemyId,
    pub(crate) kind: BossKind,
    pub(crate) lane: LaneId,
    pub(crate) engaged: bool,
    pub(crate) difficulty: Option<BossDifficulty>,
}

/// The lifecycle state machine. Spawning, rewards, and threat relief touch
/// the wider world and are orchestrated by `apply`; this struct owns only
/// the transitions and their bookkeeping.
#[derive(Clone, Debug)]
pub(crate) struct BossState {
    pub(crate) active: Option<ActiveEncounter>,
    /// Seconds until the next spawn trigger may fire.
    pub(crate) cooldown: f32,
    pub(crate) next_milestone: f32,
    /// Total bosses spawned, driving lane and kind rotation.
    spawn_count: u32,
    pub(crate) defeated_lanes: Vec<LaneId>,
}

impl BossState {
    pub(crate) fn new(tuning: &BossTuning) -> Self {
        Self {
            active: None,
            cooldown: 0.0,
            next_milestone: tuning.first_milestone,
            spawn_count: 0,
            defeated_lanes: Vec::new(),
        }
    }

    pub(crate) fn tick_cooldown(&mut self, dt: f32) {
        self.cooldown = (self.cooldown - dt).max(0.0);
    }

    /// True when the threat milestone has been reached and no encounter or
    /// cooldown blocks a new spawn.
    pub(crate) fn should_spawn(&self, threat_level: f32) -> bool {
        self.active.is_none() && self.cooldown <= 0.0 && threat_level >= self.next_milestone
    }

    /// Picks the next lane and boss kind by cycling both rotations, consumes
    /// the milestone, and advances it by the configured interval.
    pub(crate) fn next_spawn(
        &mut self,
        unlocked_lanes: u32,
        tuning: &BossTuning,
    ) -> (BossKind, LaneId) {
        let lane = LaneId::new(self.spawn_count % unlocked_lanes.max(1));
        let kind = BossKind::ROTATION[self.spawn_count as usize % BossKind::ROTATION.len()];
        self.spawn_count += 1;
        self.next_milestone += tuning.milestone_interval;
        (kind, lane)
    }

    pub(crate) fn record_spawn(&mut self, enemy: EnemyId, kind: BossKind, lane: LaneId) {
        self.active = Some(ActiveEncounter {
            enemy,
            kind,
            lane,
            engaged: false,
            difficulty: None,
        });
    }

    pub(crate) fn engage(
        &mut self,
        difficulty: BossDifficulty,
    ) -> Result<ActiveEncounter, EngageError> {
        let Some(active) = self.active.as_mut() else {
            return Err(EngageError::NoActiveBoss);
        };
        if active.engaged {
            return Err(EngageError::AlreadyEngaged);
        }
        active.engaged = true;
        active.difficulty = Some(difficulty);
        Ok(*active)
    }

    pub(crate) fn engaged(&self) -> Result<ActiveEncounter, OutcomeError> {
        self.active
            .filter(|active| active.engaged)
            .ok_or(OutcomeError::NoEngagedBoss)
    }

    /// The enemy id held in place while its encounter runs.
    pub(crate) fn held_enemy(&self) -> Option<EnemyId> {
        self.active
            .filter(|active| active.engaged)
            .map(|active| active.enemy)
    }

    /// Clears the encounter after a victory: marks the lane defeated and
    /// starts the post-victory cooldown. Reward, threat relief, and the
    /// milestone realignment happen in the caller.
    pub(crate) fn complete_victory(&mut self, tuning: &BossTuning) -> Option<ActiveEncounter> {
        let active = self.active.take()?;
        if !self.defeated_lanes.contains(&active.lane) {
            self.defeated_lanes.push(active.lane);
        }
        self.cooldown = tuning.victory_cooldown;
        Some(active)
    }

    /// Clears the encounter after a loss or an ignored walk to the core and
    /// starts the shorter post-ignore cooldown.
    pub(crate) fn complete_departure(&mut self, tuning: &BossTuning) -> Option<ActiveEncounter> {
        let active = self.active.take()?;
        self.cooldown = tuning.ignore_cooldown;
        Some(active)
    }

    /// Re-aims the milestone after threat relief so the next boss spawns one
    /// full interval above the relieved level.
    pub(crate) fn realign_milestone(&mut self, threat_level: f32, tuning: &BossTuning) {
        self.next_milestone = threat_level + tuning.milestone_interval;
    }

    pub(crate) fn snapshot(&self) -> (Option<ActiveBoss>, f32, Vec<LaneId>) {
        let active = self.active.map(|active| ActiveBoss {
            enemy: active.enemy,
            kind: active.kind,
            lane: active.lane,
            engaged: active.engaged,
            difficulty: active.difficulty,
        });
        (active, self.cooldown, self.defeated_lanes.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::BossState;
    use breach_defence_core::{
        config::BossTuning, BossDifficulty, BossKind, EnemyId, EngageError, LaneId, OutcomeError,
    };

    fn tuning() -> BossTuning {
        BossTuning::default()
    }

    #[test]
    fn spawn_trigger_requires_milestone_and_clear_cooldown() {
        let tuning = tuning();
        let mut state = BossState::new(&tuning);
        assert!(!state.should_spawn(tuning.first_milestone - 1.0));
        assert!(state.should_spawn(tuning.first_milestone));

        state.cooldown = 10.0;
        assert!(!state.should_spawn(tuning.first_milestone));
        state.tick_cooldown(10.0);
        assert!(state.should_spawn(tuning.first_milestone));
    }

    #[test]
    fn spawns_cycle_lanes_and_kinds() {
        let tuning = tuning();
        let mut state = BossState::new(&tuning);

        let (first_kind, first_lane) = state.next_spawn(2, &tuning);
        state.record_spawn(EnemyId::new(1), first_kind, first_lane);
        assert_eq!(first_kind, BossKind::ROTATION[0]);
        assert_eq!(first_lane, LaneId::new(0));
        let _ = state.complete_departure(&tuning);

        let (second_kind, second_lane) = state.next_spawn(2, &tuning);
        assert_eq!(second_kind, BossKind::ROTATION[1]);
        assert_eq!(second_lane, LaneId::new(1));
    }

    #[test]
    fn milestone_advances_on_spawn() {
        let tuning = tuning();
        let mut state = BossState::new(&tuning);
        let before = state.next_milestone;
        let _ = state.next_spawn(1, &tuning);
        assert_eq!(state.next_milestone, before + tuning.milestone_interval);
    }

    #[test]
    fn engage_requires_a_walking_boss() {
        let tuning = tuning();
        let mut state = BossState::new(&tuning);
        assert_eq!(
            state.engage(BossDifficulty::Standard),
            Err(EngageError::NoActiveBoss)
        );

        state.record_spawn(EnemyId::new(4), BossKind::Cyberboss, LaneId::new(0));
        let engaged = state.engage(BossDifficulty::Hard).expect("engage");
        assert_eq!(engaged.difficulty, Some(BossDifficulty::Hard));
        assert_eq!(state.held_enemy(), Some(EnemyId::new(4)));

        assert_eq!(
            state.engage(BossDifficulty::Standard),
            Err(EngageError::AlreadyEngaged)
        );
    }

    #[test]
    fn outcome_requires_an_engaged_boss() {
        let tuning = tuning();
        let mut state = BossState::new(&tuning);
        assert_eq!(state.engaged(), Err(OutcomeError::NoEngagedBoss));

        state.record_spawn(EnemyId::new(4), BossKind::ZeroDay, LaneId::new(0));
        // Walking but unengaged still rejects outcome reports.
        assert_eq!(state.engaged(), Err(OutcomeError::NoEngagedBoss));
    }

    #[test]
    fn victory_marks_lane_defeated_and_starts_cooldown() {
        let tuning = tuning();
        let mut state = BossState::new(&tuning);
        state.record_spawn(EnemyId::new(4), BossKind::Cyberboss, LaneId::new(1));
        let _ = state.engage(BossDifficulty::Standard).expect("engage");

        let finished = state.complete_victory(&tuning).expect("victory");
        assert_eq!(finished.lane, LaneId::new(1));
        assert!(state.active.is_none());
        assert_eq!(state.cooldown, tuning.victory_cooldown);
        assert_eq!(state.defeated_lanes, vec![LaneId::new(1)]);

        // A repeat victory on the same lane does not duplicate the entry.
        state.record_spawn(EnemyId::new(9), BossKind::ZeroDay, LaneId::new(1));
        let _ = state.complete_victory(&tuning);
        assert_eq!(state.defeated_lanes, vec![LaneId::new(1)]);
    }

    #[test]
    fn departure_starts_the_shorter_cooldown() {
        let tuning = tuning();
        let mut state = BossState::new(&tuning);
        state.record_spawn(EnemyId::new(4), BossKind::VoidPylon, LaneId::new(0));
        let departed = state.complete_departure(&tuning).expect("departure");
        assert_eq!(departed.kind, BossKind::VoidPylon);
        assert!(state.active.is_none());
        assert_eq!(state.cooldown, tuning.ignore_cooldown);
        assert!(state.defeated_lanes.is_empty());
    }
}
