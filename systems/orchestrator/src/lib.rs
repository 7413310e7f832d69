#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Frame orchestrator: sequences the simulation phases exactly once per tick.
//!
//! Order per tick: externally queued commands, then the clock/boss/movement/
//! leak phase, targeting, ballistics, and finally combat resolution with the
//! economy tick. Commands arriving mid-frame are queued and applied at the
//! start of the next tick so every system reads a consistent snapshot.

use breach_defence_core::{Command, Event, TowerTarget};
use breach_defence_system_ballistics::Ballistics;
use breach_defence_system_targeting::Targeting;
use breach_defence_world::{apply, query, World};
use std::time::Duration;

/// Owns the pure systems and their scratch buffers, and drives one world.
#[derive(Debug, Default)]
pub struct FrameOrchestrator {
    targeting: Targeting,
    ballistics: Ballistics,
    pending: Vec<Command>,
    targets: Vec<TowerTarget>,
    fire_commands: Vec<Command>,
}

impl FrameOrchestrator {
    /// Creates an orchestrator with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an external command for application at the start of the next
    /// tick. Commands are never injected mid-tick.
    pub fn queue(&mut self, command: Command) {
        self.pending.push(command);
    }

    /// Runs one full simulation tick, appending the frame's event batch.
    pub fn tick(&mut self, world: &mut World, dt: Duration, out_events: &mut Vec<Event>) {
        for command in self.pending.drain(..) {
            apply(world, command, out_events);
        }

        apply(world, Command::Tick { dt }, out_events);

        let towers = query::tower_view(world);
        let enemies = query::enemy_view(world);
        self.targeting.handle(
            &towers,
            &enemies,
            query::spatial_index(world),
            &mut self.targets,
        );
        self.fire_commands.clear();
        self.ballistics.handle(
            &towers,
            &enemies,
            &self.targets,
            &query::balance(world).targeting,
            |lane, progress| query::lane(world, lane).map(|l| l.position_at(progress)),
            &mut self.fire_commands,
        );
        for command in self.fire_commands.drain(..) {
            apply(world, command, out_events);
        }

        apply(world, Command::ResolveCombat { dt }, out_events);
    }
}
