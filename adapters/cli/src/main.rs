#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless command-line driver for the Breach Defence simulation core.
//!
//! Runs a scripted session on a built-in demo level: a deterministic
//! seeded spawner stands in for the external idle spawn policy, and a
//! greedy builder places firewalls whenever the hash balance allows.
//! Events stream to stdout; the final state prints as a JSON summary.

use anyhow::{Context, Result};
use breach_defence_core::{
    config::BalanceTable, Bounds, Command, EconomySnapshot, EnemyKind, Event, LaneId,
    ProtocolKind, RecoveryMethod, SlotDescriptor, SlotId, SpawnSource, ThreatSnapshot,
};
use breach_defence_system_offline::extrapolate;
use breach_defence_system_orchestrator::FrameOrchestrator;
use breach_defence_world::{query, World};
use clap::Parser;
use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Headless driver for the Breach Defence simulation core.
#[derive(Debug, Parser)]
#[command(name = "breach-defence", version, about)]
struct Args {
    /// Balance table JSON; the shipped defaults apply when omitted.
    #[arg(long)]
    balance: Option<PathBuf>,
    /// Seed for the deterministic demo spawner.
    #[arg(long, default_value_t = 0x_b2ea_c4)]
    seed: u64,
    /// Number of simulation ticks to run.
    #[arg(long, default_value_t = 1_200)]
    ticks: u32,
    /// Milliseconds of simulated time per tick.
    #[arg(long, default_value_t = 50)]
    tick_ms: u64,
    /// Extrapolate this many offline hours from the final state.
    #[arg(long)]
    offline_hours: Option<f32>,
    /// Suppress the per-tick event log and print only the summary.
    #[arg(long)]
    quiet: bool,
}

/// Final state of a scripted session.
#[derive(Debug, PartialEq, Serialize)]
struct SessionSummary {
    ticks: u32,
    kills: u32,
    leaks: u32,
    towers: u32,
    economy: EconomySnapshot,
    threat: ThreatSnapshot,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let balance = load_balance(args.balance.as_deref())?;
    let dt = Duration::from_millis(args.tick_ms);

    let mut world = World::new(balance);
    let summary = run_session(&mut world, args.seed, args.ticks, dt, args.quiet);
    println!("{}", serde_json::to_string_pretty(&summary)?);

    if let Some(hours) = args.offline_hours {
        let snapshot = query::offline_snapshot(&world);
        let elapsed = Duration::from_secs_f32(hours * 3_600.0);
        let report = extrapolate(&snapshot, query::balance(&world), elapsed);
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}

fn load_balance(path: Option<&Path>) -> Result<BalanceTable> {
    let Some(path) = path else {
        return Ok(BalanceTable::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading balance table {}", path.display()))?;
    BalanceTable::from_json_str(&text)
        .with_context(|| format!("parsing balance table {}", path.display()))
}

const DEMO_SLOTS: [SlotId; 4] = [
    SlotId::new(0),
    SlotId::new(1),
    SlotId::new(2),
    SlotId::new(3),
];

fn demo_level() -> Command {
    Command::ConfigureLevel {
        lanes: vec![
            vec![
                Vec2::new(40.0, 120.0),
                Vec2::new(420.0, 120.0),
                Vec2::new(420.0, 320.0),
                Vec2::new(860.0, 320.0),
            ],
            vec![Vec2::new(40.0, 480.0), Vec2::new(860.0, 480.0)],
        ],
        slots: vec![
            SlotDescriptor {
                id: DEMO_SLOTS[0],
                position: Vec2::new(300.0, 180.0),
            },
            SlotDescriptor {
                id: DEMO_SLOTS[1],
                position: Vec2::new(480.0, 260.0),
            },
            SlotDescriptor {
                id: DEMO_SLOTS[2],
                position: Vec2::new(620.0, 400.0),
            },
            SlotDescriptor {
                id: DEMO_SLOTS[3],
                position: Vec2::new(300.0, 420.0),
            },
        ],
        bounds: Bounds::new(Vec2::ZERO, Vec2::new(900.0, 600.0)),
        unlocked_lanes: 2,
    }
}

fn run_session(world: &mut World, seed: u64, ticks: u32, dt: Duration, quiet: bool) -> SessionSummary {
    let mut orchestrator = FrameOrchestrator::new();
    orchestrator.queue(demo_level());

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut events = Vec::new();
    let mut kills = 0;
    let mut leaks = 0;

    for frame in 0..ticks {
        queue_driver_commands(&mut orchestrator, world, &mut rng, dt);
        events.clear();
        orchestrator.tick(world, dt, &mut events);
        for event in &events {
            match event {
                Event::EnemyKilled { .. } => kills += 1,
                Event::EnemyLeaked { .. } => leaks += 1,
                _ => {}
            }
            if !quiet {
                println!("[{frame:05}] {event:?}");
            }
        }
    }

    SessionSummary {
        ticks,
        kills,
        leaks,
        towers: query::tower_view(world).into_vec().len() as u32,
        economy: query::economy_snapshot(world),
        threat: query::threat_snapshot(world),
    }
}

/// Queues the demo driver's commands for the next tick: flush recovery when
/// frozen, otherwise a chance-based spawn plus a greedy firewall build.
fn queue_driver_commands(
    orchestrator: &mut FrameOrchestrator,
    world: &World,
    rng: &mut ChaCha8Rng,
    dt: Duration,
) {
    let economy = query::economy_snapshot(world);
    if economy.frozen {
        // The idle spawner halts while frozen; the driver always pays the
        // flush so the session keeps moving.
        orchestrator.queue(Command::RequestFreezeRecovery {
            method: RecoveryMethod::Flush,
        });
        return;
    }

    // The level command is still pending on the very first frame.
    let unlocked = query::unlocked_lanes(world);
    if unlocked == 0 {
        return;
    }

    let threat = query::threat_snapshot(world);
    let spawns_per_second = 0.4 + threat.level * 0.02;
    let chance = f64::from(spawns_per_second * dt.as_secs_f32()).min(1.0);
    if rng.gen_bool(chance) {
        let kind = EnemyKind::ALL[rng.gen_range(0..EnemyKind::ALL.len())];
        let lane = LaneId::new(rng.gen_range(0..unlocked));
        orchestrator.queue(Command::SpawnEnemy {
            kind,
            lane,
            source: SpawnSource::Idle,
        });
    }

    let cost = query::balance(world)
        .protocols
        .stats(ProtocolKind::Firewall)
        .cost;
    if economy.hash >= cost {
        let towers = query::tower_view(world);
        let free = DEMO_SLOTS
            .iter()
            .find(|slot| towers.iter().all(|tower| tower.slot != **slot));
        if let Some(slot) = free {
            orchestrator.queue(Command::PlaceTower {
                protocol: ProtocolKind::Firewall,
                slot: *slot,
            });
        }
    }
}
