use breach_defence_core::{
    config::BalanceTable, Bounds, Command, EnemyId, EnemyKind, LaneId, ProtocolKind,
    SlotDescriptor, SlotId, SpawnSource, TowerId, TowerTarget,
};
use breach_defence_system_ballistics::Ballistics;
use breach_defence_world::{apply, query, World};
use glam::Vec2;
use std::time::Duration;

fn world_with_tower_and_enemy() -> World {
    let mut balance = BalanceTable::default();
    balance.economy.starting_hash = 1_000;
    let mut world = World::new(balance);
    let mut events = Vec::new();
    apply(
        &mut world,
        Command::ConfigureLevel {
            lanes: vec![vec![Vec2::new(0.0, 100.0), Vec2::new(400.0, 100.0)]],
            slots: vec![SlotDescriptor {
                id: SlotId::new(0),
                position: Vec2::new(100.0, 160.0),
            }],
            bounds: Bounds::new(Vec2::ZERO, Vec2::new(400.0, 300.0)),
            unlocked_lanes: 1,
        },
        &mut events,
    );
    apply(
        &mut world,
        Command::PlaceTower {
            protocol: ProtocolKind::Firewall,
            slot: SlotId::new(0),
        },
        &mut events,
    );
    apply(
        &mut world,
        Command::SpawnEnemy {
            kind: EnemyKind::Script,
            lane: LaneId::new(0),
            source: SpawnSource::Idle,
        },
        &mut events,
    );
    apply(
        &mut world,
        Command::Tick {
            dt: Duration::from_secs(1),
        },
        &mut events,
    );
    world
}

fn fire_commands(world: &World) -> Vec<Command> {
    let towers = query::tower_view(world);
    let enemies = query::enemy_view(world);
    let targets: Vec<TowerTarget> = towers
        .iter()
        .filter_map(|tower| {
            enemies.iter().next().map(|enemy| TowerTarget {
                tower: tower.id,
                enemy: enemy.id,
                tower_position: tower.position,
                enemy_position: enemy.position,
            })
        })
        .collect();
    let mut out = Vec::new();
    Ballistics::new().handle(
        &towers,
        &enemies,
        &targets,
        &query::balance(world).targeting,
        |lane, progress| query::lane(world, lane).map(|l| l.position_at(progress)),
        &mut out,
    );
    out
}

#[test]
fn leads_the_target_along_its_lane() {
    let world = world_with_tower_and_enemy();
    let enemies = query::enemy_view(&world);
    let enemy = enemies.iter().next().expect("enemy alive");

    let commands = fire_commands(&world);
    assert_eq!(commands.len(), 1);
    let Command::FireProjectile { aim, .. } = commands[0] else {
        panic!("expected a firing command");
    };
    // The lane runs along +x, so the lead lands ahead of the enemy and
    // stays on the lane's line.
    assert!(aim.x > enemy.position.x);
    assert!((aim.y - enemy.position.y).abs() < 1.0e-3);
}

#[test]
fn prediction_time_is_capped() {
    let world = world_with_tower_and_enemy();
    let enemies = query::enemy_view(&world);
    let enemy = enemies.iter().next().expect("enemy alive");
    let tuning = query::balance(&world).targeting;

    let commands = fire_commands(&world);
    let Command::FireProjectile { aim, .. } = commands[0] else {
        panic!("expected a firing command");
    };
    let max_lead = enemy.speed * tuning.max_prediction_secs;
    assert!(aim.distance(enemy.position) <= max_lead + 1.0e-3);
}

#[test]
fn unready_towers_hold_fire() {
    let mut world = world_with_tower_and_enemy();
    let mut events = Vec::new();
    // Fire once to start the cooldown, then ask again immediately.
    let commands = fire_commands(&world);
    assert_eq!(commands.len(), 1);
    for command in commands {
        apply(&mut world, command, &mut events);
    }
    assert!(fire_commands(&world).is_empty());
}

#[test]
fn stale_references_are_skipped() {
    let world = world_with_tower_and_enemy();
    let towers = query::tower_view(&world);
    let enemies = query::enemy_view(&world);
    let targets = vec![TowerTarget {
        tower: TowerId::new(99),
        enemy: EnemyId::new(99),
        tower_position: Vec2::ZERO,
        enemy_position: Vec2::ZERO,
    }];
    let mut out = Vec::new();
    Ballistics::new().handle(
        &towers,
        &enemies,
        &targets,
        &query::balance(&world).targeting,
        |lane, progress| query::lane(&world, lane).map(|l| l.position_at(progress)),
        &mut out,
    );
    assert!(out.is_empty());
}
