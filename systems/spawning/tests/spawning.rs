use std::time::Duration;

use tile_defence_core::{Command, EnemyKind, Event, TileCoord, Tint};
use tile_defence_system_spawning::{Milestone, Scenario, ScenarioConfig, SpawnSequence, Wave};

const GATES: [TileCoord; 2] = [TileCoord::new(0, 0), TileCoord::new(4, 4)];

fn wave(sequences: &[(EnemyKind, u32, f32)]) -> Wave {
    Wave {
        sequences: sequences
            .iter()
            .map(|&(kind, amount, cooldown)| SpawnSequence {
                kind,
                amount,
                cooldown,
            })
            .collect(),
    }
}

fn tick(scenario: &mut Scenario, seconds: f32, spawn_points: &[TileCoord]) -> (Vec<Command>, Vec<Milestone>) {
    let mut commands = Vec::new();
    let mut milestones = Vec::new();
    scenario.handle(
        &[Event::TimeAdvanced {
            dt: Duration::from_secs_f32(seconds),
        }],
        spawn_points,
        &mut commands,
        &mut milestones,
    );
    (commands, milestones)
}

/// Ticks `count` times, recording the one-based tick of every spawn and
/// milestone.
fn play(
    scenario: &mut Scenario,
    seconds: f32,
    count: usize,
) -> (Vec<(usize, EnemyKind)>, Vec<(usize, Milestone)>) {
    let mut spawns = Vec::new();
    let mut milestones = Vec::new();
    for number in 1..=count {
        let (commands, reached) = tick(scenario, seconds, &GATES);
        for command in commands {
            match command {
                Command::SpawnEnemy {
                    spawn_point, kind, ..
                } => {
                    assert!(GATES.contains(&spawn_point));
                    spawns.push((number, kind));
                }
                other => panic!("unexpected command emitted: {other:?}"),
            }
        }
        milestones.extend(reached.into_iter().map(|milestone| (number, milestone)));
    }
    (spawns, milestones)
}

#[test]
fn waves_play_in_order_after_the_initial_delay() {
    let mut scenario = Scenario::new(ScenarioConfig {
        initial_delay: 2.0,
        wave_delay: 1.0,
        cycles: 1,
        waves: vec![
            wave(&[(EnemyKind::Small, 2, 0.5)]),
            wave(&[(EnemyKind::Large, 1, 1.0)]),
        ],
        ..ScenarioConfig::default()
    });

    let (spawns, milestones) = play(&mut scenario, 0.25, 24);

    assert_eq!(
        spawns,
        vec![
            (8, EnemyKind::Small),
            (10, EnemyKind::Small),
            (16, EnemyKind::Large)
        ]
    );
    assert_eq!(
        milestones,
        vec![
            (8, Milestone::WaveStarted { cycle: 0, wave: 0 }),
            (16, Milestone::WaveStarted { cycle: 0, wave: 1 }),
            (20, Milestone::Exhausted),
        ]
    );
    assert!(scenario.is_exhausted());
}

#[test]
fn every_cycle_runs_faster() {
    let mut scenario = Scenario::new(ScenarioConfig {
        initial_delay: 0.0,
        wave_delay: 0.0,
        cycles: 2,
        cycle_speed_up: 1.0,
        waves: vec![wave(&[(EnemyKind::Small, 2, 1.0)])],
        ..ScenarioConfig::default()
    });

    let (spawns, milestones) = play(&mut scenario, 0.5, 8);

    let ticks: Vec<usize> = spawns.iter().map(|(number, _)| *number).collect();
    assert_eq!(ticks, vec![1, 2, 4, 5], "the second cycle spawns twice as fast");
    assert_eq!(
        milestones,
        vec![
            (1, Milestone::WaveStarted { cycle: 0, wave: 0 }),
            (4, Milestone::WaveStarted { cycle: 1, wave: 0 }),
            (6, Milestone::Exhausted),
        ]
    );
    assert_eq!(scenario.time_scale(), 2.0);
}

#[test]
fn endless_scenarios_keep_accelerating() {
    let mut scenario = Scenario::new(ScenarioConfig {
        initial_delay: 0.0,
        wave_delay: 0.0,
        cycles: 0,
        cycle_speed_up: 0.5,
        waves: vec![wave(&[(EnemyKind::Medium, 1, 1.0)])],
        ..ScenarioConfig::default()
    });

    let (spawns, milestones) = play(&mut scenario, 1.0, 10);

    assert!(!scenario.is_exhausted());
    assert!(!milestones
        .iter()
        .any(|(_, milestone)| *milestone == Milestone::Exhausted));
    assert!(scenario.cycle() >= 3);
    assert!(scenario.time_scale() > 2.0);
    assert!(spawns.len() > 10, "spawns outpace the wall clock");
}

#[test]
fn time_does_not_accumulate_without_spawn_points() {
    let mut scenario = Scenario::new(ScenarioConfig {
        initial_delay: 1.0,
        waves: vec![wave(&[(EnemyKind::Small, 3, 1.0)])],
        ..ScenarioConfig::default()
    });

    for _ in 0..4 {
        let (commands, milestones) = tick(&mut scenario, 0.5, &[]);
        assert!(commands.is_empty(), "no spawn point, no spawn");
        assert!(milestones.is_empty());
    }
    assert_eq!(scenario.delay_remaining(), 1.0, "time without spawn points is not banked");

    let (commands, _) = tick(&mut scenario, 0.5, &GATES);
    assert!(commands.is_empty());
    let (commands, milestones) = tick(&mut scenario, 0.5, &GATES);
    assert_eq!(commands.len(), 1, "expected a spawn once the delay ran out");
    assert_eq!(milestones, vec![Milestone::WaveStarted { cycle: 0, wave: 0 }]);
}

#[test]
fn large_steps_release_the_whole_wave_with_cycling_tints() {
    let mut scenario = Scenario::new(ScenarioConfig {
        initial_delay: 0.0,
        cycles: 1,
        waves: vec![wave(&[(EnemyKind::Medium, 4, 0.5)])],
        ..ScenarioConfig::default()
    });

    let (commands, milestones) = tick(&mut scenario, 10.0, &GATES);

    let expected_tints = [
        Tint::from_rgb(0x2f, 0x95, 0x32),
        Tint::from_rgb(0xc8, 0x2a, 0x36),
        Tint::from_rgb(0xff, 0xc1, 0x07),
        Tint::from_rgb(0x58, 0x47, 0xff),
    ];
    assert_eq!(commands.len(), 4, "expected one spawn per enemy of the wave");
    for (command, expected_tint) in commands.iter().zip(expected_tints) {
        match command {
            Command::SpawnEnemy { kind, tint, .. } => {
                assert_eq!(*kind, EnemyKind::Medium);
                assert_eq!(*tint, expected_tint);
            }
            other => panic!("unexpected command emitted: {other:?}"),
        }
    }
    assert_eq!(
        milestones,
        vec![
            Milestone::WaveStarted { cycle: 0, wave: 0 },
            Milestone::Exhausted
        ]
    );

    let (commands, milestones) = tick(&mut scenario, 10.0, &GATES);
    assert!(commands.is_empty() && milestones.is_empty(), "exhausted scenarios stay quiet");
}

#[test]
fn scenarios_without_enemies_end_on_the_first_tick() {
    let mut scenario = Scenario::new(ScenarioConfig {
        cycles: 0,
        waves: vec![wave(&[(EnemyKind::Small, 0, 1.0)]), Wave::default()],
        ..ScenarioConfig::default()
    });
    let (commands, milestones) = tick(&mut scenario, 0.1, &GATES);
    assert!(commands.is_empty());
    assert_eq!(milestones, vec![Milestone::Exhausted]);
}

#[test]
fn deterministic_replay_produces_identical_sequence() {
    let replay = || {
        let mut scenario = Scenario::new(ScenarioConfig::default());
        let mut released = Vec::new();
        for millis in [500, 500, 1_000, 2_000, 250, 250, 4_000, 8_000] {
            let (commands, _) = tick(&mut scenario, millis as f32 / 1000.0, &GATES);
            released.extend(commands);
        }
        released
    };

    let first = replay();
    assert!(!first.is_empty());
    assert_eq!(first, replay(), "replay diverged between runs");
}
