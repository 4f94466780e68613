#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave scenario that decides when and where enemies enter the board.
//!
//! A [`Scenario`] plays the waves of a [`ScenarioConfig`] against the
//! simulation clock. It reads `TimeAdvanced` events and answers with
//! `SpawnEnemy` commands plus [`Milestone`]s the caller reports onward. The
//! clock only runs while the board has a spawn point, so a board without one
//! never banks a burst of enemies.

mod config;
mod save;

use tile_defence_core::{Command, Event, TileCoord, Tint};
use tracing::{debug, info, trace};

pub use config::{ScenarioConfig, SpawnSequence, Wave, MIN_COOLDOWN};

const RNG_MULTIPLIER: u64 = 6_364_136_223_846_793_005;
const RNG_INCREMENT: u64 = 1;
const SPAWN_TINTS: [Tint; 4] = [
    Tint::from_rgb(0x2f, 0x95, 0x32),
    Tint::from_rgb(0xc8, 0x2a, 0x36),
    Tint::from_rgb(0xff, 0xc1, 0x07),
    Tint::from_rgb(0x58, 0x47, 0xff),
];

/// Points of interest the scenario passes while it plays.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Milestone {
    /// The first enemy of a wave is about to be released.
    WaveStarted {
        /// Zero-based pass through the waves.
        cycle: u32,
        /// Zero-based wave within the cycle.
        wave: u32,
    },
    /// Every wave of every cycle has been released.
    Exhausted,
}

/// Progress of a scenario through its waves.
#[derive(Clone, Debug, PartialEq)]
pub struct Scenario {
    config: ScenarioConfig,
    cycle: u32,
    wave: u32,
    sequence: u32,
    spawned: u32,
    cooldown: f32,
    delay: f32,
    time_scale: f32,
    wave_running: bool,
    exhausted: bool,
    rng_state: u64,
    tint_index: u32,
}

impl Scenario {
    /// Starts a scenario waiting out its initial delay.
    #[must_use]
    pub fn new(config: ScenarioConfig) -> Self {
        Self {
            cycle: 0,
            wave: 0,
            sequence: 0,
            spawned: 0,
            cooldown: 0.0,
            delay: non_negative(config.initial_delay),
            time_scale: 1.0,
            wave_running: false,
            exhausted: false,
            rng_state: config.seed,
            tint_index: 0,
            config,
        }
    }

    /// Consumes simulation events and emits the spawns they make due.
    ///
    /// A scenario without a single enemy to release is exhausted on the
    /// first tick that reaches it.
    pub fn handle(
        &mut self,
        events: &[Event],
        spawn_points: &[TileCoord],
        out: &mut Vec<Command>,
        milestones: &mut Vec<Milestone>,
    ) {
        if self.exhausted || spawn_points.is_empty() {
            return;
        }

        let elapsed: f32 = events
            .iter()
            .filter_map(|event| match event {
                Event::TimeAdvanced { dt } => Some(dt.as_secs_f32()),
                _ => None,
            })
            .sum();
        if elapsed <= 0.0 {
            return;
        }
        if self.config.total_per_cycle() == 0 {
            self.finish(milestones);
            return;
        }

        let mut dt = elapsed * self.time_scale;
        loop {
            if self.delay > 0.0 {
                if dt < self.delay {
                    self.delay -= dt;
                    return;
                }
                dt -= self.delay;
                self.delay = 0.0;
            }

            if !self.wave_running {
                self.begin_wave(milestones);
            }
            let Some(left) = self.progress_wave(dt, spawn_points, out) else {
                return;
            };
            dt = left;

            self.wave_running = false;
            self.wave += 1;
            if self.wave as usize >= self.config.waves.len() {
                self.cycle += 1;
                if self.config.cycles > 0 && self.cycle >= self.config.cycles {
                    self.finish(milestones);
                    return;
                }
                self.wave = 0;
                self.time_scale += self.config.cycle_speed_up.max(0.0);
                info!(cycle = self.cycle, time_scale = self.time_scale, "scenario cycle started");
            }
            self.delay = non_negative(self.config.wave_delay);
        }
    }

    fn begin_wave(&mut self, milestones: &mut Vec<Milestone>) {
        self.wave_running = true;
        self.sequence = 0;
        self.begin_sequence();
        debug!(cycle = self.cycle, wave = self.wave, "wave started");
        milestones.push(Milestone::WaveStarted {
            cycle: self.cycle,
            wave: self.wave,
        });
    }

    fn begin_sequence(&mut self) {
        self.spawned = 0;
        self.cooldown = self.current_sequence().map_or(0.0, |sequence| sequence.step());
    }

    fn current_sequence(&self) -> Option<&SpawnSequence> {
        self.config
            .waves
            .get(self.wave as usize)
            .and_then(|wave| wave.sequences.get(self.sequence as usize))
    }

    /// Plays `dt` seconds of the running wave, returning the seconds left
    /// over once its last sequence is through.
    fn progress_wave(
        &mut self,
        mut dt: f32,
        spawn_points: &[TileCoord],
        out: &mut Vec<Command>,
    ) -> Option<f32> {
        while let Some(sequence) = self.current_sequence().copied() {
            dt = self.progress_sequence(&sequence, dt, spawn_points, out)?;
            self.sequence += 1;
            self.begin_sequence();
        }
        Some(dt)
    }

    fn progress_sequence(
        &mut self,
        sequence: &SpawnSequence,
        dt: f32,
        spawn_points: &[TileCoord],
        out: &mut Vec<Command>,
    ) -> Option<f32> {
        let step = sequence.step();
        self.cooldown += dt;
        while self.cooldown >= step {
            self.cooldown -= step;
            if self.spawned >= sequence.amount {
                return Some(self.cooldown);
            }
            self.spawned += 1;
            let spawn_point = self.select_spawn_point(spawn_points);
            let tint = self.next_tint();
            trace!(?spawn_point, kind = ?sequence.kind, "requesting spawn");
            out.push(Command::SpawnEnemy {
                spawn_point,
                kind: sequence.kind,
                tint,
            });
        }
        None
    }

    fn finish(&mut self, milestones: &mut Vec<Milestone>) {
        self.exhausted = true;
        info!(cycles = self.cycle, "scenario exhausted");
        milestones.push(Milestone::Exhausted);
    }

    fn select_spawn_point(&mut self, spawn_points: &[TileCoord]) -> TileCoord {
        debug_assert!(!spawn_points.is_empty(), "select_spawn_point requires spawn points");
        self.rng_state = self
            .rng_state
            .wrapping_mul(RNG_MULTIPLIER)
            .wrapping_add(RNG_INCREMENT);
        let index = (self.rng_state % spawn_points.len() as u64) as usize;
        spawn_points[index]
    }

    fn next_tint(&mut self) -> Tint {
        let tint = SPAWN_TINTS[self.tint_index as usize % SPAWN_TINTS.len()];
        self.tint_index = (self.tint_index + 1) % SPAWN_TINTS.len() as u32;
        tint
    }

    /// Waves and timings being played.
    #[must_use]
    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    /// Zero-based pass through the waves.
    #[must_use]
    pub fn cycle(&self) -> u32 {
        self.cycle
    }

    /// Zero-based wave that is running or comes next.
    #[must_use]
    pub fn wave(&self) -> u32 {
        self.wave
    }

    /// Multiplier applied to the clock; grows with every cycle.
    #[must_use]
    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Seconds of delay left before the next wave, measured on the scaled clock.
    #[must_use]
    pub fn delay_remaining(&self) -> f32 {
        self.delay
    }

    /// Whether every wave of every cycle has been released.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

fn non_negative(seconds: f32) -> f32 {
    if seconds.is_finite() {
        seconds.max(0.0)
    } else {
        0.0
    }
}
