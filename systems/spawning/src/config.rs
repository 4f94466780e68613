//! Scenario tables read from configuration files.

use serde::{Deserialize, Serialize};
use tile_defence_core::EnemyKind;

/// Shortest pause between two spawns of a sequence, in seconds.
pub const MIN_COOLDOWN: f32 = 0.01;

/// Run of identical enemies released at a steady pace.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnSequence {
    /// Kind of every enemy in the run.
    pub kind: EnemyKind,
    /// Number of enemies released.
    pub amount: u32,
    /// Seconds between two releases.
    pub cooldown: f32,
}

impl SpawnSequence {
    /// Seconds between releases, never shorter than [`MIN_COOLDOWN`].
    #[must_use]
    pub fn step(&self) -> f32 {
        if self.cooldown.is_finite() {
            self.cooldown.max(MIN_COOLDOWN)
        } else {
            MIN_COOLDOWN
        }
    }
}

impl Default for SpawnSequence {
    fn default() -> Self {
        Self {
            kind: EnemyKind::Medium,
            amount: 10,
            cooldown: 1.0,
        }
    }
}

/// Sequences played back to back.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Wave {
    /// Sequences in release order.
    pub sequences: Vec<SpawnSequence>,
}

impl Wave {
    /// Enemies released over the whole wave.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.sequences
            .iter()
            .map(|sequence| u64::from(sequence.amount))
            .sum()
    }
}

/// Timeline of waves the enemy sends at the player.
///
/// Waves play in order; once the last one is through the scenario starts
/// over one cycle later and faster, until `cycles` cycles have run. Zero
/// cycles repeats forever.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    /// Seconds of peace before the first wave.
    pub initial_delay: f32,
    /// Seconds between the end of one wave and the start of the next.
    pub wave_delay: f32,
    /// Number of passes through the waves; zero never ends.
    pub cycles: u32,
    /// Added to the time scale at the start of every new cycle.
    pub cycle_speed_up: f32,
    /// Seed of the stream that picks spawn points.
    pub seed: u64,
    /// Waves in play order.
    pub waves: Vec<Wave>,
}

impl ScenarioConfig {
    /// Enemies released over one cycle.
    #[must_use]
    pub fn total_per_cycle(&self) -> u64 {
        self.waves.iter().map(Wave::total).sum()
    }
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        let sequence = |kind, amount, cooldown| SpawnSequence {
            kind,
            amount,
            cooldown,
        };
        Self {
            initial_delay: 5.0,
            wave_delay: 10.0,
            cycles: 1,
            cycle_speed_up: 0.5,
            seed: 0x4d59_5df4_d0f3_3173,
            waves: vec![
                Wave {
                    sequences: vec![sequence(EnemyKind::Medium, 10, 1.5)],
                },
                Wave {
                    sequences: vec![
                        sequence(EnemyKind::Small, 12, 0.75),
                        sequence(EnemyKind::Medium, 6, 1.5),
                    ],
                },
                Wave {
                    sequences: vec![
                        sequence(EnemyKind::Large, 4, 3.0),
                        sequence(EnemyKind::Small, 20, 0.5),
                    ],
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_never_drop_below_the_minimum() {
        let mut sequence = SpawnSequence::default();
        sequence.cooldown = 0.0;
        assert_eq!(sequence.step(), MIN_COOLDOWN);
        sequence.cooldown = f32::NAN;
        assert_eq!(sequence.step(), MIN_COOLDOWN);
        sequence.cooldown = 2.5;
        assert_eq!(sequence.step(), 2.5);
    }

    #[test]
    fn tables_parse_with_defaults() {
        let config: ScenarioConfig = toml::from_str(
            "cycles = 3\n[[waves]]\n[[waves.sequences]]\nkind = \"Large\"\namount = 2\n",
        )
        .expect("parse");
        assert_eq!(config.cycles, 3);
        assert_eq!(config.wave_delay, 10.0);
        assert_eq!(config.waves.len(), 1);
        assert_eq!(config.waves[0].sequences[0].kind, EnemyKind::Large);
        assert_eq!(config.waves[0].sequences[0].cooldown, 1.0);
        assert_eq!(config.total_per_cycle(), 2);
    }
}
