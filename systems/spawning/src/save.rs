//! Scenario progress inside a game save.

use std::io::{Read, Write};

use tile_defence_system_persistence::{GameDataReader, GameDataWriter, SaveError};

use crate::{Scenario, ScenarioConfig, SPAWN_TINTS};

impl Scenario {
    /// Writes the progress of the scenario; the waves themselves are
    /// configuration and stay out of the save.
    ///
    /// # Errors
    ///
    /// Propagates failures of the underlying stream.
    pub fn save<W: Write>(&self, writer: &mut GameDataWriter<W>) -> Result<(), SaveError> {
        writer.write_u32(self.cycle)?;
        writer.write_u32(self.wave)?;
        writer.write_u32(self.sequence)?;
        writer.write_u32(self.spawned)?;
        writer.write_f32(self.cooldown)?;
        writer.write_f32(self.delay)?;
        writer.write_f32(self.time_scale)?;
        writer.write_bool(self.wave_running)?;
        writer.write_bool(self.exhausted)?;
        writer.write_u64(self.rng_state)?;
        writer.write_u32(self.tint_index)
    }

    /// Resumes a scenario of `config` from progress written by
    /// [`Scenario::save`].
    ///
    /// # Errors
    ///
    /// Fails with [`SaveError::Corrupt`] when the progress points past the
    /// configured waves, and with [`SaveError::Io`] when the stream ends early.
    pub fn load<R: Read>(
        config: ScenarioConfig,
        reader: &mut GameDataReader<R>,
    ) -> Result<Self, SaveError> {
        let scenario = Self {
            cycle: reader.read_u32()?,
            wave: reader.read_u32()?,
            sequence: reader.read_u32()?,
            spawned: reader.read_u32()?,
            cooldown: reader.read_f32()?,
            delay: reader.read_f32()?,
            time_scale: reader.read_f32()?,
            wave_running: reader.read_bool()?,
            exhausted: reader.read_bool()?,
            rng_state: reader.read_u64()?,
            tint_index: reader.read_u32()?,
            config,
        };
        scenario.validate()?;
        Ok(scenario)
    }

    fn validate(&self) -> Result<(), SaveError> {
        let timings = [self.cooldown, self.delay, self.time_scale];
        if timings.iter().any(|value| !value.is_finite() || *value < 0.0) {
            return Err(SaveError::corrupt("scenario timer out of range"));
        }
        if self.tint_index as usize >= SPAWN_TINTS.len() {
            return Err(SaveError::corrupt(format!(
                "scenario tint {} out of range",
                self.tint_index
            )));
        }
        if self.exhausted {
            return Ok(());
        }
        let Some(wave) = self.config.waves.get(self.wave as usize) else {
            return Err(SaveError::corrupt(format!(
                "scenario wave {} not configured",
                self.wave
            )));
        };
        if self.config.cycles > 0 && self.cycle >= self.config.cycles {
            return Err(SaveError::corrupt(format!(
                "scenario cycle {} past the configured {}",
                self.cycle, self.config.cycles
            )));
        }
        if self.wave_running && self.sequence as usize > wave.sequences.len() {
            return Err(SaveError::corrupt(format!(
                "scenario sequence {} not configured",
                self.sequence
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use tile_defence_core::{Command, Event, TileCoord};

    use super::*;
    use crate::Wave;

    fn saved(scenario: &Scenario) -> Vec<u8> {
        let mut writer = GameDataWriter::new(Vec::new(), 1).expect("header");
        scenario.save(&mut writer).expect("save");
        writer.into_inner()
    }

    fn reader(bytes: Vec<u8>) -> GameDataReader<Cursor<Vec<u8>>> {
        GameDataReader::new(Cursor::new(bytes), 1).expect("header")
    }

    #[test]
    fn progress_survives_a_save() {
        let mut scenario = Scenario::new(ScenarioConfig::default());
        let mut commands = Vec::new();
        let mut milestones = Vec::new();
        scenario.handle(
            &[Event::TimeAdvanced {
                dt: std::time::Duration::from_secs(8),
            }],
            &[TileCoord::new(0, 0), TileCoord::new(3, 0)],
            &mut commands,
            &mut milestones,
        );
        assert!(!commands.is_empty());
        assert!(matches!(commands[0], Command::SpawnEnemy { .. }));

        let restored = Scenario::load(ScenarioConfig::default(), &mut reader(saved(&scenario)))
            .expect("load");
        assert_eq!(restored, scenario);
    }

    #[test]
    fn progress_past_the_configured_waves_is_corrupt() {
        let mut scenario = Scenario::new(ScenarioConfig::default());
        scenario.wave = 2;
        let shorter = ScenarioConfig {
            waves: vec![Wave::default()],
            ..ScenarioConfig::default()
        };
        assert!(matches!(
            Scenario::load(shorter, &mut reader(saved(&scenario))),
            Err(SaveError::Corrupt(_))
        ));
    }

    #[test]
    fn truncated_progress_fails_to_load() {
        let mut bytes = saved(&Scenario::new(ScenarioConfig::default()));
        bytes.truncate(bytes.len() - 3);
        assert!(matches!(
            Scenario::load(ScenarioConfig::default(), &mut reader(bytes)),
            Err(SaveError::Io(_))
        ));
    }
}
