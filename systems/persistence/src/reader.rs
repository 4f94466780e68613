use std::io::{Cursor, Read};

use glam::Vec2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tile_defence_core::Tint;

use crate::{SaveError, MAX_BLOCK_LEN};

/// Reads save values written by [`crate::GameDataWriter`].
#[derive(Debug)]
pub struct GameDataReader<R> {
    inner: R,
    version: u32,
}

impl<R: Read> GameDataReader<R> {
    /// Opens a save and checks its format version.
    ///
    /// # Errors
    ///
    /// Fails with [`SaveError::UnsupportedVersion`] when the save is newer
    /// than `supported`, with [`SaveError::Corrupt`] for version zero, and
    /// with [`SaveError::Io`] when the stream ends before the version.
    pub fn new(inner: R, supported: u32) -> Result<Self, SaveError> {
        let mut reader = Self { inner, version: 0 };
        let found = reader.read_u32()?;
        if found > supported {
            return Err(SaveError::UnsupportedVersion { found, supported });
        }
        if found == 0 {
            return Err(SaveError::corrupt("save version zero"));
        }
        reader.version = found;
        Ok(reader)
    }

    /// Format version the save was written in.
    #[must_use]
    pub const fn version(&self) -> u32 {
        self.version
    }

    /// Whether the save carries fields introduced in `version`.
    #[must_use]
    pub const fn since(&self, version: u32) -> bool {
        self.version >= version
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], SaveError> {
        let mut bytes = [0; N];
        self.inner.read_exact(&mut bytes)?;
        Ok(bytes)
    }

    /// Reads a single byte.
    ///
    /// # Errors
    ///
    /// Fails when the stream ends early.
    pub fn read_u8(&mut self) -> Result<u8, SaveError> {
        let [value] = self.read_array::<1>()?;
        Ok(value)
    }

    /// Reads an unsigned 32-bit integer.
    ///
    /// # Errors
    ///
    /// Fails when the stream ends early.
    pub fn read_u32(&mut self) -> Result<u32, SaveError> {
        self.read_array().map(u32::from_le_bytes)
    }

    /// Reads a signed 32-bit integer.
    ///
    /// # Errors
    ///
    /// Fails when the stream ends early.
    pub fn read_i32(&mut self) -> Result<i32, SaveError> {
        self.read_array().map(i32::from_le_bytes)
    }

    /// Reads an unsigned 64-bit integer.
    ///
    /// # Errors
    ///
    /// Fails when the stream ends early.
    pub fn read_u64(&mut self) -> Result<u64, SaveError> {
        self.read_array().map(u64::from_le_bytes)
    }

    /// Reads a 32-bit float.
    ///
    /// # Errors
    ///
    /// Fails when the stream ends early.
    pub fn read_f32(&mut self) -> Result<f32, SaveError> {
        self.read_array().map(f32::from_le_bytes)
    }

    /// Reads a boolean stored as a single byte.
    ///
    /// # Errors
    ///
    /// Fails when the stream ends early or the byte is neither 0 nor 1.
    pub fn read_bool(&mut self) -> Result<bool, SaveError> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(SaveError::corrupt(format_args!("invalid boolean {other}"))),
        }
    }

    /// Reads both components of a vector.
    ///
    /// # Errors
    ///
    /// Fails when the stream ends early.
    pub fn read_vec2(&mut self) -> Result<Vec2, SaveError> {
        let x = self.read_f32()?;
        let y = self.read_f32()?;
        Ok(Vec2::new(x, y))
    }

    /// Reads a tint stored as red, green, and blue bytes.
    ///
    /// # Errors
    ///
    /// Fails when the stream ends early.
    pub fn read_tint(&mut self) -> Result<Tint, SaveError> {
        let [red, green, blue] = self.read_array::<3>()?;
        Ok(Tint::from_rgb(red, green, blue))
    }

    /// Reads a length-prefixed block of bytes.
    ///
    /// # Errors
    ///
    /// Fails when the prefix exceeds [`MAX_BLOCK_LEN`] or the stream ends
    /// before the block does.
    pub fn read_bytes(&mut self) -> Result<Vec<u8>, SaveError> {
        let len = self.read_u32()?;
        if len > MAX_BLOCK_LEN {
            return Err(SaveError::corrupt(format_args!(
                "byte block of {len} bytes exceeds the limit"
            )));
        }
        let mut bytes = vec![0; len as usize];
        self.inner.read_exact(&mut bytes)?;
        Ok(bytes)
    }

    /// Restores a random generator at the exact position it was saved at.
    ///
    /// # Errors
    ///
    /// Fails when the stream ends early.
    pub fn read_rng(&mut self) -> Result<ChaCha8Rng, SaveError> {
        let seed: [u8; 32] = self.read_array()?;
        let stream = self.read_u64()?;
        let low = self.read_u64()?;
        let high = self.read_u64()?;
        let mut rng = ChaCha8Rng::from_seed(seed);
        rng.set_stream(stream);
        rng.set_word_pos(u128::from(low) | (u128::from(high) << 64));
        Ok(rng)
    }

    /// Reads a length-prefixed section written by
    /// [`crate::GameDataWriter::write_section`].
    ///
    /// The returned reader shares this save's version; bytes it leaves
    /// unread are skipped.
    ///
    /// # Errors
    ///
    /// Fails when the section prefix is invalid or the stream ends early.
    pub fn read_section(&mut self) -> Result<GameDataReader<Cursor<Vec<u8>>>, SaveError> {
        let bytes = self.read_bytes()?;
        Ok(GameDataReader {
            inner: Cursor::new(bytes),
            version: self.version,
        })
    }
}

#[cfg(test)]
mod tests {
    use rand::RngCore;

    use super::*;
    use crate::GameDataWriter;

    fn save<F>(version: u32, body: F) -> Vec<u8>
    where
        F: FnOnce(&mut GameDataWriter<Vec<u8>>) -> Result<(), SaveError>,
    {
        let mut writer = GameDataWriter::new(Vec::new(), version).expect("header");
        body(&mut writer).expect("body");
        writer.into_inner()
    }

    #[test]
    fn version_leads_the_save() {
        let bytes = save(2, |_| Ok(()));
        assert_eq!(bytes, vec![2, 0, 0, 0]);
        let reader = GameDataReader::new(bytes.as_slice(), 3).unwrap();
        assert_eq!(reader.version(), 2);
        assert!(reader.since(2));
        assert!(!reader.since(3));
    }

    #[test]
    fn newer_versions_are_refused() {
        let bytes = save(4, |_| Ok(()));
        let error = GameDataReader::new(bytes.as_slice(), 3).unwrap_err();
        assert!(matches!(
            error,
            SaveError::UnsupportedVersion {
                found: 4,
                supported: 3
            }
        ));
    }

    #[test]
    fn scalars_read_back_in_order() {
        let bytes = save(1, |writer| {
            writer.write_u8(7)?;
            writer.write_i32(-12)?;
            writer.write_f32(0.25)?;
            writer.write_bool(true)?;
            writer.write_vec2(Vec2::new(1.5, -2.0))?;
            writer.write_tint(Tint::from_rgb(1, 2, 3))?;
            writer.write_bytes(b"abc")
        });
        let mut reader = GameDataReader::new(bytes.as_slice(), 1).unwrap();
        assert_eq!(reader.read_u8().unwrap(), 7);
        assert_eq!(reader.read_i32().unwrap(), -12);
        assert_eq!(reader.read_f32().unwrap(), 0.25);
        assert!(reader.read_bool().unwrap());
        assert_eq!(reader.read_vec2().unwrap(), Vec2::new(1.5, -2.0));
        assert_eq!(reader.read_tint().unwrap(), Tint::from_rgb(1, 2, 3));
        assert_eq!(reader.read_bytes().unwrap(), b"abc");
        assert!(matches!(reader.read_u8(), Err(SaveError::Io(_))));
    }

    #[test]
    fn invalid_booleans_are_corrupt() {
        let bytes = save(1, |writer| writer.write_u8(2));
        let mut reader = GameDataReader::new(bytes.as_slice(), 1).unwrap();
        assert!(matches!(reader.read_bool(), Err(SaveError::Corrupt(_))));
    }

    #[test]
    fn restored_rng_continues_the_sequence() {
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let _ = rng.next_u64();
        let _ = rng.next_u32();
        let bytes = save(3, |writer| writer.write_rng(&rng));

        let mut reader = GameDataReader::new(bytes.as_slice(), 3).unwrap();
        let mut restored = reader.read_rng().unwrap();
        for _ in 0..16 {
            assert_eq!(restored.next_u64(), rng.next_u64());
        }
    }

    #[test]
    fn sections_skip_unread_trailing_fields() {
        let bytes = save(3, |writer| {
            writer.write_section(|section| {
                section.write_u32(10)?;
                section.write_u32(20)
            })?;
            writer.write_u32(30)
        });
        let mut reader = GameDataReader::new(bytes.as_slice(), 3).unwrap();
        let mut section = reader.read_section().unwrap();
        assert_eq!(section.version(), 3);
        assert_eq!(section.read_u32().unwrap(), 10);
        assert_eq!(reader.read_u32().unwrap(), 30);
    }
}
