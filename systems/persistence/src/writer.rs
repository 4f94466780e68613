use std::io::Write;

use glam::Vec2;
use rand_chacha::ChaCha8Rng;
use tile_defence_core::Tint;

use crate::SaveError;

/// Writes save values in little-endian order.
#[derive(Debug)]
pub struct GameDataWriter<W> {
    inner: W,
    version: u32,
}

impl<W: Write> GameDataWriter<W> {
    /// Starts a save by writing the format version.
    ///
    /// # Errors
    ///
    /// Propagates failures of the underlying stream.
    pub fn new(inner: W, version: u32) -> Result<Self, SaveError> {
        let mut writer = Self { inner, version };
        writer.write_u32(version)?;
        Ok(writer)
    }

    /// Format version the save is written in.
    #[must_use]
    pub const fn version(&self) -> u32 {
        self.version
    }

    /// Hands back the underlying stream.
    pub fn into_inner(self) -> W {
        self.inner
    }

    /// Writes a single byte.
    ///
    /// # Errors
    ///
    /// Propagates failures of the underlying stream.
    pub fn write_u8(&mut self, value: u8) -> Result<(), SaveError> {
        self.inner.write_all(&[value])?;
        Ok(())
    }

    /// Writes an unsigned 32-bit integer.
    ///
    /// # Errors
    ///
    /// Propagates failures of the underlying stream.
    pub fn write_u32(&mut self, value: u32) -> Result<(), SaveError> {
        self.inner.write_all(&value.to_le_bytes())?;
        Ok(())
    }

    /// Writes a signed 32-bit integer.
    ///
    /// # Errors
    ///
    /// Propagates failures of the underlying stream.
    pub fn write_i32(&mut self, value: i32) -> Result<(), SaveError> {
        self.inner.write_all(&value.to_le_bytes())?;
        Ok(())
    }

    /// Writes an unsigned 64-bit integer.
    ///
    /// # Errors
    ///
    /// Propagates failures of the underlying stream.
    pub fn write_u64(&mut self, value: u64) -> Result<(), SaveError> {
        self.inner.write_all(&value.to_le_bytes())?;
        Ok(())
    }

    /// Writes a 32-bit float bit for bit.
    ///
    /// # Errors
    ///
    /// Propagates failures of the underlying stream.
    pub fn write_f32(&mut self, value: f32) -> Result<(), SaveError> {
        self.inner.write_all(&value.to_le_bytes())?;
        Ok(())
    }

    /// Writes a boolean as a single byte.
    ///
    /// # Errors
    ///
    /// Propagates failures of the underlying stream.
    pub fn write_bool(&mut self, value: bool) -> Result<(), SaveError> {
        self.write_u8(u8::from(value))
    }

    /// Writes both components of a vector.
    ///
    /// # Errors
    ///
    /// Propagates failures of the underlying stream.
    pub fn write_vec2(&mut self, value: Vec2) -> Result<(), SaveError> {
        self.write_f32(value.x)?;
        self.write_f32(value.y)
    }

    /// Writes a tint as its red, green, and blue bytes.
    ///
    /// # Errors
    ///
    /// Propagates failures of the underlying stream.
    pub fn write_tint(&mut self, value: Tint) -> Result<(), SaveError> {
        self.inner
            .write_all(&[value.red(), value.green(), value.blue()])?;
        Ok(())
    }

    /// Writes a length-prefixed block of bytes.
    ///
    /// # Errors
    ///
    /// Fails when the block is longer than a `u32` prefix can express, or
    /// when the underlying stream fails.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), SaveError> {
        let len = u32::try_from(bytes.len())
            .map_err(|_| SaveError::corrupt("byte block exceeds u32 length"))?;
        self.write_u32(len)?;
        self.inner.write_all(bytes)?;
        Ok(())
    }

    /// Writes a random generator's full position so it resumes exactly.
    ///
    /// The seed block is followed by the stream id and the 128-bit word
    /// position split into its low and high halves.
    ///
    /// # Errors
    ///
    /// Propagates failures of the underlying stream.
    pub fn write_rng(&mut self, rng: &ChaCha8Rng) -> Result<(), SaveError> {
        self.inner.write_all(&rng.get_seed())?;
        self.write_u64(rng.get_stream())?;
        let position = rng.get_word_pos();
        self.write_u64(position as u64)?;
        self.write_u64((position >> 64) as u64)
    }

    /// Writes a length-prefixed section assembled by `body`.
    ///
    /// Sections let a reader skip trailing fields it does not understand.
    ///
    /// # Errors
    ///
    /// Propagates failures of `body` and of the underlying stream.
    pub fn write_section<F>(&mut self, body: F) -> Result<(), SaveError>
    where
        F: FnOnce(&mut GameDataWriter<Vec<u8>>) -> Result<(), SaveError>,
    {
        let mut section = GameDataWriter {
            inner: Vec::new(),
            version: self.version,
        };
        body(&mut section)?;
        self.write_bytes(&section.inner)
    }
}
