#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Versioned binary save format.
//!
//! Every save starts with a little-endian `u32` format version followed by
//! fixed-width scalars and length-prefixed sections. Loaders consult
//! [`GameDataReader::since`] before reading a field that a later version
//! introduced, so older saves keep loading; saves written by a newer format
//! are refused up front.

mod reader;
mod writer;

use thiserror::Error;

pub use reader::GameDataReader;
pub use writer::GameDataWriter;

/// Largest length prefix a reader accepts for a single byte block.
pub const MAX_BLOCK_LEN: u32 = 1 << 26;

/// Reasons a save could not be written or read.
#[derive(Debug, Error)]
pub enum SaveError {
    /// The underlying stream failed or ended early.
    #[error("save stream failed: {0}")]
    Io(#[from] std::io::Error),
    /// The save was written by a newer format than this build understands.
    #[error("save version {found} is newer than the supported version {supported}")]
    UnsupportedVersion {
        /// Version stored in the save.
        found: u32,
        /// Newest version this build reads.
        supported: u32,
    },
    /// The save decoded into values no valid game can hold.
    #[error("corrupt save: {0}")]
    Corrupt(String),
}

impl SaveError {
    /// Builds a [`SaveError::Corrupt`] from any displayable reason.
    #[must_use]
    pub fn corrupt(reason: impl std::fmt::Display) -> Self {
        Self::Corrupt(reason.to_string())
    }
}
