//! Text form of a save file that survives copy and paste.
//!
//! A transfer string reads `tiledef:v<version>:<columns>x<rows>:<payload>`, where the
//! payload is the unpadded base64 encoding of the binary save.

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine};
use thiserror::Error;

const TRANSFER_DOMAIN: &str = "tiledef";
const FIELD_DELIMITER: char = ':';

/// Binary save paired with the header fields shown in its transfer string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct SaveTransfer {
    pub(crate) version: u32,
    pub(crate) columns: u32,
    pub(crate) rows: u32,
    pub(crate) save: Vec<u8>,
}

impl SaveTransfer {
    /// Encodes the save into its transfer string.
    pub(crate) fn encode(&self) -> String {
        let payload = STANDARD_NO_PAD.encode(&self.save);
        format!(
            "{TRANSFER_DOMAIN}{FIELD_DELIMITER}v{}{FIELD_DELIMITER}{}x{}{FIELD_DELIMITER}{payload}",
            self.version, self.columns, self.rows
        )
    }

    /// Parses a transfer string, refusing versions newer than `supported`.
    pub(crate) fn decode(value: &str, supported: u32) -> Result<Self, TransferError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(TransferError::EmptyPayload);
        }

        let mut parts = trimmed.splitn(4, FIELD_DELIMITER);
        let domain = parts.next().unwrap_or_default();
        if domain != TRANSFER_DOMAIN {
            return Err(TransferError::InvalidPrefix(domain.to_owned()));
        }

        let version_field = parts.next().ok_or(TransferError::MissingVersion)?;
        let version = version_field
            .strip_prefix('v')
            .and_then(|digits| digits.parse::<u32>().ok())
            .filter(|version| *version > 0)
            .ok_or_else(|| TransferError::InvalidVersion(version_field.to_owned()))?;
        if version > supported {
            return Err(TransferError::UnsupportedVersion {
                found: version,
                supported,
            });
        }

        let dimensions = parts.next().ok_or(TransferError::MissingDimensions)?;
        let (columns, rows) = parse_dimensions(dimensions)?;

        let payload = parts.next().ok_or(TransferError::MissingPayload)?;
        let save = STANDARD_NO_PAD.decode(payload.as_bytes())?;
        let declared = save
            .get(..4)
            .and_then(|header| <[u8; 4]>::try_from(header).ok())
            .map(u32::from_le_bytes)
            .ok_or(TransferError::MissingPayload)?;
        if declared != version {
            return Err(TransferError::VersionMismatch {
                header: version,
                save: declared,
            });
        }

        Ok(Self {
            version,
            columns,
            rows,
            save,
        })
    }
}

fn parse_dimensions(value: &str) -> Result<(u32, u32), TransferError> {
    let invalid = || TransferError::InvalidDimensions(value.to_owned());
    let (columns, rows) = value.split_once(['x', 'X']).ok_or_else(invalid)?;
    let columns = columns.parse::<u32>().map_err(|_| invalid())?;
    let rows = rows.parse::<u32>().map_err(|_| invalid())?;
    if columns == 0 || rows == 0 {
        return Err(invalid());
    }
    Ok((columns, rows))
}

/// Errors produced while parsing a transfer string.
#[derive(Debug, Error)]
pub(crate) enum TransferError {
    #[error("transfer string is empty")]
    EmptyPayload,
    #[error("transfer string must start with `tiledef`, found `{0}`")]
    InvalidPrefix(String),
    #[error("transfer string is missing the version field")]
    MissingVersion,
    #[error("invalid version field `{0}`")]
    InvalidVersion(String),
    #[error("save version {found} is newer than the supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },
    #[error("transfer string is missing the board dimensions")]
    MissingDimensions,
    #[error("invalid board dimensions `{0}`")]
    InvalidDimensions(String),
    #[error("transfer string is missing the save payload")]
    MissingPayload,
    #[error("save payload is not valid base64: {0}")]
    InvalidEncoding(#[from] base64::DecodeError),
    #[error("header claims version {header} but the save is version {save}")]
    VersionMismatch { header: u32, save: u32 },
}
