//! Write-side open modes and payload decoding.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::EnumString;

use super::contents::Encoding;
use crate::vfs::{OpenFlags, VfsError, VfsResult};

/// One open mode requested for a write.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum FileOpen {
    /// Create the file if it is missing.
    Create,
    /// Create the file; it must not exist yet.
    New,
    /// Clear existing content.
    Truncate,
    /// Writes land at end of file.
    Append,
}

impl FileOpen {
    /// Parse a wire value (case-insensitive).
    pub fn parse(s: &str) -> VfsResult<Self> {
        <Self as FromStr>::from_str(s)
            .map_err(|_| VfsError::invalid_argument(format!("invalid open flag: {s}")))
    }

    /// Parse a list of wire values, failing on the first unknown one.
    pub fn parse_all<S: AsRef<str>>(values: &[S]) -> VfsResult<Vec<Self>> {
        values.iter().map(|v| Self::parse(v.as_ref())).collect()
    }

    /// Write-only open flags for a set of modes.
    ///
    /// With no modes the file must already exist and is overwritten in place
    /// from offset 0.
    pub fn flags(modes: &[FileOpen]) -> OpenFlags {
        let mut flags = OpenFlags::write_only();
        for mode in modes {
            match mode {
                FileOpen::Create => flags.create = true,
                FileOpen::New => {
                    flags.create = true;
                    flags.exclusive = true;
                }
                FileOpen::Truncate => flags.truncate = true,
                FileOpen::Append => flags.append = true,
            }
        }
        flags
    }
}

/// Turn a write payload into the bytes to store.
///
/// Only `utf8` and `base64` are valid for writes.
pub fn decode_payload(contents: &str, encoding: Encoding) -> VfsResult<Vec<u8>> {
    match encoding {
        Encoding::Utf8 => Ok(contents.as_bytes().to_vec()),
        Encoding::Base64 => STANDARD
            .decode(contents)
            .map_err(|e| VfsError::invalid_argument(format!("invalid base64: {e}"))),
        Encoding::Auto => Err(VfsError::invalid_argument(
            "invalid encoding for write: auto",
        )),
    }
}
