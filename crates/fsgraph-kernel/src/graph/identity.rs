//! Stable file identity.
//!
//! A [`FileId`] is `base64(scope || path)`. The scope is fixed-length, so two
//! different paths in one scope can never produce the same byte string, and
//! any process serving the same root with the same scope seed agrees on IDs.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};

/// Length in bytes of a [`Scope`].
pub const SCOPE_LEN: usize = 16;

/// Fixed-length seed mixed into every ID.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Scope([u8; SCOPE_LEN]);

impl Scope {
    /// Derive a scope from a human-readable seed such as `host:/srv/data`.
    ///
    /// Keeps the first 16 bytes of the seed's SHA-512.
    pub fn from_seed(seed: &str) -> Self {
        let digest = Sha512::digest(seed.as_bytes());
        let mut bytes = [0u8; SCOPE_LEN];
        bytes.copy_from_slice(&digest[..SCOPE_LEN]);
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; SCOPE_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SCOPE_LEN] {
        &self.0
    }

    /// Lowercase hex, for logs.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// ID of `path` within this scope. Pure; never fails.
    pub fn id(&self, path: &str) -> FileId {
        let mut raw = Vec::with_capacity(SCOPE_LEN + path.len());
        raw.extend_from_slice(&self.0);
        raw.extend_from_slice(path.as_bytes());
        FileId(STANDARD.encode(raw))
    }
}

impl std::fmt::Debug for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Scope({})", self.to_hex())
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Opaque file identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(String);

impl FileId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
