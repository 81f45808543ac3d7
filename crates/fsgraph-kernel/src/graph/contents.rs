//! Bounded, resumable content reads.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use strum::EnumString;

use crate::vfs::{OpenFlags, VfsError, VfsFile, VfsOps, VfsResult};

/// Hard cap on bytes returned by a single read, whatever the caller asks for.
pub const READ_CAP: u64 = 8 * 1024 * 1024;

const READ_CHUNK: usize = 64 * 1024;

pub(crate) const WARN_INVALID_UTF8: &str = "Invalid UTF-8 encountered";
pub(crate) const WARN_NO_SIZE: &str = "Unable to determine file size";

/// Wire encoding of file contents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum Encoding {
    /// UTF-8 when the data looks like text, base64 otherwise.
    #[default]
    Auto,
    Utf8,
    Base64,
}

impl Encoding {
    /// Parse a wire value (case-insensitive). Unknown values are
    /// `InvalidArgument`.
    pub fn parse(s: &str) -> VfsResult<Self> {
        <Self as FromStr>::from_str(s)
            .map_err(|_| VfsError::invalid_argument(format!("invalid encoding: {s}")))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Encoding::Auto => "auto",
            Encoding::Utf8 => "utf8",
            Encoding::Base64 => "base64",
        }
    }
}

impl std::fmt::Display for Encoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters of one content read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadOptions {
    pub encoding: Encoding,
    /// Upper bound on bytes read; clamped to [`READ_CAP`].
    pub max_bytes: Option<u64>,
    /// Absolute offset to start from, usually a previous `next`.
    pub seek: Option<u64>,
}

impl ReadOptions {
    pub fn new(encoding: Encoding) -> Self {
        Self {
            encoding,
            ..Default::default()
        }
    }

    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = Some(max_bytes);
        self
    }

    pub fn with_seek(mut self, seek: u64) -> Self {
        self.seek = Some(seek);
        self
    }

    fn limit(&self) -> u64 {
        self.max_bytes.map_or(READ_CAP, |max| max.min(READ_CAP))
    }
}

/// One bounded read of a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileContents {
    pub data: String,
    /// The encoding actually used; never `Auto`.
    pub encoding: Encoding,
    /// Offset to resume from when more data follows.
    pub next: Option<u64>,
    pub warning: Option<String>,
}

impl FileContents {
    fn utf8(data: String) -> Self {
        Self {
            data,
            encoding: Encoding::Utf8,
            next: None,
            warning: None,
        }
    }

    fn base64(raw: &[u8]) -> Self {
        Self {
            data: STANDARD.encode(raw),
            encoding: Encoding::Base64,
            next: None,
            warning: None,
        }
    }

    /// Decode `data` back to the bytes that were read.
    pub fn decode(&self) -> VfsResult<Vec<u8>> {
        match self.encoding {
            Encoding::Base64 => STANDARD
                .decode(&self.data)
                .map_err(|e| VfsError::invalid_argument(format!("invalid base64: {e}"))),
            _ => Ok(self.data.as_bytes().to_vec()),
        }
    }
}

/// Does already-valid UTF-8 text look like binary data?
///
/// Counts control bytes other than `\n \r \t \v`, and NULs among them. The
/// verdict depends only on the window given, so different windows of one
/// file may resolve differently.
pub fn looks_binary(text: &[u8]) -> bool {
    let mut nlow = 0usize;
    let mut nnul = 0usize;
    for &b in text {
        if b < 32 && !matches!(b, b'\n' | b'\r' | b'\t' | 0x0b) {
            nlow += 1;
            if b == 0 {
                nnul += 1;
            }
        }
    }
    nlow > 0 && (nnul > text.len() / 16 || nlow >= text.len() / 4)
}

/// Encode raw bytes under the requested encoding.
fn encode(raw: Vec<u8>, encoding: Encoding) -> FileContents {
    match encoding {
        Encoding::Base64 => FileContents::base64(&raw),
        Encoding::Utf8 => match String::from_utf8(raw) {
            Ok(text) => FileContents::utf8(text),
            Err(e) => {
                let mut contents =
                    FileContents::utf8(String::from_utf8_lossy(e.as_bytes()).into_owned());
                contents.warning = Some(WARN_INVALID_UTF8.to_string());
                contents
            }
        },
        Encoding::Auto => match String::from_utf8(raw) {
            Ok(text) if looks_binary(text.as_bytes()) => FileContents::base64(text.as_bytes()),
            Ok(text) => FileContents::utf8(text),
            Err(e) => FileContents::base64(e.as_bytes()),
        },
    }
}

/// Read up to `limit` bytes from the handle's current position.
async fn read_bounded(file: &mut dyn VfsFile, limit: u64) -> VfsResult<Vec<u8>> {
    let limit = usize::try_from(limit).unwrap_or(usize::MAX);
    let mut out = Vec::new();
    let mut chunk = vec![0u8; READ_CHUNK.min(limit.max(1))];
    while out.len() < limit {
        let want = chunk.len().min(limit - out.len());
        let n = file.read(&mut chunk[..want]).await?;
        if n == 0 {
            break;
        }
        out.extend_from_slice(&chunk[..n]);
    }
    Ok(out)
}

/// Read one window of the file at `path`.
///
/// The handle is dropped on every return path.
pub(crate) async fn read_contents(
    store: &dyn VfsOps,
    path: &str,
    opts: &ReadOptions,
) -> VfsResult<FileContents> {
    let mut file = store.open(Path::new(path), OpenFlags::read()).await?;
    if let Some(offset) = opts.seek {
        file.seek(offset).await?;
    }

    let limit = opts.limit();
    let raw = read_bounded(file.as_mut(), limit).await?;
    let filled = raw.len() as u64 == limit;
    let mut contents = encode(raw, opts.encoding);

    if filled {
        match file.stat().await {
            Ok(attr) => match file.position().await {
                Ok(position) if attr.size > position => contents.next = Some(position),
                Ok(_) => {}
                Err(e) => tracing::debug!(path, error = %e, "unable to tell position"),
            },
            Err(e) => {
                tracing::warn!(path, error = %e, "unable to stat open file");
                contents.warning = Some(WARN_NO_SIZE.to_string());
            }
        }
    }

    Ok(contents)
}
