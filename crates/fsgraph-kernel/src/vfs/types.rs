//! Core VFS types.
//!
//! These types are path-based (no inodes) and carry just enough stat data to
//! build the typed file model on top.

use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Mask of the file-type bits in a raw Unix mode (`S_IFMT`).
const S_IFMT: u32 = 0o170000;
const S_IFSOCK: u32 = 0o140000;
const S_IFLNK: u32 = 0o120000;
const S_IFREG: u32 = 0o100000;
const S_IFBLK: u32 = 0o060000;
const S_IFDIR: u32 = 0o040000;
const S_IFCHR: u32 = 0o020000;
const S_IFIFO: u32 = 0o010000;

/// Sticky bit (`S_ISVTX`).
const S_ISVTX: u32 = 0o1000;

/// Permission bits (rwx for user, group, other).
pub const PERM_MASK: u32 = 0o777;

/// File type enumeration.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum FileType {
    /// Regular file.
    Regular,
    /// Directory.
    #[serde(rename = "dir")]
    #[strum(serialize = "dir")]
    Directory,
    /// Symbolic link.
    Symlink,
    /// FIFO.
    NamedPipe,
    /// Unix domain socket.
    Socket,
    /// Block device.
    Device,
    /// Character device.
    CharDevice,
    /// Anything the other variants don't describe.
    Irregular,
}

impl FileType {
    /// Classify the file-type bits of a raw Unix mode.
    ///
    /// Unknown bit patterns map to [`FileType::Irregular`] instead of failing.
    pub fn from_mode(mode: u32) -> Self {
        match mode & S_IFMT {
            S_IFREG => FileType::Regular,
            S_IFDIR => FileType::Directory,
            S_IFLNK => FileType::Symlink,
            S_IFIFO => FileType::NamedPipe,
            S_IFSOCK => FileType::Socket,
            S_IFBLK => FileType::Device,
            S_IFCHR => FileType::CharDevice,
            _ => FileType::Irregular,
        }
    }

    /// Returns true if this is a regular file.
    pub fn is_file(&self) -> bool {
        matches!(self, FileType::Regular)
    }

    /// Returns true if this is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, FileType::Directory)
    }
}

/// File attributes (metadata).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAttr {
    /// Size in bytes.
    pub size: u64,
    /// File type.
    pub kind: FileType,
    /// Permission bits (e.g., 0o644).
    pub perm: u32,
    /// Sticky bit set.
    pub sticky: bool,
    /// Last modification time.
    pub mtime: SystemTime,
}

impl FileAttr {
    /// Build attributes from a raw Unix `st_mode`.
    pub fn from_mode(mode: u32, size: u64, mtime: SystemTime) -> Self {
        Self {
            size,
            kind: FileType::from_mode(mode),
            perm: mode & PERM_MASK,
            sticky: mode & S_ISVTX == S_ISVTX,
            mtime,
        }
    }

    /// Create attributes for a new file.
    pub fn file(size: u64, perm: u32) -> Self {
        Self {
            size,
            kind: FileType::Regular,
            perm: perm & PERM_MASK,
            sticky: false,
            mtime: SystemTime::now(),
        }
    }

    /// Create attributes for a new directory.
    pub fn directory(perm: u32) -> Self {
        Self {
            size: 0,
            kind: FileType::Directory,
            perm: perm & PERM_MASK,
            sticky: perm & S_ISVTX == S_ISVTX,
            mtime: SystemTime::now(),
        }
    }

    /// Returns true if this is a regular file.
    pub fn is_file(&self) -> bool {
        self.kind.is_file()
    }

    /// Returns true if this is a directory.
    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }
}

/// Directory entry.
#[derive(Debug, Clone)]
pub struct DirEntry {
    /// Entry name (not full path).
    pub name: String,
    /// Entry attributes, not following a trailing symlink.
    pub attr: FileAttr,
}

impl DirEntry {
    /// Create a new directory entry.
    pub fn new(name: impl Into<String>, attr: FileAttr) -> Self {
        Self {
            name: name.into(),
            attr,
        }
    }
}

/// Open file flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenFlags {
    /// Read access requested.
    pub read: bool,
    /// Write access requested.
    pub write: bool,
    /// Append mode.
    pub append: bool,
    /// Create if not exists.
    pub create: bool,
    /// Truncate on open.
    pub truncate: bool,
    /// Exclusive create (fail if exists).
    pub exclusive: bool,
}

impl Default for OpenFlags {
    fn default() -> Self {
        Self {
            read: true,
            write: false,
            append: false,
            create: false,
            truncate: false,
            exclusive: false,
        }
    }
}

impl OpenFlags {
    /// Read-only access.
    pub fn read() -> Self {
        Self::default()
    }

    /// Write-only access to an existing file, positioned at the start.
    pub fn write_only() -> Self {
        Self {
            read: false,
            write: true,
            ..Default::default()
        }
    }

    /// Create (or truncate) with write access.
    pub fn create_truncate() -> Self {
        Self {
            create: true,
            truncate: true,
            ..Self::write_only()
        }
    }
}
