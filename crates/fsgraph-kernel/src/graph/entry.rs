//! Typed file model.
//!
//! Entries are built on demand from a stat result and never cached. Only
//! regular files and directories get their own variants; symlinks, pipes,
//! sockets and devices are all [`FileEntry::Other`] with a `mode.type` tag.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::ops::Deref;

use super::identity::{FileId, Scope};
use crate::vfs::path as vpath;
use crate::vfs::{FileAttr, FileType};

/// Millisecond-precision UTC timestamp format.
const MOD_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Type tag plus permission bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FileMode {
    #[serde(rename = "type")]
    pub kind: FileType,
    pub perm: u32,
    pub sticky: bool,
}

impl From<&FileAttr> for FileMode {
    fn from(attr: &FileAttr) -> Self {
        Self {
            kind: attr.kind,
            perm: attr.perm,
            sticky: attr.sticky,
        }
    }
}

/// Attributes shared by every entry variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryInfo {
    pub id: FileId,
    pub path: String,
    /// Last path component; empty for the root.
    pub name: String,
    pub size: u64,
    pub mode: FileMode,
    pub mod_time: String,
}

impl EntryInfo {
    pub(crate) fn new(scope: &Scope, path: &str, attr: &FileAttr) -> Self {
        let path = vpath::clean(path);
        Self {
            id: scope.id(&path),
            name: vpath::file_name(&path).to_string(),
            size: attr.size,
            mode: FileMode::from(attr),
            mod_time: DateTime::<Utc>::from(attr.mtime)
                .format(MOD_TIME_FORMAT)
                .to_string(),
            path,
        }
    }
}

macro_rules! entry_variant {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Serialize)]
        #[serde(transparent)]
        pub struct $name(EntryInfo);

        impl $name {
            pub fn info(&self) -> &EntryInfo {
                &self.0
            }
        }

        impl Deref for $name {
            type Target = EntryInfo;

            fn deref(&self) -> &EntryInfo {
                &self.0
            }
        }
    };
}

entry_variant!(
    /// A regular file; its contents can be read.
    RegularFile
);
entry_variant!(
    /// A directory; its children can be listed.
    Directory
);
entry_variant!(
    /// Anything else: symlink, pipe, socket, device.
    OtherFile
);

/// A resolved filesystem entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FileEntry {
    Regular(RegularFile),
    Directory(Directory),
    Other(OtherFile),
}

impl FileEntry {
    /// Classify a stat result at `path`.
    pub fn from_attr(scope: &Scope, path: &str, attr: &FileAttr) -> Self {
        let info = EntryInfo::new(scope, path, attr);
        match attr.kind {
            FileType::Regular => FileEntry::Regular(RegularFile(info)),
            FileType::Directory => FileEntry::Directory(Directory(info)),
            _ => FileEntry::Other(OtherFile(info)),
        }
    }

    pub fn info(&self) -> &EntryInfo {
        match self {
            FileEntry::Regular(f) => &f.0,
            FileEntry::Directory(d) => &d.0,
            FileEntry::Other(o) => &o.0,
        }
    }

    pub fn path(&self) -> &str {
        &self.info().path
    }

    pub fn name(&self) -> &str {
        &self.info().name
    }

    pub fn as_directory(&self) -> Option<&Directory> {
        match self {
            FileEntry::Directory(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_regular(&self) -> Option<&RegularFile> {
        match self {
            FileEntry::Regular(f) => Some(f),
            _ => None,
        }
    }
}

impl From<Directory> for FileEntry {
    fn from(dir: Directory) -> Self {
        FileEntry::Directory(dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};

    fn scope() -> Scope {
        Scope::from_seed("test")
    }

    #[test]
    fn test_classification() {
        let s = scope();
        let file = FileEntry::from_attr(&s, "/a/f.txt", &FileAttr::file(3, 0o644));
        assert!(file.as_regular().is_some());
        assert_eq!(file.name(), "f.txt");
        assert_eq!(file.info().size, 3);

        let dir = FileEntry::from_attr(&s, "/a", &FileAttr::directory(0o755));
        assert!(dir.as_directory().is_some());

        let link = FileAttr::from_mode(0o120777, 4, SystemTime::UNIX_EPOCH);
        let other = FileEntry::from_attr(&s, "/l", &link);
        assert!(matches!(other, FileEntry::Other(_)));
        assert_eq!(other.info().mode.kind, FileType::Symlink);
    }

    #[test]
    fn test_root_name_is_empty() {
        let root = FileEntry::from_attr(&scope(), "/", &FileAttr::directory(0o755));
        assert_eq!(root.name(), "");
        assert_eq!(root.path(), "/");
        assert_eq!(root.info().id, scope().id("/"));
    }

    #[test]
    fn test_path_is_normalized() {
        let entry = FileEntry::from_attr(&scope(), "a//b/", &FileAttr::file(0, 0o644));
        assert_eq!(entry.path(), "/a/b");
        assert_eq!(entry.name(), "b");
    }

    #[test]
    fn test_mod_time_format() {
        let mut attr = FileAttr::file(0, 0o644);
        attr.mtime = SystemTime::UNIX_EPOCH + Duration::from_millis(1_500_000_000_123);
        let entry = FileEntry::from_attr(&scope(), "/f", &attr);
        assert_eq!(entry.info().mod_time, "2017-07-14T02:40:00.123Z");
    }

    #[test]
    fn test_serialized_shape() {
        let dir = FileEntry::from_attr(&scope(), "/d", &FileAttr::from_mode(0o041777, 0, SystemTime::UNIX_EPOCH));
        let json = serde_json::to_value(&dir).unwrap();
        assert_eq!(json["kind"], "directory");
        assert_eq!(json["name"], "d");
        assert_eq!(json["mode"]["type"], "dir");
        assert_eq!(json["mode"]["perm"], 0o777);
        assert_eq!(json["mode"]["sticky"], true);
        assert_eq!(json["modTime"], "1970-01-01T00:00:00.000Z");
    }
}
