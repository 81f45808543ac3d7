//! In-memory filesystem backend.
//!
//! Used for testing and scratch trees. All data is ephemeral.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use crate::vfs::error::{VfsError, VfsResult};
use crate::vfs::ops::{VfsFile, VfsOps};
use crate::vfs::types::{DirEntry, FileAttr, OpenFlags};

/// Entry in the memory filesystem.
#[derive(Debug, Clone)]
enum Entry {
    File { data: Vec<u8>, attr: FileAttr },
    Directory { attr: FileAttr },
}

impl Entry {
    fn attr(&self) -> FileAttr {
        match self {
            Entry::File { data, attr } => FileAttr {
                size: data.len() as u64,
                ..attr.clone()
            },
            Entry::Directory { attr } => attr.clone(),
        }
    }

    fn attr_mut(&mut self) -> &mut FileAttr {
        match self {
            Entry::File { attr, .. } => attr,
            Entry::Directory { attr } => attr,
        }
    }
}

type Entries = Arc<RwLock<HashMap<PathBuf, Entry>>>;

/// In-memory filesystem backend.
///
/// Thread-safe via an internal `RwLock`. Open handles share the tree, so a
/// handle keeps working after the backend value is moved. All data is lost
/// when the last reference is dropped.
#[derive(Debug)]
pub struct MemoryBackend {
    entries: Entries,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    /// Create a new empty in-memory filesystem.
    pub fn new() -> Self {
        let mut entries = HashMap::new();
        // Root directory always exists
        entries.insert(
            PathBuf::from(""),
            Entry::Directory {
                attr: FileAttr::directory(0o755),
            },
        );
        Self {
            entries: Arc::new(RwLock::new(entries)),
        }
    }

    /// Normalize a path: remove leading `/`, resolve `.` and `..`.
    fn normalize(path: &Path) -> PathBuf {
        let mut result = PathBuf::new();
        for component in path.components() {
            match component {
                std::path::Component::RootDir => {}
                std::path::Component::CurDir => {}
                std::path::Component::ParentDir => {
                    result.pop();
                }
                std::path::Component::Normal(s) => {
                    result.push(s);
                }
                std::path::Component::Prefix(_) => {}
            }
        }
        result
    }

    /// Get the path string for error messages.
    fn path_str(path: &Path) -> String {
        format!("/{}", path.display())
    }

    /// Parent of a normalized path must exist and be a directory.
    fn check_parent(entries: &HashMap<PathBuf, Entry>, normalized: &Path) -> VfsResult<()> {
        let parent = normalized.parent().unwrap_or(Path::new(""));
        match entries.get(parent) {
            Some(Entry::Directory { .. }) => Ok(()),
            Some(_) => Err(VfsError::not_a_directory(Self::path_str(parent))),
            None => Err(VfsError::not_found(Self::path_str(parent))),
        }
    }
}

/// Open handle on an in-memory file.
struct MemoryFile {
    entries: Entries,
    path: PathBuf,
    pos: u64,
    append: bool,
}

#[async_trait]
impl VfsFile for MemoryFile {
    async fn read(&mut self, buf: &mut [u8]) -> VfsResult<usize> {
        let entries = self.entries.read();
        match entries.get(&self.path) {
            Some(Entry::File { data, .. }) => {
                let start = (self.pos as usize).min(data.len());
                let end = (start + buf.len()).min(data.len());
                let n = end - start;
                buf[..n].copy_from_slice(&data[start..end]);
                self.pos += n as u64;
                Ok(n)
            }
            Some(Entry::Directory { .. }) => {
                Err(VfsError::is_a_directory(MemoryBackend::path_str(&self.path)))
            }
            None => Err(VfsError::not_found(MemoryBackend::path_str(&self.path))),
        }
    }

    async fn write_all(&mut self, data: &[u8]) -> VfsResult<()> {
        let mut entries = self.entries.write();
        match entries.get_mut(&self.path) {
            Some(Entry::File {
                data: file_data,
                attr,
            }) => {
                if self.append {
                    self.pos = file_data.len() as u64;
                }
                let offset = self.pos as usize;
                // Extend if necessary
                if offset + data.len() > file_data.len() {
                    file_data.resize(offset + data.len(), 0);
                }
                file_data[offset..offset + data.len()].copy_from_slice(data);
                attr.mtime = SystemTime::now();
                self.pos += data.len() as u64;
                Ok(())
            }
            Some(Entry::Directory { .. }) => {
                Err(VfsError::is_a_directory(MemoryBackend::path_str(&self.path)))
            }
            None => Err(VfsError::not_found(MemoryBackend::path_str(&self.path))),
        }
    }

    async fn seek(&mut self, offset: u64) -> VfsResult<u64> {
        self.pos = offset;
        Ok(self.pos)
    }

    async fn position(&mut self) -> VfsResult<u64> {
        Ok(self.pos)
    }

    async fn stat(&self) -> VfsResult<FileAttr> {
        self.entries
            .read()
            .get(&self.path)
            .map(Entry::attr)
            .ok_or_else(|| VfsError::not_found(MemoryBackend::path_str(&self.path)))
    }

    async fn flush(&mut self) -> VfsResult<()> {
        Ok(())
    }
}

#[async_trait]
impl VfsOps for MemoryBackend {
    async fn getattr(&self, path: &Path) -> VfsResult<FileAttr> {
        let normalized = Self::normalize(path);
        self.entries
            .read()
            .get(&normalized)
            .map(Entry::attr)
            .ok_or_else(|| VfsError::not_found(Self::path_str(&normalized)))
    }

    async fn readdir(&self, path: &Path) -> VfsResult<Vec<DirEntry>> {
        let normalized = Self::normalize(path);
        let entries = self.entries.read();

        // Verify the path is a directory
        match entries.get(&normalized) {
            Some(Entry::Directory { .. }) => {}
            Some(_) => {
                return Err(VfsError::not_a_directory(Self::path_str(&normalized)));
            }
            None => {
                return Err(VfsError::not_found(Self::path_str(&normalized)));
            }
        }

        // Find all direct children
        let mut result = Vec::new();
        for (entry_path, entry) in entries.iter() {
            if entry_path.parent() == Some(normalized.as_path()) {
                if let Some(name) = entry_path.file_name() {
                    result.push(DirEntry::new(name.to_string_lossy().into_owned(), entry.attr()));
                }
            }
        }

        // Sort for consistent ordering
        result.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(result)
    }

    async fn open(&self, path: &Path, flags: OpenFlags) -> VfsResult<Box<dyn VfsFile>> {
        let normalized = Self::normalize(path);
        {
            let mut entries = self.entries.write();
            match entries.get_mut(&normalized) {
                Some(Entry::File { data, attr }) => {
                    if flags.exclusive {
                        return Err(VfsError::already_exists(Self::path_str(&normalized)));
                    }
                    if flags.truncate {
                        data.clear();
                        attr.mtime = SystemTime::now();
                    }
                }
                Some(Entry::Directory { .. }) => {
                    if flags.write || flags.append {
                        return Err(VfsError::is_a_directory(Self::path_str(&normalized)));
                    }
                }
                None => {
                    if !(flags.create || flags.exclusive) {
                        return Err(VfsError::not_found(Self::path_str(&normalized)));
                    }
                    Self::check_parent(&entries, &normalized)?;
                    entries.insert(
                        normalized.clone(),
                        Entry::File {
                            data: Vec::new(),
                            attr: FileAttr::file(0, 0o644),
                        },
                    );
                }
            }
        }

        Ok(Box::new(MemoryFile {
            entries: Arc::clone(&self.entries),
            path: normalized,
            pos: 0,
            append: flags.append,
        }))
    }

    async fn mkdir(&self, path: &Path, mode: u32) -> VfsResult<()> {
        let normalized = Self::normalize(path);
        let mut entries = self.entries.write();

        // Check if something already exists
        if entries.contains_key(&normalized) {
            return Err(VfsError::already_exists(Self::path_str(&normalized)));
        }
        Self::check_parent(&entries, &normalized)?;

        entries.insert(
            normalized,
            Entry::Directory {
                attr: FileAttr::directory(mode),
            },
        );
        Ok(())
    }

    async fn remove(&self, path: &Path) -> VfsResult<()> {
        let normalized = Self::normalize(path);

        if normalized.as_os_str().is_empty() {
            return Err(VfsError::permission_denied("cannot remove root"));
        }

        let mut entries = self.entries.write();

        match entries.get(&normalized) {
            Some(Entry::Directory { .. }) => {
                // Check for children
                let has_children = entries
                    .keys()
                    .any(|k| k.parent() == Some(normalized.as_path()));
                if has_children {
                    return Err(VfsError::directory_not_empty(Self::path_str(&normalized)));
                }
            }
            Some(Entry::File { .. }) => {}
            None => return Err(VfsError::not_found(Self::path_str(&normalized))),
        }

        entries.remove(&normalized);
        Ok(())
    }

    async fn rename(&self, from: &Path, to: &Path) -> VfsResult<()> {
        let from_normalized = Self::normalize(from);
        let to_normalized = Self::normalize(to);

        if from_normalized.as_os_str().is_empty() || to_normalized.as_os_str().is_empty() {
            return Err(VfsError::permission_denied("cannot rename root"));
        }
        if to_normalized.starts_with(&from_normalized) && to_normalized != from_normalized {
            return Err(VfsError::invalid_argument(format!(
                "cannot move {} into itself",
                Self::path_str(&from_normalized)
            )));
        }

        let mut entries = self.entries.write();
        Self::check_parent(&entries, &to_normalized)?;

        // Remove source entry
        let entry = entries
            .remove(&from_normalized)
            .ok_or_else(|| VfsError::not_found(Self::path_str(&from_normalized)))?;

        // If it's a directory, we need to rename all children too
        if matches!(entry, Entry::Directory { .. }) {
            let children: Vec<_> = entries
                .keys()
                .filter(|k| k.starts_with(&from_normalized))
                .cloned()
                .collect();

            for child in children {
                if let (Some(child_entry), Ok(relative)) = (
                    entries.remove(&child),
                    child.strip_prefix(&from_normalized),
                ) {
                    entries.insert(to_normalized.join(relative), child_entry);
                }
            }
        }

        // Insert at new location (possibly overwriting)
        entries.insert(to_normalized, entry);
        Ok(())
    }

    async fn chmod(&self, path: &Path, perm: u32) -> VfsResult<()> {
        let normalized = Self::normalize(path);
        let mut entries = self.entries.write();
        let entry = entries
            .get_mut(&normalized)
            .ok_or_else(|| VfsError::not_found(Self::path_str(&normalized)))?;
        let attr = entry.attr_mut();
        attr.perm = perm & crate::vfs::types::PERM_MASK;
        Ok(())
    }

    fn read_only(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_read() {
        let fs = MemoryBackend::new();

        fs.write_all(Path::new("/test.txt"), b"hello world").await.unwrap();

        let data = fs.read_all(Path::new("test.txt")).await.unwrap();
        assert_eq!(data, b"hello world");
        assert_eq!(fs.getattr(Path::new("/test.txt")).await.unwrap().size, 11);
    }

    #[tokio::test]
    async fn test_append_handle() {
        let fs = MemoryBackend::new();
        fs.write_all(Path::new("log"), b"one\n").await.unwrap();

        let flags = OpenFlags {
            append: true,
            ..OpenFlags::write_only()
        };
        let mut file = fs.open(Path::new("log"), flags).await.unwrap();
        file.write_all(b"two\n").await.unwrap();
        drop(file);

        assert_eq!(fs.read_all(Path::new("log")).await.unwrap(), b"one\ntwo\n");
    }

    #[tokio::test]
    async fn test_overwrite_in_place() {
        let fs = MemoryBackend::new();
        fs.write_all(Path::new("f"), b"abcdef").await.unwrap();

        let mut file = fs.open(Path::new("f"), OpenFlags::write_only()).await.unwrap();
        file.write_all(b"XY").await.unwrap();
        drop(file);

        assert_eq!(fs.read_all(Path::new("f")).await.unwrap(), b"XYcdef");
    }

    #[tokio::test]
    async fn test_mkdir_and_readdir() {
        let fs = MemoryBackend::new();

        fs.mkdir(Path::new("/subdir"), 0o755).await.unwrap();
        fs.write_all(Path::new("/subdir/file.txt"), b"").await.unwrap();
        fs.write_all(Path::new("/root.txt"), b"").await.unwrap();

        let entries = fs.readdir(Path::new("/")).await.unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["root.txt", "subdir"]);

        let entries = fs.readdir(Path::new("/subdir")).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "file.txt");
    }

    #[tokio::test]
    async fn test_open_requires_parent() {
        let fs = MemoryBackend::new();

        let err = fs
            .open(Path::new("/missing/f"), OpenFlags::create_truncate())
            .await
            .err()
            .unwrap();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_rmdir_not_empty() {
        let fs = MemoryBackend::new();

        fs.mkdir(Path::new("dir"), 0o755).await.unwrap();
        fs.write_all(Path::new("dir/file.txt"), b"x").await.unwrap();

        let result = fs.remove(Path::new("dir")).await;
        assert!(matches!(result, Err(VfsError::DirectoryNotEmpty(_))));
    }

    #[tokio::test]
    async fn test_rename_dir() {
        let fs = MemoryBackend::new();

        fs.mkdir(Path::new("old"), 0o755).await.unwrap();
        fs.write_all(Path::new("old/file.txt"), b"content").await.unwrap();

        fs.rename(Path::new("old"), Path::new("new")).await.unwrap();

        assert!(!fs.exists(Path::new("old")).await);
        assert!(fs.exists(Path::new("new")).await);
        let data = fs.read_all(Path::new("new/file.txt")).await.unwrap();
        assert_eq!(data, b"content");
    }

    #[tokio::test]
    async fn test_chmod() {
        let fs = MemoryBackend::new();
        fs.write_all(Path::new("f"), b"").await.unwrap();
        fs.chmod(Path::new("f"), 0o4600).await.unwrap();
        assert_eq!(fs.getattr(Path::new("f")).await.unwrap().perm, 0o600);
    }
}
