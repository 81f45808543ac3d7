//! Local filesystem backend.
//!
//! Provides access to real filesystem paths, with path security
//! to prevent escaping the root directory.

use async_trait::async_trait;
use std::io::SeekFrom;
use std::os::unix::fs::{MetadataExt, PermissionsExt};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};

use crate::vfs::error::{VfsError, VfsResult};
use crate::vfs::ops::{VfsFile, VfsOps};
use crate::vfs::path as vpath;
use crate::vfs::types::{DirEntry, FileAttr, OpenFlags};

/// Local filesystem backend.
///
/// All operations are relative to `root`. For example, if `root` is
/// `/srv/data`, then `getattr("/src/main.rs")` stats
/// `/srv/data/src/main.rs`.
///
/// Path security is enforced: `..` is clamped lexically at the root, and
/// symlinks resolving outside the root are rejected.
#[derive(Debug, Clone)]
pub struct LocalBackend {
    root: PathBuf,
    read_only: bool,
}

impl LocalBackend {
    /// Create a new local filesystem rooted at the given path.
    ///
    /// The root is canonicalized at construction time to handle symlinks
    /// (e.g. macOS `/tmp` → `/private/tmp`).
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root: PathBuf = root.into();
        let root = dunce::canonicalize(&root).unwrap_or(root);
        Self {
            root,
            read_only: false,
        }
    }

    /// Set whether this filesystem is read-only.
    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    /// Get the root path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Join a served path onto the root without touching the disk.
    fn join_root(&self, path: &Path) -> PathBuf {
        let cleaned = vpath::clean(&path.to_string_lossy());
        let relative = cleaned.trim_start_matches('/');
        if relative.is_empty() {
            self.root.clone()
        } else {
            self.root.join(relative)
        }
    }

    /// Verify a canonical path is under the root.
    fn contained(&self, canonical: PathBuf) -> VfsResult<PathBuf> {
        if canonical.starts_with(&self.root) {
            Ok(canonical)
        } else {
            Err(VfsError::path_escapes_root(format!(
                "{} is not under {}",
                canonical.display(),
                self.root.display()
            )))
        }
    }

    /// Resolve a served path to an absolute path within the root, following
    /// symlinks.
    async fn resolve(&self, path: &Path) -> VfsResult<PathBuf> {
        let full = self.join_root(path);

        let canonical = match fs::canonicalize(&full).await {
            Ok(canonical) => canonical,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // For new files, canonicalize parent and append filename
                let (Some(parent), Some(filename)) = (full.parent(), full.file_name()) else {
                    return Err(e.into());
                };
                match fs::canonicalize(parent).await {
                    Ok(parent) => parent.join(filename),
                    // Parent doesn't exist, will fail on actual operation
                    Err(_) => full,
                }
            }
            Err(e) => return Err(e.into()),
        };

        self.contained(canonical)
    }

    /// Resolve a served path without following a trailing symlink.
    ///
    /// Used by operations that act on the directory entry itself.
    async fn resolve_entry(&self, path: &Path) -> VfsResult<PathBuf> {
        let full = self.join_root(path);
        let (Some(parent), Some(filename)) = (full.parent(), full.file_name()) else {
            return Ok(self.root.clone());
        };
        if full == self.root {
            return Ok(full);
        }
        let parent = fs::canonicalize(parent).await?;
        self.contained(parent.join(filename))
    }

    /// Check if write operations are allowed.
    fn check_writable(&self) -> VfsResult<()> {
        if self.read_only {
            Err(VfsError::ReadOnly)
        } else {
            Ok(())
        }
    }

    /// Convert std::fs::Metadata to FileAttr.
    fn metadata_to_attr(meta: &std::fs::Metadata) -> FileAttr {
        FileAttr::from_mode(
            meta.mode(),
            meta.len(),
            meta.modified().unwrap_or(std::time::SystemTime::UNIX_EPOCH),
        )
    }
}

/// Open handle on a local file.
struct LocalFile {
    file: fs::File,
}

#[async_trait]
impl VfsFile for LocalFile {
    async fn read(&mut self, buf: &mut [u8]) -> VfsResult<usize> {
        Ok(self.file.read(buf).await?)
    }

    async fn write_all(&mut self, data: &[u8]) -> VfsResult<()> {
        Ok(self.file.write_all(data).await?)
    }

    async fn seek(&mut self, offset: u64) -> VfsResult<u64> {
        Ok(self.file.seek(SeekFrom::Start(offset)).await?)
    }

    async fn position(&mut self) -> VfsResult<u64> {
        Ok(self.file.stream_position().await?)
    }

    async fn stat(&self) -> VfsResult<FileAttr> {
        let meta = self.file.metadata().await?;
        Ok(LocalBackend::metadata_to_attr(&meta))
    }

    async fn flush(&mut self) -> VfsResult<()> {
        Ok(self.file.flush().await?)
    }
}

#[async_trait]
impl VfsOps for LocalBackend {
    async fn getattr(&self, path: &Path) -> VfsResult<FileAttr> {
        let full_path = self.resolve(path).await?;
        let meta = fs::metadata(&full_path).await?;
        Ok(Self::metadata_to_attr(&meta))
    }

    async fn readdir(&self, path: &Path) -> VfsResult<Vec<DirEntry>> {
        let full_path = self.resolve(path).await?;
        let mut entries = Vec::new();
        let mut dir = fs::read_dir(&full_path).await?;

        // Kept in the order the OS hands them out.
        while let Some(entry) = dir.next_entry().await? {
            let meta = entry.metadata().await?;
            entries.push(DirEntry::new(
                entry.file_name().to_string_lossy().into_owned(),
                Self::metadata_to_attr(&meta),
            ));
        }

        Ok(entries)
    }

    async fn open(&self, path: &Path, flags: OpenFlags) -> VfsResult<Box<dyn VfsFile>> {
        if flags.write || flags.append {
            self.check_writable()?;
        }
        let full_path = self.resolve(path).await?;

        // OpenOptions refuses truncate with append; the OS does not.
        let truncate_after = flags.truncate && flags.append;
        let file = fs::OpenOptions::new()
            .read(flags.read || !(flags.write || flags.append))
            .write(flags.write)
            .append(flags.append)
            .truncate(flags.truncate && !flags.append)
            .create(flags.create)
            .create_new(flags.exclusive)
            .mode(0o666)
            .open(&full_path)
            .await?;
        if truncate_after {
            file.set_len(0).await?;
        }

        Ok(Box::new(LocalFile { file }))
    }

    async fn mkdir(&self, path: &Path, mode: u32) -> VfsResult<()> {
        self.check_writable()?;
        let full_path = self.resolve(path).await?;

        fs::DirBuilder::new()
            .mode(mode)
            .create(&full_path)
            .await?;
        Ok(())
    }

    async fn remove(&self, path: &Path) -> VfsResult<()> {
        self.check_writable()?;
        let full_path = self.resolve_entry(path).await?;
        if full_path == self.root {
            return Err(VfsError::permission_denied("cannot remove root"));
        }

        let meta = fs::symlink_metadata(&full_path).await?;
        if meta.is_dir() {
            fs::remove_dir(&full_path).await?;
        } else {
            fs::remove_file(&full_path).await?;
        }
        Ok(())
    }

    async fn rename(&self, from: &Path, to: &Path) -> VfsResult<()> {
        self.check_writable()?;
        let from_path = self.resolve_entry(from).await?;
        let to_path = self.resolve_entry(to).await?;
        if from_path == self.root || to_path == self.root {
            return Err(VfsError::permission_denied("cannot rename root"));
        }

        fs::rename(&from_path, &to_path).await?;
        Ok(())
    }

    async fn chmod(&self, path: &Path, perm: u32) -> VfsResult<()> {
        self.check_writable()?;
        let full_path = self.resolve(path).await?;

        fs::set_permissions(&full_path, std::fs::Permissions::from_mode(perm)).await?;
        Ok(())
    }

    fn read_only(&self) -> bool {
        self.read_only
    }
}
