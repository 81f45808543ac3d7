//! VFS operations traits.
//!
//! [`VfsOps`] is the backing store: path-based, async, stateless between
//! calls. [`VfsFile`] is an open handle returned by [`VfsOps::open`]; the
//! handle is released when it is dropped, so every exit path of a caller
//! (including `?` returns and cancelled futures) closes it.

use async_trait::async_trait;
use std::path::Path;

use super::types::{DirEntry, FileAttr, OpenFlags};
use super::{VfsError, VfsResult};

/// An open file.
#[async_trait]
pub trait VfsFile: Send {
    /// Read into `buf` at the current position. Returns 0 at EOF.
    async fn read(&mut self, buf: &mut [u8]) -> VfsResult<usize>;

    /// Write all of `data` at the current position (or at EOF in append mode).
    async fn write_all(&mut self, data: &[u8]) -> VfsResult<()>;

    /// Seek to an absolute offset. Returns the new position.
    async fn seek(&mut self, offset: u64) -> VfsResult<u64>;

    /// Current stream position.
    async fn position(&mut self) -> VfsResult<u64>;

    /// Attributes of the open file as they are now.
    async fn stat(&self) -> VfsResult<FileAttr>;

    /// Push buffered writes down to the store.
    async fn flush(&mut self) -> VfsResult<()>;
}

/// Core VFS operations trait.
///
/// Paths are relative to the backend's root; a leading `/` is accepted and
/// means the same thing.
#[async_trait]
pub trait VfsOps: Send + Sync {
    // ========================================================================
    // Reading
    // ========================================================================

    /// Get file attributes, following a trailing symlink.
    async fn getattr(&self, path: &Path) -> VfsResult<FileAttr>;

    /// Read directory entries.
    ///
    /// Returns all entries in the directory. Ordering is backend-defined;
    /// callers must not rely on it.
    async fn readdir(&self, path: &Path) -> VfsResult<Vec<DirEntry>>;

    /// Open a file.
    async fn open(&self, path: &Path, flags: OpenFlags) -> VfsResult<Box<dyn VfsFile>>;

    // ========================================================================
    // Writing
    // ========================================================================

    /// Create a single directory. The parent must exist.
    async fn mkdir(&self, path: &Path, mode: u32) -> VfsResult<()>;

    /// Remove a file or an empty directory.
    async fn remove(&self, path: &Path) -> VfsResult<()>;

    /// Rename a file or directory.
    async fn rename(&self, from: &Path, to: &Path) -> VfsResult<()>;

    /// Set permission bits.
    async fn chmod(&self, path: &Path, perm: u32) -> VfsResult<()>;

    // ========================================================================
    // Metadata
    // ========================================================================

    /// Returns true if this filesystem is read-only.
    fn read_only(&self) -> bool;

    // ========================================================================
    // Convenience methods (default implementations)
    // ========================================================================

    /// Check if a path exists.
    async fn exists(&self, path: &Path) -> bool {
        self.getattr(path).await.is_ok()
    }

    /// Create a directory and any missing parents.
    ///
    /// Succeeds if the directory already exists; fails with NotADirectory if
    /// any component exists as something else.
    async fn mkdir_all(&self, path: &Path, mode: u32) -> VfsResult<()> {
        let target = super::path::clean(&path.to_string_lossy());
        let mut chain = super::path::ancestors(&target);
        if target != "/" {
            chain.push(target);
        }
        for dir in chain {
            match self.getattr(Path::new(&dir)).await {
                Ok(attr) if attr.is_dir() => continue,
                Ok(_) => return Err(VfsError::not_a_directory(dir)),
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(e),
            }
            if let Err(e) = self.mkdir(Path::new(&dir), mode).await {
                // Lost a race with another creator; fine as long as it's a dir.
                let raced = matches!(e, VfsError::AlreadyExists(_))
                    && self
                        .getattr(Path::new(&dir))
                        .await
                        .map(|attr| attr.is_dir())
                        .unwrap_or(false);
                if !raced {
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    /// Read an entire file.
    async fn read_all(&self, path: &Path) -> VfsResult<Vec<u8>> {
        let mut file = self.open(path, OpenFlags::read()).await?;
        let mut out = Vec::new();
        let mut chunk = vec![0u8; 64 * 1024];
        loop {
            let n = file.read(&mut chunk).await?;
            if n == 0 {
                break;
            }
            out.extend_from_slice(&chunk[..n]);
        }
        Ok(out)
    }

    /// Write entire file contents, creating or truncating it.
    async fn write_all(&self, path: &Path, data: &[u8]) -> VfsResult<()> {
        let mut file = self.open(path, OpenFlags::create_truncate()).await?;
        file.write_all(data).await?;
        file.flush().await
    }
}
