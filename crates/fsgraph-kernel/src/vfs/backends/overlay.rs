//! Copy-on-write overlay backend.
//!
//! An `OverlayBackend` composes a read-through `base` store and a writable
//! `layer` store. Reads look in the layer first and fall back to the base.
//! Every mutation lands in the layer, so the base is never written.
//!
//! Removing something the base has records a *whiteout*: the path, and
//! everything under it, stops being visible from the base. A directory
//! recreated over a whiteout becomes *opaque* so the base's old children
//! don't reappear inside it.
//!
//! Whiteouts live in memory for the life of the overlay, the same as the
//! temporary layer directory created by [`OverlayBackend::protect`].

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

use crate::vfs::backends::LocalBackend;
use crate::vfs::error::{VfsError, VfsResult};
use crate::vfs::ops::{VfsFile, VfsOps};
use crate::vfs::path as vpath;
use crate::vfs::types::{DirEntry, FileAttr, OpenFlags};

/// Chunk size used when copying a file up into the layer.
const COPY_CHUNK: usize = 64 * 1024;

/// Base + layer composition with copy-on-write semantics.
pub struct OverlayBackend {
    base: Arc<dyn VfsOps>,
    layer: Arc<dyn VfsOps>,
    /// Base paths hidden by a removal in the overlay.
    whiteouts: RwLock<HashSet<String>>,
    /// Layer directories whose base children are hidden.
    opaque: RwLock<HashSet<String>>,
}

impl std::fmt::Debug for OverlayBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlayBackend")
            .field("whiteouts", &self.whiteouts.read().len())
            .field("opaque", &self.opaque.read().len())
            .finish()
    }
}

/// The temporary directory holding a protected overlay's layer.
///
/// Call [`OverlayScratch::cleanup`] at shutdown. If the guard is dropped
/// instead, removal is still attempted but failures go unreported.
#[derive(Debug)]
pub struct OverlayScratch {
    dir: TempDir,
}

impl OverlayScratch {
    /// Location of the layer on disk.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Delete the layer directory. Failure is logged and returned, never
    /// fatal to the caller's shutdown.
    pub fn cleanup(self) -> std::io::Result<()> {
        let path = self.dir.path().to_path_buf();
        match self.dir.close() {
            Ok(()) => {
                tracing::info!(path = %path.display(), "cleaned up overlay");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "unable to clean up overlay");
                Err(e)
            }
        }
    }
}

impl OverlayBackend {
    /// Compose `layer` over `base`.
    pub fn new(base: Arc<dyn VfsOps>, layer: Arc<dyn VfsOps>) -> Self {
        Self {
            base,
            layer,
            whiteouts: RwLock::new(HashSet::new()),
            opaque: RwLock::new(HashSet::new()),
        }
    }

    /// Protect `base` behind a layer in a fresh temporary directory.
    pub fn protect(base: Arc<dyn VfsOps>) -> VfsResult<(Self, OverlayScratch)> {
        let dir = tempfile::Builder::new().prefix("fsgraph").tempdir()?;
        tracing::info!(path = %dir.path().display(), "protected: temporary overlay dir");
        let layer: Arc<dyn VfsOps> = Arc::new(LocalBackend::new(dir.path()));
        Ok((Self::new(base, layer), OverlayScratch { dir }))
    }

    fn key(path: &Path) -> String {
        vpath::clean(&path.to_string_lossy())
    }

    /// Is the base's copy of `path` hidden?
    fn hidden(&self, path: &str) -> bool {
        if vpath::is_root(path) {
            return false;
        }
        let whiteouts = self.whiteouts.read();
        let opaque = self.opaque.read();
        if whiteouts.contains(path) {
            return true;
        }
        vpath::ancestors(path)
            .iter()
            .any(|a| whiteouts.contains(a) || opaque.contains(a))
    }

    /// Attributes from the layer, or `None` if the layer has nothing there.
    async fn layer_attr(&self, path: &str) -> VfsResult<Option<FileAttr>> {
        match self.layer.getattr(Path::new(path)).await {
            Ok(attr) => Ok(Some(attr)),
            Err(e) if is_absent(&e) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Attributes from the base, or `None` if absent or hidden.
    async fn base_attr(&self, path: &str) -> VfsResult<Option<FileAttr>> {
        if self.hidden(path) {
            return Ok(None);
        }
        match self.base.getattr(Path::new(path)).await {
            Ok(attr) => Ok(Some(attr)),
            Err(e) if is_absent(&e) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Make sure `dir` and its ancestors exist as directories in the layer.
    async fn copy_up_dirs(&self, dir: &str) -> VfsResult<()> {
        let mut chain = vpath::ancestors(dir);
        if !vpath::is_root(dir) {
            chain.push(dir.to_string());
        }
        for d in chain {
            if self.layer_attr(&d).await?.is_some() {
                continue;
            }
            let attr = self.getattr(Path::new(&d)).await?;
            if !attr.is_dir() {
                return Err(VfsError::not_a_directory(d));
            }
            tracing::debug!(path = %d, "overlay: copy up directory");
            self.layer.mkdir(Path::new(&d), attr.perm).await?;
        }
        Ok(())
    }

    /// Copy a base file into the layer, optionally without its contents.
    async fn copy_up_file(&self, path: &str, with_contents: bool) -> VfsResult<()> {
        let attr = self.base.getattr(Path::new(path)).await?;
        self.copy_up_dirs(&vpath::parent(path)).await?;
        tracing::debug!(path, with_contents, "overlay: copy up file");

        let mut dst = self
            .layer
            .open(Path::new(path), OpenFlags::create_truncate())
            .await?;
        if with_contents {
            let mut src = self.base.open(Path::new(path), OpenFlags::read()).await?;
            let mut buf = vec![0u8; COPY_CHUNK];
            loop {
                let n = src.read(&mut buf).await?;
                if n == 0 {
                    break;
                }
                dst.write_all(&buf[..n]).await?;
            }
        }
        dst.flush().await?;
        drop(dst);
        self.layer.chmod(Path::new(path), attr.perm).await
    }

    /// Copy `path` into the layer if only the base has it.
    async fn copy_up(&self, path: &str, attr: &FileAttr) -> VfsResult<()> {
        if self.layer_attr(path).await?.is_some() {
            return Ok(());
        }
        if attr.is_dir() {
            self.copy_up_dirs(path).await
        } else if attr.is_file() {
            self.copy_up_file(path, true).await
        } else {
            Err(VfsError::other(format!(
                "cannot copy {} ({}) into the overlay",
                path, attr.kind
            )))
        }
    }

    /// Copy `root` and everything visible under it into the layer.
    async fn copy_up_tree(&self, root: &str) -> VfsResult<()> {
        let mut pending = vec![root.to_string()];
        while let Some(path) = pending.pop() {
            let attr = self.getattr(Path::new(&path)).await?;
            self.copy_up(&path, &attr).await?;
            if attr.is_dir() {
                for entry in self.readdir(Path::new(&path)).await? {
                    pending.push(vpath::join(&path, &entry.name));
                }
            }
        }
        Ok(())
    }

    /// The merged parent of `path` must exist and be a directory.
    async fn check_parent(&self, path: &str) -> VfsResult<String> {
        let parent = vpath::parent(path);
        let attr = self.getattr(Path::new(&parent)).await?;
        if !attr.is_dir() {
            return Err(VfsError::not_a_directory(parent));
        }
        Ok(parent)
    }
}

/// NotFound, or a path component that turned out to be a file.
fn is_absent(e: &VfsError) -> bool {
    matches!(e, VfsError::NotFound(_) | VfsError::NotADirectory(_))
}

#[async_trait]
impl VfsOps for OverlayBackend {
    async fn getattr(&self, path: &Path) -> VfsResult<FileAttr> {
        let key = Self::key(path);
        // The layer's root is the scratch directory, not the served root.
        if vpath::is_root(&key) {
            return self.base.getattr(path).await;
        }
        if let Some(attr) = self.layer_attr(&key).await? {
            return Ok(attr);
        }
        self.base_attr(&key)
            .await?
            .ok_or_else(|| VfsError::not_found(key))
    }

    async fn readdir(&self, path: &Path) -> VfsResult<Vec<DirEntry>> {
        let key = Self::key(path);

        let layer_entries = match self.layer.readdir(Path::new(&key)).await {
            Ok(entries) => Some(entries),
            Err(e) if is_absent(&e) => None,
            Err(e) => return Err(e),
        };

        let base_visible = !self.hidden(&key) && !self.opaque.read().contains(&key);
        let base_entries = if base_visible {
            match self.base.readdir(Path::new(&key)).await {
                Ok(entries) => Some(entries),
                Err(e) if is_absent(&e) => None,
                Err(e) if layer_entries.is_some() => {
                    tracing::debug!(path = %key, error = %e, "overlay: base listing unavailable");
                    None
                }
                Err(e) => return Err(e),
            }
        } else {
            None
        };

        match (layer_entries, base_entries) {
            (None, None) => Err(VfsError::not_found(key)),
            (Some(layer), None) => Ok(layer),
            (None, Some(base)) => {
                let whiteouts = self.whiteouts.read();
                Ok(base
                    .into_iter()
                    .filter(|e| !whiteouts.contains(&vpath::join(&key, &e.name)))
                    .collect())
            }
            (Some(layer), Some(base)) => {
                let shadowed: HashSet<String> = layer.iter().map(|e| e.name.clone()).collect();
                let whiteouts = self.whiteouts.read();
                let mut merged = layer;
                merged.extend(base.into_iter().filter(|e| {
                    !shadowed.contains(&e.name)
                        && !whiteouts.contains(&vpath::join(&key, &e.name))
                }));
                Ok(merged)
            }
        }
    }

    async fn open(&self, path: &Path, flags: OpenFlags) -> VfsResult<Box<dyn VfsFile>> {
        let key = Self::key(path);

        if !(flags.write || flags.append) {
            if self.layer_attr(&key).await?.is_some() || self.hidden(&key) {
                return self.layer.open(Path::new(&key), flags).await;
            }
            return self.base.open(Path::new(&key), flags).await;
        }

        if self.layer_attr(&key).await?.is_some() {
            return self.layer.open(Path::new(&key), flags).await;
        }

        match self.base_attr(&key).await? {
            Some(attr) => {
                if flags.exclusive {
                    return Err(VfsError::already_exists(key));
                }
                if attr.is_dir() {
                    return Err(VfsError::is_a_directory(key));
                }
                self.copy_up_file(&key, !flags.truncate).await?;
                self.layer.open(Path::new(&key), flags).await
            }
            None => {
                if !(flags.create || flags.exclusive) {
                    return Err(VfsError::not_found(key));
                }
                let parent = self.check_parent(&key).await?;
                self.copy_up_dirs(&parent).await?;
                let file = self.layer.open(Path::new(&key), flags).await?;
                self.whiteouts.write().remove(&key);
                Ok(file)
            }
        }
    }

    async fn mkdir(&self, path: &Path, mode: u32) -> VfsResult<()> {
        let key = Self::key(path);
        if self.exists(Path::new(&key)).await {
            return Err(VfsError::already_exists(key));
        }
        let parent = self.check_parent(&key).await?;
        self.copy_up_dirs(&parent).await?;
        self.layer.mkdir(Path::new(&key), mode).await?;

        if self.whiteouts.write().remove(&key) {
            self.opaque.write().insert(key);
        }
        Ok(())
    }

    async fn remove(&self, path: &Path) -> VfsResult<()> {
        let key = Self::key(path);
        if vpath::is_root(&key) {
            return Err(VfsError::permission_denied("cannot remove root"));
        }

        let attr = self.getattr(Path::new(&key)).await?;
        if attr.is_dir() && !self.readdir(Path::new(&key)).await?.is_empty() {
            return Err(VfsError::directory_not_empty(key));
        }

        let in_base = self.base_attr(&key).await?.is_some();
        if self.layer_attr(&key).await?.is_some() {
            self.layer.remove(Path::new(&key)).await?;
        }
        if in_base {
            tracing::debug!(path = %key, "overlay: whiteout");
            self.whiteouts.write().insert(key.clone());
        }
        self.opaque.write().remove(&key);
        Ok(())
    }

    async fn rename(&self, from: &Path, to: &Path) -> VfsResult<()> {
        let from_key = Self::key(from);
        let to_key = Self::key(to);
        if vpath::is_root(&from_key) || vpath::is_root(&to_key) {
            return Err(VfsError::permission_denied("cannot rename root"));
        }
        if from_key == to_key {
            return Ok(());
        }

        let attr = self.getattr(Path::new(&from_key)).await?;
        let to_parent = self.check_parent(&to_key).await?;
        let from_in_base = self.base_attr(&from_key).await?.is_some();
        let to_in_base = self.base_attr(&to_key).await?.is_some();

        self.copy_up_tree(&from_key).await?;
        self.copy_up_dirs(&to_parent).await?;
        if to_in_base && self.layer_attr(&to_key).await?.is_none() {
            // Let the layer's rename replace the base entry the way the OS
            // would have.
            let to_attr = self.getattr(Path::new(&to_key)).await?;
            self.copy_up(&to_key, &to_attr).await?;
        }
        self.layer
            .rename(Path::new(&from_key), Path::new(&to_key))
            .await?;

        if from_in_base {
            self.whiteouts.write().insert(from_key.clone());
        }
        self.whiteouts.write().remove(&to_key);
        if attr.is_dir() {
            // The whole subtree was copied; base children under the new
            // name are not part of it.
            self.opaque.write().insert(to_key);
        }
        self.opaque.write().remove(&from_key);
        Ok(())
    }

    async fn chmod(&self, path: &Path, perm: u32) -> VfsResult<()> {
        let key = Self::key(path);
        let attr = self.getattr(Path::new(&key)).await?;
        self.copy_up(&key, &attr).await?;
        self.layer.chmod(Path::new(&key), perm).await
    }

    fn read_only(&self) -> bool {
        false
    }
}
