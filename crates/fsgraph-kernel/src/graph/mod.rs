//! The file graph.
//!
//! [`FsGraph`] is the typed face of a backing store: it resolves paths into
//! [`FileEntry`] values carrying stable IDs, lists directories, reads
//! contents in bounded windows, and applies mutations. It holds no state
//! besides the store handle and the scope, so it is cheap to share behind
//! an `Arc` across any number of concurrent requests.
//!
//! ```text
//! request ──► FsGraph ──► Arc<dyn VfsOps> ──► Local | Overlay(Local, Local) | Memory
//!               │
//!               └─ Scope ──► FileId
//! ```

mod contents;
mod entry;
mod identity;
mod result;
mod write;

pub use contents::{Encoding, FileContents, READ_CAP, ReadOptions, looks_binary};
pub use entry::{Directory, EntryInfo, FileEntry, FileMode, OtherFile, RegularFile};
pub use identity::{FileId, SCOPE_LEN, Scope};
pub use result::OpResult;
pub use write::{FileOpen, decode_payload};

use std::path::Path;
use std::sync::Arc;

use crate::vfs::path as vpath;
use crate::vfs::{PERM_MASK, VfsError, VfsOps, VfsResult};

/// Mode requested for new directories, before the umask.
const DIR_MODE: u32 = 0o777;

/// Turn NotFound into `None`.
fn optional<T>(result: VfsResult<T>) -> VfsResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

/// Typed access to one served tree.
pub struct FsGraph {
    store: Arc<dyn VfsOps>,
    scope: Scope,
}

impl std::fmt::Debug for FsGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsGraph")
            .field("scope", &self.scope)
            .field("read_only", &self.store.read_only())
            .finish()
    }
}

impl FsGraph {
    pub fn new(store: Arc<dyn VfsOps>, scope: Scope) -> Self {
        Self { store, scope }
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// ID of the graph itself: the scope with an empty path.
    pub fn id(&self) -> FileId {
        self.scope.id("")
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    /// Stat `path` and classify it.
    #[tracing::instrument(skip(self), name = "fsgraph.resolve")]
    pub async fn resolve(&self, path: &str) -> VfsResult<FileEntry> {
        let path = vpath::clean(path);
        let attr = self.store.getattr(Path::new(&path)).await?;
        Ok(FileEntry::from_attr(&self.scope, &path, &attr))
    }

    /// Like [`resolve`](Self::resolve), but a missing path is `None`.
    pub async fn file(&self, path: &str) -> VfsResult<Option<FileEntry>> {
        optional(self.resolve(path).await)
    }

    /// Resolve a path that must be a directory.
    pub async fn resolve_directory(&self, path: &str) -> VfsResult<Directory> {
        let entry = self.resolve(path).await?;
        match entry {
            FileEntry::Directory(dir) => Ok(dir),
            other => Err(VfsError::not_a_directory(other.path())),
        }
    }

    pub async fn resolve_root(&self) -> VfsResult<Directory> {
        self.resolve_directory("/").await
    }

    /// Change directory: a missing path is `None`, a non-directory an error.
    pub async fn cd(&self, path: &str) -> VfsResult<Option<Directory>> {
        optional(self.resolve_directory(path).await)
    }

    /// Look up `name` below `dir`. The name is cleaned first, so it can
    /// reach into subdirectories but never above `dir`.
    pub async fn child(&self, dir: &Directory, name: &str) -> VfsResult<Option<FileEntry>> {
        self.file(&vpath::join(&dir.path, &vpath::clean(name))).await
    }

    /// The containing directory, or `None` for the root.
    pub async fn parent(&self, entry: &EntryInfo) -> VfsResult<Option<Directory>> {
        let parent = vpath::parent(&entry.path);
        if parent == entry.path {
            return Ok(None);
        }
        self.resolve_directory(&parent).await.map(Some)
    }

    /// Immediate children of `dir`, at most `first` of them.
    ///
    /// Order is whatever the store yields and differs between stores.
    #[tracing::instrument(skip(self, dir), fields(path = %dir.path), name = "fsgraph.children")]
    pub async fn children(&self, dir: &Directory, first: Option<usize>) -> VfsResult<Vec<FileEntry>> {
        let mut entries = self.store.readdir(Path::new(&dir.path)).await?;
        if let Some(first) = first {
            entries.truncate(first);
        }
        Ok(entries
            .iter()
            .map(|e| FileEntry::from_attr(&self.scope, &vpath::join(&dir.path, &e.name), &e.attr))
            .collect())
    }

    /// Read one window of `file`.
    #[tracing::instrument(skip(self, file), fields(path = %file.path), name = "fsgraph.contents")]
    pub async fn contents(&self, file: &RegularFile, opts: &ReadOptions) -> VfsResult<FileContents> {
        let contents = contents::read_contents(self.store.as_ref(), &file.path, opts).await?;
        tracing::debug!(
            encoding = %contents.encoding,
            next = ?contents.next,
            "read contents"
        );
        Ok(contents)
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Write `contents` to `path`.
    ///
    /// The payload is decoded before the store is touched, so a bad encoding
    /// or malformed base64 leaves the file alone.
    #[tracing::instrument(skip(self, contents), name = "fsgraph.write")]
    pub async fn write(
        &self,
        path: &str,
        contents: &str,
        open: &[FileOpen],
        encoding: Encoding,
    ) -> VfsResult<OpResult> {
        let path = vpath::clean(path);
        let data = decode_payload(contents, encoding)?;

        let mut file = self.store.open(Path::new(&path), FileOpen::flags(open)).await?;
        file.write_all(&data).await?;
        file.flush().await?;
        drop(file);

        tracing::debug!(bytes = data.len(), "file written");
        Ok(OpResult::file("file written", path))
    }

    /// Remove a file or empty directory. Already gone is a warning.
    #[tracing::instrument(skip(self), name = "fsgraph.remove")]
    pub async fn remove(&self, path: &str) -> VfsResult<OpResult> {
        let path = vpath::clean(path);
        match self.store.remove(Path::new(&path)).await {
            Ok(()) => Ok(OpResult::done("removed")),
            Err(e) if e.is_not_found() => {
                tracing::debug!(error = %e, "nothing to remove");
                Ok(OpResult::warning(e.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    /// Rename within the same parent directory.
    #[tracing::instrument(skip(self), name = "fsgraph.rename")]
    pub async fn rename(&self, path: &str, new_name: &str) -> VfsResult<OpResult> {
        if new_name.is_empty() {
            return Err(VfsError::invalid_argument("new name is empty"));
        }
        let path = vpath::clean(path);
        let new_path = vpath::join(&vpath::parent(&path), new_name);
        self.store
            .rename(Path::new(&path), Path::new(&new_path))
            .await?;
        Ok(OpResult::file("renamed", new_path))
    }

    /// Set permission bits; anything outside `0o777` is dropped.
    #[tracing::instrument(skip(self), name = "fsgraph.chmod")]
    pub async fn chmod(&self, path: &str, perm: u32) -> VfsResult<OpResult> {
        let path = vpath::clean(path);
        self.store.chmod(Path::new(&path), perm & PERM_MASK).await?;
        Ok(OpResult::file("mode changed", path))
    }

    #[tracing::instrument(skip(self), name = "fsgraph.mkdir")]
    pub async fn mkdir(&self, path: &str) -> VfsResult<OpResult> {
        let path = vpath::clean(path);
        self.store.mkdir(Path::new(&path), DIR_MODE).await?;
        Ok(OpResult::file("directory created", path))
    }

    #[tracing::instrument(skip(self), name = "fsgraph.mkdir_all")]
    pub async fn mkdir_all(&self, path: &str) -> VfsResult<OpResult> {
        let path = vpath::clean(path);
        self.store.mkdir_all(Path::new(&path), DIR_MODE).await?;
        Ok(OpResult::file("directory created", path))
    }

    /// The file a result points at, if it points at one that still exists.
    pub async fn result_file(&self, result: &OpResult) -> VfsResult<Option<FileEntry>> {
        match result.path() {
            Some(path) => self.file(path).await,
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vfs::{FileType, LocalBackend, MemoryBackend, OverlayBackend};
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;
    use tempfile::TempDir;

    /// file1, file2 and a/b/c/file3 under a fresh directory.
    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("file1"), "File one.").unwrap();
        std::fs::write(dir.path().join("file2"), "File two.").unwrap();
        std::fs::create_dir_all(dir.path().join("a/b/c")).unwrap();
        std::fs::write(dir.path().join("a/b/c/file3"), "File three.").unwrap();
        dir
    }

    fn local_graph(dir: &TempDir) -> FsGraph {
        FsGraph::new(Arc::new(LocalBackend::new(dir.path())), Scope::from_seed("test"))
    }

    fn names(entries: &[FileEntry]) -> Vec<String> {
        let mut names: Vec<String> = entries.iter().map(|e| e.name().to_string()).collect();
        names.sort();
        names
    }

    async fn regular(graph: &FsGraph, path: &str) -> RegularFile {
        match graph.resolve(path).await.unwrap() {
            FileEntry::Regular(f) => f,
            other => panic!("{path} is not a regular file: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_root() {
        let dir = fixture();
        let graph = local_graph(&dir);

        let root = graph.resolve_root().await.unwrap();
        assert_eq!(root.path, "/");
        assert_eq!(root.name, "");
        assert!(graph.parent(&root).await.unwrap().is_none());
        assert_eq!(graph.id(), graph.scope().id(""));
        assert_ne!(graph.id(), root.id);
    }

    #[tokio::test]
    async fn test_children_and_first() {
        let dir = fixture();
        let graph = local_graph(&dir);
        let root = graph.resolve_root().await.unwrap();

        let all = graph.children(&root, None).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(names(&all), vec!["a", "file1", "file2"]);
        for entry in &all {
            let expected = if entry.name() == "a" { FileType::Directory } else { FileType::Regular };
            assert_eq!(entry.info().mode.kind, expected);
            assert_eq!(entry.path(), format!("/{}", entry.name()));
        }

        assert_eq!(graph.children(&root, Some(2)).await.unwrap().len(), 2);
        assert_eq!(graph.children(&root, Some(10)).await.unwrap().len(), 3);
        assert!(graph.children(&root, Some(0)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_navigation() {
        let dir = fixture();
        let graph = local_graph(&dir);

        let c = graph.cd("/a/b/c").await.unwrap().unwrap();
        let file3 = graph.child(&c, "file3").await.unwrap().unwrap();
        assert_eq!(file3.path(), "/a/b/c/file3");
        assert!(graph.child(&c, "nope").await.unwrap().is_none());

        let b = graph.parent(&c).await.unwrap().unwrap();
        assert_eq!(b.path, "/a/b");
        let parent_of_file = graph.parent(file3.info()).await.unwrap().unwrap();
        assert_eq!(parent_of_file.path, "/a/b/c");

        assert!(graph.cd("/missing").await.unwrap().is_none());
        assert!(graph.file("/missing").await.unwrap().is_none());
        let err = graph.cd("/file1").await.unwrap_err();
        assert!(matches!(err, VfsError::NotADirectory(_)));
        let err = graph.resolve("/missing").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_child_stays_below_dir() {
        let dir = fixture();
        let graph = local_graph(&dir);

        let a = graph.cd("/a").await.unwrap().unwrap();
        assert!(graph.child(&a, "../file1").await.unwrap().is_none());
        let c = graph.child(&a, "b/c").await.unwrap().unwrap();
        assert_eq!(c.path(), "/a/b/c");
    }

    #[tokio::test]
    async fn test_ids_follow_paths() {
        let dir = fixture();
        let graph = local_graph(&dir);

        let file1 = graph.resolve("/file1").await.unwrap();
        let again = graph.resolve("file1").await.unwrap();
        let file2 = graph.resolve("/file2").await.unwrap();
        assert_eq!(file1.info().id, again.info().id);
        assert_ne!(file1.info().id, file2.info().id);

        // Another process with the same seed agrees.
        let other = local_graph(&dir);
        assert_eq!(other.resolve("/file1").await.unwrap().info().id, file1.info().id);
    }

    #[tokio::test]
    async fn test_utf8_round_trip() {
        let dir = fixture();
        let graph = local_graph(&dir);

        let text = "héllo, wörld\n";
        let result = graph
            .write("/new.txt", text, &[FileOpen::Create], Encoding::Utf8)
            .await
            .unwrap();
        assert_eq!(result.message(), Some("file written"));
        assert_eq!(result.path(), Some("/new.txt"));

        let file = regular(&graph, "/new.txt").await;
        let contents = graph
            .contents(&file, &ReadOptions::new(Encoding::Utf8))
            .await
            .unwrap();
        assert_eq!(contents.data, text);
        assert_eq!(contents.encoding, Encoding::Utf8);
        assert!(contents.next.is_none());
        assert!(contents.warning.is_none());
    }

    #[tokio::test]
    async fn test_base64_round_trip() {
        let dir = fixture();
        let graph = local_graph(&dir);

        let bytes: Vec<u8> = (0..=255u8).collect();
        graph
            .write("/bin", &STANDARD.encode(&bytes), &[FileOpen::New], Encoding::Base64)
            .await
            .unwrap();

        let file = regular(&graph, "/bin").await;
        let contents = graph
            .contents(&file, &ReadOptions::new(Encoding::Base64))
            .await
            .unwrap();
        assert_eq!(contents.encoding, Encoding::Base64);
        assert_eq!(STANDARD.decode(&contents.data).unwrap(), bytes);
    }

    #[tokio::test]
    async fn test_auto_detection() {
        let dir = fixture();
        std::fs::write(dir.path().join("text"), "hello world").unwrap();
        std::fs::write(dir.path().join("half_nul"), b"a\0b\0c\0d\0e\0f\0").unwrap();
        let graph = local_graph(&dir);

        let text = regular(&graph, "/text").await;
        let c = graph.contents(&text, &ReadOptions::default()).await.unwrap();
        assert_eq!(c.encoding, Encoding::Utf8);
        assert_eq!(c.data, "hello world");

        let bin = regular(&graph, "/half_nul").await;
        let c = graph.contents(&bin, &ReadOptions::default()).await.unwrap();
        assert_eq!(c.encoding, Encoding::Base64);
        assert_eq!(c.decode().unwrap(), b"a\0b\0c\0d\0e\0f\0");
    }

    #[tokio::test]
    async fn test_utf8_invalid_warns() {
        let dir = fixture();
        std::fs::write(dir.path().join("latin1"), b"caf\xe9").unwrap();
        let graph = local_graph(&dir);

        let file = regular(&graph, "/latin1").await;
        let c = graph
            .contents(&file, &ReadOptions::new(Encoding::Utf8))
            .await
            .unwrap();
        assert_eq!(c.data, "caf\u{FFFD}");
        assert_eq!(c.warning.as_deref(), Some("Invalid UTF-8 encountered"));
    }

    #[tokio::test]
    async fn test_pagination_over_cap() {
        let dir = fixture();
        let len = READ_CAP as usize * 2 + 12345;
        let original: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
        std::fs::write(dir.path().join("big"), &original).unwrap();
        let graph = local_graph(&dir);
        let file = regular(&graph, "/big").await;

        let mut collected = Vec::new();
        let mut opts = ReadOptions::new(Encoding::Auto).with_max_bytes(u64::MAX);
        let mut calls = 0;
        loop {
            let chunk = graph.contents(&file, &opts).await.unwrap();
            let bytes = chunk.decode().unwrap();
            assert!(bytes.len() as u64 <= READ_CAP);
            collected.extend_from_slice(&bytes);
            calls += 1;
            match chunk.next {
                Some(next) => {
                    assert_eq!(next, collected.len() as u64);
                    opts = opts.with_seek(next);
                }
                None => break,
            }
        }
        assert_eq!(calls, 3);
        assert_eq!(collected, original);
    }

    #[tokio::test]
    async fn test_write_modes() {
        let dir = fixture();
        let graph = local_graph(&dir);

        // No flags: overwrite in place.
        graph.write("/file1", "FILE", &[], Encoding::Utf8).await.unwrap();
        assert_eq!(std::fs::read_to_string(dir.path().join("file1")).unwrap(), "FILE one.");

        graph
            .write("/file1", " Again.", &[FileOpen::Append], Encoding::Utf8)
            .await
            .unwrap();
        assert_eq!(
            std::fs::read_to_string(dir.path().join("file1")).unwrap(),
            "FILE one. Again."
        );

        graph
            .write("/file1", "short", &[FileOpen::Truncate], Encoding::Utf8)
            .await
            .unwrap();
        assert_eq!(std::fs::read_to_string(dir.path().join("file1")).unwrap(), "short");

        // No create flag: missing file is an error.
        let err = graph.write("/nope", "x", &[], Encoding::Utf8).await.unwrap_err();
        assert!(err.is_not_found());
    }

    async fn truncate_then_append(graph: &FsGraph) -> String {
        graph
            .write("/f", "old contents", &[FileOpen::Create], Encoding::Utf8)
            .await
            .unwrap();
        let result = graph
            .write("/f", "new", &[FileOpen::Truncate, FileOpen::Append], Encoding::Utf8)
            .await
            .unwrap();
        assert_eq!(result.message(), Some("file written"));
        let f = regular(graph, "/f").await;
        graph.contents(&f, &ReadOptions::default()).await.unwrap().data
    }

    #[tokio::test]
    async fn test_truncate_with_append_on_every_store() {
        let dir = TempDir::new().unwrap();
        assert_eq!(truncate_then_append(&local_graph(&dir)).await, "new");
        assert_eq!(std::fs::read_to_string(dir.path().join("f")).unwrap(), "new");

        let memory = FsGraph::new(Arc::new(MemoryBackend::new()), Scope::from_seed("mem"));
        assert_eq!(truncate_then_append(&memory).await, "new");

        let base = TempDir::new().unwrap();
        let (overlay, scratch) =
            OverlayBackend::protect(Arc::new(LocalBackend::new(base.path()))).unwrap();
        let protected = FsGraph::new(Arc::new(overlay), Scope::from_seed("overlay"));
        assert_eq!(truncate_then_append(&protected).await, "new");
        assert!(!base.path().join("f").exists());
        drop(protected);
        scratch.cleanup().unwrap();
    }

    #[tokio::test]
    async fn test_result_file_gone() {
        let dir = fixture();
        let graph = local_graph(&dir);

        let result = graph.chmod("/file1", 0o600).await.unwrap();
        std::fs::remove_file(dir.path().join("file1")).unwrap();
        assert!(graph.result_file(&result).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_write_new_on_existing_fails() {
        let dir = fixture();
        let graph = local_graph(&dir);

        let err = graph
            .write("/file2", "clobber", &[FileOpen::New], Encoding::Utf8)
            .await
            .unwrap_err();
        assert!(matches!(err, VfsError::AlreadyExists(_)));
        assert_eq!(std::fs::read_to_string(dir.path().join("file2")).unwrap(), "File two.");
    }

    #[tokio::test]
    async fn test_bad_encoding_touches_nothing() {
        let dir = fixture();
        let graph = local_graph(&dir);

        let err = graph
            .write("/created", "x", &[FileOpen::Create], Encoding::Auto)
            .await
            .unwrap_err();
        assert!(matches!(err, VfsError::InvalidArgument(_)));

        let err = graph
            .write("/created", "!!!", &[FileOpen::Create], Encoding::Base64)
            .await
            .unwrap_err();
        assert!(matches!(err, VfsError::InvalidArgument(_)));
        assert!(!dir.path().join("created").exists());

        assert!(matches!(
            Encoding::parse("nope").unwrap_err(),
            VfsError::InvalidArgument(_)
        ));
    }

    #[tokio::test]
    async fn test_remove_twice() {
        let dir = fixture();
        let graph = local_graph(&dir);

        let first = graph.remove("/file1").await.unwrap();
        assert_eq!(first.message(), Some("removed"));
        assert!(graph.result_file(&first).await.unwrap().is_none());

        let second = graph.remove("/file1").await.unwrap();
        assert!(second.is_warning());
        assert!(second.warning_text().unwrap().contains("not found"));

        let err = graph.remove("/a").await.unwrap_err();
        assert!(matches!(err, VfsError::DirectoryNotEmpty(_)));
    }

    #[tokio::test]
    async fn test_rename() {
        let dir = fixture();
        let graph = local_graph(&dir);

        let result = graph.rename("/a/b/c/file3", "renamed").await.unwrap();
        assert_eq!(result.message(), Some("renamed"));
        assert_eq!(result.path(), Some("/a/b/c/renamed"));
        let entry = graph.result_file(&result).await.unwrap().unwrap();
        assert_eq!(entry.name(), "renamed");
        assert!(graph.file("/a/b/c/file3").await.unwrap().is_none());

        let err = graph.rename("/file1", "").await.unwrap_err();
        assert!(matches!(err, VfsError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_chmod_masks() {
        let dir = fixture();
        let graph = local_graph(&dir);

        let result = graph.chmod("/file1", 0o104600).await.unwrap();
        assert_eq!(result.message(), Some("mode changed"));
        let entry = graph.resolve("/file1").await.unwrap();
        assert_eq!(entry.info().mode.perm, 0o600);
    }

    #[tokio::test]
    async fn test_mkdir() {
        let dir = fixture();
        let graph = local_graph(&dir);

        let result = graph.mkdir("/fresh").await.unwrap();
        assert_eq!(result.message(), Some("directory created"));
        assert!(graph.cd("/fresh").await.unwrap().is_some());

        let err = graph.mkdir("/x/y").await.unwrap_err();
        assert!(err.is_not_found());
        let err = graph.mkdir("/fresh").await.unwrap_err();
        assert!(matches!(err, VfsError::AlreadyExists(_)));

        graph.mkdir_all("/x/y/z").await.unwrap();
        graph.mkdir_all("/x/y/z").await.unwrap();
        assert!(graph.cd("/x/y/z").await.unwrap().is_some());

        let err = graph.mkdir_all("/file1/sub").await.unwrap_err();
        assert!(matches!(err, VfsError::NotADirectory(_)));
    }

    #[tokio::test]
    async fn test_protected_remove_keeps_real_file() {
        let dir = fixture();
        let base: Arc<dyn VfsOps> = Arc::new(LocalBackend::new(dir.path()));
        let (overlay, scratch) = OverlayBackend::protect(base).unwrap();
        let graph = FsGraph::new(Arc::new(overlay), Scope::from_seed("test"));

        graph.remove("/file1").await.unwrap();
        graph
            .write("/file2", "changed", &[FileOpen::Truncate], Encoding::Utf8)
            .await
            .unwrap();

        let root = graph.resolve_root().await.unwrap();
        assert_eq!(names(&graph.children(&root, None).await.unwrap()), vec!["a", "file2"]);
        assert!(graph.file("/file1").await.unwrap().is_none());
        let file2 = regular(&graph, "/file2").await;
        let c = graph.contents(&file2, &ReadOptions::default()).await.unwrap();
        assert_eq!(c.data, "changed");

        drop(graph);
        scratch.cleanup().unwrap();
        assert_eq!(std::fs::read_to_string(dir.path().join("file1")).unwrap(), "File one.");
        assert_eq!(std::fs::read_to_string(dir.path().join("file2")).unwrap(), "File two.");
    }

    #[tokio::test]
    async fn test_memory_store() {
        let graph = FsGraph::new(Arc::new(MemoryBackend::new()), Scope::from_seed("mem"));
        graph.mkdir_all("/a/b").await.unwrap();
        graph
            .write("/a/b/f", "data", &[FileOpen::Create], Encoding::Utf8)
            .await
            .unwrap();

        let a = graph.cd("/a").await.unwrap().unwrap();
        let kids = graph.children(&a, None).await.unwrap();
        assert_eq!(names(&kids), vec!["b"]);
        let f = regular(&graph, "/a/b/f").await;
        assert_eq!(f.size, 4);
    }
}
