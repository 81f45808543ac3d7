//! # fsgraph-kernel
//!
//! Sandboxed, typed access to one directory tree.
//!
//! The kernel has two layers:
//! - [`vfs`]: path-based backing stores behind the [`VfsOps`] trait. A real
//!   directory ([`LocalBackend`]), an in-memory tree ([`MemoryBackend`]),
//!   and a copy-on-write [`OverlayBackend`] that keeps every mutation out of
//!   the store it wraps.
//! - [`graph`]: the [`FsGraph`] facade. Stable IDs, typed entries, bounded
//!   and resumable content reads, and mutations that report an [`OpResult`].

pub mod graph;
pub mod vfs;

pub use graph::{
    Directory, Encoding, EntryInfo, FileContents, FileEntry, FileId, FileMode, FileOpen, FsGraph,
    OpResult, OtherFile, ReadOptions, RegularFile, Scope,
};
pub use vfs::{
    ErrorKind, FileAttr, FileType, LocalBackend, MemoryBackend, OverlayBackend, OverlayScratch,
    VfsError, VfsOps, VfsResult,
};
