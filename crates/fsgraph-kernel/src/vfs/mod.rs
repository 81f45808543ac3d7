//! Virtual Filesystem abstraction.
//!
//! Path-based storage behind the file graph. Key components:
//!
//! - [`VfsOps`] - Core trait for filesystem operations
//! - [`VfsFile`] - An open handle, closed on drop
//! - [`LocalBackend`] - Local filesystem access (with path security)
//! - [`MemoryBackend`] - In-memory filesystem (for testing)
//! - [`OverlayBackend`] - Copy-on-write layer over another backend
//!
//! ## Design Decisions
//!
//! - **Path-based, no inodes**: Operations use served paths (`/a/b`),
//!   resolved against the backend's root.
//! - **Lexical containment first**: `..` is clamped by [`path::clean`]
//!   before a backend ever sees the path; backends then reject symlinks
//!   that leave the root.

pub mod backends;
mod error;
mod ops;
pub mod path;
mod types;

pub use backends::{LocalBackend, MemoryBackend, OverlayBackend, OverlayScratch};
pub use error::{ErrorKind, VfsError, VfsResult};
pub use ops::{VfsFile, VfsOps};
pub use types::{DirEntry, FileAttr, FileType, OpenFlags, PERM_MASK};
