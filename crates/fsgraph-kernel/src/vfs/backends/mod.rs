//! VFS backends.
//!
//! Backends implement [`VfsOps`](super::VfsOps) for different storage types.

mod local;
mod memory;
mod overlay;

pub use local::LocalBackend;
pub use memory::MemoryBackend;
pub use overlay::{OverlayBackend, OverlayScratch};
