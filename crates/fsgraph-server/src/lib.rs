//! fsgraph server library
//!
//! Serves an [`FsGraph`](fsgraph_kernel::FsGraph) over newline-delimited
//! JSON on TCP. Each line in is one [`Request`]; each line out is one
//! [`Response`].

pub mod config;
pub mod constants;
pub mod dispatch;
pub mod listener;
pub mod protocol;

pub use config::{Args, ServerConfig};
pub use listener::Listener;
pub use protocol::{ErrorBody, Op, Request, Response};
