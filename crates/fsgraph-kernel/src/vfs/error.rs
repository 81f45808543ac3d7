//! VFS error types.

use std::io;
use thiserror::Error;

/// VFS error type.
#[derive(Debug, Error)]
pub enum VfsError {
    /// File or directory not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Path already exists.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// Permission denied.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Filesystem is read-only.
    #[error("filesystem is read-only")]
    ReadOnly,

    /// Expected a directory.
    #[error("not a directory: {0}")]
    NotADirectory(String),

    /// Expected a file.
    #[error("is a directory: {0}")]
    IsADirectory(String),

    /// Directory not empty.
    #[error("directory not empty: {0}")]
    DirectoryNotEmpty(String),

    /// Path escapes root (security violation).
    #[error("path escapes root: {0}")]
    PathEscapesRoot(String),

    /// Bad encoding, open flag, or malformed input data.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(io::Error),

    /// Other error.
    #[error("{0}")]
    Other(String),
}

/// Coarse error classification for callers that branch on the kind of
/// failure instead of its message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    PermissionDenied,
    NotADirectory,
    IsADirectory,
    DirectoryNotEmpty,
    InvalidArgument,
    Io,
}

impl VfsError {
    /// Create a NotFound error.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound(path.into())
    }

    /// Create an AlreadyExists error.
    pub fn already_exists(path: impl Into<String>) -> Self {
        Self::AlreadyExists(path.into())
    }

    /// Create a PermissionDenied error.
    pub fn permission_denied(path: impl Into<String>) -> Self {
        Self::PermissionDenied(path.into())
    }

    /// Create a NotADirectory error.
    pub fn not_a_directory(path: impl Into<String>) -> Self {
        Self::NotADirectory(path.into())
    }

    /// Create an IsADirectory error.
    pub fn is_a_directory(path: impl Into<String>) -> Self {
        Self::IsADirectory(path.into())
    }

    /// Create a DirectoryNotEmpty error.
    pub fn directory_not_empty(path: impl Into<String>) -> Self {
        Self::DirectoryNotEmpty(path.into())
    }

    /// Create a PathEscapesRoot error.
    pub fn path_escapes_root(path: impl Into<String>) -> Self {
        Self::PathEscapesRoot(path.into())
    }

    /// Create an InvalidArgument error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create an Other error.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            VfsError::NotFound(_) => ErrorKind::NotFound,
            VfsError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            VfsError::PermissionDenied(_)
            | VfsError::ReadOnly
            | VfsError::PathEscapesRoot(_) => ErrorKind::PermissionDenied,
            VfsError::NotADirectory(_) => ErrorKind::NotADirectory,
            VfsError::IsADirectory(_) => ErrorKind::IsADirectory,
            VfsError::DirectoryNotEmpty(_) => ErrorKind::DirectoryNotEmpty,
            VfsError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            VfsError::Io(_) | VfsError::Other(_) => ErrorKind::Io,
        }
    }

    /// Returns true if the path did not exist.
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

/// Map OS errors onto the taxonomy so "not found" and friends survive the
/// trip through the backing store.
impl From<io::Error> for VfsError {
    fn from(e: io::Error) -> Self {
        let msg = e.to_string();
        match e.kind() {
            io::ErrorKind::NotFound => VfsError::NotFound(msg),
            io::ErrorKind::AlreadyExists => VfsError::AlreadyExists(msg),
            io::ErrorKind::PermissionDenied => VfsError::PermissionDenied(msg),
            io::ErrorKind::NotADirectory => VfsError::NotADirectory(msg),
            io::ErrorKind::IsADirectory => VfsError::IsADirectory(msg),
            io::ErrorKind::DirectoryNotEmpty => VfsError::DirectoryNotEmpty(msg),
            io::ErrorKind::InvalidInput => VfsError::InvalidArgument(msg),
            _ => VfsError::Io(e),
        }
    }
}

/// VFS result type.
pub type VfsResult<T> = Result<T, VfsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_kinds_are_preserved() {
        let err: VfsError = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert!(err.is_not_found());

        let err: VfsError = io::Error::new(io::ErrorKind::AlreadyExists, "dup").into();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);

        let err: VfsError = io::Error::other("disk on fire").into();
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(ErrorKind::NotFound.as_ref(), "not_found");
        assert_eq!(ErrorKind::InvalidArgument.to_string(), "invalid_argument");
        assert_eq!(VfsError::ReadOnly.kind(), ErrorKind::PermissionDenied);
    }
}
