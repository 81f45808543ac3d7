//! Outcomes of mutating operations.

use serde::Serialize;

/// What a mutation did.
///
/// Expected non-failures, like removing something already gone, are a
/// [`OpResult::Warning`] rather than an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OpResult {
    /// Succeeded; nothing further to point at.
    Done { message: String },
    /// Succeeded; `path` names the affected file.
    File { message: String, path: String },
    /// Succeeded with nothing to do.
    Warning { warning: String },
}

impl OpResult {
    pub(crate) fn done(message: impl Into<String>) -> Self {
        OpResult::Done {
            message: message.into(),
        }
    }

    pub(crate) fn file(message: impl Into<String>, path: impl Into<String>) -> Self {
        OpResult::File {
            message: message.into(),
            path: path.into(),
        }
    }

    pub(crate) fn warning(warning: impl Into<String>) -> Self {
        OpResult::Warning {
            warning: warning.into(),
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            OpResult::Done { message } | OpResult::File { message, .. } => Some(message),
            OpResult::Warning { .. } => None,
        }
    }

    /// Path of the affected file, if the result carries one.
    pub fn path(&self) -> Option<&str> {
        match self {
            OpResult::File { path, .. } => Some(path),
            _ => None,
        }
    }

    pub fn warning_text(&self) -> Option<&str> {
        match self {
            OpResult::Warning { warning } => Some(warning),
            _ => None,
        }
    }

    pub fn is_warning(&self) -> bool {
        matches!(self, OpResult::Warning { .. })
    }
}
