//! Wire types for the JSON-lines protocol.
//!
//! Each request is one line:
//!
//! ```json
//! {"id": 1, "op": "contents", "path": "/notes.txt", "encoding": "auto"}
//! ```
//!
//! and gets one response line carrying the same `id`, with either a
//! `result` or an `error`:
//!
//! ```json
//! {"id": 1, "result": {"data": "hi", "encoding": "utf8", "next": null, "warning": null}}
//! {"id": 1, "error": {"kind": "not_found", "message": "not found: ..."}}
//! ```
//!
//! Negative `first`, `maxBytes` and `seek` values mean "not given".

use serde::{Deserialize, Serialize};
use serde_json::Value;

use fsgraph_kernel::VfsError;

use crate::constants::INVALID_REQUEST;

/// One request line.
#[derive(Debug, Deserialize)]
pub struct Request {
    /// Echoed back untouched.
    #[serde(default)]
    pub id: Value,
    #[serde(flatten)]
    pub op: Op,
}

/// Operation and its parameters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Op {
    /// The root directory.
    Root,
    /// A directory, or null if missing.
    Cd { path: String },
    /// Any entry, or null if missing.
    File { path: String },
    /// An entry below a directory, or null if missing.
    Child { dir: String, name: String },
    /// The containing directory, or null for the root.
    Parent { path: String },
    Children {
        path: String,
        #[serde(default)]
        first: Option<i64>,
    },
    Contents {
        path: String,
        #[serde(default)]
        encoding: Option<String>,
        #[serde(default, rename = "maxBytes")]
        max_bytes: Option<i64>,
        #[serde(default)]
        seek: Option<i64>,
    },
    Write {
        path: String,
        contents: String,
        #[serde(default)]
        open: Vec<String>,
        #[serde(default)]
        encoding: Option<String>,
    },
    Remove { path: String },
    Rename {
        path: String,
        #[serde(rename = "newName")]
        new_name: String,
    },
    Chmod { path: String, mode: u32 },
    Mkdir { path: String },
    MkdirAll { path: String },
    /// The graph's own ID and the hex scope.
    Scope,
}

impl Op {
    pub fn name(&self) -> &'static str {
        match self {
            Op::Root => "root",
            Op::Cd { .. } => "cd",
            Op::File { .. } => "file",
            Op::Child { .. } => "child",
            Op::Parent { .. } => "parent",
            Op::Children { .. } => "children",
            Op::Contents { .. } => "contents",
            Op::Write { .. } => "write",
            Op::Remove { .. } => "remove",
            Op::Rename { .. } => "rename",
            Op::Chmod { .. } => "chmod",
            Op::Mkdir { .. } => "mkdir",
            Op::MkdirAll { .. } => "mkdir_all",
            Op::Scope => "scope",
        }
    }
}

/// Drop negative wire values.
pub fn non_negative(value: Option<i64>) -> Option<u64> {
    value.and_then(|v| u64::try_from(v).ok())
}

/// A failure, classified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub kind: String,
    pub message: String,
}

impl ErrorBody {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: INVALID_REQUEST.to_string(),
            message: message.into(),
        }
    }
}

impl From<&VfsError> for ErrorBody {
    fn from(e: &VfsError) -> Self {
        Self {
            kind: e.kind().to_string(),
            message: e.to_string(),
        }
    }
}

/// One response line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl Response {
    pub fn ok(id: Value, result: Value) -> Self {
        Self {
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn err(id: Value, error: ErrorBody) -> Self {
        Self {
            id,
            result: None,
            error: Some(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_requests() {
        let req: Request = serde_json::from_str(r#"{"id": 7, "op": "root"}"#).unwrap();
        assert_eq!(req.id, json!(7));
        assert_eq!(req.op, Op::Root);

        let req: Request = serde_json::from_str(
            r#"{"id": "a", "op": "contents", "path": "/f", "maxBytes": 10, "seek": -1}"#,
        )
        .unwrap();
        assert_eq!(
            req.op,
            Op::Contents {
                path: "/f".into(),
                encoding: None,
                max_bytes: Some(10),
                seek: Some(-1),
            }
        );

        let req: Request =
            serde_json::from_str(r#"{"op": "rename", "path": "/a", "newName": "b"}"#).unwrap();
        assert_eq!(req.id, Value::Null);
        assert_eq!(req.op.name(), "rename");

        let req: Request = serde_json::from_str(r#"{"op": "mkdir_all", "path": "/x/y"}"#).unwrap();
        assert_eq!(req.op, Op::MkdirAll { path: "/x/y".into() });
    }

    #[test]
    fn test_reject_malformed() {
        assert!(serde_json::from_str::<Request>(r#"{"op": "explode"}"#).is_err());
        assert!(serde_json::from_str::<Request>(r#"{"op": "cd"}"#).is_err());
        assert!(serde_json::from_str::<Request>("not json").is_err());
    }

    #[test]
    fn test_non_negative() {
        assert_eq!(non_negative(None), None);
        assert_eq!(non_negative(Some(-1)), None);
        assert_eq!(non_negative(Some(0)), Some(0));
        assert_eq!(non_negative(Some(42)), Some(42));
    }

    #[test]
    fn test_response_shape() {
        let ok = serde_json::to_value(Response::ok(json!(1), Value::Null)).unwrap();
        assert_eq!(ok, json!({"id": 1, "result": null}));

        let err = Response::err(json!(2), ErrorBody::from(&VfsError::not_found("/x")));
        let err = serde_json::to_value(err).unwrap();
        assert_eq!(
            err,
            json!({"id": 2, "error": {"kind": "not_found", "message": "not found: /x"}})
        );
    }
}
