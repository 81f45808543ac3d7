//! Map protocol operations onto the file graph.

use serde::Serialize;
use serde_json::{Value, json};

use fsgraph_kernel::{
    Encoding, FileEntry, FileOpen, FsGraph, OpResult, ReadOptions, VfsError, VfsResult,
};

use crate::protocol::{Op, non_negative};

fn to_json<T: Serialize>(value: &T) -> VfsResult<Value> {
    serde_json::to_value(value).map_err(|e| VfsError::other(format!("unable to encode result: {e}")))
}

/// Encoding for a read; absent means auto.
fn read_encoding(encoding: Option<&str>) -> VfsResult<Encoding> {
    encoding.map_or(Ok(Encoding::Auto), Encoding::parse)
}

/// Encoding for a write; absent means utf8.
fn write_encoding(encoding: Option<&str>) -> VfsResult<Encoding> {
    encoding.map_or(Ok(Encoding::Utf8), Encoding::parse)
}

/// An [`OpResult`], plus the entry it points at when it points at one.
async fn op_result(graph: &FsGraph, result: OpResult) -> VfsResult<Value> {
    let mut value = to_json(&result)?;
    if let (Some(file), Value::Object(map)) = (graph.result_file(&result).await?, &mut value) {
        map.insert("file".to_string(), to_json(&file)?);
    }
    Ok(value)
}

/// Run one operation.
pub async fn dispatch(graph: &FsGraph, op: Op) -> VfsResult<Value> {
    match op {
        Op::Root => {
            let root = FileEntry::from(graph.resolve_root().await?);
            to_json(&root)
        }
        Op::Cd { path } => {
            let dir = graph.cd(&path).await?.map(FileEntry::from);
            to_json(&dir)
        }
        Op::File { path } => to_json(&graph.file(&path).await?),
        Op::Child { dir, name } => {
            let dir = graph.resolve_directory(&dir).await?;
            to_json(&graph.child(&dir, &name).await?)
        }
        Op::Parent { path } => {
            let entry = graph.resolve(&path).await?;
            let parent = graph.parent(entry.info()).await?.map(FileEntry::from);
            to_json(&parent)
        }
        Op::Children { path, first } => {
            let dir = graph.resolve_directory(&path).await?;
            let first = non_negative(first).map(|n| usize::try_from(n).unwrap_or(usize::MAX));
            to_json(&graph.children(&dir, first).await?)
        }
        Op::Contents {
            path,
            encoding,
            max_bytes,
            seek,
        } => {
            let opts = ReadOptions {
                encoding: read_encoding(encoding.as_deref())?,
                max_bytes: non_negative(max_bytes),
                seek: non_negative(seek),
            };
            let entry = graph.resolve(&path).await?;
            let file = match &entry {
                FileEntry::Regular(file) => file,
                FileEntry::Directory(dir) => return Err(VfsError::is_a_directory(dir.path.clone())),
                FileEntry::Other(other) => {
                    return Err(VfsError::invalid_argument(format!(
                        "not a regular file: {} ({})",
                        other.path, other.mode.kind
                    )));
                }
            };
            to_json(&graph.contents(file, &opts).await?)
        }
        Op::Write {
            path,
            contents,
            open,
            encoding,
        } => {
            let open = FileOpen::parse_all(&open)?;
            let encoding = write_encoding(encoding.as_deref())?;
            let result = graph.write(&path, &contents, &open, encoding).await?;
            op_result(graph, result).await
        }
        Op::Remove { path } => op_result(graph, graph.remove(&path).await?).await,
        Op::Rename { path, new_name } => {
            op_result(graph, graph.rename(&path, &new_name).await?).await
        }
        Op::Chmod { path, mode } => op_result(graph, graph.chmod(&path, mode).await?).await,
        Op::Mkdir { path } => op_result(graph, graph.mkdir(&path).await?).await,
        Op::MkdirAll { path } => op_result(graph, graph.mkdir_all(&path).await?).await,
        Op::Scope => Ok(json!({
            "id": graph.id(),
            "scope": graph.scope().to_hex(),
        })),
    }
}
