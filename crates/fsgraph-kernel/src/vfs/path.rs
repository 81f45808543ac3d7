//! Lexical path handling for served paths.
//!
//! Served paths are slash-separated and absolute relative to the served root.
//! Everything here is purely lexical: no filesystem access, no symlinks.

/// Normalize a served path.
///
/// The result always begins with `/`. Empty and `.` become `/`, duplicate
/// slashes and `.` components are dropped, and `..` pops a component
/// (clamped at the root).
pub fn clean(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for component in path.split('/') {
        match component {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            name => parts.push(name),
        }
    }
    format!("/{}", parts.join("/"))
}

/// Join `name` onto `base` and normalize.
pub fn join(base: &str, name: &str) -> String {
    clean(&format!("{base}/{name}"))
}

/// Lexical parent of a path. The root is its own parent.
pub fn parent(path: &str) -> String {
    join(path, "..")
}

/// Last component of a path; empty for the root.
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or("")
}

/// Every proper ancestor of `path` from the root down, excluding `/` and the
/// path itself. `/a/b/c` yields `/a`, `/a/b`.
pub fn ancestors(path: &str) -> Vec<String> {
    let cleaned = clean(path);
    let mut out = Vec::new();
    let mut current = String::new();
    let components: Vec<&str> = cleaned.split('/').filter(|c| !c.is_empty()).collect();
    for component in components.iter().take(components.len().saturating_sub(1)) {
        current.push('/');
        current.push_str(component);
        out.push(current.clone());
    }
    out
}

/// Returns true if `path` is `/`.
pub fn is_root(path: &str) -> bool {
    path == "/"
}
