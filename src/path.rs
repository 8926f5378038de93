// Remote path handling. Dropbox addresses the root folder with the empty
// string and everything else with a leading slash, so the shell keeps its
// current directory in exactly that shape.

/// Resolve `to_path` against the current remote directory `from_path`.
///
/// Backslashes are treated as separators. A leading `/` discards the current
/// directory. `..` drops the last segment (and is a no-op at the root), `.` and
/// empty segments are ignored. The result is either `""` for the root or a
/// path with a single leading slash and no trailing slash.
pub fn change_path(from_path: &str, to_path: &str) -> String {
    let to_path = to_path.replace('\\', "/");

    let mut segments: Vec<&str> = if to_path.starts_with('/') {
        Vec::new()
    } else {
        from_path.split('/').filter(|s| !s.is_empty()).collect()
    };

    for segment in to_path.split('/') {
        match segment {
            ".." => {
                segments.pop();
            }
            "" | "." => {}
            other => segments.push(other),
        }
    }

    if segments.is_empty() {
        String::new()
    } else {
        format!("/{}", segments.join("/"))
    }
}

/// Human-facing form of a remote path: the root is shown as `/`.
pub fn display(path: &str) -> &str {
    if path.is_empty() {
        "/"
    } else {
        path
    }
}

/// Last segment of a path, local or remote. Used to default the target name
/// of `get` and `put`.
pub fn file_name(path: &str) -> Option<&str> {
    path.rsplit(|c: char| c == '/' || c == '\\').find(|s| !s.is_empty() && *s != "." && *s != "..")
}
