// === Size formatting ===

/// Format file size in human-readable format
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes < KB {
        format!("{} B", bytes)
    } else if bytes < MB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else if bytes < GB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    }
}

// === Remote path helpers ===
//
// Remote paths are plain strings separated by '/'. The disk root is `None`;
// an empty string or a lone "/" is treated as the root too.

pub const SEPARATOR: char = '/';

/// Collapse "" and "/" into `None` (disk root), keep anything else as is.
pub fn normalize_dir(path: Option<&str>) -> Option<String> {
    match path {
        None => None,
        Some(p) if p.trim_matches(SEPARATOR).is_empty() => None,
        Some(p) => Some(p.to_string()),
    }
}

/// Parent of a directory path: drops the last segment.
/// Returns `None` when the parent would be the disk root.
pub fn parent_path(path: &str) -> Option<String> {
    let trimmed = path.trim_end_matches(SEPARATOR);
    let parent = match trimmed.rfind(SEPARATOR) {
        Some(idx) => &trimmed[..idx],
        None => "",
    };
    normalize_dir(Some(parent))
}

/// Last segment of a path.
pub fn basename(path: &str) -> &str {
    let trimmed = path.trim_end_matches(SEPARATOR);
    match trimmed.rfind(SEPARATOR) {
        Some(idx) => &trimmed[idx + 1..],
        None => trimmed,
    }
}

/// Every ancestor prefix of `path` from shallowest to deepest, the path itself
/// included. Empty segments are skipped; a leading separator is preserved.
///
/// `"/a/b/c"` yields `["/a", "/a/b", "/a/b/c"]`, `"a/b"` yields `["a", "a/b"]`.
pub fn path_prefixes(path: &str) -> Vec<String> {
    let lead = if path.starts_with(SEPARATOR) { "/" } else { "" };
    let mut current = String::from(lead);
    let mut prefixes = Vec::new();
    for segment in path.split(SEPARATOR).filter(|s| !s.is_empty()) {
        if current.len() > lead.len() {
            current.push(SEPARATOR);
        }
        current.push_str(segment);
        prefixes.push(current.clone());
    }
    prefixes
}

/// Whether `path` equals `ancestor` or lives somewhere below it.
pub fn is_same_or_descendant(path: &str, ancestor: &str) -> bool {
    let ancestor = ancestor.trim_end_matches(SEPARATOR);
    match path.strip_prefix(ancestor) {
        Some(rest) => rest.is_empty() || rest.starts_with(SEPARATOR),
        None => false,
    }
}

/// Dot files are hidden unless the hidden-files setting is on.
pub fn is_hidden(basename: &str) -> bool {
    basename.starts_with('.')
}

/// Lowercased extension of a basename, without the dot.
pub fn extension_of(basename: &str) -> Option<String> {
    let idx = basename.rfind('.')?;
    if idx == 0 || idx + 1 == basename.len() {
        return None;
    }
    Some(basename[idx + 1..].to_lowercase())
}
