use std::path::Path;

/// The single accepted extension for inbound files (case-sensitive,
/// matching the upstream container naming convention).
pub const ACCEPTED_EXTENSION: &str = ".btx";

/// Case-sensitive suffix check on the inbound filename.
pub fn has_accepted_extension(file_name: &str) -> bool {
    file_name.ends_with(ACCEPTED_EXTENSION)
}

/// Derives a safe base name (no extension) from a user-supplied filename,
/// for use in staged file paths.
///
/// Strips any path components, drops the extension, and replaces path
/// separators and reserved characters so a hostile filename cannot escape
/// the workspace directories.
pub fn sanitize_base_name(file_name: &str) -> String {
    let name = Path::new(file_name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");

    if file_name.contains("..") || file_name.contains('/') || file_name.contains('\\') {
        tracing::warn!("path traversal attempt in filename: {}", file_name);
    }

    let stem = Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("");

    let sanitized: String = stem
        .chars()
        .map(|c| {
            if c.is_control()
                || c == '/'
                || c == '\\'
                || c == ':'
                || c == '*'
                || c == '?'
                || c == '"'
                || c == '<'
                || c == '>'
                || c == '|'
                || c == ';'
            {
                '_'
            } else {
                c
            }
        })
        .collect();

    if sanitized.is_empty() {
        "texture".to_string()
    } else {
        sanitized
    }
}
