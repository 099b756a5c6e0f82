//! Folder name sanitization for collection directories.

/// Characters that cannot appear in a path segment on common filesystems.
const ILLEGAL_CHARS: [char; 9] = ['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Turns an arbitrary title into a safe single path segment.
///
/// Illegal characters and control characters become spaces, whitespace runs
/// collapse to one space, and the result is trimmed. Empty results and the
/// `.`/`..` segments become `fallback`.
///
/// The function is idempotent: `sanitize_name(&sanitize_name(x, f), f) == sanitize_name(x, f)`
/// for any fallback that is itself already sanitized.
#[must_use]
pub fn sanitize_name(name: &str, fallback: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| {
            if ILLEGAL_CHARS.contains(&c) || c.is_control() {
                ' '
            } else {
                c
            }
        })
        .collect();

    let collapsed = replaced.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.is_empty() || collapsed == "." || collapsed == ".." {
        fallback.to_string()
    } else {
        collapsed
    }
}
