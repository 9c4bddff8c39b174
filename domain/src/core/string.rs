//! String utilities for the domain layer.

/// Marker appended to text that was cut short.
pub const ELLIPSIS: &str = "...";

/// Keep the first `max_chars` characters of `s`, appending [`ELLIPSIS`]
/// only when something was cut.
///
/// Counts `char`s, so multi-byte text is never split mid-character.
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        None => s.to_string(),
        Some((end, _)) => format!("{}{}", &s[..end], ELLIPSIS),
    }
}

/// Byte-bounded prefix of `s` that respects UTF-8 boundaries.
///
/// Used for log previews, never for user-visible titles.
pub fn preview(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
