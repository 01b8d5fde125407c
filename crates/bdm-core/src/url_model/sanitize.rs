//! Filesystem-safe filename sanitization.

/// Longest filename accepted by common filesystems (Linux NAME_MAX).
const NAME_MAX: usize = 255;

/// Device names that cannot be used as filenames on some filesystems.
const RESERVED_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Sanitizes a candidate filename.
///
/// - Replaces `< > : " / \ | ? *`, NUL and control characters with `_`
/// - Collapses consecutive replacement underscores
/// - Trims leading/trailing whitespace and dots
/// - Limits length to 255 bytes
///
/// May return an empty string; callers substitute a synthetic name.
pub fn sanitize_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev_replaced = false;

    for c in name.chars() {
        let unsafe_char = matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*')
            || c.is_control();
        if unsafe_char {
            if !prev_replaced {
                out.push('_');
            }
            prev_replaced = true;
        } else {
            out.push(c);
            prev_replaced = false;
        }
    }

    let trimmed = out.trim_matches(|c: char| c.is_whitespace() || c == '.');

    if trimmed.len() > NAME_MAX {
        let mut take = NAME_MAX;
        while take > 0 && !trimmed.is_char_boundary(take) {
            take -= 1;
        }
        trimmed[..take].to_string()
    } else {
        trimmed.to_string()
    }
}

/// True for `.`, `..` and reserved device names (case-insensitive, with or
/// without an extension, e.g. `nul.txt`).
pub fn is_reserved_name(name: &str) -> bool {
    if name == "." || name == ".." {
        return true;
    }
    let stem = name.split('.').next().unwrap_or(name);
    RESERVED_NAMES
        .iter()
        .any(|r| r.eq_ignore_ascii_case(stem))
}
