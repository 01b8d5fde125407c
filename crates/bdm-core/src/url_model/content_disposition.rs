//! Content-Disposition header parsing (filename and filename*).

/// Extracts the filename from a raw Content-Disposition header value.
///
/// Supports:
/// - `filename="value"` (quoted; strips quotes and unescapes)
/// - `filename=value` (token)
/// - `filename*=charset'lang'percent-encoded` (RFC 5987; decoded)
///
/// If both `filename` and `filename*` exist, `filename*` takes precedence.
pub fn parse_content_disposition_filename(header_value: &str) -> Option<String> {
    let mut plain: Option<String> = None;

    for param in header_value.trim().split(';') {
        let Some((name, v)) = param.trim().split_once('=') else {
            continue;
        };
        let name = name.trim();
        let v = v.trim();

        if name.eq_ignore_ascii_case("filename*") {
            if let Some(decoded) = decode_ext_value(v) {
                return Some(decoded);
            }
        } else if name.eq_ignore_ascii_case("filename") {
            let unquoted = if v.len() >= 2 && v.starts_with('"') && v.ends_with('"') {
                decode_quoted_filename(&v[1..v.len() - 1])
            } else {
                v.trim_matches(|c| c == '\'' || c == '"').to_string()
            };
            if !unquoted.is_empty() {
                plain = Some(unquoted);
            }
        }
    }

    plain
}

/// Decodes an RFC 5987 ext-value (`UTF-8''caf%C3%A9.txt`). The charset and
/// language parts are ignored; the value is decoded as UTF-8 (lossy).
fn decode_ext_value(v: &str) -> Option<String> {
    let v = v.trim_matches(|c| c == '"' || c == ' ');
    let mut parts = v.splitn(3, '\'');
    let (_charset, _lang, encoded) = (parts.next()?, parts.next()?, parts.next()?);
    let decoded = percent_decode(encoded);
    if decoded.is_empty() {
        None
    } else {
        Some(decoded)
    }
}

/// Decode backslash-escaped quotes in a quoted filename value.
fn decode_quoted_filename(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(&next) = chars.peek() {
                if next == '"' || next == '\\' {
                    out.push(next);
                    chars.next();
                    continue;
                }
            }
        }
        out.push(c);
    }
    out
}

/// Percent-decode; malformed escapes are kept literally, invalid UTF-8 is replaced.
pub(super) fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(h), Some(l)) = (hex_digit(bytes[i + 1]), hex_digit(bytes[i + 2])) {
                out.push(h << 4 | l);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}
