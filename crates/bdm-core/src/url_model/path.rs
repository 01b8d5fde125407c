//! Filename and host extraction from a locator.

use super::content_disposition::percent_decode;

/// Extracts the last path segment from a URL for use as a filename hint.
///
/// Returns `None` if the URL cannot be parsed, the path is empty or the root,
/// or the path ends with a slash (a directory listing rather than a file).
pub fn filename_from_url_path(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let path = parsed.path();
    if path.ends_with('/') {
        return None;
    }
    let segment = path.rsplit('/').next()?;
    let segment = percent_decode(segment);
    if segment.is_empty() || segment == "." || segment == ".." {
        return None;
    }
    Some(segment)
}

/// Host component of the URL (without port), if any.
pub fn host_from_url(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    parsed
        .host_str()
        .filter(|h| !h.is_empty())
        .map(str::to_string)
}
