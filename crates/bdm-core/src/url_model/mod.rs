//! Locator modeling and filename derivation.
//!
//! Derives safe local filenames from the server's Content-Disposition header
//! or the locator's path, with timestamped synthetic names when neither
//! yields anything usable.

mod content_disposition;
mod path;
mod sanitize;

use chrono::{Local, NaiveDateTime};

pub use content_disposition::parse_content_disposition_filename;
pub use path::{filename_from_url_path, host_from_url};
pub use sanitize::{is_reserved_name, sanitize_filename};

/// Schemes the retrieval tools understand.
const SUPPORTED_SCHEMES: &[&str] = &["http", "https", "ftp"];

/// Synthetic name used when sanitization leaves nothing usable.
pub fn synthetic_filename(now: NaiveDateTime) -> String {
    format!("download_{}", now.format("%Y%m%d_%H%M%S"))
}

/// Derives a safe filename for saving a download, using the local clock for
/// any synthetic name. See [`derive_filename_at`].
pub fn derive_filename(url: &str, content_disposition: Option<&str>) -> String {
    derive_filename_at(url, content_disposition, Local::now().naive_local())
}

/// Derives a safe filename for saving a download.
///
/// Prefers the filename from `content_disposition` (if present and parseable),
/// otherwise the last path segment of `url`. When the path is empty, the root,
/// or ends with a slash, a name of the form `download_from_<host>_<HHMMSS>` is
/// built from the host. Any candidate that sanitizes to an empty or reserved
/// device name becomes `download_<YYYYMMDD_HHMMSS>`.
///
/// # Examples
///
/// - `https://example.com/archive.zip` → `"archive.zip"`
/// - `https://example.com/` with `attachment; filename="report.pdf"` → `"report.pdf"`
/// - `https://example.com/` at 14:03:09 → `"download_from_example.com_140309"`
pub fn derive_filename_at(
    url: &str,
    content_disposition: Option<&str>,
    now: NaiveDateTime,
) -> String {
    let candidate = content_disposition
        .and_then(parse_content_disposition_filename)
        .filter(|s| !s.trim().is_empty())
        .or_else(|| filename_from_url_path(url));

    if let Some(raw) = candidate {
        return usable_or_synthetic(sanitize_filename(&raw), now);
    }

    match host_from_url(url) {
        Some(host) => {
            let host = usable_or_synthetic(sanitize_filename(&host), now);
            format!("download_from_{}_{}", host, now.format("%H%M%S"))
        }
        None => synthetic_filename(now),
    }
}

fn usable_or_synthetic(name: String, now: NaiveDateTime) -> String {
    if name.is_empty() || is_reserved_name(&name) {
        synthetic_filename(now)
    } else {
        name
    }
}

/// Checks that `locator` is an absolute http, https or ftp URL with a host.
pub fn validate_locator(locator: &str) -> Result<(), String> {
    if locator.trim().is_empty() {
        return Err("locator cannot be empty".to_string());
    }
    let parsed = url::Url::parse(locator).map_err(|e| format!("invalid URL format: {}", e))?;
    if !SUPPORTED_SCHEMES.contains(&parsed.scheme()) {
        return Err(format!(
            "unsupported URL scheme: {} (supported: http, https, ftp)",
            parsed.scheme()
        ));
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err("URL must contain a host".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 7)
            .unwrap()
            .and_hms_opt(14, 3, 9)
            .unwrap()
    }

    #[test]
    fn derive_filename_from_url_path() {
        assert_eq!(
            derive_filename_at("https://example.com/archive.zip", None, at()),
            "archive.zip"
        );
        assert_eq!(
            derive_filename_at("https://cdn.example.com/path/to/debian-12.iso", None, at()),
            "debian-12.iso"
        );
    }

    #[test]
    fn derive_filename_from_content_disposition() {
        assert_eq!(
            derive_filename_at(
                "https://example.com/",
                Some("attachment; filename=\"report.pdf\""),
                at()
            ),
            "report.pdf"
        );
    }

    #[test]
    fn content_disposition_overrides_url() {
        assert_eq!(
            derive_filename_at(
                "https://example.com/archive.zip",
                Some("attachment; filename=\"real-name.tar.gz\""),
                at()
            ),
            "real-name.tar.gz"
        );
    }

    #[test]
    fn root_and_trailing_slash_use_host() {
        assert_eq!(
            derive_filename_at("https://example.com/", None, at()),
            "download_from_example.com_140309"
        );
        assert_eq!(
            derive_filename_at("https://example.com", None, at()),
            "download_from_example.com_140309"
        );
        assert_eq!(
            derive_filename_at("https://example.com/files/", None, at()),
            "download_from_example.com_140309"
        );
    }

    #[test]
    fn reserved_names_become_synthetic() {
        assert_eq!(
            derive_filename_at("https://example.com/CON", None, at()),
            "download_20240307_140309"
        );
        assert_eq!(
            derive_filename_at("https://example.com/x", Some("attachment; filename=\"...\""), at()),
            "download_20240307_140309"
        );
    }

    #[test]
    fn same_input_same_name() {
        let a = derive_filename_at("https://example.com/a/b.iso?x=1", None, at());
        let b = derive_filename_at("https://example.com/a/b.iso?x=1", None, at());
        assert_eq!(a, b);
    }

    #[test]
    fn validate_locator_schemes() {
        assert!(validate_locator("https://example.com/file").is_ok());
        assert!(validate_locator("ftp://mirror.example.org/pub/x.tar").is_ok());
        assert!(validate_locator("").is_err());
        assert!(validate_locator("file:///etc/passwd").is_err());
        assert!(validate_locator("not a url").is_err());
    }
}
