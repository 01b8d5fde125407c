//! HTTP HEAD / metadata probing.
//!
//! Uses the curl crate (libcurl) to fetch response headers so the resolver can
//! pick up a server-suggested filename from `Content-Disposition`.

mod parse;

use anyhow::{Context, Result};
use std::str;
use std::time::Duration;

/// Redirect hops followed before the probe gives up.
const MAX_REDIRECTS: u32 = 10;

/// Key headers returned by a HEAD request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeadResult {
    /// Total size in bytes, if `Content-Length` is present.
    pub content_length: Option<u64>,
    /// `Content-Type` value if present.
    pub content_type: Option<String>,
    /// `Content-Disposition` value if present (filename hint).
    pub content_disposition: Option<String>,
}

/// Performs a HEAD request and returns parsed metadata.
///
/// Follows up to 10 redirects; the whole exchange (connect included) is capped
/// at `timeout`. Non-2xx final responses are errors.
/// Runs in the current thread; call from `spawn_blocking` if used from async code.
pub fn probe(url: &str, user_agent: &str, timeout: Duration) -> Result<HeadResult> {
    let mut lines: Vec<String> = Vec::new();

    let mut easy = curl::easy::Easy::new();
    easy.url(url).context("invalid URL")?;
    easy.nobody(true)?;
    easy.follow_location(true)?;
    easy.max_redirections(MAX_REDIRECTS)?;
    easy.useragent(user_agent)?;
    easy.connect_timeout(timeout)?;
    easy.timeout(timeout)?;

    {
        let mut transfer = easy.transfer();
        transfer.header_function(|data| {
            if let Ok(s) = str::from_utf8(data) {
                let line = s.trim_end();
                // A status line starts a new response (after a redirect); keep only the last one.
                if line.starts_with("HTTP/") {
                    lines.clear();
                }
                lines.push(line.to_string());
            }
            true
        })?;
        transfer.perform().context("HEAD request failed")?;
    }

    let code = easy.response_code().context("no response code")?;
    if !(200..300).contains(&code) {
        anyhow::bail!("HEAD {} returned HTTP {}", url, code);
    }

    Ok(parse::parse_headers(&lines))
}
