//! Locator lists from files or stdin.

use anyhow::{Context, Result};
use std::io::Read;
use std::path::Path;

/// Splits `text` into locators: one per line or comma-separated, blank
/// entries and `#` comment lines ignored.
pub fn parse_locators(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#'))
        .flat_map(|line| line.split(','))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Reads locators from `path`; `-` reads stdin.
pub fn read_locators(path: &Path) -> Result<Vec<String>> {
    let text = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("reading URLs from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("reading URLs from {}", path.display()))?
    };
    Ok(parse_locators(&text))
}
