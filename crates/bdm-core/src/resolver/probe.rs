//! Header probe seam used by the resolver.

use anyhow::Result;
use std::time::Duration;

use crate::fetch_head::{self, HeadResult};

/// A lightweight metadata request against a locator.
///
/// Implementations block; the resolver runs them on the blocking pool and
/// bounds them with its own timeout as well.
pub trait HeadProbe: Send + Sync {
    fn probe(&self, url: &str, timeout: Duration) -> Result<HeadResult>;
}

/// HEAD request over libcurl.
#[derive(Debug, Clone)]
pub struct CurlProbe {
    user_agent: String,
}

impl CurlProbe {
    pub fn new(user_agent: Option<&str>) -> Self {
        let user_agent = user_agent
            .filter(|ua| !ua.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(default_user_agent);
        Self { user_agent }
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

impl Default for CurlProbe {
    fn default() -> Self {
        Self::new(None)
    }
}

impl HeadProbe for CurlProbe {
    fn probe(&self, url: &str, timeout: Duration) -> Result<HeadResult> {
        fetch_head::probe(url, &self.user_agent, timeout)
    }
}

pub fn default_user_agent() -> String {
    format!("bdm/{}", env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_agent_defaults_when_blank() {
        assert_eq!(CurlProbe::new(None).user_agent(), default_user_agent());
        assert_eq!(CurlProbe::new(Some("  ")).user_agent(), default_user_agent());
        assert_eq!(CurlProbe::new(Some("MyBot/1.0")).user_agent(), "MyBot/1.0");
    }
}
