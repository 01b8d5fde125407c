//! Filename resolver: turns a locator and a destination hint into a target
//! directory and filename.
//!
//! A header probe may supply a server-suggested filename; any probe failure
//! falls back to the name derived from the locator and is only logged.

mod destination;
mod probe;

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::cancel::CancellationScope;
use crate::error::DestinationError;
use crate::fetch_head::HeadResult;
use crate::url_model;

pub use destination::{interpret_hint, prepare_directory, Destination};
pub use probe::{default_user_agent, CurlProbe, HeadProbe};

/// Slack on top of the probe timeout for the outer async bound.
const PROBE_SLACK: Duration = Duration::from_millis(500);

/// Where the filename of a resolved target came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilenameSource {
    /// Final segment of the destination hint.
    Hint,
    /// `Content-Disposition` from the header probe.
    Server,
    /// Locator path, host, or a synthetic name.
    Locator,
}

/// Directory and filename decided for one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub directory: PathBuf,
    pub filename: String,
    pub source: FilenameSource,
}

impl ResolvedTarget {
    pub fn path(&self) -> PathBuf {
        self.directory.join(&self.filename)
    }
}

/// Options for [`resolve`].
#[derive(Clone)]
pub struct ResolveOptions {
    /// Header probe; `None` disables probing.
    pub probe: Option<Arc<dyn HeadProbe>>,
    /// Upper bound for one probe.
    pub probe_timeout: Duration,
    /// Treat a non-empty hint as a directory even when it does not exist.
    pub force_directory: bool,
    /// Abandons an in-flight probe once triggered.
    pub scope: Option<CancellationScope>,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            probe: None,
            probe_timeout: Duration::from_secs(30),
            force_directory: false,
            scope: None,
        }
    }
}

impl std::fmt::Debug for ResolveOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolveOptions")
            .field("probe", &self.probe.is_some())
            .field("probe_timeout", &self.probe_timeout)
            .field("force_directory", &self.force_directory)
            .field("scope", &self.scope)
            .finish()
    }
}

/// Resolves `locator` against `hint` into a target directory and filename,
/// creating the directory and checking it is writable.
///
/// Never waits longer than the probe timeout on the network.
pub async fn resolve(
    locator: &str,
    hint: &str,
    opts: &ResolveOptions,
) -> Result<ResolvedTarget, DestinationError> {
    let cwd = std::env::current_dir().map_err(DestinationError::CurrentDir)?;
    let destination = interpret_hint(hint, &cwd, opts.force_directory);

    let target = match destination {
        Destination::File {
            directory,
            filename,
        } => ResolvedTarget {
            directory,
            filename,
            source: FilenameSource::Hint,
        },
        Destination::Directory(directory) => {
            let (filename, source) = infer_filename(locator, opts).await;
            ResolvedTarget {
                directory,
                filename,
                source,
            }
        }
    };

    prepare_directory(&target.directory)?;
    tracing::debug!(
        locator,
        path = %target.path().display(),
        source = ?target.source,
        "resolved target"
    );
    Ok(target)
}

async fn infer_filename(locator: &str, opts: &ResolveOptions) -> (String, FilenameSource) {
    if let Some(probe) = &opts.probe {
        let probed = probe_headers(Arc::clone(probe), locator, opts.probe_timeout);
        let head = match &opts.scope {
            Some(scope) => tokio::select! {
                biased;
                _ = scope.cancelled() => {
                    tracing::debug!(locator, "batch cancelled, filename probe abandoned");
                    None
                }
                head = probed => Some(head),
            },
            None => Some(probed.await),
        };
        match head {
            Some(Ok(head)) => {
                if let Some(cd) = head.content_disposition.as_deref() {
                    if url_model::parse_content_disposition_filename(cd).is_some() {
                        return (
                            url_model::derive_filename(locator, Some(cd)),
                            FilenameSource::Server,
                        );
                    }
                }
            }
            Some(Err(e)) => {
                tracing::warn!(locator, error = %format!("{:#}", e), "filename probe failed, using URL fallback");
            }
            None => {}
        }
    }
    (url_model::derive_filename(locator, None), FilenameSource::Locator)
}

async fn probe_headers(
    probe: Arc<dyn HeadProbe>,
    locator: &str,
    timeout: Duration,
) -> Result<HeadResult> {
    let url = locator.to_string();
    let handle = tokio::task::spawn_blocking(move || probe.probe(&url, timeout));
    tokio::time::timeout(timeout + PROBE_SLACK, handle)
        .await
        .context("probe timed out")?
        .context("probe task join")?
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticProbe(Option<&'static str>);

    impl HeadProbe for StaticProbe {
        fn probe(&self, _url: &str, _timeout: Duration) -> Result<HeadResult> {
            Ok(HeadResult {
                content_disposition: self.0.map(str::to_string),
                ..HeadResult::default()
            })
        }
    }

    struct FailingProbe;

    impl HeadProbe for FailingProbe {
        fn probe(&self, _url: &str, _timeout: Duration) -> Result<HeadResult> {
            anyhow::bail!("connection refused")
        }
    }

    struct SlowProbe;

    impl HeadProbe for SlowProbe {
        fn probe(&self, _url: &str, _timeout: Duration) -> Result<HeadResult> {
            std::thread::sleep(Duration::from_secs(3));
            Ok(HeadResult {
                content_disposition: Some("attachment; filename=late.bin".to_string()),
                ..HeadResult::default()
            })
        }
    }

    fn opts(probe: Option<Arc<dyn HeadProbe>>) -> ResolveOptions {
        ResolveOptions {
            probe,
            probe_timeout: Duration::from_millis(200),
            force_directory: false,
            scope: None,
        }
    }

    fn hint_for(dir: &std::path::Path) -> String {
        format!("{}/", dir.display())
    }

    #[tokio::test]
    async fn server_filename_wins() {
        let dir = tempfile::tempdir().unwrap();
        let probe: Arc<dyn HeadProbe> = Arc::new(StaticProbe(Some("attachment; filename=\"real.iso\"")));
        let t = resolve("https://example.com/get?id=1", &hint_for(dir.path()), &opts(Some(probe)))
            .await
            .unwrap();
        assert_eq!(t.filename, "real.iso");
        assert_eq!(t.source, FilenameSource::Server);
        assert_eq!(t.directory, dir.path());
    }

    #[tokio::test]
    async fn probe_without_disposition_uses_locator() {
        let dir = tempfile::tempdir().unwrap();
        let probe: Arc<dyn HeadProbe> = Arc::new(StaticProbe(None));
        let t = resolve("https://example.com/a/file.tar.gz", &hint_for(dir.path()), &opts(Some(probe)))
            .await
            .unwrap();
        assert_eq!(t.filename, "file.tar.gz");
        assert_eq!(t.source, FilenameSource::Locator);
    }

    #[tokio::test]
    async fn probe_failure_falls_back_silently() {
        let dir = tempfile::tempdir().unwrap();
        let probe: Arc<dyn HeadProbe> = Arc::new(FailingProbe);
        let t = resolve("https://example.com/a/file.tar.gz", &hint_for(dir.path()), &opts(Some(probe)))
            .await
            .unwrap();
        assert_eq!(t.filename, "file.tar.gz");
    }

    #[tokio::test]
    async fn slow_probe_is_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let probe: Arc<dyn HeadProbe> = Arc::new(SlowProbe);
        let started = std::time::Instant::now();
        let t = resolve("https://example.com/a/file.bin", &hint_for(dir.path()), &opts(Some(probe)))
            .await
            .unwrap();
        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(t.filename, "file.bin");
    }

    #[tokio::test]
    async fn missing_directory_with_separator_is_created() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("new").join("downloads");
        let t = resolve("https://example.com/pkg/tool.deb", &hint_for(&dir), &opts(None))
            .await
            .unwrap();
        assert!(dir.is_dir());
        assert_eq!(t.directory, dir);
        assert_eq!(t.filename, "tool.deb");
    }

    #[tokio::test]
    async fn file_hint_names_output() {
        let root = tempfile::tempdir().unwrap();
        let hint = root.path().join("sub").join("renamed.iso");
        let t = resolve(
            "https://example.com/debian.iso",
            &hint.to_string_lossy(),
            &opts(None),
        )
        .await
        .unwrap();
        assert_eq!(t.directory, root.path().join("sub"));
        assert_eq!(t.filename, "renamed.iso");
        assert_eq!(t.source, FilenameSource::Hint);
        assert!(root.path().join("sub").is_dir());
    }

    #[tokio::test]
    async fn resolving_twice_is_stable() {
        let dir = tempfile::tempdir().unwrap();
        let hint = hint_for(dir.path());
        let a = resolve("https://example.com/x/y.zip", &hint, &opts(None)).await.unwrap();
        let b = resolve("https://example.com/x/y.zip", &hint, &opts(None)).await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn cancellation_cuts_a_slow_probe_short() {
        let dir = tempfile::tempdir().unwrap();
        let controller = crate::cancel::CancellationController::new();
        let probe: Arc<dyn HeadProbe> = Arc::new(SlowProbe);
        let options = ResolveOptions {
            probe: Some(probe),
            probe_timeout: Duration::from_secs(10),
            force_directory: false,
            scope: Some(controller.scope()),
        };
        let trigger = async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            controller.trigger();
        };
        let hint = hint_for(dir.path());
        let started = std::time::Instant::now();
        let (t, _) = tokio::join!(
            resolve("https://example.com/a/file.bin", &hint, &options),
            trigger
        );
        let t = t.unwrap();
        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(t.filename, "file.bin");
        assert_eq!(t.source, FilenameSource::Locator);
    }
}
