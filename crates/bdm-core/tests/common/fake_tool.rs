//! A retrieval command built from `sh -c`, standing in for aria2c.
//!
//! Invoked as `sh -c SCRIPT fake-tool <path> <locator>`. Behaviour depends on
//! the locator:
//! - contains "missing" → prints to stderr and exits 3 (aria2c "not found")
//! - contains "hang" → sleeps far longer than any test deadline
//! - contains "delay=<secs>" → sleeps that long, then succeeds
//! - otherwise writes the locator into `<path>` and exits 0

use bdm_core::retrieval::{ExitCodeTable, RetrievalCommand};

const SCRIPT: &str = r#"
case "$2" in
  *missing*) echo "fake-tool: resource not found: $2" >&2; exit 3 ;;
  *hang*) sleep 60 ;;
esac
d=$(printf '%s' "$2" | sed -n 's/.*delay=\([0-9.]*\).*/\1/p')
if [ -n "$d" ]; then sleep "$d"; fi
printf '%s' "$2" > "$1"
"#;

pub fn command() -> RetrievalCommand {
    RetrievalCommand::new("sh")
        .with_options(vec!["-c".into(), SCRIPT.into(), "fake-tool".into()])
        .with_output_args(vec!["{path}".into()])
        .with_exit_codes(ExitCodeTable::aria2c())
}
