//! The retrieval command: program, pass-through options, output-path arguments
//! and exit-code table.
//!
//! Invocation shape: `<program> [options...] <output args...> <locator>`.

use crate::resolver::ResolvedTarget;

use super::exit_codes::ExitCodeTable;

/// Connections per server used by the aria2c preset.
const ARIA2C_CONNECTIONS_PER_SERVER: u32 = 16;

/// Options forwarded to the tool; the core never interprets them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassThroughOptions {
    /// Speed cap in the tool's notation (e.g. `1M`, `500K`).
    pub max_speed: Option<String>,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub max_tries: u32,
    pub retry_wait_secs: u64,
    pub user_agent: Option<String>,
}

impl Default for PassThroughOptions {
    fn default() -> Self {
        Self {
            max_speed: None,
            timeout_secs: 60,
            connect_timeout_secs: 30,
            max_tries: 5,
            retry_wait_secs: 10,
            user_agent: None,
        }
    }
}

/// External executable invoked once per task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievalCommand {
    program: String,
    options: Vec<String>,
    output_args: Vec<String>,
    exit_codes: ExitCodeTable,
}

impl RetrievalCommand {
    /// A command with no options, no output arguments and an empty exit-code table.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            options: Vec::new(),
            output_args: Vec::new(),
            exit_codes: ExitCodeTable::default(),
        }
    }

    /// aria2c tuned for high-throughput single-file downloads, writing to
    /// `--dir={dir} --out={filename}`.
    pub fn aria2c(program: impl Into<String>, opts: &PassThroughOptions) -> Self {
        let mut options: Vec<String> = vec![
            "--continue=true".into(),
            format!(
                "--max-connection-per-server={}",
                ARIA2C_CONNECTIONS_PER_SERVER
            ),
            "--split=32".into(),
            "--min-split-size=1M".into(),
            "--file-allocation=falloc".into(),
            format!("--max-tries={}", opts.max_tries),
            format!("--retry-wait={}", opts.retry_wait_secs),
            format!("--connect-timeout={}", opts.connect_timeout_secs),
            format!("--timeout={}", opts.timeout_secs),
            "--max-file-not-found=3".into(),
            "--summary-interval=1".into(),
            "--console-log-level=warn".into(),
            "--auto-file-renaming=false".into(),
            "--allow-overwrite=true".into(),
            "--conditional-get=true".into(),
            "--check-integrity=true".into(),
            "--disk-cache=128M".into(),
            "--async-dns=true".into(),
            "--http-accept-gzip=true".into(),
            "--remote-time=true".into(),
        ];
        if let Some(speed) = opts.max_speed.as_deref().filter(|s| !s.is_empty()) {
            options.push(format!("--max-download-limit={}", speed));
        }
        if let Some(ua) = opts.user_agent.as_deref().filter(|s| !s.is_empty()) {
            options.push(format!("--user-agent={}", ua));
        }

        Self::new(program)
            .with_options(options)
            .with_output_args(vec!["--dir={dir}".into(), "--out={filename}".into()])
            .with_exit_codes(ExitCodeTable::aria2c())
    }

    pub fn with_options(mut self, options: Vec<String>) -> Self {
        self.options = options;
        self
    }

    /// Output arguments, templated with `{dir}`, `{filename}` and `{path}`.
    pub fn with_output_args(mut self, output_args: Vec<String>) -> Self {
        self.output_args = output_args;
        self
    }

    pub fn with_exit_codes(mut self, exit_codes: ExitCodeTable) -> Self {
        self.exit_codes = exit_codes;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn exit_codes(&self) -> &ExitCodeTable {
        &self.exit_codes
    }

    /// Full argument list (without the program) for one task.
    pub fn args(&self, target: &ResolvedTarget, locator: &str) -> Vec<String> {
        let dir = target.directory.to_string_lossy();
        let path = target.path();
        let path = path.to_string_lossy();

        let mut args = self.options.clone();
        args.extend(self.output_args.iter().map(|a| {
            a.replace("{dir}", &dir)
                .replace("{filename}", &target.filename)
                .replace("{path}", &path)
        }));
        args.push(locator.to_string());
        args
    }

    pub(super) fn to_command(&self, target: &ResolvedTarget, locator: &str) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(&self.program);
        cmd.args(self.args(target, locator));
        cmd
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::FilenameSource;
    use std::path::PathBuf;

    fn target() -> ResolvedTarget {
        ResolvedTarget {
            directory: PathBuf::from("/srv/dl"),
            filename: "a.iso".to_string(),
            source: FilenameSource::Locator,
        }
    }

    #[test]
    fn args_order_is_options_output_locator() {
        let cmd = RetrievalCommand::new("tool")
            .with_options(vec!["-q".into()])
            .with_output_args(vec!["-o".into(), "{path}".into()]);
        assert_eq!(
            cmd.args(&target(), "https://example.com/a.iso"),
            vec!["-q", "-o", "/srv/dl/a.iso", "https://example.com/a.iso"]
        );
    }

    #[test]
    fn aria2c_preset() {
        let opts = PassThroughOptions {
            max_speed: Some("1M".into()),
            user_agent: Some("MyBot/1.0".into()),
            ..PassThroughOptions::default()
        };
        let cmd = RetrievalCommand::aria2c("aria2c", &opts);
        let args = cmd.args(&target(), "https://example.com/a.iso");
        assert!(args.contains(&"--max-tries=5".to_string()));
        assert!(args.contains(&"--connect-timeout=30".to_string()));
        assert!(args.contains(&"--max-download-limit=1M".to_string()));
        assert!(args.contains(&"--user-agent=MyBot/1.0".to_string()));
        let n = args.len();
        assert_eq!(args[n - 3], "--dir=/srv/dl");
        assert_eq!(args[n - 2], "--out=a.iso");
        assert_eq!(args[n - 1], "https://example.com/a.iso");
        assert_eq!(cmd.exit_codes(), &ExitCodeTable::aria2c());
    }

    #[test]
    fn aria2c_skips_empty_optionals() {
        let cmd = RetrievalCommand::aria2c("aria2c", &PassThroughOptions::default());
        assert!(!cmd
            .options()
            .iter()
            .any(|o| o.starts_with("--max-download-limit") || o.starts_with("--user-agent")));
    }
}
