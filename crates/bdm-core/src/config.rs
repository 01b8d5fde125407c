use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::batch::BatchSettings;
use crate::retrieval::{
    ExecOptions, ExitCodeEntry, ExitCodeTable, PassThroughOptions, RetrievalCommand,
};

/// How the retrieval command line is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolPreset {
    /// aria2c with the tuned option set and its exit-code table.
    #[default]
    Aria2c,
    /// Any program; options, output args and exit codes come from the config.
    Custom,
}

/// Retrieval tool section (`[tool]` in config.toml).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Executable name or path.
    pub program: String,
    pub preset: ToolPreset,
    /// Speed cap in the tool's notation, e.g. "1M". aria2c preset only.
    pub max_speed: Option<String>,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub max_tries: u32,
    pub retry_wait_secs: u64,
    pub user_agent: Option<String>,
    /// Appended after the preset's own options.
    pub extra_args: Vec<String>,
    /// Output arguments with `{dir}`, `{filename}` and `{path}` placeholders.
    /// Empty means the preset default (`-o {path}` for custom tools).
    pub output_args: Vec<String>,
    /// Exit-code rows; empty means the preset default (none for custom tools).
    pub exit_codes: Vec<ExitCodeEntry>,
}

impl Default for ToolConfig {
    fn default() -> Self {
        let opts = PassThroughOptions::default();
        Self {
            program: "aria2c".to_string(),
            preset: ToolPreset::Aria2c,
            max_speed: opts.max_speed,
            timeout_secs: opts.timeout_secs,
            connect_timeout_secs: opts.connect_timeout_secs,
            max_tries: opts.max_tries,
            retry_wait_secs: opts.retry_wait_secs,
            user_agent: opts.user_agent,
            extra_args: Vec::new(),
            output_args: Vec::new(),
            exit_codes: Vec::new(),
        }
    }
}

impl ToolConfig {
    pub fn pass_through(&self) -> PassThroughOptions {
        PassThroughOptions {
            max_speed: self.max_speed.clone(),
            timeout_secs: self.timeout_secs,
            connect_timeout_secs: self.connect_timeout_secs,
            max_tries: self.max_tries,
            retry_wait_secs: self.retry_wait_secs,
            user_agent: self.user_agent.clone(),
        }
    }

    /// Builds the retrieval command for this tool.
    pub fn to_command(&self) -> RetrievalCommand {
        let mut cmd = match self.preset {
            ToolPreset::Aria2c => {
                let cmd = RetrievalCommand::aria2c(&self.program, &self.pass_through());
                let mut options = cmd.options().to_vec();
                options.extend(self.extra_args.iter().cloned());
                cmd.with_options(options)
            }
            ToolPreset::Custom => RetrievalCommand::new(&self.program)
                .with_options(self.extra_args.clone())
                .with_output_args(vec!["-o".into(), "{path}".into()]),
        };
        if !self.output_args.is_empty() {
            cmd = cmd.with_output_args(self.output_args.clone());
        }
        if !self.exit_codes.is_empty() {
            cmd = cmd.with_exit_codes(ExitCodeTable::new(self.exit_codes.clone()));
        }
        cmd
    }
}

/// Global configuration loaded from `~/.config/bdm/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BdmConfig {
    /// Maximum number of downloads running at once.
    pub parallel: usize,
    /// Per-task deadline in seconds, counted from tool launch.
    pub task_timeout_secs: u64,
    /// Send a HEAD request to learn the server-suggested filename.
    pub probe: bool,
    pub probe_timeout_secs: u64,
    /// Seconds between SIGTERM and SIGKILL when stopping a tool.
    pub kill_grace_secs: u64,
    /// Hide the tool's own progress output.
    pub quiet: bool,
    pub tool: ToolConfig,
}

impl Default for BdmConfig {
    fn default() -> Self {
        Self {
            parallel: 3,
            task_timeout_secs: 3 * 60 * 60,
            probe: true,
            probe_timeout_secs: 30,
            kill_grace_secs: 5,
            quiet: false,
            tool: ToolConfig::default(),
        }
    }
}

impl BdmConfig {
    /// Batch settings for a run into `destination`.
    pub fn batch_settings(&self, destination: impl Into<String>) -> BatchSettings {
        BatchSettings {
            parallelism: self.parallel,
            destination: destination.into(),
            exec: ExecOptions {
                timeout: Duration::from_secs(self.task_timeout_secs),
                kill_grace: Duration::from_secs(self.kill_grace_secs),
                quiet: self.quiet,
            },
            probe_timeout: Duration::from_secs(self.probe_timeout_secs),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("bdm")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<BdmConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = BdmConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: BdmConfig = toml::from_str(&data)?;
    Ok(cfg)
}
