//! CLI for the BDM batch download orchestrator.

mod commands;
mod input;

use anyhow::Result;
use bdm_core::config;
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use commands::{run_completions, run_config, run_fetch, run_man};

/// Top-level CLI for the BDM batch download orchestrator.
#[derive(Debug, Parser)]
#[command(name = "bdm", version)]
#[command(about = "BDM: parallel batch downloads through aria2c or any compatible tool", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download one or more URLs with bounded parallelism.
    Fetch(FetchArgs),

    /// Show the config file path and the effective configuration.
    Config {
        /// Print only the path.
        #[arg(long)]
        path: bool,
    },

    /// Print shell completions to stdout.
    Completions {
        /// Target shell.
        shell: Shell,
    },

    /// Print the man page (roff) to stdout.
    Man,
}

/// Flags for `bdm fetch`. Unset flags fall back to the config file.
#[derive(Debug, Clone, Default, Args)]
pub struct FetchArgs {
    /// URLs to download.
    #[arg(value_name = "URL")]
    pub urls: Vec<String>,

    /// Read URLs from FILE ("-" for stdin), one per line or comma-separated.
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Target directory, or target file for a single URL.
    #[arg(short = 'd', long = "dest", value_name = "PATH")]
    pub destination: Option<String>,

    /// Number of downloads running at once.
    #[arg(short, long, value_name = "N")]
    pub parallel: Option<usize>,

    /// Maximum download speed per task (e.g. 1M, 500K).
    #[arg(long, value_name = "RATE")]
    pub max_speed: Option<String>,

    /// Tool-level transfer timeout in seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Tool-level connection timeout in seconds.
    #[arg(long, value_name = "SECS")]
    pub connect_timeout: Option<u64>,

    /// Maximum retry attempts inside the tool.
    #[arg(long, value_name = "N")]
    pub max_tries: Option<u32>,

    /// Wait between retries in seconds.
    #[arg(long, value_name = "SECS")]
    pub retry_wait: Option<u64>,

    /// Custom User-Agent for the tool and the filename probe.
    #[arg(long, value_name = "UA")]
    pub user_agent: Option<String>,

    /// Hard deadline per download in seconds.
    #[arg(long, value_name = "SECS")]
    pub task_timeout: Option<u64>,

    /// Skip the HEAD request used to detect server-suggested filenames.
    #[arg(long)]
    pub no_probe: bool,

    /// Hide the tool's own progress output.
    #[arg(short, long)]
    pub quiet: bool,

    /// Retrieval program to run instead of the configured one.
    #[arg(long, value_name = "PROGRAM")]
    pub tool: Option<String>,

    /// Write the final report as JSON to PATH.
    #[arg(long, value_name = "PATH")]
    pub report_json: Option<PathBuf>,
}

impl FetchArgs {
    /// Applies command-line overrides on top of the loaded config.
    pub fn apply(&self, mut cfg: config::BdmConfig) -> config::BdmConfig {
        if let Some(n) = self.parallel {
            cfg.parallel = n;
        }
        if let Some(secs) = self.task_timeout {
            cfg.task_timeout_secs = secs;
        }
        if self.no_probe {
            cfg.probe = false;
        }
        if self.quiet {
            cfg.quiet = true;
        }
        let tool = &mut cfg.tool;
        if let Some(program) = &self.tool {
            tool.program = program.clone();
        }
        if let Some(speed) = &self.max_speed {
            tool.max_speed = Some(speed.clone());
        }
        if let Some(secs) = self.timeout {
            tool.timeout_secs = secs;
        }
        if let Some(secs) = self.connect_timeout {
            tool.connect_timeout_secs = secs;
        }
        if let Some(n) = self.max_tries {
            tool.max_tries = n;
        }
        if let Some(secs) = self.retry_wait {
            tool.retry_wait_secs = secs;
        }
        if let Some(ua) = &self.user_agent {
            tool.user_agent = Some(ua.clone());
        }
        cfg
    }
}

impl CliCommand {
    /// Parses arguments, runs the command and returns the process exit code.
    pub async fn run_from_args() -> Result<i32> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Fetch(args) => {
                let cfg = config::load_or_init()?;
                tracing::debug!("loaded config: {:?}", cfg);
                run_fetch(cfg, &args).await
            }
            CliCommand::Config { path } => {
                run_config(path)?;
                Ok(0)
            }
            CliCommand::Completions { shell } => {
                run_completions(shell, &mut Cli::command());
                Ok(0)
            }
            CliCommand::Man => {
                run_man(Cli::command())?;
                Ok(0)
            }
        }
    }
}

#[cfg(test)]
mod tests;
