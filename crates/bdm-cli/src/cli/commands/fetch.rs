//! `bdm fetch` – run a batch and print per-task progress and a summary.

use anyhow::{Context, Result};
use bdm_core::batch::{BatchExit, BatchReport, Orchestrator, TaskEvent};
use bdm_core::cancel::CancellationController;
use bdm_core::config::BdmConfig;
use bdm_core::error::ConfigError;
use bdm_core::resolver::CurlProbe;
use colored::Colorize;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::cli::input;
use crate::cli::FetchArgs;

pub async fn run_fetch(cfg: BdmConfig, args: &FetchArgs) -> Result<i32> {
    let mut locators = args.urls.clone();
    if let Some(path) = &args.input {
        locators.extend(input::read_locators(path)?);
    }
    let cfg = args.apply(cfg);

    let program = cfg.tool.program.clone();
    if which::which(&program).is_err() {
        return Err(ConfigError::ToolNotFound(program).into());
    }

    let destination = args.destination.clone().unwrap_or_default();
    let mut orchestrator = Orchestrator::new(cfg.batch_settings(destination), cfg.tool.to_command());
    if cfg.probe {
        let probe = CurlProbe::new(cfg.tool.user_agent.as_deref());
        orchestrator = orchestrator.with_probe(Arc::new(probe));
    }

    let mut controller = CancellationController::new();
    let scope = controller.arm();

    let total = locators.len();
    if total > 1 {
        println!(
            "Starting batch download of {} files ({} at a time)...",
            total.to_string().cyan(),
            cfg.parallel
        );
    }

    let (tx, rx) = mpsc::unbounded_channel();
    let printer = tokio::spawn(print_events(rx));
    let result = orchestrator.run(locators, &scope, Some(tx)).await;
    let _ = printer.await;
    let report = result?;

    print_summary(&report);
    if controller.triggered_by_signal() {
        tracing::info!("batch interrupted by signal");
    }
    if let Some(path) = &args.report_json {
        let json = report.to_json()?;
        std::fs::write(path, json)
            .with_context(|| format!("writing report to {}", path.display()))?;
    }
    Ok(report.exit_status().code())
}

async fn print_events(mut rx: mpsc::UnboundedReceiver<TaskEvent>) {
    while let Some(event) = rx.recv().await {
        match event {
            TaskEvent::Started {
                index,
                total,
                locator,
            } => println!("[{}/{}] Starting: {}", index + 1, total, locator.cyan()),
            TaskEvent::Resolved { index, path, .. } => {
                println!("[{}] Saving to {}", index + 1, path.display().to_string().cyan())
            }
            TaskEvent::Succeeded { index, path } => println!(
                "{}",
                format!("[{}] Completed: {}", index + 1, path.display()).green()
            ),
            TaskEvent::Failed {
                index,
                locator,
                reason,
            } => println!(
                "{}",
                format!("[{}] Failed: {} - {}", index + 1, locator, reason).red()
            ),
            TaskEvent::Skipped { index, locator, .. } => println!(
                "{}",
                format!("[{}] Cancelled: {}", index + 1, locator).yellow()
            ),
        }
    }
}

fn print_summary(report: &BatchReport) {
    let heading = "--- Summary ---";
    let heading = match report.exit_status() {
        BatchExit::Success => heading.blue(),
        BatchExit::PartialFailure => heading.red(),
        BatchExit::Interrupted => heading.yellow(),
    };
    println!("\n{}", heading);
    println!("{}", report);
}
