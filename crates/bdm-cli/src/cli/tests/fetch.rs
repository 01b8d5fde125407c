//! Tests for the fetch subcommand and config overrides.

use super::parse;
use crate::cli::{CliCommand, FetchArgs};
use bdm_core::config::BdmConfig;
use clap::Parser;

fn fetch(args: &[&str]) -> FetchArgs {
    match parse(args) {
        CliCommand::Fetch(a) => a,
        other => panic!("expected Fetch, got {:?}", other),
    }
}

#[test]
fn cli_parse_fetch_urls() {
    let a = fetch(&["bdm", "fetch", "https://a.example/1", "https://a.example/2"]);
    assert_eq!(a.urls, vec!["https://a.example/1", "https://a.example/2"]);
    assert!(a.destination.is_none());
    assert!(a.parallel.is_none());
    assert!(!a.no_probe);
    assert!(!a.quiet);
}

#[test]
fn cli_parse_fetch_flags() {
    let a = fetch(&[
        "bdm",
        "fetch",
        "-d",
        "/srv/isos",
        "-p",
        "5",
        "--max-speed",
        "2M",
        "--max-tries",
        "7",
        "--task-timeout",
        "600",
        "--no-probe",
        "--quiet",
        "--report-json",
        "out.json",
        "https://a.example/x.iso",
    ]);
    assert_eq!(a.destination.as_deref(), Some("/srv/isos"));
    assert_eq!(a.parallel, Some(5));
    assert_eq!(a.max_speed.as_deref(), Some("2M"));
    assert_eq!(a.max_tries, Some(7));
    assert_eq!(a.task_timeout, Some(600));
    assert!(a.no_probe);
    assert!(a.quiet);
    assert_eq!(a.report_json.as_deref(), Some(std::path::Path::new("out.json")));
}

#[test]
fn cli_parse_fetch_input_file_only() {
    let a = fetch(&["bdm", "fetch", "--input", "-"]);
    assert!(a.urls.is_empty());
    assert_eq!(a.input.as_deref(), Some(std::path::Path::new("-")));
}

#[test]
fn cli_parse_fetch_rejects_non_numeric_parallel() {
    assert!(crate::cli::Cli::try_parse_from(["bdm", "fetch", "-p", "many", "https://a.example/"]).is_err());
}

#[test]
fn overrides_apply_on_top_of_config() {
    let a = fetch(&[
        "bdm",
        "fetch",
        "-p",
        "1",
        "--tool",
        "/opt/aria2/bin/aria2c",
        "--user-agent",
        "Mirror/2",
        "--no-probe",
        "https://a.example/x",
    ]);
    let cfg = a.apply(BdmConfig::default());
    assert_eq!(cfg.parallel, 1);
    assert!(!cfg.probe);
    assert_eq!(cfg.tool.program, "/opt/aria2/bin/aria2c");
    assert_eq!(cfg.tool.user_agent.as_deref(), Some("Mirror/2"));
    assert_eq!(cfg.tool.max_tries, BdmConfig::default().tool.max_tries);
}

#[test]
fn no_flags_keep_config() {
    let a = fetch(&["bdm", "fetch", "https://a.example/x"]);
    let base = BdmConfig {
        parallel: 9,
        quiet: true,
        ..BdmConfig::default()
    };
    assert_eq!(a.apply(base.clone()), base);
}
