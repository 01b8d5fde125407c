//! `bdm config` – show where the config lives and what it resolves to.

use anyhow::Result;
use bdm_core::config;

pub fn run_config(path_only: bool) -> Result<()> {
    let path = config::config_path()?;
    if path_only {
        println!("{}", path.display());
        return Ok(());
    }
    let cfg = config::load_or_init()?;
    println!("# {}", path.display());
    print!("{}", toml::to_string_pretty(&cfg)?);
    if let Ok(log) = bdm_core::logging::log_file_path() {
        println!("# log file: {}", log.display());
    }
    Ok(())
}
