//! CLI command handlers, one per file.

mod completions;
mod config;
mod fetch;
mod man;

pub use completions::run_completions;
pub use config::run_config;
pub use fetch::run_fetch;
pub use man::run_man;
