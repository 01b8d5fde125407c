pub mod config;
pub mod error;
pub mod logging;

pub mod batch;
pub mod cancel;
pub mod fetch_head;
pub mod limiter;
pub mod resolver;
pub mod retrieval;
pub mod url_model;
