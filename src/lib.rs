//! Breach Sweep - bulk credential breach checker
//!
//! Checks lists of passwords and email addresses against breach APIs,
//! sending every request through a randomly chosen authenticated proxy,
//! and sorts the results into per-category output files.

pub mod breach;
pub mod error;
pub mod pipeline;
pub mod proxy;

pub use error::{FetchError, ProxyParseError, SetupError, SinkError};
pub use pipeline::{Orchestrator, RunConfig, RunReport};

/// Application result type
pub type Result<T> = anyhow::Result<T>;
