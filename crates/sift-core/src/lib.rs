//! sift-core library.
//!
//! Saved item filters for a multi-user work-item tracker: per-axis criteria,
//! compilation into a single reusable query fragment, and execution against a
//! SQLite item store.
//!
//! # Conventions
//!
//! - **Errors**: domain failures are [`error::FilterError`]; pure plumbing
//!   (config loading, opening the store) returns `anyhow::Result`.
//! - **Logging**: use `tracing` macros (`info!`, `warn!`, `debug!`).

pub mod compile;
pub mod config;
pub mod criteria;
pub mod db;
pub mod error;
pub mod filter;
pub mod model;

pub use compile::{CompiledQuery, FilterDialect, SqliteDialect};
pub use criteria::{Axis, Criteria, FilterSelection};
pub use error::{ErrorCode, FilterError};
pub use filter::Filter;
