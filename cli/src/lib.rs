//! Library entry point for strata-cli components.
//!
//! Exposes the result engine (materialized results, fetcher, controller) and
//! the shell pieces built on it so integration tests can drive them without
//! going through the binary entry point.

pub mod config;
pub mod controller;
pub mod error;
pub mod fetcher;
pub mod formatter;
pub mod keypress;
pub mod logging;
pub mod parser;
pub mod results;
pub mod session;

pub use config::CLIConfiguration;
pub use controller::StatementController;
pub use error::{CLIError, Result};
pub use fetcher::{FetchState, RefreshState, ResultFetcher};
pub use formatter::OutputFormatter;
pub use results::{MaterializedStatementResults, MaterializedStatementResultsIterator};
pub use session::{CLISession, OutputFormat, SessionSettings};

/// Package version of the shell
pub const CLI_VERSION: &str = env!("CARGO_PKG_VERSION");
