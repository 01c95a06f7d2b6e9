//! Strata CLI - Terminal client for Strata statements
//!
//! # Usage
//!
//! ```bash
//! # Interactive mode with the live result view
//! strata -u http://localhost:8080 --token <TOKEN>
//!
//! # Execute SQL file
//! strata -u http://localhost:8080 --file queries.sql
//!
//! # JSON output
//! strata -u http://localhost:8080 --json -c "SELECT * FROM orders;"
//! ```

use clap::Parser;

use strata_cli::{logging, CLIConfiguration, CLIError, Result};

mod args;
mod connect;

use args::Cli;
use connect::{apply_overrides, create_session};

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("ERROR: {}", err);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut config = CLIConfiguration::load(&cli.config)?;
    apply_overrides(&cli, &mut config);

    let log_config = config.resolved_logging();
    if let Err(err) = logging::init_logging(
        &log_config.level,
        &log_config.file,
        &log_config.format,
        cli.verbose,
    ) {
        eprintln!("Warning: {}", err);
    }

    let mut session = create_session(&config)?;

    match (cli.file, cli.command) {
        (Some(file), None) => {
            let sql = std::fs::read_to_string(&file).map_err(|e| {
                CLIError::FileError(format!("Failed to read {}: {}", file.display(), e))
            })?;
            session.execute_batch(&sql).await?;
        },

        (None, Some(command)) => {
            session.execute_batch(&command).await?;
        },

        (None, None) => {
            session.run_interactive().await?;
        },

        (Some(_), Some(_)) => {
            return Err(CLIError::ConfigurationError(
                "Cannot specify both --file and --command".into(),
            ));
        },
    }

    if session.exit_requested() {
        return Err(CLIError::ConfigurationError(
            "Session is no longer authorized".into(),
        ));
    }
    Ok(())
}
