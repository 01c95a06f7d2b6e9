use clap::Parser;
use std::path::PathBuf;
use strata_cli::OutputFormat;

// Version string assembled at compile time from build.rs output
macro_rules! version_string {
    () => {
        concat!(
            env!("CARGO_PKG_VERSION"),
            "\nCommit: ",
            env!("GIT_COMMIT_HASH"),
            " (",
            env!("GIT_BRANCH"),
            ")\nBuilt: ",
            env!("BUILD_DATE")
        )
    };
}

/// Strata CLI - Terminal client for Strata statements
#[derive(Parser, Debug)]
#[command(name = "strata")]
#[command(author = "Strata Team")]
#[command(version = version_string!())]
#[command(about = "Interactive SQL terminal for Strata", long_about = None)]
pub struct Cli {
    /// Server URL (e.g., http://localhost:8080)
    #[arg(short = 'u', long = "url")]
    pub url: Option<String>,

    /// Bearer token (API key or JWT)
    #[arg(long = "token")]
    pub token: Option<String>,

    /// HTTP Basic Auth username
    #[arg(long = "username")]
    pub username: Option<String>,

    /// HTTP Basic Auth password
    #[arg(long = "password")]
    pub password: Option<String>,

    /// Execute SQL from file and exit
    #[arg(short = 'f', long = "file", conflicts_with = "command")]
    pub file: Option<PathBuf>,

    /// Execute SQL command and exit
    #[arg(short = 'c', long = "command")]
    pub command: Option<String>,

    /// Output format
    #[arg(long = "format")]
    pub format: Option<OutputFormat>,

    /// Enable JSON output (shorthand for --format=json)
    #[arg(long = "json", conflicts_with_all = ["format", "csv"])]
    pub json: bool,

    /// Enable CSV output (shorthand for --format=csv)
    #[arg(long = "csv", conflicts_with = "format")]
    pub csv: bool,

    /// Disable colored output
    #[arg(long = "no-color")]
    pub no_color: bool,

    /// Configuration file path
    #[arg(long = "config", default_value = "~/.strata/config.toml")]
    pub config: PathBuf,

    /// Also write log output to stderr
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// HTTP request timeout in seconds
    #[arg(long = "timeout", value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Rows kept per result view
    #[arg(long = "max-results", value_name = "ROWS")]
    pub max_results: Option<usize>,

    /// Pause between pages while auto-refresh is running
    #[arg(long = "refresh-interval-ms", value_name = "MS")]
    pub refresh_interval_ms: Option<u64>,

    /// Log level: error, warn, info, debug, trace
    #[arg(long = "log-level")]
    pub log_level: Option<String>,
}

impl Cli {
    /// Output format picked by --format, --json or --csv
    pub fn output_format(&self) -> Option<OutputFormat> {
        if self.json {
            Some(OutputFormat::Json)
        } else if self.csv {
            Some(OutputFormat::Csv)
        } else {
            self.format
        }
    }
}
