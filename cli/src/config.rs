//! Configuration file management
//!
//! CLIConfiguration with TOML parsing for ~/.strata/config.toml
//!
//! # Configuration Format
//!
//! ```toml
//! [server]
//! url = "http://localhost:8080"  # Strata statement API
//! timeout = 30                   # Request timeout in seconds
//! poll_interval_ms = 300         # Status poll cadence while waiting
//!
//! [auth]
//! token = "your-api-token"       # or username/password
//!
//! [results]
//! max_capacity = 1000            # Rows kept per view
//! refresh_interval_ms = 1000     # Auto-refresh pause between pages
//!
//! [ui]
//! format = "table"               # table, json, csv
//! color = true
//! history_size = 1000
//!
//! [logging]
//! level = "info"
//! file = "~/.strata/cli.log"
//! format = "compact"             # compact, json
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use strata_link::{AuthProvider, StrataLinkTimeouts};

use crate::error::{CLIError, Result};

/// CLI configuration loaded from TOML file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CLIConfiguration {
    /// Server connection settings
    pub server: Option<ServerConfig>,

    /// Authentication settings
    pub auth: Option<AuthConfig>,

    /// Result materialization settings
    pub results: Option<ResultsConfig>,

    /// UI preferences
    pub ui: Option<UIConfig>,

    /// Log file settings
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server URL (e.g., http://localhost:8080)
    pub url: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Delay between status polls while waiting on a statement
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Bearer token, takes precedence over username/password
    pub token: Option<String>,

    pub username: Option<String>,

    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultsConfig {
    /// Maximum rows kept in the table and changelog views
    #[serde(default = "default_max_capacity")]
    pub max_capacity: usize,

    /// Pause between pages while auto-refresh is running
    #[serde(default = "default_refresh_interval_ms")]
    pub refresh_interval_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UIConfig {
    /// Output format: table, json, csv
    #[serde(default = "default_format")]
    pub format: String,

    /// Enable colored output
    #[serde(default = "default_color")]
    pub color: bool,

    /// Maximum history size
    #[serde(default = "default_history_size")]
    pub history_size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Base level: error, warn, info, debug, trace
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (`~` is expanded)
    #[serde(default = "default_log_file")]
    pub file: String,

    /// Line format: compact or json
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_timeout() -> u64 {
    30
}

fn default_poll_interval_ms() -> u64 {
    300
}

fn default_max_capacity() -> usize {
    1000
}

fn default_refresh_interval_ms() -> u64 {
    1000
}

fn default_format() -> String {
    "table".to_string()
}

fn default_color() -> bool {
    true
}

fn default_history_size() -> usize {
    1000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "~/.strata/cli.log".to_string()
}

fn default_log_format() -> String {
    "compact".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: Some("http://localhost:8080".to_string()),
            timeout: default_timeout(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl Default for ResultsConfig {
    fn default() -> Self {
        Self {
            max_capacity: default_max_capacity(),
            refresh_interval_ms: default_refresh_interval_ms(),
        }
    }
}

impl Default for UIConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            color: default_color(),
            history_size: default_history_size(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
            format: default_log_format(),
        }
    }
}

pub fn expand_config_path(path: &Path) -> PathBuf {
    let Some(path_str) = path.to_str() else {
        return path.to_path_buf();
    };
    if let Some(rest) = path_str.strip_prefix("~/") {
        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(rest);
        }
    }
    path.to_path_buf()
}

pub fn default_config_path() -> PathBuf {
    expand_config_path(Path::new("~/.strata/config.toml"))
}

impl CLIConfiguration {
    /// Load configuration from file
    ///
    /// Returns default configuration if file doesn't exist.
    pub fn load(path: &Path) -> Result<Self> {
        let path = expand_config_path(path);
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&path).map_err(|e| {
            CLIError::ConfigurationError(format!("Failed to read config file: {}", e))
        })?;

        let config: CLIConfiguration = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let path = expand_config_path(path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| CLIError::ConfigurationError(format!("Failed to serialize: {}", e)))?;

        std::fs::write(&path, contents)?;
        Ok(())
    }

    pub fn resolved_server(&self) -> ServerConfig {
        self.server.clone().unwrap_or_default()
    }

    pub fn resolved_auth(&self) -> AuthConfig {
        self.auth.clone().unwrap_or_default()
    }

    pub fn resolved_results(&self) -> ResultsConfig {
        self.results.clone().unwrap_or_default()
    }

    pub fn resolved_ui(&self) -> UIConfig {
        self.ui.clone().unwrap_or_default()
    }

    pub fn resolved_logging(&self) -> LoggingConfig {
        self.logging.clone().unwrap_or_default()
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.resolved_results().refresh_interval_ms)
    }

    /// Client timeouts derived from the `[server]` section
    pub fn to_timeouts(&self) -> StrataLinkTimeouts {
        let server = self.resolved_server();
        StrataLinkTimeouts::builder()
            .request_timeout(Duration::from_secs(server.timeout))
            .poll_interval(Duration::from_millis(server.poll_interval_ms))
            .build()
    }

    /// Credentials from the `[auth]` section; a token wins over a username
    pub fn to_auth_provider(&self) -> AuthProvider {
        let auth = self.resolved_auth();
        match (auth.token, auth.username) {
            (Some(token), _) if !token.is_empty() => AuthProvider::bearer_token(token),
            (_, Some(username)) if !username.is_empty() => {
                AuthProvider::basic_auth(username, auth.password.unwrap_or_default())
            },
            _ => AuthProvider::none(),
        }
    }
}
