use crate::args::Cli;
use std::sync::Arc;
use strata_cli::{CLIConfiguration, CLISession, Result, SessionSettings};
use strata_link::StrataLinkClient;

/// Fold command-line flags into the loaded configuration; flags win
pub fn apply_overrides(cli: &Cli, config: &mut CLIConfiguration) {
    let mut server = config.resolved_server();
    if let Some(url) = &cli.url {
        server.url = Some(url.clone());
    }
    if let Some(timeout) = cli.timeout {
        server.timeout = timeout;
    }
    config.server = Some(server);

    if cli.token.is_some() || cli.username.is_some() {
        let mut auth = config.resolved_auth();
        auth.token = cli.token.clone();
        auth.username = cli.username.clone();
        auth.password = cli.password.clone();
        config.auth = Some(auth);
    }

    let mut results = config.resolved_results();
    if let Some(max_results) = cli.max_results {
        results.max_capacity = max_results;
    }
    if let Some(interval) = cli.refresh_interval_ms {
        results.refresh_interval_ms = interval;
    }
    config.results = Some(results);

    let mut ui = config.resolved_ui();
    if let Some(format) = cli.output_format() {
        ui.format = format!("{:?}", format).to_lowercase();
    }
    if cli.no_color {
        ui.color = false;
    }
    config.ui = Some(ui);

    if let Some(level) = &cli.log_level {
        let mut logging = config.resolved_logging();
        logging.level = level.clone();
        config.logging = Some(logging);
    }
}

pub fn create_session(config: &CLIConfiguration) -> Result<CLISession> {
    let server_url = config
        .resolved_server()
        .url
        .unwrap_or_else(|| "http://localhost:8080".to_string());

    let client = StrataLinkClient::builder()
        .base_url(server_url.as_str())
        .auth(config.to_auth_provider())
        .timeouts(config.to_timeouts())
        .build()?;
    log::info!("Connecting to {}", server_url);

    Ok(CLISession::new(
        Arc::new(client),
        SessionSettings::from_config(config),
    ))
}
