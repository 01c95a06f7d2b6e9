//! CLI session state management
//!
//! Runs statements through the [`StatementController`], then hands statements
//! that produce a result set to a [`ResultFetcher`]: interactive table output
//! goes to the live [`ResultsView`], everything else is fetched to the end
//! and printed.

use clap::ValueEnum;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use rustyline::error::ReadlineError;
use rustyline::{Config, DefaultEditor};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use strata_link::{StatementError, Store};

use crate::{
    config::{expand_config_path, CLIConfiguration},
    controller::StatementController,
    error::{CLIError, Result},
    fetcher::{FetchState, ResultFetcher},
    formatter::OutputFormatter,
    keypress::{shared_reader, KeyBindings, NoInputReader, SharedInputReader, TerminalInputReader},
    parser::{Command, CommandParser},
    CLI_VERSION,
};

mod results_view;

pub use results_view::{ResultsView, ViewAction};

/// Output format for statement results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "table" => Some(OutputFormat::Table),
            "json" => Some(OutputFormat::Json),
            "csv" => Some(OutputFormat::Csv),
            _ => None,
        }
    }
}

/// Session preferences resolved from the config file and command line
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub format: OutputFormat,
    pub color: bool,
    pub max_capacity: usize,
    pub refresh_interval: Duration,
    pub history_size: usize,
    pub history_file: Option<PathBuf>,
}

impl SessionSettings {
    pub fn from_config(config: &CLIConfiguration) -> Self {
        let ui = config.resolved_ui();
        Self {
            format: OutputFormat::parse(&ui.format).unwrap_or(OutputFormat::Table),
            color: ui.color,
            max_capacity: config.resolved_results().max_capacity,
            refresh_interval: config.refresh_interval(),
            history_size: ui.history_size,
            history_file: Some(expand_config_path(std::path::Path::new("~/.strata/history"))),
        }
    }
}

pub struct CLISession {
    store: Arc<dyn Store>,
    parser: CommandParser,
    formatter: OutputFormatter,
    settings: SessionSettings,
    /// Set when the server reports the session as unauthorized
    exit_requested: Arc<AtomicBool>,
    statements_executed: u64,
}

impl CLISession {
    pub fn new(store: Arc<dyn Store>, settings: SessionSettings) -> Self {
        Self {
            store,
            parser: CommandParser::new(),
            formatter: OutputFormatter::new(settings.format, settings.color),
            settings,
            exit_requested: Arc::new(AtomicBool::new(false)),
            statements_executed: 0,
        }
    }

    pub fn exit_requested(&self) -> bool {
        self.exit_requested.load(Ordering::SeqCst)
    }

    pub fn statements_executed(&self) -> u64 {
        self.statements_executed
    }

    pub fn set_format(&mut self, format: OutputFormat) {
        self.settings.format = format;
        self.formatter = OutputFormatter::new(format, self.settings.color);
    }

    fn controller(&self, input: SharedInputReader) -> StatementController {
        let exit_requested = Arc::clone(&self.exit_requested);
        StatementController::new(
            Arc::clone(&self.store),
            input,
            KeyBindings::default(),
            Arc::new(move || {
                warn!("Session is no longer authorized, exiting");
                exit_requested.store(true, Ordering::SeqCst);
            }),
        )
    }

    fn create_spinner() -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
            .template("{spinner:.cyan} {msg}")
        {
            pb.set_style(style);
        }
        pb.set_message("Waiting for statement... (Esc to cancel, Enter to detach)");
        pb.enable_steady_tick(Duration::from_millis(80));
        pb
    }

    /// Execute one statement.
    ///
    /// With `interactive` set, key presses can cancel or detach the waits and
    /// table output is shown in the live result view.
    pub async fn execute(&mut self, sql: &str, interactive: bool) -> Result<()> {
        self.statements_executed += 1;
        let interactive = interactive && std::io::stdin().is_terminal();

        let input = if interactive {
            shared_reader(TerminalInputReader::new())
        } else {
            shared_reader(NoInputReader)
        };
        let controller = self.controller(input.clone());

        let spinner = interactive.then(Self::create_spinner);
        let result = controller.execute_statement(sql).await;
        if let Some(pb) = spinner {
            pb.finish_and_clear();
        }
        let statement = result?;

        if controller.cancelled() {
            println!("Statement {} stopped", statement.statement_name);
            return Ok(());
        }

        if !statement.has_result_schema() {
            println!("{}", self.formatter.format_statement_summary(&statement));
            if statement.is_terminal() {
                controller.cleanup_statement().await;
            }
            return Ok(());
        }

        let first_page = self.store.fetch_statement_results(&statement).await?;
        let fetcher = ResultFetcher::init(
            Arc::clone(&self.store),
            first_page,
            self.settings.max_capacity,
            self.settings.refresh_interval,
        );

        let outcome = if interactive && self.settings.format == OutputFormat::Table {
            ResultsView::new(Arc::clone(&fetcher), input, self.settings.color)
                .run()
                .await
        } else {
            self.print_all_pages(&fetcher).await
        };
        fetcher.close();

        // Nothing left to read on the server
        if fetcher.get_refresh_state() == FetchState::Completed && fetcher.get_statement().is_terminal() {
            controller.cleanup_statement().await;
        }
        outcome
    }

    /// Fetch until the statement has no more pages, then print the result
    async fn print_all_pages(&self, fetcher: &ResultFetcher) -> Result<()> {
        while fetcher.get_refresh_state() == FetchState::Paused {
            let state = fetcher.fetch_next_page().await;
            if state == FetchState::Paused && fetcher.get_statement().rows().is_empty() {
                tokio::time::sleep(self.settings.refresh_interval).await;
            }
        }

        if fetcher.get_refresh_state() == FetchState::Failed {
            let err = fetcher
                .get_last_error()
                .unwrap_or_else(|| StatementError::new("Fetching results failed"));
            return Err(err.into());
        }

        let results = fetcher.get_materialized_statement_results();
        println!("{}", self.formatter.format_results(&results)?);
        Ok(())
    }

    /// Execute every statement of a script, stopping at the first error
    pub async fn execute_batch(&mut self, script: &str) -> Result<()> {
        for statement in self.parser.split_statements(script) {
            debug!("Executing batch statement: {}", statement);
            self.execute(&statement, false).await?;
        }
        Ok(())
    }

    fn report_error(&self, err: &CLIError) {
        match err {
            CLIError::Statement(statement_err) => {
                eprintln!("{}", self.formatter.format_error(statement_err))
            },
            other if self.settings.color => eprintln!("{} {}", "ERROR:".red().bold(), other),
            other => eprintln!("ERROR: {}", other),
        }
    }

    /// Run the interactive readline loop
    pub async fn run_interactive(&mut self) -> Result<()> {
        let config = Config::builder()
            .max_history_size(self.settings.history_size)?
            .auto_add_history(false)
            .build();
        let mut rl = DefaultEditor::with_config(config)?;

        if let Some(path) = &self.settings.history_file {
            if let Err(err) = rl.load_history(path) {
                debug!("No history loaded from {}: {}", path.display(), err);
            }
        }

        self.print_banner();

        let mut buffer = String::new();
        while !self.exit_requested() {
            let prompt = if buffer.is_empty() { "strata> " } else { "    -> " };
            match rl.readline(prompt) {
                Ok(line) => {
                    if !buffer.is_empty() {
                        buffer.push('\n');
                    }
                    buffer.push_str(&line);

                    let is_quit = matches!(self.parser.parse(&buffer), Ok(Command::Quit));
                    if !is_quit && !self.parser.is_complete(&buffer) {
                        continue;
                    }

                    let input = std::mem::take(&mut buffer);
                    rl.add_history_entry(input.as_str())?;
                    if !self.handle_input(&input).await {
                        break;
                    }
                },
                Err(ReadlineError::Interrupted) => {
                    buffer.clear();
                },
                Err(ReadlineError::Eof) => break,
                Err(err) => return Err(err.into()),
            }
        }

        if let Some(path) = &self.settings.history_file {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            if let Err(err) = rl.save_history(path) {
                warn!("Failed to save history to {}: {}", path.display(), err);
            }
        }

        info!(
            "Interactive session ended after {} statements",
            self.statements_executed
        );
        println!("Goodbye!");
        Ok(())
    }

    /// Handle one complete REPL input; `false` ends the session
    async fn handle_input(&mut self, input: &str) -> bool {
        match self.parser.parse(input) {
            Ok(Command::Quit) => false,
            Ok(Command::Help) => {
                self.print_help();
                true
            },
            Ok(Command::SetFormat(format)) => {
                match OutputFormat::parse(&format) {
                    Some(format) => {
                        self.set_format(format);
                        println!("Output format set to {:?}", format);
                    },
                    None => eprintln!("Unknown format '{}'. Use table, json or csv.", format),
                }
                true
            },
            Ok(Command::Unknown(command)) => {
                eprintln!("Unknown command: {}. Type \\help for help.", command);
                true
            },
            Ok(Command::Sql(sql)) => {
                for statement in self.parser.split_statements(&sql) {
                    if let Err(err) = self.execute(&statement, true).await {
                        self.report_error(&err);
                        if err.is_unauthorized() || self.exit_requested() {
                            return false;
                        }
                        break;
                    }
                }
                true
            },
            Err(err) => {
                self.report_error(&err);
                true
            },
        }
    }

    fn print_banner(&self) {
        let title = format!("Strata CLI {}", CLI_VERSION);
        if self.settings.color {
            println!("{}", title.bright_blue().bold());
            println!("{}", "Type \\help for help, \\q to quit.".dimmed());
        } else {
            println!("{}", title);
            println!("Type \\help for help, \\q to quit.");
        }
        println!();
    }

    fn print_help(&self) {
        println!("Statements end with ';' and may span several lines.");
        println!();
        println!("Commands:");
        println!("  \\help, \\?            Show this help");
        println!("  \\format <fmt>        Output format: table, json, csv");
        println!("  \\quit, \\q, quit      Leave the shell");
        println!();
        println!("While a statement is waiting:");
        println!("  Esc, Ctrl-C, Ctrl-Q  Cancel and stop the statement");
        println!("  Enter                Stop waiting, keep the statement running");
        println!();
        println!("In the result view:");
        println!("  r  Toggle auto-refresh    m  Toggle table/changelog mode");
        println!("  n  Fetch next page        q  Leave the view");
    }
}
