//! Live view over the rows of a [`ResultFetcher`].
//!
//! Draws the newest rows that fit the terminal and redraws whenever the
//! refresh loop delivered a page.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::{cursor, execute, queue, terminal};
use log::{debug, warn};
use std::io::{self, Write};
use std::sync::Arc;
use tokio::sync::Notify;

use crate::{
    error::Result,
    fetcher::{FetchState, ResultFetcher},
    formatter::OutputFormatter,
    keypress::{SharedInputReader, POLL_INTERVAL},
    session::OutputFormat,
};

/// Lines taken by the status line, table borders, header and footers
const CHROME_LINES: usize = 8;

const KEY_HELP: &str = "[r] auto-refresh  [m] table/changelog  [n] next page  [q] leave";

/// What the view does after a key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewAction {
    Leave,
    Redraw,
    None,
}

pub struct ResultsView {
    fetcher: Arc<ResultFetcher>,
    input: SharedInputReader,
    formatter: OutputFormatter,
    color: bool,
}

/// Alternate screen with hidden cursor, restored on drop
struct AlternateScreen;

impl AlternateScreen {
    fn enter() -> io::Result<Self> {
        execute!(io::stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;
        Ok(Self)
    }
}

impl Drop for AlternateScreen {
    fn drop(&mut self) {
        if let Err(err) = execute!(io::stdout(), cursor::Show, terminal::LeaveAlternateScreen) {
            warn!("Failed to leave the alternate screen: {}", err);
        }
    }
}

impl ResultsView {
    pub fn new(fetcher: Arc<ResultFetcher>, input: SharedInputReader, color: bool) -> Self {
        Self {
            fetcher,
            input,
            formatter: OutputFormatter::new(OutputFormat::Table, color),
            color,
        }
    }

    /// Show the view until the user leaves it
    pub async fn run(&self) -> Result<()> {
        let redraw = Arc::new(Notify::new());
        let notifier = Arc::clone(&redraw);
        self.fetcher.set_refresh_callback(move || notifier.notify_one());

        let screen = AlternateScreen::enter()?;
        self.input.lock().start()?;
        let outcome = self.event_loop(&redraw).await;
        self.input.lock().stop();
        drop(screen);

        // Late pages must not wake a view that is gone
        self.fetcher.set_refresh_callback(|| {});
        outcome
    }

    async fn event_loop(&self, redraw: &Notify) -> Result<()> {
        self.draw()?;
        let mut ticker = tokio::time::interval(POLL_INTERVAL);
        loop {
            tokio::select! {
                _ = redraw.notified() => self.draw()?,
                _ = ticker.tick() => {
                    let key = self.input.lock().read_key()?;
                    let Some(key) = key else {
                        continue;
                    };
                    match self.handle_key(key).await {
                        ViewAction::Leave => return Ok(()),
                        ViewAction::Redraw => self.draw()?,
                        ViewAction::None => {},
                    }
                },
            }
        }
    }

    /// Apply one key press
    pub async fn handle_key(&self, key: KeyEvent) -> ViewAction {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => ViewAction::Leave,
            KeyCode::Char('c') | KeyCode::Char('C') if ctrl => ViewAction::Leave,
            KeyCode::Char('q') | KeyCode::Char('Q') => ViewAction::Leave,
            KeyCode::Char('r') | KeyCode::Char('R') => {
                self.fetcher.toggle_refresh();
                ViewAction::Redraw
            },
            KeyCode::Char('m') | KeyCode::Char('M') => {
                let table_mode = self.fetcher.toggle_table_mode();
                debug!("Result view switched to table mode: {}", table_mode);
                ViewAction::Redraw
            },
            KeyCode::Char('n') | KeyCode::Char('N') => {
                if self.fetcher.is_refresh_running() {
                    return ViewAction::None;
                }
                self.fetcher.fetch_next_page().await;
                ViewAction::Redraw
            },
            _ => ViewAction::None,
        }
    }

    fn draw(&self) -> Result<()> {
        let (width, height) = term_size::dimensions().unwrap_or((80, 24));
        let frame = self.render(width, height);

        let mut stdout = io::stdout();
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            terminal::Clear(terminal::ClearType::All)
        )?;
        stdout.write_all(frame.as_bytes())?;
        stdout.flush()?;
        Ok(())
    }

    /// One frame for a terminal of `width` x `height`, lines joined with CRLF
    pub fn render(&self, width: usize, height: usize) -> String {
        let results = self.fetcher.get_materialized_statement_results();
        let statement = self.fetcher.get_statement();
        let state = self.fetcher.get_refresh_state();
        let mode = if results.is_table_mode() { "table" } else { "changelog" };

        let mut lines = Vec::new();
        lines.push(format!(
            "{} [{}] refresh: {} at {} | {} mode | {} rows, {} changes (max {})",
            statement.statement_name,
            statement.status,
            state,
            self.fetcher.get_last_refresh_timestamp().format("%H:%M:%S"),
            mode,
            results.get_table_size(),
            results.get_changelog_size(),
            results.get_max_capacity(),
        ));
        if state == FetchState::Failed {
            if let Some(err) = self.fetcher.get_last_error() {
                lines.push(format!("Error: {}", err));
            }
        }

        let visible = height.saturating_sub(CHROME_LINES).max(1);
        let mut rows = Vec::with_capacity(visible);
        let mut iter = results.iterator(true);
        while rows.len() < visible {
            match iter.get_prev() {
                Some(row) => rows.push(row),
                None => break,
            }
        }
        rows.reverse();

        let table = self.formatter.format_table(
            &results.get_headers(),
            &rows,
            results.get_max_width_per_column(),
            width,
        );
        lines.extend(table.lines().map(str::to_string));

        if self.color {
            use colored::Colorize;
            lines.push(KEY_HELP.dimmed().to_string());
        } else {
            lines.push(KEY_HELP.to_string());
        }
        lines.join("\r\n")
    }
}
