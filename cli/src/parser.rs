//! Command parser for SQL and backslash commands
//!
//! Parses user input to distinguish between SQL statements and CLI
//! meta-commands, and splits scripts into single statements.

use crate::error::{CLIError, Result};

/// Parsed command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// SQL statement
    Sql(String),

    /// Meta-commands (backslash commands)
    Quit,
    Help,
    SetFormat(String),
    Unknown(String),
}

/// Command parser
pub struct CommandParser;

impl CommandParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse a command line
    pub fn parse(&self, line: &str) -> Result<Command> {
        let trimmed = line.trim();

        if trimmed.is_empty() {
            return Err(CLIError::ParseError("Empty command".into()));
        }

        if trimmed.starts_with('\\') {
            return self.parse_meta_command(trimmed);
        }

        let word = trimmed.trim_end_matches(';').trim();
        if word.eq_ignore_ascii_case("quit") || word.eq_ignore_ascii_case("exit") {
            return Ok(Command::Quit);
        }

        Ok(Command::Sql(trimmed.to_string()))
    }

    /// Parse meta-commands (backslash commands)
    fn parse_meta_command(&self, line: &str) -> Result<Command> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some(command) = parts.first().copied() else {
            return Err(CLIError::ParseError("Invalid command".into()));
        };
        let args = parts.get(1..).unwrap_or(&[]);

        match command {
            "\\quit" | "\\q" => Ok(Command::Quit),
            "\\help" | "\\?" => Ok(Command::Help),
            "\\format" => match args.first() {
                Some(format) => Ok(Command::SetFormat(format.to_string())),
                None => Err(CLIError::ParseError(
                    "\\format requires: table, json, or csv".into(),
                )),
            },
            _ => Ok(Command::Unknown(command.to_string())),
        }
    }

    /// Whether `buffer` holds at least one complete statement, i.e. ends
    /// with a `;` outside quotes and comments.
    pub fn is_complete(&self, buffer: &str) -> bool {
        let trimmed = buffer.trim();
        if trimmed.starts_with('\\') {
            return true;
        }
        let (statements, in_literal) = Self::scan(trimmed);
        !in_literal && statements.last().is_some_and(|s| s.ends_with(';'))
    }

    /// Split a script into statements on `;` outside quotes and `--` comments.
    /// Terminators are kept; comments and blank statements are dropped.
    pub fn split_statements(&self, script: &str) -> Vec<String> {
        Self::scan(script).0
    }

    fn scan(script: &str) -> (Vec<String>, bool) {
        let mut statements = Vec::new();
        let mut current = String::new();
        let mut scanner = Scanner::default();

        for c in script.chars() {
            let was_comment = scanner.in_comment();
            let is_terminator = scanner.feed(c);
            if scanner.in_comment() {
                if !was_comment {
                    // drop the first '-' of the comment marker
                    current.pop();
                }
                continue;
            }
            current.push(c);
            if is_terminator {
                push_statement(&mut statements, &current);
                current.clear();
            }
        }
        push_statement(&mut statements, &current);
        (statements, scanner.in_literal())
    }
}

impl Default for CommandParser {
    fn default() -> Self {
        Self::new()
    }
}

fn push_statement(statements: &mut Vec<String>, statement: &str) {
    let trimmed = statement.trim();
    if !trimmed.is_empty() && trimmed != ";" {
        statements.push(trimmed.to_string());
    }
}

/// Tracks quotes and line comments one character at a time
#[derive(Debug, Default)]
struct Scanner {
    quote: Option<char>,
    in_comment: bool,
    previous: Option<char>,
}

impl Scanner {
    /// Consume one character; `true` if it terminates a statement
    fn feed(&mut self, c: char) -> bool {
        let previous = self.previous.replace(c);

        if self.in_comment {
            if c == '\n' {
                self.in_comment = false;
            }
            return false;
        }

        if let Some(quote) = self.quote {
            if c == quote {
                self.quote = None;
            }
            return false;
        }

        match c {
            '\'' | '"' | '`' => self.quote = Some(c),
            '-' if previous == Some('-') => self.in_comment = true,
            ';' => return true,
            _ => {},
        }
        false
    }

    fn in_literal(&self) -> bool {
        self.quote.is_some()
    }

    fn in_comment(&self) -> bool {
        self.in_comment
    }
}
