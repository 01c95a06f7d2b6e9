//! Output formatters for statement results
//!
//! Renders the rows of a [`MaterializedStatementResults`] view as a boxed
//! table, JSON or CSV.

use colored::Colorize;
use serde_json::{Map, Value as JsonValue};
use strata_link::{ProcessedStatement, StatementError, StatementResultRow};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::{
    error::{CLIError, Result},
    results::MaterializedStatementResults,
    session::OutputFormat,
};

/// Maximum column width before truncation
const MAX_COLUMN_WIDTH: usize = 32;

/// Minimum column width when resizing to fit the terminal
const MIN_COLUMN_WIDTH: usize = 6;

/// Formats statement results for display
pub struct OutputFormatter {
    format: OutputFormat,
    color: bool,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat, color: bool) -> Self {
        Self { format, color }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Get terminal width, defaulting to 80 if unavailable
    pub fn get_terminal_width() -> usize {
        term_size::dimensions().map(|(w, _)| w).unwrap_or(80)
    }

    /// Truncate a string to max width (in terminal columns) with ellipsis
    fn truncate_value(value: &str, max_width: usize) -> String {
        if value.width() <= max_width {
            value.to_string()
        } else if max_width <= 3 {
            take_columns(value, max_width)
        } else {
            format!("{}...", take_columns(value, max_width - 3))
        }
    }

    /// Format every row of the current view
    pub fn format_results(&self, results: &MaterializedStatementResults) -> Result<String> {
        let headers = results.get_headers();
        let mut rows = Vec::with_capacity(results.size());
        results.for_each(|_, row| rows.push(row.clone()));

        match self.format {
            OutputFormat::Table => Ok(self.format_table(
                &headers,
                &rows,
                results.get_max_width_per_column(),
                Self::get_terminal_width(),
            )),
            OutputFormat::Json => self.format_json(&headers, &rows),
            OutputFormat::Csv => Ok(self.format_csv(&headers, &rows)),
        }
    }

    /// Boxed table of `rows`. `col_widths` are the natural widths per column,
    /// shrunk here until the table fits `terminal_width`.
    pub fn format_table(
        &self,
        headers: &[String],
        rows: &[StatementResultRow],
        col_widths: Vec<usize>,
        terminal_width: usize,
    ) -> String {
        if headers.is_empty() {
            return String::new();
        }

        let mut col_widths = col_widths;
        col_widths.resize(headers.len(), MIN_COLUMN_WIDTH);
        fit_widths(&mut col_widths, terminal_width);

        let mut output = String::new();
        output.push_str(&border(&col_widths, '┌', '┬', '┐'));
        output.push_str(&self.line(headers, &col_widths, true));
        output.push_str(&border(&col_widths, '├', '┼', '┤'));
        for row in rows {
            output.push_str(&self.line(&row.field_strings(), &col_widths, false));
        }
        output.push_str(&border(&col_widths, '└', '┴', '┘'));

        let row_label = if rows.len() == 1 { "row" } else { "rows" };
        output.push_str(&format!("({} {})", rows.len(), row_label));
        output
    }

    fn line(&self, values: &[String], col_widths: &[usize], is_header: bool) -> String {
        let mut output = String::from("│");
        for (idx, width) in col_widths.iter().enumerate() {
            let value = values.get(idx).map(|v| single_line(v)).unwrap_or_default();
            let mut cell = Self::truncate_value(&value, *width);
            let padding = width.saturating_sub(cell.width());
            cell.push_str(&" ".repeat(padding));
            output.push(' ');
            if is_header && self.color {
                output.push_str(&cell.bold().to_string());
            } else {
                output.push_str(&cell);
            }
            output.push_str(" │");
        }
        output.push('\n');
        output
    }

    /// Array of objects keyed by header, values in their wire JSON shape
    fn format_json(&self, headers: &[String], rows: &[StatementResultRow]) -> Result<String> {
        let objects: Vec<JsonValue> = rows
            .iter()
            .map(|row| {
                let object: Map<String, JsonValue> = headers
                    .iter()
                    .cloned()
                    .zip(row.fields.iter().map(|field| field.to_sdk_type()))
                    .collect();
                JsonValue::Object(object)
            })
            .collect();

        serde_json::to_string_pretty(&objects).map_err(|e| CLIError::FormatError(e.to_string()))
    }

    fn format_csv(&self, headers: &[String], rows: &[StatementResultRow]) -> String {
        let mut output = headers
            .iter()
            .map(|h| csv_escape(h))
            .collect::<Vec<_>>()
            .join(",");
        output.push('\n');

        for row in rows {
            let values: Vec<String> = row
                .fields
                .iter()
                .map(|field| if field.is_null() { String::new() } else { csv_escape(&field.to_string()) })
                .collect();
            output.push_str(&values.join(","));
            output.push('\n');
        }
        output
    }

    /// One-line outcome of a statement that produced no result set
    pub fn format_statement_summary(&self, statement: &ProcessedStatement) -> String {
        let mut summary = format!("Statement {}: {}", statement.statement_name, statement.status);
        if !statement.status_detail().is_empty() {
            summary.push_str(&format!(" ({})", statement.status_detail()));
        }
        if self.color {
            summary.green().to_string()
        } else {
            summary
        }
    }

    pub fn format_error(&self, error: &StatementError) -> String {
        let label = match error.status_code {
            Some(code) => format!("ERROR {}", code),
            None => "ERROR".to_string(),
        };
        if self.color {
            format!("{}: {}", label.red().bold(), error)
        } else {
            format!("{}: {}", label, error)
        }
    }
}

/// Shrink `col_widths` so the table fits `terminal_width`
fn fit_widths(col_widths: &mut [usize], terminal_width: usize) {
    let column_count = col_widths.len();
    if column_count == 0 {
        return;
    }

    let border_padding = column_count * 3 + 1;
    let available = terminal_width.saturating_sub(border_padding).max(column_count);

    let mut total_width: usize = col_widths.iter().sum();
    if total_width <= available {
        return;
    }

    for width in col_widths.iter_mut() {
        *width = (*width).min(MAX_COLUMN_WIDTH);
    }
    total_width = col_widths.iter().sum();

    while total_width > available {
        let widest = col_widths
            .iter()
            .enumerate()
            .filter(|(_, width)| **width > MIN_COLUMN_WIDTH)
            .max_by_key(|(_, width)| **width)
            .or_else(|| {
                col_widths
                    .iter()
                    .enumerate()
                    .filter(|(_, width)| **width > 1)
                    .max_by_key(|(_, width)| **width)
            })
            .map(|(idx, _)| idx);

        match widest {
            Some(idx) => col_widths[idx] -= 1,
            None => break,
        }
        total_width -= 1;
    }
}

fn border(col_widths: &[usize], left: char, middle: char, right: char) -> String {
    let mut output = String::new();
    output.push(left);
    for (idx, width) in col_widths.iter().enumerate() {
        output.push_str(&"─".repeat(width + 2));
        output.push(if idx == col_widths.len() - 1 { right } else { middle });
    }
    output.push('\n');
    output
}

fn single_line(value: &str) -> String {
    value.replace(['\r', '\n'], " ")
}

/// Longest prefix of `value` that fits in `columns` terminal columns
fn take_columns(value: &str, columns: usize) -> String {
    let mut used = 0;
    value
        .chars()
        .take_while(|c| {
            used += c.width().unwrap_or(0);
            used <= columns
        })
        .collect()
}

/// Quote a CSV value when it contains commas, quotes or newlines
fn csv_escape(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
