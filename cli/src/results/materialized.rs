//! Bounded changelog and upsert-compacted table built from result rows.
//!
//! Every accepted row is appended to the changelog view and then folded into
//! the table view: with upsert columns, updates overwrite and deletes remove
//! the row carrying the same key; without them the full row text is the key,
//! so update-before and delete both retract one identical row while
//! update-after behaves like an insert. Both views are FIFO-capped at
//! `max_capacity`.
//!
//! A key can map to several live table nodes (the server does not enforce
//! uniqueness), so the cache keeps an ordered queue of node handles per key:
//! updates and deletes act on the newest handle, eviction on the oldest.

use log::{debug, warn};
use parking_lot::RwLock;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use strata_link::{FieldType, StatementResultField, StatementResultOperation, StatementResultRow};
use unicode_width::UnicodeWidthStr;

use super::arena_list::{ArenaList, NodeRef};
use super::iterator::MaterializedStatementResultsIterator;

/// Header of the synthesized operation column shown in changelog mode
pub const OPERATION_HEADER: &str = "Operation";

/// Joins key fields so that `("a", "bc")` and `("ab", "c")` differ
const KEY_SEPARATOR: char = '\u{1f}';

#[derive(Debug, Default)]
pub(crate) struct ResultsState {
    changelog: ArenaList<StatementResultRow>,
    table: ArenaList<StatementResultRow>,
    cache: HashMap<String, VecDeque<NodeRef>>,
    is_table_mode: bool,
}

impl ResultsState {
    pub(crate) fn is_table_mode(&self) -> bool {
        self.is_table_mode
    }

    pub(crate) fn view(&self, table_mode: bool) -> &ArenaList<StatementResultRow> {
        if table_mode {
            &self.table
        } else {
            &self.changelog
        }
    }

    fn push_table_row(&mut self, key: String, row: StatementResultRow) {
        let node = self.table.push_back(row);
        self.cache.entry(key).or_default().push_back(node);
    }

    /// Remove the newest table row cached under `key`
    fn remove_last(&mut self, key: &str) {
        let Some(refs) = self.cache.get_mut(key) else {
            return;
        };
        if let Some(node) = refs.pop_back() {
            if self.table.remove(node).is_none() {
                warn!("Cached table node for key {:?} was already removed", key);
            }
        }
        if refs.is_empty() {
            self.cache.remove(key);
        }
    }

    fn upsert(&mut self, key: String, row: StatementResultRow) {
        match row.operation {
            StatementResultOperation::Insert => self.push_table_row(key, row),
            StatementResultOperation::UpdateAfter => {
                let last = self.cache.get(&key).and_then(|refs| refs.back().copied());
                match last.and_then(|node| self.table.get_mut(node)) {
                    Some(current) => *current = row,
                    // Servers may send update-after without the preceding update-before
                    None => self.push_table_row(key, row),
                }
            },
            StatementResultOperation::UpdateBefore => {},
            StatementResultOperation::Delete => self.remove_last(&key),
        }
    }

    fn apply_without_upsert_key(&mut self, key: String, row: StatementResultRow) {
        match row.operation {
            StatementResultOperation::Insert | StatementResultOperation::UpdateAfter => {
                self.push_table_row(key, row)
            },
            StatementResultOperation::UpdateBefore | StatementResultOperation::Delete => {
                self.remove_last(&key)
            },
        }
    }

    fn forget_evicted(&mut self, key: &str, evicted: NodeRef) {
        match self.cache.get_mut(key) {
            Some(refs) if refs.front() == Some(&evicted) => {
                refs.pop_front();
                if refs.is_empty() {
                    self.cache.remove(key);
                }
            },
            Some(refs) => warn!(
                "Evicted table row is not the oldest cached row for key {:?} ({} cached); cache left unchanged",
                key,
                refs.len()
            ),
            None => warn!("Evicted table row has no cache entry for key {:?}", key),
        }
    }
}

/// Materialized view over one statement's changelog
pub struct MaterializedStatementResults {
    headers: Vec<String>,
    max_capacity: usize,
    upsert_columns: Option<Vec<usize>>,
    state: Arc<RwLock<ResultsState>>,
}

impl MaterializedStatementResults {
    /// `max_capacity` bounds both views; 0 behaves like 1.
    /// Table mode is the initial view.
    pub fn new(headers: Vec<String>, max_capacity: usize, upsert_columns: Option<Vec<usize>>) -> Self {
        Self {
            headers,
            max_capacity: max_capacity.max(1),
            upsert_columns,
            state: Arc::new(RwLock::new(ResultsState {
                is_table_mode: true,
                ..Default::default()
            })),
        }
    }

    /// Append rows to the changelog and fold them into the table.
    ///
    /// Rows whose field count differs from the header count are skipped.
    /// Returns `true` only if every row was accepted.
    pub fn append(&self, rows: impl IntoIterator<Item = StatementResultRow>) -> bool {
        let mut state = self.state.write();
        let mut all_inserted = true;

        for row in rows {
            if row.fields.len() != self.headers.len() {
                debug!(
                    "Skipping row with {} fields, expected {}",
                    row.fields.len(),
                    self.headers.len()
                );
                all_inserted = false;
                continue;
            }

            state.changelog.push_back(row.clone());
            match self.upsert_key(&row) {
                Some(key) => state.upsert(key, row),
                None => state.apply_without_upsert_key(full_row_key(&row), row),
            }
            self.cleanup(&mut state);
        }

        all_inserted
    }

    fn cleanup(&self, state: &mut ResultsState) {
        if state.changelog.len() > self.max_capacity {
            state.changelog.pop_front();
        }

        if state.table.len() > self.max_capacity {
            if let Some((evicted, row)) = state.table.pop_front() {
                let key = self.cache_key(&row);
                state.forget_evicted(&key, evicted);
            }
        }
    }

    /// Key from the configured upsert columns, or `None` if there are none or
    /// any index is out of range for this row.
    fn upsert_key(&self, row: &StatementResultRow) -> Option<String> {
        let columns = self.upsert_columns.as_deref().filter(|c| !c.is_empty())?;
        let mut key = String::new();
        for (pos, &idx) in columns.iter().enumerate() {
            let field = row.fields.get(idx)?;
            if pos > 0 {
                key.push(KEY_SEPARATOR);
            }
            key.push_str(&field.to_string());
        }
        Some(key)
    }

    fn cache_key(&self, row: &StatementResultRow) -> String {
        self.upsert_key(row).unwrap_or_else(|| full_row_key(row))
    }

    pub fn get_headers(&self) -> Vec<String> {
        let table_mode = self.state.read().is_table_mode;
        self.headers_for(table_mode)
    }

    fn headers_for(&self, table_mode: bool) -> Vec<String> {
        if table_mode {
            return self.headers.clone();
        }
        let mut headers = Vec::with_capacity(self.headers.len() + 1);
        headers.push(OPERATION_HEADER.to_string());
        headers.extend(self.headers.iter().cloned());
        headers
    }

    pub fn get_max_capacity(&self) -> usize {
        self.max_capacity
    }

    pub fn get_upsert_columns(&self) -> Option<&[usize]> {
        self.upsert_columns.as_deref()
    }

    /// Number of rows in the view currently selected
    pub fn size(&self) -> usize {
        let state = self.state.read();
        state.view(state.is_table_mode).len()
    }

    pub fn get_table_size(&self) -> usize {
        self.state.read().table.len()
    }

    pub fn get_changelog_size(&self) -> usize {
        self.state.read().changelog.len()
    }

    pub fn is_table_mode(&self) -> bool {
        self.state.read().is_table_mode
    }

    pub fn set_table_mode(&self, table_mode: bool) {
        self.state.write().is_table_mode = table_mode;
    }

    /// Switch between table and changelog view; returns the new mode.
    pub fn toggle_table_mode(&self) -> bool {
        let mut state = self.state.write();
        state.is_table_mode = !state.is_table_mode;
        state.is_table_mode
    }

    /// Snapshot of the table view, front to back
    pub fn get_table(&self) -> Vec<StatementResultRow> {
        self.state.read().table.iter().cloned().collect()
    }

    /// Snapshot of the changelog view, front to back
    pub fn get_changelog(&self) -> Vec<StatementResultRow> {
        self.state.read().changelog.iter().cloned().collect()
    }

    /// Cursor over the current view, positioned at its first or last row
    pub fn iterator(&self, start_from_back: bool) -> MaterializedStatementResultsIterator {
        MaterializedStatementResultsIterator::new(Arc::clone(&self.state), start_from_back)
    }

    /// Call `f(index, row)` for every row of the current view, front to back.
    ///
    /// Runs under the read lock, so `f` sees one consistent snapshot and must
    /// not call back into this store.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(usize, &StatementResultRow),
    {
        let state = self.state.read();
        Self::for_each_locked(&state, &mut f);
    }

    fn for_each_locked<F>(state: &ResultsState, f: &mut F)
    where
        F: FnMut(usize, &StatementResultRow),
    {
        let table_mode = state.is_table_mode;
        for (idx, row) in state.view(table_mode).iter().enumerate() {
            if table_mode {
                f(idx, row);
            } else {
                f(idx, &with_operation_field(row));
            }
        }
    }

    /// Widest rendered value per column of the current view, headers included.
    /// Multi-line values count their widest line.
    pub fn get_max_width_per_column(&self) -> Vec<usize> {
        let state = self.state.read();
        let headers = self.headers_for(state.is_table_mode);
        let mut widths: Vec<usize> = headers.iter().map(|h| display_width(h)).collect();

        Self::for_each_locked(&state, &mut |_, row| {
            for (idx, field) in row.fields.iter().enumerate() {
                if let Some(width) = widths.get_mut(idx) {
                    *width = (*width).max(display_width(&field.to_string()));
                }
            }
        });

        widths
    }
}

/// Copy of `row` with a leading column holding its operation symbol
pub(crate) fn with_operation_field(row: &StatementResultRow) -> StatementResultRow {
    let mut fields = Vec::with_capacity(row.fields.len() + 1);
    fields.push(StatementResultField::atomic(
        FieldType::Varchar,
        row.operation.symbol(),
    ));
    fields.extend(row.fields.iter().cloned());
    StatementResultRow::new(row.operation, fields)
}

fn full_row_key(row: &StatementResultRow) -> String {
    let mut key = String::new();
    for (pos, field) in row.fields.iter().enumerate() {
        if pos > 0 {
            key.push(KEY_SEPARATOR);
        }
        key.push_str(&field.to_string());
    }
    key
}

/// Terminal columns of the widest line; wide glyphs count as two
pub(crate) fn display_width(value: &str) -> usize {
    value.lines().map(UnicodeWidthStr::width).max().unwrap_or(0)
}
