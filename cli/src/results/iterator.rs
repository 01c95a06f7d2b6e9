use parking_lot::RwLock;
use std::sync::Arc;
use strata_link::StatementResultRow;

use super::arena_list::NodeRef;
use super::materialized::{with_operation_field, ResultsState};

/// Cursor over one view of a [`MaterializedStatementResults`].
///
/// The view (table or changelog) is fixed when the iterator is created. Each
/// call takes the store's read lock briefly, so appends can proceed between
/// calls; if the row under the cursor is evicted meanwhile, the iterator
/// behaves as if it reached the end. Once past either end it stays there, and
/// a new iterator has to be created to start over.
///
/// [`MaterializedStatementResults`]: super::MaterializedStatementResults
pub struct MaterializedStatementResultsIterator {
    state: Arc<RwLock<ResultsState>>,
    is_table_mode: bool,
    current: Option<NodeRef>,
}

impl MaterializedStatementResultsIterator {
    pub(crate) fn new(state: Arc<RwLock<ResultsState>>, start_from_back: bool) -> Self {
        let (is_table_mode, current) = {
            let guard = state.read();
            let is_table_mode = guard.is_table_mode();
            let view = guard.view(is_table_mode);
            let current = if start_from_back {
                view.back()
            } else {
                view.front()
            };
            (is_table_mode, current)
        };

        Self {
            state,
            is_table_mode,
            current,
        }
    }

    pub fn has_reached_end(&self) -> bool {
        self.current.is_none()
    }

    /// Row under the cursor; prefixed with its operation in changelog mode
    pub fn value(&self) -> Option<StatementResultRow> {
        let current = self.current?;
        let state = self.state.read();
        let row = state.view(self.is_table_mode).get(current)?;
        Some(self.present(row))
    }

    /// Return the row under the cursor and advance towards the back
    pub fn get_next(&mut self) -> Option<StatementResultRow> {
        self.step(true)
    }

    /// Return the row under the cursor and step towards the front
    pub fn get_prev(&mut self) -> Option<StatementResultRow> {
        self.step(false)
    }

    /// Move `steps` rows (negative: towards the front), stopping early at
    /// either end, and return the row at the final position.
    pub fn move_by(&mut self, steps: isize) -> Option<StatementResultRow> {
        {
            let state = self.state.read();
            let view = state.view(self.is_table_mode);
            let mut remaining = steps;
            while remaining != 0 {
                let Some(current) = self.current else {
                    break;
                };
                self.current = if remaining < 0 {
                    remaining += 1;
                    view.prev(current)
                } else {
                    remaining -= 1;
                    view.next(current)
                };
            }
        }
        self.value()
    }

    fn step(&mut self, forward: bool) -> Option<StatementResultRow> {
        let current = self.current?;
        let state = self.state.read();
        let view = state.view(self.is_table_mode);

        let Some(row) = view.get(current) else {
            self.current = None;
            return None;
        };
        let row = self.present(row);
        self.current = if forward {
            view.next(current)
        } else {
            view.prev(current)
        };
        Some(row)
    }

    fn present(&self, row: &StatementResultRow) -> StatementResultRow {
        if self.is_table_mode {
            row.clone()
        } else {
            with_operation_field(row)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::MaterializedStatementResults;
    use strata_link::{StatementResultField, StatementResultOperation, StatementResultRow};

    fn populated(count: usize) -> MaterializedStatementResults {
        let results = MaterializedStatementResults::new(vec!["n".into()], 100, None);
        results.append(
            (0..count).map(|i| StatementResultRow::insert(vec![StatementResultField::varchar(i.to_string())])),
        );
        results
    }

    fn value_of(row: Option<StatementResultRow>) -> Option<String> {
        row.map(|r| r.field_strings().join(","))
    }

    #[test]
    fn test_forward_then_backward_is_reversed() {
        let results = populated(5);

        let mut forward = Vec::new();
        let mut iter = results.iterator(false);
        while let Some(row) = iter.get_next() {
            forward.push(row.field_strings());
        }
        assert!(iter.has_reached_end());
        assert_eq!(iter.get_next(), None);

        let mut backward = Vec::new();
        let mut iter = results.iterator(true);
        while let Some(row) = iter.get_prev() {
            backward.push(row.field_strings());
        }

        backward.reverse();
        assert_eq!(forward, backward);
        assert_eq!(forward.len(), 5);
    }

    #[test]
    fn test_move_round_trip() {
        let results = populated(10);
        let mut iter = results.iterator(false);
        iter.move_by(2);
        let start = iter.value();

        assert_eq!(value_of(iter.move_by(4)), Some("6".to_string()));
        assert_eq!(iter.move_by(-4), start);
        assert_eq!(value_of(start), Some("2".to_string()));
    }

    #[test]
    fn test_move_past_boundary_stops_at_end() {
        let results = populated(3);
        let mut iter = results.iterator(true);
        assert_eq!(iter.move_by(-10), None);
        assert!(iter.has_reached_end());
        assert_eq!(iter.move_by(1), None);
        assert_eq!(iter.get_prev(), None);
    }

    #[test]
    fn test_changelog_iterator_decorates_rows() {
        let results = MaterializedStatementResults::new(vec!["n".into()], 10, None);
        results.append(vec![StatementResultRow::new(
            StatementResultOperation::UpdateAfter,
            vec![StatementResultField::varchar("x")],
        )]);
        results.toggle_table_mode();

        let iter = results.iterator(false);
        assert_eq!(value_of(iter.value()), Some("+U,x".to_string()));

        results.toggle_table_mode();
        let iter = results.iterator(false);
        assert_eq!(value_of(iter.value()), Some("x".to_string()));
    }

    #[test]
    fn test_empty_store_iterator_is_at_end() {
        let results = populated(0);
        let mut iter = results.iterator(false);
        assert!(iter.has_reached_end());
        assert_eq!(iter.get_next(), None);
        assert_eq!(iter.value(), None);
    }

    #[test]
    fn test_evicted_cursor_row_ends_iteration() {
        let results = MaterializedStatementResults::new(vec!["n".into()], 2, None);
        results.append(vec![
            StatementResultRow::insert(vec![StatementResultField::varchar("a")]),
            StatementResultRow::insert(vec![StatementResultField::varchar("b")]),
        ]);
        let mut iter = results.iterator(false);
        results.append(vec![
            StatementResultRow::insert(vec![StatementResultField::varchar("c")]),
        ]);

        assert_eq!(iter.get_next(), None);
        assert!(iter.has_reached_end());
    }
}
