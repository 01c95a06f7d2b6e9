//! In-memory result storage for a running statement.

mod arena_list;
mod iterator;
mod materialized;

pub use iterator::MaterializedStatementResultsIterator;
pub use materialized::{MaterializedStatementResults, OPERATION_HEADER};
