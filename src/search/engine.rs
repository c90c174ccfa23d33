//! Case-insensitive substring search over a loaded table.
//!
//! The search is a full linear scan: a row matches when any of its
//! cells contains the term after lowercasing both sides. Matching
//! rows are returned in table order.

use thiserror::Error;

use crate::models::SearchResult;
use crate::table::Table;

/// Errors returned by [`search`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SearchError {
    /// The table failed to load, so there is nothing to search.
    #[error("operator data is unavailable: the source file could not be loaded")]
    DataUnavailable,

    /// Any other failure while matching or rendering rows.
    #[error("failed to process search: {details}")]
    Processing { details: String },
}

/// Search `table` for rows containing `term`.
///
/// An empty (or whitespace-only) term yields an empty result without
/// consulting the table. Searching the empty-table sentinel with a
/// non-empty term fails with [`SearchError::DataUnavailable`].
pub fn search(table: &Table, term: &str) -> Result<SearchResult, SearchError> {
    let term = term.trim();
    if term.is_empty() {
        return Ok(SearchResult::default());
    }

    if table.is_unavailable() {
        return Err(SearchError::DataUnavailable);
    }

    let needle = term.to_lowercase();
    let resultados = table
        .rows()
        .filter(|row| row_matches(row, &needle))
        .map(|row| table.record(row))
        .collect();

    Ok(SearchResult::from_records(resultados))
}

/// Whether any cell of `row` contains `needle`. Missing cells render
/// as the empty string.
fn row_matches(row: &[Option<String>], needle: &str) -> bool {
    row.iter()
        .any(|cell| cell_text(cell).to_lowercase().contains(needle))
}

fn cell_text(cell: &Option<String>) -> &str {
    cell.as_deref().unwrap_or("")
}
