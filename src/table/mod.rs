//! Delimited-file table loader.
//!
//! A `Table` is built once at startup from a single delimited text
//! file and is read-only afterwards. Loading tries a semicolon
//! delimiter first and falls back to tab when the strict parse fails.
//! A failed load is downgraded to the empty-table sentinel by
//! [`load_or_empty`] so the process keeps running in a degraded state.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord};
use thiserror::Error;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tracing::{debug, error, info};

use crate::models::{Delimiter, Record, TableInfo};

/// Errors produced while loading a table.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "failed to parse {} as semicolon-delimited ({primary}) or tab-delimited ({fallback})",
        .path.display()
    )]
    Parse {
        path: PathBuf,
        primary: String,
        fallback: String,
    },

    #[error("{} contains no columns", .path.display())]
    NoColumns { path: PathBuf },
}

/// Where a loaded table came from.
#[derive(Debug, Clone)]
struct Provenance {
    path: PathBuf,
    delimiter: Delimiter,
    loaded_at: Option<String>,
}

/// In-memory table of named columns and text cells.
///
/// Every row holds exactly one cell per column, in column order. A
/// missing cell is `None`, distinct from `Some("")`.
#[derive(Debug, Clone, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
    provenance: Option<Provenance>,
}

impl Table {
    /// The empty-table sentinel used when loading fails.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether this is the empty-table sentinel.
    pub fn is_unavailable(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Option<String>]> {
        self.rows.iter().map(Vec::as_slice)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Build the output record for a row of this table.
    pub fn record(&self, row: &[Option<String>]) -> Record {
        Record::new(
            self.columns
                .iter()
                .cloned()
                .zip(row.iter().cloned())
                .collect(),
        )
    }

    fn delimiter(&self) -> Option<Delimiter> {
        self.provenance.as_ref().map(|p| p.delimiter)
    }

    /// Metadata for a loaded table; `None` for the sentinel.
    pub fn info(&self) -> Option<TableInfo> {
        let provenance = self.provenance.as_ref()?;
        Some(TableInfo {
            source: provenance.path.clone(),
            delimiter: provenance.delimiter,
            columns: self.columns.clone(),
            rows: self.rows.len(),
            loaded_at: provenance.loaded_at.clone(),
        })
    }
}

/// Load a table from `path`.
///
/// Emits one `info` record on success and one `error` record on
/// failure.
pub fn load(path: &Path) -> Result<Table, LoadError> {
    let result = fs::read_to_string(path)
        .map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })
        .and_then(|text| from_text(&text, path));

    match &result {
        Ok(table) => info!(
            path = %path.display(),
            rows = table.row_count(),
            columns = table.columns.len(),
            delimiter = ?table.delimiter(),
            "loaded operator table"
        ),
        Err(err) => error!(path = %path.display(), error = %err, "failed to load operator table"),
    }

    result
}

/// Load a table from `path`, falling back to the empty-table sentinel
/// on failure.
pub fn load_or_empty(path: &Path) -> Table {
    load(path).unwrap_or_else(|_| Table::empty())
}

/// Parse already-read file contents. `source` is recorded as the
/// table's provenance.
pub fn from_text(text: &str, source: &Path) -> Result<Table, LoadError> {
    let [primary, fallback] = Delimiter::ATTEMPT_ORDER;

    let (columns, rows, delimiter) = match parse_with(text, primary) {
        Ok((columns, rows)) => (columns, rows, primary),
        Err(primary_err) => {
            debug!(
                path = %source.display(),
                error = %primary_err,
                "strict {primary} parse failed; retrying with {fallback}"
            );
            match parse_with(text, fallback) {
                Ok((columns, rows)) => (columns, rows, fallback),
                Err(fallback_err) => {
                    return Err(LoadError::Parse {
                        path: source.to_path_buf(),
                        primary: primary_err.to_string(),
                        fallback: fallback_err.to_string(),
                    })
                }
            }
        }
    };

    if columns.is_empty() {
        return Err(LoadError::NoColumns {
            path: source.to_path_buf(),
        });
    }

    Ok(Table {
        columns,
        rows,
        provenance: Some(Provenance {
            path: source.to_path_buf(),
            delimiter,
            loaded_at: current_timestamp(),
        }),
    })
}

type ParsedTable = (Vec<String>, Vec<Vec<Option<String>>>);

/// Strict parse: every record must have as many fields as the header.
fn parse_with(text: &str, delimiter: Delimiter) -> Result<ParsedTable, csv::Error> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter.as_byte())
        .has_headers(true)
        .flexible(false)
        .from_reader(text.as_bytes());

    let columns = normalize_headers(reader.headers()?);

    let mut rows = Vec::new();
    for record in reader.records() {
        rows.push(cells(&record?));
    }

    Ok((columns, rows))
}

fn cells(record: &StringRecord) -> Vec<Option<String>> {
    record
        .iter()
        .map(|field| {
            if field.is_empty() {
                None
            } else {
                Some(field.to_string())
            }
        })
        .collect()
}

/// Trim header names and make them unique.
///
/// Blank names become `Unnamed: <index>`; repeated names get `.1`,
/// `.2`, ... suffixes in source order.
fn normalize_headers(headers: &StringRecord) -> Vec<String> {
    // A header row consisting of a single empty field is an empty file.
    if headers.len() == 1 && headers.get(0).is_some_and(|h| h.trim().is_empty()) {
        return Vec::new();
    }

    let mut seen: HashSet<String> = HashSet::new();
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut columns = Vec::with_capacity(headers.len());

    for (idx, raw) in headers.iter().enumerate() {
        let trimmed = raw.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}');
        let base = if trimmed.is_empty() {
            format!("Unnamed: {idx}")
        } else {
            trimmed.to_string()
        };

        let mut name = base.clone();
        while seen.contains(&name) {
            let count = counts.entry(base.clone()).or_insert(0);
            *count += 1;
            name = format!("{base}.{count}");
        }

        seen.insert(name.clone());
        columns.push(name);
    }

    columns
}

fn current_timestamp() -> Option<String> {
    OffsetDateTime::now_utc().format(&Rfc3339).ok()
}
