//! Shared data models for search results and table metadata.
//!
//! These types form the stable JSON API surface used by the HTTP
//! server, the CLI `--format json` output, and the HTTP client backend.

use std::fmt;
use std::path::PathBuf;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Field delimiter a table was parsed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Delimiter {
    Semicolon,
    Tab,
}

impl Delimiter {
    /// Delimiters in the order the loader attempts them.
    pub const ATTEMPT_ORDER: [Delimiter; 2] = [Delimiter::Semicolon, Delimiter::Tab];

    pub fn as_byte(self) -> u8 {
        match self {
            Delimiter::Semicolon => b';',
            Delimiter::Tab => b'\t',
        }
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Delimiter::Semicolon => f.write_str("semicolon"),
            Delimiter::Tab => f.write_str("tab"),
        }
    }
}

/// A single table row rendered for output.
///
/// Serializes as a JSON object whose keys follow the table's column
/// order. Missing cells serialize as `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, Option<String>)>,
}

impl Record {
    pub fn new(fields: Vec<(String, Option<String>)>) -> Self {
        Self { fields }
    }

    /// Value of `column`, or `None` when the column is absent or the
    /// cell is missing.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .and_then(|(_, value)| value.as_deref())
    }

    pub fn fields(&self) -> &[(String, Option<String>)] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RecordVisitor;

        impl<'de> Visitor<'de> for RecordVisitor {
            type Value = Record;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of column names to string or null values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Record, A::Error> {
                let mut fields = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((name, value)) = access.next_entry::<String, Option<String>>()? {
                    fields.push((name, value));
                }
                Ok(Record { fields })
            }
        }

        deserializer.deserialize_map(RecordVisitor)
    }
}

/// Result of a single search.
///
/// Field names match the JSON body consumed by the frontend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Number of matching rows; always equal to `resultados.len()`.
    pub total: usize,
    /// Matching rows in table order.
    pub resultados: Vec<Record>,
}

impl SearchResult {
    pub fn from_records(resultados: Vec<Record>) -> Self {
        Self {
            total: resultados.len(),
            resultados,
        }
    }
}

/// Metadata describing a successfully loaded table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableInfo {
    /// Path the table was loaded from.
    pub source: PathBuf,
    pub delimiter: Delimiter,
    /// Normalized column names in source order.
    pub columns: Vec<String>,
    pub rows: usize,
    /// RFC 3339 timestamp of the load, when the clock could be formatted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loaded_at: Option<String>,
}

/// Health-check response payload.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub table: Option<TableInfo>,
}
