//! Core data models for catalog entries and scan results.
//!
//! Catalog references ([`TableRef`], [`ColumnRef`]) are read fresh from the
//! database at scan start and never mutated. Result records
//! ([`ColumnMatch`], [`SkippedColumn`], [`SkippedTable`]) accumulate into a
//! [`ScanResult`] that is handed to the console formatter and JSON exporter.

use crate::error::QueryErrorKind;
use serde::{Deserialize, Serialize};

/// Supported database types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DatabaseType {
    PostgreSQL,
    MySQL,
    SQLite,
    SqlServer,
}

impl std::fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatabaseType::PostgreSQL => write!(f, "PostgreSQL"),
            DatabaseType::MySQL => write!(f, "MySQL"),
            DatabaseType::SQLite => write!(f, "SQLite"),
            DatabaseType::SqlServer => write!(f, "SQL Server"),
        }
    }
}

/// A base table as listed by the catalog.
///
/// Identity is the `(schema, name)` pair. User-supplied names are compared
/// against `name` only, case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableRef {
    pub schema: String,
    pub name: String,
}

impl TableRef {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }

    /// Case-insensitive comparison of the table name, ignoring the schema.
    pub fn name_eq_ignore_case(&self, other: &str) -> bool {
        self.name.to_lowercase() == other.trim().to_lowercase()
    }
}

impl std::fmt::Display for TableRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.schema.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}.{}", self.schema, self.name)
        }
    }
}

/// A column of a [`TableRef`] with its declared type tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnRef {
    pub table: TableRef,
    pub name: String,
    /// Declared type as reported by the catalog, e.g. `varchar` or `image`
    pub data_type: String,
    /// 1-based position within the table
    pub ordinal: u32,
}

impl ColumnRef {
    pub fn new(
        table: TableRef,
        name: impl Into<String>,
        data_type: impl Into<String>,
        ordinal: u32,
    ) -> Self {
        Self {
            table,
            name: name.into(),
            data_type: data_type.into(),
            ordinal,
        }
    }
}

impl std::fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.table, self.name)
    }
}

/// A column that holds at least one matching row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMatch {
    pub column: ColumnRef,
    pub match_count: u64,
    /// Up to the configured sample limit, in the order the database returned them
    pub samples: Vec<String>,
}

/// Why a column was not (successfully) searched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// The declared type cannot be compared as text
    UnsearchableType,
    /// The count or sample query failed
    QueryFailed {
        kind: QueryErrorKind,
        message: String,
    },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::UnsearchableType => write!(f, "unsearchable type"),
            SkipReason::QueryFailed { kind, message } => write!(f, "{kind}: {message}"),
        }
    }
}

/// A column left out of the scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedColumn {
    pub column: ColumnRef,
    pub reason: SkipReason,
}

/// A table whose columns could not be listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedTable {
    pub table: TableRef,
    pub message: String,
}

/// How a scan ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanTermination {
    /// Every selected table was visited
    Completed,
    /// Stop-on-first fired after the first match
    Stopped,
}

/// Outcome of one search run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    /// Matches in discovery order
    pub matches: Vec<ColumnMatch>,
    pub skipped_columns: Vec<SkippedColumn>,
    pub skipped_tables: Vec<SkippedTable>,
    pub tables_scanned: usize,
    /// Count queries issued
    pub columns_scanned: usize,
    /// Columns seen in the catalog, searchable or not
    pub columns_considered: usize,
    pub termination: ScanTermination,
    pub elapsed_ms: u64,
    pub warnings: Vec<String>,
}

impl ScanResult {
    /// Returns true when at least one column matched.
    pub fn has_matches(&self) -> bool {
        !self.matches.is_empty()
    }

    /// Returns true when the scan ended through stop-on-first.
    pub fn stopped_early(&self) -> bool {
        self.termination == ScanTermination::Stopped
    }

    /// Number of columns skipped because their type is not searchable.
    pub fn unsearchable_count(&self) -> usize {
        self.skipped_columns
            .iter()
            .filter(|s| s.reason == SkipReason::UnsearchableType)
            .count()
    }

    /// Number of columns whose query failed.
    pub fn failed_count(&self) -> usize {
        self.skipped_columns
            .iter()
            .filter(|s| matches!(s.reason, SkipReason::QueryFailed { .. }))
            .count()
    }
}
