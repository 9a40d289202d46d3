//! Serializable search report.
//!
//! [`SearchReport`] is the stable, versioned shape written by `--output`.
//! It flattens a [`SearchRun`] together with the options that produced it so
//! a saved report can be read without the invocation that created it.

use crate::config::{SearchConfig, WildcardMode};
use crate::error::QueryErrorKind;
use crate::models::{ColumnMatch, DatabaseType, ScanTermination, SkipReason, SkippedColumn};
use crate::search::SearchRun;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current report format version.
pub const REPORT_FORMAT_VERSION: &str = "1.0";

/// Options that shaped the search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportOptions {
    pub exact_match: bool,
    pub case_sensitive: bool,
    pub table_pattern: Option<String>,
    pub start_from: Option<String>,
    pub skip_tables: Vec<String>,
    pub stop_on_first: bool,
    pub wildcards: WildcardMode,
    pub sample_limit: usize,
}

impl From<&SearchConfig> for ReportOptions {
    fn from(config: &SearchConfig) -> Self {
        Self {
            exact_match: config.exact,
            case_sensitive: config.case_sensitive,
            table_pattern: config.table_pattern.clone(),
            start_from: config.start_from.clone(),
            skip_tables: config.skip_tables.clone(),
            stop_on_first: config.stop_on_first,
            wildcards: config.wildcards,
            sample_limit: config.sample_limit,
        }
    }
}

/// One column holding the value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportMatch {
    /// Schema-qualified table name
    pub table: String,
    pub column: String,
    pub data_type: String,
    pub match_count: u64,
    pub sample_values: Vec<String>,
}

impl From<&ColumnMatch> for ReportMatch {
    fn from(m: &ColumnMatch) -> Self {
        Self {
            table: m.column.table.to_string(),
            column: m.column.name.clone(),
            data_type: m.column.data_type.clone(),
            match_count: m.match_count,
            sample_values: m.samples.clone(),
        }
    }
}

/// A column that was not searched or whose query failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSkippedColumn {
    pub table: String,
    pub column: String,
    pub data_type: String,
    /// `unsearchable_type` or `query_failed`
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<QueryErrorKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<&SkippedColumn> for ReportSkippedColumn {
    fn from(skipped: &SkippedColumn) -> Self {
        let (reason, error_kind, message) = match &skipped.reason {
            SkipReason::UnsearchableType => ("unsearchable_type", None, None),
            SkipReason::QueryFailed { kind, message } => {
                ("query_failed", Some(*kind), Some(message.clone()))
            }
        };
        Self {
            table: skipped.column.table.to_string(),
            column: skipped.column.name.clone(),
            data_type: skipped.column.data_type.clone(),
            reason: reason.to_string(),
            error_kind,
            message,
        }
    }
}

/// A table whose columns could not be listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSkippedTable {
    pub table: String,
    pub message: String,
}

/// Scan counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub tables_selected: usize,
    pub tables_scanned: usize,
    pub columns_considered: usize,
    pub columns_scanned: usize,
    pub skipped_columns: usize,
    pub unsearchable_columns: usize,
    pub failed_columns: usize,
    pub skipped_tables: usize,
    pub stopped_early: bool,
    pub duration_ms: u64,
}

/// Versioned report of a single search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchReport {
    pub format_version: String,
    pub search_value: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_type: Option<String>,
    pub total_matches: usize,
    pub options: ReportOptions,
    pub results: Vec<ReportMatch>,
    pub summary: ReportSummary,
    pub skipped: Vec<ReportSkippedColumn>,
    pub skipped_tables: Vec<ReportSkippedTable>,
    pub warnings: Vec<String>,
    pub generator_version: String,
}

impl SearchReport {
    /// Builds a report timestamped now.
    pub fn new(config: &SearchConfig, run: &SearchRun) -> Self {
        let result = &run.result;
        Self {
            format_version: REPORT_FORMAT_VERSION.to_string(),
            search_value: config.search_value.clone(),
            timestamp: Utc::now(),
            database_type: None,
            total_matches: result.matches.len(),
            options: ReportOptions::from(config),
            results: result.matches.iter().map(ReportMatch::from).collect(),
            summary: ReportSummary {
                tables_selected: run.selection.final_count,
                tables_scanned: result.tables_scanned,
                columns_considered: result.columns_considered,
                columns_scanned: result.columns_scanned,
                skipped_columns: result.skipped_columns.len(),
                unsearchable_columns: result.unsearchable_count(),
                failed_columns: result.failed_count(),
                skipped_tables: result.skipped_tables.len(),
                stopped_early: result.termination == ScanTermination::Stopped,
                duration_ms: result.elapsed_ms,
            },
            skipped: result
                .skipped_columns
                .iter()
                .map(ReportSkippedColumn::from)
                .collect(),
            skipped_tables: result
                .skipped_tables
                .iter()
                .map(|t| ReportSkippedTable {
                    table: t.table.to_string(),
                    message: t.message.clone(),
                })
                .collect(),
            warnings: result.warnings.clone(),
            generator_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Records which backend was searched.
    pub fn with_database_type(mut self, database_type: DatabaseType) -> Self {
        self.database_type = Some(database_type.to_string());
        self
    }

    /// Pretty JSON that has passed output validation.
    ///
    /// # Errors
    /// Returns error if serialization fails or the document does not
    /// satisfy the report schema
    pub fn to_validated_json(&self) -> crate::Result<String> {
        let value = serde_json::to_value(self).map_err(|e| {
            crate::error::TableFinderError::Serialization {
                context: "Failed to serialize search report".to_string(),
                source: e,
            }
        })?;

        crate::validation::validate_report_output(&value)?;

        serde_json::to_string_pretty(&value).map_err(|e| {
            crate::error::TableFinderError::Serialization {
                context: "Failed to render search report".to_string(),
                source: e,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ColumnRef, ScanResult, SkippedTable, TableRef};
    use crate::search::SelectionStats;

    fn run() -> SearchRun {
        let customers = TableRef::new("dbo", "Customers");
        let name = ColumnRef::new(customers.clone(), "Name", "nvarchar", 2);
        let photo = ColumnRef::new(customers.clone(), "Photo", "image", 3);
        let notes = ColumnRef::new(customers, "Notes", "xml", 4);

        SearchRun {
            selection: SelectionStats {
                original_count: 3,
                final_count: 2,
                ..Default::default()
            },
            result: ScanResult {
                matches: vec![ColumnMatch {
                    column: name,
                    match_count: 3,
                    samples: vec!["Foobar".into(), "foobar ltd".into()],
                }],
                skipped_columns: vec![
                    SkippedColumn {
                        column: photo,
                        reason: SkipReason::UnsearchableType,
                    },
                    SkippedColumn {
                        column: notes,
                        reason: SkipReason::QueryFailed {
                            kind: QueryErrorKind::TypeCastUnsupported,
                            message: "conversion failed".into(),
                        },
                    },
                ],
                skipped_tables: vec![SkippedTable {
                    table: TableRef::new("dbo", "Locked"),
                    message: "permission denied".into(),
                }],
                tables_scanned: 1,
                columns_scanned: 2,
                columns_considered: 3,
                termination: ScanTermination::Completed,
                elapsed_ms: 42,
                warnings: Vec::new(),
            },
        }
    }

    #[test]
    fn test_report_from_run() {
        let config = SearchConfig::new("foobar").with_skip_tables(["Audit"]);
        let report = SearchReport::new(&config, &run()).with_database_type(DatabaseType::SqlServer);

        assert_eq!(report.format_version, REPORT_FORMAT_VERSION);
        assert_eq!(report.total_matches, 1);
        assert_eq!(report.results[0].table, "dbo.Customers");
        assert_eq!(report.results[0].column, "Name");
        assert_eq!(report.options.skip_tables, vec!["audit"]);
        assert_eq!(report.summary.tables_selected, 2);
        assert_eq!(report.summary.unsearchable_columns, 1);
        assert_eq!(report.summary.failed_columns, 1);
        assert_eq!(report.summary.skipped_tables, 1);
        assert!(!report.summary.stopped_early);
        assert_eq!(report.database_type.as_deref(), Some("SQL Server"));
    }

    #[test]
    fn test_skipped_column_reasons() {
        let report = SearchReport::new(&SearchConfig::new("x"), &run());

        assert_eq!(report.skipped[0].reason, "unsearchable_type");
        assert_eq!(report.skipped[0].error_kind, None);
        assert_eq!(report.skipped[1].reason, "query_failed");
        assert_eq!(
            report.skipped[1].error_kind,
            Some(QueryErrorKind::TypeCastUnsupported)
        );
    }

    #[test]
    fn test_to_validated_json() {
        crate::validation::initialize_schema_validator().unwrap();
        let report = SearchReport::new(&SearchConfig::new("foobar"), &run());
        let json = report.to_validated_json().unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["search_value"], "foobar");
        assert_eq!(value["total_matches"], 1);
        assert_eq!(value["results"][0]["sample_values"][1], "foobar ltd");
        assert_eq!(value["skipped"][1]["error_kind"], "type_cast_unsupported");
        assert!(value.get("database_type").is_none());

        let parsed: SearchReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, report);
    }
}
