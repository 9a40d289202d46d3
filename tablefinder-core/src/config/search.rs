//! Search run configuration.

use crate::search::classifier::UnsearchableTypes;
use serde::{Deserialize, Serialize};

/// Upper bound on sample values collected per matching column.
pub const MAX_SAMPLE_LIMIT: usize = 5;

/// How `%` and `_` inside a partial-match target are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WildcardMode {
    /// Literal `%`, `_` and `\` are escaped so the target matches verbatim
    #[default]
    Escaped,
    /// The target is wrapped as-is; `%` and `_` act as LIKE wildcards
    Raw,
}

/// Parameters of one search run.
///
/// Built once from the command line, validated before the scan starts and
/// read-only afterwards.
///
/// # Example
/// ```rust
/// use tablefinder_core::config::SearchConfig;
///
/// let config = SearchConfig::new("ACME-00042")
///     .with_exact(true)
///     .with_skip_tables(["AuditLog", " auditlog ", ""]);
///
/// assert!(config.validate().is_ok());
/// assert_eq!(config.skip_tables, vec!["auditlog".to_string()]);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub search_value: String,
    pub exact: bool,
    pub case_sensitive: bool,
    /// SQL LIKE pattern applied to table names
    pub table_pattern: Option<String>,
    /// Table name moved to the front of the scan order
    pub start_from: Option<String>,
    /// Lower-cased, trimmed, deduplicated table names to leave out
    pub skip_tables: Vec<String>,
    pub stop_on_first: bool,
    pub wildcards: WildcardMode,
    pub unsearchable_types: UnsearchableTypes,
    pub sample_limit: usize,
    /// Tables scanned concurrently when the adapter pools connections
    pub max_concurrency: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            search_value: String::new(),
            exact: false,
            case_sensitive: false,
            table_pattern: None,
            start_from: None,
            skip_tables: Vec::new(),
            stop_on_first: false,
            wildcards: WildcardMode::default(),
            unsearchable_types: UnsearchableTypes::default(),
            sample_limit: MAX_SAMPLE_LIMIT,
            max_concurrency: 1,
        }
    }
}

impl SearchConfig {
    /// Creates a partial, case-insensitive search for `search_value`.
    pub fn new(search_value: impl Into<String>) -> Self {
        Self {
            search_value: search_value.into(),
            ..Default::default()
        }
    }

    /// Checks the invariants the orchestrator relies on.
    ///
    /// # Errors
    /// Returns a configuration error naming the first offending field.
    pub fn validate(&self) -> crate::Result<()> {
        if self.search_value.is_empty() {
            return Err(crate::error::TableFinderError::configuration(
                "Search value cannot be empty",
            ));
        }

        if self.sample_limit == 0 || self.sample_limit > MAX_SAMPLE_LIMIT {
            return Err(crate::error::TableFinderError::configuration(format!(
                "sample_limit must be between 1 and {}",
                MAX_SAMPLE_LIMIT
            )));
        }

        if self.max_concurrency == 0 {
            return Err(crate::error::TableFinderError::configuration(
                "max_concurrency must be greater than 0",
            ));
        }

        if self.table_pattern.as_deref() == Some("") {
            return Err(crate::error::TableFinderError::configuration(
                "table_pattern cannot be empty",
            ));
        }

        Ok(())
    }

    pub fn with_exact(mut self, exact: bool) -> Self {
        self.exact = exact;
        self
    }

    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    pub fn with_table_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.table_pattern = Some(pattern.into());
        self
    }

    pub fn with_start_from(mut self, table: impl Into<String>) -> Self {
        self.start_from = Some(table.into());
        self
    }

    /// Sets the skip list, normalising each entry.
    pub fn with_skip_tables<I, S>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.skip_tables = normalize_names(tables);
        self
    }

    pub fn with_stop_on_first(mut self, stop_on_first: bool) -> Self {
        self.stop_on_first = stop_on_first;
        self
    }

    pub fn with_wildcards(mut self, mode: WildcardMode) -> Self {
        self.wildcards = mode;
        self
    }

    pub fn with_unsearchable_types(mut self, types: UnsearchableTypes) -> Self {
        self.unsearchable_types = types;
        self
    }

    pub fn with_sample_limit(mut self, limit: usize) -> Self {
        self.sample_limit = limit;
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    /// Returns true when `name` is on the skip list, ignoring case.
    pub fn is_skipped(&self, name: &str) -> bool {
        let lowered = name.to_lowercase();
        self.skip_tables
            .iter()
            .any(|s| s.trim().to_lowercase() == lowered)
    }
}

/// Splits a comma-separated list such as the `--skip-tables` argument.
///
/// Entries are trimmed and lower-cased; empty entries and duplicates are
/// dropped while first-seen order is kept.
pub fn parse_skip_list(raw: &str) -> Vec<String> {
    normalize_names(raw.split(','))
}

pub(crate) fn normalize_names<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut normalized: Vec<String> = Vec::new();
    for name in names {
        let entry = name.as_ref().trim().to_lowercase();
        if !entry.is_empty() && !normalized.contains(&entry) {
            normalized.push(entry);
        }
    }
    normalized
}
