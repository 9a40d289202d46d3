//! Column type classification.

use crate::models::{DatabaseType, SkipReason};
use serde::{Deserialize, Serialize};

/// Types that cannot be meaningfully compared as text.
pub const DEFAULT_UNSEARCHABLE_TYPES: &[&str] = &[
    "binary",
    "varbinary",
    "image",
    "timestamp",
    "rowversion",
    "geography",
    "geometry",
    "hierarchyid",
    "sql_variant",
    "blob",
    "bytea",
    "tinyblob",
    "mediumblob",
    "longblob",
];

/// Verdict for one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Searchable,
    Skip(SkipReason),
}

impl Classification {
    pub fn is_searchable(&self) -> bool {
        matches!(self, Classification::Searchable)
    }
}

/// Case-insensitive set of declared type names to skip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsearchableTypes {
    types: Vec<String>,
}

impl Default for UnsearchableTypes {
    fn default() -> Self {
        Self {
            types: DEFAULT_UNSEARCHABLE_TYPES
                .iter()
                .map(|t| (*t).to_string())
                .collect(),
        }
    }
}

impl UnsearchableTypes {
    /// An empty list: every column is searchable.
    pub fn none() -> Self {
        Self { types: Vec::new() }
    }

    /// Default list adjusted for the backend.
    ///
    /// `timestamp` is SQL Server's row version; everywhere else it is a
    /// date-time type and can be searched as text.
    pub fn for_database(database_type: DatabaseType) -> Self {
        let mut types = Self::default();
        if database_type != DatabaseType::SqlServer {
            types.types.retain(|t| t != "timestamp");
        }
        types
    }

    /// Adds extra type names, such as the values of `--skip-types`.
    pub fn with_additional<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in extra {
            let normalized = normalize_type(name.as_ref());
            if !normalized.is_empty() && !self.types.contains(&normalized) {
                self.types.push(normalized);
            }
        }
        self
    }

    /// Returns true when `data_type` is on the list.
    pub fn contains(&self, data_type: &str) -> bool {
        let normalized = normalize_type(data_type);
        self.types.iter().any(|t| *t == normalized)
    }

    /// Classifies a declared type. Unknown tags are searchable.
    pub fn classify(&self, data_type: &str) -> Classification {
        if self.contains(data_type) {
            Classification::Skip(SkipReason::UnsearchableType)
        } else {
            Classification::Searchable
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.types.iter().map(String::as_str)
    }
}

/// Lower-cases a type tag and strips any parameter list, e.g.
/// `VARBINARY(MAX)` becomes `varbinary`.
fn normalize_type(data_type: &str) -> String {
    let base = data_type.split('(').next().unwrap_or(data_type);
    base.trim().to_lowercase()
}
