//! Table ordering and filtering.
//!
//! The selector turns the raw catalog list into the final scan order. It
//! applies, in this order: start-from rotation, the table-name pattern, and
//! the skip list. The result depends only on its inputs.

use crate::config::{SearchConfig, normalize_names};
use crate::models::TableRef;
use crate::search::like::LikeMatcher;
use serde::{Deserialize, Serialize};

/// Counters describing what the selector did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionStats {
    pub original_count: usize,
    /// Tables removed because they did not satisfy the pattern
    pub filtered_by_pattern: usize,
    /// Tables removed by the skip list
    pub skipped_count: usize,
    pub final_count: usize,
    /// Name of the table moved to the front, when one was found
    pub started_from: Option<String>,
    pub warnings: Vec<String>,
}

impl SelectionStats {
    /// Returns true when start-from matched a table.
    pub fn rotated(&self) -> bool {
        self.started_from.is_some()
    }
}

/// Final scan order plus statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub tables: Vec<TableRef>,
    pub stats: SelectionStats,
}

/// Ordering and filtering policy compiled from a [`SearchConfig`].
#[derive(Debug, Clone, Default)]
pub struct TableSelector {
    start_from: Option<String>,
    pattern: Option<LikeMatcher>,
    skip: Vec<String>,
}

impl TableSelector {
    /// Compiles the selector's policy.
    ///
    /// # Errors
    /// Returns a configuration error if the table pattern cannot be compiled.
    pub fn from_config(config: &SearchConfig) -> crate::Result<Self> {
        let pattern = config
            .table_pattern
            .as_deref()
            .map(LikeMatcher::new)
            .transpose()?;

        let start_from = config
            .start_from
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Ok(Self {
            start_from,
            pattern,
            // The field is public, so entries may not have gone through the builder
            skip: normalize_names(&config.skip_tables),
        })
    }

    /// Produces the scan order for `tables`.
    pub fn select(&self, tables: &[TableRef]) -> Selection {
        let mut stats = SelectionStats {
            original_count: tables.len(),
            ..Default::default()
        };

        let mut ordered: Vec<TableRef> = tables.to_vec();

        if let Some(start) = &self.start_from {
            match ordered.iter().position(|t| t.name_eq_ignore_case(start)) {
                Some(index) => {
                    let table = ordered.remove(index);
                    tracing::info!("Starting scan from table {}", table);
                    ordered.insert(0, table);
                    stats.started_from = Some(start.clone());
                }
                None => {
                    let warning = format!(
                        "Start-from table '{}' not found; scanning in catalog order",
                        start
                    );
                    tracing::warn!("{}", warning);
                    stats.warnings.push(warning);
                }
            }
        }

        if let Some(pattern) = &self.pattern {
            let before = ordered.len();
            ordered.retain(|t| pattern.is_match(&t.name));
            stats.filtered_by_pattern = before.saturating_sub(ordered.len());
            tracing::debug!(
                "Table pattern '{}' kept {} of {} tables",
                pattern.pattern(),
                ordered.len(),
                before
            );
        }

        if !self.skip.is_empty() {
            let before = ordered.len();
            ordered.retain(|t| {
                let lowered = t.name.to_lowercase();
                !self.skip.iter().any(|s| *s == lowered)
            });
            stats.skipped_count = before.saturating_sub(ordered.len());
            if stats.skipped_count > 0 {
                tracing::info!("Skipping {} table(s)", stats.skipped_count);
            }
        }

        stats.final_count = ordered.len();

        Selection {
            tables: ordered,
            stats,
        }
    }
}

/// Convenience wrapper compiling the selector and applying it once.
///
/// # Errors
/// Returns a configuration error if the table pattern cannot be compiled.
pub fn select_tables(tables: &[TableRef], config: &SearchConfig) -> crate::Result<Selection> {
    Ok(TableSelector::from_config(config)?.select(tables))
}
