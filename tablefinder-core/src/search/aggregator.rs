//! Accumulation of per-column outcomes into a [`ScanResult`].

use crate::models::{
    ColumnMatch, ColumnRef, ScanResult, ScanTermination, SkipReason, SkippedColumn, SkippedTable,
    TableRef,
};
use std::time::Instant;

/// Collects matches, skips and counters in arrival order.
///
/// The aggregator is consumed by [`ResultAggregator::finish`], so a finished
/// result cannot be modified further.
#[derive(Debug)]
pub struct ResultAggregator {
    matches: Vec<ColumnMatch>,
    skipped_columns: Vec<SkippedColumn>,
    skipped_tables: Vec<SkippedTable>,
    tables_scanned: usize,
    columns_scanned: usize,
    columns_considered: usize,
    warnings: Vec<String>,
    started: Instant,
}

impl Default for ResultAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self {
            matches: Vec::new(),
            skipped_columns: Vec::new(),
            skipped_tables: Vec::new(),
            tables_scanned: 0,
            columns_scanned: 0,
            columns_considered: 0,
            warnings: Vec::new(),
            started: Instant::now(),
        }
    }

    pub fn record_match(&mut self, column_match: ColumnMatch) {
        self.matches.push(column_match);
    }

    pub fn record_skipped_column(&mut self, column: ColumnRef, reason: SkipReason) {
        self.skipped_columns.push(SkippedColumn { column, reason });
    }

    pub fn record_skipped_table(&mut self, table: TableRef, message: impl Into<String>) {
        self.skipped_tables.push(SkippedTable {
            table,
            message: message.into(),
        });
    }

    /// Adds the columns seen in one table and the count queries issued for them.
    pub fn add_column_counts(&mut self, considered: usize, queried: usize) {
        self.columns_considered = self.columns_considered.saturating_add(considered);
        self.columns_scanned = self.columns_scanned.saturating_add(queried);
    }

    pub fn table_finished(&mut self) {
        self.tables_scanned = self.tables_scanned.saturating_add(1);
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    pub fn match_count(&self) -> usize {
        self.matches.len()
    }

    /// Seals the result.
    pub fn finish(self, termination: ScanTermination) -> ScanResult {
        let elapsed_ms = u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX);
        ScanResult {
            matches: self.matches,
            skipped_columns: self.skipped_columns,
            skipped_tables: self.skipped_tables,
            tables_scanned: self.tables_scanned,
            columns_scanned: self.columns_scanned,
            columns_considered: self.columns_considered,
            termination,
            elapsed_ms,
            warnings: self.warnings,
        }
    }
}
