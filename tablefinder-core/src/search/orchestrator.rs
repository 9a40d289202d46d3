//! Search orchestration.
//!
//! The orchestrator walks the selected tables and their searchable columns,
//! runs one count query per column, fetches samples for matching columns and
//! keeps going past individual failures. A failed column listing skips the
//! table; a failed column query skips the column.
//!
//! # State machine
//! ```text
//! Idle -> Scanning { table_index, column_index } -> Done
//!                                  \-> Stopped   (stop-on-first)
//! ```

use crate::adapters::{QueryExecutor, SchemaCatalog};
use crate::config::SearchConfig;
use crate::models::{
    ColumnMatch, ColumnRef, ScanResult, ScanTermination, SkipReason, SkippedColumn, TableRef,
};
use crate::search::aggregator::ResultAggregator;
use crate::search::progress::ProgressSink;
use crate::search::query::QuerySpec;
use futures::stream::{self, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

/// Orchestrator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    /// `column_index` counts the columns visited in the current table
    Scanning {
        table_index: usize,
        column_index: usize,
    },
    Done,
    Stopped,
}

/// Successful outcome of probing one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnOutcome {
    Matched(ColumnMatch),
    Empty,
}

/// Classifies and queries a single column.
///
/// Unsearchable columns are rejected before any query is issued.
pub async fn probe_column<E>(
    executor: &E,
    config: &SearchConfig,
    column: &ColumnRef,
) -> Result<ColumnOutcome, SkipReason>
where
    E: QueryExecutor + ?Sized,
{
    if let crate::search::classifier::Classification::Skip(reason) =
        config.unsearchable_types.classify(&column.data_type)
    {
        return Err(reason);
    }

    let spec = QuerySpec::build(column, config);
    let probe = executor
        .execute(&spec)
        .await
        .map_err(|e| SkipReason::QueryFailed {
            kind: e.kind,
            message: e.message,
        })?;

    if probe.match_count == 0 {
        Ok(ColumnOutcome::Empty)
    } else {
        Ok(ColumnOutcome::Matched(ColumnMatch {
            column: column.clone(),
            match_count: probe.match_count,
            samples: probe.samples,
        }))
    }
}

/// Everything learned from one table.
#[derive(Debug, Default)]
struct TableScan {
    matches: Vec<ColumnMatch>,
    skipped: Vec<SkippedColumn>,
    /// Column listing failure
    failure: Option<String>,
    considered: usize,
    queried: usize,
}

/// Drives a scan over a fixed table sequence.
pub struct SearchOrchestrator<'a, C: ?Sized> {
    source: &'a C,
    config: &'a SearchConfig,
    progress: &'a dyn ProgressSink,
    allow_parallel: bool,
    warnings: Vec<String>,
    state: ScanState,
}

impl<'a, C> SearchOrchestrator<'a, C>
where
    C: SchemaCatalog + QueryExecutor + ?Sized,
{
    /// Creates an idle orchestrator.
    ///
    /// `source` is borrowed: the caller owns the connection and closes it.
    pub fn new(source: &'a C, config: &'a SearchConfig, progress: &'a dyn ProgressSink) -> Self {
        Self {
            source,
            config,
            progress,
            allow_parallel: false,
            warnings: Vec::new(),
            state: ScanState::Idle,
        }
    }

    /// Permits scanning several tables at once when `max_concurrency > 1`.
    ///
    /// Only enable this when the source hands out independent pooled
    /// connections.
    pub fn with_parallelism(mut self, allowed: bool) -> Self {
        self.allow_parallel = allowed;
        self
    }

    /// Warnings raised before the scan, carried into the result.
    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }

    /// Current state.
    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Scans `tables` in order and returns the sealed result.
    pub async fn run(&mut self, tables: &[TableRef]) -> ScanResult {
        let mut aggregator = ResultAggregator::new();
        for warning in std::mem::take(&mut self.warnings) {
            aggregator.add_warning(warning);
        }

        let stop = AtomicBool::new(false);
        let concurrency = self.config.max_concurrency;

        info!(
            "Searching {} table(s) for '{}' ({}, {})",
            tables.len(),
            self.config.search_value,
            if self.config.exact { "exact" } else { "partial" },
            if self.config.case_sensitive {
                "case-sensitive"
            } else {
                "case-insensitive"
            }
        );

        if self.allow_parallel && concurrency > 1 && tables.len() > 1 {
            debug!("Scanning tables with concurrency {}", concurrency);
            self.run_parallel(tables, &stop, &mut aggregator).await;
        } else {
            self.run_sequential(tables, &stop, &mut aggregator).await;
        }

        let termination = if stop.load(Ordering::SeqCst) {
            self.transition(ScanState::Stopped);
            ScanTermination::Stopped
        } else {
            self.transition(ScanState::Done);
            ScanTermination::Completed
        };

        let result = aggregator.finish(termination);
        info!(
            "Search finished: {} match(es), {} column(s) queried, {} skipped, {} table(s) skipped in {}ms",
            result.matches.len(),
            result.columns_scanned,
            result.skipped_columns.len(),
            result.skipped_tables.len(),
            result.elapsed_ms
        );
        result
    }

    async fn run_sequential(
        &mut self,
        tables: &[TableRef],
        stop: &AtomicBool,
        aggregator: &mut ResultAggregator,
    ) {
        let total = tables.len();
        for (index, table) in tables.iter().enumerate() {
            self.transition(ScanState::Scanning {
                table_index: index,
                column_index: 0,
            });
            self.progress
                .table_started(index.saturating_add(1), total, table);

            let scan = scan_table(self.source, self.config, table, stop).await;
            self.state = ScanState::Scanning {
                table_index: index,
                column_index: scan.considered,
            };
            merge(aggregator, table, scan);
            self.progress.report(index.saturating_add(1), total);

            if stop.load(Ordering::SeqCst) {
                break;
            }
        }
    }

    async fn run_parallel(
        &mut self,
        tables: &[TableRef],
        stop: &AtomicBool,
        aggregator: &mut ResultAggregator,
    ) {
        let total = tables.len();
        let source = self.source;
        let config = self.config;
        let progress = self.progress;

        let scans = tables.iter().enumerate().map(|(index, table)| async move {
            progress.table_started(index.saturating_add(1), total, table);
            let scan = scan_table(source, config, table, stop).await;
            (index, table, scan)
        });

        let mut stream = stream::iter(scans).buffer_unordered(config.max_concurrency);
        let mut finished = 0usize;

        while let Some((index, table, scan)) = stream.next().await {
            finished = finished.saturating_add(1);
            self.state = ScanState::Scanning {
                table_index: index,
                column_index: scan.considered,
            };
            merge(aggregator, table, scan);
            progress.report(finished, total);

            if stop.load(Ordering::SeqCst) {
                // Dropping the stream cancels tables still in flight
                break;
            }
        }
    }

    fn transition(&mut self, next: ScanState) {
        tracing::trace!("Scan state {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}

/// Lists and probes every column of one table.
///
/// With stop-on-first, the first match claims `stop`; a match found by a
/// concurrent table after the claim is discarded so exactly one survives.
async fn scan_table<C>(
    source: &C,
    config: &SearchConfig,
    table: &TableRef,
    stop: &AtomicBool,
) -> TableScan
where
    C: SchemaCatalog + QueryExecutor + ?Sized,
{
    let mut scan = TableScan::default();

    let columns = match source.list_columns(table).await {
        Ok(columns) => columns,
        Err(e) => {
            warn!("Skipping table {}: {}", table, e);
            scan.failure = Some(e.to_string());
            return scan;
        }
    };
    debug!("{}: {} column(s)", table, columns.len());

    for column in columns {
        if stop.load(Ordering::SeqCst) {
            break;
        }
        scan.considered = scan.considered.saturating_add(1);

        match probe_column(source, config, &column).await {
            Ok(ColumnOutcome::Matched(found)) => {
                scan.queried = scan.queried.saturating_add(1);
                if config.stop_on_first {
                    let claimed = stop
                        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                        .is_ok();
                    if claimed {
                        info!("Found {} match(es) in {}", found.match_count, found.column);
                        scan.matches.push(found);
                    }
                    break;
                }
                info!("Found {} match(es) in {}", found.match_count, found.column);
                scan.matches.push(found);
            }
            Ok(ColumnOutcome::Empty) => {
                scan.queried = scan.queried.saturating_add(1);
            }
            Err(SkipReason::UnsearchableType) => {
                debug!(
                    "Skipping {} ({}): unsearchable type",
                    column, column.data_type
                );
                scan.skipped.push(SkippedColumn {
                    column,
                    reason: SkipReason::UnsearchableType,
                });
            }
            Err(reason) => {
                scan.queried = scan.queried.saturating_add(1);
                warn!("Query failed for {}: {}", column, reason);
                scan.skipped.push(SkippedColumn { column, reason });
            }
        }
    }

    scan
}

fn merge(aggregator: &mut ResultAggregator, table: &TableRef, scan: TableScan) {
    if let Some(message) = scan.failure {
        aggregator.record_skipped_table(table.clone(), message);
        return;
    }

    aggregator.add_column_counts(scan.considered, scan.queried);
    for found in scan.matches {
        aggregator.record_match(found);
    }
    for skipped in scan.skipped {
        aggregator.record_skipped_column(skipped.column, skipped.reason);
    }
    aggregator.table_finished();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ColumnProbe;
    use crate::error::{QueryError, QueryErrorKind};
    use crate::search::progress::NoopProgress;
    use crate::search::query::Dialect;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory catalog where each column holds a list of text values.
    #[derive(Default)]
    struct FakeSource {
        tables: Vec<TableRef>,
        columns: HashMap<String, Vec<(String, String, Vec<String>)>>,
        failing_tables: Vec<String>,
        failing_columns: HashMap<String, QueryErrorKind>,
        queries: Mutex<Vec<String>>,
    }

    impl FakeSource {
        fn column(mut self, table: &str, name: &str, data_type: &str, values: &[&str]) -> Self {
            if !self.tables.iter().any(|t| t.name == table) {
                self.tables.push(TableRef::new("dbo", table));
            }
            self.columns.entry(table.to_string()).or_default().push((
                name.to_string(),
                data_type.to_string(),
                values.iter().map(|v| (*v).to_string()).collect(),
            ));
            self
        }

        fn values(&self, spec: &QuerySpec) -> Vec<String> {
            self.columns
                .get(&spec.column.table.name)
                .and_then(|cols| cols.iter().find(|(c, _, _)| *c == spec.column.name))
                .map(|(_, _, v)| v.clone())
                .unwrap_or_default()
        }

        fn is_match(spec: &QuerySpec, value: &str) -> bool {
            let needle = spec.parameter.trim_matches('%');
            match spec.predicate {
                crate::search::query::Predicate::Equals { .. } => value == spec.parameter,
                crate::search::query::Predicate::Like { .. } => {
                    value.to_lowercase().contains(&needle.to_lowercase())
                }
            }
        }
    }

    #[async_trait]
    impl SchemaCatalog for FakeSource {
        async fn list_tables(&self) -> crate::Result<Vec<TableRef>> {
            Ok(self.tables.clone())
        }

        async fn list_columns(&self, table: &TableRef) -> crate::Result<Vec<ColumnRef>> {
            if self.failing_tables.contains(&table.name) {
                return Err(crate::error::TableFinderError::insufficient_privileges(
                    "VIEW DEFINITION",
                ));
            }
            Ok(self
                .columns
                .get(&table.name)
                .map(|cols| {
                    cols.iter()
                        .enumerate()
                        .map(|(i, (c, t, _))| {
                            ColumnRef::new(table.clone(), c, t, u32::try_from(i).unwrap() + 1)
                        })
                        .collect()
                })
                .unwrap_or_default())
        }
    }

    #[async_trait]
    impl QueryExecutor for FakeSource {
        fn dialect(&self) -> Dialect {
            Dialect::SqlServer
        }

        async fn count_matches(&self, spec: &QuerySpec) -> Result<u64, QueryError> {
            self.queries.lock().unwrap().push(spec.column.to_string());
            if let Some(kind) = self.failing_columns.get(&spec.column.name) {
                return Err(QueryError::new(*kind, "injected failure"));
            }
            let count = self
                .values(spec)
                .iter()
                .filter(|v| Self::is_match(spec, v))
                .count();
            Ok(u64::try_from(count).unwrap())
        }

        async fn fetch_samples(&self, spec: &QuerySpec) -> Result<Vec<String>, QueryError> {
            Ok(self
                .values(spec)
                .into_iter()
                .filter(|v| Self::is_match(spec, v))
                .take(spec.sample_limit)
                .collect())
        }
    }

    async fn run(source: &FakeSource, config: &SearchConfig) -> ScanResult {
        let tables = source.list_tables().await.unwrap();
        SearchOrchestrator::new(source, config, &NoopProgress)
            .run(&tables)
            .await
    }

    #[tokio::test]
    async fn test_partial_match_with_unsearchable_column() {
        let source = FakeSource::default()
            .column("T1", "colA", "varchar", &["Foobar", "baz"])
            .column("T2", "colB", "image", &["foo"]);

        let result = run(&source, &SearchConfig::new("foo")).await;

        assert_eq!(result.matches.len(), 1);
        assert_eq!(result.matches[0].column.to_string(), "dbo.T1.colA");
        assert_eq!(result.matches[0].match_count, 1);
        assert_eq!(result.matches[0].samples, vec!["Foobar"]);
        assert_eq!(result.skipped_columns.len(), 1);
        assert_eq!(result.skipped_columns[0].reason, SkipReason::UnsearchableType);
        assert_eq!(result.columns_scanned, 1);
        assert_eq!(result.columns_considered, 2);
        assert_eq!(result.termination, ScanTermination::Completed);
        // The image column never reached the executor
        assert_eq!(*source.queries.lock().unwrap(), vec!["dbo.T1.colA"]);
    }

    #[tokio::test]
    async fn test_stop_on_first_keeps_single_match() {
        let source = FakeSource::default()
            .column("T1", "a", "varchar", &["x"])
            .column("T1", "b", "varchar", &["needle"])
            .column("T2", "c", "varchar", &["needle"]);
        let config = SearchConfig::new("needle").with_stop_on_first(true);

        let tables = source.list_tables().await.unwrap();
        let mut orchestrator = SearchOrchestrator::new(&source, &config, &NoopProgress);
        let result = orchestrator.run(&tables).await;

        assert_eq!(orchestrator.state(), ScanState::Stopped);
        assert_eq!(result.termination, ScanTermination::Stopped);
        assert_eq!(result.matches.len(), 1);
        assert_eq!(result.matches[0].column.to_string(), "dbo.T1.b");
        assert_eq!(result.tables_scanned, 1);
        assert_eq!(source.queries.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_column_failure_does_not_stop_scan() {
        let mut source = FakeSource::default()
            .column("T1", "secret", "varchar", &["foo"])
            .column("T1", "name", "varchar", &["foo"])
            .column("T2", "other", "varchar", &["foo"]);
        source
            .failing_columns
            .insert("secret".to_string(), QueryErrorKind::AccessDenied);

        let result = run(&source, &SearchConfig::new("foo")).await;

        assert_eq!(result.matches.len(), 2);
        assert_eq!(result.failed_count(), 1);
        assert!(matches!(
            result.skipped_columns[0].reason,
            SkipReason::QueryFailed {
                kind: QueryErrorKind::AccessDenied,
                ..
            }
        ));
        assert_eq!(result.columns_scanned, 3);
    }

    #[tokio::test]
    async fn test_table_listing_failure_skips_table() {
        let mut source = FakeSource::default()
            .column("T1", "a", "varchar", &["foo"])
            .column("T2", "b", "varchar", &["foo"]);
        source.failing_tables.push("T1".to_string());

        let result = run(&source, &SearchConfig::new("foo")).await;

        assert_eq!(result.skipped_tables.len(), 1);
        assert_eq!(result.skipped_tables[0].table.name, "T1");
        assert_eq!(result.matches.len(), 1);
        assert_eq!(result.tables_scanned, 1);
    }

    #[tokio::test]
    async fn test_exact_case_sensitive() {
        let source = FakeSource::default().column(
            "People",
            "first_name",
            "nvarchar",
            &["John", "john", "Johnny"],
        );
        let config = SearchConfig::new("John")
            .with_exact(true)
            .with_case_sensitive(true);

        let result = run(&source, &config).await;

        assert_eq!(result.matches.len(), 1);
        assert_eq!(result.matches[0].match_count, 1);
        assert_eq!(result.matches[0].samples, vec!["John"]);
    }

    #[tokio::test]
    async fn test_samples_capped_by_limit() {
        let source = FakeSource::default().column(
            "T1",
            "c",
            "varchar",
            &["a1", "a2", "a3", "a4", "a5", "a6", "a7"],
        );
        let config = SearchConfig::new("a").with_sample_limit(3);

        let result = run(&source, &config).await;

        assert_eq!(result.matches[0].match_count, 7);
        assert_eq!(result.matches[0].samples, vec!["a1", "a2", "a3"]);
    }

    #[tokio::test]
    async fn test_progress_events() {
        let source = FakeSource::default()
            .column("T1", "a", "varchar", &["x"])
            .column("T2", "b", "varchar", &["x"]);
        let config = SearchConfig::new("zzz");
        let reports = Mutex::new(Vec::new());
        let sink = |current: usize, total: usize| reports.lock().unwrap().push((current, total));

        let tables = source.list_tables().await.unwrap();
        SearchOrchestrator::new(&source, &config, &sink)
            .run(&tables)
            .await;

        assert_eq!(*reports.lock().unwrap(), vec![(1, 2), (2, 2)]);
    }

    #[tokio::test]
    async fn test_parallel_scan_finds_all_matches() {
        let mut source = FakeSource::default();
        for i in 0..6 {
            source = source.column(&format!("T{i}"), "c", "varchar", &["hit", "miss"]);
        }
        let config = SearchConfig::new("hit").with_max_concurrency(3);

        let tables = source.list_tables().await.unwrap();
        let mut orchestrator =
            SearchOrchestrator::new(&source, &config, &NoopProgress).with_parallelism(true);
        let result = orchestrator.run(&tables).await;

        assert_eq!(orchestrator.state(), ScanState::Done);
        assert_eq!(result.matches.len(), 6);
        assert_eq!(result.tables_scanned, 6);
    }

    #[tokio::test]
    async fn test_parallel_stop_on_first_keeps_exactly_one() {
        let mut source = FakeSource::default();
        for i in 0..8 {
            source = source.column(&format!("T{i}"), "c", "varchar", &["hit"]);
        }
        let config = SearchConfig::new("hit")
            .with_max_concurrency(4)
            .with_stop_on_first(true);

        let tables = source.list_tables().await.unwrap();
        let result = SearchOrchestrator::new(&source, &config, &NoopProgress)
            .with_parallelism(true)
            .run(&tables)
            .await;

        assert_eq!(result.termination, ScanTermination::Stopped);
        assert_eq!(result.matches.len(), 1);
    }

    #[tokio::test]
    async fn test_warnings_carried_into_result() {
        let source = FakeSource::default();
        let config = SearchConfig::new("x");
        let result = SearchOrchestrator::new(&source, &config, &NoopProgress)
            .with_warnings(vec!["start-from table 'X' not found".to_string()])
            .run(&[])
            .await;

        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.termination, ScanTermination::Completed);
    }

    #[test]
    fn test_column_probe_default_is_empty() {
        assert_eq!(ColumnProbe::default().match_count, 0);
    }
}
