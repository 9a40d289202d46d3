//! Search engine: table selection, column classification, query
//! construction and the orchestrator that ties them together.
//!
//! # Module Structure
//! - `like`: SQL LIKE escaping, GLOB translation and in-process matching
//! - `selector`: start-from rotation, table pattern and skip list
//! - `classifier`: searchable vs. unsearchable column types
//! - `query`: typed per-column query specification and dialect rendering
//! - `orchestrator`: the scan state machine
//! - `aggregator`: accumulation into a `ScanResult`
//! - `progress`: pluggable progress sinks

pub mod aggregator;
pub mod classifier;
pub mod like;
pub mod orchestrator;
pub mod progress;
pub mod query;
pub mod selector;

pub use classifier::{Classification, UnsearchableTypes};
pub use orchestrator::{ColumnOutcome, ScanState, SearchOrchestrator, probe_column};
pub use progress::{NoopProgress, ProgressSink, TracingProgress};
pub use query::{CaseMode, Dialect, Predicate, QuerySpec};
pub use selector::{Selection, SelectionStats, TableSelector, select_tables};

use crate::Result;
use crate::adapters::{AdapterFeature, DatabaseAdapter};
use crate::config::SearchConfig;
use crate::models::ScanResult;

/// Result of [`search_database`]: what was selected and what was found.
#[derive(Debug, Clone)]
pub struct SearchRun {
    pub selection: SelectionStats,
    pub result: ScanResult,
}

/// Lists tables, applies the selection policy and runs the scan.
///
/// Table scans run concurrently only when `config.max_concurrency > 1` and
/// the adapter reports [`AdapterFeature::ConnectionPooling`].
///
/// # Errors
/// Returns error if the configuration is invalid or the table catalog
/// cannot be read. Failures on individual tables or columns are recorded in
/// the result instead.
pub async fn search_database(
    adapter: &dyn DatabaseAdapter,
    config: &SearchConfig,
    progress: &dyn ProgressSink,
) -> Result<SearchRun> {
    config.validate()?;
    let selector = TableSelector::from_config(config)?;

    let tables = adapter.list_tables().await.map_err(|e| {
        tracing::error!("Failed to list tables: {}", e);
        e
    })?;
    tracing::info!("Found {} base table(s)", tables.len());

    let selection = selector.select(&tables);
    let pooled = adapter.supports_feature(AdapterFeature::ConnectionPooling);
    if config.max_concurrency > 1 && !pooled {
        tracing::warn!(
            "{} adapter does not pool connections; scanning tables sequentially",
            adapter.database_type()
        );
    }

    let mut orchestrator = SearchOrchestrator::new(adapter, config, progress)
        .with_parallelism(pooled)
        .with_warnings(selection.stats.warnings.clone());
    let result = orchestrator.run(&selection.tables).await;

    Ok(SearchRun {
        selection: selection.stats,
        result,
    })
}
