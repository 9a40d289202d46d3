//! Progress reporting for long scans.

use crate::models::TableRef;

/// Receives progress events from the orchestrator.
///
/// Events are fire-and-forget: a sink cannot fail or influence the scan.
pub trait ProgressSink: Send + Sync {
    /// Called after each table with the number of tables finished so far.
    fn report(&self, current: usize, total: usize);

    /// Called before a table's columns are fetched. `index` is 1-based.
    fn table_started(&self, _index: usize, _total: usize, _table: &TableRef) {}
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn report(&self, _current: usize, _total: usize) {}
}

/// Emits events through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn report(&self, current: usize, total: usize) {
        tracing::debug!("Scanned {}/{} tables", current, total);
    }

    fn table_started(&self, index: usize, total: usize, table: &TableRef) {
        tracing::info!("[{}/{}] Searching {}", index, total, table);
    }
}

impl<F> ProgressSink for F
where
    F: Fn(usize, usize) + Send + Sync,
{
    fn report(&self, current: usize, total: usize) {
        self(current, total);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_closure_sink_receives_reports() {
        let seen = Mutex::new(Vec::new());
        let sink = |current: usize, total: usize| {
            seen.lock().unwrap().push((current, total));
        };

        sink.report(1, 3);
        sink.report(2, 3);
        sink.table_started(3, 3, &TableRef::new("dbo", "T3"));

        assert_eq!(*seen.lock().unwrap(), vec![(1, 3), (2, 3)]);
    }

    #[test]
    fn test_noop_and_tracing_sinks_do_not_panic() {
        let table = TableRef::new("dbo", "T1");
        NoopProgress.table_started(1, 1, &table);
        NoopProgress.report(1, 1);
        TracingProgress.table_started(1, 1, &table);
        TracingProgress.report(1, 1);
    }
}
