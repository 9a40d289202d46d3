//! Terminal progress bar for table scans.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tablefinder_core::models::TableRef;
use tablefinder_core::search::ProgressSink;

const TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} tables ({eta})\n{msg}";

/// [`ProgressSink`] drawing an indicatif bar on stderr.
///
/// The length is set from the first event, so the bar can be created before
/// the table list is known.
pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    /// Creates a visible bar.
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::default_bar()
            .template(TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-");
        bar.set_style(style);
        Self { bar }
    }

    /// Creates a bar that never draws.
    pub fn hidden() -> Self {
        let bar = ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::hidden());
        Self { bar }
    }

    /// Removes the bar from the terminal.
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }

    /// Current position, for tests.
    pub fn position(&self) -> u64 {
        self.bar.position()
    }
}

impl Default for BarProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for BarProgress {
    fn report(&self, current: usize, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_position(current as u64);
    }

    fn table_started(&self, _index: usize, total: usize, table: &TableRef) {
        self.bar.set_length(total as u64);
        self.bar.set_message(format!("Searching {}", table));
    }
}
