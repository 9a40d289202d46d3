//! Console rendering of search settings and results.
//!
//! Everything here returns a `String` so the layout can be tested; `main.rs`
//! decides where it is printed.

use std::fmt::Write;
use tablefinder_core::config::SearchConfig;
use tablefinder_core::models::{ColumnMatch, ScanResult, SkipReason};
use tablefinder_core::search::SelectionStats;

/// Sample values longer than this are cut and suffixed with `...`.
pub const MAX_SAMPLE_DISPLAY_CHARS: usize = 100;

fn rule() -> String {
    "=".repeat(80)
}

/// Banner shown before connecting.
pub fn format_header(config: &SearchConfig) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n{}", rule());
    let _ = writeln!(out, "Database Table Value Finder");
    let _ = writeln!(out, "{}", rule());
    let _ = writeln!(out, "Search value: '{}'", config.search_value);
    let _ = writeln!(out, "Exact match: {}", config.exact);
    let _ = writeln!(out, "Case sensitive: {}", config.case_sensitive);
    if let Some(pattern) = &config.table_pattern {
        let _ = writeln!(out, "Table pattern: {}", pattern);
    }
    if let Some(start) = &config.start_from {
        let _ = writeln!(out, "Starting from table: {}", start);
    }
    if !config.skip_tables.is_empty() {
        let _ = writeln!(out, "Skipping tables: {}", config.skip_tables.join(","));
    }
    if config.stop_on_first {
        let _ = writeln!(out, "Stop on first match: Yes");
    }
    let _ = writeln!(out, "{}", rule());
    out
}

/// What the selector did to the catalog list.
pub fn format_selection(stats: &SelectionStats) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Found {} tables", stats.original_count);
    if stats.filtered_by_pattern > 0 {
        let _ = writeln!(
            out,
            "{} table(s) did not match the table pattern",
            stats.filtered_by_pattern
        );
    }
    if let Some(start) = &stats.started_from {
        let _ = writeln!(
            out,
            "Starting with table '{}', then continuing through all others",
            start
        );
    }
    if stats.skipped_count > 0 {
        let _ = writeln!(out, "Skipping {} table(s)", stats.skipped_count);
    }
    let _ = writeln!(out, "Searched {} tables", stats.final_count);
    out
}

/// Cuts `value` to [`MAX_SAMPLE_DISPLAY_CHARS`] characters.
pub fn truncate_sample(value: &str) -> String {
    if value.chars().count() > MAX_SAMPLE_DISPLAY_CHARS {
        let cut: String = value.chars().take(MAX_SAMPLE_DISPLAY_CHARS).collect();
        format!("{}...", cut)
    } else {
        value.to_string()
    }
}

fn format_match(out: &mut String, index: usize, m: &ColumnMatch) {
    let _ = writeln!(out, "{}. {}.{}", index, m.column.table, m.column.name);
    let _ = writeln!(out, "   Data Type: {}", m.column.data_type);
    let _ = writeln!(out, "   Match Count: {}", m.match_count);
    let _ = writeln!(out, "   Sample Values:");
    for sample in &m.samples {
        let _ = writeln!(out, "     - {}", truncate_sample(sample));
    }
    let _ = writeln!(out);
}

/// Numbered matches, or the no-match line.
pub fn format_results(result: &ScanResult, search_value: &str) -> String {
    if result.matches.is_empty() {
        return format!("\nNo matches found for '{}'\n", search_value);
    }

    let mut out = String::new();
    let _ = writeln!(out, "\n{}", rule());
    let _ = writeln!(
        out,
        "Found {} column(s) containing '{}'",
        result.matches.len(),
        search_value
    );
    let _ = writeln!(out, "{}\n", rule());

    for (i, m) in result.matches.iter().enumerate() {
        format_match(&mut out, i.saturating_add(1), m);
    }
    out
}

/// Skip counts by reason, skipped tables and warnings. Empty when there is
/// nothing to report.
pub fn format_footer(result: &ScanResult) -> String {
    let mut out = String::new();

    if result.stopped_early()
        && let Some(first) = result.matches.first()
    {
        let _ = writeln!(
            out,
            "First match found in {}; search stopped.",
            first.column.table
        );
    }

    let unsearchable = result.unsearchable_count();
    let failed = result.failed_count();
    if unsearchable > 0 || failed > 0 {
        let _ = writeln!(
            out,
            "Skipped columns: {} unsearchable type, {} query failed",
            unsearchable, failed
        );
        for skipped in &result.skipped_columns {
            if let SkipReason::QueryFailed { kind, message } = &skipped.reason {
                let _ = writeln!(
                    out,
                    "  - {}.{} ({}): {}",
                    skipped.column.table, skipped.column.name, kind, message
                );
            }
        }
    }

    if !result.skipped_tables.is_empty() {
        let _ = writeln!(out, "Skipped tables: {}", result.skipped_tables.len());
        for table in &result.skipped_tables {
            let _ = writeln!(out, "  - {}: {}", table.table, table.message);
        }
    }

    for warning in &result.warnings {
        let _ = writeln!(out, "Warning: {}", warning);
    }

    out
}
