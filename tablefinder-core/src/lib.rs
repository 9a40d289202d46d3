//! Core search engine and database adapters for TableFinder.
//!
//! TableFinder locates a value in an unfamiliar relational database by
//! walking every table and every searchable column, counting matching rows
//! and collecting a few sample values as evidence.
//!
//! # Security Guarantees
//! - Every generated statement is a SELECT
//! - The search value is always bound as a query parameter
//! - No credentials are stored in configuration structs or written to reports
//! - Connection strings are redacted in all error messages and logs
//!
//! # Architecture
//! - `adapters`: per-backend catalog listing and query execution behind the
//!   [`SchemaCatalog`] and [`QueryExecutor`] traits
//! - `search`: table selection, column classification, query construction
//!   and the orchestrator that drives the scan
//! - `report`: the versioned JSON report, checked by `validation` before it
//!   is written

pub mod adapters;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod report;
pub mod search;
pub mod validation;

// Re-export commonly used types
pub use adapters::{
    AdapterFeature, ColumnProbe, DatabaseAdapter, QueryExecutor, SchemaCatalog, create_adapter,
    detect_database_type,
};
pub use config::{ConnectionConfig, SearchConfig, WildcardMode};
pub use error::{QueryError, QueryErrorKind, Result, TableFinderError};
pub use models::{
    ColumnMatch, ColumnRef, DatabaseType, ScanResult, ScanTermination, SkipReason, SkippedColumn,
    SkippedTable, TableRef,
};
pub use report::SearchReport;
pub use search::{NoopProgress, ProgressSink, SearchRun, search_database};

pub use validation::{
    ValidationError, initialize_schema_validator, validate_and_parse_report,
    validate_report_output,
};
