//! Configuration types for connections and search runs.
//!
//! - `ConnectionConfig`: database connection settings passed to adapters
//! - `SearchConfig`: the parameters of a single search run
//!
//! # Security
//! These configuration structs intentionally do NOT store passwords or credentials.

mod connection;
mod search;

pub use connection::{ConnectionConfig, DEFAULT_MSSQL_PORT, MAX_POOL_SIZE};
pub use search::{MAX_SAMPLE_LIMIT, SearchConfig, WildcardMode, parse_skip_list};
pub(crate) use search::normalize_names;
