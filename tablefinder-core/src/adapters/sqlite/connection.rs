//! SQLite connection handling.
//!
//! # Connection Modes
//! - File-based: `sqlite:///path/to/database.db` or a bare path ending in
//!   `.db`, `.sqlite` or `.sqlite3`
//! - In-memory: `sqlite::memory:` or `:memory:`
//!
//! # Security Features
//! - Opens databases in read-only mode by default
//! - No network access required

use super::SqliteAdapter;
use crate::Result;
use crate::config::ConnectionConfig;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;

impl SqliteAdapter {
    /// Opens the database named by `connection_string`.
    ///
    /// # Errors
    /// Returns error if:
    /// - Connection string format is invalid
    /// - Database file does not exist
    /// - Database cannot be opened
    pub async fn connect(connection_string: &str, config: ConnectionConfig) -> Result<Self> {
        validate_sqlite_connection_string(connection_string)?;
        let config = ConnectionConfig {
            database: Some(extract_database_name(connection_string)),
            ..config
        };
        let pool = create_sqlite_connection(connection_string, &config).await?;

        Ok(Self {
            pool,
            config,
            in_memory: is_in_memory(connection_string),
        })
    }

    /// Wraps an existing pool. The caller keeps ownership of its lifetime.
    pub fn from_pool(pool: SqlitePool, config: ConnectionConfig) -> Self {
        Self {
            pool,
            config,
            in_memory: false,
        }
    }

    /// Checks if the connection is to an in-memory database.
    pub fn is_in_memory(&self) -> bool {
        self.in_memory
    }

    /// Closes the connection gracefully.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Validates SQLite connection string format.
///
/// # Errors
/// Returns error if connection string is invalid
pub fn validate_sqlite_connection_string(connection_string: &str) -> Result<()> {
    // Same rules as backend detection, so anything routed here is accepted
    let lowered = connection_string.trim().to_lowercase();
    if lowered == ":memory:"
        || lowered.starts_with("sqlite:")
        || lowered.ends_with(".db")
        || lowered.ends_with(".sqlite")
        || lowered.ends_with(".sqlite3")
    {
        return Ok(());
    }

    Err(crate::error::TableFinderError::configuration(
        "Invalid SQLite connection string format: expected sqlite:// URL, file path, or :memory:",
    ))
}

fn is_in_memory(connection_string: &str) -> bool {
    connection_string.contains(":memory:") || connection_string.contains("mode=memory")
}

/// Extracts database name from connection string.
fn extract_database_name(connection_string: &str) -> String {
    if is_in_memory(connection_string) {
        return ":memory:".to_string();
    }

    let path = connection_string
        .strip_prefix("sqlite://")
        .or_else(|| connection_string.strip_prefix("sqlite:"))
        .unwrap_or(connection_string);
    let path = path.split('?').next().unwrap_or(path);

    match path.rsplit('/').next() {
        Some(filename) if !filename.is_empty() => filename.to_string(),
        _ => "main".to_string(),
    }
}

/// Normalizes connection string to SQLite URL format.
fn normalize_connection_string(connection_string: &str) -> String {
    if connection_string == ":memory:" {
        return "sqlite::memory:".to_string();
    }

    if connection_string.starts_with("sqlite:") {
        return connection_string.to_string();
    }

    format!("sqlite://{}", connection_string)
}

/// Creates a single-connection pool with the configured options.
async fn create_sqlite_connection(
    connection_string: &str,
    config: &ConnectionConfig,
) -> Result<SqlitePool> {
    let normalized = normalize_connection_string(connection_string);

    let mut options = SqliteConnectOptions::from_str(&normalized).map_err(|e| {
        crate::error::TableFinderError::configuration(format!(
            "Invalid SQLite connection string: {}",
            e
        ))
    })?;

    // In-memory databases cannot be opened read-only
    if config.read_only && !is_in_memory(connection_string) {
        options = options.read_only(true);
    }

    SqlitePoolOptions::new()
        .max_connections(1)
        .acquire_timeout(config.connect_timeout)
        .connect_with(options)
        .await
        .map_err(crate::error::TableFinderError::connection_failed)
}
