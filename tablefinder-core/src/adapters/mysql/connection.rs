//! MySQL connection pool management and validation.
//!
//! # Security Features
//! - Validates connection string format and parameters
//! - Enforces connection limits to prevent resource exhaustion
//! - Sets `max_execution_time` on every pooled connection

use super::{ConnectionConfig, MySqlAdapter};
use crate::Result;
use sqlx::MySqlPool;
use std::time::Duration;
use url::Url;

/// MySQL default port.
pub const DEFAULT_MYSQL_PORT: u16 = 3306;

impl MySqlAdapter {
    /// Creates a MySQL adapter with a lazily connected pool.
    ///
    /// # Errors
    /// Returns error if:
    /// - Connection string format is invalid
    /// - The URL names no database (tables are listed from it)
    /// - Pool configuration is rejected by the driver
    pub async fn connect(connection_string: &str, config: ConnectionConfig) -> Result<Self> {
        let config = parse_mysql_connection_config(connection_string, config)?;
        let pool = create_mysql_connection_pool(connection_string, &config)?;

        Ok(Self { pool, config })
    }

    /// Closes the connection pool gracefully
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Merges MySQL URL parameters into `base`.
///
/// # Errors
/// Returns error if the URL is malformed, names no database, or the merged
/// configuration fails validation
pub fn parse_mysql_connection_config(
    connection_string: &str,
    base: ConnectionConfig,
) -> Result<ConnectionConfig> {
    let url = validate_mysql_connection_string(connection_string)?;

    let mut config = base.apply_url(&url);
    if config.port.is_none() {
        config = config.with_port(DEFAULT_MYSQL_PORT);
    }

    match config.database.as_deref() {
        None | Some("") => {
            return Err(crate::error::TableFinderError::configuration(
                "MySQL connection string must name a database",
            ));
        }
        Some(database) if database.len() > 64 => {
            return Err(crate::error::TableFinderError::configuration(
                "Database name too long: maximum 64 characters",
            ));
        }
        Some(_) => {}
    }

    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "connect_timeout" => {
                if let Ok(timeout_secs) = value.parse::<u64>()
                    && timeout_secs > 0
                    && timeout_secs <= 300
                {
                    config.connect_timeout = Duration::from_secs(timeout_secs);
                }
            }
            "pool_max_conns" => {
                if let Ok(max_conns) = value.parse::<u32>()
                    && max_conns > 0
                    && max_conns <= 100
                {
                    config.max_connections = max_conns;
                }
            }
            _ => {}
        }
    }

    config.validate()?;
    Ok(config)
}

/// Validates MySQL connection string format and returns the parsed URL.
///
/// # Errors
/// Returns error if connection string is invalid
pub fn validate_mysql_connection_string(connection_string: &str) -> Result<Url> {
    let url = Url::parse(connection_string).map_err(|e| {
        crate::error::TableFinderError::configuration(format!(
            "Invalid MySQL connection string format: {}",
            e
        ))
    })?;

    if url.scheme() != "mysql" {
        return Err(crate::error::TableFinderError::configuration(
            "Connection string must use mysql:// scheme",
        ));
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(crate::error::TableFinderError::configuration(
            "Connection string must specify a host",
        ));
    }

    Ok(url)
}

/// Creates a MySQL connection pool with per-connection session settings.
fn create_mysql_connection_pool(
    connection_string: &str,
    config: &ConnectionConfig,
) -> Result<MySqlPool> {
    use sqlx::Executor;

    let query_timeout_ms = config.query_timeout.as_millis();
    let read_only = config.read_only;

    sqlx::mysql::MySqlPoolOptions::new()
        .max_connections(config.max_connections.min(100))
        .acquire_timeout(config.connect_timeout)
        .test_before_acquire(true)
        .after_connect(move |conn, _meta| {
            Box::pin(async move {
                conn.execute(format!("SET max_execution_time = {}", query_timeout_ms).as_str())
                    .await?;

                if read_only {
                    conn.execute("SET SESSION TRANSACTION READ ONLY").await?;
                }

                Ok(())
            })
        })
        .connect_lazy(connection_string)
        .map_err(|e| {
            tracing::error!(
                "Failed to create MySQL connection pool to {}",
                crate::error::redact_database_url(connection_string)
            );
            crate::error::TableFinderError::connection_failed(e)
        })
}
