//! PostgreSQL connection pool management and validation.
//!
//! # Security Features
//! - Validates connection string format and parameters
//! - Enforces connection limits to prevent resource exhaustion
//! - Sets statement and lock timeouts on every pooled connection
//! - Forces read-only transactions when requested

use super::{ConnectionConfig, PostgresAdapter};
use crate::Result;
use sqlx::PgPool;
use std::time::Duration;
use url::Url;

/// PostgreSQL default port.
pub const DEFAULT_POSTGRES_PORT: u16 = 5432;

impl PostgresAdapter {
    /// Creates a PostgreSQL adapter with a lazily connected pool.
    ///
    /// Connection parameters found in the URL (host, port, database, user
    /// and the `connect_timeout`, `statement_timeout` and `pool_max_conns`
    /// query parameters) override the values in `config`.
    ///
    /// # Errors
    /// Returns error if:
    /// - Connection string format is invalid
    /// - The resulting configuration is invalid
    /// - Pool configuration is rejected by the driver
    pub async fn connect(connection_string: &str, config: ConnectionConfig) -> Result<Self> {
        let config = Self::parse_connection_config(connection_string, config)?;
        let pool = Self::create_connection_pool(connection_string, &config)?;

        Ok(Self { pool, config })
    }

    /// Closes the connection pool gracefully
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Merges URL parameters into `base`.
    ///
    /// # Errors
    /// Returns error if the connection string is malformed or the merged
    /// configuration fails validation
    pub fn parse_connection_config(
        connection_string: &str,
        base: ConnectionConfig,
    ) -> Result<ConnectionConfig> {
        let url = Self::validate_connection_string(connection_string)?;

        let mut config = base.apply_url(&url);
        if config.port.is_none() {
            config = config.with_port(DEFAULT_POSTGRES_PORT);
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
                "statement_timeout" => {
                    if let Ok(timeout_ms) = value.parse::<u64>()
                        && timeout_ms > 0
                        && timeout_ms <= 300_000
                    {
                        config.query_timeout = Duration::from_millis(timeout_ms);
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

    /// Creates a connection pool with session settings applied to every
    /// new connection.
    ///
    /// # Session Settings
    /// - `statement_timeout` from the configured query timeout
    /// - `lock_timeout` so scans never wait on writers
    /// - `default_transaction_read_only` when read-only mode is set
    /// - `application_name` for connection tracking
    pub(crate) fn create_connection_pool(
        connection_string: &str,
        config: &ConnectionConfig,
    ) -> Result<PgPool> {
        use sqlx::Executor;

        let query_timeout_ms = config.query_timeout.as_millis();
        let read_only = config.read_only;

        sqlx::postgres::PgPoolOptions::new()
            .max_connections(config.max_connections.min(100))
            .acquire_timeout(config.connect_timeout)
            .test_before_acquire(true)
            .after_connect(move |conn, _meta| {
                Box::pin(async move {
                    conn.execute(
                        format!("SET statement_timeout = '{}ms'", query_timeout_ms).as_str(),
                    )
                    .await?;

                    conn.execute("SET lock_timeout = '30s'").await?;

                    let app_name = format!("tablefinder-{}", env!("CARGO_PKG_VERSION"));
                    conn.execute(format!("SET application_name = '{}'", app_name).as_str())
                        .await?;

                    if read_only {
                        conn.execute("SET default_transaction_read_only = on")
                            .await?;
                    }

                    Ok(())
                })
            })
            .connect_lazy(connection_string)
            .map_err(|e| {
                tracing::error!(
                    "Failed to create PostgreSQL connection pool to {}",
                    crate::error::redact_database_url(connection_string)
                );
                crate::error::TableFinderError::connection_failed(e)
            })
    }

    /// Validates connection string format and returns the parsed URL.
    ///
    /// # Errors
    /// Returns error if the scheme or host is missing or wrong, or if
    /// `statement_timeout` exceeds five minutes
    pub fn validate_connection_string(connection_string: &str) -> Result<Url> {
        let url = Url::parse(connection_string).map_err(|e| {
            crate::error::TableFinderError::configuration(format!(
                "Invalid PostgreSQL connection string format: {}",
                e
            ))
        })?;

        if !matches!(url.scheme(), "postgres" | "postgresql") {
            return Err(crate::error::TableFinderError::configuration(
                "Connection string must use postgres:// or postgresql:// scheme",
            ));
        }

        if url.host_str().is_none_or(str::is_empty) {
            return Err(crate::error::TableFinderError::configuration(
                "Connection string must specify a host",
            ));
        }

        for (key, value) in url.query_pairs() {
            if key == "statement_timeout"
                && let Ok(timeout_ms) = value.parse::<u64>()
                && timeout_ms > 300_000
            {
                return Err(crate::error::TableFinderError::configuration(
                    "statement_timeout should not exceed 300 seconds",
                ));
            }
        }

        Ok(url)
    }
}
