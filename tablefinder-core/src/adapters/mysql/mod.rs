//! MySQL database adapter with connection pooling.
//!
//! # Module Structure
//! - `connection`: Connection pool management and validation
//! - `catalog`: Table and column listing for the connected database
//!
//! # Security Guarantees
//! - All operations are read-only (SELECT only)
//! - Connection strings are sanitized in error messages
//! - `max_execution_time` bounds every query
//! - Connection pooling with configurable limits

pub mod catalog;
pub mod connection;


use super::helpers::classify_sqlx_error;
use super::{AdapterFeature, ConnectionConfig, DatabaseAdapter, QueryExecutor, SchemaCatalog};
use crate::Result;
use crate::error::QueryError;
use crate::models::{ColumnRef, DatabaseType, TableRef};
use crate::search::query::{Dialect, QuerySpec};
use async_trait::async_trait;
use sqlx::MySqlPool;

pub use connection::{
    DEFAULT_MYSQL_PORT, parse_mysql_connection_config, validate_mysql_connection_string,
};

/// MySQL database adapter with connection pooling
pub struct MySqlAdapter {
    /// Connection pool for database operations
    pub pool: MySqlPool,
    /// Connection configuration (pool settings, timeouts, etc.)
    pub config: ConnectionConfig,
}

impl std::fmt::Debug for MySqlAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlAdapter")
            .field("config", &self.config)
            .field("pool_size", &self.pool.size())
            .field("pool_idle", &self.pool.num_idle())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl SchemaCatalog for MySqlAdapter {
    async fn list_tables(&self) -> Result<Vec<TableRef>> {
        self.fetch_tables().await
    }

    async fn list_columns(&self, table: &TableRef) -> Result<Vec<ColumnRef>> {
        self.fetch_columns(table).await
    }
}

#[async_trait]
impl QueryExecutor for MySqlAdapter {
    fn dialect(&self) -> Dialect {
        Dialect::MySql
    }

    async fn count_matches(&self, spec: &QuerySpec) -> std::result::Result<u64, QueryError> {
        let sql = spec.count_sql(Dialect::MySql);
        tracing::trace!("{}", sql);

        let count: i64 = sqlx::query_scalar(&sql)
            .bind(spec.bound_parameter(Dialect::MySql))
            .fetch_one(&self.pool)
            .await
            .map_err(classify_sqlx_error)?;

        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn fetch_samples(&self, spec: &QuerySpec) -> std::result::Result<Vec<String>, QueryError> {
        let sql = spec.sample_sql(Dialect::MySql);
        tracing::trace!("{}", sql);

        let values: Vec<Option<String>> = sqlx::query_scalar(&sql)
            .bind(spec.bound_parameter(Dialect::MySql))
            .fetch_all(&self.pool)
            .await
            .map_err(classify_sqlx_error)?;

        Ok(values
            .into_iter()
            .map(|v| v.unwrap_or_else(|| "NULL".to_string()))
            .collect())
    }
}

#[async_trait]
impl DatabaseAdapter for MySqlAdapter {
    async fn test_connection(&self) -> Result<()> {
        let connectivity_result: i32 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(crate::error::TableFinderError::connection_failed)?;

        if connectivity_result != 1 {
            return Err(crate::error::TableFinderError::configuration(
                "Basic connectivity test failed: unexpected result",
            ));
        }

        let _: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM INFORMATION_SCHEMA.TABLES WHERE TABLE_SCHEMA = DATABASE()",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            crate::error::TableFinderError::insufficient_privileges(format!(
                "Cannot access INFORMATION_SCHEMA: {}",
                e
            ))
        })?;

        Ok(())
    }

    fn database_type(&self) -> DatabaseType {
        DatabaseType::MySQL
    }

    fn supports_feature(&self, feature: AdapterFeature) -> bool {
        match feature {
            AdapterFeature::ConnectionPooling | AdapterFeature::QueryTimeout => true,
            AdapterFeature::ReadOnlyMode => self.config.read_only,
        }
    }

    fn connection_config(&self) -> ConnectionConfig {
        self.config.clone()
    }
}
