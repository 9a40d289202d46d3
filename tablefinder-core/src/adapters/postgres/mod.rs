//! PostgreSQL database adapter with connection pooling.
//!
//! # Module Structure
//! - `connection`: Connection pool management and validation
//! - `catalog`: Table and column listing via `information_schema`
//!
//! # Security Guarantees
//! - All operations are read-only (SELECT only)
//! - Connection strings are sanitized in error messages
//! - `statement_timeout` bounds every query
//! - Connection pooling with configurable limits

mod catalog;
mod connection;

#[cfg(test)]
mod tests;

use super::helpers::classify_sqlx_error;
use super::{AdapterFeature, ConnectionConfig, DatabaseAdapter, QueryExecutor, SchemaCatalog};
use crate::Result;
use crate::error::QueryError;
use crate::models::{ColumnRef, DatabaseType, TableRef};
use crate::search::query::{Dialect, QuerySpec};
use async_trait::async_trait;
use sqlx::PgPool;

pub use connection::DEFAULT_POSTGRES_PORT;

/// PostgreSQL database adapter with connection pooling
pub struct PostgresAdapter {
    pub pool: PgPool,
    pub config: ConnectionConfig,
}

impl std::fmt::Debug for PostgresAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresAdapter")
            .field("config", &self.config)
            .field("pool_size", &self.pool.size())
            .field("pool_idle", &self.pool.num_idle())
            .finish()
    }
}

#[async_trait]
impl SchemaCatalog for PostgresAdapter {
    async fn list_tables(&self) -> Result<Vec<TableRef>> {
        self.fetch_tables().await
    }

    async fn list_columns(&self, table: &TableRef) -> Result<Vec<ColumnRef>> {
        self.fetch_columns(table).await
    }
}

#[async_trait]
impl QueryExecutor for PostgresAdapter {
    fn dialect(&self) -> Dialect {
        Dialect::PostgreSql
    }

    async fn count_matches(&self, spec: &QuerySpec) -> std::result::Result<u64, QueryError> {
        let sql = spec.count_sql(Dialect::PostgreSql);
        tracing::trace!("{}", sql);

        let count: i64 = sqlx::query_scalar(&sql)
            .bind(spec.bound_parameter(Dialect::PostgreSql))
            .fetch_one(&self.pool)
            .await
            .map_err(classify_sqlx_error)?;

        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn fetch_samples(&self, spec: &QuerySpec) -> std::result::Result<Vec<String>, QueryError> {
        let sql = spec.sample_sql(Dialect::PostgreSql);
        tracing::trace!("{}", sql);

        let values: Vec<Option<String>> = sqlx::query_scalar(&sql)
            .bind(spec.bound_parameter(Dialect::PostgreSql))
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
impl DatabaseAdapter for PostgresAdapter {
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

        // Table and column listing depend on information_schema
        let schema_access_test: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_schema = 'information_schema'",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            crate::error::TableFinderError::insufficient_privileges(format!(
                "Cannot access information_schema: {}",
                e
            ))
        })?;

        if schema_access_test == 0 {
            return Err(crate::error::TableFinderError::insufficient_privileges(
                "No access to information_schema tables",
            ));
        }

        Ok(())
    }

    fn database_type(&self) -> DatabaseType {
        DatabaseType::PostgreSQL
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
