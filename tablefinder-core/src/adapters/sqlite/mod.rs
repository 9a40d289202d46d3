//! SQLite database adapter.
//!
//! # Module Structure
//! - `connection`: connection string handling and pool creation
//! - `catalog`: table and column listing via `sqlite_master` and PRAGMAs
//!
//! # SQLite-Specific Features
//! - Tables are reported under the `main` schema
//! - Case-sensitive partial matches are rendered with `GLOB`
//! - No connection pooling (single connection is sufficient)
//!
//! # Security Guarantees
//! - All operations are read-only (SELECT/PRAGMA only)
//! - File-backed databases are opened read-only by default
//! - No network access required

pub mod catalog;
pub mod connection;


use super::{AdapterFeature, ConnectionConfig, DatabaseAdapter, QueryExecutor, SchemaCatalog};
use super::helpers::classify_sqlx_error;
use crate::Result;
use crate::error::QueryError;
use crate::models::{ColumnRef, DatabaseType, TableRef};
use crate::search::query::{Dialect, QuerySpec};
use async_trait::async_trait;
use sqlx::SqlitePool;

pub use connection::validate_sqlite_connection_string;

/// SQLite database adapter.
///
/// SQLite uses file-based databases, so a single connection serves every
/// query and table scans always run sequentially.
pub struct SqliteAdapter {
    pub(crate) pool: SqlitePool,
    pub(crate) config: ConnectionConfig,
    in_memory: bool,
}

impl std::fmt::Debug for SqliteAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteAdapter")
            .field("config", &self.config)
            .field("is_in_memory", &self.in_memory)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl SchemaCatalog for SqliteAdapter {
    async fn list_tables(&self) -> Result<Vec<TableRef>> {
        catalog::list_tables(&self.pool).await
    }

    async fn list_columns(&self, table: &TableRef) -> Result<Vec<ColumnRef>> {
        catalog::list_columns(&self.pool, table).await
    }
}

#[async_trait]
impl QueryExecutor for SqliteAdapter {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    async fn count_matches(&self, spec: &QuerySpec) -> std::result::Result<u64, QueryError> {
        let sql = spec.count_sql(Dialect::Sqlite);
        tracing::trace!("{}", sql);

        let count: i64 = sqlx::query_scalar(&sql)
            .bind(spec.bound_parameter(Dialect::Sqlite))
            .fetch_one(&self.pool)
            .await
            .map_err(classify_sqlx_error)?;

        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn fetch_samples(&self, spec: &QuerySpec) -> std::result::Result<Vec<String>, QueryError> {
        let sql = spec.sample_sql(Dialect::Sqlite);
        tracing::trace!("{}", sql);

        let values: Vec<Option<String>> = sqlx::query_scalar(&sql)
            .bind(spec.bound_parameter(Dialect::Sqlite))
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
impl DatabaseAdapter for SqliteAdapter {
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

        // Table listing depends on sqlite_master
        let _: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                crate::error::TableFinderError::insufficient_privileges(format!(
                    "Cannot access sqlite_master: {}",
                    e
                ))
            })?;

        Ok(())
    }

    fn database_type(&self) -> DatabaseType {
        DatabaseType::SQLite
    }

    fn supports_feature(&self, feature: AdapterFeature) -> bool {
        match feature {
            AdapterFeature::ReadOnlyMode => self.config.read_only && !self.in_memory,
            // A single connection means queries are serialized
            AdapterFeature::ConnectionPooling | AdapterFeature::QueryTimeout => false,
        }
    }

    fn connection_config(&self) -> ConnectionConfig {
        self.config.clone()
    }
}
