//! MySQL catalog listing for the connected database.
//!
//! Values are cast to CHAR or SIGNED to avoid VARBINARY and unsigned
//! decoding issues in MySQL 8.0+.

use super::MySqlAdapter;
use crate::Result;
use crate::models::{ColumnRef, TableRef};
use sqlx::Row;

impl MySqlAdapter {
    /// Lists base tables of the current database ordered by name.
    pub(crate) async fn fetch_tables(&self) -> Result<Vec<TableRef>> {
        let tables_query = r#"
            SELECT
                CAST(TABLE_SCHEMA AS CHAR) as TABLE_SCHEMA,
                CAST(TABLE_NAME AS CHAR) as TABLE_NAME
            FROM INFORMATION_SCHEMA.TABLES
            WHERE TABLE_SCHEMA = DATABASE()
            AND TABLE_TYPE = 'BASE TABLE'
            ORDER BY TABLE_NAME
        "#;

        let rows = sqlx::query(tables_query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to enumerate tables: {}", e);
                crate::error::TableFinderError::catalog_failed("Failed to enumerate tables", e)
            })?;

        let mut tables = Vec::with_capacity(rows.len());
        for row in &rows {
            let schema: String = row.try_get("TABLE_SCHEMA").map_err(|e| {
                crate::error::TableFinderError::catalog_failed("Failed to parse table schema", e)
            })?;
            let name: String = row.try_get("TABLE_NAME").map_err(|e| {
                crate::error::TableFinderError::catalog_failed("Failed to parse table name", e)
            })?;
            tables.push(TableRef::new(schema, name));
        }

        Ok(tables)
    }

    /// Lists the columns of `table` by ordinal position.
    pub(crate) async fn fetch_columns(&self, table: &TableRef) -> Result<Vec<ColumnRef>> {
        let columns_query = r#"
            SELECT
                CAST(c.COLUMN_NAME AS CHAR) as COLUMN_NAME,
                CAST(c.DATA_TYPE AS CHAR) as DATA_TYPE,
                CAST(c.ORDINAL_POSITION AS SIGNED) as ORDINAL_POSITION
            FROM INFORMATION_SCHEMA.COLUMNS c
            WHERE c.TABLE_SCHEMA = ?
            AND c.TABLE_NAME = ?
            ORDER BY c.ORDINAL_POSITION
        "#;

        let rows = sqlx::query(columns_query)
            .bind(&table.schema)
            .bind(&table.name)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                crate::error::TableFinderError::catalog_failed(
                    format!("Failed to collect columns for table '{}'", table.name),
                    e,
                )
            })?;

        let mut columns = Vec::with_capacity(rows.len());
        for row in &rows {
            let name: String = row.try_get("COLUMN_NAME").map_err(|e| {
                crate::error::TableFinderError::catalog_failed("Failed to parse column name", e)
            })?;
            let data_type: String = row.try_get("DATA_TYPE").unwrap_or_default();
            let ordinal: i64 = row.try_get("ORDINAL_POSITION").unwrap_or(0);

            columns.push(ColumnRef::new(
                table.clone(),
                name,
                data_type,
                u32::try_from(ordinal).unwrap_or(0),
            ));
        }

        Ok(columns)
    }
}
