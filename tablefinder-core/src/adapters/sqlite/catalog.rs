//! SQLite catalog listing.
//!
//! # SQLite System Tables
//! - `sqlite_master`: schema definitions for all database objects
//! - `pragma_table_info()`: column information for a table

use crate::Result;
use crate::models::{ColumnRef, TableRef};
use sqlx::{Row, SqlitePool};

/// Schema name SQLite uses for the primary database.
pub const MAIN_SCHEMA: &str = "main";

/// Lists user tables ordered by name, excluding `sqlite_` internals.
pub(crate) async fn list_tables(pool: &SqlitePool) -> Result<Vec<TableRef>> {
    let tables_query = r#"
        SELECT name
        FROM sqlite_master
        WHERE type = 'table'
        AND name NOT LIKE 'sqlite_%'
        ORDER BY name
    "#;

    let names: Vec<String> = sqlx::query_scalar(tables_query)
        .fetch_all(pool)
        .await
        .map_err(|e| {
            crate::error::TableFinderError::catalog_failed("Failed to enumerate tables", e)
        })?;

    Ok(names
        .into_iter()
        .map(|name| TableRef::new(MAIN_SCHEMA, name))
        .collect())
}

/// Lists the columns of `table` in declaration order.
///
/// Columns declared without a type report an empty data type, which the
/// classifier treats as searchable.
pub(crate) async fn list_columns(pool: &SqlitePool, table: &TableRef) -> Result<Vec<ColumnRef>> {
    let rows = sqlx::query("SELECT cid, name, type FROM pragma_table_info(?) ORDER BY cid")
        .bind(&table.name)
        .fetch_all(pool)
        .await
        .map_err(|e| {
            crate::error::TableFinderError::catalog_failed(
                format!("Failed to collect columns for table '{}'", table.name),
                e,
            )
        })?;

    let mut columns = Vec::with_capacity(rows.len());
    for row in &rows {
        let cid: i64 = row.try_get("cid").map_err(|e| {
            crate::error::TableFinderError::catalog_failed("Failed to parse column id", e)
        })?;
        let name: String = row.try_get("name").map_err(|e| {
            crate::error::TableFinderError::catalog_failed("Failed to parse column name", e)
        })?;
        let data_type: String = row.try_get("type").unwrap_or_default();

        columns.push(ColumnRef::new(
            table.clone(),
            name,
            data_type,
            u32::try_from(cid + 1).unwrap_or(u32::MAX),
        ));
    }

    if columns.is_empty() {
        tracing::debug!("Table '{}' reported no columns", table);
    }

    Ok(columns)
}
