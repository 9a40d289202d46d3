//! PostgreSQL catalog listing via `information_schema`.

use super::PostgresAdapter;
use crate::Result;
use crate::models::{ColumnRef, TableRef};
use sqlx::Row;

/// Schemas that never hold user data.
const SYSTEM_SCHEMAS: &str = "('information_schema', 'pg_catalog', 'pg_toast')";

/// Maps catalog errors, surfacing privilege failures separately.
fn catalog_error(context: &str, e: sqlx::Error) -> crate::error::TableFinderError {
    tracing::error!("{}: {}", context, e);
    match &e {
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("42501") => {
            crate::error::TableFinderError::insufficient_privileges(format!(
                "{} - insufficient privileges",
                context
            ))
        }
        _ => crate::error::TableFinderError::catalog_failed(context, e),
    }
}

impl PostgresAdapter {
    /// Lists selectable base tables ordered by schema, then name.
    pub(crate) async fn fetch_tables(&self) -> Result<Vec<TableRef>> {
        let tables_query = format!(
            r#"
            SELECT t.table_schema::text AS table_schema, t.table_name::text AS table_name
            FROM information_schema.tables t
            WHERE t.table_type = 'BASE TABLE'
            AND t.table_schema NOT IN {SYSTEM_SCHEMAS}
            AND has_table_privilege(quote_ident(t.table_schema) || '.' || quote_ident(t.table_name), 'SELECT')
            ORDER BY t.table_schema, t.table_name
            "#
        );

        let rows = sqlx::query(&tables_query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| catalog_error("Failed to enumerate database tables", e))?;

        let mut tables = Vec::with_capacity(rows.len());
        for row in &rows {
            let schema: String = row.try_get("table_schema").map_err(|e| {
                crate::error::TableFinderError::catalog_failed("Failed to parse table schema", e)
            })?;
            let name: String = row.try_get("table_name").map_err(|e| {
                crate::error::TableFinderError::catalog_failed("Failed to parse table name", e)
            })?;
            tables.push(TableRef::new(schema, name));
        }

        Ok(tables)
    }

    /// Lists the columns of `table` by ordinal position.
    ///
    /// `information_schema` columns use domain types, so every value is cast
    /// to a builtin type before decoding.
    ///
    /// User-defined types report their `udt_name` so that array and domain
    /// columns are classified by their underlying name.
    pub(crate) async fn fetch_columns(&self, table: &TableRef) -> Result<Vec<ColumnRef>> {
        let rows = sqlx::query(
            r#"
            SELECT c.column_name::text AS column_name,
                   c.data_type::text AS data_type,
                   c.udt_name::text AS udt_name,
                   c.ordinal_position::int4 AS ordinal_position
            FROM information_schema.columns c
            WHERE c.table_schema = $1 AND c.table_name = $2
            ORDER BY c.ordinal_position
            "#,
        )
        .bind(&table.schema)
        .bind(&table.name)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| catalog_error(&format!("Failed to collect columns for '{}'", table), e))?;

        let mut columns = Vec::with_capacity(rows.len());
        for row in &rows {
            let name: String = row.try_get("column_name").map_err(|e| {
                crate::error::TableFinderError::catalog_failed("Failed to parse column name", e)
            })?;
            let data_type: String = row.try_get("data_type").unwrap_or_default();
            let udt_name: String = row.try_get("udt_name").unwrap_or_default();
            let ordinal: i32 = row.try_get("ordinal_position").unwrap_or(0);

            let data_type = if data_type == "USER-DEFINED" || data_type == "ARRAY" {
                udt_name
            } else {
                data_type
            };

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
