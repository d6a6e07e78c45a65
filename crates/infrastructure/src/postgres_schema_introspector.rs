use async_trait::async_trait;
use gridgate_application::gateway_ports::SchemaIntrospector;
use gridgate_core::{AppError, AppResult};
use gridgate_domain::{ColumnSchema, TableRef, TableSchema};
use sqlx::{FromRow, PgPool};

use crate::sqlx_errors::map_sqlx_error;

/// Catalog-backed schema introspector.
///
/// Each call reads `information_schema` fresh; nothing is cached across
/// requests, so concurrent DDL is picked up on the next call.
#[derive(Clone)]
pub struct PostgresSchemaIntrospector {
    pool: PgPool,
}

impl PostgresSchemaIntrospector {
    /// Creates an introspector with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ColumnRow {
    column_name: String,
    data_type: String,
    nullable: bool,
    is_identity: bool,
    is_primary_key: bool,
    character_maximum_length: Option<i32>,
}

#[async_trait]
impl SchemaIntrospector for PostgresSchemaIntrospector {
    async fn describe_table(
        &self,
        database_name: &str,
        table_name: &str,
    ) -> AppResult<TableSchema> {
        let rows: Vec<ColumnRow> = sqlx::query_as(
            r#"
            SELECT
                c.column_name,
                c.data_type,
                c.is_nullable = 'YES' AS nullable,
                (c.is_identity = 'YES'
                    OR COALESCE(c.column_default, '') LIKE 'nextval(%') AS is_identity,
                EXISTS (
                    SELECT 1
                    FROM information_schema.table_constraints tc
                    JOIN information_schema.key_column_usage kcu
                        ON kcu.constraint_name = tc.constraint_name
                        AND kcu.table_schema = tc.table_schema
                    WHERE tc.constraint_type = 'PRIMARY KEY'
                        AND tc.table_schema = c.table_schema
                        AND tc.table_name = c.table_name
                        AND kcu.column_name = c.column_name
                ) AS is_primary_key,
                c.character_maximum_length
            FROM information_schema.columns c
            WHERE c.table_schema = $1 AND c.table_name = $2
            ORDER BY c.ordinal_position
            "#,
        )
        .bind(database_name)
        .bind(table_name)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| map_sqlx_error("failed to introspect table columns", error))?;

        if rows.is_empty() {
            return Err(AppError::SchemaNotFound(format!(
                "table '{database_name}.{table_name}' does not exist"
            )));
        }

        let columns = rows
            .into_iter()
            .map(|row| {
                ColumnSchema::new(
                    row.column_name,
                    row.data_type,
                    row.nullable,
                    row.is_identity,
                    row.is_primary_key,
                    row.character_maximum_length,
                )
            })
            .collect::<AppResult<Vec<_>>>()?;

        TableSchema::new(TableRef::new(database_name, table_name)?, columns)
    }

    async fn list_tables(&self, database_name: &str) -> AppResult<Vec<String>> {
        let tables: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT table_name
            FROM information_schema.tables
            WHERE table_schema = $1 AND table_type = 'BASE TABLE'
            ORDER BY table_name
            "#,
        )
        .bind(database_name)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| map_sqlx_error("failed to list catalog tables", error))?;

        Ok(tables.into_iter().map(|(name,)| name).collect())
    }
}
