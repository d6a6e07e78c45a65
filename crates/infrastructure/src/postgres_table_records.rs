use async_trait::async_trait;
use gridgate_application::gateway_ports::{
    ColumnValue, KeyValues, RowPage, RowPageQuery, TableRecords,
};
use gridgate_core::{AppError, AppResult};
use gridgate_domain::{ColumnClass, TableSchema};
use serde_json::Value;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::sqlx_errors::{map_sqlx_error, quote_identifier};


/// Executes generated statements against dynamically-named tables.
///
/// Identifiers are taken from introspected schemas and quoted; every value
/// reaches the engine as a bind parameter cast to the column's catalog type.
#[derive(Clone)]
pub struct PostgresTableRecords {
    pool: PgPool,
}

impl PostgresTableRecords {
    /// Creates an executor with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn qualified_table(schema: &TableSchema) -> String {
    format!(
        "{}.{}",
        quote_identifier(schema.table().database_name().as_str()),
        quote_identifier(schema.table().table_name().as_str())
    )
}

fn row_reference(schema: &TableSchema) -> String {
    quote_identifier(schema.table().table_name().as_str())
}

/// Renders a JSON value as the text form Postgres will cast from.
///
/// Strings are passed through unquoted; everything else keeps its JSON
/// rendering, which matches the input syntax of numeric, boolean and json
/// types.
fn bind_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

/// Picks the cast applied to a bound value.
///
/// The coarse class covers the common families; text-like and exotic columns
/// fall back to the column's own catalog type so uuid and json columns keep
/// working. `USER-DEFINED` and `ARRAY` are not valid type names, so those
/// bind as plain text.
fn cast_for(schema: &TableSchema, value: &ColumnValue) -> Option<String> {
    match value.class {
        ColumnClass::Numeric => Some("numeric".to_owned()),
        ColumnClass::Date => Some("date".to_owned()),
        ColumnClass::Timestamp => Some("timestamptz".to_owned()),
        ColumnClass::Boolean => Some("boolean".to_owned()),
        ColumnClass::Text | ColumnClass::Other => {
            let data_type = schema.column(&value.name)?.data_type().as_str();
            match data_type {
                "USER-DEFINED" | "ARRAY" => None,
                _ => Some(data_type.to_owned()),
            }
        }
    }
}

fn push_cast_value(
    builder: &mut QueryBuilder<'_, Postgres>,
    schema: &TableSchema,
    value: &ColumnValue,
) {
    builder.push_bind(bind_text(&value.value));
    if let Some(cast) = cast_for(schema, value) {
        builder.push("::");
        builder.push(cast);
    }
}

/// Appends `WHERE` conditions matching each key column.
///
/// Keys are compared by value through the same class-based cast used for
/// writes, so a numeric key rendered as `1.0` still matches the row stored
/// as `1`. Castless exotic columns fall back to a textual comparison.
fn push_key_clause(
    builder: &mut QueryBuilder<'_, Postgres>,
    schema: &TableSchema,
    key: &[ColumnValue],
    column_prefix: &str,
) {
    builder.push(" WHERE ");
    for (index, part) in key.iter().enumerate() {
        if index > 0 {
            builder.push(" AND ");
        }
        builder.push(column_prefix);
        builder.push(quote_identifier(&part.name));
        if let Some(cast) = cast_for(schema, part) {
            builder.push(" = ");
            builder.push_bind(bind_text(&part.value));
            builder.push("::");
            builder.push(cast);
        } else {
            builder.push("::text = ");
            builder.push_bind(bind_text(&part.value));
        }
    }
}

fn to_i64(value: usize, what: &str) -> AppResult<i64> {
    i64::try_from(value)
        .map_err(|error| AppError::Validation(format!("invalid row page {what}: {error}")))
}

#[async_trait]
impl TableRecords for PostgresTableRecords {
    async fn list_rows(&self, schema: &TableSchema, query: RowPageQuery) -> AppResult<RowPage> {
        let table = qualified_table(schema);

        let (total,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&self.pool)
            .await
            .map_err(|error| map_sqlx_error("failed to count rows", error))?;

        let mut builder: QueryBuilder<'_, Postgres> =
            QueryBuilder::new(format!("SELECT to_jsonb(t) FROM {table} t"));

        let primary_keys = schema.primary_keys();
        if !primary_keys.is_empty() {
            builder.push(" ORDER BY ");
            for (index, name) in primary_keys.iter().enumerate() {
                if index > 0 {
                    builder.push(", ");
                }
                builder.push("t.");
                builder.push(quote_identifier(name));
            }
        }

        builder.push(" LIMIT ");
        builder.push_bind(to_i64(query.limit, "limit")?);
        builder.push(" OFFSET ");
        builder.push_bind(to_i64(query.offset, "offset")?);

        let rows: Vec<(Value,)> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|error| map_sqlx_error("failed to list rows", error))?;

        Ok(RowPage {
            rows: rows.into_iter().map(|(row,)| row).collect(),
            total: u64::try_from(total).unwrap_or(0),
        })
    }

    async fn find_row(
        &self,
        schema: &TableSchema,
        key: &[ColumnValue],
    ) -> AppResult<Option<Value>> {
        let table = qualified_table(schema);
        let mut builder: QueryBuilder<'_, Postgres> =
            QueryBuilder::new(format!("SELECT to_jsonb(t) FROM {table} t"));
        push_key_clause(&mut builder, schema, key, "t.");

        let row: Option<(Value,)> = builder
            .build_query_as()
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| map_sqlx_error("failed to fetch row", error))?;

        Ok(row.map(|(row,)| row))
    }

    async fn insert_row(
        &self,
        schema: &TableSchema,
        values: Vec<ColumnValue>,
    ) -> AppResult<Value> {
        let table = qualified_table(schema);
        let mut builder: QueryBuilder<'_, Postgres> =
            QueryBuilder::new(format!("INSERT INTO {table} "));

        if values.is_empty() {
            builder.push("DEFAULT VALUES");
        } else {
            builder.push("(");
            for (index, value) in values.iter().enumerate() {
                if index > 0 {
                    builder.push(", ");
                }
                builder.push(quote_identifier(&value.name));
            }
            builder.push(") VALUES (");
            for (index, value) in values.iter().enumerate() {
                if index > 0 {
                    builder.push(", ");
                }
                push_cast_value(&mut builder, schema, value);
            }
            builder.push(")");
        }

        builder.push(" RETURNING to_jsonb(");
        builder.push(row_reference(schema));
        builder.push(")");

        let (row,): (Value,) = builder
            .build_query_as()
            .fetch_one(&self.pool)
            .await
            .map_err(|error| map_sqlx_error("failed to insert row", error))?;

        Ok(row)
    }

    async fn update_row(
        &self,
        schema: &TableSchema,
        values: Vec<ColumnValue>,
        key: KeyValues,
    ) -> AppResult<Option<Value>> {
        let table = qualified_table(schema);
        let mut builder: QueryBuilder<'_, Postgres> =
            QueryBuilder::new(format!("UPDATE {table} SET "));

        for (index, value) in values.iter().enumerate() {
            if index > 0 {
                builder.push(", ");
            }
            builder.push(quote_identifier(&value.name));
            builder.push(" = ");
            push_cast_value(&mut builder, schema, value);
        }

        push_key_clause(&mut builder, schema, &key, "");

        builder.push(" RETURNING to_jsonb(");
        builder.push(row_reference(schema));
        builder.push(")");

        let row: Option<(Value,)> = builder
            .build_query_as()
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| map_sqlx_error("failed to update row", error))?;

        Ok(row.map(|(row,)| row))
    }

    async fn delete_row(&self, schema: &TableSchema, key: KeyValues) -> AppResult<u64> {
        let table = qualified_table(schema);
        let mut builder: QueryBuilder<'_, Postgres> =
            QueryBuilder::new(format!("DELETE FROM {table}"));
        push_key_clause(&mut builder, schema, &key, "");

        let result = builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(|error| map_sqlx_error("failed to delete row", error))?;

        Ok(result.rows_affected())
    }

    async fn delete_rows(&self, schema: &TableSchema, keys: Vec<KeyValues>) -> AppResult<u64> {
        let table = qualified_table(schema);
        let mut transaction = self
            .pool
            .begin()
            .await
            .map_err(|error| map_sqlx_error("failed to begin bulk delete", error))?;

        let mut removed = 0;
        for key in &keys {
            let mut builder: QueryBuilder<'_, Postgres> =
                QueryBuilder::new(format!("DELETE FROM {table}"));
            push_key_clause(&mut builder, schema, key, "");

            let result = builder
                .build()
                .execute(&mut *transaction)
                .await
                .map_err(|error| map_sqlx_error("failed to delete keyed row", error))?;

            if result.rows_affected() == 0 {
                transaction
                    .rollback()
                    .await
                    .map_err(|error| map_sqlx_error("failed to roll back bulk delete", error))?;
                return Err(AppError::NotFound(
                    "bulk delete targets a missing row; no rows were removed".to_owned(),
                ));
            }
            removed += result.rows_affected();
        }

        transaction
            .commit()
            .await
            .map_err(|error| map_sqlx_error("failed to commit bulk delete", error))?;

        Ok(removed)
    }
}
