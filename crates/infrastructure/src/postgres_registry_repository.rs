use async_trait::async_trait;
use gridgate_application::gateway_ports::{ActivationRepository, ConditionRepository};
use gridgate_core::{AppError, AppResult};
use gridgate_domain::{ActivatedTable, ConditionRule, TableCondition, TableRef};
use serde_json::Value;
use sqlx::{FromRow, PgPool};

use crate::sqlx_errors::map_sqlx_error;


/// PostgreSQL-backed store for activations and validation conditions.
///
/// Rule payloads are kept as tagged JSONB, so new rule types ship without a
/// schema migration.
#[derive(Clone)]
pub struct PostgresRegistryRepository {
    pool: PgPool,
}

impl PostgresRegistryRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ActivationRow {
    database_name: String,
    table_name: String,
    description: String,
    is_active: bool,
}

impl ActivationRow {
    fn into_domain(self) -> AppResult<ActivatedTable> {
        ActivatedTable::new(
            TableRef::new(self.database_name, self.table_name)?,
            self.description,
            self.is_active,
        )
    }
}

#[derive(Debug, FromRow)]
struct ConditionRow {
    id: i64,
    database_name: String,
    table_name: String,
    column_name: String,
    data_type: String,
    rule: Value,
    is_required: bool,
    is_active: bool,
}

impl ConditionRow {
    fn into_domain(self) -> AppResult<(i64, TableCondition)> {
        let rule: ConditionRule = serde_json::from_value(self.rule).map_err(|error| {
            AppError::Internal(format!(
                "stored rule payload for condition {} is malformed: {error}",
                self.id
            ))
        })?;

        let condition = TableCondition::new(
            TableRef::new(self.database_name, self.table_name)?,
            self.column_name,
            self.data_type,
            rule,
            self.is_required,
            self.is_active,
        )?;

        Ok((self.id, condition))
    }
}

#[async_trait]
impl ActivationRepository for PostgresRegistryRepository {
    async fn upsert_activation(&self, activation: ActivatedTable) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO activated_tables (database_name, table_name, description, is_active)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (database_name, table_name) DO UPDATE SET
                description = EXCLUDED.description,
                is_active = EXCLUDED.is_active
            "#,
        )
        .bind(activation.table().database_name().as_str())
        .bind(activation.table().table_name().as_str())
        .bind(activation.description().as_str())
        .bind(activation.is_active())
        .execute(&self.pool)
        .await
        .map_err(|error| map_sqlx_error("failed to upsert activation", error))?;

        Ok(())
    }

    async fn find_activation(
        &self,
        database_name: &str,
        table_name: &str,
    ) -> AppResult<Option<ActivatedTable>> {
        let row: Option<ActivationRow> = sqlx::query_as(
            r#"
            SELECT database_name, table_name, description, is_active
            FROM activated_tables
            WHERE database_name = $1 AND table_name = $2
            "#,
        )
        .bind(database_name)
        .bind(table_name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| map_sqlx_error("failed to look up activation", error))?;

        row.map(ActivationRow::into_domain).transpose()
    }

    async fn list_activated(&self) -> AppResult<Vec<ActivatedTable>> {
        let rows: Vec<ActivationRow> = sqlx::query_as(
            r#"
            SELECT database_name, table_name, description, is_active
            FROM activated_tables
            WHERE is_active
            ORDER BY database_name, table_name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| map_sqlx_error("failed to list activations", error))?;

        rows.into_iter().map(ActivationRow::into_domain).collect()
    }
}

#[async_trait]
impl ConditionRepository for PostgresRegistryRepository {
    async fn save_condition(&self, condition: TableCondition) -> AppResult<i64> {
        let rule = serde_json::to_value(condition.rule())
            .map_err(|error| AppError::Internal(format!("failed to encode rule: {error}")))?;

        let (condition_id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO table_conditions
                (database_name, table_name, column_name, data_type,
                 rule, is_required, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(condition.table().database_name().as_str())
        .bind(condition.table().table_name().as_str())
        .bind(condition.column_name().as_str())
        .bind(condition.data_type().as_str())
        .bind(rule)
        .bind(condition.is_required())
        .bind(condition.is_active())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| map_sqlx_error("failed to save condition", error))?;

        Ok(condition_id)
    }

    async fn delete_condition(&self, condition_id: i64) -> AppResult<()> {
        sqlx::query("DELETE FROM table_conditions WHERE id = $1")
            .bind(condition_id)
            .execute(&self.pool)
            .await
            .map_err(|error| map_sqlx_error("failed to delete condition", error))?;

        Ok(())
    }

    async fn list_conditions(
        &self,
        database_name: &str,
        table_name: &str,
    ) -> AppResult<Vec<(i64, TableCondition)>> {
        let rows: Vec<ConditionRow> = sqlx::query_as(
            r#"
            SELECT id, database_name, table_name, column_name, data_type,
                   rule, is_required, is_active
            FROM table_conditions
            WHERE database_name = $1 AND table_name = $2
            ORDER BY id
            "#,
        )
        .bind(database_name)
        .bind(table_name)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| map_sqlx_error("failed to list conditions", error))?;

        rows.into_iter().map(ConditionRow::into_domain).collect()
    }

    async fn list_active_conditions(
        &self,
        database_name: &str,
        table_name: &str,
    ) -> AppResult<Vec<TableCondition>> {
        let rows: Vec<ConditionRow> = sqlx::query_as(
            r#"
            SELECT c.id, c.database_name, c.table_name, c.column_name, c.data_type,
                   c.rule, c.is_required, c.is_active
            FROM table_conditions c
            JOIN activated_tables a
                ON a.database_name = c.database_name
                AND a.table_name = c.table_name
            WHERE c.database_name = $1 AND c.table_name = $2
                AND c.is_active AND a.is_active
            ORDER BY c.id
            "#,
        )
        .bind(database_name)
        .bind(table_name)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| map_sqlx_error("failed to list active conditions", error))?;

        rows.into_iter()
            .map(|row| row.into_domain().map(|(_, condition)| condition))
            .collect()
    }
}
