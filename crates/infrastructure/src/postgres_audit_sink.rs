use async_trait::async_trait;
use gridgate_application::gateway_ports::{AuditEvent, AuditSink};
use gridgate_core::AppResult;
use sqlx::PgPool;

use crate::sqlx_errors::map_sqlx_error;

/// Audit sink persisting events into the gateway's own `audit_events` table.
#[derive(Clone)]
pub struct PostgresAuditSink {
    pool: PgPool,
}

impl PostgresAuditSink {
    /// Creates a sink with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditSink for PostgresAuditSink {
    async fn emit(&self, event: AuditEvent) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO audit_events
                (actor, action, database_name, table_name,
                 before_row, after_row, row_count, occurred_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(event.actor.as_uuid())
        .bind(event.action.as_str())
        .bind(event.database_name.as_str())
        .bind(event.table_name.as_str())
        .bind(event.before)
        .bind(event.after)
        .bind(i64::try_from(event.row_count).unwrap_or(i64::MAX))
        .bind(event.occurred_at)
        .execute(&self.pool)
        .await
        .map_err(|error| map_sqlx_error("failed to persist audit event", error))?;

        Ok(())
    }
}
