use async_trait::async_trait;
use gridgate_application::gateway_ports::{AuditEvent, AuditSink};
use gridgate_core::AppResult;

/// Audit sink that logs events through `tracing`.
///
/// Suitable for development and for deployments whose log pipeline is the
/// audit system of record.
#[derive(Clone, Default)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn emit(&self, event: AuditEvent) -> AppResult<()> {
        tracing::info!(
            actor = %event.actor,
            action = event.action.as_str(),
            database = %event.database_name,
            table = %event.table_name,
            row_count = event.row_count,
            "audit event"
        );
        Ok(())
    }
}
