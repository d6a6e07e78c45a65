use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gridgate_core::{AppResult, UserId};
use serde_json::Value;

/// Stable audit actions emitted by the gateway services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuditActionKind {
    /// Emitted when a row is inserted.
    RowInserted,
    /// Emitted when a row is updated.
    RowUpdated,
    /// Emitted when a row is deleted.
    RowDeleted,
    /// Emitted when a batch of rows is deleted atomically.
    RowsBulkDeleted,
    /// Emitted when a table is activated or its description changes.
    TableActivated,
    /// Emitted when a table is deactivated.
    TableDeactivated,
    /// Emitted when a validation condition is attached or replaced.
    ConditionSaved,
    /// Emitted when a validation condition is removed.
    ConditionRemoved,
}

impl AuditActionKind {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RowInserted => "row.inserted",
            Self::RowUpdated => "row.updated",
            Self::RowDeleted => "row.deleted",
            Self::RowsBulkDeleted => "rows.bulk_deleted",
            Self::TableActivated => "table.activated",
            Self::TableDeactivated => "table.deactivated",
            Self::ConditionSaved => "condition.saved",
            Self::ConditionRemoved => "condition.removed",
        }
    }
}

/// Immutable audit event payload emitted once per successful mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditEvent {
    /// Actor that performed the mutation.
    pub actor: UserId,
    /// Stable action identifier.
    pub action: AuditActionKind,
    /// Database containing the touched table.
    pub database_name: String,
    /// Touched table.
    pub table_name: String,
    /// Row state before the mutation, when applicable.
    pub before: Option<Value>,
    /// Row state after the mutation, when applicable.
    pub after: Option<Value>,
    /// Number of rows affected.
    pub row_count: u64,
    /// Event timestamp.
    pub occurred_at: DateTime<Utc>,
}

/// Emission hook for audit events.
///
/// The gateway never blocks on a sink failure: callers log and continue,
/// so implementations may persist, forward, or drop events as they see fit.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Hands one event to the external audit owner.
    async fn emit(&self, event: AuditEvent) -> AppResult<()>;
}
