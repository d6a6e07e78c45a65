use async_trait::async_trait;
use gridgate_core::AppResult;
use gridgate_domain::{ActivatedTable, TableCondition};

/// Repository port for activation records.
#[async_trait]
pub trait ActivationRepository: Send + Sync {
    /// Creates or replaces an activation record.
    async fn upsert_activation(&self, activation: ActivatedTable) -> AppResult<()>;

    /// Looks up one activation record regardless of its active flag.
    async fn find_activation(
        &self,
        database_name: &str,
        table_name: &str,
    ) -> AppResult<Option<ActivatedTable>>;

    /// Lists every activation record that is currently active.
    async fn list_activated(&self) -> AppResult<Vec<ActivatedTable>>;
}

/// Repository port for per-column validation conditions.
#[async_trait]
pub trait ConditionRepository: Send + Sync {
    /// Persists one condition row and returns its stable identifier.
    async fn save_condition(&self, condition: TableCondition) -> AppResult<i64>;

    /// Removes one condition row by identifier.
    async fn delete_condition(&self, condition_id: i64) -> AppResult<()>;

    /// Lists every condition attached to one table, active or not.
    async fn list_conditions(
        &self,
        database_name: &str,
        table_name: &str,
    ) -> AppResult<Vec<(i64, TableCondition)>>;

    /// Lists the conditions that participate in validation for one table:
    /// active rows belonging to an active activation.
    async fn list_active_conditions(
        &self,
        database_name: &str,
        table_name: &str,
    ) -> AppResult<Vec<TableCondition>>;
}
