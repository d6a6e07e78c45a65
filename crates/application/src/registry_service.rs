use std::sync::Arc;

use chrono::Utc;
use gridgate_core::{AppError, AppResult};
use gridgate_domain::{ActivatedTable, ConditionRule, TableCondition, TableRef, User};

use crate::GatewayConfig;
use crate::gateway_ports::{
    ActivationRepository, AuditActionKind, AuditEvent, AuditSink, ConditionRepository,
    SchemaIntrospector,
};

/// Application service managing table activations and their validation
/// conditions.
///
/// Every operation here is administrative: regular users interact with
/// activations only indirectly, through validation and discovery.
#[derive(Clone)]
pub struct RegistryService {
    activations: Arc<dyn ActivationRepository>,
    conditions: Arc<dyn ConditionRepository>,
    introspector: Arc<dyn SchemaIntrospector>,
    audit: Arc<dyn AuditSink>,
    config: GatewayConfig,
}

impl RegistryService {
    /// Creates a new registry service.
    #[must_use]
    pub fn new(
        activations: Arc<dyn ActivationRepository>,
        conditions: Arc<dyn ConditionRepository>,
        introspector: Arc<dyn SchemaIntrospector>,
        audit: Arc<dyn AuditSink>,
        config: GatewayConfig,
    ) -> Self {
        Self {
            activations,
            conditions,
            introspector,
            audit,
            config,
        }
    }

    /// Activates a table for the condition-validated surface, or refreshes
    /// its description when it is already active.
    ///
    /// The table must exist in the database's catalog at the time of the
    /// call; activating a table the catalog does not know fails with
    /// `SchemaNotFound`.
    pub async fn activate_table(
        &self,
        actor: &User,
        database_name: &str,
        table_name: &str,
        description: &str,
    ) -> AppResult<ActivatedTable> {
        self.ensure_admin(actor)?;
        self.ensure_database_allowed(database_name)?;

        let schema = self
            .introspector
            .describe_table(database_name, table_name)
            .await?;

        let activation = ActivatedTable::new(schema.table().clone(), description, true)?;
        self.activations.upsert_activation(activation.clone()).await?;

        self.emit(AuditEvent {
            actor: actor.id(),
            action: AuditActionKind::TableActivated,
            database_name: database_name.to_owned(),
            table_name: table_name.to_owned(),
            before: None,
            after: None,
            row_count: 0,
            occurred_at: Utc::now(),
        })
        .await;

        Ok(activation)
    }

    /// Deactivates a table, keeping its conditions in place for a later
    /// re-activation. Deactivating a table that is already inactive, or was
    /// never activated, is a no-op success.
    pub async fn deactivate_table(
        &self,
        actor: &User,
        database_name: &str,
        table_name: &str,
    ) -> AppResult<()> {
        self.ensure_admin(actor)?;
        self.ensure_database_allowed(database_name)?;

        let Some(activation) = self
            .activations
            .find_activation(database_name, table_name)
            .await?
        else {
            return Ok(());
        };

        if !activation.is_active() {
            return Ok(());
        }

        let deactivated = ActivatedTable::new(
            activation.table().clone(),
            activation.description().as_str(),
            false,
        )?;
        self.activations.upsert_activation(deactivated).await?;

        self.emit(AuditEvent {
            actor: actor.id(),
            action: AuditActionKind::TableDeactivated,
            database_name: database_name.to_owned(),
            table_name: table_name.to_owned(),
            before: None,
            after: None,
            row_count: 0,
            occurred_at: Utc::now(),
        })
        .await;

        Ok(())
    }

    /// Lists every activation currently in force.
    pub async fn list_activated(&self) -> AppResult<Vec<ActivatedTable>> {
        self.activations.list_activated().await
    }

    /// Lists the catalog tables of one allowed database, for picking
    /// activation candidates.
    pub async fn list_available_tables(
        &self,
        actor: &User,
        database_name: &str,
    ) -> AppResult<Vec<String>> {
        self.ensure_admin(actor)?;
        self.ensure_database_allowed(database_name)?;

        let mut tables = self.introspector.list_tables(database_name).await?;
        tables.sort();
        Ok(tables)
    }

    /// Attaches a validation condition to a column of an activated table and
    /// returns the stored condition's identifier.
    ///
    /// The column must exist in the table's current catalog schema; its
    /// catalog data type is snapshotted onto the condition row.
    pub async fn add_condition(
        &self,
        actor: &User,
        database_name: &str,
        table_name: &str,
        column_name: &str,
        rule: ConditionRule,
        is_required: bool,
    ) -> AppResult<i64> {
        self.ensure_admin(actor)?;
        self.ensure_database_allowed(database_name)?;

        let Some(activation) = self
            .activations
            .find_activation(database_name, table_name)
            .await?
        else {
            return Err(AppError::NotFound(format!(
                "table '{database_name}.{table_name}' is not activated"
            )));
        };
        if !activation.is_active() {
            return Err(AppError::Validation(format!(
                "table '{database_name}.{table_name}' is deactivated"
            )));
        }

        let schema = self
            .introspector
            .describe_table(database_name, table_name)
            .await?;
        let Some(column) = schema.column(column_name) else {
            return Err(AppError::UnknownColumn(format!(
                "column '{column_name}' does not exist in '{database_name}.{table_name}'"
            )));
        };

        let condition = TableCondition::new(
            TableRef::new(database_name, table_name)?,
            column_name,
            column.data_type().as_str(),
            rule,
            is_required,
            true,
        )?;
        let condition_id = self.conditions.save_condition(condition).await?;

        self.emit(AuditEvent {
            actor: actor.id(),
            action: AuditActionKind::ConditionSaved,
            database_name: database_name.to_owned(),
            table_name: table_name.to_owned(),
            before: None,
            after: None,
            row_count: 0,
            occurred_at: Utc::now(),
        })
        .await;

        Ok(condition_id)
    }

    /// Removes one condition from a table by identifier.
    pub async fn remove_condition(
        &self,
        actor: &User,
        database_name: &str,
        table_name: &str,
        condition_id: i64,
    ) -> AppResult<()> {
        self.ensure_admin(actor)?;
        self.ensure_database_allowed(database_name)?;

        let known = self
            .conditions
            .list_conditions(database_name, table_name)
            .await?;
        if !known.iter().any(|(id, _)| *id == condition_id) {
            return Err(AppError::NotFound(format!(
                "condition {condition_id} does not belong to '{database_name}.{table_name}'"
            )));
        }

        self.conditions.delete_condition(condition_id).await?;

        self.emit(AuditEvent {
            actor: actor.id(),
            action: AuditActionKind::ConditionRemoved,
            database_name: database_name.to_owned(),
            table_name: table_name.to_owned(),
            before: None,
            after: None,
            row_count: 0,
            occurred_at: Utc::now(),
        })
        .await;

        Ok(())
    }

    /// Lists every condition attached to one table, active or not.
    pub async fn list_conditions(
        &self,
        actor: &User,
        database_name: &str,
        table_name: &str,
    ) -> AppResult<Vec<(i64, TableCondition)>> {
        self.ensure_admin(actor)?;
        self.ensure_database_allowed(database_name)?;

        self.conditions
            .list_conditions(database_name, table_name)
            .await
    }

    fn ensure_admin(&self, actor: &User) -> AppResult<()> {
        if !actor.is_active() {
            return Err(AppError::PermissionDenied(format!(
                "user '{}' is deactivated",
                actor.username()
            )));
        }
        if !actor.is_admin() {
            return Err(AppError::PermissionDenied(format!(
                "user '{}' is not an administrator",
                actor.username()
            )));
        }
        Ok(())
    }

    fn ensure_database_allowed(&self, database_name: &str) -> AppResult<()> {
        if self.config.is_database_allowed(database_name) {
            Ok(())
        } else {
            Err(AppError::PermissionDenied(format!(
                "database '{database_name}' is not exposed through the generic surface"
            )))
        }
    }

    async fn emit(&self, event: AuditEvent) {
        if let Err(error) = self.audit.emit(event).await {
            tracing::warn!(%error, "audit sink rejected registry event");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use async_trait::async_trait;
    use gridgate_core::{AppError, AppResult, UserId};
    use gridgate_domain::{
        ActivatedTable, ColumnSchema, ConditionRule, TableCondition, TableRef, TableSchema, User,
    };
    use tokio::sync::Mutex;

    use crate::GatewayConfig;
    use crate::gateway_ports::{
        ActivationRepository, AuditEvent, AuditSink, ConditionRepository, SchemaIntrospector,
    };

    use super::RegistryService;

    #[derive(Default)]
    struct FakeActivationRepository {
        records: Mutex<HashMap<(String, String), ActivatedTable>>,
    }

    #[async_trait]
    impl ActivationRepository for FakeActivationRepository {
        async fn upsert_activation(&self, activation: ActivatedTable) -> AppResult<()> {
            let key = (
                activation.table().database_name().as_str().to_owned(),
                activation.table().table_name().as_str().to_owned(),
            );
            self.records.lock().await.insert(key, activation);
            Ok(())
        }

        async fn find_activation(
            &self,
            database_name: &str,
            table_name: &str,
        ) -> AppResult<Option<ActivatedTable>> {
            Ok(self
                .records
                .lock()
                .await
                .get(&(database_name.to_owned(), table_name.to_owned()))
                .cloned())
        }

        async fn list_activated(&self) -> AppResult<Vec<ActivatedTable>> {
            Ok(self
                .records
                .lock()
                .await
                .values()
                .filter(|activation| activation.is_active())
                .cloned()
                .collect())
        }
    }

    #[derive(Default)]
    struct FakeConditionRepository {
        rows: Mutex<HashMap<i64, TableCondition>>,
        next_id: Mutex<i64>,
    }

    #[async_trait]
    impl ConditionRepository for FakeConditionRepository {
        async fn save_condition(&self, condition: TableCondition) -> AppResult<i64> {
            let mut next_id = self.next_id.lock().await;
            *next_id += 1;
            self.rows.lock().await.insert(*next_id, condition);
            Ok(*next_id)
        }

        async fn delete_condition(&self, condition_id: i64) -> AppResult<()> {
            self.rows.lock().await.remove(&condition_id);
            Ok(())
        }

        async fn list_conditions(
            &self,
            database_name: &str,
            table_name: &str,
        ) -> AppResult<Vec<(i64, TableCondition)>> {
            Ok(self
                .rows
                .lock()
                .await
                .iter()
                .filter(|(_, condition)| {
                    condition.table().database_name().as_str() == database_name
                        && condition.table().table_name().as_str() == table_name
                })
                .map(|(id, condition)| (*id, condition.clone()))
                .collect())
        }

        async fn list_active_conditions(
            &self,
            database_name: &str,
            table_name: &str,
        ) -> AppResult<Vec<TableCondition>> {
            Ok(self
                .list_conditions(database_name, table_name)
                .await?
                .into_iter()
                .map(|(_, condition)| condition)
                .filter(TableCondition::is_active)
                .collect())
        }
    }

    struct FakeIntrospector;

    #[async_trait]
    impl SchemaIntrospector for FakeIntrospector {
        async fn describe_table(
            &self,
            database_name: &str,
            table_name: &str,
        ) -> AppResult<TableSchema> {
            if table_name != "employees" {
                return Err(AppError::SchemaNotFound(format!(
                    "{database_name}.{table_name}"
                )));
            }
            TableSchema::new(
                TableRef::new(database_name, table_name)?,
                vec![
                    ColumnSchema::new("id", "integer", false, true, true, None)?,
                    ColumnSchema::new("salary", "numeric", true, false, false, None)?,
                ],
            )
        }

        async fn list_tables(&self, _database_name: &str) -> AppResult<Vec<String>> {
            Ok(vec!["employees".to_owned()])
        }
    }

    #[derive(Default)]
    struct RecordingAuditSink {
        events: Mutex<Vec<AuditEvent>>,
        fail: bool,
    }

    #[async_trait]
    impl AuditSink for RecordingAuditSink {
        async fn emit(&self, event: AuditEvent) -> AppResult<()> {
            if self.fail {
                return Err(AppError::Internal("sink offline".to_owned()));
            }
            self.events.lock().await.push(event);
            Ok(())
        }
    }

    fn admin() -> User {
        User::new(UserId::new(), "root", true, true).unwrap_or_else(|_| unreachable!())
    }

    fn regular() -> User {
        User::new(UserId::new(), "ana", false, true).unwrap_or_else(|_| unreachable!())
    }

    fn service(audit: Arc<RecordingAuditSink>) -> RegistryService {
        let config = GatewayConfig::new(["hr".to_owned()], "gridgate", 100, 25)
            .unwrap_or_else(|_| unreachable!());
        RegistryService::new(
            Arc::new(FakeActivationRepository::default()),
            Arc::new(FakeConditionRepository::default()),
            Arc::new(FakeIntrospector),
            audit,
            config,
        )
    }

    #[tokio::test]
    async fn non_admin_cannot_activate_tables() {
        let service = service(Arc::new(RecordingAuditSink::default()));

        let result = service
            .activate_table(&regular(), "hr", "employees", "people")
            .await;
        assert!(matches!(result, Err(AppError::PermissionDenied(_))));
    }

    #[tokio::test]
    async fn activation_requires_the_table_to_exist() {
        let service = service(Arc::new(RecordingAuditSink::default()));

        let result = service
            .activate_table(&admin(), "hr", "ghosts", "not real")
            .await;
        assert!(matches!(result, Err(AppError::SchemaNotFound(_))));
    }

    #[tokio::test]
    async fn activate_then_deactivate_emits_audit_events() {
        let audit = Arc::new(RecordingAuditSink::default());
        let service = service(Arc::clone(&audit));
        let root = admin();

        let activated = service
            .activate_table(&root, "hr", "employees", "people")
            .await;
        assert!(activated.is_ok());

        let deactivated = service.deactivate_table(&root, "hr", "employees").await;
        assert!(deactivated.is_ok());

        let events = audit.events.lock().await;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].action.as_str(), "table.activated");
        assert_eq!(events[1].action.as_str(), "table.deactivated");
    }

    #[tokio::test]
    async fn deactivating_a_never_activated_table_is_a_silent_no_op() {
        let audit = Arc::new(RecordingAuditSink::default());
        let service = service(Arc::clone(&audit));

        let result = service.deactivate_table(&admin(), "hr", "employees").await;
        assert!(result.is_ok());
        assert!(audit.events.lock().await.is_empty());
    }

    #[tokio::test]
    async fn condition_snapshots_the_catalog_data_type() {
        let service = service(Arc::new(RecordingAuditSink::default()));
        let root = admin();

        let activated = service
            .activate_table(&root, "hr", "employees", "people")
            .await;
        assert!(activated.is_ok());

        let condition_id = service
            .add_condition(
                &root,
                "hr",
                "employees",
                "salary",
                ConditionRule::Min { bound: 1000.0 },
                false,
            )
            .await;
        assert!(condition_id.is_ok());

        let conditions = service.list_conditions(&root, "hr", "employees").await;
        assert!(conditions.is_ok());
        let conditions = conditions.unwrap_or_default();
        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions[0].1.data_type().as_str(), "numeric");
    }

    #[tokio::test]
    async fn condition_on_unknown_column_is_rejected() {
        let service = service(Arc::new(RecordingAuditSink::default()));
        let root = admin();

        let activated = service
            .activate_table(&root, "hr", "employees", "people")
            .await;
        assert!(activated.is_ok());

        let result = service
            .add_condition(
                &root,
                "hr",
                "employees",
                "bonus",
                ConditionRule::Required,
                false,
            )
            .await;
        assert!(matches!(result, Err(AppError::UnknownColumn(_))));
    }

    #[tokio::test]
    async fn condition_requires_an_active_activation() {
        let service = service(Arc::new(RecordingAuditSink::default()));
        let root = admin();

        let result = service
            .add_condition(
                &root,
                "hr",
                "employees",
                "salary",
                ConditionRule::Required,
                false,
            )
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn audit_sink_failure_does_not_fail_the_operation() {
        let audit = Arc::new(RecordingAuditSink {
            events: Mutex::new(Vec::new()),
            fail: true,
        });
        let service = service(audit);

        let result = service
            .activate_table(&admin(), "hr", "employees", "people")
            .await;
        assert!(result.is_ok());
    }
}
