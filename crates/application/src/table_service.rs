use std::sync::Arc;

use chrono::Utc;
use gridgate_core::{AppError, AppResult};
use gridgate_domain::{CrudAction, TableSchema, User};
use serde_json::{Map, Value};

use crate::access_service::AccessService;
use crate::config::GatewayConfig;
use crate::gateway_ports::{
    AuditActionKind, AuditEvent, AuditSink, ColumnValue, KeyValues, RowPage, RowPageQuery,
    SchemaIntrospector, TableRecords,
};
use crate::validation_service::ValidationService;


/// Application service executing generic CRUD against arbitrary tables.
///
/// Every operation resolves permissions first, then discovers the table's
/// schema from the live catalog, and only then touches rows. Statements are
/// generated from the introspected schema, so caller-supplied names never
/// reach the engine as identifiers.
#[derive(Clone)]
pub struct TableService {
    access: AccessService,
    validation: ValidationService,
    introspector: Arc<dyn SchemaIntrospector>,
    records: Arc<dyn TableRecords>,
    audit: Arc<dyn AuditSink>,
    config: GatewayConfig,
}

impl TableService {
    /// Creates a new table service.
    #[must_use]
    pub fn new(
        access: AccessService,
        validation: ValidationService,
        introspector: Arc<dyn SchemaIntrospector>,
        records: Arc<dyn TableRecords>,
        audit: Arc<dyn AuditSink>,
        config: GatewayConfig,
    ) -> Self {
        Self {
            access,
            validation,
            introspector,
            records,
            audit,
            config,
        }
    }

    /// Describes a table from the live catalog for a caller allowed to read
    /// it.
    ///
    /// The snapshot is independent of activation state and is never cached
    /// across requests.
    pub async fn describe_table(
        &self,
        actor: &User,
        database_name: &str,
        table_name: &str,
    ) -> AppResult<TableSchema> {
        self.access
            .require(actor, database_name, table_name, CrudAction::Read)
            .await?;

        self.introspector
            .describe_table(database_name, table_name)
            .await
    }

    /// Lists one page of rows ordered by primary key.
    ///
    /// A missing or zero limit falls back to the configured default; a limit
    /// above the configured maximum is capped to it without an error.
    pub async fn list_rows(
        &self,
        actor: &User,
        database_name: &str,
        table_name: &str,
        limit: Option<usize>,
        offset: usize,
    ) -> AppResult<RowPage> {
        self.access
            .require(actor, database_name, table_name, CrudAction::Read)
            .await?;

        let schema = self
            .introspector
            .describe_table(database_name, table_name)
            .await?;

        let query = RowPageQuery {
            limit: self.clamp_limit(limit),
            offset,
        };
        self.records.list_rows(&schema, query).await
    }

    /// Fetches one row by its full primary key.
    pub async fn get_row(
        &self,
        actor: &User,
        database_name: &str,
        table_name: &str,
        key: &Map<String, Value>,
    ) -> AppResult<Value> {
        self.access
            .require(actor, database_name, table_name, CrudAction::Read)
            .await?;

        let schema = self
            .introspector
            .describe_table(database_name, table_name)
            .await?;
        let key = key_values(&schema, key)?;

        self.records
            .find_row(&schema, &key)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "no row in '{database_name}.{table_name}' matches the given key"
                ))
            })
    }

    /// Inserts one row and returns the stored row, including engine-assigned
    /// identity values.
    ///
    /// Identity columns supplied by the caller are dropped silently; unknown
    /// columns fail the request. Validation runs before any statement is
    /// generated.
    pub async fn insert_row(
        &self,
        actor: &User,
        database_name: &str,
        table_name: &str,
        record: &Map<String, Value>,
    ) -> AppResult<Value> {
        self.access
            .require(actor, database_name, table_name, CrudAction::Create)
            .await?;

        let schema = self
            .introspector
            .describe_table(database_name, table_name)
            .await?;
        let values = writable_values(&schema, record)?;

        self.validation
            .validate(database_name, table_name, record)
            .await?
            .into_result()?;

        let stored = self.records.insert_row(&schema, values).await?;

        self.emit(AuditEvent {
            actor: actor.id(),
            action: AuditActionKind::RowInserted,
            database_name: database_name.to_owned(),
            table_name: table_name.to_owned(),
            before: None,
            after: Some(stored.clone()),
            row_count: 1,
            occurred_at: Utc::now(),
        })
        .await;

        Ok(stored)
    }

    /// Updates the row matching the full primary key and returns the stored
    /// row.
    ///
    /// Changes are merged over the current row before validation, so rules on
    /// untouched columns keep holding against their stored values.
    pub async fn update_row(
        &self,
        actor: &User,
        database_name: &str,
        table_name: &str,
        key: &Map<String, Value>,
        changes: &Map<String, Value>,
    ) -> AppResult<Value> {
        self.access
            .require(actor, database_name, table_name, CrudAction::Write)
            .await?;

        let schema = self
            .introspector
            .describe_table(database_name, table_name)
            .await?;
        let key = key_values(&schema, key)?;
        let values = writable_values(&schema, changes)?;
        if values.is_empty() {
            return Err(AppError::Validation(
                "update carries no writable columns".to_owned(),
            ));
        }

        let Some(before) = self.records.find_row(&schema, &key).await? else {
            return Err(AppError::NotFound(format!(
                "no row in '{database_name}.{table_name}' matches the given key"
            )));
        };

        let merged = merge_record(&before, changes);
        self.validation
            .validate(database_name, table_name, &merged)
            .await?
            .into_result()?;

        let Some(stored) = self.records.update_row(&schema, values, key).await? else {
            // The row vanished between the read and the update.
            return Err(AppError::NotFound(format!(
                "no row in '{database_name}.{table_name}' matches the given key"
            )));
        };

        self.emit(AuditEvent {
            actor: actor.id(),
            action: AuditActionKind::RowUpdated,
            database_name: database_name.to_owned(),
            table_name: table_name.to_owned(),
            before: Some(before),
            after: Some(stored.clone()),
            row_count: 1,
            occurred_at: Utc::now(),
        })
        .await;

        Ok(stored)
    }

    /// Deletes the row matching the full primary key.
    pub async fn delete_row(
        &self,
        actor: &User,
        database_name: &str,
        table_name: &str,
        key: &Map<String, Value>,
    ) -> AppResult<()> {
        self.access
            .require(actor, database_name, table_name, CrudAction::Delete)
            .await?;

        let schema = self
            .introspector
            .describe_table(database_name, table_name)
            .await?;
        let key = key_values(&schema, key)?;

        let before = self.records.find_row(&schema, &key).await?;
        let removed = self.records.delete_row(&schema, key).await?;
        if removed == 0 {
            return Err(AppError::NotFound(format!(
                "no row in '{database_name}.{table_name}' matches the given key"
            )));
        }

        self.emit(AuditEvent {
            actor: actor.id(),
            action: AuditActionKind::RowDeleted,
            database_name: database_name.to_owned(),
            table_name: table_name.to_owned(),
            before,
            after: None,
            row_count: removed,
            occurred_at: Utc::now(),
        })
        .await;

        Ok(())
    }

    /// Deletes a batch of keyed rows atomically and returns the number of
    /// rows removed. Either every targeted row is removed or none are.
    ///
    /// Repeated keys in the batch are collapsed before execution; a key
    /// deleted once would otherwise match nothing on its second pass and
    /// abort the whole batch.
    pub async fn delete_rows(
        &self,
        actor: &User,
        database_name: &str,
        table_name: &str,
        keys: &[Map<String, Value>],
    ) -> AppResult<u64> {
        self.access
            .require(actor, database_name, table_name, CrudAction::Delete)
            .await?;

        if keys.is_empty() {
            return Err(AppError::Validation(
                "bulk delete requires at least one key".to_owned(),
            ));
        }

        let schema = self
            .introspector
            .describe_table(database_name, table_name)
            .await?;
        let keys: Vec<KeyValues> = keys
            .iter()
            .map(|key| key_values(&schema, key))
            .collect::<AppResult<_>>()?;
        let mut distinct: Vec<KeyValues> = Vec::with_capacity(keys.len());
        for key in keys {
            if !distinct.contains(&key) {
                distinct.push(key);
            }
        }

        let removed = self.records.delete_rows(&schema, distinct).await?;

        self.emit(AuditEvent {
            actor: actor.id(),
            action: AuditActionKind::RowsBulkDeleted,
            database_name: database_name.to_owned(),
            table_name: table_name.to_owned(),
            before: None,
            after: None,
            row_count: removed,
            occurred_at: Utc::now(),
        })
        .await;

        Ok(removed)
    }

    fn clamp_limit(&self, limit: Option<usize>) -> usize {
        match limit {
            None | Some(0) => self.config.default_page_size(),
            Some(requested) => requested.min(self.config.max_page_size()),
        }
    }

    async fn emit(&self, event: AuditEvent) {
        if let Err(error) = self.audit.emit(event).await {
            tracing::warn!(%error, "audit sink rejected row event");
        }
    }
}

/// Converts a caller-supplied key object into bindable primary-key values.
///
/// The key must value every primary-key column exactly once, with nothing
/// else and no nulls; anything short of that is an `InvalidKey`.
fn key_values(schema: &TableSchema, key: &Map<String, Value>) -> AppResult<KeyValues> {
    let primary_keys = schema.primary_keys();
    if primary_keys.is_empty() {
        return Err(AppError::InvalidKey(format!(
            "table '{}' has no primary key",
            schema.table()
        )));
    }

    let mut values = Vec::with_capacity(primary_keys.len());
    for name in &primary_keys {
        let Some(value) = key.get(*name) else {
            return Err(AppError::InvalidKey(format!(
                "key is missing primary-key column '{name}'"
            )));
        };
        if value.is_null() {
            return Err(AppError::InvalidKey(format!(
                "primary-key column '{name}' must not be null"
            )));
        }
        let Some(column) = schema.column(name) else {
            return Err(AppError::InvalidKey(format!(
                "primary-key column '{name}' is missing from the schema"
            )));
        };
        values.push(ColumnValue {
            name: (*name).to_owned(),
            class: column.class(),
            value: value.clone(),
        });
    }

    for name in key.keys() {
        if !primary_keys.contains(&name.as_str()) {
            return Err(AppError::InvalidKey(format!(
                "'{name}' is not a primary-key column"
            )));
        }
    }

    Ok(values)
}

/// Converts a caller record into bindable values for insert or update.
///
/// Unknown columns fail the request; identity columns are dropped since the
/// engine assigns them.
fn writable_values(
    schema: &TableSchema,
    record: &Map<String, Value>,
) -> AppResult<Vec<ColumnValue>> {
    let mut values = Vec::with_capacity(record.len());
    for (name, value) in record {
        let Some(column) = schema.column(name) else {
            return Err(AppError::UnknownColumn(format!(
                "column '{name}' does not exist in '{}'",
                schema.table()
            )));
        };
        if column.is_identity() {
            continue;
        }
        values.push(ColumnValue {
            name: name.clone(),
            class: column.class(),
            value: value.clone(),
        });
    }
    Ok(values)
}

fn merge_record(before: &Value, changes: &Map<String, Value>) -> Map<String, Value> {
    let mut merged = match before {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    };
    for (name, value) in changes {
        merged.insert(name.clone(), value.clone());
    }
    merged
}
