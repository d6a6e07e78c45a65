use async_trait::async_trait;
use gridgate_core::AppResult;
use gridgate_domain::TableSchema;

/// Port for read-only catalog metadata queries.
///
/// Results are derived purely from the engine's catalog and carry no
/// activation state. Implementations must not cache beyond a single
/// request, since schemas can change out-of-band through DDL.
#[async_trait]
pub trait SchemaIntrospector: Send + Sync {
    /// Describes one table's columns and primary keys.
    ///
    /// Fails with `SchemaNotFound` when the table is absent from the
    /// database's catalog.
    async fn describe_table(&self, database_name: &str, table_name: &str)
    -> AppResult<TableSchema>;

    /// Enumerates every base table in one database.
    async fn list_tables(&self, database_name: &str) -> AppResult<Vec<String>>;
}
