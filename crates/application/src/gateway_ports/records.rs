use async_trait::async_trait;
use gridgate_core::AppResult;
use gridgate_domain::{ColumnClass, TableSchema};
use serde_json::Value;

/// One column/value pair bound into a generated statement.
///
/// The column name is taken from an introspected [`TableSchema`], never from
/// caller input directly, so implementations may interpolate it as an
/// identifier after quoting. The value is always bound as a parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnValue {
    /// Whitelisted column name.
    pub name: String,
    /// Value family used to pick the bind cast.
    pub class: ColumnClass,
    /// JSON value to bind.
    pub value: Value,
}

/// Full primary-key valuation for one targeted row.
pub type KeyValues = Vec<ColumnValue>;

/// Pagination inputs for row listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowPageQuery {
    /// Maximum rows returned.
    pub limit: usize,
    /// Number of rows skipped for offset pagination.
    pub offset: usize,
}

/// One page of rows plus the table's total row count.
#[derive(Debug, Clone, PartialEq)]
pub struct RowPage {
    /// Rows as JSON objects keyed by column name.
    pub rows: Vec<Value>,
    /// Total rows in the table, ignoring pagination.
    pub total: u64,
}

/// Port executing parameterized statements against dynamically-named tables.
#[async_trait]
pub trait TableRecords: Send + Sync {
    /// Lists one page of rows ordered by primary key.
    async fn list_rows(&self, schema: &TableSchema, query: RowPageQuery) -> AppResult<RowPage>;

    /// Fetches a single row by its full primary key.
    async fn find_row(&self, schema: &TableSchema, key: &[ColumnValue])
    -> AppResult<Option<Value>>;

    /// Inserts one row and returns the stored row including engine-assigned
    /// identity values.
    async fn insert_row(&self, schema: &TableSchema, values: Vec<ColumnValue>)
    -> AppResult<Value>;

    /// Updates the row matching the full primary key; returns the stored row
    /// or `None` when no row matched.
    async fn update_row(
        &self,
        schema: &TableSchema,
        values: Vec<ColumnValue>,
        key: KeyValues,
    ) -> AppResult<Option<Value>>;

    /// Deletes the row matching the full primary key; returns the affected
    /// row count.
    async fn delete_row(&self, schema: &TableSchema, key: KeyValues) -> AppResult<u64>;

    /// Deletes every keyed row inside one transaction; all targeted rows are
    /// removed or none are. Returns the number of rows actually removed.
    async fn delete_rows(&self, schema: &TableSchema, keys: Vec<KeyValues>) -> AppResult<u64>;
}
