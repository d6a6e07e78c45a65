use std::collections::HashSet;

use gridgate_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

/// A (database, table) pair addressed by the generic surface.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableRef {
    database_name: NonEmptyString,
    table_name: NonEmptyString,
}

impl TableRef {
    /// Creates a validated table reference.
    pub fn new(database_name: impl Into<String>, table_name: impl Into<String>) -> AppResult<Self> {
        Ok(Self {
            database_name: NonEmptyString::new(database_name)?,
            table_name: NonEmptyString::new(table_name)?,
        })
    }

    /// Returns the database name.
    #[must_use]
    pub fn database_name(&self) -> &NonEmptyString {
        &self.database_name
    }

    /// Returns the table name.
    #[must_use]
    pub fn table_name(&self) -> &NonEmptyString {
        &self.table_name
    }
}

impl std::fmt::Display for TableRef {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}.{}", self.database_name, self.table_name)
    }
}

/// Coarse value family derived from a catalog data type.
///
/// Used to pick value coercions for validation and statement binding; the
/// raw catalog type string is kept alongside for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnClass {
    /// Integer or decimal column.
    Numeric,
    /// Character or text column.
    Text,
    /// Date-only column.
    Date,
    /// Date-time column.
    Timestamp,
    /// Boolean column.
    Boolean,
    /// Any other catalog type (json, bytea, arrays, ...).
    Other,
}

impl ColumnClass {
    /// Classifies a catalog `data_type` string.
    #[must_use]
    pub fn from_data_type(data_type: &str) -> Self {
        let normalized = data_type.to_ascii_lowercase();
        match normalized.as_str() {
            "smallint" | "integer" | "bigint" | "numeric" | "decimal" | "real"
            | "double precision" | "money" => Self::Numeric,
            "character varying" | "character" | "varchar" | "char" | "text" | "citext"
            | "uuid" => Self::Text,
            "date" => Self::Date,
            "boolean" => Self::Boolean,
            _ if normalized.starts_with("timestamp") || normalized.starts_with("time") => {
                Self::Timestamp
            }
            _ => Self::Other,
        }
    }
}

/// One column discovered from catalog metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    name: NonEmptyString,
    data_type: NonEmptyString,
    nullable: bool,
    is_identity: bool,
    is_primary_key: bool,
    max_length: Option<i32>,
}

impl ColumnSchema {
    /// Creates a validated column description.
    pub fn new(
        name: impl Into<String>,
        data_type: impl Into<String>,
        nullable: bool,
        is_identity: bool,
        is_primary_key: bool,
        max_length: Option<i32>,
    ) -> AppResult<Self> {
        Ok(Self {
            name: NonEmptyString::new(name)?,
            data_type: NonEmptyString::new(data_type)?,
            nullable,
            is_identity,
            is_primary_key,
            max_length,
        })
    }

    /// Returns the column name.
    #[must_use]
    pub fn name(&self) -> &NonEmptyString {
        &self.name
    }

    /// Returns the raw catalog data type.
    #[must_use]
    pub fn data_type(&self) -> &NonEmptyString {
        &self.data_type
    }

    /// Returns the coarse value family for the column.
    #[must_use]
    pub fn class(&self) -> ColumnClass {
        ColumnClass::from_data_type(self.data_type.as_str())
    }

    /// Returns whether the column accepts null.
    #[must_use]
    pub fn nullable(&self) -> bool {
        self.nullable
    }

    /// Returns whether the engine assigns the column's value.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.is_identity
    }

    /// Returns whether the column is part of the primary key.
    #[must_use]
    pub fn is_primary_key(&self) -> bool {
        self.is_primary_key
    }

    /// Returns the declared maximum character length, when any.
    #[must_use]
    pub fn max_length(&self) -> Option<i32> {
        self.max_length
    }
}

/// Catalog snapshot for one table, taken at request time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    table: TableRef,
    columns: Vec<ColumnSchema>,
}

impl TableSchema {
    /// Creates a schema snapshot with invariant checks.
    pub fn new(table: TableRef, columns: Vec<ColumnSchema>) -> AppResult<Self> {
        if columns.is_empty() {
            return Err(AppError::SchemaNotFound(format!(
                "table '{table}' has no columns in the catalog"
            )));
        }

        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name().as_str().to_owned()) {
                return Err(AppError::Internal(format!(
                    "duplicate column '{}' in catalog snapshot for '{table}'",
                    column.name().as_str()
                )));
            }
        }

        Ok(Self { table, columns })
    }

    /// Returns the table reference.
    #[must_use]
    pub fn table(&self) -> &TableRef {
        &self.table
    }

    /// Returns all discovered columns.
    #[must_use]
    pub fn columns(&self) -> &[ColumnSchema] {
        &self.columns
    }

    /// Looks up one column by name, case-sensitively.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns
            .iter()
            .find(|column| column.name().as_str() == name)
    }

    /// Returns the primary-key column names in catalog order.
    #[must_use]
    pub fn primary_keys(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|column| column.is_primary_key())
            .map(|column| column.name().as_str())
            .collect()
    }

    /// Returns the columns a caller may supply on insert or update.
    #[must_use]
    pub fn writable_columns(&self) -> Vec<&ColumnSchema> {
        self.columns
            .iter()
            .filter(|column| !column.is_identity())
            .collect()
    }
}
