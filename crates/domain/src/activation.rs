use gridgate_core::{AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

use crate::TableRef;

/// A (database, table) pair enabled for the condition-validated surface.
///
/// Activation governs discoverability and validation ownership, not raw
/// access: per-table CRUD remains reachable by permission alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivatedTable {
    table: TableRef,
    description: NonEmptyString,
    is_active: bool,
}

impl ActivatedTable {
    /// Creates a validated activation record.
    pub fn new(table: TableRef, description: impl Into<String>, is_active: bool) -> AppResult<Self> {
        Ok(Self {
            table,
            description: NonEmptyString::new(description)?,
            is_active,
        })
    }

    /// Returns the activated table reference.
    #[must_use]
    pub fn table(&self) -> &TableRef {
        &self.table
    }

    /// Returns the human-readable description.
    #[must_use]
    pub fn description(&self) -> &NonEmptyString {
        &self.description
    }

    /// Returns whether the activation is currently in force.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active
    }
}

#[cfg(test)]
mod tests {
    use crate::TableRef;

    use super::ActivatedTable;

    #[test]
    fn activation_requires_description() {
        let table = TableRef::new("hr", "employees").unwrap_or_else(|_| unreachable!());
        let result = ActivatedTable::new(table, "", true);
        assert!(result.is_err());
    }
}
