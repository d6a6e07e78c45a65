use std::str::FromStr;

use gridgate_core::{AppError, AppResult, NonEmptyString, UserId};
use serde::{Deserialize, Serialize};

/// Actions gated by the permission resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrudAction {
    /// List or fetch rows.
    Read,
    /// Update existing rows.
    Write,
    /// Delete rows.
    Delete,
    /// Insert new rows.
    Create,
}

impl CrudAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Delete => "delete",
            Self::Create => "create",
        }
    }

    /// Returns all known actions.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[CrudAction] = &[
            CrudAction::Read,
            CrudAction::Write,
            CrudAction::Delete,
            CrudAction::Create,
        ];

        ALL
    }
}

impl FromStr for CrudAction {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "read" => Ok(Self::Read),
            "write" => Ok(Self::Write),
            "delete" => Ok(Self::Delete),
            "create" => Ok(Self::Create),
            _ => Err(AppError::Validation(format!(
                "unknown crud action '{value}'"
            ))),
        }
    }
}

/// CRUD rights carried by one grant row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PermissionFlags {
    /// Read access.
    pub can_read: bool,
    /// Update access.
    pub can_write: bool,
    /// Delete access.
    pub can_delete: bool,
    /// Insert access.
    pub can_create: bool,
}

impl PermissionFlags {
    /// Returns whether the flags allow the provided action.
    #[must_use]
    pub fn allows(&self, action: CrudAction) -> bool {
        match action {
            CrudAction::Read => self.can_read,
            CrudAction::Write => self.can_write,
            CrudAction::Delete => self.can_delete,
            CrudAction::Create => self.can_create,
        }
    }

    /// Returns flags granting every action.
    #[must_use]
    pub fn full() -> Self {
        Self {
            can_read: true,
            can_write: true,
            can_delete: true,
            can_create: true,
        }
    }
}

/// Blanket grant covering every table in one database.
///
/// Unique per (user, database). Applies only when no [`TablePermission`]
/// exists for the exact table being accessed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabasePermission {
    user_id: UserId,
    database_name: NonEmptyString,
    flags: PermissionFlags,
}

impl DatabasePermission {
    /// Creates a validated database-level grant.
    pub fn new(
        user_id: UserId,
        database_name: impl Into<String>,
        flags: PermissionFlags,
    ) -> AppResult<Self> {
        Ok(Self {
            user_id,
            database_name: NonEmptyString::new(database_name)?,
            flags,
        })
    }

    /// Returns the grantee.
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the database the grant covers.
    #[must_use]
    pub fn database_name(&self) -> &NonEmptyString {
        &self.database_name
    }

    /// Returns the granted rights.
    #[must_use]
    pub fn flags(&self) -> PermissionFlags {
        self.flags
    }
}

/// Grant scoped to a single table.
///
/// When present, the row fully overrides the corresponding
/// [`DatabasePermission`] for that table; the two never merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TablePermission {
    user_id: UserId,
    database_name: NonEmptyString,
    table_name: NonEmptyString,
    flags: PermissionFlags,
}

impl TablePermission {
    /// Creates a validated table-level grant.
    pub fn new(
        user_id: UserId,
        database_name: impl Into<String>,
        table_name: impl Into<String>,
        flags: PermissionFlags,
    ) -> AppResult<Self> {
        Ok(Self {
            user_id,
            database_name: NonEmptyString::new(database_name)?,
            table_name: NonEmptyString::new(table_name)?,
            flags,
        })
    }

    /// Returns the grantee.
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the database containing the table.
    #[must_use]
    pub fn database_name(&self) -> &NonEmptyString {
        &self.database_name
    }

    /// Returns the table the grant covers.
    #[must_use]
    pub fn table_name(&self) -> &NonEmptyString {
        &self.table_name
    }

    /// Returns the granted rights.
    #[must_use]
    pub fn flags(&self) -> PermissionFlags {
        self.flags
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::{CrudAction, PermissionFlags};

    #[test]
    fn crud_action_roundtrip_storage_value() {
        for action in CrudAction::all() {
            let restored = CrudAction::from_str(action.as_str());
            assert!(restored.is_ok());
            assert_eq!(restored.unwrap_or(CrudAction::Read), *action);
        }
    }

    #[test]
    fn unknown_crud_action_is_rejected() {
        let parsed = CrudAction::from_str("truncate");
        assert!(parsed.is_err());
    }

    #[test]
    fn flags_gate_each_action_independently() {
        let flags = PermissionFlags {
            can_read: true,
            can_write: false,
            can_delete: false,
            can_create: true,
        };

        assert!(flags.allows(CrudAction::Read));
        assert!(!flags.allows(CrudAction::Write));
        assert!(!flags.allows(CrudAction::Delete));
        assert!(flags.allows(CrudAction::Create));
    }
}
