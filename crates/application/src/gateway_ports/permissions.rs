use async_trait::async_trait;
use gridgate_core::{AppResult, UserId};
use gridgate_domain::{DatabasePermission, TablePermission, User};

/// Repository port for users and permission grant rows.
#[async_trait]
pub trait PermissionRepository: Send + Sync {
    /// Looks up one user by identifier.
    async fn find_user(&self, user_id: UserId) -> AppResult<Option<User>>;

    /// Looks up the table-level grant for one (user, database, table).
    async fn find_table_permission(
        &self,
        user_id: UserId,
        database_name: &str,
        table_name: &str,
    ) -> AppResult<Option<TablePermission>>;

    /// Looks up the database-level grant for one (user, database).
    async fn find_database_permission(
        &self,
        user_id: UserId,
        database_name: &str,
    ) -> AppResult<Option<DatabasePermission>>;

    /// Lists every table-level grant a user holds inside one database.
    async fn list_table_permissions(
        &self,
        user_id: UserId,
        database_name: &str,
    ) -> AppResult<Vec<TablePermission>>;

    /// Creates or replaces a database-level grant.
    async fn upsert_database_permission(&self, permission: DatabasePermission) -> AppResult<()>;

    /// Creates or replaces a table-level grant.
    async fn upsert_table_permission(&self, permission: TablePermission) -> AppResult<()>;

    /// Removes a database-level grant, revoking blanket access.
    async fn delete_database_permission(
        &self,
        user_id: UserId,
        database_name: &str,
    ) -> AppResult<()>;

    /// Removes a table-level grant.
    async fn delete_table_permission(
        &self,
        user_id: UserId,
        database_name: &str,
        table_name: &str,
    ) -> AppResult<()>;
}
