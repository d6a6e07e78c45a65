use async_trait::async_trait;
use gridgate_application::gateway_ports::PermissionRepository;
use gridgate_core::{AppResult, UserId};
use gridgate_domain::{DatabasePermission, PermissionFlags, TablePermission, User};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::sqlx_errors::map_sqlx_error;


/// PostgreSQL-backed store for users and permission grants.
#[derive(Clone)]
pub struct PostgresPermissionRepository {
    pool: PgPool,
}

impl PostgresPermissionRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    is_admin: bool,
    is_active: bool,
}

#[derive(Debug, FromRow)]
struct DatabasePermissionRow {
    user_id: Uuid,
    database_name: String,
    can_read: bool,
    can_write: bool,
    can_delete: bool,
    can_create: bool,
}

#[derive(Debug, FromRow)]
struct TablePermissionRow {
    user_id: Uuid,
    database_name: String,
    table_name: String,
    can_read: bool,
    can_write: bool,
    can_delete: bool,
    can_create: bool,
}

impl DatabasePermissionRow {
    fn into_domain(self) -> AppResult<DatabasePermission> {
        DatabasePermission::new(
            UserId::from_uuid(self.user_id),
            self.database_name,
            PermissionFlags {
                can_read: self.can_read,
                can_write: self.can_write,
                can_delete: self.can_delete,
                can_create: self.can_create,
            },
        )
    }
}

impl TablePermissionRow {
    fn into_domain(self) -> AppResult<TablePermission> {
        TablePermission::new(
            UserId::from_uuid(self.user_id),
            self.database_name,
            self.table_name,
            PermissionFlags {
                can_read: self.can_read,
                can_write: self.can_write,
                can_delete: self.can_delete,
                can_create: self.can_create,
            },
        )
    }
}

#[async_trait]
impl PermissionRepository for PostgresPermissionRepository {
    async fn find_user(&self, user_id: UserId) -> AppResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            SELECT id, username, is_admin, is_active
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| map_sqlx_error("failed to look up user", error))?;

        row.map(|row| {
            User::new(
                UserId::from_uuid(row.id),
                row.username,
                row.is_admin,
                row.is_active,
            )
        })
        .transpose()
    }

    async fn find_table_permission(
        &self,
        user_id: UserId,
        database_name: &str,
        table_name: &str,
    ) -> AppResult<Option<TablePermission>> {
        let row: Option<TablePermissionRow> = sqlx::query_as(
            r#"
            SELECT user_id, database_name, table_name,
                   can_read, can_write, can_delete, can_create
            FROM table_permissions
            WHERE user_id = $1 AND database_name = $2 AND table_name = $3
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(database_name)
        .bind(table_name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| map_sqlx_error("failed to look up table permission", error))?;

        row.map(TablePermissionRow::into_domain).transpose()
    }

    async fn find_database_permission(
        &self,
        user_id: UserId,
        database_name: &str,
    ) -> AppResult<Option<DatabasePermission>> {
        let row: Option<DatabasePermissionRow> = sqlx::query_as(
            r#"
            SELECT user_id, database_name,
                   can_read, can_write, can_delete, can_create
            FROM database_permissions
            WHERE user_id = $1 AND database_name = $2
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(database_name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| map_sqlx_error("failed to look up database permission", error))?;

        row.map(DatabasePermissionRow::into_domain).transpose()
    }

    async fn list_table_permissions(
        &self,
        user_id: UserId,
        database_name: &str,
    ) -> AppResult<Vec<TablePermission>> {
        let rows: Vec<TablePermissionRow> = sqlx::query_as(
            r#"
            SELECT user_id, database_name, table_name,
                   can_read, can_write, can_delete, can_create
            FROM table_permissions
            WHERE user_id = $1 AND database_name = $2
            ORDER BY table_name
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(database_name)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| map_sqlx_error("failed to list table permissions", error))?;

        rows.into_iter()
            .map(TablePermissionRow::into_domain)
            .collect()
    }

    async fn upsert_database_permission(&self, permission: DatabasePermission) -> AppResult<()> {
        let flags = permission.flags();
        sqlx::query(
            r#"
            INSERT INTO database_permissions
                (user_id, database_name, can_read, can_write, can_delete, can_create)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_id, database_name) DO UPDATE SET
                can_read = EXCLUDED.can_read,
                can_write = EXCLUDED.can_write,
                can_delete = EXCLUDED.can_delete,
                can_create = EXCLUDED.can_create
            "#,
        )
        .bind(permission.user_id().as_uuid())
        .bind(permission.database_name().as_str())
        .bind(flags.can_read)
        .bind(flags.can_write)
        .bind(flags.can_delete)
        .bind(flags.can_create)
        .execute(&self.pool)
        .await
        .map_err(|error| map_sqlx_error("failed to upsert database permission", error))?;

        Ok(())
    }

    async fn upsert_table_permission(&self, permission: TablePermission) -> AppResult<()> {
        let flags = permission.flags();
        sqlx::query(
            r#"
            INSERT INTO table_permissions
                (user_id, database_name, table_name,
                 can_read, can_write, can_delete, can_create)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (user_id, database_name, table_name) DO UPDATE SET
                can_read = EXCLUDED.can_read,
                can_write = EXCLUDED.can_write,
                can_delete = EXCLUDED.can_delete,
                can_create = EXCLUDED.can_create
            "#,
        )
        .bind(permission.user_id().as_uuid())
        .bind(permission.database_name().as_str())
        .bind(permission.table_name().as_str())
        .bind(flags.can_read)
        .bind(flags.can_write)
        .bind(flags.can_delete)
        .bind(flags.can_create)
        .execute(&self.pool)
        .await
        .map_err(|error| map_sqlx_error("failed to upsert table permission", error))?;

        Ok(())
    }

    async fn delete_database_permission(
        &self,
        user_id: UserId,
        database_name: &str,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            DELETE FROM database_permissions
            WHERE user_id = $1 AND database_name = $2
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(database_name)
        .execute(&self.pool)
        .await
        .map_err(|error| map_sqlx_error("failed to delete database permission", error))?;

        Ok(())
    }

    async fn delete_table_permission(
        &self,
        user_id: UserId,
        database_name: &str,
        table_name: &str,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            DELETE FROM table_permissions
            WHERE user_id = $1 AND database_name = $2 AND table_name = $3
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(database_name)
        .bind(table_name)
        .execute(&self.pool)
        .await
        .map_err(|error| map_sqlx_error("failed to delete table permission", error))?;

        Ok(())
    }
}
