use std::collections::BTreeSet;
use std::sync::Arc;

use gridgate_core::{AppError, AppResult, UserId};
use gridgate_domain::{CrudAction, User};

use crate::GatewayConfig;
use crate::gateway_ports::{PermissionRepository, SchemaIntrospector};

/// Outcome of a permission resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    /// The action may proceed.
    Allow,
    /// The action is rejected for the carried reason.
    Deny(String),
}

impl AccessDecision {
    /// Returns whether the decision allows the action.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Application service resolving CRUD rights for a user on a table.
///
/// Precedence is strict: a table-level grant fully overrides the database
/// grant for that exact table (never merging with it), a database grant
/// covers tables without a table grant, and everything else is denied.
/// Admins bypass grant rows but remain bounded by the database allow-list.
#[derive(Clone)]
pub struct AccessService {
    repository: Arc<dyn PermissionRepository>,
    introspector: Arc<dyn SchemaIntrospector>,
    config: GatewayConfig,
}

impl AccessService {
    /// Creates a new access service from a permission repository.
    #[must_use]
    pub fn new(
        repository: Arc<dyn PermissionRepository>,
        introspector: Arc<dyn SchemaIntrospector>,
        config: GatewayConfig,
    ) -> Self {
        Self {
            repository,
            introspector,
            config,
        }
    }

    /// Loads the user projection backing an actor identifier.
    pub async fn load_user(&self, user_id: UserId) -> AppResult<User> {
        self.repository
            .find_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user '{user_id}' does not exist")))
    }

    /// Resolves whether the user may perform the action on the table.
    pub async fn resolve(
        &self,
        user: &User,
        database_name: &str,
        table_name: &str,
        action: CrudAction,
    ) -> AppResult<AccessDecision> {
        if !user.is_active() {
            return Ok(AccessDecision::Deny(format!(
                "user '{}' is deactivated",
                user.username()
            )));
        }

        if !self.config.is_database_allowed(database_name) {
            return Ok(AccessDecision::Deny(format!(
                "database '{database_name}' is not exposed through the generic surface"
            )));
        }

        if user.is_admin() {
            return Ok(AccessDecision::Allow);
        }

        if let Some(table_permission) = self
            .repository
            .find_table_permission(user.id(), database_name, table_name)
            .await?
        {
            // Table grants never fall through to the database grant.
            return Ok(Self::decision_from_flags(
                table_permission.flags().allows(action),
                user,
                database_name,
                table_name,
                action,
            ));
        }

        if let Some(database_permission) = self
            .repository
            .find_database_permission(user.id(), database_name)
            .await?
        {
            return Ok(Self::decision_from_flags(
                database_permission.flags().allows(action),
                user,
                database_name,
                table_name,
                action,
            ));
        }

        Ok(AccessDecision::Deny(format!(
            "user '{}' holds no grant for '{database_name}.{table_name}'",
            user.username()
        )))
    }

    /// Ensures the user may perform the action, failing with
    /// `PermissionDenied` otherwise.
    pub async fn require(
        &self,
        user: &User,
        database_name: &str,
        table_name: &str,
        action: CrudAction,
    ) -> AppResult<()> {
        match self
            .resolve(user, database_name, table_name, action)
            .await?
        {
            AccessDecision::Allow => Ok(()),
            AccessDecision::Deny(reason) => Err(AppError::PermissionDenied(reason)),
        }
    }

    /// Lists the tables the user may enumerate inside one database.
    ///
    /// The result is the union of tables named by the user's table-level
    /// grants (with at least one right set) and, when a database-level grant
    /// allows read, every table in the database's catalog. Admins see the
    /// full catalog. Databases outside the allow-list yield an empty list.
    pub async fn list_accessible_tables(
        &self,
        user: &User,
        database_name: &str,
    ) -> AppResult<Vec<String>> {
        if !user.is_active() || !self.config.is_database_allowed(database_name) {
            return Ok(Vec::new());
        }

        if user.is_admin() {
            let mut tables = self.introspector.list_tables(database_name).await?;
            tables.sort();
            return Ok(tables);
        }

        let mut accessible = BTreeSet::new();

        for permission in self
            .repository
            .list_table_permissions(user.id(), database_name)
            .await?
        {
            let flags = permission.flags();
            if flags.can_read || flags.can_write || flags.can_delete || flags.can_create {
                accessible.insert(permission.table_name().as_str().to_owned());
            }
        }

        if let Some(database_permission) = self
            .repository
            .find_database_permission(user.id(), database_name)
            .await?
            && database_permission.flags().can_read
        {
            accessible.extend(self.introspector.list_tables(database_name).await?);
        }

        Ok(accessible.into_iter().collect())
    }

    fn decision_from_flags(
        allowed: bool,
        user: &User,
        database_name: &str,
        table_name: &str,
        action: CrudAction,
    ) -> AccessDecision {
        if allowed {
            AccessDecision::Allow
        } else {
            AccessDecision::Deny(format!(
                "user '{}' may not {} '{database_name}.{table_name}'",
                user.username(),
                action.as_str()
            ))
        }
    }
}
