use std::collections::BTreeSet;

use gridgate_core::{AppError, AppResult, NonEmptyString};

/// Immutable deployment configuration for the gateway services.
///
/// Constructed once by the embedding application and passed in explicitly;
/// nothing in the gateway reads ambient global state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    allowed_databases: BTreeSet<String>,
    application_database: NonEmptyString,
    max_page_size: usize,
    default_page_size: usize,
}

impl GatewayConfig {
    /// Creates a validated configuration.
    ///
    /// The application database (which stores users, grants, activations and
    /// conditions) must never appear in the allow-list; the generic surface
    /// refuses to operate on it.
    pub fn new(
        allowed_databases: impl IntoIterator<Item = String>,
        application_database: impl Into<String>,
        max_page_size: usize,
        default_page_size: usize,
    ) -> AppResult<Self> {
        let application_database = NonEmptyString::new(application_database)?;
        let allowed_databases: BTreeSet<String> = allowed_databases.into_iter().collect();

        if allowed_databases.is_empty() {
            return Err(AppError::Validation(
                "database allow-list must not be empty".to_owned(),
            ));
        }

        if allowed_databases.contains(application_database.as_str()) {
            return Err(AppError::Validation(format!(
                "application database '{application_database}' must not appear in the allow-list"
            )));
        }

        if max_page_size == 0 || default_page_size == 0 {
            return Err(AppError::Validation(
                "page sizes must be greater than zero".to_owned(),
            ));
        }

        if default_page_size > max_page_size {
            return Err(AppError::Validation(
                "default page size must not exceed the maximum page size".to_owned(),
            ));
        }

        Ok(Self {
            allowed_databases,
            application_database,
            max_page_size,
            default_page_size,
        })
    }

    /// Returns whether the generic surface may operate on the database.
    #[must_use]
    pub fn is_database_allowed(&self, database_name: &str) -> bool {
        self.allowed_databases.contains(database_name)
    }

    /// Returns the database holding the gateway's own tables.
    #[must_use]
    pub fn application_database(&self) -> &NonEmptyString {
        &self.application_database
    }

    /// Returns the hard cap applied to list limits.
    #[must_use]
    pub fn max_page_size(&self) -> usize {
        self.max_page_size
    }

    /// Returns the limit substituted when a caller passes zero.
    #[must_use]
    pub fn default_page_size(&self) -> usize {
        self.default_page_size
    }
}
