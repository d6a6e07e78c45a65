//! Shared primitives for all Rust crates in Gridgate.

#![forbid(unsafe_code)]

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Result type used across Gridgate crates.
pub type AppResult<T> = Result<T, AppError>;

/// A validated non-empty UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Creates a validated non-empty string.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "value must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

impl Display for NonEmptyString {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Stable identifier for an application user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    /// Creates a random user identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a user identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for UserId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// One field-scoped validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Column the failure applies to.
    pub field: String,
    /// Human-readable failure message.
    pub message: String,
}

impl FieldError {
    /// Creates a field error.
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Full per-field error list carried by a rejected mutation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl Display for ValidationErrors {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for error in &self.0 {
            if !first {
                write!(formatter, "; ")?;
            }
            write!(formatter, "{}: {}", error.field, error.message)?;
            first = false;
        }

        Ok(())
    }
}

/// Subtype of an engine-reported constraint violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    /// Check constraint rejected the row.
    Check,
    /// Non-nullable column received a null value.
    NotNull,
    /// Foreign-key constraint rejected the mutation.
    ForeignKey,
    /// Unique constraint rejected the row.
    Unique,
    /// Value exceeded the column's declared length.
    Length,
    /// Value could not be coerced to the column's data type.
    DataType,
}

impl ConstraintKind {
    /// Returns a stable storage value for this kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Check => "check",
            Self::NotNull => "not_null",
            Self::ForeignKey => "foreign_key",
            Self::Unique => "unique",
            Self::Length => "length",
            Self::DataType => "data_type",
        }
    }
}

/// Common application error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// Actor lacks the right to perform the requested action.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Requested table does not exist in the target database's catalog.
    #[error("schema not found: {0}")]
    SchemaNotFound(String),

    /// Record references a column absent from the introspected schema.
    #[error("unknown column: {0}")]
    UnknownColumn(String),

    /// Primary-key values are missing, partial, or name non-key columns.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// Condition engine rejected the record; carries the full error list.
    #[error("validation failed: {0}")]
    ValidationFailed(ValidationErrors),

    /// Underlying engine rejected the statement at execution time.
    #[error("constraint violation ({}): {message}", kind.as_str())]
    ConstraintViolation {
        /// Violation subtype derived from the engine's native error code.
        kind: ConstraintKind,
        /// Structured description of the violation.
        message: String,
    },

    /// Connection pool exhausted or acquisition timed out.
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::{AppError, ConstraintKind, FieldError, NonEmptyString, UserId, ValidationErrors};

    #[test]
    fn non_empty_string_rejects_whitespace() {
        let result = NonEmptyString::new("   ");
        assert!(result.is_err());
    }

    #[test]
    fn user_id_formats_as_uuid() {
        let user_id = UserId::new();
        assert_eq!(user_id.to_string().len(), 36);
    }

    #[test]
    fn validation_errors_join_field_messages() {
        let errors = ValidationErrors(vec![
            FieldError::new("Name", "value is required"),
            FieldError::new("Salary", "value is below minimum"),
        ]);

        assert_eq!(
            errors.to_string(),
            "Name: value is required; Salary: value is below minimum"
        );
    }

    #[test]
    fn constraint_violation_display_names_kind() {
        let error = AppError::ConstraintViolation {
            kind: ConstraintKind::ForeignKey,
            message: "row is still referenced".to_owned(),
        };

        assert!(error.to_string().contains("foreign_key"));
    }
}
