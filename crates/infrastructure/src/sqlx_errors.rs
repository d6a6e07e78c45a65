use gridgate_core::{AppError, ConstraintKind};

/// Maps a driver error onto the application's error taxonomy.
///
/// Engine-reported constraint violations keep their SQLSTATE-derived subtype
/// so callers can distinguish, say, a duplicate key from a broken reference
/// without parsing driver messages.
pub(crate) fn map_sqlx_error(context: &str, error: sqlx::Error) -> AppError {
    match &error {
        sqlx::Error::Database(database_error) => {
            let message = database_error.message().to_owned();
            match database_error.code().as_deref() {
                Some("23505") => AppError::ConstraintViolation {
                    kind: ConstraintKind::Unique,
                    message,
                },
                Some("23514") => AppError::ConstraintViolation {
                    kind: ConstraintKind::Check,
                    message,
                },
                Some("23502") => AppError::ConstraintViolation {
                    kind: ConstraintKind::NotNull,
                    message,
                },
                Some("23503") => AppError::ConstraintViolation {
                    kind: ConstraintKind::ForeignKey,
                    message,
                },
                Some("22001") => AppError::ConstraintViolation {
                    kind: ConstraintKind::Length,
                    message,
                },
                Some("22P02") | Some("22007") | Some("22008") | Some("42804") => {
                    AppError::ConstraintViolation {
                        kind: ConstraintKind::DataType,
                        message,
                    }
                }
                _ => AppError::Internal(format!("{context}: {error}")),
            }
        }
        sqlx::Error::PoolTimedOut => {
            AppError::ResourceExhausted(format!("{context}: connection pool timed out"))
        }
        sqlx::Error::RowNotFound => AppError::NotFound(context.to_owned()),
        _ => AppError::Internal(format!("{context}: {error}")),
    }
}

/// Quotes a catalog-sourced name for use as an SQL identifier.
///
/// Names passed here always come from introspected schemas or validated
/// configuration, never raw caller input; quoting guards against reserved
/// words and unusual casing, not against hostile values.
pub(crate) fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
