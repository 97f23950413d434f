//! Database error types.

use thiserror::Error;

/// Errors that can occur during database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// SQLx error (connection, query, etc.)
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Migration error
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Record not found
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Record already exists
    #[error("{entity} already exists: {id}")]
    AlreadyExists { entity: &'static str, id: String },

    /// The user's daily quota is exhausted.
    #[error("daily quota exhausted for user {0}")]
    QuotaExhausted(i64),

    /// A stored enum value is outside its closed set.
    #[error("corrupt stored value: {0}")]
    CorruptValue(String),
}

/// Result type for database operations.
pub type Result<T> = std::result::Result<T, DatabaseError>;

impl DatabaseError {
    /// Map a unique-constraint violation into `AlreadyExists`.
    pub(crate) fn from_insert(e: sqlx::Error, entity: &'static str, id: String) -> Self {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists { entity, id };
            }
        }
        DatabaseError::Sqlx(e)
    }
}
