//! Database-specific error types and conversions.

use clinic_core::error::ClinicError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Duplicate {entity}")]
    Duplicate { entity: String },

    /// A stored value could not be mapped back to the domain model.
    #[error("Invalid stored record: {0}")]
    InvalidRecord(String),
}

impl DbError {
    /// Classify a statement error returned by `Response::check`.
    ///
    /// Unique-index violations become [`DbError::Duplicate`].
    pub(crate) fn from_check(entity: &str, err: surrealdb::Error) -> Self {
        let message = err.to_string();
        if message.contains("already contains") {
            DbError::Duplicate {
                entity: entity.into(),
            }
        } else {
            DbError::Query(message)
        }
    }
}

impl From<DbError> for ClinicError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ClinicError::NotFound { entity, id },
            DbError::Duplicate { entity } => ClinicError::AlreadyExists { entity },
            other => ClinicError::Database(other.to_string()),
        }
    }
}
