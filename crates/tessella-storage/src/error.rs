//! Error types for the record storage abstraction.

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The requested record was not found.
    #[error("Record not found: {entity_id}/{id}")]
    NotFound {
        /// The entity the record belongs to.
        entity_id: String,
        /// The ID of the record that was not found.
        id: String,
    },

    /// Attempted to insert a record that already exists.
    #[error("Record already exists: {entity_id}/{id}")]
    AlreadyExists { entity_id: String, id: String },

    /// The query parameters were invalid for this backend.
    #[error("Invalid query: {message}")]
    InvalidQuery { message: String },

    /// An internal storage error occurred.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl StorageError {
    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(entity_id: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_id: entity_id.into(),
            id: id.into(),
        }
    }

    /// Creates a new `AlreadyExists` error.
    #[must_use]
    pub fn already_exists(entity_id: impl Into<String>, id: impl Into<String>) -> Self {
        Self::AlreadyExists {
            entity_id: entity_id.into(),
            id: id.into(),
        }
    }

    /// Creates a new `InvalidQuery` error.
    #[must_use]
    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::InvalidQuery {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this error indicates a missing record.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
