use thiserror::Error;

/// Core error types for Tessella operations
#[derive(Debug, Error)]
pub enum CoreError {
    /// One or more field-level validation failures. Always carries the full
    /// list so a client can fix every problem in one round trip.
    #[error("Validation failed: {}", messages.join("; "))]
    Validation { messages: Vec<String> },

    #[error("Invalid field name: {0}")]
    InvalidFieldName(String),

    #[error("Invalid entity definition: {0}")]
    InvalidEntity(String),

    #[error("Invalid datetime: {0}")]
    InvalidDateTime(String),

    #[error("Entity not found: {workspace_id}/{entity_id}")]
    EntityNotFound {
        workspace_id: String,
        entity_id: String,
    },

    #[error("Record not found: {entity_id}/{id}")]
    RecordNotFound { entity_id: String, id: String },

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Time parsing error: {0}")]
    TimeError(#[from] time::error::Parse),
}

impl CoreError {
    /// Create a new Validation error from a list of field messages.
    pub fn validation(messages: Vec<String>) -> Self {
        Self::Validation { messages }
    }

    /// Create a new InvalidFieldName error
    pub fn invalid_field_name(name: impl Into<String>) -> Self {
        Self::InvalidFieldName(name.into())
    }

    /// Create a new InvalidEntity error
    pub fn invalid_entity(message: impl Into<String>) -> Self {
        Self::InvalidEntity(message.into())
    }

    /// Create a new InvalidDateTime error
    pub fn invalid_date_time(value: impl Into<String>) -> Self {
        Self::InvalidDateTime(value.into())
    }

    /// Create a new EntityNotFound error
    pub fn entity_not_found(workspace_id: impl Into<String>, entity_id: impl Into<String>) -> Self {
        Self::EntityNotFound {
            workspace_id: workspace_id.into(),
            entity_id: entity_id.into(),
        }
    }

    /// Create a new RecordNotFound error
    pub fn record_not_found(entity_id: impl Into<String>, id: impl Into<String>) -> Self {
        Self::RecordNotFound {
            entity_id: entity_id.into(),
            id: id.into(),
        }
    }

    /// The field-level messages for a validation failure, empty otherwise.
    pub fn validation_messages(&self) -> &[String] {
        match self {
            Self::Validation { messages } => messages,
            _ => &[],
        }
    }

    /// Check if this error is a client error (4xx category)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. }
                | Self::InvalidFieldName(_)
                | Self::InvalidEntity(_)
                | Self::InvalidDateTime(_)
                | Self::EntityNotFound { .. }
                | Self::RecordNotFound { .. }
                | Self::JsonError(_)
        )
    }

    /// Get error category for logging/monitoring
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation { .. }
            | Self::InvalidFieldName(_)
            | Self::InvalidEntity(_)
            | Self::InvalidDateTime(_) => ErrorCategory::Validation,
            Self::EntityNotFound { .. } | Self::RecordNotFound { .. } => ErrorCategory::NotFound,
            Self::JsonError(_) => ErrorCategory::Serialization,
            Self::TimeError(_) => ErrorCategory::System,
        }
    }
}

/// Error categories for monitoring and classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    NotFound,
    Serialization,
    System,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::NotFound => write!(f, "not_found"),
            Self::Serialization => write!(f, "serialization"),
            Self::System => write!(f, "system"),
        }
    }
}

/// Convenience result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
