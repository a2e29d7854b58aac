use tessella_core::CoreError;
use tessella_storage::StorageError;
use thiserror::Error;

/// Errors raised by the automation engine and record service.
///
/// Only validation and not-found variants ever reach a mutation caller;
/// everything that happens inside a single action execution is caught at the
/// dispatch boundary and turned into an `error` execution log entry.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Entity not found: {workspace_id}/{entity_id}")]
    EntityNotFound {
        workspace_id: String,
        entity_id: String,
    },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Invalid action configuration: {0}")]
    InvalidActionConfig(String),

    #[error("No recipient email found")]
    RecipientNotFound,

    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Timed out: {0}")]
    Timeout(String),
}

impl EngineError {
    pub fn entity_not_found(workspace_id: impl Into<String>, entity_id: impl Into<String>) -> Self {
        Self::EntityNotFound {
            workspace_id: workspace_id.into(),
            entity_id: entity_id.into(),
        }
    }

    pub fn invalid_action_config(message: impl Into<String>) -> Self {
        Self::InvalidActionConfig(message.into())
    }

    pub fn send_failed(message: impl Into<String>) -> Self {
        Self::SendFailed(message.into())
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout(message.into())
    }

    /// True for validation failures that should surface the full field
    /// message list to the mutation caller.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Core(CoreError::Validation { .. }))
    }
}

/// Convenience result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
