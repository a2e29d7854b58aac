//! Storage traits for the record store abstraction.
//!
//! The engine never issues raw queries against a backend; all access goes
//! through this typed interface. Implementations must be thread-safe
//! (`Send + Sync`).

use async_trait::async_trait;
use serde_json::{Map, Value};
use tessella_core::Record;

use crate::error::StorageError;
use crate::query::RecordQuery;

/// The document store collaborator for CRM records.
///
/// # Example
///
/// ```ignore
/// use tessella_storage::{RecordStore, StorageError};
///
/// async fn fetch(store: &dyn RecordStore, id: &str) -> Result<tessella_core::Record, StorageError> {
///     store
///         .get("ws-1", "leads", id)
///         .await?
///         .ok_or_else(|| StorageError::not_found("leads", id))
/// }
/// ```
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Inserts a new record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::AlreadyExists` if a record with the same ID
    /// exists in the (workspace, entity) scope.
    async fn insert(&self, record: Record) -> Result<Record, StorageError>;

    /// Reads a record by ID. Returns `None` if it does not exist.
    async fn get(
        &self,
        workspace_id: &str,
        entity_id: &str,
        id: &str,
    ) -> Result<Option<Record>, StorageError>;

    /// Merges a validated partial payload into the record's `data` and bumps
    /// `updated_at`. The merge must be atomic: concurrent merges touching
    /// different fields both persist.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the record does not exist.
    async fn merge(
        &self,
        workspace_id: &str,
        entity_id: &str,
        id: &str,
        partial: Map<String, Value>,
    ) -> Result<Record, StorageError>;

    /// Sets the archived flag (soft delete / restore).
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the record does not exist.
    async fn set_archived(
        &self,
        workspace_id: &str,
        entity_id: &str,
        id: &str,
        archived: bool,
    ) -> Result<Record, StorageError>;

    /// Hard-deletes a record. Irreversible.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the record does not exist.
    async fn delete(
        &self,
        workspace_id: &str,
        entity_id: &str,
        id: &str,
    ) -> Result<(), StorageError>;

    /// Runs a translated query and returns the matching page plus the total
    /// match count before pagination.
    async fn query(
        &self,
        workspace_id: &str,
        entity_id: &str,
        query: &RecordQuery,
    ) -> Result<(Vec<Record>, usize), StorageError>;
}
