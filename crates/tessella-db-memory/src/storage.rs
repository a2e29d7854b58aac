//! In-memory record store backed by a papaya lock-free map.
//!
//! This backend is the reference `RecordStore` implementation used by tests
//! and single-node deployments.

use async_trait::async_trait;
use papaya::HashMap as PapayaHashMap;
use serde_json::{Map, Value};
use std::sync::Arc;
use tessella_core::{Record, now_utc};
use tessella_storage::{RecordQuery, RecordStore, StorageError};
use tracing::debug;

use crate::query::run_query;

pub type StorageKey = String; // Format: "workspace_id/entity_id/id"

pub(crate) fn make_storage_key(workspace_id: &str, entity_id: &str, id: &str) -> StorageKey {
    format!("{workspace_id}/{entity_id}/{id}")
}

/// Lock-free in-memory store for CRM records.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    data: Arc<PapayaHashMap<StorageKey, Record>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            data: Arc::new(PapayaHashMap::new()),
        }
    }

    fn scan(&self, workspace_id: &str, entity_id: &str) -> Vec<Record> {
        let prefix = format!("{workspace_id}/{entity_id}/");
        let guard = self.data.pin();
        guard
            .iter()
            .filter(|(key, _)| key.starts_with(&prefix))
            .map(|(_, record)| record.clone())
            .collect()
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn insert(&self, record: Record) -> Result<Record, StorageError> {
        let key = make_storage_key(&record.workspace_id, &record.entity_id, &record.id);
        let guard = self.data.pin();
        if guard.try_insert(key, record.clone()).is_err() {
            return Err(StorageError::already_exists(&record.entity_id, &record.id));
        }
        debug!(record_id = %record.id, entity_id = %record.entity_id, "record inserted");
        Ok(record)
    }

    async fn get(
        &self,
        workspace_id: &str,
        entity_id: &str,
        id: &str,
    ) -> Result<Option<Record>, StorageError> {
        let key = make_storage_key(workspace_id, entity_id, id);
        let guard = self.data.pin();
        Ok(guard.get(&key).cloned())
    }

    async fn merge(
        &self,
        workspace_id: &str,
        entity_id: &str,
        id: &str,
        partial: Map<String, Value>,
    ) -> Result<Record, StorageError> {
        let key = make_storage_key(workspace_id, entity_id, id);
        let guard = self.data.pin();
        // papaya retries the closure on contention, so two merges touching
        // different fields both land.
        match guard.update(key, |current| {
            let mut updated = current.clone();
            updated.merge_data(partial.clone());
            updated
        }) {
            Some(updated) => Ok(updated.clone()),
            None => Err(StorageError::not_found(entity_id, id)),
        }
    }

    async fn set_archived(
        &self,
        workspace_id: &str,
        entity_id: &str,
        id: &str,
        archived: bool,
    ) -> Result<Record, StorageError> {
        let key = make_storage_key(workspace_id, entity_id, id);
        let guard = self.data.pin();
        let current = guard
            .get(&key)
            .ok_or_else(|| StorageError::not_found(entity_id, id))?;

        let mut updated = current.clone();
        updated.is_archived = archived;
        updated.updated_at = now_utc();
        guard.insert(key, updated.clone());
        Ok(updated)
    }

    async fn delete(
        &self,
        workspace_id: &str,
        entity_id: &str,
        id: &str,
    ) -> Result<(), StorageError> {
        let key = make_storage_key(workspace_id, entity_id, id);
        let guard = self.data.pin();
        if guard.remove(&key).is_none() {
            return Err(StorageError::not_found(entity_id, id));
        }
        debug!(record_id = %id, entity_id = %entity_id, "record hard-deleted");
        Ok(())
    }

    async fn query(
        &self,
        workspace_id: &str,
        entity_id: &str,
        query: &RecordQuery,
    ) -> Result<(Vec<Record>, usize), StorageError> {
        let records = self.scan(workspace_id, entity_id);
        Ok(run_query(records, query))
    }
}
