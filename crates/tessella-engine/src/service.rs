//! Record mutation service: the validation write path plus automation
//! dispatch after each committed write.

use serde_json::{Map, Value};
use std::sync::Arc;
use tessella_core::{Record, ValidationMode, generate_id, validate_record_data};
use tessella_storage::{ListParams, Pagination, RecordPage, RecordStore};
use tracing::{debug, error, info};

use crate::engine::AutomationEngine;
use crate::error::{EngineError, Result};
use crate::stores::EntityStore;
use crate::types::TriggerType;

/// Coordinates validation, storage, and automation dispatch for record
/// mutations.
///
/// Automations run only after the write is committed; an automation failure
/// is logged by the engine and never rolls the write back.
pub struct RecordService {
    records: Arc<dyn RecordStore>,
    entities: Arc<dyn EntityStore>,
    engine: Arc<AutomationEngine>,
}

impl RecordService {
    pub fn new(
        records: Arc<dyn RecordStore>,
        entities: Arc<dyn EntityStore>,
        engine: Arc<AutomationEngine>,
    ) -> Self {
        Self {
            records,
            entities,
            engine,
        }
    }

    /// Validates and creates a record, then fires record_created automations.
    pub async fn create(
        &self,
        workspace_id: &str,
        entity_id: &str,
        payload: &Map<String, Value>,
        created_by: Option<&str>,
    ) -> Result<Record> {
        let entity = self
            .entities
            .get_entity(workspace_id, entity_id)
            .await?
            .ok_or_else(|| EngineError::entity_not_found(workspace_id, entity_id))?;

        let data = validate_record_data(&entity, payload, ValidationMode::Create)?;
        let mut record = Record::new(generate_id(), workspace_id, entity_id, data);
        if let Some(user) = created_by {
            record = record.with_created_by(user);
        }
        let record = self.records.insert(record).await?;
        info!(
            workspace_id = %workspace_id,
            entity_id = %entity_id,
            record_id = %record.id,
            "record created"
        );

        self.dispatch_after_commit(TriggerType::RecordCreated, record.clone(), None)
            .await;
        Ok(record)
    }

    /// Lists records with pagination metadata. Sort, filter and search
    /// parameters are translated against the entity's current schema.
    pub async fn list(
        &self,
        workspace_id: &str,
        entity_id: &str,
        params: &ListParams,
    ) -> Result<RecordPage> {
        let entity = self
            .entities
            .get_entity(workspace_id, entity_id)
            .await?
            .ok_or_else(|| EngineError::entity_not_found(workspace_id, entity_id))?;

        let query = params.to_query(&entity);
        let (records, total) = self.records.query(workspace_id, entity_id, &query).await?;
        Ok(RecordPage {
            records,
            pagination: Pagination::compute(query.page, query.per_page, total),
        })
    }

    /// Validates and applies a partial update, then fires status_changed and
    /// field_updated automations with the pre-update snapshot.
    pub async fn update(
        &self,
        workspace_id: &str,
        entity_id: &str,
        record_id: &str,
        payload: &Map<String, Value>,
    ) -> Result<Record> {
        let entity = self
            .entities
            .get_entity(workspace_id, entity_id)
            .await?
            .ok_or_else(|| EngineError::entity_not_found(workspace_id, entity_id))?;
        let record = self
            .records
            .get(workspace_id, entity_id, record_id)
            .await?
            .ok_or_else(|| tessella_storage::StorageError::not_found(entity_id, record_id))?;

        let validated = validate_record_data(&entity, payload, ValidationMode::Update)?;
        let old_data = record.data;
        let record = self
            .records
            .merge(workspace_id, entity_id, record_id, validated)
            .await?;
        debug!(record_id = %record.id, "record updated");

        for trigger in [TriggerType::StatusChanged, TriggerType::FieldUpdated] {
            self.dispatch_after_commit(trigger, record.clone(), Some(old_data.clone()))
                .await;
        }
        Ok(record)
    }

    /// Archives a record. Archival is reversible and fires no automations.
    pub async fn archive(
        &self,
        workspace_id: &str,
        entity_id: &str,
        record_id: &str,
    ) -> Result<Record> {
        let record = self
            .records
            .set_archived(workspace_id, entity_id, record_id, true)
            .await?;
        info!(record_id = %record.id, "record archived");
        Ok(record)
    }

    /// Restores an archived record.
    pub async fn unarchive(
        &self,
        workspace_id: &str,
        entity_id: &str,
        record_id: &str,
    ) -> Result<Record> {
        let record = self
            .records
            .set_archived(workspace_id, entity_id, record_id, false)
            .await?;
        info!(record_id = %record.id, "record restored");
        Ok(record)
    }

    /// Hard-deletes a record, then fires record_deleted automations with the
    /// final snapshot.
    pub async fn delete(
        &self,
        workspace_id: &str,
        entity_id: &str,
        record_id: &str,
    ) -> Result<()> {
        let record = self
            .records
            .get(workspace_id, entity_id, record_id)
            .await?
            .ok_or_else(|| tessella_storage::StorageError::not_found(entity_id, record_id))?;
        self.records
            .delete(workspace_id, entity_id, record_id)
            .await?;
        info!(record_id = %record_id, "record deleted");

        self.dispatch_after_commit(TriggerType::RecordDeleted, record, None)
            .await;
        Ok(())
    }

    /// Runs automation dispatch on a spawned task and awaits it, so a
    /// cancelled caller cannot abandon dispatch halfway through.
    async fn dispatch_after_commit(
        &self,
        trigger: TriggerType,
        record: Record,
        old_data: Option<Map<String, Value>>,
    ) {
        let engine = Arc::clone(&self.engine);
        let record_id = record.id.clone();
        let handle = tokio::spawn(async move {
            engine.trigger_automations(trigger, record, old_data).await
        });
        match handle.await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                error!(record_id = %record_id, trigger = %trigger, error = %e, "automation dispatch failed");
            }
            Err(e) => {
                error!(record_id = %record_id, trigger = %trigger, error = %e, "automation dispatch panicked");
            }
        }
    }
}
