//! Collaborator stores the engine reads from: entity schemas, automation
//! rules, and the execution log sink.
//!
//! In-memory implementations are provided for tests and single-node use;
//! production backends implement the same traits.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tessella_core::Entity;
use tessella_storage::StorageError;
use tokio::sync::RwLock;

use crate::types::{AutomationRule, ExecutionLogEntry, TriggerType};

/// Entity schema lookup, scoped to a workspace. Only active entities are
/// returned.
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn get_entity(
        &self,
        workspace_id: &str,
        entity_id: &str,
    ) -> Result<Option<Arc<Entity>>, StorageError>;
}

/// Read-only rule lookup for trigger evaluation.
#[async_trait]
pub trait RuleStore: Send + Sync {
    /// Lists active rules for a (workspace, entity, trigger type). Rules
    /// with no entity scope apply to every entity in the workspace.
    async fn list_active_rules(
        &self,
        workspace_id: &str,
        entity_id: &str,
        trigger_type: TriggerType,
    ) -> Result<Vec<AutomationRule>, StorageError>;
}

/// Append-only sink for automation execution log entries.
#[async_trait]
pub trait ExecutionLogStore: Send + Sync {
    async fn append(&self, entry: ExecutionLogEntry) -> Result<(), StorageError>;

    /// Entries for one rule, oldest first.
    async fn list_for_rule(&self, rule_id: &str) -> Result<Vec<ExecutionLogEntry>, StorageError>;
}

/// In-memory entity schema store.
#[derive(Debug, Default)]
pub struct InMemoryEntityStore {
    entities: RwLock<HashMap<String, Arc<Entity>>>,
}

impl InMemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put(&self, entity: Entity) {
        let key = format!("{}/{}", entity.workspace_id, entity.id);
        self.entities.write().await.insert(key, Arc::new(entity));
    }
}

#[async_trait]
impl EntityStore for InMemoryEntityStore {
    async fn get_entity(
        &self,
        workspace_id: &str,
        entity_id: &str,
    ) -> Result<Option<Arc<Entity>>, StorageError> {
        let key = format!("{workspace_id}/{entity_id}");
        let entities = self.entities.read().await;
        Ok(entities.get(&key).filter(|e| e.is_active).cloned())
    }
}

/// In-memory automation rule store.
#[derive(Debug, Default)]
pub struct InMemoryRuleStore {
    rules: RwLock<Vec<AutomationRule>>,
}

impl InMemoryRuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put(&self, rule: AutomationRule) {
        self.rules.write().await.push(rule);
    }
}

#[async_trait]
impl RuleStore for InMemoryRuleStore {
    async fn list_active_rules(
        &self,
        workspace_id: &str,
        entity_id: &str,
        trigger_type: TriggerType,
    ) -> Result<Vec<AutomationRule>, StorageError> {
        let rules = self.rules.read().await;
        Ok(rules
            .iter()
            .filter(|rule| {
                rule.is_active
                    && rule.workspace_id == workspace_id
                    && rule.trigger_type == trigger_type
                    && rule
                        .entity_id
                        .as_deref()
                        .is_none_or(|scoped| scoped == entity_id)
            })
            .cloned()
            .collect())
    }
}

/// In-memory execution log.
#[derive(Debug, Default)]
pub struct InMemoryExecutionLog {
    entries: RwLock<Vec<ExecutionLogEntry>>,
}

impl InMemoryExecutionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// All entries, oldest first.
    pub async fn entries(&self) -> Vec<ExecutionLogEntry> {
        self.entries.read().await.clone()
    }
}

#[async_trait]
impl ExecutionLogStore for InMemoryExecutionLog {
    async fn append(&self, entry: ExecutionLogEntry) -> Result<(), StorageError> {
        self.entries.write().await.push(entry);
        Ok(())
    }

    async fn list_for_rule(&self, rule_id: &str) -> Result<Vec<ExecutionLogEntry>, StorageError> {
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .filter(|e| e.rule_id == rule_id)
            .cloned()
            .collect())
    }
}
