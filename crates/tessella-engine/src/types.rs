//! Automation type definitions: rules, triggers, actions, and execution log
//! entries.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tessella_core::{Entity, Record, Timestamp, generate_id, now_utc};

/// Automation trigger type.
///
/// `status_changed` and `field_updated` are the two variants of a record
/// update; they are stored and matched as distinct trigger types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    RecordCreated,
    StatusChanged,
    FieldUpdated,
    RecordDeleted,
}

impl TriggerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerType::RecordCreated => "record_created",
            TriggerType::StatusChanged => "status_changed",
            TriggerType::FieldUpdated => "field_updated",
            TriggerType::RecordDeleted => "record_deleted",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "record_created" => Some(TriggerType::RecordCreated),
            "status_changed" => Some(TriggerType::StatusChanged),
            "field_updated" => Some(TriggerType::FieldUpdated),
            "record_deleted" => Some(TriggerType::RecordDeleted),
            _ => None,
        }
    }
}

impl std::fmt::Display for TriggerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Trigger-specific matching parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriggerConfig {
    /// For status_changed: the status value the record must have moved to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_status: Option<String>,
    /// For status_changed: the status value the record must have come from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_status: Option<String>,
    /// For field_updated: the field whose value must have changed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_name: Option<String>,
}

/// HTTP method used by the webhook action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WebhookMethod {
    #[default]
    Post,
    Put,
    Patch,
}

impl WebhookMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookMethod::Post => "POST",
            WebhookMethod::Put => "PUT",
            WebhookMethod::Patch => "PATCH",
        }
    }
}

impl std::fmt::Display for WebhookMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Automation action type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    SendEmail,
    CallWebhook,
    UpdateField,
    CreateTask,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::SendEmail => "send_email",
            ActionType::CallWebhook => "call_webhook",
            ActionType::UpdateField => "update_field",
            ActionType::CreateTask => "create_task",
        }
    }
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Action-specific configuration; the enum tag is the action type, so adding
/// an action is a compile-time-checked extension of the dispatcher.
///
/// Every string field here is a template: `{{field}}` tokens are resolved
/// against the triggering record before the action executes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionConfig {
    SendEmail {
        #[serde(default)]
        subject: String,
        #[serde(default)]
        body: String,
        /// Overrides the record's `email` field as the recipient.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        to_email: Option<String>,
    },
    CallWebhook {
        url: String,
        #[serde(default)]
        method: WebhookMethod,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        headers: BTreeMap<String, String>,
    },
    UpdateField {
        field_name: String,
        new_value: String,
    },
    CreateTask {
        #[serde(default)]
        title: String,
        #[serde(default)]
        description: String,
    },
}

impl ActionConfig {
    pub fn action_type(&self) -> ActionType {
        match self {
            ActionConfig::SendEmail { .. } => ActionType::SendEmail,
            ActionConfig::CallWebhook { .. } => ActionType::CallWebhook,
            ActionConfig::UpdateField { .. } => ActionType::UpdateField,
            ActionConfig::CreateTask { .. } => ActionType::CreateTask,
        }
    }
}

/// A stored trigger-condition-action definition.
///
/// Rules are authored by workspace admins and evaluated read-only by the
/// engine; the engine never mutates a rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomationRule {
    pub id: String,
    pub workspace_id: String,
    /// Entity scope; `None` applies the rule to every entity in the
    /// workspace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub trigger_type: TriggerType,
    #[serde(default)]
    pub trigger_config: TriggerConfig,
    pub action: ActionConfig,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

fn default_true() -> bool {
    true
}

impl AutomationRule {
    pub fn new(
        workspace_id: impl Into<String>,
        name: impl Into<String>,
        trigger_type: TriggerType,
        action: ActionConfig,
    ) -> Self {
        let now = now_utc();
        Self {
            id: generate_id(),
            workspace_id: workspace_id.into(),
            entity_id: None,
            name: name.into(),
            description: None,
            trigger_type,
            trigger_config: TriggerConfig::default(),
            action,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn for_entity(mut self, entity_id: impl Into<String>) -> Self {
        self.entity_id = Some(entity_id.into());
        self
    }

    pub fn with_trigger_config(mut self, config: TriggerConfig) -> Self {
        self.trigger_config = config;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    pub fn action_type(&self) -> ActionType {
        self.action.action_type()
    }
}

/// Outcome status of one automation firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Success,
    Error,
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::Success => "success",
            ExecutionStatus::Error => "error",
        }
    }
}

/// Immutable record of one automation firing. Created exactly once per
/// (rule, triggering event) pair and never updated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionLogEntry {
    pub id: String,
    pub rule_id: String,
    pub record_id: String,
    pub status: ExecutionStatus,
    /// Action-specific payload on success, error detail on failure.
    pub result: Value,
    pub executed_at: Timestamp,
}

impl ExecutionLogEntry {
    pub fn success(
        rule_id: impl Into<String>,
        record_id: impl Into<String>,
        result: Value,
    ) -> Self {
        Self {
            id: generate_id(),
            rule_id: rule_id.into(),
            record_id: record_id.into(),
            status: ExecutionStatus::Success,
            result,
            executed_at: now_utc(),
        }
    }

    pub fn error(
        rule_id: impl Into<String>,
        record_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: generate_id(),
            rule_id: rule_id.into(),
            record_id: record_id.into(),
            status: ExecutionStatus::Error,
            result: serde_json::json!({ "error": message.into() }),
            executed_at: now_utc(),
        }
    }
}

/// A read-only snapshot of one record mutation, handed to the trigger
/// matcher. The matcher performs no writes against it.
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    pub trigger_type: TriggerType,
    pub entity: Arc<Entity>,
    pub record: Record,
    /// Data before the mutation; `None` for creations.
    pub old_data: Option<Map<String, Value>>,
}

impl ChangeEvent {
    pub fn new(trigger_type: TriggerType, entity: Arc<Entity>, record: Record) -> Self {
        Self {
            trigger_type,
            entity,
            record,
            old_data: None,
        }
    }

    pub fn with_old_data(mut self, old_data: Map<String, Value>) -> Self {
        self.old_data = Some(old_data);
        self
    }

    pub fn workspace_id(&self) -> &str {
        &self.record.workspace_id
    }

    pub fn entity_id(&self) -> &str {
        &self.record.entity_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_type_serialization() {
        let json = serde_json::to_string(&TriggerType::StatusChanged).unwrap();
        assert_eq!(json, r#""status_changed""#);
        assert_eq!(TriggerType::from_str("record_deleted"), Some(TriggerType::RecordDeleted));
        assert_eq!(TriggerType::from_str("cron"), None);
    }

    #[test]
    fn test_action_config_tagging() {
        let json = r#"{
            "type": "send_email",
            "subject": "Welcome {{full_name}}",
            "body": "Hi {{full_name}}"
        }"#;
        let action: ActionConfig = serde_json::from_str(json).unwrap();
        assert_eq!(action.action_type(), ActionType::SendEmail);

        let json = r#"{"type": "call_webhook", "url": "https://example.com/hook"}"#;
        let action: ActionConfig = serde_json::from_str(json).unwrap();
        match &action {
            ActionConfig::CallWebhook { method, headers, .. } => {
                assert_eq!(*method, WebhookMethod::Post);
                assert!(headers.is_empty());
            }
            other => panic!("unexpected action: {other:?}"),
        }
    }

    #[test]
    fn test_webhook_method_serde_uppercase() {
        let method: WebhookMethod = serde_json::from_str(r#""PATCH""#).unwrap();
        assert_eq!(method, WebhookMethod::Patch);
        assert_eq!(serde_json::to_string(&WebhookMethod::Put).unwrap(), r#""PUT""#);
    }

    #[test]
    fn test_rule_builder_defaults() {
        let rule = AutomationRule::new(
            "ws1",
            "Welcome email",
            TriggerType::RecordCreated,
            ActionConfig::SendEmail {
                subject: "Hi".into(),
                body: "Hello".into(),
                to_email: None,
            },
        );
        assert!(rule.is_active);
        assert!(rule.entity_id.is_none());
        assert_eq!(rule.action_type(), ActionType::SendEmail);

        let rule = rule.for_entity("e1").inactive();
        assert_eq!(rule.entity_id.as_deref(), Some("e1"));
        assert!(!rule.is_active);
    }

    #[test]
    fn test_execution_log_entry_error_payload() {
        let entry = ExecutionLogEntry::error("rule-1", "rec-1", "webhook timed out");
        assert_eq!(entry.status, ExecutionStatus::Error);
        assert_eq!(entry.result["error"], serde_json::json!("webhook timed out"));
    }
}
