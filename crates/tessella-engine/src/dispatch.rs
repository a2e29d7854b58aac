//! Action dispatcher: executes one matched rule's action against the
//! triggering record and turns the outcome into an execution log entry.
//!
//! Every failure inside an action is caught here. Dispatch itself is
//! infallible so that one misbehaving rule can never block the others
//! matched by the same event.

use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::sync::Arc;
use tessella_core::{Record, ValidationMode, now_utc, validate_record_data};
use tessella_storage::RecordStore;
use tracing::{debug, warn};

use crate::adapters::{EmailSender, HttpClient, TaskRequest, TaskSink};
use crate::error::{EngineError, Result};
use crate::settings::EngineSettings;
use crate::template;
use crate::types::{ActionConfig, AutomationRule, ChangeEvent, ExecutionLogEntry, WebhookMethod};

/// Webhook response bodies are truncated to this length in the log payload.
const MAX_LOGGED_RESPONSE: usize = 500;

/// Result of dispatching one rule.
#[derive(Debug)]
pub struct DispatchOutcome {
    pub entry: ExecutionLogEntry,
    /// Present when the action wrote the record back; the engine re-enters
    /// trigger matching with it.
    pub follow_up: Option<FollowUp>,
}

/// A record mutation performed by an update_field action.
#[derive(Debug, Clone)]
pub struct FollowUp {
    pub record: Record,
    pub old_data: Map<String, Value>,
}

/// Executes actions through the outbound collaborators.
pub struct ActionDispatcher {
    records: Arc<dyn RecordStore>,
    email: Arc<dyn EmailSender>,
    http: Arc<dyn HttpClient>,
    tasks: Arc<dyn TaskSink>,
    settings: EngineSettings,
}

impl ActionDispatcher {
    pub fn new(
        records: Arc<dyn RecordStore>,
        email: Arc<dyn EmailSender>,
        http: Arc<dyn HttpClient>,
        tasks: Arc<dyn TaskSink>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            records,
            email,
            http,
            tasks,
            settings,
        }
    }

    /// Runs one rule's action. Failures become an `error` log entry with the
    /// failure message; they are never propagated.
    pub async fn dispatch(&self, rule: &AutomationRule, event: &ChangeEvent) -> DispatchOutcome {
        debug!(
            rule_id = %rule.id,
            record_id = %event.record.id,
            action = %rule.action_type(),
            "executing automation action"
        );

        let (result, follow_up) = match self.execute(rule, event).await {
            Ok((result, follow_up)) => (result, follow_up),
            Err(e) => {
                warn!(
                    rule_id = %rule.id,
                    record_id = %event.record.id,
                    error = %e,
                    "automation action failed"
                );
                return DispatchOutcome {
                    entry: ExecutionLogEntry::error(&rule.id, &event.record.id, e.to_string()),
                    follow_up: None,
                };
            }
        };

        DispatchOutcome {
            entry: ExecutionLogEntry::success(&rule.id, &event.record.id, result),
            follow_up,
        }
    }

    async fn execute(
        &self,
        rule: &AutomationRule,
        event: &ChangeEvent,
    ) -> Result<(Value, Option<FollowUp>)> {
        match &rule.action {
            ActionConfig::SendEmail {
                subject,
                body,
                to_email,
            } => self.send_email(event, subject, body, to_email.as_deref()).await,
            ActionConfig::CallWebhook {
                url,
                method,
                headers,
            } => self.call_webhook(event, url, *method, headers).await,
            ActionConfig::UpdateField {
                field_name,
                new_value,
            } => self.update_field(event, field_name, new_value).await,
            ActionConfig::CreateTask { title, description } => {
                self.create_task(event, title, description).await
            }
        }
    }

    async fn send_email(
        &self,
        event: &ChangeEvent,
        subject: &str,
        body: &str,
        to_email: Option<&str>,
    ) -> Result<(Value, Option<FollowUp>)> {
        // Explicit recipient wins over the record's own email field.
        let recipient = match to_email.filter(|s| !s.is_empty()) {
            Some(to) => to.to_string(),
            None => event
                .record
                .get_field("email")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .ok_or(EngineError::RecipientNotFound)?,
        };

        let subject = template::resolve(subject, &event.record);
        let body = template::resolve(body, &event.record);
        self.email.send(&recipient, &subject, &body).await?;

        Ok((
            json!({
                "email_sent": true,
                "recipient": recipient,
                "subject": subject,
                "body_length": body.len(),
            }),
            None,
        ))
    }

    async fn call_webhook(
        &self,
        event: &ChangeEvent,
        url: &str,
        method: WebhookMethod,
        headers: &BTreeMap<String, String>,
    ) -> Result<(Value, Option<FollowUp>)> {
        let payload = json!({
            "event": event.trigger_type.as_str(),
            "workspace_id": event.record.workspace_id,
            "entity_id": event.record.entity_id,
            "record": event.record,
            "timestamp": now_utc(),
        });

        let response = self
            .http
            .request(method, url, &payload, headers, self.settings.webhook_timeout())
            .await?;

        if !response.is_success() {
            return Err(EngineError::send_failed(format!(
                "webhook returned status {}",
                response.status
            )));
        }

        let mut body = response.body;
        if body.len() > MAX_LOGGED_RESPONSE {
            let mut cut = MAX_LOGGED_RESPONSE;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
        }

        Ok((
            json!({
                "webhook_called": true,
                "url": url,
                "method": method.as_str(),
                "status_code": response.status,
                "response": body,
            }),
            None,
        ))
    }

    async fn update_field(
        &self,
        event: &ChangeEvent,
        field_name: &str,
        new_value: &str,
    ) -> Result<(Value, Option<FollowUp>)> {
        if event.entity.field(field_name).is_none() {
            return Err(EngineError::invalid_action_config(format!(
                "unknown field '{field_name}'"
            )));
        }

        let resolved = template::resolve(new_value, &event.record);
        let mut patch = Map::new();
        patch.insert(field_name.to_string(), Value::String(resolved));
        let validated =
            validate_record_data(&event.entity, &patch, ValidationMode::Update)?;

        // event.record may be stale by the time this action runs: another
        // rule matched by the same event can have written the record already.
        // Re-read and merge only this field so sibling mutations survive.
        let current = self
            .records
            .get(
                &event.record.workspace_id,
                &event.record.entity_id,
                &event.record.id,
            )
            .await?
            .ok_or_else(|| {
                tessella_storage::StorageError::not_found(&event.record.entity_id, &event.record.id)
            })?;

        let old_value = current
            .get_field(field_name)
            .cloned()
            .unwrap_or(Value::Null);
        let new_value = validated
            .get(field_name)
            .cloned()
            .unwrap_or(Value::Null);

        let updated = self
            .records
            .merge(
                &event.record.workspace_id,
                &event.record.entity_id,
                &event.record.id,
                validated,
            )
            .await?;

        Ok((
            json!({
                "field_updated": true,
                "field_name": field_name,
                "old_value": old_value,
                "new_value": new_value,
            }),
            Some(FollowUp {
                record: updated,
                old_data: current.data,
            }),
        ))
    }

    async fn create_task(
        &self,
        event: &ChangeEvent,
        title: &str,
        description: &str,
    ) -> Result<(Value, Option<FollowUp>)> {
        let title = template::resolve(title, &event.record);
        let description = template::resolve(description, &event.record);
        self.tasks
            .create_task(TaskRequest {
                title: title.clone(),
                description,
                related_to: event.record.id.clone(),
            })
            .await?;

        Ok((
            json!({
                "task_created": true,
                "title": title,
                "related_to": event.record.id,
            }),
            None,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{EmailSender, HttpClient, HttpResponse, TaskSink};
    use crate::types::{TriggerType, WebhookMethod};
    use assert_json_diff::assert_json_include;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::sync::Mutex;
    use std::time::Duration;
    use tessella_core::{Entity, FieldDefinition, FieldType};
    use tessella_db_memory::InMemoryStore;

    struct NoEmail;

    #[async_trait]
    impl EmailSender for NoEmail {
        async fn send(&self, _to: &str, _subject: &str, _body: &str) -> Result<()> {
            Ok(())
        }
    }

    struct NoTasks;

    #[async_trait]
    impl TaskSink for NoTasks {
        async fn create_task(&self, _task: TaskRequest) -> Result<()> {
            Ok(())
        }
    }

    /// Records the last request and replies with a canned response.
    struct CapturingHttp {
        requests: Mutex<Vec<(String, Value)>>,
        response: HttpResponse,
    }

    impl CapturingHttp {
        fn replying(status: u16, body: &str) -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                response: HttpResponse {
                    status,
                    body: body.to_string(),
                },
            }
        }
    }

    #[async_trait]
    impl HttpClient for CapturingHttp {
        async fn request(
            &self,
            _method: WebhookMethod,
            url: &str,
            body: &Value,
            _headers: &BTreeMap<String, String>,
            _timeout: Duration,
        ) -> Result<HttpResponse> {
            self.requests
                .lock()
                .unwrap()
                .push((url.to_string(), body.clone()));
            Ok(self.response.clone())
        }
    }

    fn dispatcher_with(http: Arc<CapturingHttp>, records: Arc<InMemoryStore>) -> ActionDispatcher {
        ActionDispatcher::new(
            records,
            Arc::new(NoEmail),
            http,
            Arc::new(NoTasks),
            EngineSettings::default(),
        )
    }

    fn leads_entity() -> Arc<Entity> {
        Arc::new(
            Entity::new(
                "e1",
                "ws1",
                "leads",
                "Leads",
                vec![
                    FieldDefinition::new("full_name", "Full Name", FieldType::Text).unwrap(),
                    FieldDefinition::new("status", "Status", FieldType::Select)
                        .unwrap()
                        .with_options(["new", "won"]),
                ],
            )
            .unwrap(),
        )
    }

    fn event() -> ChangeEvent {
        let mut data = Map::new();
        data.insert("full_name".into(), json!("Ada"));
        data.insert("status".into(), json!("new"));
        ChangeEvent::new(
            TriggerType::RecordCreated,
            leads_entity(),
            Record::new("rec-1", "ws1", "e1", data),
        )
    }

    fn rule(action: ActionConfig) -> AutomationRule {
        AutomationRule::new("ws1", "rule", TriggerType::RecordCreated, action)
    }

    #[tokio::test]
    async fn test_webhook_envelope_shape() {
        let http = Arc::new(CapturingHttp::replying(200, "ok"));
        let dispatcher = dispatcher_with(http.clone(), Arc::new(InMemoryStore::new()));
        let rule = rule(ActionConfig::CallWebhook {
            url: "https://example.com/hook".into(),
            method: WebhookMethod::Post,
            headers: BTreeMap::new(),
        });

        let outcome = dispatcher.dispatch(&rule, &event()).await;
        assert_eq!(outcome.entry.status, crate::types::ExecutionStatus::Success);

        let requests = http.requests.lock().unwrap();
        let (url, payload) = &requests[0];
        assert_eq!(url, "https://example.com/hook");
        assert_json_include!(
            actual: payload,
            expected: json!({
                "event": "record_created",
                "workspace_id": "ws1",
                "entity_id": "e1",
                "record": {
                    "id": "rec-1",
                    "data": { "full_name": "Ada" },
                },
            })
        );
        assert!(payload.get("timestamp").is_some());
    }

    #[tokio::test]
    async fn test_webhook_response_is_truncated_in_log() {
        let long_body = "x".repeat(2_000);
        let http = Arc::new(CapturingHttp::replying(200, &long_body));
        let dispatcher = dispatcher_with(http, Arc::new(InMemoryStore::new()));
        let rule = rule(ActionConfig::CallWebhook {
            url: "https://example.com/hook".into(),
            method: WebhookMethod::Post,
            headers: BTreeMap::new(),
        });

        let outcome = dispatcher.dispatch(&rule, &event()).await;
        let logged = outcome.entry.result["response"].as_str().unwrap();
        assert_eq!(logged.len(), MAX_LOGGED_RESPONSE);
    }

    #[tokio::test]
    async fn test_update_field_rejects_invalid_option() {
        let records = Arc::new(InMemoryStore::new());
        let ev = event();
        records.insert(ev.record.clone()).await.unwrap();
        let dispatcher = dispatcher_with(
            Arc::new(CapturingHttp::replying(200, "")),
            records.clone(),
        );
        let rule = rule(ActionConfig::UpdateField {
            field_name: "status".into(),
            new_value: "archived".into(),
        });

        let outcome = dispatcher.dispatch(&rule, &ev).await;
        assert_eq!(outcome.entry.status, crate::types::ExecutionStatus::Error);
        assert!(outcome.follow_up.is_none());
        // The stored record is untouched.
        let stored = records.get("ws1", "e1", "rec-1").await.unwrap().unwrap();
        assert_eq!(stored.data["status"], json!("new"));
    }

    #[tokio::test]
    async fn test_update_field_unknown_field_is_config_error() {
        let dispatcher = dispatcher_with(
            Arc::new(CapturingHttp::replying(200, "")),
            Arc::new(InMemoryStore::new()),
        );
        let rule = rule(ActionConfig::UpdateField {
            field_name: "ghost".into(),
            new_value: "x".into(),
        });

        let outcome = dispatcher.dispatch(&rule, &event()).await;
        assert_eq!(outcome.entry.status, crate::types::ExecutionStatus::Error);
        assert_eq!(
            outcome.entry.result["error"],
            json!("Invalid action configuration: unknown field 'ghost'")
        );
    }

    #[tokio::test]
    async fn test_update_field_reports_old_and_new_value() {
        let records = Arc::new(InMemoryStore::new());
        let ev = event();
        records.insert(ev.record.clone()).await.unwrap();
        let dispatcher = dispatcher_with(
            Arc::new(CapturingHttp::replying(200, "")),
            records.clone(),
        );
        let rule = rule(ActionConfig::UpdateField {
            field_name: "status".into(),
            new_value: "won".into(),
        });

        let outcome = dispatcher.dispatch(&rule, &ev).await;
        assert_json_include!(
            actual: &outcome.entry.result,
            expected: json!({
                "field_updated": true,
                "field_name": "status",
                "old_value": "new",
                "new_value": "won",
            })
        );
        let follow_up = outcome.follow_up.unwrap();
        assert_eq!(follow_up.record.data["status"], json!("won"));
        assert_eq!(follow_up.old_data["status"], json!("new"));
    }
}
