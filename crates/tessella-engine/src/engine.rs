//! Automation engine: finds the rules matching a change event, runs their
//! actions, logs every outcome, and follows update_field chains up to a
//! bounded depth.

use futures_util::future::{BoxFuture, join_all};
use serde_json::{Map, Value};
use std::sync::Arc;
use tessella_core::Record;
use tracing::{debug, error, info, warn};

use crate::dispatch::{ActionDispatcher, DispatchOutcome, FollowUp};
use crate::error::Result;
use crate::stores::{EntityStore, ExecutionLogStore, RuleStore};
use crate::trigger::rule_matches;
use crate::types::{ChangeEvent, ExecutionLogEntry, TriggerType};

/// Evaluates automation rules for record mutations.
///
/// The engine never fails a mutation: rule lookup errors and action failures
/// end up in the execution log or the log stream, not at the caller.
pub struct AutomationEngine {
    rules: Arc<dyn RuleStore>,
    entities: Arc<dyn EntityStore>,
    log: Arc<dyn ExecutionLogStore>,
    dispatcher: ActionDispatcher,
    max_chain_depth: u32,
}

impl AutomationEngine {
    pub fn new(
        rules: Arc<dyn RuleStore>,
        entities: Arc<dyn EntityStore>,
        log: Arc<dyn ExecutionLogStore>,
        dispatcher: ActionDispatcher,
        max_chain_depth: u32,
    ) -> Self {
        Self {
            rules,
            entities,
            log,
            dispatcher,
            max_chain_depth,
        }
    }

    /// Runs every matching rule for one committed mutation.
    ///
    /// `old_data` is the record data before the mutation; `None` for
    /// creations. Returns the log entries written for this event and any
    /// chained events it caused.
    pub async fn trigger_automations(
        &self,
        trigger_type: TriggerType,
        record: Record,
        old_data: Option<Map<String, Value>>,
    ) -> Result<Vec<ExecutionLogEntry>> {
        let Some(entity) = self
            .entities
            .get_entity(&record.workspace_id, &record.entity_id)
            .await?
        else {
            // Entity deactivated between the write and dispatch; nothing to
            // match against.
            debug!(
                workspace_id = %record.workspace_id,
                entity_id = %record.entity_id,
                "skipping automations for inactive entity"
            );
            return Ok(Vec::new());
        };

        let mut event = ChangeEvent::new(trigger_type, entity, record);
        if let Some(old_data) = old_data {
            event = event.with_old_data(old_data);
        }
        Ok(self.process(event, 0).await)
    }

    /// Dispatches one event and recurses into follow-up record updates.
    fn process(&self, event: ChangeEvent, depth: u32) -> BoxFuture<'_, Vec<ExecutionLogEntry>> {
        Box::pin(async move {
            if depth > self.max_chain_depth {
                warn!(
                    record_id = %event.record.id,
                    depth,
                    "automation chain exceeded depth budget, stopping"
                );
                return Vec::new();
            }

            let rules = match self
                .rules
                .list_active_rules(
                    event.workspace_id(),
                    event.entity_id(),
                    event.trigger_type,
                )
                .await
            {
                Ok(rules) => rules,
                Err(e) => {
                    error!(
                        workspace_id = %event.workspace_id(),
                        entity_id = %event.entity_id(),
                        error = %e,
                        "failed to load automation rules"
                    );
                    return Vec::new();
                }
            };

            let matched: Vec<_> = rules
                .iter()
                .filter(|rule| rule_matches(rule, &event))
                .collect();
            if matched.is_empty() {
                return Vec::new();
            }
            info!(
                record_id = %event.record.id,
                trigger = %event.trigger_type,
                matched = matched.len(),
                depth,
                "dispatching automations"
            );

            let outcomes = join_all(
                matched
                    .iter()
                    .map(|rule| self.dispatcher.dispatch(rule, &event)),
            )
            .await;

            let mut entries = Vec::with_capacity(outcomes.len());
            let mut follow_ups = Vec::new();
            for DispatchOutcome { entry, follow_up } in outcomes {
                if let Err(e) = self.log.append(entry.clone()).await {
                    // Logging must never undo a delivered action.
                    error!(rule_id = %entry.rule_id, error = %e, "failed to append execution log entry");
                }
                entries.push(entry);
                if let Some(follow_up) = follow_up {
                    follow_ups.push(follow_up);
                }
            }

            for FollowUp { record, old_data } in follow_ups {
                for trigger in [TriggerType::StatusChanged, TriggerType::FieldUpdated] {
                    let chained = ChangeEvent::new(trigger, Arc::clone(&event.entity), record.clone())
                        .with_old_data(old_data.clone());
                    entries.extend(self.process(chained, depth + 1).await);
                }
            }

            entries
        })
    }
}
