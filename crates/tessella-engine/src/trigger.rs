//! Trigger matching: decides whether a stored automation rule fires for a
//! given change event.
//!
//! Matching is a pure function over a read-only `{old_data, new_data}`
//! snapshot; it performs no writes and raises no user-visible error — an
//! unmatched rule is simply skipped.

use serde_json::Value;

use crate::types::{AutomationRule, ChangeEvent, TriggerType};

/// Checks whether `rule` fires for `event`.
///
/// The status field used by status_changed rules comes from the event's
/// entity schema (the first select field whose name contains "status").
pub fn rule_matches(rule: &AutomationRule, event: &ChangeEvent) -> bool {
    if rule.trigger_type != event.trigger_type {
        return false;
    }
    if let Some(entity_id) = &rule.entity_id
        && entity_id != event.entity_id()
    {
        return false;
    }

    match event.trigger_type {
        // Creations and deletions have no further condition.
        TriggerType::RecordCreated | TriggerType::RecordDeleted => true,
        TriggerType::StatusChanged => status_change_matches(rule, event),
        TriggerType::FieldUpdated => field_update_matches(rule, event),
    }
}

fn status_change_matches(rule: &AutomationRule, event: &ChangeEvent) -> bool {
    let Some(status_field) = event.entity.status_field() else {
        return false;
    };
    let new_status = event.record.get_field(&status_field.name);
    let old_status = event
        .old_data
        .as_ref()
        .and_then(|old| old.get(&status_field.name));

    if let Some(to_status) = &rule.trigger_config.to_status
        && !value_equals_str(new_status, to_status)
    {
        return false;
    }
    if let Some(from_status) = &rule.trigger_config.from_status
        && !value_equals_str(old_status, from_status)
    {
        return false;
    }

    // A no-op update never fires; this is the guard against automation
    // loops when an action updates the triggering field itself.
    old_status != new_status
}

fn field_update_matches(rule: &AutomationRule, event: &ChangeEvent) -> bool {
    let Some(field_name) = &rule.trigger_config.field_name else {
        // No specific field configured: any update fires.
        return true;
    };
    let Some(old_data) = &event.old_data else {
        return false;
    };
    old_data.get(field_name) != event.record.get_field(field_name)
}

fn value_equals_str(value: Option<&Value>, expected: &str) -> bool {
    matches!(value, Some(Value::String(s)) if s == expected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ActionConfig, TriggerConfig};
    use serde_json::{Map, json};
    use std::sync::Arc;
    use tessella_core::{Entity, FieldDefinition, FieldType, Record};

    fn entity() -> Arc<Entity> {
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
                        .with_options(["New", "Contacted", "Won"]),
                ],
            )
            .unwrap(),
        )
    }

    fn record(status: &str) -> Record {
        let mut data = Map::new();
        data.insert("full_name".into(), json!("Ada"));
        data.insert("status".into(), json!(status));
        Record::new("r1", "ws1", "e1", data)
    }

    fn old_data(status: &str) -> Map<String, serde_json::Value> {
        let mut data = Map::new();
        data.insert("full_name".into(), json!("Ada"));
        data.insert("status".into(), json!(status));
        data
    }

    fn status_rule(from: Option<&str>, to: Option<&str>) -> AutomationRule {
        AutomationRule::new(
            "ws1",
            "status rule",
            TriggerType::StatusChanged,
            ActionConfig::CreateTask {
                title: "t".into(),
                description: String::new(),
            },
        )
        .with_trigger_config(TriggerConfig {
            to_status: to.map(String::from),
            from_status: from.map(String::from),
            field_name: None,
        })
    }

    #[test]
    fn test_created_and_deleted_always_match() {
        for trigger in [TriggerType::RecordCreated, TriggerType::RecordDeleted] {
            let rule = AutomationRule::new(
                "ws1",
                "r",
                trigger,
                ActionConfig::CreateTask {
                    title: "t".into(),
                    description: String::new(),
                },
            );
            let event = ChangeEvent::new(trigger, entity(), record("New"));
            assert!(rule_matches(&rule, &event));
        }
    }

    #[test]
    fn test_trigger_type_mismatch_never_fires() {
        let rule = status_rule(None, Some("Won"));
        let event = ChangeEvent::new(TriggerType::RecordCreated, entity(), record("Won"));
        assert!(!rule_matches(&rule, &event));
    }

    #[test]
    fn test_entity_scope() {
        let rule = status_rule(None, Some("Won")).for_entity("other-entity");
        let event = ChangeEvent::new(TriggerType::StatusChanged, entity(), record("Won"))
            .with_old_data(old_data("New"));
        assert!(!rule_matches(&rule, &event));
    }

    #[test]
    fn test_status_change_from_and_to() {
        let rule = status_rule(Some("New"), Some("Contacted"));

        let fires = ChangeEvent::new(TriggerType::StatusChanged, entity(), record("Contacted"))
            .with_old_data(old_data("New"));
        assert!(rule_matches(&rule, &fires));

        // Wrong previous value.
        let wrong_from = ChangeEvent::new(TriggerType::StatusChanged, entity(), record("Contacted"))
            .with_old_data(old_data("Won"));
        assert!(!rule_matches(&rule, &wrong_from));

        // Wrong new value.
        let wrong_to = ChangeEvent::new(TriggerType::StatusChanged, entity(), record("Won"))
            .with_old_data(old_data("New"));
        assert!(!rule_matches(&rule, &wrong_to));
    }

    #[test]
    fn test_noop_status_update_never_fires() {
        let rule = status_rule(None, Some("Contacted"));
        let noop = ChangeEvent::new(TriggerType::StatusChanged, entity(), record("Contacted"))
            .with_old_data(old_data("Contacted"));
        assert!(!rule_matches(&rule, &noop));
    }

    #[test]
    fn test_unset_from_status_still_requires_a_change() {
        let rule = status_rule(None, None);
        let noop = ChangeEvent::new(TriggerType::StatusChanged, entity(), record("New"))
            .with_old_data(old_data("New"));
        assert!(!rule_matches(&rule, &noop));

        let changed = ChangeEvent::new(TriggerType::StatusChanged, entity(), record("Won"))
            .with_old_data(old_data("New"));
        assert!(rule_matches(&rule, &changed));
    }

    #[test]
    fn test_status_rule_without_status_field_never_fires() {
        let entity = Arc::new(
            Entity::new(
                "e2",
                "ws1",
                "notes",
                "Notes",
                vec![FieldDefinition::new("body", "Body", FieldType::Textarea).unwrap()],
            )
            .unwrap(),
        );
        let mut rec = record("New");
        rec.entity_id = "e2".into();
        let rule = status_rule(None, Some("New"));
        let event = ChangeEvent::new(TriggerType::StatusChanged, entity, rec)
            .with_old_data(old_data("Contacted"));
        assert!(!rule_matches(&rule, &event));
    }

    #[test]
    fn test_field_updated_requires_value_change() {
        let rule = AutomationRule::new(
            "ws1",
            "field rule",
            TriggerType::FieldUpdated,
            ActionConfig::CreateTask {
                title: "t".into(),
                description: String::new(),
            },
        )
        .with_trigger_config(TriggerConfig {
            field_name: Some("full_name".into()),
            ..Default::default()
        });

        let mut changed_record = record("New");
        changed_record.data.insert("full_name".into(), json!("Ada L."));
        let changed = ChangeEvent::new(TriggerType::FieldUpdated, entity(), changed_record)
            .with_old_data(old_data("New"));
        assert!(rule_matches(&rule, &changed));

        let unchanged = ChangeEvent::new(TriggerType::FieldUpdated, entity(), record("New"))
            .with_old_data(old_data("New"));
        assert!(!rule_matches(&rule, &unchanged));

        // Without the previous snapshot there is nothing to compare.
        let no_old = ChangeEvent::new(TriggerType::FieldUpdated, entity(), record("New"));
        assert!(!rule_matches(&rule, &no_old));
    }

    #[test]
    fn test_field_updated_without_field_name_matches_any_update() {
        let rule = AutomationRule::new(
            "ws1",
            "any update",
            TriggerType::FieldUpdated,
            ActionConfig::CreateTask {
                title: "t".into(),
                description: String::new(),
            },
        );
        let event = ChangeEvent::new(TriggerType::FieldUpdated, entity(), record("New"))
            .with_old_data(old_data("New"));
        assert!(rule_matches(&rule, &event));
    }
}
