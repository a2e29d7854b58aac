use crate::time::{Timestamp, now_utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// One data instance of an entity, stored as a key-value document.
///
/// `data` keys are a subset of the entity's field names but may contain stale
/// keys from removed fields; those are never purged automatically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub workspace_id: String,
    pub entity_id: String,
    pub data: Map<String, Value>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Record {
    pub fn new(
        id: impl Into<String>,
        workspace_id: impl Into<String>,
        entity_id: impl Into<String>,
        data: Map<String, Value>,
    ) -> Self {
        let now = now_utc();
        Self {
            id: id.into(),
            workspace_id: workspace_id.into(),
            entity_id: entity_id.into(),
            data,
            tags: BTreeSet::new(),
            is_archived: false,
            created_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_tags(mut self, tags: impl IntoIterator<Item = String>) -> Self {
        self.tags = tags.into_iter().collect();
        self
    }

    pub fn with_created_by(mut self, user_id: impl Into<String>) -> Self {
        self.created_by = Some(user_id.into());
        self
    }

    pub fn get_field(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Merges a validated partial payload into `data` and bumps `updated_at`.
    pub fn merge_data(&mut self, partial: Map<String, Value>) {
        for (key, value) in partial {
            self.data.insert(key, value);
        }
        self.updated_at = now_utc();
    }

    pub fn archive(&mut self) {
        self.is_archived = true;
        self.updated_at = now_utc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_data() -> Map<String, Value> {
        let mut data = Map::new();
        data.insert("full_name".into(), json!("Ada Lovelace"));
        data.insert("email".into(), json!("ada@example.com"));
        data
    }

    #[test]
    fn test_merge_keeps_untouched_keys() {
        let mut record = Record::new("r1", "ws1", "e1", sample_data());
        let mut partial = Map::new();
        partial.insert("email".into(), json!("ada@lovelace.dev"));
        record.merge_data(partial);

        assert_eq!(record.data["full_name"], json!("Ada Lovelace"));
        assert_eq!(record.data["email"], json!("ada@lovelace.dev"));
    }

    #[test]
    fn test_archive_is_soft() {
        let mut record = Record::new("r1", "ws1", "e1", sample_data());
        assert!(!record.is_archived);
        record.archive();
        assert!(record.is_archived);
        assert_eq!(record.data.len(), 2);
    }

    #[test]
    fn test_serde_roundtrip() {
        let record = Record::new("r1", "ws1", "e1", sample_data())
            .with_tags(["lead".to_string(), "priority".to_string()])
            .with_created_by("u1");
        let json = serde_json::to_string(&record).unwrap();
        let back: Record = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, "r1");
        assert_eq!(back.tags.len(), 2);
        assert_eq!(back.created_by.as_deref(), Some("u1"));
    }
}
