//! Template resolution: substitutes `{{field}}` placeholders using a
//! record's data map.
//!
//! Resolution is total: a missing field becomes an empty string, never an
//! error and never a leftover `{{token}}` in user-facing text.

use serde_json::Value;
use std::sync::LazyLock;
use tessella_core::Record;

static TOKEN_RE: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"\{\{([^{}]*)\}\}").expect("valid token regex"));

/// Resolves every `{{identifier}}` token in `template` against the record.
///
/// Lookup order: record data first, then the reserved identifiers `id`,
/// `created_at`, and `updated_at`.
pub fn resolve(template: &str, record: &Record) -> String {
    if template.is_empty() {
        return String::new();
    }
    TOKEN_RE
        .replace_all(template, |caps: &regex::Captures<'_>| {
            let name = caps[1].trim();
            lookup(record, name).unwrap_or_default()
        })
        .into_owned()
}

fn lookup(record: &Record, name: &str) -> Option<String> {
    if let Some(value) = record.get_field(name) {
        return Some(value_to_string(value));
    }
    match name {
        "id" => Some(record.id.clone()),
        "created_at" => Some(record.created_at.to_string()),
        "updated_at" => Some(record.updated_at.to_string()),
        _ => None,
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record() -> Record {
        let mut data = serde_json::Map::new();
        data.insert("full_name".into(), json!("Ada Lovelace"));
        data.insert("deal_value".into(), json!(1500.5));
        data.insert("subscribed".into(), json!(true));
        data.insert("notes".into(), Value::Null);
        Record::new("rec-1", "ws1", "e1", data)
    }

    #[test]
    fn test_substitutes_record_fields() {
        let out = resolve("Hi {{full_name}}, value is {{deal_value}}", &record());
        assert_eq!(out, "Hi Ada Lovelace, value is 1500.5");
    }

    #[test]
    fn test_reserved_identifiers() {
        let r = record();
        assert_eq!(resolve("{{id}}", &r), "rec-1");
        assert_eq!(resolve("{{created_at}}", &r), r.created_at.to_string());
    }

    #[test]
    fn test_record_data_shadows_reserved() {
        let mut r = record();
        r.data.insert("id".into(), json!("custom-id-field"));
        assert_eq!(resolve("{{id}}", &r), "custom-id-field");
    }

    #[test]
    fn test_missing_field_becomes_empty() {
        assert_eq!(resolve("Hello {{nobody}}!", &record()), "Hello !");
    }

    #[test]
    fn test_null_field_becomes_empty() {
        assert_eq!(resolve("[{{notes}}]", &record()), "[]");
    }

    #[test]
    fn test_whitespace_inside_token() {
        assert_eq!(resolve("{{ full_name }}", &record()), "Ada Lovelace");
    }

    #[test]
    fn test_bool_and_empty_template() {
        assert_eq!(resolve("{{subscribed}}", &record()), "true");
        assert_eq!(resolve("", &record()), "");
    }

    #[test]
    fn test_no_complete_token_survives() {
        let r = record();
        for input in [
            "{{}}",
            "{{  }}",
            "a {{x}} b {{y}} c",
            "{{unknown}}{{unknown}}",
            "{{a}}{{full_name}}{{b}}",
        ] {
            let out = resolve(input, &r);
            assert!(!TOKEN_RE.is_match(&out), "raw token left in {out:?}");
        }
    }

    #[test]
    fn test_unterminated_braces_pass_through() {
        // Not a complete token, so there is nothing to resolve.
        assert_eq!(resolve("{{oops", &record()), "{{oops");
        assert_eq!(resolve("}}{{", &record()), "}}{{");
    }
}
