//! Record validator: checks and normalizes a record payload against an
//! entity's field schema.
//!
//! Validation never short-circuits; every field-level problem is collected so
//! a client can fix all of them in one round trip. On success the payload is
//! returned unmodified except for type coercion (numeric strings become
//! numbers, dates become canonical ISO form, emails are lowercased), which
//! makes re-validation of an already-normalized payload a no-op.

use crate::error::{CoreError, Result};
use crate::schema::{Entity, FieldDefinition, FieldType};
use crate::time::{canonical_date, canonical_datetime};
use serde_json::{Map, Number, Value};
use std::sync::LazyLock;
use tracing::debug;

static EMAIL_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
        .expect("valid email regex")
});

/// Whether the payload is a full create or a partial update.
///
/// Updates are partial merges: absent required fields are not an error there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    Create,
    Update,
}

/// Validates `payload` against `entity`'s field list.
///
/// Returns the normalized payload, or a `CoreError::Validation` carrying one
/// message per failing field. Keys not present in the schema pass through
/// unvalidated so evolving schemas stay forward-compatible.
pub fn validate_record_data(
    entity: &Entity,
    payload: &Map<String, Value>,
    mode: ValidationMode,
) -> Result<Map<String, Value>> {
    let mut normalized = Map::new();
    let mut errors = Vec::new();

    for field in &entity.fields {
        let value = payload.get(&field.name);
        let label = &field.display_name;

        let is_empty = matches!(value, None | Some(Value::Null))
            || matches!(value, Some(Value::String(s)) if s.is_empty());

        if field.required && is_empty {
            if mode == ValidationMode::Create {
                errors.push(format!("Field '{label}' is required"));
            }
            continue;
        }

        let Some(value) = value else { continue };
        if value.is_null() {
            continue;
        }

        // Empty strings on optional fields are stored as-is.
        if matches!(value, Value::String(s) if s.is_empty()) {
            normalized.insert(field.name.clone(), value.clone());
            continue;
        }

        match validate_field_value(value, field) {
            Ok(valid) => {
                normalized.insert(field.name.clone(), valid);
            }
            Err(message) => errors.push(format!("{label}: {message}")),
        }
    }

    // Unknown keys pass through untouched for forward-compatibility.
    for (key, value) in payload {
        if entity.field(key).is_none() {
            debug!(field = %key, entity = %entity.entity_name, "unknown field in record payload");
            normalized.insert(key.clone(), value.clone());
        }
    }

    if errors.is_empty() {
        Ok(normalized)
    } else {
        Err(CoreError::validation(errors))
    }
}

/// Validates a single value against one field definition.
///
/// Returns the (possibly coerced) value, or a message suitable for prefixing
/// with the field's display name.
pub fn validate_field_value(
    value: &Value,
    field: &FieldDefinition,
) -> std::result::Result<Value, String> {
    match field.field_type {
        FieldType::Text | FieldType::Textarea => {
            let s = as_str(value).ok_or("Must be text")?;
            if let Some(max) = field.validation.as_ref().and_then(|v| v.max_length)
                && s.chars().count() > max
            {
                return Err(format!("Maximum length is {max} characters"));
            }
            Ok(value.clone())
        }
        FieldType::Email => {
            let s = as_str(value).ok_or("Must be a string")?;
            if !EMAIL_RE.is_match(s) {
                return Err("Invalid email format".to_string());
            }
            Ok(Value::String(s.to_lowercase()))
        }
        FieldType::Phone => {
            let s = as_str(value).ok_or("Must be a string")?;
            if s.trim().is_empty() {
                return Err("Invalid phone number".to_string());
            }
            Ok(value.clone())
        }
        FieldType::Number | FieldType::Currency => {
            let num = coerce_number(value).ok_or("Must be a number")?;
            if let Some(validation) = &field.validation {
                if let Some(min) = validation.min
                    && num < min
                {
                    return Err(format!("Must be at least {min}"));
                }
                if let Some(max) = validation.max
                    && num > max
                {
                    return Err(format!("Must be at most {max}"));
                }
            }
            let number = Number::from_f64(num).ok_or("Must be a finite number")?;
            Ok(Value::Number(number))
        }
        FieldType::Select => {
            let s = as_str(value).ok_or("Must be a string")?;
            if field.options.is_empty() || field.options.iter().any(|o| o == s) {
                Ok(value.clone())
            } else {
                Err(format!("Must be one of: {}", field.options.join(", ")))
            }
        }
        FieldType::Multiselect => {
            let items = value.as_array().ok_or("Must be a list")?;
            for item in items {
                let s = as_str(item).ok_or("Must be a list of strings")?;
                if !field.options.is_empty() && !field.options.iter().any(|o| o == s) {
                    return Err(format!("'{s}' is not a valid option"));
                }
            }
            Ok(value.clone())
        }
        FieldType::Checkbox => {
            if value.is_boolean() {
                Ok(value.clone())
            } else {
                Err("Must be true or false".to_string())
            }
        }
        FieldType::Date => {
            let s = as_str(value).ok_or("Must be a string")?;
            canonical_date(s)
                .map(Value::String)
                .map_err(|_| "Invalid date format (use YYYY-MM-DD)".to_string())
        }
        FieldType::Datetime => {
            let s = as_str(value).ok_or("Must be a string")?;
            canonical_datetime(s)
                .map(Value::String)
                .map_err(|_| "Invalid datetime format (use ISO 8601)".to_string())
        }
        FieldType::Url => {
            let s = as_str(value).ok_or("Must be a string")?;
            match url::Url::parse(s) {
                Ok(_) => Ok(value.clone()),
                Err(_) => Err("Invalid URL format".to_string()),
            }
        }
        FieldType::File | FieldType::User | FieldType::Relation => {
            let s = as_str(value).ok_or("Must be a reference id")?;
            if s.is_empty() {
                Err("Must be a reference id".to_string())
            } else {
                Ok(value.clone())
            }
        }
    }
}

fn as_str(value: &Value) -> Option<&str> {
    value.as_str()
}

fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}
