//! Field schema model: the per-entity field definitions that record payloads
//! are validated against.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::LazyLock;

static FIELD_NAME_RE: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"^[a-z_][a-z0-9_]*$").expect("valid field name regex"));

/// The supported field types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Textarea,
    Email,
    Phone,
    Number,
    Currency,
    Select,
    Multiselect,
    Checkbox,
    Date,
    Datetime,
    Url,
    File,
    User,
    Relation,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Textarea => "textarea",
            FieldType::Email => "email",
            FieldType::Phone => "phone",
            FieldType::Number => "number",
            FieldType::Currency => "currency",
            FieldType::Select => "select",
            FieldType::Multiselect => "multiselect",
            FieldType::Checkbox => "checkbox",
            FieldType::Date => "date",
            FieldType::Datetime => "datetime",
            FieldType::Url => "url",
            FieldType::File => "file",
            FieldType::User => "user",
            FieldType::Relation => "relation",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "text" => Some(FieldType::Text),
            "textarea" => Some(FieldType::Textarea),
            "email" => Some(FieldType::Email),
            "phone" => Some(FieldType::Phone),
            "number" => Some(FieldType::Number),
            "currency" => Some(FieldType::Currency),
            "select" => Some(FieldType::Select),
            "multiselect" => Some(FieldType::Multiselect),
            "checkbox" => Some(FieldType::Checkbox),
            "date" => Some(FieldType::Date),
            "datetime" => Some(FieldType::Datetime),
            "url" => Some(FieldType::Url),
            "file" => Some(FieldType::File),
            "user" => Some(FieldType::User),
            "relation" => Some(FieldType::Relation),
            _ => None,
        }
    }

    /// Whether values of this type are plain strings, which makes the field
    /// eligible for free-text search.
    pub fn is_string_valued(&self) -> bool {
        matches!(
            self,
            FieldType::Text
                | FieldType::Textarea
                | FieldType::Email
                | FieldType::Phone
                | FieldType::Select
                | FieldType::Date
                | FieldType::Datetime
                | FieldType::Url
                | FieldType::File
                | FieldType::User
                | FieldType::Relation
        )
    }

    /// Whether this type requires a non-empty `options` list.
    pub fn requires_options(&self) -> bool {
        matches!(self, FieldType::Select | FieldType::Multiselect)
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Optional numeric/length bounds attached to a field definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldValidation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
}

/// One field in an entity schema.
///
/// `name` is the internal key in record data and is immutable once records
/// exist; `display_name` is what validation messages reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    pub display_name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    /// Allowed values, only meaningful for select/multiselect.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<FieldValidation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
}

impl FieldDefinition {
    /// Creates a field definition, checking the name pattern and the
    /// options requirement for select types.
    pub fn new(
        name: impl Into<String>,
        display_name: impl Into<String>,
        field_type: FieldType,
    ) -> Result<Self> {
        let name = name.into();
        if !FIELD_NAME_RE.is_match(&name) {
            return Err(CoreError::invalid_field_name(name));
        }
        Ok(Self {
            name,
            display_name: display_name.into(),
            field_type,
            required: false,
            options: Vec::new(),
            validation: None,
            default_value: None,
        })
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_validation(mut self, validation: FieldValidation) -> Self {
        self.validation = Some(validation);
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }

    /// Checks invariants that `new` cannot see yet (option lists are often
    /// attached after construction).
    pub fn check(&self) -> Result<()> {
        if !FIELD_NAME_RE.is_match(&self.name) {
            return Err(CoreError::invalid_field_name(self.name.clone()));
        }
        if self.field_type.requires_options() && self.options.is_empty() {
            return Err(CoreError::invalid_entity(format!(
                "Field '{}' of type {} requires a non-empty options list",
                self.name, self.field_type
            )));
        }
        Ok(())
    }
}

/// A user-defined record type: an ordered field schema scoped to a workspace.
///
/// `entity_name` never changes after creation. Fields may be appended over
/// time; removing a field is a soft operation, so record data may carry stale
/// keys that the validator ignores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    pub workspace_id: String,
    pub entity_name: String,
    pub display_name: String,
    pub fields: Vec<FieldDefinition>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

impl Entity {
    /// Creates an entity, requiring at least one valid field.
    pub fn new(
        id: impl Into<String>,
        workspace_id: impl Into<String>,
        entity_name: impl Into<String>,
        display_name: impl Into<String>,
        fields: Vec<FieldDefinition>,
    ) -> Result<Self> {
        if fields.is_empty() {
            return Err(CoreError::invalid_entity(
                "An entity requires at least one field",
            ));
        }
        for field in &fields {
            field.check()?;
        }
        Ok(Self {
            id: id.into(),
            workspace_id: workspace_id.into(),
            entity_name: entity_name.into(),
            display_name: display_name.into(),
            fields,
            is_active: true,
        })
    }

    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Appends a field to the schema. Existing fields are never replaced.
    pub fn add_field(&mut self, field: FieldDefinition) -> Result<()> {
        field.check()?;
        if self.field(&field.name).is_some() {
            return Err(CoreError::invalid_entity(format!(
                "Field '{}' already exists",
                field.name
            )));
        }
        self.fields.push(field);
        Ok(())
    }

    /// The select field that drives Kanban grouping and status triggers:
    /// the first select-typed field whose name contains "status".
    pub fn status_field(&self) -> Option<&FieldDefinition> {
        self.fields
            .iter()
            .find(|f| f.field_type == FieldType::Select && f.name.contains("status"))
    }

    /// Names of all string-valued fields, used for free-text search.
    pub fn string_field_names(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| f.field_type.is_string_valued())
            .map(|f| f.name.as_str())
            .collect()
    }
}
