//! Core types for the Tessella CRM engine: entity field schemas, record
//! documents, and the record validator.

pub mod error;
pub mod id;
pub mod record;
pub mod schema;
pub mod time;
pub mod validate;

pub use error::{CoreError, ErrorCategory, Result};
pub use id::{IdError, generate_id, validate_id};
pub use record::Record;
pub use schema::{Entity, FieldDefinition, FieldType, FieldValidation};
pub use time::{Timestamp, now_utc};
pub use validate::{ValidationMode, validate_field_value, validate_record_data};
