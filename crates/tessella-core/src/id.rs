use thiserror::Error;

#[derive(Debug, Error)]
pub enum IdError {
    #[error("Invalid ID: {0}")]
    Invalid(String),
}

/// Generates a new record/rule/log identifier.
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Validates that an identifier is a well-formed UUID.
pub fn validate_id(id: &str) -> Result<(), IdError> {
    uuid::Uuid::parse_str(id)
        .map(|_| ())
        .map_err(|_| IdError::Invalid(id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_valid() {
        let id = generate_id();
        assert!(validate_id(&id).is_ok());
    }

    #[test]
    fn test_generated_ids_are_unique() {
        assert_ne!(generate_id(), generate_id());
    }

    #[test]
    fn test_validate_rejects_non_uuid() {
        assert!(validate_id("rec-123").is_err());
    }
}
