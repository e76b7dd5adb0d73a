use serde_json::{Map, Value};

use crate::errors::{CondensrError, Result};

/// Parse free-form link metadata.
///
/// Empty input and `{}` give an empty object. Anything else must be a JSON
/// object.
pub fn validate_metadata(input: &str) -> Result<Map<String, Value>> {
    let trimmed = input.trim();
    if trimmed.is_empty() || trimmed == "{}" {
        return Ok(Map::new());
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(CondensrError::link_invalid_metadata(
            "invalid metadata JSON: expected an object",
        )),
        Err(e) => Err(CondensrError::link_invalid_metadata(format!(
            "invalid metadata JSON: {}",
            e
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_metadata_is_accepted() {
        assert!(validate_metadata("").unwrap().is_empty());
        assert!(validate_metadata("  {}  ").unwrap().is_empty());
    }

    #[test]
    fn test_object_metadata() {
        let map = validate_metadata(r#"{"campaign":"spring","priority":2}"#).unwrap();
        assert_eq!(map.get("priority"), Some(&Value::from(2)));
    }

    #[test]
    fn test_invalid_metadata() {
        let err = validate_metadata("{not json").unwrap_err();
        assert!(matches!(err, CondensrError::LinkInvalidMetadata(_)));
        assert!(err.message().starts_with("invalid metadata JSON"));

        assert!(validate_metadata("[1,2]").is_err());
    }
}
