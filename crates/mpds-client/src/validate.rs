//! JSON schema validation of API responses.
//!
//! Every entry of a response page is checked against a schema for its
//! entry kind. MPDS publishes its schemas as draft 3; they are compiled
//! here as draft 4, which accepts the keywords they use.

use jsonschema::{Draft, Validator};
use serde::Serialize;
use serde_json::Value;

use crate::error::{ApiError, ApiResult};

/// A schema failure of one entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Position of the entry in `out`.
    pub index: usize,
    pub message: String,
}

/// Outcome of validating one response page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub checked: usize,
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

pub fn compile_schema(schema: &Value) -> ApiResult<Validator> {
    jsonschema::options()
        .with_draft(Draft::Draft4)
        .build(schema)
        .map_err(|err| ApiError::Schema(format!("invalid schema: {err}")))
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Validate every entry of a response page against `schema`.
///
/// A response without pages or entries, or one carrying an error, is
/// rejected as a whole.
pub fn validate_response(schema: &Value, response: &Value) -> ApiResult<ValidationReport> {
    let validator = compile_schema(schema)?;

    let npages = response.get("npages").and_then(Value::as_u64).unwrap_or(0);
    let has_error = response.get("error").is_some_and(is_truthy);
    let out = response
        .get("out")
        .and_then(Value::as_array)
        .filter(|out| !out.is_empty());

    let Some(out) = out.filter(|_| npages > 0 && !has_error) else {
        return Err(ApiError::InvalidResponse(
            "not a valid API response".to_string(),
        ));
    };

    let violations = out
        .iter()
        .enumerate()
        .flat_map(|(index, entry)| {
            validator.iter_errors(entry).map(move |err| Violation {
                index,
                message: err.to_string(),
            })
        })
        .collect();

    Ok(ValidationReport {
        checked: out.len(),
        violations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> Value {
        json!({
            "type": "object",
            "required": ["object_type", "phase_id"],
            "properties": {
                "object_type": {"type": "string", "enum": ["S", "P", "C"]},
                "phase_id": {"type": "integer"}
            }
        })
    }

    #[test]
    fn test_valid_response() {
        let response = json!({
            "npages": 1,
            "count": 2,
            "error": null,
            "out": [{"object_type": "S", "phase_id": 1}, {"object_type": "P", "phase_id": 2}]
        });
        let report = validate_response(&schema(), &response).unwrap();
        assert_eq!(report.checked, 2);
        assert!(report.is_valid());
    }

    #[test]
    fn test_violations_are_indexed() {
        let response = json!({
            "npages": 1,
            "out": [{"object_type": "S", "phase_id": 1}, {"object_type": "Q"}]
        });
        let report = validate_response(&schema(), &response).unwrap();
        assert!(!report.is_valid());
        assert!(report.violations.iter().all(|v| v.index == 1));
        assert_eq!(report.violations.len(), 2);
    }

    #[test]
    fn test_error_response_rejected() {
        let response = json!({"npages": 1, "out": [{}], "error": "Unknown facet"});
        assert!(matches!(
            validate_response(&schema(), &response),
            Err(ApiError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_empty_response_rejected() {
        assert!(validate_response(&schema(), &json!({"npages": 0, "out": []})).is_err());
        assert!(validate_response(&schema(), &json!({"npages": 1, "out": []})).is_err());
        assert!(validate_response(&schema(), &json!({})).is_err());
    }

    #[test]
    fn test_bad_schema() {
        let err = validate_response(&json!({"type": 12}), &json!({"npages": 1, "out": [{}]}));
        assert!(matches!(err, Err(ApiError::Schema(_))));
    }
}
