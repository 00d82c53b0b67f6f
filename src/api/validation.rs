//! Request validation
//!
//! Per-field failure records produced from `validator` results. Field order
//! is made deterministic (fields sorted by name, rules in declaration order)
//! so clients and tests see a stable sequence.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::ValidationErrors;

/// One failing rule on one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidationFailure {
    /// Field that failed
    pub field: String,
    /// Rule tag, e.g. `length` or `range`
    pub tag: String,
    /// Rejected value
    pub value: serde_json::Value,
    pub is_error: bool,
}

impl ValidationFailure {
    pub fn new(field: impl Into<String>, tag: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            field: field.into(),
            tag: tag.into(),
            value,
            is_error: true,
        }
    }
}

/// Flatten [`ValidationErrors`] into ordered failure records.
pub fn collect_failures(errors: &ValidationErrors) -> Vec<ValidationFailure> {
    let mut fields: Vec<(String, Vec<ValidationFailure>)> = errors
        .field_errors()
        .into_iter()
        .map(|(field, rules)| {
            let failures = rules
                .iter()
                .map(|rule| {
                    ValidationFailure::new(
                        field.to_string(),
                        rule.code.to_string(),
                        rule.params
                            .get("value")
                            .cloned()
                            .unwrap_or(serde_json::Value::Null),
                    )
                })
                .collect();
            (field.to_string(), failures)
        })
        .collect();

    fields.sort_by(|a, b| a.0.cmp(&b.0));
    fields.into_iter().flat_map(|(_, failures)| failures).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use validator::Validate;

    #[derive(Debug, Validate)]
    struct TestRequest {
        #[validate(length(min = 1))]
        name: String,
        #[validate(range(min = 1))]
        quantity: i32,
    }

    #[test]
    fn test_valid_request_produces_no_failures() {
        let request = TestRequest {
            name: "till roll".to_string(),
            quantity: 3,
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_failures_are_collected_in_field_order() {
        let request = TestRequest {
            name: String::new(),
            quantity: 0,
        };
        let errors = request.validate().unwrap_err();
        let failures = collect_failures(&errors);

        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].field, "name");
        assert_eq!(failures[0].tag, "length");
        assert_eq!(failures[1].field, "quantity");
        assert_eq!(failures[1].tag, "range");
        assert!(failures.iter().all(|f| f.is_error));
    }

    #[test]
    fn test_failure_carries_rejected_value() {
        let request = TestRequest {
            name: "x".to_string(),
            quantity: -2,
        };
        let errors = request.validate().unwrap_err();
        let failures = collect_failures(&errors);

        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].value, json!(-2));
    }

    #[test]
    fn test_serializes_camel_case() {
        let failure = ValidationFailure::new("name", "length", json!(""));
        let value = serde_json::to_value(&failure).unwrap();
        assert_eq!(
            value,
            json!({"field": "name", "tag": "length", "value": "", "isError": true})
        );
    }
}
