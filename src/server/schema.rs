//! JSON schemas for request validation.
//!
//! Bodies and query strings are validated as JSON values before they are
//! deserialized, so every violation is reported at once with its path.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde_json::{json, Map, Value};

use super::error::{ApiError, ValidationDetail};

pub struct RequestSchema {
    schema: Value,
    validator: jsonschema::Validator,
}

impl RequestSchema {
    fn new(schema: Value) -> RequestSchema {
        let validator = jsonschema::validator_for(&schema).expect("request schema should compile");
        RequestSchema { schema, validator }
    }

    /// Query parameters as a JSON object. Values of properties this schema
    /// types as integers are parsed so that numeric constraints apply; every
    /// other value stays a string.
    pub fn query_to_json(&self, params: HashMap<String, String>) -> Value {
        let object: Map<String, Value> = params
            .into_iter()
            .map(|(key, value)| {
                let number = self
                    .is_integer_property(&key)
                    .then(|| value.parse::<i64>().ok())
                    .flatten();
                let value = match number {
                    Some(number) => Value::from(number),
                    None => Value::String(value),
                };
                (key, value)
            })
            .collect();
        Value::Object(object)
    }

    fn is_integer_property(&self, key: &str) -> bool {
        self.schema["properties"][key]["type"] == "integer"
    }

    pub fn validate(&self, instance: &Value) -> Result<(), ApiError> {
        let details: Vec<ValidationDetail> = self
            .validator
            .iter_errors(instance)
            .map(|error| ValidationDetail {
                path: error.instance_path.to_string(),
                message: error.to_string(),
            })
            .collect();

        if details.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation("Invalid request", details))
        }
    }
}

pub static SEARCH_REQUEST: Lazy<RequestSchema> = Lazy::new(|| {
    RequestSchema::new(json!({
        "type": "object",
        "properties": {
            "query": { "type": "string", "minLength": 1 },
            "graphId": { "type": "string" },
            "type": { "enum": ["all", "pages", "blocks"] },
            "limit": { "type": "integer", "minimum": 1, "maximum": 100 }
        },
        "required": ["query"]
    }))
});

pub static SUGGESTIONS_QUERY: Lazy<RequestSchema> = Lazy::new(|| {
    RequestSchema::new(json!({
        "type": "object",
        "properties": {
            "q": { "type": "string", "minLength": 1 },
            "graphId": { "type": "string" },
            "limit": { "type": "integer", "minimum": 1, "maximum": 100 }
        },
        "required": ["q"]
    }))
});

#[cfg(test)]
mod tests {
    use super::*;

    fn details(result: Result<(), ApiError>) -> Vec<ValidationDetail> {
        match result {
            Err(ApiError::Validation { details, .. }) => details,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_search_request() {
        let request = json!({ "query": "rust", "type": "pages", "limit": 5, "graphId": "g" });
        assert!(SEARCH_REQUEST.validate(&request).is_ok());
    }

    #[test]
    fn test_search_request_violations_have_paths() {
        let request = json!({ "query": "", "type": "everything", "limit": 500 });
        let details = details(SEARCH_REQUEST.validate(&request));

        let mut paths: Vec<_> = details.iter().map(|d| d.path.as_str()).collect();
        paths.sort_unstable();
        assert_eq!(paths, vec!["/limit", "/query", "/type"]);
    }

    #[test]
    fn test_missing_query_is_reported() {
        let details = details(SEARCH_REQUEST.validate(&json!({})));
        assert_eq!(details.len(), 1);
        assert!(details[0].message.contains("query"));
    }

    #[test]
    fn test_query_params_are_typed() {
        let params = HashMap::from([
            ("q".to_string(), "技术".to_string()),
            ("limit".to_string(), "5".to_string()),
        ]);
        let value = SUGGESTIONS_QUERY.query_to_json(params);

        assert_eq!(value, json!({ "q": "技术", "limit": 5 }));
        assert!(SUGGESTIONS_QUERY.validate(&value).is_ok());
    }

    #[test]
    fn test_numeric_strings_stay_strings() {
        let params = HashMap::from([
            ("q".to_string(), "2024".to_string()),
            ("graphId".to_string(), "42".to_string()),
        ]);
        let value = SUGGESTIONS_QUERY.query_to_json(params);

        assert_eq!(value, json!({ "q": "2024", "graphId": "42" }));
        assert!(SUGGESTIONS_QUERY.validate(&value).is_ok());
    }

    #[test]
    fn test_non_numeric_limit_is_rejected() {
        let params = HashMap::from([
            ("q".to_string(), "a".to_string()),
            ("limit".to_string(), "many".to_string()),
        ]);
        assert!(SUGGESTIONS_QUERY
            .validate(&SUGGESTIONS_QUERY.query_to_json(params))
            .is_err());
    }
}
