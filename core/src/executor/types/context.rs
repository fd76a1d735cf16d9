use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Key under which accepted outputs of earlier tasks are exposed.
pub const PREVIOUS_RESULTS_KEY: &str = "previous_results";

/// Context handed to every task handler during a run.
///
/// Holds the caller's initial input plus the accepted output of every task that
/// succeeded earlier in the same run. It only grows while a run is in progress.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionContext {
    input: Map<String, Value>,
    previous_results: Map<String, Value>,
}

impl ExecutionContext {
    /// Build a context from the initial input bundle.
    ///
    /// Objects are used as-is, `null` becomes an empty input, and any other value
    /// is stored under the `input` key.
    pub fn new(input: Value) -> Self {
        let input = match input {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("input".to_string(), other);
                map
            }
        };
        Self {
            input,
            previous_results: Map::new(),
        }
    }

    pub fn input(&self) -> &Map<String, Value> {
        &self.input
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.input.get(key)
    }

    /// Non-empty trimmed string field of the initial input.
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.input
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn previous(&self, task: &str) -> Option<&Value> {
        self.previous_results.get(task)
    }

    pub fn previous_results(&self) -> &Map<String, Value> {
        &self.previous_results
    }

    /// Deserialize the initial input into a typed struct.
    pub fn decode_input<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(Value::Object(self.input.clone()))
    }

    /// Deserialize the accepted output of an earlier task.
    pub fn decode_previous<T: DeserializeOwned>(
        &self,
        task: &str,
    ) -> Option<Result<T, serde_json::Error>> {
        self.previous_results
            .get(task)
            .map(|v| serde_json::from_value(v.clone()))
    }

    /// Merged view: the initial input with `previous_results` attached.
    pub fn to_value(&self) -> Value {
        let mut merged = self.input.clone();
        merged.insert(
            PREVIOUS_RESULTS_KEY.to_string(),
            Value::Object(self.previous_results.clone()),
        );
        Value::Object(merged)
    }

    pub(crate) fn record_success(&mut self, task: &str, output: Value) {
        self.previous_results.insert(task.to_string(), output);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_merged_view_contains_previous_results() {
        let mut ctx = ExecutionContext::new(json!({"segment": "dental clinics"}));
        ctx.record_success("research", json!({"sources": 3}));

        assert_eq!(
            ctx.to_value(),
            json!({
                "segment": "dental clinics",
                "previous_results": {"research": {"sources": 3}}
            })
        );
    }

    #[test]
    fn test_non_object_input_is_wrapped() {
        let ctx = ExecutionContext::new(json!("raw"));
        assert_eq!(ctx.get("input"), Some(&json!("raw")));
        assert!(ExecutionContext::new(Value::Null).input().is_empty());
    }

    #[test]
    fn test_str_field_ignores_blank_values() {
        let ctx = ExecutionContext::new(json!({"segment": "   ", "product": " course "}));
        assert_eq!(ctx.str_field("segment"), None);
        assert_eq!(ctx.str_field("product"), Some("course"));
    }
}
