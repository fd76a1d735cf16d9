//! Structural output checks applied before a task's output is accepted.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// JSON shape of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    #[serde(alias = "mapping", alias = "dict", alias = "map")]
    Object,
    #[serde(alias = "sequence", alias = "list")]
    Array,
    #[serde(alias = "str")]
    String,
    Number,
    #[serde(alias = "bool")]
    Boolean,
    Null,
}

impl ValueKind {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Object(_) => Self::Object,
            Value::Array(_) => Self::Array,
            Value::String(_) => Self::String,
            Value::Number(_) => Self::Number,
            Value::Bool(_) => Self::Boolean,
            Value::Null => Self::Null,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Object => "object",
            Self::Array => "array",
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Null => "null",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-task acceptance rules.
///
/// Accepts both `{"type": "object", "requiredFields": [..]}` and the snake_case
/// spelling so rules can live in TOML config as well as JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRules {
    #[serde(rename = "type", alias = "kind", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ValueKind>,
    #[serde(
        rename = "requiredFields",
        alias = "required_fields",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub required_fields: Vec<String>,
}

impl ValidationRules {
    pub fn of_kind(kind: ValueKind) -> Self {
        Self {
            kind: Some(kind),
            required_fields: Vec::new(),
        }
    }

    pub fn object() -> Self {
        Self::of_kind(ValueKind::Object)
    }

    pub fn array() -> Self {
        Self::of_kind(ValueKind::Array)
    }

    /// Rules that only require fields, without pinning the type.
    pub fn fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::default().require(fields)
    }

    pub fn require<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_fields
            .extend(fields.into_iter().map(Into::into));
        self
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("expected {expected}, got {actual}")]
    TypeMismatch { expected: ValueKind, actual: ValueKind },

    #[error("required fields need an object, got {0}")]
    NotAnObject(ValueKind),

    #[error("missing or empty required field '{0}'")]
    MissingField(String),
}

/// Check `output` against `rules`. Absent rules always pass.
///
/// The check is shallow: only top-level required fields are inspected.
pub fn validate(output: &Value, rules: Option<&ValidationRules>) -> Result<(), ValidationError> {
    let Some(rules) = rules else {
        return Ok(());
    };

    let actual = ValueKind::of(output);
    if let Some(expected) = rules.kind {
        if expected != actual {
            return Err(ValidationError::TypeMismatch { expected, actual });
        }
    }

    if rules.required_fields.is_empty() {
        return Ok(());
    }

    let Value::Object(map) = output else {
        return Err(ValidationError::NotAnObject(actual));
    };

    for field in &rules.required_fields {
        if !map.get(field).is_some_and(is_truthy) {
            return Err(ValidationError::MissingField(field.clone()));
        }
    }

    Ok(())
}

pub fn is_valid(output: &Value, rules: Option<&ValidationRules>) -> bool {
    validate(output, rules).is_ok()
}

/// `false` for null, `false`, zero, and empty strings, arrays or objects.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
