//! Persuasion template libraries used by the advanced analysis components.
//!
//! Every library is keyed by a closed enum resolved once from its input, and
//! each generator returns plain JSON so the executor validator can check it.

pub mod anti_objection;
pub mod llm_json;
pub mod mental_drivers;
pub mod pre_pitch;
pub mod predictions;
pub mod visual_proofs;

use serde_json::Value;
use thiserror::Error;

use crate::error::TaskFault;

pub use anti_objection::{AntiObjectionGenerator, ObjectionKind};
pub use llm_json::extract_json;
pub use mental_drivers::{DriverKind, MentalDriverGenerator};
pub use pre_pitch::{PitchPhase, PrePitchGenerator};
pub use predictions::FuturePredictor;
pub use visual_proofs::{Impact, ProofCategory, SegmentProfile, VisualProofGenerator};

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("missing input: {0}")]
    MissingInput(String),

    #[error("no valid {0} produced")]
    NothingValid(String),

    #[error("ai provider failed: {0}")]
    Ai(String),

    #[error("invalid ai response: {0}")]
    AiResponse(String),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl From<GeneratorError> for TaskFault {
    fn from(err: GeneratorError) -> Self {
        TaskFault::new(err.to_string())
    }
}

/// Non-empty trimmed string at `key`.
pub(crate) fn text<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Strings of the array at `key`; non-string items are rendered as JSON.
pub(crate) fn string_list(value: &Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|v| match v {
                    Value::String(s) => s.trim().to_string(),
                    other => other.to_string(),
                })
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

pub(crate) fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_list_skips_blank_items() {
        let v = json!({"pains": ["  slow growth ", "", 42]});
        assert_eq!(string_list(&v, "pains"), vec!["slow growth", "42"]);
        assert!(string_list(&v, "missing").is_empty());
    }

    #[test]
    fn test_generator_error_becomes_fault() {
        let fault: TaskFault = GeneratorError::MissingInput("avatar".into()).into();
        assert_eq!(fault.message(), "missing input: avatar");
    }
}
