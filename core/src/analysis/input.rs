use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::AnalysisError;

/// Project description supplied by the user.
///
/// Portuguese keys from older request payloads are accepted as aliases.
/// Unknown keys are kept in `extra` and flow through to the report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectInput {
    #[serde(default, alias = "segmento")]
    pub segment: String,

    #[serde(default, alias = "produto", skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,

    #[serde(
        default,
        alias = "publico",
        alias = "target_audience",
        skip_serializing_if = "Option::is_none"
    )]
    pub audience: Option<String>,

    #[serde(
        default,
        alias = "preco",
        deserialize_with = "loose_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub price: Option<String>,

    #[serde(
        default,
        alias = "objetivo_receita",
        deserialize_with = "loose_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub revenue_goal: Option<String>,

    #[serde(
        default,
        alias = "orcamento_marketing",
        deserialize_with = "loose_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub marketing_budget: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Accept numbers as well as strings for free-form money fields.
fn loose_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

fn non_empty(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl ProjectInput {
    pub fn from_value(value: Value) -> Result<Self, AnalysisError> {
        serde_json::from_value(value).map_err(|e| AnalysisError::InvalidInput(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), AnalysisError> {
        let segment = self.segment.trim();
        if segment.is_empty() {
            return Err(AnalysisError::InvalidInput(
                "segment is required".to_string(),
            ));
        }
        if segment.chars().count() < 3 {
            return Err(AnalysisError::InvalidInput(
                "segment must have at least 3 characters".to_string(),
            ));
        }
        Ok(())
    }

    pub fn product(&self) -> Option<&str> {
        non_empty(&self.product)
    }

    pub fn audience(&self) -> Option<&str> {
        non_empty(&self.audience)
    }

    pub fn product_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.product().unwrap_or(default)
    }

    pub fn audience_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.audience().unwrap_or(default)
    }

    pub fn price_or<'a>(&'a self, default: &'a str) -> &'a str {
        non_empty(&self.price).unwrap_or(default)
    }

    pub fn revenue_goal_or<'a>(&'a self, default: &'a str) -> &'a str {
        non_empty(&self.revenue_goal).unwrap_or(default)
    }

    pub fn marketing_budget_or<'a>(&'a self, default: &'a str) -> &'a str {
        non_empty(&self.marketing_budget).unwrap_or(default)
    }
}
