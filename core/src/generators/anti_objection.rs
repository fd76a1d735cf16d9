//! Anti-objection arsenal built from the avatar's stated objections.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{llm_json::extract_json, now_rfc3339, string_list, GeneratorError};
use crate::analysis::ProjectInput;
use crate::backend::AiProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectionKind {
    Price,
    Priority,
    Time,
    Trust,
    SelfBelief,
    Complexity,
    General,
}

impl ObjectionKind {
    const CLASSIFIED: [ObjectionKind; 6] = [
        Self::Price,
        Self::Priority,
        Self::Time,
        Self::Trust,
        Self::SelfBelief,
        Self::Complexity,
    ];

    fn keywords(self) -> &'static [&'static str] {
        match self {
            Self::Price => &["price", "expensive", "money", "cost", "afford", "budget", "invest"],
            Self::Priority => &["not now", "priority", "right moment", "timing", "later"],
            Self::Time => &["time", "busy", "schedule", "hours"],
            Self::Trust => &["trust", "scam", "guarantee", "proof", "skeptic", "work for me"],
            Self::SelfBelief => &["can't", "cannot", "not good enough", "capable", "too old", "myself"],
            Self::Complexity => &["complicated", "complex", "difficult", "technical", "hard"],
            Self::General => &[],
        }
    }

    pub fn classify(objection: &str) -> Self {
        let lower = objection.to_lowercase();
        Self::CLASSIFIED
            .into_iter()
            .find(|k| k.keywords().iter().any(|w| lower.contains(w)))
            .unwrap_or(Self::General)
    }

    pub fn strategy(self) -> &'static str {
        match self {
            Self::Price => "Cost of inaction",
            Self::Priority => "Window of opportunity",
            Self::Time => "Time multiplication",
            Self::Trust => "Stacked proof",
            Self::SelfBelief => "Identity bridge",
            Self::Complexity => "Simplified mechanism",
            Self::General => "Empathic reframe",
        }
    }

    fn reframe(self, segment: &str) -> String {
        match self {
            Self::Price => format!(
                "The real question is not what this costs, but how much staying where you are in {segment} costs you every month."
            ),
            Self::Priority => format!(
                "There is never a perfect moment in {segment}; the people ahead of you simply started before they felt ready."
            ),
            Self::Time => format!(
                "You do not lack time, you lack a system that gives time back. Everything here is built to save hours in {segment}, not consume them."
            ),
            Self::Trust => format!(
                "Doubt is healthy. That is why everything shown is backed by real {segment} results you can check yourself."
            ),
            Self::SelfBelief => format!(
                "Every person who succeeded in {segment} started exactly where you are, with the same doubts about themselves."
            ),
            Self::Complexity => format!(
                "It only looks complicated from the outside. Broken into steps, {segment} becomes a sequence anyone can follow."
            ),
            Self::General => format!(
                "That concern makes sense, and it is exactly what most people in {segment} feel right before a decision that changes their results."
            ),
        }
    }

    fn proof(self) -> &'static str {
        match self {
            Self::Price => "Show the monthly loss calculation next to the investment",
            Self::Priority => "Timeline of what the market did in the last 12 months",
            Self::Time => "Before/after agenda of a student who applied the system",
            Self::Trust => "Case studies, testimonials and a clear guarantee",
            Self::SelfBelief => "Story of a student with a similar starting point",
            Self::Complexity => "Step-by-step diagram of the method",
            Self::General => "Most relevant social proof for the audience",
        }
    }

    fn closing_question(self) -> &'static str {
        match self {
            Self::Price => "How much longer can you afford to pay the price of not changing?",
            Self::Priority => "If not now, when exactly?",
            Self::Time => "Would you trade a few hours now for years of freedom?",
            Self::Trust => "What would you need to see to be certain?",
            Self::SelfBelief => "What if the only difference between you and them was the decision?",
            Self::Complexity => "If someone gave you the map, would you follow it?",
            Self::General => "What is really holding you back?",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptSource {
    Template,
    Ai,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectionResponse {
    pub objection: String,
    pub kind: ObjectionKind,
    pub strategy: String,
    pub reframe: String,
    pub proof: String,
    pub script: String,
    pub closing_question: String,
    pub source: ScriptSource,
}

impl ObjectionResponse {
    fn from_template(objection: &str, segment: &str) -> Self {
        let kind = ObjectionKind::classify(objection);
        let reframe = kind.reframe(segment);
        let closing_question = kind.closing_question().to_string();
        Self {
            objection: objection.to_string(),
            kind,
            strategy: kind.strategy().to_string(),
            script: format!(
                "I understand when you say \"{objection}\". {reframe} {closing_question}"
            ),
            reframe,
            proof: kind.proof().to_string(),
            closing_question,
            source: ScriptSource::Template,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RefinedScripts {
    #[serde(default)]
    responses: Vec<RefinedScript>,
}

#[derive(Debug, Deserialize)]
struct RefinedScript {
    objection: String,
    script: String,
}

const MAX_OBJECTIONS: usize = 10;
const MIN_SCRIPT_CHARS: usize = 50;

pub struct AntiObjectionGenerator {
    ai: Option<Arc<dyn AiProvider>>,
    max_tokens: u32,
}

impl AntiObjectionGenerator {
    pub fn new(ai: Arc<dyn AiProvider>, max_tokens: u32) -> Self {
        Self {
            ai: Some(ai),
            max_tokens,
        }
    }

    pub fn templates_only() -> Self {
        Self {
            ai: None,
            max_tokens: 0,
        }
    }

    pub async fn generate(&self, avatar: &Value, input: &ProjectInput) -> Result<Value, GeneratorError> {
        let objections: Vec<String> = string_list(avatar, "objections")
            .into_iter()
            .take(MAX_OBJECTIONS)
            .collect();
        if objections.is_empty() {
            return Err(GeneratorError::MissingInput("avatar objections".to_string()));
        }
        let segment = input.segment.trim();

        let mut responses: Vec<ObjectionResponse> = objections
            .iter()
            .map(|o| ObjectionResponse::from_template(o, segment))
            .collect();
        self.refine(&mut responses, avatar, segment).await;

        let mut arsenal: BTreeMap<ObjectionKind, usize> = BTreeMap::new();
        for r in &responses {
            *arsenal.entry(r.kind).or_default() += 1;
        }
        tracing::info!(count = responses.len(), "anti-objection responses generated");

        Ok(json!({
            "responses": responses,
            "arsenal": arsenal,
            "emergency_scripts": emergency_scripts(segment),
            "validation_status": "VALID",
            "total_objections": responses.len(),
            "generated_at": now_rfc3339(),
        }))
    }

    /// Replace template scripts with model-written ones where the model
    /// returned a usable script for the same objection.
    async fn refine(&self, responses: &mut [ObjectionResponse], avatar: &Value, segment: &str) {
        let Some(ai) = &self.ai else {
            return;
        };
        let prompt = refine_prompt(responses, avatar, segment);
        let reply = match ai.generate(&prompt, self.max_tokens).await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, "objection refinement failed, keeping templates");
                return;
            }
        };
        let refined = match extract_json(&reply).and_then(serde_json::from_value::<RefinedScripts>) {
            Ok(r) => r.responses,
            Err(e) => {
                tracing::warn!(error = %e, "objection refinement returned invalid json");
                return;
            }
        };
        for item in refined {
            let script = item.script.trim();
            if script.chars().count() < MIN_SCRIPT_CHARS {
                continue;
            }
            if let Some(target) = responses
                .iter_mut()
                .find(|r| r.objection.trim().eq_ignore_ascii_case(item.objection.trim()))
            {
                target.script = script.to_string();
                target.source = ScriptSource::Ai;
            }
        }
    }
}

fn refine_prompt(responses: &[ObjectionResponse], avatar: &Value, segment: &str) -> String {
    let listing = responses
        .iter()
        .map(|r| format!("- \"{}\" (strategy: {})", r.objection, r.strategy))
        .collect::<Vec<_>>()
        .join("\n");
    let pains = string_list(avatar, "pains").join("; ");
    format!(
        r#"You are a sales-conversation specialist for the {segment} segment.

AVATAR PAINS: {pains}

Write a short spoken script (3-5 sentences) neutralising each objection below
with the given strategy. Keep each objection text exactly as written.

OBJECTIONS:
{listing}

RETURN ONLY VALID JSON:

```json
{{"responses": [{{"objection": "...", "script": "..."}}]}}
```"#
    )
}

fn emergency_scripts(segment: &str) -> Value {
    json!({
        "silence": "When the room goes quiet, ask: \"What is the one thing that would make this a clear yes for you?\"",
        "aggressive_skeptic": format!(
            "Agree with the part that is true, then show the single strongest {segment} result you have and invite them to verify it."
        ),
        "last_minute_doubt": "Restate the cost of waiting, remind them of the guarantee and give one simple next step.",
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    struct Reply(String);

    #[async_trait]
    impl AiProvider for Reply {
        fn name(&self) -> &str {
            "reply"
        }

        async fn generate(&self, _prompt: &str, _max_tokens: u32) -> anyhow::Result<String> {
            Ok(self.0.clone())
        }
    }

    fn input() -> ProjectInput {
        ProjectInput {
            segment: "online coaching".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_classify() {
        assert_eq!(ObjectionKind::classify("It is too expensive"), ObjectionKind::Price);
        assert_eq!(ObjectionKind::classify("Maybe later"), ObjectionKind::Priority);
        assert_eq!(ObjectionKind::classify("I have no time"), ObjectionKind::Time);
        assert_eq!(ObjectionKind::classify("I can't do this"), ObjectionKind::SelfBelief);
        assert_eq!(ObjectionKind::classify("My partner disagrees"), ObjectionKind::General);
    }

    #[tokio::test]
    async fn test_templates_without_ai() {
        let avatar = json!({"objections": ["Too expensive for me", "I have no time"]});
        let out = AntiObjectionGenerator::templates_only()
            .generate(&avatar, &input())
            .await
            .unwrap();

        assert_eq!(out["validation_status"], "VALID");
        assert_eq!(out["total_objections"], 2);
        assert_eq!(out["arsenal"], json!({"price": 1, "time": 1}));
        assert_eq!(out["responses"][0]["source"], "template");
        assert!(out["responses"][0]["script"]
            .as_str()
            .unwrap()
            .contains("online coaching"));
    }

    #[tokio::test]
    async fn test_ai_refinement_replaces_matching_scripts() {
        let reply = r#"```json
{"responses": [
  {"objection": "too expensive for me", "script": "Think about what twelve more months of the same results will cost you. The program pays for itself."},
  {"objection": "I have no time", "script": "short"}
]}
```"#;
        let avatar = json!({"objections": ["Too expensive for me", "I have no time"]});
        let out = AntiObjectionGenerator::new(Arc::new(Reply(reply.to_string())), 500)
            .generate(&avatar, &input())
            .await
            .unwrap();

        assert_eq!(out["responses"][0]["source"], "ai");
        assert_eq!(out["responses"][1]["source"], "template");
    }

    #[tokio::test]
    async fn test_no_objections_fails() {
        let err = AntiObjectionGenerator::templates_only()
            .generate(&json!({"pains": ["x"]}), &input())
            .await
            .unwrap_err();
        assert!(matches!(err, GeneratorError::MissingInput(_)));
    }
}
