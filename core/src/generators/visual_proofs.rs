//! Instant visual proofs: physical demonstrations that make an abstract
//! concept tangible during a presentation.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{llm_json::extract_json, string_list, GeneratorError};
use crate::analysis::{contains_generic_marker, ProjectInput};
use crate::backend::AiProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Impact {
    #[serde(alias = "high", alias = "Alto")]
    High,
    #[serde(alias = "medium", alias = "Médio")]
    Medium,
    #[serde(alias = "low", alias = "Baixo")]
    Low,
}

impl Impact {
    pub fn rank(self) -> u8 {
        match self {
            Self::High => 3,
            Self::Medium => 2,
            Self::Low => 1,
        }
    }

    fn parse_loose(raw: &str) -> Self {
        let lower = raw.to_lowercase();
        if lower.starts_with("high") || lower.starts_with("alto") {
            Self::High
        } else if lower.starts_with("medium") || lower.starts_with("médio") {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProofCategory {
    Urgency,
    Belief,
    Objection,
    Transformation,
    Method,
    Authority,
    Social,
}

/// Library entry for a proven demonstration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Experiment {
    pub name: &'static str,
    pub concept: &'static str,
    pub experiment: &'static str,
    pub materials: &'static [&'static str],
    pub impact: Impact,
}

const URGENCY: &[Experiment] = &[
    Experiment {
        name: "Money Hourglass",
        concept: "Time = money lost",
        experiment: "Hourglass with coins falling to represent lost opportunities",
        materials: &["Transparent hourglass", "Coins", "Calculator"],
        impact: Impact::High,
    },
    Experiment {
        name: "Opportunity Candle",
        concept: "A window of opportunity closing",
        experiment: "A lit candle that burns down during the presentation",
        materials: &["Candle", "Matches", "Stopwatch"],
        impact: Impact::Medium,
    },
];

const BELIEF: &[Experiment] = &[
    Experiment {
        name: "Caterpillar Metamorphosis",
        concept: "Transformation is possible",
        experiment: "Show the metamorphosis process visually",
        materials: &["Sequential images", "Real cocoon", "Butterfly"],
        impact: Impact::High,
    },
    Experiment {
        name: "Giant Seed",
        concept: "Hidden potential",
        experiment: "A small seed next to the giant tree it can grow into",
        materials: &["Seed", "Photo of a giant tree", "Ruler"],
        impact: Impact::Medium,
    },
];

const OBJECTION: &[Experiment] = &[
    Experiment {
        name: "Leaky Piggy Bank",
        concept: "Saving without a system is useless",
        experiment: "A piggy bank full of holes next to a sealed safe",
        materials: &["Piggy bank with holes", "Safe", "Coloured water"],
        impact: Impact::High,
    },
    Experiment {
        name: "GPS vs Torn Map",
        concept: "Method versus trial and error",
        experiment: "Compare navigating with a GPS against a damaged map",
        materials: &["GPS or phone", "Torn map", "Stopwatch"],
        impact: Impact::High,
    },
];

const TRANSFORMATION: &[Experiment] = &[
    Experiment {
        name: "Extreme Before/After",
        concept: "Radical transformation is possible",
        experiment: "Dramatic visual comparison of a transformation",
        materials: &["Before and after photos", "Mirror", "Visual timeline"],
        impact: Impact::High,
    },
    Experiment {
        name: "Coal to Diamond",
        concept: "The right pressure creates value",
        experiment: "Show coal and a diamond: same origin, different pressure",
        materials: &["Coal", "Diamond or crystal", "Magnifying glass"],
        impact: Impact::Medium,
    },
];

const METHOD: &[Experiment] = &[
    Experiment {
        name: "Recipe vs Ingredients",
        concept: "A system versus loose components",
        experiment: "Separate ingredients next to a finished dish",
        materials: &["Assorted ingredients", "Finished dish", "Recipe"],
        impact: Impact::High,
    },
    Experiment {
        name: "Orchestra vs Noise",
        concept: "Coordination versus chaos",
        experiment: "Orchestra audio against disorganised instruments",
        materials: &["Speaker", "Contrasting audio clips", "Sheet music"],
        impact: Impact::Medium,
    },
];

const AUTHORITY: &[Experiment] = &[Experiment {
    name: "Library of Results",
    concept: "Accumulated experience",
    experiment: "A stack of case studies and certificates next to a blank page",
    materials: &["Real documents", "Empty folder", "Scale"],
    impact: Impact::High,
}];

const SOCIAL: &[Experiment] = &[Experiment {
    name: "Following Crowd",
    concept: "Visual social proof",
    experiment: "Demonstrate how a crowd follows a direction",
    materials: &["Crowd photos", "Direction arrows", "Statistics"],
    impact: Impact::Medium,
}];

impl ProofCategory {
    pub const ALL: [ProofCategory; 7] = [
        Self::Urgency,
        Self::Belief,
        Self::Objection,
        Self::Transformation,
        Self::Method,
        Self::Authority,
        Self::Social,
    ];

    pub fn description(self) -> &'static str {
        match self {
            Self::Urgency => "Proofs that create time urgency",
            Self::Belief => "Proofs that install new beliefs",
            Self::Objection => "Proofs that destroy objections",
            Self::Transformation => "Proofs that show transformation",
            Self::Method => "Proofs that validate the method",
            Self::Authority => "Proofs that establish authority",
            Self::Social => "Visual social proof",
        }
    }

    fn keywords(self) -> &'static [&'static str] {
        match self {
            Self::Urgency => &["urgent", "fast", "quick", "time", "now", "deadline"],
            Self::Belief => &["believe", "possible", "achieve", "capable"],
            Self::Objection => &["objection", "doubt", "fear", "afraid", "resist", "risk"],
            Self::Transformation => &["transform", "change", "evolve"],
            Self::Method => &["method", "system", "process", "framework"],
            Self::Authority => &["authority", "specialist", "expert"],
            Self::Social => &[],
        }
    }

    pub fn experiments(self) -> &'static [Experiment] {
        match self {
            Self::Urgency => URGENCY,
            Self::Belief => BELIEF,
            Self::Objection => OBJECTION,
            Self::Transformation => TRANSFORMATION,
            Self::Method => METHOD,
            Self::Authority => AUTHORITY,
            Self::Social => SOCIAL,
        }
    }

    /// First category whose keywords appear in the concept, else `Social`.
    pub fn classify(concept: &str) -> Self {
        let lower = concept.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.keywords().iter().any(|k| lower.contains(k)))
            .unwrap_or(Self::Social)
    }
}

/// Segment family with its own demonstration adaptations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentProfile {
    Medicine,
    Digital,
    Consulting,
    General,
}

impl SegmentProfile {
    pub fn from_segment(segment: &str) -> Self {
        let lower = segment.to_lowercase();
        if lower.contains("medic") {
            Self::Medicine
        } else if lower.contains("digital") {
            Self::Digital
        } else if lower.contains("consult") {
            Self::Consulting
        } else {
            Self::General
        }
    }

    fn adapt(self, proof: &mut VisualProof) {
        let (target, analogy, material) = match self {
            Self::Medicine => (
                "GPS vs Torn Map",
                "Like operating with a protocol versus improvising: lives depend on precision",
                "Stethoscope (prop)",
            ),
            Self::Digital => (
                "Leaky Piggy Bank",
                "Like a website converting 0.5% versus 15%: same traffic, opposite results",
                "Conversion chart",
            ),
            Self::Consulting => (
                "Recipe vs Ingredients",
                "Like consulting with a methodology versus handing out loose advice",
                "Printed methodology",
            ),
            Self::General => return,
        };
        if proof.name == target {
            proof.analogy = Some(analogy.to_string());
            proof.materials.push(material.to_string());
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProofSource {
    Library,
    Ai,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatVariations {
    pub online: String,
    pub in_person: String,
    pub large_audience: String,
}

impl Default for FormatVariations {
    fn default() -> Self {
        Self {
            online: "ONLINE VERSION: use camera close-ups, larger materials, more detailed narration"
                .to_string(),
            in_person: "IN-PERSON VERSION: involve the audience, use volunteers, amplify gestures"
                .to_string(),
            large_audience:
                "LARGE AUDIENCE VERSION: use projection, giant materials, a wireless microphone"
                    .to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualProof {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<ProofCategory>,
    pub purpose: String,
    pub concept_target: String,
    pub concept: String,
    pub experiment: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analogy: Option<String>,
    pub materials: Vec<String>,
    pub impact: Impact,
    pub concepts_addressed: Vec<String>,
    pub full_script: String,
    pub variations: FormatVariations,
    pub source: ProofSource,
    pub sequence: usize,
    pub suggested_moment: String,
}

impl VisualProof {
    fn from_library(
        category: ProofCategory,
        exp: &Experiment,
        concepts: &[String],
        profile: SegmentProfile,
    ) -> Self {
        let concepts_addressed: Vec<String> = concepts.iter().take(3).cloned().collect();
        let mut proof = Self {
            name: exp.name.to_string(),
            category: Some(category),
            purpose: category.description().to_string(),
            concept_target: concepts_addressed.first().cloned().unwrap_or_default(),
            concept: exp.concept.to_string(),
            experiment: exp.experiment.to_string(),
            analogy: None,
            materials: exp.materials.iter().map(|m| m.to_string()).collect(),
            impact: exp.impact,
            concepts_addressed,
            full_script: String::new(),
            variations: FormatVariations::default(),
            source: ProofSource::Library,
            sequence: 0,
            suggested_moment: String::new(),
        };
        profile.adapt(&mut proof);
        proof.full_script = demonstration_script(&proof.name, &proof.concept);
        proof
    }

    /// Reason the proof is unusable, if any.
    pub fn rejection(&self) -> Option<String> {
        for (field, value) in [
            ("name", &self.name),
            ("concept_target", &self.concept_target),
            ("experiment", &self.experiment),
        ] {
            let v = value.trim();
            if v.is_empty() || v == "N/A" {
                return Some(format!("field '{field}' missing or N/A"));
            }
        }
        if contains_generic_marker(&self.experiment) && self.experiment.chars().count() < 100 {
            return Some("generic experiment description".to_string());
        }
        None
    }
}

/// Shape requested from the language model.
#[derive(Debug, Deserialize)]
struct AiProofDraft {
    #[serde(default)]
    name: String,
    #[serde(default, alias = "target_concept")]
    concept_target: String,
    #[serde(default)]
    experiment: String,
    #[serde(default)]
    analogy: Option<String>,
    #[serde(default)]
    materials: Vec<String>,
    #[serde(default)]
    full_script: String,
    #[serde(default, alias = "impact")]
    expected_impact: String,
}

impl From<AiProofDraft> for VisualProof {
    fn from(d: AiProofDraft) -> Self {
        Self {
            concept: d.concept_target.clone(),
            concepts_addressed: vec![d.concept_target.clone()],
            full_script: if d.full_script.trim().is_empty() {
                demonstration_script(&d.name, &d.concept_target)
            } else {
                d.full_script
            },
            name: d.name,
            category: None,
            purpose: "Bespoke demonstration".to_string(),
            concept_target: d.concept_target,
            experiment: d.experiment,
            analogy: d.analogy.filter(|a| !a.trim().is_empty()),
            materials: d.materials,
            impact: Impact::parse_loose(&d.expected_impact),
            variations: FormatVariations::default(),
            source: ProofSource::Ai,
            sequence: 0,
            suggested_moment: String::new(),
        }
    }
}

fn demonstration_script(name: &str, concept: &str) -> String {
    format!(
        "FULL SCRIPT - {name}\n\n\
         SETUP (30 seconds):\n\
         \"Let me show you something that will change how you see {concept}...\"\n\
         [Prepare the materials in plain sight]\n\n\
         EXECUTION (60-90 seconds):\n\
         1. [Demonstrate the current problematic situation]\n\
         2. [Build tension and expectation]\n\
         3. [Reveal the solution or transformation]\n\n\
         CLIMAX (15 seconds):\n\
         \"See the difference? That is EXACTLY what happens when...\"\n\n\
         BRIDGE (30 seconds):\n\
         \"Now tell me: do you want to keep being the [problem situation] or become the [ideal situation]?\"\n\n\
         ANCHORING:\n\
         \"Every time you think about {concept}, remember this demonstration.\"\n"
    )
}

fn suggested_moment(index: usize, total: usize) -> &'static str {
    let position = index as f64;
    let total = total as f64;
    if position < total * 0.3 {
        "Opening - pattern break"
    } else if position < total * 0.6 {
        "Development - belief building"
    } else if position < total * 0.8 {
        "Pre-pitch - offer preparation"
    } else {
        "Closing - final urgency"
    }
}

const MAX_SELECTED: usize = 10;
const MAX_PROOFS: usize = 12;
const AI_PROOF_TOKENS: u32 = 2_000;

pub struct VisualProofGenerator {
    ai: Option<Arc<dyn AiProvider>>,
}

impl VisualProofGenerator {
    /// Generator that also asks the language model for bespoke proofs.
    pub fn new(ai: Arc<dyn AiProvider>) -> Self {
        Self { ai: Some(ai) }
    }

    /// Generator limited to the built-in experiment library.
    pub fn library_only() -> Self {
        Self { ai: None }
    }

    pub async fn generate(
        &self,
        concepts: &[String],
        avatar: &Value,
        input: &ProjectInput,
    ) -> Result<Value, GeneratorError> {
        if concepts.is_empty() {
            return Err(GeneratorError::MissingInput("concepts to prove".to_string()));
        }
        if !crate::executor::is_truthy(avatar) {
            return Err(GeneratorError::MissingInput("avatar".to_string()));
        }

        let profile = SegmentProfile::from_segment(&input.segment);
        let mut proofs: Vec<VisualProof> = select_experiments(concepts)
            .into_iter()
            .map(|(category, exp, addressed)| {
                VisualProof::from_library(category, exp, &addressed, profile)
            })
            .filter(keep_valid)
            .collect();

        let ai_proofs = self.ai_proofs(concepts, avatar, &input.segment).await;
        if !ai_proofs.is_empty() {
            let before = proofs.len();
            proofs.extend(ai_proofs.into_iter().filter(keep_valid));
            tracing::info!(added = proofs.len() - before, "ai visual proofs added");
        }

        if proofs.is_empty() {
            return Err(GeneratorError::NothingValid("visual proofs".to_string()));
        }

        let proofs = optimize_sequence(proofs);
        tracing::info!(count = proofs.len(), "visual proofs generated");
        Ok(serde_json::to_value(proofs)?)
    }

    async fn ai_proofs(&self, concepts: &[String], avatar: &Value, segment: &str) -> Vec<VisualProof> {
        let Some(ai) = &self.ai else {
            return Vec::new();
        };
        let prompt = ai_prompt(concepts, avatar, segment);
        let response = match ai.generate(&prompt, AI_PROOF_TOKENS).await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, "ai visual proof generation failed");
                return Vec::new();
            }
        };
        match extract_json(&response).and_then(serde_json::from_value::<Vec<AiProofDraft>>) {
            Ok(drafts) => drafts.into_iter().map(VisualProof::from).collect(),
            Err(e) => {
                tracing::warn!(error = %e, "ai returned invalid json for visual proofs");
                Vec::new()
            }
        }
    }
}

fn keep_valid(proof: &VisualProof) -> bool {
    match proof.rejection() {
        Some(reason) => {
            tracing::warn!(proof = %proof.name, %reason, "discarding visual proof");
            false
        }
        None => true,
    }
}

/// Library experiments for the categorised concepts, at most two per
/// category (high impact first) and ten overall.
fn select_experiments(
    concepts: &[String],
) -> Vec<(ProofCategory, &'static Experiment, Vec<String>)> {
    let mut selected = Vec::new();
    for category in ProofCategory::ALL {
        let matching: Vec<String> = concepts
            .iter()
            .filter(|c| ProofCategory::classify(c) == category)
            .take(3)
            .cloned()
            .collect();
        if matching.is_empty() {
            continue;
        }
        let mut experiments: Vec<&Experiment> = category
            .experiments()
            .iter()
            .filter(|e| e.impact != Impact::Low)
            .collect();
        experiments.sort_by_key(|e| std::cmp::Reverse(e.impact.rank()));
        for exp in experiments.into_iter().take(2) {
            selected.push((category, exp, matching.clone()));
        }
    }
    selected.truncate(MAX_SELECTED);
    selected
}

fn optimize_sequence(mut proofs: Vec<VisualProof>) -> Vec<VisualProof> {
    proofs.sort_by_key(|p| std::cmp::Reverse(p.impact.rank()));
    let total = proofs.len();
    for (i, proof) in proofs.iter_mut().enumerate() {
        proof.sequence = i + 1;
        proof.suggested_moment = suggested_moment(i, total).to_string();
    }
    proofs.truncate(MAX_PROOFS);
    proofs
}

fn ai_prompt(concepts: &[String], avatar: &Value, segment: &str) -> String {
    let pains: Vec<String> = string_list(avatar, "pains").into_iter().take(3).collect();
    let desires: Vec<String> = string_list(avatar, "desires").into_iter().take(3).collect();
    let demographics = avatar.get("demographics").cloned().unwrap_or(Value::Null);
    let concept_lines = concepts
        .iter()
        .take(5)
        .cloned()
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        r#"Create 3 unique, high-impact visual experiments for the {segment} segment.

CONCEPTS TO PROVE:
{concept_lines}

AVATAR:
- Profile: {demographics}
- Pains: {pains:?}
- Desires: {desires:?}

RETURN ONLY VALID JSON:

```json
[
  {{
    "name": "Impactful experiment name",
    "concept_target": "Specific concept it proves",
    "experiment": "Detailed description of the physical demonstration",
    "analogy": "How it connects with the avatar's life",
    "materials": ["Required materials"],
    "full_script": "Detailed step-by-step script",
    "expected_impact": "High/Medium/Low",
    "ideal_moment": "When to use it in the presentation"
  }}
]
```"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    struct Scripted(anyhow::Result<String>);

    #[async_trait]
    impl AiProvider for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn generate(&self, _prompt: &str, _max_tokens: u32) -> anyhow::Result<String> {
            match &self.0 {
                Ok(s) => Ok(s.clone()),
                Err(e) => Err(anyhow::anyhow!("{e}")),
            }
        }
    }

    fn input(segment: &str) -> ProjectInput {
        ProjectInput {
            segment: segment.to_string(),
            ..Default::default()
        }
    }

    fn concepts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_classify_concepts() {
        assert_eq!(ProofCategory::classify("No time left to grow"), ProofCategory::Urgency);
        assert_eq!(ProofCategory::classify("Fear of losing money"), ProofCategory::Objection);
        assert_eq!(ProofCategory::classify("A proven method"), ProofCategory::Method);
        assert_eq!(ProofCategory::classify("Recognition by peers"), ProofCategory::Social);
    }

    #[test]
    fn test_select_prefers_high_impact() {
        let selected = select_experiments(&concepts(&["Need results now", "Peer recognition"]));
        let names: Vec<&str> = selected.iter().map(|(_, e, _)| e.name).collect();
        assert_eq!(
            names,
            vec!["Money Hourglass", "Opportunity Candle", "Following Crowd"]
        );
    }

    #[test]
    fn test_segment_adaptation() {
        let exp = &OBJECTION[0];
        let proof = VisualProof::from_library(
            ProofCategory::Objection,
            exp,
            &concepts(&["fear"]),
            SegmentProfile::Digital,
        );
        assert!(proof.analogy.as_deref().unwrap().contains("website"));
        assert!(proof.materials.contains(&"Conversion chart".to_string()));
        assert_eq!(proof.concept_target, "fear");
        assert_eq!(SegmentProfile::from_segment("Medicina estética"), SegmentProfile::Medicine);
    }

    #[test]
    fn test_generic_ai_proof_rejected() {
        let proof: VisualProof = AiProofDraft {
            name: "Box".into(),
            concept_target: "trust".into(),
            experiment: "Experiment customized for dentists".into(),
            analogy: None,
            materials: vec![],
            full_script: String::new(),
            expected_impact: "High".into(),
        }
        .into();
        assert!(proof.rejection().is_some());
    }

    #[tokio::test]
    async fn test_generate_orders_and_sequences() {
        let reply = r#"```json
[{"name": "Broken Chain", "concept_target": "Consistency", "experiment": "Break a paper chain link by link while listing missed days", "expected_impact": "Low"}]
```"#;
        let gen = VisualProofGenerator::new(Arc::new(Scripted(Ok(reply.to_string()))));
        let out = gen
            .generate(
                &concepts(&["Results now", "Proven method to scale", "Peer recognition"]),
                &json!({"pains": ["x"]}),
                &input("consulting"),
            )
            .await
            .unwrap();

        let proofs = out.as_array().unwrap();
        assert_eq!(proofs.len(), 6);
        assert_eq!(proofs[0]["sequence"], 1);
        assert_eq!(proofs[0]["impact"], "High");
        assert_eq!(proofs[0]["suggested_moment"], "Opening - pattern break");
        let last = proofs.last().unwrap();
        assert_eq!(last["name"], "Broken Chain");
        assert_eq!(last["source"], "ai");
        assert_eq!(last["suggested_moment"], "Closing - final urgency");
    }

    #[tokio::test]
    async fn test_ai_failure_is_ignored() {
        let gen = VisualProofGenerator::new(Arc::new(Scripted(Err(anyhow::anyhow!("down")))));
        let out = gen
            .generate(&concepts(&["Peer recognition"]), &json!({"pains": ["x"]}), &input("retail"))
            .await
            .unwrap();
        assert_eq!(out.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_generate_requires_concepts() {
        let gen = VisualProofGenerator::library_only();
        let err = gen
            .generate(&[], &json!({"pains": ["x"]}), &input("retail"))
            .await
            .unwrap_err();
        assert!(matches!(err, GeneratorError::MissingInput(_)));
    }
}
