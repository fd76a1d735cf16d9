//! Invisible pre-pitch: the emotional build-up that precedes the offer.
//!
//! Selected mental drivers are mapped onto six psychological phases, which are
//! then orchestrated (escalation curve, critical points, transitions) and
//! turned into a spoken script.

use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{llm_json::extract_json, now_rfc3339, text, GeneratorError};
use crate::analysis::ProjectInput;
use crate::backend::AiProvider;

lazy_static! {
    static ref MINUTES: Regex = Regex::new(r"\d+").expect("static regex");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intensity {
    High,
    Rising,
    Maximum,
    Hopeful,
    Definitive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PitchPhase {
    Break,
    Exposure,
    Indignation,
    Glimpse,
    Tension,
    Necessity,
}

impl PitchPhase {
    pub const ALL: [PitchPhase; 6] = [
        Self::Break,
        Self::Exposure,
        Self::Indignation,
        Self::Glimpse,
        Self::Tension,
        Self::Necessity,
    ];

    pub fn objective(self) -> &'static str {
        match self {
            Self::Break => "Destroy the comfortable illusion",
            Self::Exposure => "Reveal the real wound",
            Self::Indignation => "Create productive outrage",
            Self::Glimpse => "Show what is possible",
            Self::Tension => "Amplify the gap",
            Self::Necessity => "Make change inevitable",
        }
    }

    pub fn duration(self) -> &'static str {
        match self {
            Self::Break => "3-5 minutes",
            Self::Exposure => "4-6 minutes",
            Self::Indignation => "3-4 minutes",
            Self::Glimpse => "5-7 minutes",
            Self::Tension => "2-3 minutes",
            Self::Necessity => "3-4 minutes",
        }
    }

    pub fn intensity(self) -> Intensity {
        match self {
            Self::Break => Intensity::High,
            Self::Exposure | Self::Tension => Intensity::Rising,
            Self::Indignation => Intensity::Maximum,
            Self::Glimpse => Intensity::Hopeful,
            Self::Necessity => Intensity::Definitive,
        }
    }

    pub fn ideal_drivers(self) -> [&'static str; 2] {
        match self {
            Self::Break => ["Brutal Diagnosis", "Exposed Wound"],
            Self::Exposure => ["Invisible Cost", "Vampire Environment"],
            Self::Indignation => ["Psychological Clock", "Productive Envy"],
            Self::Glimpse => ["Expanded Ambition", "Secret Trophy"],
            Self::Tension => ["Imprisoned Identity", "Hidden Opportunity"],
            Self::Necessity => ["Method vs Luck", "Savior Mentor"],
        }
    }

    pub fn expected_result(self) -> &'static str {
        match self {
            Self::Break => "Productive discomfort",
            Self::Exposure => "Awareness of the pain",
            Self::Indignation => "Urgency to change",
            Self::Glimpse => "Amplified desire",
            Self::Tension => "Maximum tension",
            Self::Necessity => "Need for a solution",
        }
    }

    fn techniques(self) -> [&'static str; 3] {
        match self {
            Self::Break => ["Direct confrontation", "Uncomfortable question", "Shocking statistic"],
            Self::Exposure => ["Loss calculation", "Pain visualisation", "Cruel comparison"],
            Self::Indignation => ["Time urgency", "Social comparison", "Future consequences"],
            Self::Glimpse => ["Success visualisation", "Transformation cases", "Expanded possibilities"],
            Self::Tension => ["Current versus ideal gap", "Limiting identity", "Unique opportunity"],
            Self::Necessity => ["Clear path", "Necessary mentor", "Method versus chaos"],
        }
    }

    fn keywords(self) -> &'static [&'static str] {
        match self {
            Self::Break => &["diagnosis", "brutal", "wound"],
            Self::Exposure => &["cost", "environment", "vampire"],
            Self::Indignation => &["clock", "urgency", "envy"],
            Self::Glimpse => &["ambition", "trophy", "expanded"],
            Self::Tension => &["identity", "opportunity"],
            Self::Necessity => &["method", "mentor", "savior"],
        }
    }

    /// Phase a driver belongs to, judged by its name.
    pub fn for_driver(name: &str) -> Option<Self> {
        let lower = name.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|p| p.keywords().iter().any(|k| lower.contains(k)))
    }

    fn transition_to(self, next: Self) -> Option<&'static str> {
        use PitchPhase::*;
        match (self, next) {
            (Break, Exposure) => Some("I know this hurts to hear... But do you know what hurts more?"),
            (Exposure, Indignation) => Some("And the worst part is that it does not have to be this way..."),
            (Indignation, Glimpse) => Some("But relax, I did not come here just to open wounds..."),
            (Glimpse, Tension) => Some("Now you can see the difference between where you are and where you could be..."),
            (Tension, Necessity) => Some("The question is not IF you will change, it is HOW..."),
            _ => None,
        }
    }
}

/// Transition from the last phase into the rational part of the pitch.
pub const NECESSITY_TO_LOGIC: &str = "I know you are feeling this right now... But your rational brain is shouting: 'Does it really work?' So let me show you the numbers...";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhasePlan {
    pub phase: PitchPhase,
    pub objective: String,
    pub duration: String,
    pub intensity: Intensity,
    pub drivers: Vec<String>,
    pub ideal_drivers: Vec<String>,
    pub expected_result: String,
    pub techniques: Vec<String>,
}

/// Pre-pitch drivers: names containing an essential driver first, padded
/// from the head of the list when fewer than four match. At most seven.
pub fn select_drivers(names: &[String]) -> Vec<String> {
    const ESSENTIAL: [&str; 6] = [
        "Brutal Diagnosis",
        "Expanded Ambition",
        "Psychological Clock",
        "Method vs Luck",
        "Binary Decision",
        "Invisible Cost",
    ];
    let mut selected: Vec<&String> = names
        .iter()
        .filter(|n| ESSENTIAL.iter().any(|e| n.contains(*e)))
        .collect();
    if selected.len() < 4 {
        selected.extend(names.iter().take(6));
    }
    let mut unique: Vec<String> = Vec::new();
    for name in selected {
        if !unique.contains(name) {
            unique.push(name.clone());
        }
    }
    unique.truncate(7);
    unique
}

/// Phases in canonical order with the drivers mapped onto them; phases
/// without drivers are left out.
pub fn plan_phases(drivers: &[String]) -> Vec<PhasePlan> {
    PitchPhase::ALL
        .into_iter()
        .filter_map(|phase| {
            let mapped: Vec<String> = drivers
                .iter()
                .filter(|d| PitchPhase::for_driver(d) == Some(phase))
                .cloned()
                .collect();
            (!mapped.is_empty()).then(|| PhasePlan {
                phase,
                objective: phase.objective().to_string(),
                duration: phase.duration().to_string(),
                intensity: phase.intensity(),
                drivers: mapped,
                ideal_drivers: phase.ideal_drivers().iter().map(|d| d.to_string()).collect(),
                expected_result: phase.expected_result().to_string(),
                techniques: phase.techniques().iter().map(|t| t.to_string()).collect(),
            })
        })
        .collect()
}

fn orchestration(sequence: &[PhasePlan]) -> Value {
    let curve: Vec<Value> = sequence
        .iter()
        .map(|p| json!({"phase": p.phase, "intensity": p.intensity}))
        .collect();
    let peaks: Vec<PitchPhase> = sequence
        .iter()
        .filter(|p| matches!(p.intensity, Intensity::Maximum | Intensity::Definitive))
        .map(|p| p.phase)
        .collect();
    let relief: Vec<PitchPhase> = sequence
        .iter()
        .filter(|p| p.intensity == Intensity::Hopeful)
        .map(|p| p.phase)
        .collect();
    let critical: Vec<Value> = sequence
        .iter()
        .filter(|p| matches!(p.intensity, Intensity::Maximum | Intensity::Definitive))
        .map(|p| {
            json!({
                "phase": p.phase,
                "moment": format!("While working to {}", p.objective.to_lowercase()),
                "risk": "Losing the audience if too intense",
                "opportunity": "Maximum emotional impact",
                "management": "Watch reactions and adjust intensity",
            })
        })
        .collect();
    let transitions: Vec<Value> = sequence
        .windows(2)
        .map(|pair| {
            let (from, to) = (pair[0].phase, pair[1].phase);
            let script = from
                .transition_to(to)
                .map(str::to_string)
                .unwrap_or_else(|| format!("Transition from {from:?} to {to:?}").to_lowercase());
            json!({
                "from": from,
                "to": to,
                "script": script,
                "time": "15-30 seconds",
                "technique": "Smooth emotional bridge",
            })
        })
        .collect();

    json!({
        "sequence": sequence,
        "escalation": {
            "intensity_curve": curve,
            "peaks": peaks,
            "relief_moments": relief,
        },
        "critical_points": critical,
        "transitions": transitions,
        "closing_transition": NECESSITY_TO_LOGIC,
    })
}

/// "X-Y minutes" from the first two numbers of every phase duration.
pub fn total_duration(sequence: &[PhasePlan]) -> String {
    let (mut low, mut high) = (0u32, 0u32);
    for phase in sequence {
        let numbers: Vec<u32> = MINUTES
            .find_iter(&phase.duration)
            .filter_map(|m| m.as_str().parse().ok())
            .collect();
        match numbers.as_slice() {
            [] => {}
            [only] => {
                low += only;
                high += only;
            }
            [first, second, ..] => {
                low += first;
                high += second;
            }
        }
    }
    format!("{low}-{high} minutes")
}

pub fn max_intensity(sequence: &[PhasePlan]) -> &'static str {
    let has = |i: Intensity| sequence.iter().any(|p| p.intensity == i);
    if has(Intensity::Maximum) {
        "Maximum"
    } else if has(Intensity::High) {
        "High"
    } else if has(Intensity::Rising) {
        "Rising"
    } else {
        "Medium"
    }
}

/// Reason a script is unusable, if any.
pub fn script_rejection(script: &Value) -> Option<String> {
    for section in ["opening", "development", "closing"] {
        let Some(body) = script.get(section) else {
            return Some(format!("missing section '{section}'"));
        };
        let Some(body_text) = text(body, "script") else {
            return Some(format!("section '{section}' has no script"));
        };
        let len = body_text.chars().count();
        if len < 50 {
            return Some(format!("section '{section}' script too short"));
        }
        if body_text.to_lowercase().contains("customized for") && len < 100 {
            return Some(format!("section '{section}' script is generic"));
        }
    }
    None
}

fn template_script(segment: &str) -> Value {
    json!({
        "opening": {
            "time": "3-5 minutes",
            "objective": "Break the pattern and raise awareness",
            "script": format!("Let me ask you a question about {segment}... How long have you been stuck at the same level?"),
            "key_phrases": [
                format!("The truth about {segment} nobody tells you"),
                "This will hurt, but it needs to be said",
            ],
            "transition": "And do you know why this happens?",
        },
        "development": {
            "time": "8-12 minutes",
            "objective": "Amplify pain and desire",
            "script": format!("Every day that passes without optimising {segment} is money leaving your pocket..."),
            "critical_moments": ["Financial loss calculation", "Comparison with competitors"],
            "emotional_escalation": "Increase pressure gradually",
        },
        "pre_climax": {
            "time": "3-4 minutes",
            "objective": "Create maximum tension",
            "script": format!("Now you have two choices in {segment}..."),
            "turning_point": "The binary decision moment",
            "pitch_preparation": "Prepare to reveal the solution",
        },
        "closing": {
            "time": "2-3 minutes",
            "objective": "Seamless transition into the pitch",
            "script": "I am going to show you exactly how to get out of this situation, step by step...",
            "offer_bridge": "But first, I need to know whether you are ready...",
            "ideal_mental_state": "Eager for the solution",
        },
    })
}

fn format_variations() -> Value {
    json!({
        "webinar": {
            "total_duration": "15-20 minutes",
            "adaptations": ["Use the chat for engagement", "Pause for rhetorical questions", "Supporting slides"],
            "timing": "Last 20 minutes before the offer",
        },
        "live_event": {
            "total_duration": "25-35 minutes",
            "adaptations": ["Direct audience interaction", "Stage movement", "Physical visual proofs"],
            "timing": "Spread across the event",
        },
        "three_lesson_cpl": {
            "total_duration": "10-15 minutes",
            "adaptations": ["Gradual build-up across lessons", "Callbacks between lessons", "Peak in lesson 3"],
            "timing": "End of lesson 3",
        },
        "warm_up_lives": {
            "total_duration": "5-8 minutes per live",
            "adaptations": ["Seeds in every live", "Subliminal preparation", "Growing intensity"],
            "timing": "Spread across the lives",
        },
    })
}

fn success_metrics() -> Value {
    json!({
        "during": [
            "Absolute silence during activation",
            "Emotional comments in the chat",
            "Questions about when enrolment opens",
            "Physical agreement (nodding)",
        ],
        "after": [
            "Visible eagerness for the offer",
            "Questions about price and format",
            "\"I want to buy already\" comments",
            "Minimised objections",
        ],
        "resistance_signals": [
            "Excessive technical questions",
            "Changing the subject",
            "Immediate objections",
            "Closed body language",
        ],
        "conversion_metrics": {
            "engagement": "Attention time per phase",
            "emotional": "Emotional reactions generated",
            "behavioral": "Actions taken after activation",
            "conversion": "Conversion rate after the pre-pitch",
        },
    })
}

pub struct PrePitchGenerator {
    ai: Option<Arc<dyn AiProvider>>,
    max_tokens: u32,
}

impl PrePitchGenerator {
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

    /// `drivers` are the customised drivers produced by the mental driver
    /// generator; only their `name` is used.
    pub async fn generate(
        &self,
        drivers: &[Value],
        avatar: &Value,
        input: &ProjectInput,
    ) -> Result<Value, GeneratorError> {
        if drivers.is_empty() {
            return Err(GeneratorError::MissingInput("mental drivers".to_string()));
        }
        if !crate::executor::is_truthy(avatar) {
            return Err(GeneratorError::MissingInput("avatar".to_string()));
        }
        let segment = input.segment.trim();
        if segment.is_empty() {
            return Err(GeneratorError::MissingInput("segment".to_string()));
        }

        let names: Vec<String> = drivers
            .iter()
            .filter_map(|d| text(d, "name"))
            .map(str::to_string)
            .collect();
        let selected = select_drivers(&names);
        if selected.is_empty() {
            return Err(GeneratorError::NothingValid("pre-pitch drivers".to_string()));
        }

        let sequence = plan_phases(&selected);
        if sequence.is_empty() {
            return Err(GeneratorError::NothingValid("psychological sequence".to_string()));
        }
        let orchestration = orchestration(&sequence);

        let script = self.script(&orchestration, input).await;
        if let Some(reason) = script_rejection(&script) {
            return Err(GeneratorError::AiResponse(format!("invalid pre-pitch script: {reason}")));
        }
        tracing::info!(drivers = selected.len(), phases = sequence.len(), "pre-pitch generated");

        Ok(json!({
            "emotional_orchestration": orchestration,
            "script": script,
            "format_variations": format_variations(),
            "success_metrics": success_metrics(),
            "drivers_used": selected,
            "total_duration": total_duration(&sequence),
            "max_intensity": max_intensity(&sequence),
            "validation_status": "VALID",
            "generated_at": now_rfc3339(),
        }))
    }

    /// Model-written script, or the template script when the model is
    /// unavailable or its reply is unusable.
    async fn script(&self, orchestration: &Value, input: &ProjectInput) -> Value {
        let segment = input.segment.trim();
        let Some(ai) = &self.ai else {
            return template_script(segment);
        };
        let prompt = script_prompt(orchestration, input);
        let candidate = match ai.generate(&prompt, self.max_tokens).await {
            Ok(reply) => extract_json(&reply).map_err(|e| e.to_string()),
            Err(e) => Err(format!("{e:#}")),
        };
        match candidate {
            Ok(script) => match script_rejection(&script) {
                None => script,
                Some(reason) => {
                    tracing::warn!(%reason, "ai pre-pitch script rejected, using template");
                    template_script(segment)
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "ai pre-pitch script unavailable, using template");
                template_script(segment)
            }
        }
    }
}

fn script_prompt(orchestration: &Value, input: &ProjectInput) -> String {
    let segment = input.segment.trim();
    let mut plan = serde_json::to_string_pretty(orchestration).unwrap_or_default();
    if plan.chars().count() > 2_000 {
        plan = plan.chars().take(2_000).collect();
    }
    format!(
        r#"Write a complete invisible pre-pitch script for the {segment} segment.

EMOTIONAL ORCHESTRATION:
{plan}

CONTEXT:
- Segment: {segment}
- Product: {product}
- Audience: {audience}

RETURN ONLY VALID JSON:

```json
{{
  "opening": {{"time": "3-5 minutes", "objective": "...", "script": "...", "key_phrases": ["..."], "transition": "..."}},
  "development": {{"time": "8-12 minutes", "objective": "...", "script": "...", "critical_moments": ["..."], "emotional_escalation": "..."}},
  "pre_climax": {{"time": "3-4 minutes", "objective": "...", "script": "...", "turning_point": "...", "pitch_preparation": "..."}},
  "closing": {{"time": "2-3 minutes", "objective": "...", "script": "...", "offer_bridge": "...", "ideal_mental_state": "..."}}
}}
```"#,
        product = input.product_or("not provided"),
        audience = input.audience_or("not provided"),
    )
}
