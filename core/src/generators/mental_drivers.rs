//! Mental driver system: 19 universal psychological drivers, seven of which
//! are customised to the project segment and sequenced for a launch event.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::{now_rfc3339, GeneratorError};
use crate::analysis::ProjectInput;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverCategory {
    PrimaryEmotional,
    ComplementaryRational,
}

impl DriverCategory {
    pub fn label(self) -> &'static str {
        match self {
            Self::PrimaryEmotional => "Primary Emotional",
            Self::ComplementaryRational => "Complementary Rational",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverKind {
    ExposedWound,
    SecretTrophy,
    ProductiveEnvy,
    PsychologicalClock,
    ImprisonedIdentity,
    InvisibleCost,
    ExpandedAmbition,
    BrutalDiagnosis,
    VampireEnvironment,
    SaviorMentor,
    NecessaryCourage,
    RevealedMechanism,
    MathematicalProof,
    HiddenPattern,
    PossibleException,
    EthicalShortcut,
    BinaryDecision,
    HiddenOpportunity,
    MethodVsLuck,
}

/// Static description of a universal driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverDefinition {
    pub id: u8,
    pub name: &'static str,
    pub category: DriverCategory,
    pub trigger: &'static str,
    pub mechanics: &'static str,
    pub activation_template: &'static str,
}

impl DriverKind {
    pub const ALL: [DriverKind; 19] = [
        Self::ExposedWound,
        Self::SecretTrophy,
        Self::ProductiveEnvy,
        Self::PsychologicalClock,
        Self::ImprisonedIdentity,
        Self::InvisibleCost,
        Self::ExpandedAmbition,
        Self::BrutalDiagnosis,
        Self::VampireEnvironment,
        Self::SaviorMentor,
        Self::NecessaryCourage,
        Self::RevealedMechanism,
        Self::MathematicalProof,
        Self::HiddenPattern,
        Self::PossibleException,
        Self::EthicalShortcut,
        Self::BinaryDecision,
        Self::HiddenOpportunity,
        Self::MethodVsLuck,
    ];

    /// Drivers installed in every event, in installation priority.
    pub const ESSENTIAL: [DriverKind; 7] = [
        Self::BrutalDiagnosis,
        Self::ExpandedAmbition,
        Self::PsychologicalClock,
        Self::MethodVsLuck,
        Self::BinaryDecision,
        Self::InvisibleCost,
        Self::NecessaryCourage,
    ];

    pub fn definition(self) -> DriverDefinition {
        use DriverCategory::*;
        let (id, name, category, trigger, mechanics, activation_template) = match self {
            Self::ExposedWound => (
                1,
                "Exposed Wound",
                PrimaryEmotional,
                "Unresolved pain",
                "Bring repressed pain back into awareness",
                "Do you still [painful behavior] even knowing that [consequence]?",
            ),
            Self::SecretTrophy => (
                2,
                "Secret Trophy",
                PrimaryEmotional,
                "Unspoken desire",
                "Validate forbidden ambitions",
                "It is not about money, it is about [hidden real desire]",
            ),
            Self::ProductiveEnvy => (
                3,
                "Productive Envy",
                PrimaryEmotional,
                "Comparison with peers",
                "Turn envy into fuel",
                "While you [current situation], people like you [desired result]",
            ),
            Self::PsychologicalClock => (
                4,
                "Psychological Clock",
                PrimaryEmotional,
                "Existential urgency",
                "Time as a finite resource",
                "How many more [period] will you [waste]?",
            ),
            Self::ImprisonedIdentity => (
                5,
                "Imprisoned Identity",
                PrimaryEmotional,
                "Conflict between who they are and who they could be",
                "Expose the social mask",
                "You are not [limiting label], you are [real potential]",
            ),
            Self::InvisibleCost => (
                6,
                "Invisible Cost",
                PrimaryEmotional,
                "Unnoticed loss",
                "Quantify the price of inaction",
                "Every day without [solution] costs [specific loss]",
            ),
            Self::ExpandedAmbition => (
                7,
                "Expanded Ambition",
                PrimaryEmotional,
                "Dreams that are too small",
                "Raise the mental ceiling of possibilities",
                "If the effort is the same, why are you asking for so little?",
            ),
            Self::BrutalDiagnosis => (
                8,
                "Brutal Diagnosis",
                PrimaryEmotional,
                "Confrontation with the current reality",
                "Create productive indignation with the status quo",
                "Look at your numbers. How long will you accept this?",
            ),
            Self::VampireEnvironment => (
                9,
                "Vampire Environment",
                PrimaryEmotional,
                "Awareness of a toxic surrounding",
                "Reveal how the current environment drains energy and potential",
                "Does your environment push you forward or keep you small?",
            ),
            Self::SaviorMentor => (
                10,
                "Savior Mentor",
                PrimaryEmotional,
                "Need for outside guidance",
                "Activate the desire for an authority who believes in them",
                "You need someone who sees your potential when you cannot",
            ),
            Self::NecessaryCourage => (
                11,
                "Necessary Courage",
                PrimaryEmotional,
                "Paralysing fear in disguise",
                "Turn excuses into courageous decisions",
                "It is not about perfect conditions, it is about deciding despite the fear",
            ),
            Self::RevealedMechanism => (
                12,
                "Revealed Mechanism",
                ComplementaryRational,
                "Understanding the how",
                "Demystify the complex",
                "It is simply [simple analogy], not [perceived complication]",
            ),
            Self::MathematicalProof => (
                13,
                "Mathematical Proof",
                ComplementaryRational,
                "Numerical certainty",
                "Irrefutable equation",
                "If you do X for Y days you get result Z",
            ),
            Self::HiddenPattern => (
                14,
                "Hidden Pattern",
                ComplementaryRational,
                "Revealing insight",
                "Show what was always there",
                "Everyone who achieved [result] did [specific pattern]",
            ),
            Self::PossibleException => (
                15,
                "Possible Exception",
                ComplementaryRational,
                "Breaking a limitation",
                "Prove that rules can be broken",
                "They said [limitation], but [contrary proof]",
            ),
            Self::EthicalShortcut => (
                16,
                "Ethical Shortcut",
                ComplementaryRational,
                "Efficiency without guilt",
                "Validate the fastest path",
                "Why suffer [long time] when there is [proven shortcut]?",
            ),
            Self::BinaryDecision => (
                17,
                "Binary Decision",
                ComplementaryRational,
                "Radical simplification",
                "Eliminate the grey zone",
                "Either you [desired action] or you accept [painful consequence]",
            ),
            Self::HiddenOpportunity => (
                18,
                "Hidden Opportunity",
                ComplementaryRational,
                "Unnoticed advantage",
                "Reveal an obvious but ignored demand",
                "The market is screaming for [solution] and nobody is listening",
            ),
            Self::MethodVsLuck => (
                19,
                "Method vs Luck",
                ComplementaryRational,
                "Chaos versus system",
                "Contrast random attempts with a structured path",
                "Without a method you are clearing the jungle with a sickle. With a method you are on the highway",
            ),
        };
        DriverDefinition {
            id,
            name,
            category,
            trigger,
            mechanics,
            activation_template,
        }
    }

    pub fn name(self) -> &'static str {
        self.definition().name
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let needle = name.trim();
        Self::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(needle))
    }

    pub fn is_high_impact(self) -> bool {
        matches!(
            self,
            Self::BrutalDiagnosis
                | Self::ExpandedAmbition
                | Self::PsychologicalClock
                | Self::BinaryDecision
        )
    }

    fn install_moment(self) -> &'static str {
        match self {
            Self::BrutalDiagnosis => "Opening - break the pattern and raise awareness",
            Self::ExpandedAmbition => "Development - after awakening, amplify desires",
            Self::PsychologicalClock => "Middle - create time pressure",
            Self::MethodVsLuck => "Pre-pitch - position the solution",
            Self::BinaryDecision => "Closing - force the choice",
            Self::InvisibleCost => "Development - quantify losses",
            Self::NecessaryCourage => "Closing - remove the last barrier",
            _ => "Development - default moment",
        }
    }

    fn activation_script(self, segment: &str) -> ActivationScript {
        let custom = |opening: String, analogy: String, metaphor: String, command: &str| {
            ActivationScript {
                opening_question: opening,
                analogy_story: analogy,
                visual_metaphor: metaphor,
                action_command: command.to_string(),
            }
        };
        match self {
            Self::BrutalDiagnosis => custom(
                format!("How long have you been stuck at the same level in {segment}?"),
                format!(
                    "It is like a {segment} professional who works 12 hours a day but has earned \
                     the same for 3 years. All that effort, all that dedication, and the results \
                     do not follow."
                ),
                format!(
                    "Picture a hamster on a golden wheel. It runs hard and tries hard, yet stays \
                     in the same place. That is the {segment} professional without a system."
                ),
                "Stop accepting mediocrity disguised as effort",
            ),
            Self::ExpandedAmbition => custom(
                format!("Why are you asking so little of your {segment} business?"),
                format!(
                    "It is like owning a Ferrari and only ever using first gear. You have all the \
                     potential in {segment}, but you are artificially limiting your results."
                ),
                format!(
                    "Picture your {segment} business running at 100% capacity. Every process \
                     optimised, every opportunity captured."
                ),
                "Raise your expectations to the level of your real potential",
            ),
            Self::PsychologicalClock => custom(
                format!("How many more years will you waste before you master {segment}?"),
                format!(
                    "Every month that passes without optimising your {segment} business is a \
                     month your competitors spend gaining ground. Time does not stop while you \
                     get organised."
                ),
                format!(
                    "Picture a giant stopwatch over your {segment} business. Every second that \
                     ticks by, opportunities slip away."
                ),
                "Act now or accept being left behind for good",
            ),
            Self::MethodVsLuck => custom(
                format!("What part of your results in {segment} comes from a method, and what part from luck?"),
                format!(
                    "Two people set out to cross the same forest. One hacks at the undergrowth \
                     with a sickle, the other follows a paved road someone already built. Most of \
                     {segment} is still swinging the sickle and calling it hard work."
                ),
                format!(
                    "Picture a dark jungle next to a lit highway, both ending at the same \
                     {segment} goal. Only one of them has signs."
                ),
                "Trade improvisation for a proven path",
            ),
            Self::BinaryDecision => custom(
                format!("If nothing changes in the next 12 months, where will your {segment} business be?"),
                format!(
                    "A crossroads has no third lane. Standing still in the middle of it is also a \
                     choice, and in {segment} it is the most expensive one because the market \
                     keeps moving while you wait."
                ),
                format!(
                    "Picture two doors: behind one the {segment} results you want, behind the \
                     other the same year repeated again."
                ),
                "Choose now, because not choosing is choosing to stay",
            ),
            Self::InvisibleCost => custom(
                format!("How much money is your {segment} business losing every single day without you noticing?"),
                format!(
                    "It is like a tap dripping in an empty house. No single drop seems to matter, \
                     but at the end of the year the bill arrives. In {segment} every unoptimised \
                     process is one of those drops."
                ),
                format!(
                    "Picture a leaking bucket you keep refilling with your {segment} revenue. You \
                     never see the hole, only the level that never rises."
                ),
                "Put a number on the cost of waiting",
            ),
            Self::NecessaryCourage => custom(
                format!("What is the real fear that keeps you from changing how you work in {segment}?"),
                format!(
                    "Nobody who built something relevant in {segment} waited for perfect \
                     conditions. They decided first and adjusted on the way, while the ones \
                     waiting for certainty are still waiting."
                ),
                format!(
                    "Picture the edge of a diving board above your {segment} goals. The water is \
                     deep enough, the only thing missing is the jump."
                ),
                "Decide despite the fear",
            ),
            other => ActivationScript {
                opening_question: other.definition().activation_template.to_string(),
                analogy_story: format!("Story customized for {segment}"),
                visual_metaphor: format!("Visual metaphor for {segment}"),
                action_command: "Specific action command".to_string(),
            },
        }
    }

    fn anchor_phrases(self, segment: &str) -> Vec<String> {
        match self {
            Self::BrutalDiagnosis => vec![
                format!("Mediocrity in {segment} is not fate, it is a choice"),
                format!("Your results in {segment} mirror your decisions"),
                format!("Accepting less in {segment} is stealing from yourself"),
            ],
            Self::ExpandedAmbition => vec![
                format!("Your potential in {segment} has no ceiling, your beliefs do"),
                format!("Small dreams in {segment} produce small results"),
                format!("If you are going to dream about {segment}, dream big"),
            ],
            Self::PsychologicalClock => vec![
                format!("Every day without optimising {segment} is a day lost forever"),
                format!("Time does not wait for you to be ready for {segment}"),
                format!("Procrastination in {segment} is self-sabotage in disguise"),
            ],
            other => vec![format!("Anchor phrase for {} in {segment}", other.name())],
        }
    }

    fn logical_proof(self, segment: &str) -> LogicalProof {
        let proof = |statistic: String, case_example: String, demonstration: &str| LogicalProof {
            statistic,
            case_example,
            demonstration: demonstration.to_string(),
        };
        match self {
            Self::BrutalDiagnosis => proof(
                format!("87% of {segment} professionals are stuck in day-to-day operations"),
                format!("A {segment} business owner who worked 80 hours a week with flat revenue for 3 years"),
                "Your current numbers against your real potential",
            ),
            Self::ExpandedAmbition => proof(
                format!("Only 3% of {segment} professionals explore their full potential"),
                format!("A {segment} company that tripled revenue by changing its mindset alone"),
                "Calculation of your real potential against current results",
            ),
            Self::PsychologicalClock => proof(
                format!("Every year of delay in {segment} costs on average $20,000 in missed opportunities"),
                format!("A professional who lost market leadership in {segment} by procrastinating"),
                "Calculation of the cost of each month of inaction",
            ),
            other => LogicalProof {
                statistic: format!("Specific data about {} in {segment}", other.name()),
                case_example: format!("Real case of {} applied in {segment}", other.name()),
                demonstration: format!("How to prove {} in practice", other.name()),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivationScript {
    pub opening_question: String,
    pub analogy_story: String,
    pub visual_metaphor: String,
    pub action_command: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogicalProof {
    pub statistic: String,
    pub case_example: String,
    pub demonstration: String,
}

/// A driver customised for one project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomDriver {
    pub kind: DriverKind,
    pub name: String,
    pub category: String,
    pub central_trigger: String,
    pub visceral_definition: String,
    pub install_moment: String,
    pub activation_script: ActivationScript,
    pub anchor_phrases: Vec<String>,
    pub logical_proof: LogicalProof,
    pub reinforcement_loop: String,
    pub impact_power: String,
}

impl CustomDriver {
    pub fn build(kind: DriverKind, segment: &str) -> Self {
        let def = kind.definition();
        Self {
            kind,
            name: def.name.to_string(),
            category: def.category.label().to_string(),
            central_trigger: def.trigger.to_string(),
            visceral_definition: def.mechanics.to_string(),
            install_moment: kind.install_moment().to_string(),
            activation_script: kind.activation_script(segment),
            anchor_phrases: kind.anchor_phrases(segment),
            logical_proof: kind.logical_proof(segment),
            reinforcement_loop: format!(
                "Every time you think about {segment}, remember: {}",
                def.activation_template
            ),
            impact_power: if kind.is_high_impact() { "High" } else { "Medium" }.to_string(),
        }
    }

    /// Reason the driver is unusable, if any.
    pub fn rejection(&self) -> Option<&'static str> {
        if self.name.trim().is_empty() {
            return Some("missing name");
        }
        if self.central_trigger.trim().is_empty() {
            return Some("missing central trigger");
        }
        if self.activation_script.opening_question.chars().count() < 20 {
            return Some("opening question too short");
        }
        let analogy = &self.activation_script.analogy_story;
        if analogy.to_lowercase().contains("customized for") && analogy.chars().count() < 100 {
            return Some("generic analogy story");
        }
        None
    }
}

#[derive(Debug, Clone, Default)]
pub struct MentalDriverGenerator;

impl MentalDriverGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn generate(&self, avatar: &Value, input: &ProjectInput) -> Result<Value, GeneratorError> {
        if !crate::executor::is_truthy(avatar) {
            return Err(GeneratorError::MissingInput("avatar".to_string()));
        }
        let segment = input.segment.trim();
        if segment.is_empty() {
            return Err(GeneratorError::MissingInput("segment".to_string()));
        }

        let drivers: Vec<CustomDriver> = DriverKind::ESSENTIAL
            .into_iter()
            .map(|kind| CustomDriver::build(kind, segment))
            .filter(|driver| match driver.rejection() {
                Some(reason) => {
                    tracing::warn!(driver = %driver.name, reason, "discarding mental driver");
                    false
                }
                None => true,
            })
            .collect();

        if drivers.is_empty() {
            return Err(GeneratorError::NothingValid("mental drivers".to_string()));
        }
        tracing::info!(count = drivers.len(), segment, "mental drivers generated");

        Ok(json!({
            "drivers": drivers,
            "strategic_sequencing": strategic_sequencing(),
            "implementation_phases": implementation_phases(),
            "activation_scripts": activation_scripts(&drivers),
            "effectiveness_metrics": effectiveness_metrics(),
            "validation_status": "VALID",
            "total_drivers": drivers.len(),
            "generated_at": now_rfc3339(),
        }))
    }
}

fn strategic_sequencing() -> Value {
    let phase = |objective: &str, drivers: [DriverKind; 2], duration: &str, intensity: &str| {
        json!({
            "objective": objective,
            "drivers": drivers.iter().map(|d| d.name()).collect::<Vec<_>>(),
            "duration": duration,
            "intensity": intensity,
        })
    };
    use DriverKind::*;
    json!({
        "phase_1_awakening": phase("Break the pattern and raise awareness", [BrutalDiagnosis, HiddenOpportunity], "5-7 minutes", "High"),
        "phase_2_desire": phase("Amplify desires and possibilities", [ExpandedAmbition, SecretTrophy], "8-10 minutes", "Rising"),
        "phase_3_pressure": phase("Create urgency and pressure", [PsychologicalClock, InvisibleCost], "5-7 minutes", "Maximum"),
        "phase_4_direction": phase("Offer a path and a solution", [MethodVsLuck, SaviorMentor], "6-8 minutes", "Hopeful"),
        "phase_5_decision": phase("Force decision and action", [BinaryDecision, NecessaryCourage], "3-5 minutes", "Definitive"),
    })
}

fn implementation_phases() -> Value {
    json!({
        "pre_launch": {
            "week_1": "Install Brutal Diagnosis in content",
            "week_2": "Activate Expanded Ambition in stories",
            "week_3": "Start the Psychological Clock subtly",
            "week_4": "Intensify every driver",
        },
        "during_event": {
            "opening": "Brutal Diagnosis + Hidden Opportunity",
            "development": "Expanded Ambition + Invisible Cost",
            "pre_pitch": "Method vs Luck + Savior Mentor",
            "closing": "Binary Decision + Necessary Courage",
        },
        "post_event": {
            "follow_up_1": "Reinforce the Psychological Clock",
            "follow_up_2": "Activate the Invisible Cost",
            "follow_up_3": "Final Binary Decision",
        },
    })
}

fn activation_scripts(drivers: &[CustomDriver]) -> Value {
    let scripts: Map<String, Value> = drivers
        .iter()
        .map(|d| {
            let lower = d.name.to_lowercase();
            (
                d.name.clone(),
                json!({
                    "opening": format!("Let me ask you a question about {lower}..."),
                    "development": d.activation_script.analogy_story,
                    "closing": d.activation_script.action_command,
                    "reactivation": format!("Remember what we said about {lower}?"),
                }),
            )
        })
        .collect();
    Value::Object(scripts)
}

fn effectiveness_metrics() -> Value {
    json!({
        "success_indicators": [
            "Absolute silence during activation",
            "Emotional comments in the chat",
            "Questions about when enrolment opens",
            "Physical agreement (nodding)",
        ],
        "resistance_signals": [
            "Excessive technical questions",
            "Changing the subject",
            "Immediate objections",
            "Closed body language",
        ],
        "conversion_metrics": {
            "engagement": "Attention time per driver",
            "emotional": "Emotional reactions generated",
            "behavioral": "Actions taken after activation",
            "conversion": "Conversion rate after the drivers",
        },
        "optimization": {
            "ab_testing": "Test different versions of the drivers",
            "personalization": "Adapt by audience profile",
            "timing": "Optimise activation moments",
            "intensity": "Adjust driver strength",
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn input(segment: &str) -> ProjectInput {
        ProjectInput {
            segment: segment.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_library_has_nineteen_unique_drivers() {
        let mut ids: Vec<u8> = DriverKind::ALL.iter().map(|k| k.definition().id).collect();
        ids.sort_unstable();
        assert_eq!(ids, (1..=19).collect::<Vec<u8>>());

        let rational = DriverKind::ALL
            .iter()
            .filter(|k| k.definition().category == DriverCategory::ComplementaryRational)
            .count();
        assert_eq!(rational, 8);
    }

    #[test]
    fn test_from_name_is_case_insensitive() {
        assert_eq!(DriverKind::from_name("method vs luck"), Some(DriverKind::MethodVsLuck));
        assert_eq!(DriverKind::from_name("Nope"), None);
    }

    #[test]
    fn test_generic_driver_is_rejected() {
        let driver = CustomDriver::build(DriverKind::HiddenPattern, "fitness");
        assert_eq!(driver.rejection(), Some("generic analogy story"));

        let driver = CustomDriver::build(DriverKind::BrutalDiagnosis, "fitness");
        assert_eq!(driver.rejection(), None);
        assert_eq!(driver.impact_power, "High");
    }

    #[test]
    fn test_generate_essential_drivers() {
        let out = MentalDriverGenerator::new()
            .generate(&json!({"pains": ["x"]}), &input("digital marketing"))
            .unwrap();

        assert_eq!(out["validation_status"], "VALID");
        assert_eq!(out["total_drivers"], 7);
        let names: Vec<&str> = out["drivers"]
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["name"].as_str().unwrap())
            .collect();
        assert_eq!(names[0], "Brutal Diagnosis");
        assert!(names.contains(&"Necessary Courage"));
        assert!(out["activation_scripts"]["Method vs Luck"]["opening"]
            .as_str()
            .unwrap()
            .contains("method vs luck"));
        assert_eq!(
            out["strategic_sequencing"]["phase_3_pressure"]["intensity"],
            "Maximum"
        );
    }

    #[test]
    fn test_generate_requires_avatar_and_segment() {
        let gen = MentalDriverGenerator::new();
        assert!(matches!(
            gen.generate(&Value::Null, &input("fitness")),
            Err(GeneratorError::MissingInput(_))
        ));
        assert!(matches!(
            gen.generate(&json!({"pains": ["x"]}), &input("  ")),
            Err(GeneratorError::MissingInput(_))
        ));
    }
}
