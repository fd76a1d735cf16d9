use std::collections::HashSet;

use serde_json::Value;

use crate::backend::{ContentValidator, ContentVerdict};

/// Markers of pages that are error screens or anti-bot walls, not content.
const BOILERPLATE_MARKERS: [&str; 8] = [
    "enable javascript",
    "access denied",
    "page not found",
    "404 not found",
    "captcha",
    "are you a robot",
    "lorem ipsum",
    "subscribe to continue reading",
];

/// Markers that betray invented or placeholder values in model output.
pub const SIMULATION_MARKERS: [&str; 1] = ["n/a"];

/// Phrases a model uses when it templated a field instead of filling it.
pub const GENERIC_MARKERS: [&str; 3] = ["customized for", "based on", "specific to"];

pub fn contains_generic_marker(text: &str) -> bool {
    let lower = text.to_lowercase();
    GENERIC_MARKERS.iter().any(|m| lower.contains(m))
}

/// Simulation markers found anywhere in the serialised value.
pub fn find_placeholder_markers(value: &Value) -> Vec<&'static str> {
    let haystack = value.to_string().to_lowercase();
    SIMULATION_MARKERS
        .iter()
        .copied()
        .filter(|m| haystack.contains(m))
        .collect()
}

/// Default page validator: length, boilerplate and lexical-variety heuristics.
#[derive(Debug, Clone)]
pub struct HeuristicContentValidator {
    pub min_chars: usize,
    pub min_score: f64,
}

impl Default for HeuristicContentValidator {
    fn default() -> Self {
        Self {
            min_chars: 300,
            min_score: 50.0,
        }
    }
}

impl HeuristicContentValidator {
    pub fn score(content: &str) -> f64 {
        let chars = content.chars().count() as f64;
        let length = (chars / 3_000.0).min(1.0) * 40.0;

        let words: Vec<String> = content
            .split_whitespace()
            .map(|w| {
                w.trim_matches(|c: char| !c.is_alphanumeric())
                    .to_lowercase()
            })
            .filter(|w| !w.is_empty())
            .collect();
        let variety = if words.is_empty() {
            0.0
        } else {
            let unique: HashSet<&str> = words.iter().map(String::as_str).collect();
            // A 0.4 unique-word ratio earns full marks.
            ((unique.len() as f64 / words.len() as f64) / 0.4).min(1.0) * 30.0
        };

        let sentences = content
            .split(['.', '!', '?'])
            .filter(|s| s.split_whitespace().count() >= 3)
            .count();
        let structure = if sentences == 0 {
            0.0
        } else {
            let avg = words.len() as f64 / sentences as f64;
            if (5.0..=40.0).contains(&avg) {
                20.0
            } else {
                10.0
            }
        };

        let letters = content.chars().filter(|c| c.is_alphabetic()).count() as f64;
        let prose = if chars > 0.0 && letters / chars >= 0.6 {
            10.0
        } else {
            0.0
        };

        (length + variety + structure + prose).min(100.0)
    }
}

impl ContentValidator for HeuristicContentValidator {
    fn validate(&self, content: &str, url: &str) -> ContentVerdict {
        let trimmed = content.trim();
        if trimmed.chars().count() < self.min_chars {
            return ContentVerdict::reject(0.0, format!("content too short for {url}"));
        }
        let lower = trimmed.to_lowercase();
        if let Some(marker) = BOILERPLATE_MARKERS.iter().find(|m| lower.contains(*m)) {
            return ContentVerdict::reject(0.0, format!("boilerplate marker '{marker}'"));
        }
        let score = Self::score(trimmed);
        if score < self.min_score {
            return ContentVerdict::reject(score, format!("quality score {score:.1} too low"));
        }
        ContentVerdict::accept(score)
    }
}
