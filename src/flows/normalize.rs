//! Repair of the refine flow's numeric output.
//!
//! Models routinely return scores as `"75/100"`, drop the chart data, or
//! emit too few or too many factors. [`normalize_refinement`] coerces any
//! response that carries the required text fields into a valid
//! [`IdeaRefinement`]; it never fails.
use super::refine::{IdeaRefinement, ViabilityFactor};
use rand::Rng;
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value};
use std::ops::Range;
use std::sync::OnceLock;

pub const DEFAULT_MARKET_SCORE: u8 = 50;
pub const MIN_FACTORS: usize = 3;
pub const MAX_FACTORS: usize = 5;
pub const UNNAMED_FACTOR: &str = "Unnamed Factor";
/// Scores drawn for synthesized factors.
pub const PADDED_SCORE_RANGE: Range<u8> = 30..80;

/// Refine response as parsed, before repair.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRefinement {
    pub refined_idea: String,
    pub associated_concepts: Vec<String>,
    pub potential_pivots: Vec<String>,
    #[serde(default)]
    pub market_potential_score: Option<Value>,
    pub swot_snippet: String,
    pub competitor_teaser: String,
    #[serde(default)]
    pub viability_factors_chart_data: Option<Value>,
}

/// Apply the score and chart-data repair rules, in order.
pub fn normalize_refinement<R: Rng>(raw: RawRefinement, rng: &mut R) -> IdeaRefinement {
    let market_potential_score = extract_score(raw.market_potential_score.as_ref());

    let mut entries = match raw.viability_factors_chart_data {
        Some(Value::Array(entries)) => entries,
        _ => Vec::new(),
    };
    while entries.len() < MIN_FACTORS {
        let position = entries.len() + 1;
        entries.push(json!({
            "name": format!("Factor {position}"),
            "score": rng.gen_range(PADDED_SCORE_RANGE),
        }));
    }
    entries.truncate(MAX_FACTORS);

    IdeaRefinement {
        refined_idea: raw.refined_idea,
        associated_concepts: raw.associated_concepts,
        potential_pivots: raw.potential_pivots,
        market_potential_score,
        swot_snippet: raw.swot_snippet,
        competitor_teaser: raw.competitor_teaser,
        viability_factors_chart_data: entries.iter().map(sanitize_factor).collect(),
    }
}

/// Numbers are used directly, strings yield their first digit run, anything
/// else falls back to [`DEFAULT_MARKET_SCORE`]. The result is clamped.
pub fn extract_score(value: Option<&Value>) -> u8 {
    let score = match value {
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => first_digit_run(text),
        _ => None,
    };
    score.map_or(DEFAULT_MARKET_SCORE, clamp_score)
}

fn first_digit_run(text: &str) -> Option<f64> {
    static DIGITS: OnceLock<Regex> = OnceLock::new();
    let digits = DIGITS.get_or_init(|| Regex::new(r"\d+").expect("digit pattern compiles"));
    digits.find(text)?.as_str().parse().ok()
}

/// Round to the nearest integer and clamp to 0..=100.
pub fn clamp_score(score: f64) -> u8 {
    if score.is_nan() {
        return 0;
    }
    score.round().clamp(0.0, 100.0) as u8
}

fn sanitize_factor(entry: &Value) -> ViabilityFactor {
    let name = entry
        .get("name")
        .and_then(Value::as_str)
        .filter(|name| !name.trim().is_empty())
        .unwrap_or(UNNAMED_FACTOR);
    let score = entry
        .get("score")
        .and_then(Value::as_f64)
        .map_or(0, clamp_score);
    ViabilityFactor {
        name: name.to_string(),
        score,
    }
}

#[cfg(test)]
#[path = "normalize_tests.rs"]
mod tests;
