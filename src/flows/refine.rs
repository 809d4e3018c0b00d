use super::normalize::{normalize_refinement, RawRefinement};
use super::{require_text, Flow, FlowKind, Validate};
use crate::prompt::render_template;
use rand::Rng;
use serde::{Deserialize, Serialize};

const REFINE_IDEA_TEMPLATE: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/prompts/refine_idea.md"
));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RefineIdeaInput {
    pub idea: String,
}

impl Validate for RefineIdeaInput {
    fn validate(&self) -> Result<(), String> {
        require_text("idea", &self.idea)
    }
}

/// A named market-attractiveness dimension scored 0..=100.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViabilityFactor {
    pub name: String,
    pub score: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdeaRefinement {
    pub refined_idea: String,
    pub associated_concepts: Vec<String>,
    pub potential_pivots: Vec<String>,
    pub market_potential_score: u8,
    pub swot_snippet: String,
    pub competitor_teaser: String,
    pub viability_factors_chart_data: Vec<ViabilityFactor>,
}

/// Idea refinement. Score and chart data are repaired, never rejected.
pub struct RefineIdea<R> {
    rng: R,
}

impl<R: Rng> RefineIdea<R> {
    /// `rng` supplies scores for padded chart entries.
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> Flow for RefineIdea<R> {
    type Input = RefineIdeaInput;
    type Response = RawRefinement;
    type Output = IdeaRefinement;

    const NAME: &'static str = FlowKind::RefineIdea.name();
    const FAILURE_MESSAGE: &'static str = "AI failed to refine the idea.";
    const OUTPUT_SCHEMA: &'static str = r#"{
  "refinedIdea": "string",
  "associatedConcepts": ["string"],
  "potentialPivots": ["string"],
  "marketPotentialScore": 0,
  "swotSnippet": "string",
  "competitorTeaser": "string",
  "viabilityFactorsChartData": [{ "name": "string", "score": 0 }]
}"#;

    fn prompt(input: &RefineIdeaInput) -> String {
        render_template(REFINE_IDEA_TEMPLATE, &[("idea", input.idea.trim())])
    }

    fn finish(&mut self, response: RawRefinement) -> Result<IdeaRefinement, String> {
        require_text("refinedIdea", &response.refined_idea)?;
        require_text("swotSnippet", &response.swot_snippet)?;
        require_text("competitorTeaser", &response.competitor_teaser)?;
        Ok(normalize_refinement(response, &mut self.rng))
    }
}
