use super::{require_text, Flow, FlowKind, Validate};
use crate::prompt::{list_section, optional_section, render_template};
use serde::{Deserialize, Serialize};

const GENERATE_PROPOSAL_TEMPLATE: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/prompts/generate_proposal.md"
));

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GenerateProposalInput {
    pub refined_idea: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_potential_score: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swot_snippet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub competitor_teaser: Option<String>,
    #[serde(default)]
    pub associated_concepts: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub funding_goal: Option<String>,
}

impl Validate for GenerateProposalInput {
    fn validate(&self) -> Result<(), String> {
        require_text("refinedIdea", &self.refined_idea)?;
        if let Some(score) = self.market_potential_score {
            if score > 100 {
                return Err(format!("marketPotentialScore must be 0..=100 (got {score})"));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessProposal {
    pub proposal_markdown: String,
    pub pitch_deck_outline_markdown: String,
}

pub struct GenerateProposal;

impl Flow for GenerateProposal {
    type Input = GenerateProposalInput;
    type Response = BusinessProposal;
    type Output = BusinessProposal;

    const NAME: &'static str = FlowKind::GenerateProposal.name();
    const FAILURE_MESSAGE: &'static str =
        "AI failed to generate the business proposal or pitch deck outline markdown.";
    const OUTPUT_SCHEMA: &'static str = r#"{
  "proposalMarkdown": "string (Markdown)",
  "pitchDeckOutlineMarkdown": "string (Markdown)"
}"#;

    fn prompt(input: &GenerateProposalInput) -> String {
        let score = input
            .market_potential_score
            .map(|score| format!("{score}/100"));
        let score_section = optional_section("Market Potential Score", score.as_deref());
        let swot_section = optional_section("SWOT Summary", input.swot_snippet.as_deref());
        let competitor_section =
            optional_section("Competitive Landscape", input.competitor_teaser.as_deref());
        let concepts_section = list_section("Associated Concepts", &input.associated_concepts);
        let funding_section = optional_section("Funding Goal", input.funding_goal.as_deref());
        render_template(
            GENERATE_PROPOSAL_TEMPLATE,
            &[
                ("refined_idea", input.refined_idea.trim()),
                ("score_section", score_section.as_str()),
                ("swot_section", swot_section.as_str()),
                ("competitor_section", competitor_section.as_str()),
                ("concepts_section", concepts_section.as_str()),
                ("funding_section", funding_section.as_str()),
            ],
        )
    }

    fn finish(&mut self, response: BusinessProposal) -> Result<BusinessProposal, String> {
        require_text("proposalMarkdown", &response.proposal_markdown)?;
        require_text("pitchDeckOutlineMarkdown", &response.pitch_deck_outline_markdown)?;
        Ok(response)
    }
}
