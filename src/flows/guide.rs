use super::{require_text, Flow, FlowKind, Validate};
use crate::prompt::{list_section, optional_section, render_template};
use serde::{Deserialize, Serialize};

const GENERATE_GUIDE_TEMPLATE: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/prompts/generate_guide.md"
));

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GenerateGuideInput {
    pub refined_idea: String,
    #[serde(default)]
    pub associated_concepts: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_audience: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tech_stack_suggestion: Option<String>,
}

impl Validate for GenerateGuideInput {
    fn validate(&self) -> Result<(), String> {
        require_text("refinedIdea", &self.refined_idea)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevelopmentGuide {
    pub guide_markdown: String,
}

pub struct GenerateGuide;

impl Flow for GenerateGuide {
    type Input = GenerateGuideInput;
    type Response = DevelopmentGuide;
    type Output = DevelopmentGuide;

    const NAME: &'static str = FlowKind::GenerateGuide.name();
    const FAILURE_MESSAGE: &'static str = "AI failed to generate the development guide markdown.";
    const OUTPUT_SCHEMA: &'static str = r#"{ "guideMarkdown": "string (Markdown)" }"#;

    fn prompt(input: &GenerateGuideInput) -> String {
        let concepts_section = list_section("Associated Concepts", &input.associated_concepts);
        let audience_section =
            optional_section("Target Audience", input.target_audience.as_deref());
        let tech_stack_section = optional_section(
            "Tech Stack Preference",
            input.tech_stack_suggestion.as_deref(),
        );
        render_template(
            GENERATE_GUIDE_TEMPLATE,
            &[
                ("refined_idea", input.refined_idea.trim()),
                ("concepts_section", concepts_section.as_str()),
                ("audience_section", audience_section.as_str()),
                ("tech_stack_section", tech_stack_section.as_str()),
            ],
        )
    }

    fn finish(&mut self, response: DevelopmentGuide) -> Result<DevelopmentGuide, String> {
        require_text("guideMarkdown", &response.guide_markdown)?;
        Ok(response)
    }
}
