use super::{require_text, Flow, FlowKind, Validate};
use crate::lm::InlineMedia;
use crate::prompt::{optional_section, render_template};
use serde::{Deserialize, Serialize};

const ANALYZE_IMAGE_TEMPLATE: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/prompts/analyze_image.md"
));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AnalyzeImageInput {
    /// `data:<mime>;base64,<payload>`
    pub photo_data_uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_question: Option<String>,
}

impl Validate for AnalyzeImageInput {
    fn validate(&self) -> Result<(), String> {
        let media = InlineMedia::from_data_uri(&self.photo_data_uri).ok_or_else(|| {
            "photoDataUri must be a data URI like data:<mimetype>;base64,<encoded_data>"
                .to_string()
        })?;
        if !media.mime_type.starts_with("image/") {
            return Err(format!(
                "photoDataUri must contain an image (got {})",
                media.mime_type
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageInsights {
    pub ui_ux_analysis: String,
    pub brand_and_marketing_analysis: String,
    pub feature_identification: Vec<String>,
    pub potential_improvements: Vec<String>,
}

pub struct AnalyzeImage;

impl Flow for AnalyzeImage {
    type Input = AnalyzeImageInput;
    type Response = ImageInsights;
    type Output = ImageInsights;

    const NAME: &'static str = FlowKind::AnalyzeImage.name();
    const FAILURE_MESSAGE: &'static str = "AI failed to generate insights for the image.";
    const OUTPUT_SCHEMA: &'static str = r#"{
  "uiUxAnalysis": "string",
  "brandAndMarketingAnalysis": "string",
  "featureIdentification": ["string"],
  "potentialImprovements": ["string"]
}"#;

    fn prompt(input: &AnalyzeImageInput) -> String {
        let question_section = optional_section("User Question", input.user_question.as_deref());
        render_template(
            ANALYZE_IMAGE_TEMPLATE,
            &[("question_section", question_section.as_str())],
        )
    }

    fn media(input: &AnalyzeImageInput) -> Option<InlineMedia> {
        InlineMedia::from_data_uri(&input.photo_data_uri)
    }

    fn finish(&mut self, response: ImageInsights) -> Result<ImageInsights, String> {
        require_text("uiUxAnalysis", &response.ui_ux_analysis)?;
        require_text(
            "brandAndMarketingAnalysis",
            &response.brand_and_marketing_analysis,
        )?;
        Ok(response)
    }
}
