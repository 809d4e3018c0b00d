use super::{require_text, Flow, FlowKind, Validate};
use crate::prompt::render_template;
use serde::{Deserialize, Serialize};

const ANALYZE_SAFETY_TEMPLATE: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/prompts/analyze_safety.md"
));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AnalyzeSafetyInput {
    pub idea: String,
}

impl Validate for AnalyzeSafetyInput {
    fn validate(&self) -> Result<(), String> {
        require_text("idea", &self.idea)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyAnalysis {
    pub potential_misuse: String,
    pub safety_and_alignment_risks: String,
    pub ethical_considerations: String,
}

pub struct AnalyzeSafety;

impl Flow for AnalyzeSafety {
    type Input = AnalyzeSafetyInput;
    type Response = SafetyAnalysis;
    type Output = SafetyAnalysis;

    const NAME: &'static str = FlowKind::AnalyzeSafety.name();
    const FAILURE_MESSAGE: &'static str = "AI failed to generate a safety analysis for the idea.";
    const OUTPUT_SCHEMA: &'static str = r#"{
  "potentialMisuse": "string",
  "safetyAndAlignmentRisks": "string",
  "ethicalConsiderations": "string"
}"#;

    fn prompt(input: &AnalyzeSafetyInput) -> String {
        render_template(ANALYZE_SAFETY_TEMPLATE, &[("idea", input.idea.trim())])
    }

    fn finish(&mut self, response: SafetyAnalysis) -> Result<SafetyAnalysis, String> {
        require_text("potentialMisuse", &response.potential_misuse)?;
        require_text("safetyAndAlignmentRisks", &response.safety_and_alignment_risks)?;
        require_text("ethicalConsiderations", &response.ethical_considerations)?;
        Ok(response)
    }
}
