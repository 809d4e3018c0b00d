use super::{require_text, Flow, FlowKind, Validate};
use crate::prompt::render_template;
use serde::{Deserialize, Serialize};

const TRANSLATE_TEMPLATE: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/prompts/translate.md"
));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TranslateInput {
    pub text: String,
    pub target_language: String,
}

impl Validate for TranslateInput {
    fn validate(&self) -> Result<(), String> {
        require_text("text", &self.text)?;
        require_text("targetLanguage", &self.target_language)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Translation {
    pub translated_text: String,
}

pub struct Translate;

impl Flow for Translate {
    type Input = TranslateInput;
    type Response = Translation;
    type Output = Translation;

    const NAME: &'static str = FlowKind::Translate.name();
    const FAILURE_MESSAGE: &'static str = "Translation prompt did not return an output.";
    const OUTPUT_SCHEMA: &'static str = r#"{ "translatedText": "string" }"#;

    fn prompt(input: &TranslateInput) -> String {
        render_template(
            TRANSLATE_TEMPLATE,
            &[
                ("target_language", input.target_language.trim()),
                ("text", input.text.as_str()),
            ],
        )
    }

    fn finish(&mut self, response: Translation) -> Result<Translation, String> {
        let translated_text = unwrap_translation(&response.translated_text).to_string();
        require_text("translatedText", &translated_text)?;
        Ok(Translation { translated_text })
    }
}

/// Drop a code fence or a pair of matching quotes wrapped around the text.
fn unwrap_translation(text: &str) -> &str {
    let text = text.trim();
    if let Some(inner) = text.strip_prefix("```").and_then(|t| t.strip_suffix("```")) {
        // First line of a fence may carry a language tag.
        let inner = match inner.split_once('\n') {
            Some((tag, body)) if !tag.trim().contains(' ') => body,
            _ => inner,
        };
        return inner.trim();
    }
    for (open, close) in [('"', '"'), ('\u{201c}', '\u{201d}'), ('\u{ab}', '\u{bb}')] {
        if let Some(inner) = text.strip_prefix(open).and_then(|t| t.strip_suffix(close)) {
            if !inner.contains(open) && !inner.contains(close) {
                return inner.trim();
            }
        }
    }
    text
}
