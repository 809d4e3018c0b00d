//! Model seam for the prompt flows.
//!
//! Flows never talk to a provider directly. They hand a [`GenerateRequest`]
//! to whatever [`ModelClient`] the caller injected and get back the raw
//! response text. Two transports ship with the tool:
//!
//! - [`CommandClient`]: pipes the prompt to a user-configured command
//!   (e.g. `llm`, `ollama run`, a wrapper script) and reads stdout.
//! - [`HttpClient`]: posts a `generateContent` request to a Gemini-style
//!   HTTP endpoint.
//!
//! # Declined answers
//!
//! `generate` returns `Ok(None)` when the transport completed but the model
//! produced no text (empty stdout, no candidates). Flows turn that into a
//! generation failure; transports never do.
mod command;
#[cfg(test)]
pub(crate) mod fake;
mod http;

pub use command::CommandClient;
pub use http::{HttpClient, HttpModelConfig};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use thiserror::Error;

/// Inline binary payload attached to a request (the image flow's photo).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineMedia {
    pub mime_type: String,
    /// Base64 payload without the `data:` prefix.
    pub data: String,
}

impl InlineMedia {
    /// Split a `data:<mime>;base64,<payload>` URI.
    pub fn from_data_uri(uri: &str) -> Option<Self> {
        let rest = uri.trim().strip_prefix("data:")?;
        let (header, data) = rest.split_once(',')?;
        let mime_type = header.strip_suffix(";base64")?;
        if !mime_type.contains('/') || data.is_empty() {
            return None;
        }
        let is_base64 = data
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/' | b'='));
        if !is_base64 {
            return None;
        }
        Some(Self {
            mime_type: mime_type.to_string(),
            data: data.to_string(),
        })
    }

    /// Encode raw bytes as inline media.
    pub fn from_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: BASE64.encode(bytes),
        }
    }

    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

/// A single model call as issued by a flow.
#[derive(Debug, Clone, Copy)]
pub struct GenerateRequest<'a> {
    /// Rendered instruction text.
    pub prompt: &'a str,
    /// JSON shape the response must follow, as shown to the model.
    pub output_schema: &'a str,
    pub media: Option<&'a InlineMedia>,
}

/// Failures of the transport itself. Flows propagate these unchanged.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("LM command is empty")]
    EmptyCommand,

    #[error("parse LM command {command:?}: {message}")]
    InvalidCommand { command: String, message: String },

    #[error("LM command not found: {program}")]
    CommandNotFound { program: String },

    #[error("LM command I/O ({stage}): {source}")]
    Io {
        stage: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("LM command failed with status {status}: {stderr}")]
    CommandFailed { status: String, stderr: String },

    #[error("LM output is not valid UTF-8")]
    InvalidUtf8,

    #[error("LM API key environment variable {0} is not set")]
    MissingApiKey(String),

    #[error("LM endpoint request failed: {0}")]
    Http(#[from] ureq::Error),
}

/// Capability to run one model generation.
pub trait ModelClient {
    fn generate(&self, request: &GenerateRequest<'_>) -> Result<Option<String>, TransportError>;
}

impl<T: ModelClient + ?Sized> ModelClient for Box<T> {
    fn generate(&self, request: &GenerateRequest<'_>) -> Result<Option<String>, TransportError> {
        (**self).generate(request)
    }
}

/// Append the response-format section showing the expected JSON shape.
///
/// Free-text flows pass an empty schema and get the prompt back untouched.
pub(crate) fn with_response_format(prompt: &str, output_schema: &str) -> String {
    if output_schema.trim().is_empty() {
        return prompt.to_string();
    }
    format!(
        "{}\n\n# Response Format\nRespond ONLY with a JSON object matching this shape, no other text:\n{}\n",
        prompt.trim_end(),
        output_schema.trim()
    )
}

/// Extract JSON from text that might have markdown code fences.
pub fn extract_json(text: &str) -> &str {
    let text = text.trim();

    // A bare object may carry fences inside its strings.
    if (text.starts_with('{') && text.ends_with('}'))
        || serde_json::from_str::<serde_json::Value>(text).is_ok()
    {
        return text;
    }

    if let Some(start) = text.find("```json") {
        let start = start + 7;
        if let Some(end) = text[start..].find("```") {
            return text[start..start + end].trim();
        }
    }

    if let Some(start) = text.find("```") {
        let start = start + 3;
        // Skip language identifier if present
        let start = text[start..]
            .find('\n')
            .map(|i| start + i + 1)
            .unwrap_or(start);
        if let Some(end) = text[start..].find("```") {
            return text[start..start + end].trim();
        }
    }

    // Prose around a bare object: take the outermost braces.
    if !text.starts_with('{') {
        if let (Some(open), Some(close)) = (text.find('{'), text.rfind('}')) {
            if open < close {
                return &text[open..=close];
            }
        }
    }

    text
}
