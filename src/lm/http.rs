//! HTTP transport for Gemini-style `generateContent` endpoints.
use super::{with_response_format, GenerateRequest, ModelClient, TransportError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::{Duration, Instant};

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_API_KEY_ENV: &str = "GEMINI_API_KEY";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_api_key_env() -> String {
    DEFAULT_API_KEY_ENV.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// `http` section of the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpModelConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    pub model: String,
    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Model client that posts to a remote endpoint.
pub struct HttpClient {
    agent: ureq::Agent,
    url: String,
    api_key: String,
}

impl HttpClient {
    /// Build a client, reading the API key from the configured variable.
    pub fn new(config: &HttpModelConfig) -> Result<Self, TransportError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| TransportError::MissingApiKey(config.api_key_env.clone()))?;
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.timeout_secs)))
            .build()
            .into();
        Ok(Self {
            agent,
            url: generate_url(config),
            api_key,
        })
    }
}

fn generate_url(config: &HttpModelConfig) -> String {
    format!(
        "{}/models/{}:generateContent",
        config.endpoint.trim_end_matches('/'),
        config.model
    )
}

fn request_body(request: &GenerateRequest<'_>) -> Value {
    let mut parts = vec![json!({
        "text": with_response_format(request.prompt, request.output_schema)
    })];
    if let Some(media) = request.media {
        parts.push(json!({
            "inline_data": { "mime_type": media.mime_type, "data": media.data }
        }));
    }
    let mut body = json!({
        "contents": [{ "role": "user", "parts": parts }]
    });
    if !request.output_schema.is_empty() {
        body["generationConfig"] = json!({ "responseMimeType": "application/json" });
    }
    body
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

/// Concatenate the text parts of the first candidate.
fn first_candidate_text(response: GenerateContentResponse) -> Option<String> {
    let content = response.candidates.into_iter().next()?.content?;
    let text: String = content
        .parts
        .into_iter()
        .filter_map(|part| part.text)
        .collect();
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

impl ModelClient for HttpClient {
    fn generate(&self, request: &GenerateRequest<'_>) -> Result<Option<String>, TransportError> {
        let body = request_body(request);
        let start = Instant::now();
        let mut response = self
            .agent
            .post(&self.url)
            .header("x-goog-api-key", self.api_key.as_str())
            .send_json(&body)?;
        let parsed: GenerateContentResponse = response.body_mut().read_json()?;
        let text = first_candidate_text(parsed);

        tracing::info!(
            elapsed_ms = start.elapsed().as_millis(),
            prompt_bytes = request.prompt.len(),
            response_bytes = text.as_ref().map_or(0, String::len),
            "lm invoke complete"
        );
        Ok(text)
    }
}
