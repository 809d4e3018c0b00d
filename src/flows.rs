//! Typed prompt flows.
//!
//! A flow validates its input, renders a prompt, makes exactly one model
//! call, and parses the reply into its output type. There are no retries
//! and no partial results: the caller gets a complete output or a
//! [`FlowError`].
mod chat;
mod guide;
mod image;
mod normalize;
mod proposal;
mod refine;
mod safety;
mod translate;

pub use chat::{ChatFlow, ChatInput, ChatMessage, KnowledgeEntry};
pub use guide::{DevelopmentGuide, GenerateGuide, GenerateGuideInput};
pub use image::{AnalyzeImage, AnalyzeImageInput};
pub use proposal::{BusinessProposal, GenerateProposal, GenerateProposalInput};
pub use refine::{IdeaRefinement, RefineIdea, RefineIdeaInput};
pub use safety::{AnalyzeSafety, AnalyzeSafetyInput, SafetyAnalysis};
pub use translate::{Translate, TranslateInput};

use crate::lm::{extract_json, GenerateRequest, InlineMedia, ModelClient, TransportError};
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Why a flow call was rejected.
#[derive(Debug, Error)]
pub enum FlowError {
    /// Input failed the flow's checks; the model was not called.
    #[error("invalid {flow} input: {message}")]
    Validation { flow: &'static str, message: String },

    /// The model answered but produced nothing usable.
    #[error("{message}")]
    Generation {
        flow: &'static str,
        message: &'static str,
        detail: String,
    },

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl FlowError {
    /// Parse or validation reason behind a generation failure.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Generation { detail, .. } => Some(detail),
            _ => None,
        }
    }
}

/// Input-side contract checked before any prompt is built.
pub trait Validate {
    fn validate(&self) -> Result<(), String>;
}

/// One named task backed by a single model call.
pub trait Flow {
    type Input: Validate + DeserializeOwned;
    /// Shape the model is asked to emit.
    type Response: DeserializeOwned;
    type Output: Serialize;

    const NAME: &'static str;
    /// Message carried by every generation failure of this flow.
    const FAILURE_MESSAGE: &'static str;
    const OUTPUT_SCHEMA: &'static str;

    fn prompt(input: &Self::Input) -> String;

    fn media(_input: &Self::Input) -> Option<InlineMedia> {
        None
    }

    /// Turn a parsed response into the output, or explain why it is unusable.
    fn finish(&mut self, response: Self::Response) -> Result<Self::Output, String>;
}

/// A completed flow call with prompt/response metadata for logging.
#[derive(Debug)]
pub struct FlowRun<T> {
    pub output: T,
    pub prompt: String,
    pub raw_response: String,
    pub duration: Duration,
}

/// Run `flow` once against `client`.
pub fn run_flow<F, C>(
    flow: &mut F,
    client: &C,
    input: &F::Input,
) -> Result<FlowRun<F::Output>, FlowError>
where
    F: Flow,
    C: ModelClient + ?Sized,
{
    input.validate().map_err(|message| FlowError::Validation {
        flow: F::NAME,
        message,
    })?;

    let start = Instant::now();
    let prompt = F::prompt(input);
    let media = F::media(input);
    let request = GenerateRequest {
        prompt: &prompt,
        output_schema: F::OUTPUT_SCHEMA,
        media: media.as_ref(),
    };
    let generation_failure = |detail: String| {
        tracing::warn!(flow = F::NAME, %detail, "flow produced no usable output");
        FlowError::Generation {
            flow: F::NAME,
            message: F::FAILURE_MESSAGE,
            detail,
        }
    };

    let raw_response = client
        .generate(&request)?
        .ok_or_else(|| generation_failure("model returned no output".to_string()))?;
    let response: F::Response = serde_json::from_str(extract_json(&raw_response))
        .map_err(|err| generation_failure(format!("parse response: {err}")))?;
    let output = flow.finish(response).map_err(generation_failure)?;

    let duration = start.elapsed();
    tracing::debug!(
        flow = F::NAME,
        elapsed_ms = duration.as_millis(),
        "flow complete"
    );
    Ok(FlowRun {
        output,
        prompt,
        raw_response,
        duration,
    })
}

/// Fail when a required free-text field came back blank.
pub(crate) fn require_text(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field} is empty"));
    }
    Ok(())
}

/// Every flow, addressable by its kebab-case name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowKind {
    RefineIdea,
    GenerateGuide,
    GenerateProposal,
    AnalyzeSafety,
    AnalyzeImage,
    Translate,
    Chat,
}

impl FlowKind {
    pub const ALL: [FlowKind; 7] = [
        Self::RefineIdea,
        Self::GenerateGuide,
        Self::GenerateProposal,
        Self::AnalyzeSafety,
        Self::AnalyzeImage,
        Self::Translate,
        Self::Chat,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::RefineIdea => "refine-idea",
            Self::GenerateGuide => "generate-guide",
            Self::GenerateProposal => "generate-proposal",
            Self::AnalyzeSafety => "analyze-safety",
            Self::AnalyzeImage => "analyze-image",
            Self::Translate => "translate",
            Self::Chat => "chat",
        }
    }
}

impl fmt::Display for FlowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FlowKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == s.trim())
            .ok_or_else(|| {
                let names: Vec<&str> = Self::ALL.iter().map(|kind| kind.name()).collect();
                format!("unknown flow {s:?} (expected one of: {})", names.join(", "))
            })
    }
}

/// Run a flow by name with a JSON input record, returning JSON output.
pub fn run_named<C, R>(
    kind: FlowKind,
    input: serde_json::Value,
    client: &C,
    rng: &mut R,
) -> Result<FlowRun<serde_json::Value>, FlowError>
where
    C: ModelClient + ?Sized,
    R: Rng,
{
    match kind {
        FlowKind::RefineIdea => run_json(&mut RefineIdea::new(rng), input, client),
        FlowKind::GenerateGuide => run_json(&mut GenerateGuide, input, client),
        FlowKind::GenerateProposal => run_json(&mut GenerateProposal, input, client),
        FlowKind::AnalyzeSafety => run_json(&mut AnalyzeSafety, input, client),
        FlowKind::AnalyzeImage => run_json(&mut AnalyzeImage, input, client),
        FlowKind::Translate => run_json(&mut Translate, input, client),
        FlowKind::Chat => run_json(&mut ChatFlow, input, client),
    }
}

fn run_json<F, C>(
    flow: &mut F,
    input: serde_json::Value,
    client: &C,
) -> Result<FlowRun<serde_json::Value>, FlowError>
where
    F: Flow,
    C: ModelClient + ?Sized,
{
    let input: F::Input = serde_json::from_value(input).map_err(|err| FlowError::Validation {
        flow: F::NAME,
        message: err.to_string(),
    })?;
    let run = run_flow(flow, client, &input)?;
    let output = serde_json::to_value(&run.output).map_err(|err| FlowError::Generation {
        flow: F::NAME,
        message: F::FAILURE_MESSAGE,
        detail: format!("serialize output: {err}"),
    })?;
    Ok(FlowRun {
        output,
        prompt: run.prompt,
        raw_response: run.raw_response,
        duration: run.duration,
    })
}

#[cfg(test)]
#[path = "flows_tests.rs"]
mod tests;
