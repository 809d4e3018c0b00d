//! Scripted model client for flow tests.
use super::{GenerateRequest, InlineMedia, ModelClient, TransportError};
use std::cell::RefCell;
use std::collections::VecDeque;

pub(crate) enum Reply {
    Text(String),
    Declined,
    CommandFailed(String),
}

/// What a flow sent to the model.
#[derive(Debug, Clone)]
pub(crate) struct RecordedCall {
    pub(crate) prompt: String,
    pub(crate) output_schema: String,
    pub(crate) media: Option<InlineMedia>,
}

#[derive(Default)]
pub(crate) struct ScriptedClient {
    replies: RefCell<VecDeque<Reply>>,
    calls: RefCell<Vec<RecordedCall>>,
}

impl ScriptedClient {
    pub(crate) fn replying(text: impl Into<String>) -> Self {
        let client = Self::default();
        client.push(Reply::Text(text.into()));
        client
    }

    pub(crate) fn replying_json(value: serde_json::Value) -> Self {
        Self::replying(value.to_string())
    }

    pub(crate) fn declining() -> Self {
        let client = Self::default();
        client.push(Reply::Declined);
        client
    }

    pub(crate) fn push(&self, reply: Reply) {
        self.replies.borrow_mut().push_back(reply);
    }

    pub(crate) fn calls(&self) -> Vec<RecordedCall> {
        self.calls.borrow().clone()
    }

    pub(crate) fn last_prompt(&self) -> String {
        self.calls
            .borrow()
            .last()
            .map(|call| call.prompt.clone())
            .unwrap_or_default()
    }
}

impl ModelClient for ScriptedClient {
    fn generate(&self, request: &GenerateRequest<'_>) -> Result<Option<String>, TransportError> {
        self.calls.borrow_mut().push(RecordedCall {
            prompt: request.prompt.to_string(),
            output_schema: request.output_schema.to_string(),
            media: request.media.cloned(),
        });
        match self.replies.borrow_mut().pop_front() {
            Some(Reply::Text(text)) => Ok(Some(text)),
            Some(Reply::Declined) | None => Ok(None),
            Some(Reply::CommandFailed(stderr)) => Err(TransportError::CommandFailed {
                status: "exit status: 1".to_string(),
                stderr,
            }),
        }
    }
}
