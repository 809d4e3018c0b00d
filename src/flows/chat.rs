use super::{require_text, Flow, FlowKind, Validate};
use crate::prompt::render_template;
use serde::{Deserialize, Serialize};

const CHAT_TEMPLATE: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/prompts/chat.md"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

impl ChatRole {
    fn label(self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Model => "Assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
}

/// A feature the assistant may talk about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KnowledgeEntry {
    pub title: String,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ChatInput {
    pub message: String,
    #[serde(default)]
    pub history: Vec<ChatMessage>,
    pub knowledge_base: Vec<KnowledgeEntry>,
}

impl Validate for ChatInput {
    fn validate(&self) -> Result<(), String> {
        require_text("message", &self.message)?;
        if self.knowledge_base.is_empty() {
            return Err("knowledgeBase must contain at least one entry".to_string());
        }
        for (index, entry) in self.knowledge_base.iter().enumerate() {
            require_text(&format!("knowledgeBase[{index}].title"), &entry.title)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub ai_response: String,
}

/// Assistant restricted to the supplied knowledge base.
pub struct ChatFlow;

impl Flow for ChatFlow {
    type Input = ChatInput;
    type Response = ChatReply;
    type Output = ChatReply;

    const NAME: &'static str = FlowKind::Chat.name();
    const FAILURE_MESSAGE: &'static str = "AI failed to generate a response for the chatbot.";
    const OUTPUT_SCHEMA: &'static str = r#"{ "aiResponse": "string" }"#;

    fn prompt(input: &ChatInput) -> String {
        let knowledge_base = input
            .knowledge_base
            .iter()
            .map(|entry| format!("- **{}**: {}", entry.title.trim(), entry.summary.trim()))
            .collect::<Vec<_>>()
            .join("\n");
        let history_section = if input.history.is_empty() {
            String::new()
        } else {
            let lines = input
                .history
                .iter()
                .map(|message| format!("{}: {}", message.role.label(), message.text))
                .collect::<Vec<_>>()
                .join("\n");
            format!("## Conversation So Far\n{lines}\n\n")
        };
        render_template(
            CHAT_TEMPLATE,
            &[
                ("knowledge_base", knowledge_base.as_str()),
                ("history_section", history_section.as_str()),
                ("message", input.message.trim()),
            ],
        )
    }

    fn finish(&mut self, response: ChatReply) -> Result<ChatReply, String> {
        require_text("aiResponse", &response.ai_response)?;
        Ok(response)
    }
}
