use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// Base64 payload with its mime type, as sent inline with a prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    Text(String),
    InlineData(InlineData),
}

/// One message of the conversation history as the model sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Turn {
    pub fn new(role: Role, parts: Vec<Part>) -> Self {
        Self { role, parts }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, vec![Part::Text(text.into())])
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self::new(Role::Model, vec![Part::Text(text.into())])
    }

    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| match part {
                Part::Text(text) => Some(text.as_str()),
                Part::InlineData(_) => None,
            })
            .collect()
    }

    pub fn inline_data(&self) -> Vec<&InlineData> {
        self.parts
            .iter()
            .filter_map(|part| match part {
                Part::InlineData(data) => Some(data),
                Part::Text(_) => None,
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum ResponseFormat {
    #[default]
    Text,
    /// Constrains the reply to JSON matching `schema`.
    Json { schema: Value },
}

impl ResponseFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            ResponseFormat::Text => "text/plain",
            ResponseFormat::Json { .. } => "application/json",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConversationRequest {
    pub turns: Vec<Turn>,
    pub response_format: ResponseFormat,
}

impl ConversationRequest {
    pub fn text(turns: Vec<Turn>) -> Self {
        Self {
            turns,
            response_format: ResponseFormat::Text,
        }
    }

    pub fn json(turns: Vec<Turn>, schema: Value) -> Self {
        Self {
            turns,
            response_format: ResponseFormat::Json { schema },
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConversationResponse {
    pub text: String,
    pub usage: Option<TokenUsage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub total_tokens: u32,
}

impl TokenUsage {
    pub fn new(input_tokens: u32, output_tokens: u32) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens: input_tokens + output_tokens,
        }
    }
}
