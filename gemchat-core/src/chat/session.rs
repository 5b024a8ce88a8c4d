use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ai::types::{InlineData, Part, Role, Turn};
use crate::chat::recipe::Recipe;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Message is empty and no image is attached")]
    EmptyInput,

    #[error("Unsupported image type: {0:?}")]
    UnsupportedImage(PathBuf),

    #[error("Failed to read image {path:?}")]
    ImageRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageSender {
    User,
    Model,
}

impl MessageSender {
    fn role(self) -> Role {
        match self {
            MessageSender::User => Role::User,
            MessageSender::Model => Role::Model,
        }
    }
}

/// An image the user attached to a message, held as base64.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAttachment {
    pub mime_type: String,
    pub data: String,
    /// Where the image came from, for display
    pub source: Option<String>,
    /// Decoded size in bytes
    pub byte_len: usize,
}

impl ImageAttachment {
    pub fn from_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: STANDARD.encode(bytes),
            source: None,
            byte_len: bytes.len(),
        }
    }

    /// Reads an image from disk. The mime type comes from the extension; only
    /// formats the model accepts are allowed.
    pub fn from_path(path: &Path) -> Result<Self, SessionError> {
        let mime_type = image_mime_type(path)
            .ok_or_else(|| SessionError::UnsupportedImage(path.to_path_buf()))?;
        let bytes = std::fs::read(path).map_err(|source| SessionError::ImageRead {
            path: path.to_path_buf(),
            source,
        })?;

        let mut attachment = Self::from_bytes(mime_type, &bytes);
        attachment.source = Some(path.display().to_string());
        Ok(attachment)
    }

    fn inline_data(&self) -> InlineData {
        InlineData {
            mime_type: self.mime_type.clone(),
            data: self.data.clone(),
        }
    }
}

fn image_mime_type(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "heic" => "image/heic",
        "heif" => "image/heif",
        "gif" => "image/gif",
        _ => return None,
    };
    Some(mime)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "snake_case")]
pub enum MessageBody {
    Text(String),
    Image { text: String, image: ImageAttachment },
    Recipe(Recipe),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub timestamp: u64,
    pub sender: MessageSender,
    pub body: MessageBody,
}

impl ChatMessage {
    fn new(sender: MessageSender, body: MessageBody) -> Self {
        Self {
            timestamp: Utc::now().timestamp_millis() as u64,
            sender,
            body,
        }
    }

    /// The message's own text; recipe cards have none.
    pub fn text(&self) -> Option<&str> {
        match &self.body {
            MessageBody::Text(text) | MessageBody::Image { text, .. } => Some(text),
            MessageBody::Recipe(_) => None,
        }
    }

    fn chat_turn(&self) -> Turn {
        let parts = match &self.body {
            MessageBody::Text(text) => vec![Part::Text(text.clone())],
            MessageBody::Image { text, image } => {
                let mut parts = Vec::with_capacity(2);
                // The API rejects empty text parts
                if !text.is_empty() {
                    parts.push(Part::Text(text.clone()));
                }
                parts.push(Part::InlineData(image.inline_data()));
                parts
            }
            MessageBody::Recipe(recipe) => vec![Part::Text(recipe.to_json())],
        };
        Turn::new(self.sender.role(), parts)
    }
}

/// The conversation so far plus the image waiting to go out with the next
/// message. Messages are only ever appended.
#[derive(Debug, Clone)]
pub struct ChatSession {
    messages: Vec<ChatMessage>,
    pending_image: Option<ImageAttachment>,
}

impl ChatSession {
    pub fn new(greeting: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::new(
                MessageSender::Model,
                MessageBody::Text(greeting.into()),
            )],
            pending_image: None,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn pending_image(&self) -> Option<&ImageAttachment> {
        self.pending_image.as_ref()
    }

    /// Returns the image it replaced, if any.
    pub fn attach_image(&mut self, image: ImageAttachment) -> Option<ImageAttachment> {
        self.pending_image.replace(image)
    }

    pub fn clear_pending_image(&mut self) -> Option<ImageAttachment> {
        self.pending_image.take()
    }

    /// Appends what the user typed, taking the pending image with it.
    pub fn push_user_input(&mut self, text: &str) -> Result<&ChatMessage, SessionError> {
        if text.trim().is_empty() && self.pending_image.is_none() {
            return Err(SessionError::EmptyInput);
        }

        let body = match self.pending_image.take() {
            Some(image) => MessageBody::Image {
                text: text.to_string(),
                image,
            },
            None => MessageBody::Text(text.to_string()),
        };
        Ok(self.push(MessageSender::User, body))
    }

    pub fn push_user_text(&mut self, text: impl Into<String>) -> &ChatMessage {
        self.push(MessageSender::User, MessageBody::Text(text.into()))
    }

    pub fn push_model_text(&mut self, text: impl Into<String>) -> &ChatMessage {
        self.push(MessageSender::Model, MessageBody::Text(text.into()))
    }

    pub fn push_model_recipe(&mut self, recipe: Recipe) -> &ChatMessage {
        self.push(MessageSender::Model, MessageBody::Recipe(recipe))
    }

    fn push(&mut self, sender: MessageSender, body: MessageBody) -> &ChatMessage {
        self.messages.push(ChatMessage::new(sender, body));
        &self.messages[self.messages.len() - 1]
    }

    /// Full history for a chat request, images included.
    pub fn chat_turns(&self) -> Vec<Turn> {
        self.messages.iter().map(ChatMessage::chat_turn).collect()
    }

    /// Text-only history for a recipe request. Image data and recipe cards
    /// are left out.
    pub fn text_history(&self) -> Vec<Turn> {
        self.messages
            .iter()
            .filter_map(|message| {
                let text = message.text()?;
                if text.is_empty() {
                    return None;
                }
                Some(Turn::new(
                    message.sender.role(),
                    vec![Part::Text(text.to_string())],
                ))
            })
            .collect()
    }

    /// Text of the model message at `index`, if it is a text message.
    pub fn model_text(&self, index: usize) -> Option<&str> {
        let message = self.messages.get(index)?;
        match (&message.sender, &message.body) {
            (MessageSender::Model, MessageBody::Text(text)) => Some(text),
            _ => None,
        }
    }

    /// The latest model text message and its index.
    pub fn last_model_text(&self) -> Option<(usize, &str)> {
        (0..self.messages.len())
            .rev()
            .find_map(|index| self.model_text(index).map(|text| (index, text)))
    }
}
