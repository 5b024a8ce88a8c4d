use crate::audio::WavContainer;
use crate::chat::session::ChatMessage;
use crate::voice::tts::Voice;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// `ChatEvent` are the messages sent from the actor - the output of the actor.
///
/// The actor is built with 2 channels - an input and output channel. Requests
/// are sent to the actor through the input channel and may generate one or
/// more `ChatEvent`s on the output channel. Front ends (the CLI, tests)
/// render these events; they hold no conversation state of their own.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data")]
pub enum ChatEvent {
    MessageAdded(ChatMessage),
    /// True while a chat or recipe request is outstanding
    TypingStatusChanged(bool),
    ImageAttached {
        mime_type: String,
        bytes: usize,
    },
    ImageCleared,
    /// Synthesized speech for the model message at `message_index`
    AudioReady {
        message_index: usize,
        wav: WavContainer,
    },
    AudioFailed {
        message_index: Option<usize>,
        error: String,
    },
    /// A request arrived while another was in flight, or had nothing to send
    RequestRejected {
        reason: String,
    },
    History(Vec<ChatMessage>),
    VoicesList(Vec<Voice>),
    Error(String),
}

/// A small wrapper over the `event_tx` for convienance.
#[derive(Clone)]
pub struct EventSender {
    event_tx: mpsc::UnboundedSender<ChatEvent>,
}

impl EventSender {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ChatEvent>) {
        let (event_tx, rx) = mpsc::unbounded_channel();
        (Self { event_tx }, rx)
    }

    pub fn add_message(&self, message: ChatMessage) {
        self.send(ChatEvent::MessageAdded(message));
    }

    pub fn set_typing(&self, typing: bool) {
        self.send(ChatEvent::TypingStatusChanged(typing));
    }

    pub fn reject(&self, reason: impl Into<String>) {
        self.send(ChatEvent::RequestRejected {
            reason: reason.into(),
        });
    }

    pub fn error(&self, message: impl Into<String>) {
        self.send(ChatEvent::Error(message.into()));
    }

    /// Sends an event; a dropped receiver is not an error for the actor.
    pub fn send(&self, event: ChatEvent) {
        let _ = self.event_tx.send(event);
    }
}
