use crate::{
    ai::{
        mock::{MockBehavior, MockProvider},
        AiError, AiProvider, ConversationRequest, ConversationResponse, GeminiConfig,
        GeminiProvider,
    },
    chat::{
        events::{ChatEvent, EventSender},
        recipe::{Recipe, RECIPE_PROMPT},
        session::{ChatSession, ImageAttachment},
    },
    settings::{ProviderConfig, Settings, SettingsManager},
    voice::tts::{
        gemini::{GeminiTts, GeminiTtsConfig},
        MockTts, TextToSpeech,
    },
};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

pub const CHAT_FALLBACK: &str =
    "Sorry, I'm having trouble connecting right now. Please try again later.";
pub const RECIPE_FALLBACK: &str = "Sorry, I couldn't generate a recipe. Please try again.";

/// Defines the possible input messages to the `ChatActor`.
///
/// These messages derive serde so a front end in another process can drive
/// the actor with JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ChatActorMessage {
    /// Text typed by the user; sent along with the pending image, if any
    UserInput(String),

    /// Holds an image to go out with the next `UserInput`
    AttachImage(ImageAttachment),
    ClearImage,

    /// Asks for a structured recipe based on the text of the conversation
    RequestRecipe,

    /// Reads a model text message aloud. `None` picks the latest one.
    Listen {
        message_index: Option<usize>,
    },

    GetHistory,
    ListVoices,
}

/// The `ChatActor` owns the conversation.
///
/// Front ends do not contain any application logic; they take input from
/// the user, send it to the actor, and render events from the actor.
/// `ChatActorMessage`s go in through `tx` and `ChatEvent`s come back on the
/// receiver returned when the actor is launched.
pub struct ChatActor {
    pub tx: mpsc::UnboundedSender<ChatActorMessage>,
}

impl ChatActor {
    /// Launch the chat actor with providers created from settings. Must be
    /// called from within a tokio runtime.
    pub fn launch(settings: SettingsManager) -> (Self, mpsc::UnboundedReceiver<ChatEvent>) {
        let (event_sender, event_rx) = EventSender::new();
        let current = settings.settings();
        let provider = provider_or_fallback(&current, &event_sender);
        let tts = tts_or_fallback(&current, &event_sender);

        let actor = spawn_actor(current, provider, tts, event_sender);
        (actor, event_rx)
    }

    pub fn builder() -> ChatActorBuilder {
        ChatActorBuilder::default()
    }

    pub fn send_message(&self, message: String) -> Result<()> {
        self.tx.send(ChatActorMessage::UserInput(message))?;
        Ok(())
    }

    pub fn attach_image(&self, image: ImageAttachment) -> Result<()> {
        self.tx.send(ChatActorMessage::AttachImage(image))?;
        Ok(())
    }

    pub fn clear_image(&self) -> Result<()> {
        self.tx.send(ChatActorMessage::ClearImage)?;
        Ok(())
    }

    pub fn request_recipe(&self) -> Result<()> {
        self.tx.send(ChatActorMessage::RequestRecipe)?;
        Ok(())
    }

    pub fn listen(&self, message_index: Option<usize>) -> Result<()> {
        self.tx.send(ChatActorMessage::Listen { message_index })?;
        Ok(())
    }

    pub fn get_history(&self) -> Result<()> {
        self.tx.send(ChatActorMessage::GetHistory)?;
        Ok(())
    }

    pub fn list_voices(&self) -> Result<()> {
        self.tx.send(ChatActorMessage::ListVoices)?;
        Ok(())
    }
}

/// Builds a `ChatActor`, optionally with injected providers. Anything not
/// injected is created from settings.
#[derive(Default)]
pub struct ChatActorBuilder {
    settings_manager: Option<SettingsManager>,
    settings_path: Option<PathBuf>,
    provider: Option<Arc<dyn AiProvider>>,
    tts: Option<Arc<dyn TextToSpeech>>,
}

impl ChatActorBuilder {
    pub fn settings_manager(mut self, settings: SettingsManager) -> Self {
        self.settings_manager = Some(settings);
        self
    }

    pub fn settings_path(mut self, path: PathBuf) -> Self {
        self.settings_path = Some(path);
        self
    }

    pub fn provider(mut self, provider: Arc<dyn AiProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn tts(mut self, tts: Arc<dyn TextToSpeech>) -> Self {
        self.tts = Some(tts);
        self
    }

    pub fn build(self) -> Result<(ChatActor, mpsc::UnboundedReceiver<ChatEvent>)> {
        let settings_manager = match (self.settings_manager, self.settings_path) {
            (Some(manager), _) => manager,
            (None, Some(path)) => SettingsManager::from_path(path)?,
            (None, None) => SettingsManager::new()?,
        };
        let settings = settings_manager.settings();

        let (event_sender, event_rx) = EventSender::new();
        let provider = match self.provider {
            Some(provider) => provider,
            None => provider_or_fallback(&settings, &event_sender),
        };
        let tts = match self.tts {
            Some(tts) => tts,
            None => tts_or_fallback(&settings, &event_sender),
        };

        let actor = spawn_actor(settings, provider, tts, event_sender);
        Ok((actor, event_rx))
    }
}

fn spawn_actor(
    settings: Settings,
    provider: Arc<dyn AiProvider>,
    tts: Arc<dyn TextToSpeech>,
    event_sender: EventSender,
) -> ChatActor {
    let (tx, rx) = mpsc::unbounded_channel();
    let (completion_tx, completion_rx) = mpsc::unbounded_channel();

    let session = ChatSession::new(settings.greeting);
    for message in session.messages() {
        event_sender.add_message(message.clone());
    }

    let state = ActorState {
        event_sender,
        session,
        provider,
        tts,
        in_flight: None,
        completion_tx,
    };
    tokio::spawn(run_actor(state, rx, completion_rx));

    ChatActor { tx }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RequestKind {
    Chat,
    Recipe,
}

/// Reported by a request task when its HTTP call finishes.
struct Completion {
    kind: RequestKind,
    result: Result<ConversationResponse, AiError>,
}

struct ActorState {
    event_sender: EventSender,
    session: ChatSession,
    provider: Arc<dyn AiProvider>,
    tts: Arc<dyn TextToSpeech>,
    /// At most one chat or recipe request is outstanding
    in_flight: Option<RequestKind>,
    completion_tx: mpsc::UnboundedSender<Completion>,
}

async fn run_actor(
    mut state: ActorState,
    mut rx: mpsc::UnboundedReceiver<ChatActorMessage>,
    mut completion_rx: mpsc::UnboundedReceiver<Completion>,
) {
    info!(provider = state.provider.name(), "ChatActor started");

    loop {
        tokio::select! {
            message = rx.recv() => {
                let Some(message) = message else {
                    info!("Input channel closed, ChatActor stopping");
                    break;
                };
                handle_message(&mut state, message);
            }

            Some(completion) = completion_rx.recv() => {
                handle_completion(&mut state, completion);
            }
        }
    }
}

fn handle_message(state: &mut ActorState, message: ChatActorMessage) {
    match message {
        ChatActorMessage::UserInput(input) => handle_user_input(state, input),
        ChatActorMessage::AttachImage(image) => {
            debug!(mime_type = %image.mime_type, bytes = image.byte_len, "Image attached");
            state.event_sender.send(ChatEvent::ImageAttached {
                mime_type: image.mime_type.clone(),
                bytes: image.byte_len,
            });
            state.session.attach_image(image);
        }
        ChatActorMessage::ClearImage => {
            state.session.clear_pending_image();
            state.event_sender.send(ChatEvent::ImageCleared);
        }
        ChatActorMessage::RequestRecipe => handle_recipe_request(state),
        ChatActorMessage::Listen { message_index } => handle_listen(state, message_index),
        ChatActorMessage::GetHistory => {
            let history = state.session.messages().to_vec();
            state.event_sender.send(ChatEvent::History(history));
        }
        ChatActorMessage::ListVoices => {
            let tts = state.tts.clone();
            let event_sender = state.event_sender.clone();
            tokio::spawn(async move {
                match tts.list_voices().await {
                    Ok(voices) => event_sender.send(ChatEvent::VoicesList(voices)),
                    Err(e) => {
                        warn!(error = ?e, "Failed to list voices");
                        event_sender.error(format!("Failed to list voices: {e:#}"));
                    }
                }
            });
        }
    }
}

fn handle_user_input(state: &mut ActorState, input: String) {
    // Checked before the message is appended so a rejected send keeps its image
    if let Some(kind) = state.in_flight {
        debug!(?kind, "Rejecting message while a request is in flight");
        state
            .event_sender
            .reject("Please wait for the current response to finish");
        return;
    }

    match state.session.push_user_input(&input) {
        Ok(message) => state.event_sender.add_message(message.clone()),
        Err(e) => {
            state.event_sender.reject(e.to_string());
            return;
        }
    }

    let request = ConversationRequest::text(state.session.chat_turns());
    start_request(state, RequestKind::Chat, request);
}

fn handle_recipe_request(state: &mut ActorState) {
    if let Some(kind) = state.in_flight {
        debug!(?kind, "Rejecting recipe request while a request is in flight");
        state
            .event_sender
            .reject("Please wait for the current response to finish");
        return;
    }

    let message = state.session.push_user_text(RECIPE_PROMPT).clone();
    state.event_sender.add_message(message);

    let request =
        ConversationRequest::json(state.session.text_history(), Recipe::response_schema());
    start_request(state, RequestKind::Recipe, request);
}

fn start_request(state: &mut ActorState, kind: RequestKind, request: ConversationRequest) {
    state.in_flight = Some(kind);
    state.event_sender.set_typing(true);

    info!(?kind, turns = request.turns.len(), "Sending request");
    let provider = state.provider.clone();
    let completion_tx = state.completion_tx.clone();
    tokio::spawn(async move {
        let result = provider.converse(request).await;
        let _ = completion_tx.send(Completion { kind, result });
    });
}

fn handle_completion(state: &mut ActorState, completion: Completion) {
    state.in_flight = None;

    let message = match completion.kind {
        RequestKind::Chat => match completion.result {
            Ok(response) => {
                if let Some(usage) = &response.usage {
                    debug!(
                        input_tokens = usage.input_tokens,
                        output_tokens = usage.output_tokens,
                        "Chat reply received"
                    );
                }
                state.session.push_model_text(response.text)
            }
            Err(e) => {
                error!(error = ?e, "Chat request failed");
                state.session.push_model_text(CHAT_FALLBACK)
            }
        },
        RequestKind::Recipe => {
            let recipe = completion
                .result
                .map_err(anyhow::Error::from)
                .and_then(|response| Recipe::from_json(&response.text));
            match recipe {
                Ok(recipe) => {
                    info!(recipe = %recipe.recipe_name, "Recipe received");
                    state.session.push_model_recipe(recipe)
                }
                Err(e) => {
                    error!(error = ?e, "Recipe request failed");
                    state.session.push_model_text(RECIPE_FALLBACK)
                }
            }
        }
    }
    .clone();

    state.event_sender.add_message(message);
    state.event_sender.set_typing(false);
}

fn handle_listen(state: &mut ActorState, message_index: Option<usize>) {
    let target = match message_index {
        Some(index) => state
            .session
            .model_text(index)
            .map(|text| (index, text.to_string())),
        None => state
            .session
            .last_model_text()
            .map(|(index, text)| (index, text.to_string())),
    };

    let Some((index, text)) = target else {
        state.event_sender.send(ChatEvent::AudioFailed {
            message_index,
            error: "No model text message to read aloud".to_string(),
        });
        return;
    };

    let tts = state.tts.clone();
    let event_sender = state.event_sender.clone();
    tokio::spawn(async move {
        match tts.synthesize(&text, None).await {
            Ok(clip) => {
                let wav = clip.to_wav();
                debug!(message_index = index, bytes = wav.byte_len(), "Speech encoded");
                event_sender.send(ChatEvent::AudioReady {
                    message_index: index,
                    wav,
                });
            }
            Err(e) => {
                warn!(message_index = index, error = ?e, "Speech synthesis failed");
                event_sender.send(ChatEvent::AudioFailed {
                    message_index: Some(index),
                    error: format!("{e:#}"),
                });
            }
        }
    });
}

fn provider_or_fallback(settings: &Settings, event_sender: &EventSender) -> Arc<dyn AiProvider> {
    match create_provider(settings) {
        Ok(provider) => provider,
        Err(e) => {
            error!(error = ?e, "Failed to initialize provider");
            event_sender.error(format!("Failed to initialize provider: {e:#}"));
            Arc::new(MockProvider::new(MockBehavior::AlwaysError))
        }
    }
}

fn tts_or_fallback(settings: &Settings, event_sender: &EventSender) -> Arc<dyn TextToSpeech> {
    match create_tts(settings) {
        Ok(tts) => tts,
        Err(e) => {
            error!(error = ?e, "Failed to initialize text-to-speech");
            event_sender.error(format!("Failed to initialize text-to-speech: {e:#}"));
            Arc::new(MockTts::failing())
        }
    }
}

fn gemini_config(settings: &Settings) -> Result<GeminiConfig> {
    let Some(config) = settings.active_provider() else {
        bail!("No active provider configured in settings")
    };

    match config {
        ProviderConfig::Gemini {
            base_url,
            chat_model,
            tts_model,
            ..
        } => {
            let api_key = config.gemini_api_key().context(
                "No Gemini API key: set api_key in settings or the GEMINI_API_KEY environment variable",
            )?;
            Ok(GeminiConfig {
                api_key,
                base_url: base_url.clone(),
                chat_model: chat_model.clone(),
                tts_model: tts_model.clone(),
            })
        }
        ProviderConfig::Mock { .. } => bail!("Active provider is not Gemini"),
    }
}

/// Creates the chat provider for the active provider in settings.
pub fn create_provider(settings: &Settings) -> Result<Arc<dyn AiProvider>> {
    match settings.active_provider() {
        Some(ProviderConfig::Mock { behavior }) => {
            Ok(Arc::new(MockProvider::new(behavior.clone())))
        }
        _ => Ok(Arc::new(GeminiProvider::new(gemini_config(settings)?)?)),
    }
}

/// Creates the text-to-speech backend matching the active provider.
pub fn create_tts(settings: &Settings) -> Result<Arc<dyn TextToSpeech>> {
    match settings.active_provider() {
        Some(ProviderConfig::Mock { .. }) => Ok(Arc::new(MockTts::silence())),
        _ => {
            let mut config = GeminiTtsConfig::new(gemini_config(settings)?);
            config.voice_name = settings.voice.voice_name.clone();
            config.sample_rate = settings.voice.sample_rate;
            Ok(Arc::new(GeminiTts::new(config)?))
        }
    }
}
