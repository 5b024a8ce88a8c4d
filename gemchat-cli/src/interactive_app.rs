use anyhow::Result;
use gemchat_core::chat::actor::ChatActor;
use gemchat_core::chat::events::ChatEvent;
use gemchat_core::chat::ImageAttachment;
use gemchat_core::settings::manager::SettingsManager;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::info;

use crate::audio_sink::AudioSink;
use crate::commands::{parse_line, Command, HELP};
use crate::formatter::Formatter;

pub struct InteractiveApp {
    chat_actor: ChatActor,
    event_rx: mpsc::UnboundedReceiver<ChatEvent>,
    formatter: Formatter,
    audio_sink: AudioSink,
    image_pending: bool,
    settings_notice: Option<String>,
}

impl InteractiveApp {
    pub fn new(
        settings_path: Option<PathBuf>,
        voice: Option<String>,
        use_colors: bool,
    ) -> Result<Self> {
        let settings_manager = match settings_path {
            Some(path) => SettingsManager::from_path(path)?,
            None => SettingsManager::new()?,
        };

        // Session-only override; not written back to the settings file
        if let Some(voice) = voice {
            settings_manager.update_setting(|s| s.voice.voice_name = voice);
        }

        let settings_notice = settings_manager.restored_from_backup().map(|backup| {
            format!(
                "Settings file {} could not be loaded and was moved to {}; defaults are in use",
                settings_manager.path().display(),
                backup.display()
            )
        });

        let audio_sink = AudioSink::new(settings_manager.audio_dir()?);
        let (chat_actor, event_rx) = ChatActor::launch(settings_manager);

        Ok(Self {
            chat_actor,
            event_rx,
            formatter: Formatter::new(use_colors),
            audio_sink,
            image_pending: false,
            settings_notice,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut rl = DefaultEditor::new()?;

        self.formatter
            .print_system("Type /help for commands, /quit to exit");
        if let Some(notice) = self.settings_notice.take() {
            self.formatter.print_error(&notice);
        }

        // The greeting (and any startup errors) are already queued
        while let Ok(event) = self.event_rx.try_recv() {
            self.format_event(event).await;
        }

        loop {
            let line = match rl.readline(&self.formatter.prompt()) {
                Ok(line) => line,
                Err(ReadlineError::Interrupted) => continue,
                Err(_) => break,
            };

            let Some(parsed) = parse_line(&line, self.image_pending) else {
                continue;
            };
            if !line.trim().is_empty() {
                rl.add_history_entry(line.as_str())?;
            }

            let command = match parsed {
                Ok(command) => command,
                Err(usage) => {
                    self.formatter.print_error(&usage);
                    continue;
                }
            };

            if !self.dispatch(command).await? {
                break;
            }
        }

        println!("\nGoodbye!");
        Ok(())
    }

    /// Runs one command. Returns false when the user asked to leave.
    async fn dispatch(&mut self, command: Command) -> Result<bool> {
        match command {
            Command::Help => self.formatter.print_system(HELP),
            Command::Exit => return Ok(false),
            Command::Chat(text) => {
                self.chat_actor.send_message(text)?;
                self.wait_until(finishes_request).await;
            }
            Command::Image(path) => match ImageAttachment::from_path(&path) {
                Ok(image) => {
                    self.chat_actor.attach_image(image)?;
                    self.wait_until(|e| matches!(e, ChatEvent::ImageAttached { .. }))
                        .await;
                }
                Err(e) => self.formatter.print_error(&e.to_string()),
            },
            Command::ClearImage => {
                self.chat_actor.clear_image()?;
                self.wait_until(|e| matches!(e, ChatEvent::ImageCleared))
                    .await;
            }
            Command::Recipe => {
                self.chat_actor.request_recipe()?;
                self.wait_until(finishes_request).await;
            }
            Command::Listen(index) => {
                self.chat_actor.listen(index)?;
                self.wait_until(|e| {
                    matches!(
                        e,
                        ChatEvent::AudioReady { .. } | ChatEvent::AudioFailed { .. }
                    )
                })
                .await;
            }
            Command::History => {
                self.chat_actor.get_history()?;
                self.wait_until(|e| matches!(e, ChatEvent::History(_)))
                    .await;
            }
            Command::Voices => {
                self.chat_actor.list_voices()?;
                self.wait_until(|e| matches!(e, ChatEvent::VoicesList(_) | ChatEvent::Error(_)))
                    .await;
            }
        }
        Ok(true)
    }

    /// Renders events until one matching `done` has been rendered.
    async fn wait_until<F>(&mut self, done: F)
    where
        F: Fn(&ChatEvent) -> bool,
    {
        while let Some(event) = self.event_rx.recv().await {
            let finished = done(&event);
            self.format_event(event).await;
            if finished {
                return;
            }
        }
        info!("Event channel closed");
    }

    async fn format_event(&mut self, event: ChatEvent) {
        match event {
            // The prompt already shows what the user typed
            ChatEvent::MessageAdded(message)
                if message.sender == gemchat_core::chat::MessageSender::User =>
            {
                self.image_pending = false;
            }
            ChatEvent::MessageAdded(message) => self.formatter.print_message(&message),
            ChatEvent::TypingStatusChanged(true) => self.formatter.print_typing(),
            ChatEvent::TypingStatusChanged(false) => {}
            ChatEvent::ImageAttached { mime_type, bytes } => {
                self.image_pending = true;
                self.formatter.print_system(&format!(
                    "Image attached ({mime_type}, {bytes} bytes); press Enter or /send to send it alone"
                ));
            }
            ChatEvent::ImageCleared => {
                self.image_pending = false;
                self.formatter.print_system("Image cleared");
            }
            ChatEvent::AudioReady { message_index, wav } => {
                match self.audio_sink.save(&wav).await {
                    Ok(path) => self.formatter.print_system(&format!(
                        "Audio for message {message_index} saved to {}",
                        path.display()
                    )),
                    Err(e) => self.formatter.print_error(&format!("{e:#}")),
                }
                if let Err(e) = self.audio_sink.play(&wav).await {
                    self.formatter
                        .print_error(&format!("Playback failed: {e:#}"));
                }
            }
            ChatEvent::AudioFailed { error, .. } => self
                .formatter
                .print_error(&format!("Could not read the message aloud: {error}")),
            ChatEvent::RequestRejected { reason } => self.formatter.print_error(&reason),
            ChatEvent::History(messages) => self.formatter.print_history(&messages),
            ChatEvent::VoicesList(voices) => self.formatter.print_voices(&voices),
            ChatEvent::Error(e) => self.formatter.print_error(&e),
        }
    }
}

fn finishes_request(event: &ChatEvent) -> bool {
    matches!(
        event,
        ChatEvent::TypingStatusChanged(false) | ChatEvent::RequestRejected { .. }
    )
}
