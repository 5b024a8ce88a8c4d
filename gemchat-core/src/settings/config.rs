use crate::ai::gemini::{DEFAULT_BASE_URL, DEFAULT_CHAT_MODEL, DEFAULT_TTS_MODEL};
use crate::ai::mock::MockBehavior;
use crate::audio::SampleRate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Environment variable consulted when the configured Gemini key is empty.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

pub const DEFAULT_GREETING: &str = "Hello! I'm an advanced chatbot powered by Gemini. You can chat, upload images, or generate creative content with me.";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ProviderConfig {
    #[serde(rename = "gemini")]
    Gemini {
        #[serde(default)]
        api_key: String,
        #[serde(default = "default_base_url")]
        base_url: String,
        #[serde(default = "default_chat_model")]
        chat_model: String,
        #[serde(default = "default_tts_model")]
        tts_model: String,
    },
    #[serde(rename = "mock")]
    Mock {
        #[serde(default)]
        behavior: MockBehavior,
    },
}

impl ProviderConfig {
    pub fn gemini(api_key: impl Into<String>) -> Self {
        ProviderConfig::Gemini {
            api_key: api_key.into(),
            base_url: default_base_url(),
            chat_model: default_chat_model(),
            tts_model: default_tts_model(),
        }
    }

    /// The configured Gemini key, or `GEMINI_API_KEY` when the setting is
    /// empty. `None` for non-Gemini providers or when neither is set.
    pub fn gemini_api_key(&self) -> Option<String> {
        match self {
            ProviderConfig::Gemini { api_key, .. } if !api_key.trim().is_empty() => {
                Some(api_key.trim().to_string())
            }
            ProviderConfig::Gemini { .. } => std::env::var(API_KEY_ENV)
                .ok()
                .filter(|key| !key.trim().is_empty()),
            ProviderConfig::Mock { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VoiceSettings {
    /// Prebuilt voice used for read-aloud
    #[serde(default = "default_voice_name")]
    pub voice_name: String,

    /// Rate assumed for TTS audio whose mime type does not state one
    #[serde(default)]
    pub sample_rate: SampleRate,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            voice_name: default_voice_name(),
            sample_rate: SampleRate::default(),
        }
    }
}

/// Core application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// The name of the currently active provider
    #[serde(default)]
    pub active_provider: Option<String>,

    /// Map of provider name to configuration
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    /// Text-to-speech configuration
    #[serde(default)]
    pub voice: VoiceSettings,

    /// First model message of every conversation
    #[serde(default = "default_greeting")]
    pub greeting: String,

    /// Where synthesized replies are written; defaults to ~/.gemchat/audio
    #[serde(default)]
    pub audio_dir: Option<PathBuf>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_chat_model() -> String {
    DEFAULT_CHAT_MODEL.to_string()
}

fn default_tts_model() -> String {
    DEFAULT_TTS_MODEL.to_string()
}

fn default_voice_name() -> String {
    crate::voice::tts::gemini::DEFAULT_VOICE.to_string()
}

fn default_greeting() -> String {
    DEFAULT_GREETING.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            active_provider: Some("gemini".to_string()),
            providers: HashMap::from([("gemini".to_string(), ProviderConfig::gemini(""))]),
            voice: VoiceSettings::default(),
            greeting: default_greeting(),
            audio_dir: None,
        }
    }
}

impl Settings {
    /// Get the active provider configuration
    pub fn active_provider(&self) -> Option<&ProviderConfig> {
        let provider = self.active_provider.as_ref()?;
        self.providers.get(provider)
    }

    /// Set the active provider (returns error if provider doesn't exist)
    pub fn set_active_provider(&mut self, name: &str) -> Result<(), String> {
        if self.providers.contains_key(name) {
            self.active_provider = Some(name.to_string());
            Ok(())
        } else {
            Err(format!("Provider '{name}' not found"))
        }
    }

    /// Add or update a provider configuration
    pub fn add_provider(&mut self, name: String, config: ProviderConfig) {
        self.providers.insert(name, config);
    }

    /// List all provider names
    pub fn list_providers(&self) -> Vec<String> {
        self.providers.keys().cloned().collect()
    }
}
