use anyhow::Result;
use async_trait::async_trait;

use super::types::{AudioClip, Voice};

/// Trait for text-to-speech providers
#[async_trait]
pub trait TextToSpeech: Send + Sync {
    /// Get the default voice for this provider
    fn default_voice(&self) -> Voice;

    /// Synthesize text into a mono PCM clip
    async fn synthesize(&self, text: &str, voice: Option<&Voice>) -> Result<AudioClip>;

    /// List available voices
    async fn list_voices(&self) -> Result<Vec<Voice>>;
}
