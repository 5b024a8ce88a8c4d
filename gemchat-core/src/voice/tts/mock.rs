use anyhow::{bail, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use super::provider::TextToSpeech;
use super::types::{AudioClip, Voice};
use crate::audio::{SampleBuffer, SampleRate};

/// Text-to-speech stand-in for tests: returns a fixed clip or fails.
#[derive(Clone)]
pub struct MockTts {
    clip: Option<AudioClip>,
    spoken: Arc<Mutex<Vec<(String, Voice)>>>,
}

impl MockTts {
    pub fn new(clip: AudioClip) -> Self {
        Self {
            clip: Some(clip),
            spoken: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A tenth of a second of silence at the Gemini TTS rate.
    pub fn silence() -> Self {
        Self::new(AudioClip::new(
            SampleBuffer::from_samples(vec![0; 1_600]),
            SampleRate::GEMINI_TTS,
        ))
    }

    pub fn failing() -> Self {
        Self {
            clip: None,
            spoken: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Texts synthesized so far, with the voice used for each.
    pub fn spoken(&self) -> Vec<(String, Voice)> {
        self.spoken.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextToSpeech for MockTts {
    fn default_voice(&self) -> Voice {
        Voice::named("mock")
    }

    async fn synthesize(&self, text: &str, voice: Option<&Voice>) -> Result<AudioClip> {
        let voice = voice.cloned().unwrap_or_else(|| self.default_voice());
        self.spoken.lock().unwrap().push((text.to_string(), voice));

        match &self.clip {
            Some(clip) => Ok(clip.clone()),
            None => bail!("Mock TTS failure"),
        }
    }

    async fn list_voices(&self) -> Result<Vec<Voice>> {
        Ok(vec![self.default_voice()])
    }
}
