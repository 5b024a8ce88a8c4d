//! Gemini text-to-speech implementation

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};

use super::provider::TextToSpeech;
use super::types::{AudioClip, Voice};
use crate::ai::gemini::{
    generate_content, GeminiConfig, GenerateContentRequest, GenerateContentResponse,
    GenerationConfig, PrebuiltVoiceConfig, SpeechConfig, VoiceConfig, WireContent, WirePart,
};
use crate::audio::{decode_base64_pcm16, sample_rate_from_mime, SampleRate};

pub const DEFAULT_VOICE: &str = "Zephyr";

/// Prebuilt voices and their style, as documented by the API.
const PREBUILT_VOICES: &[(&str, &str)] = &[
    ("Zephyr", "Bright"),
    ("Puck", "Upbeat"),
    ("Charon", "Informative"),
    ("Kore", "Firm"),
    ("Fenrir", "Excitable"),
    ("Leda", "Youthful"),
    ("Orus", "Firm"),
    ("Aoede", "Breezy"),
];

#[derive(Debug, Clone)]
pub struct GeminiTtsConfig {
    pub gemini: GeminiConfig,
    pub voice_name: String,
    /// Used when the reply's mime type does not state a rate.
    pub sample_rate: SampleRate,
}

impl GeminiTtsConfig {
    pub fn new(gemini: GeminiConfig) -> Self {
        Self {
            gemini,
            voice_name: DEFAULT_VOICE.to_string(),
            sample_rate: SampleRate::GEMINI_TTS,
        }
    }
}

pub struct GeminiTts {
    config: GeminiTtsConfig,
    client: Client,
}

impl GeminiTts {
    pub fn new(config: GeminiTtsConfig) -> Result<Self> {
        Ok(Self {
            client: config.gemini.http_client()?,
            config,
        })
    }

    fn synthesis_request(&self, text: &str, voice_name: &str) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![WireContent {
                role: None,
                parts: vec![WirePart {
                    text: Some(text.to_string()),
                    ..Default::default()
                }],
            }],
            generation_config: Some(GenerationConfig {
                response_modalities: Some(vec!["AUDIO".to_string()]),
                speech_config: Some(SpeechConfig {
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoiceConfig {
                            voice_name: voice_name.to_string(),
                        },
                    },
                }),
                ..Default::default()
            }),
            model: Some(self.config.gemini.tts_model.clone()),
        }
    }
}

/// Pulls the first inline audio payload out of a reply and decodes it.
pub(crate) fn clip_from_response(
    response: &GenerateContentResponse,
    fallback_rate: SampleRate,
) -> Result<AudioClip> {
    let audio = response
        .first_parts()?
        .iter()
        .find_map(|part| part.inline_data.as_ref())
        .context("TTS response contained no audio data")?;

    let samples = decode_base64_pcm16(&audio.data).context("Failed to decode TTS audio")?;
    let sample_rate = sample_rate_from_mime(&audio.mime_type).unwrap_or(fallback_rate);

    debug!(
        mime_type = %audio.mime_type,
        samples = samples.len(),
        %sample_rate,
        "Decoded TTS audio"
    );

    Ok(AudioClip::new(samples, sample_rate))
}

#[async_trait]
impl TextToSpeech for GeminiTts {
    fn default_voice(&self) -> Voice {
        Voice::named(&self.config.voice_name)
    }

    async fn synthesize(&self, text: &str, voice: Option<&Voice>) -> Result<AudioClip> {
        let voice_name = voice
            .map(|v| v.id.as_str())
            .unwrap_or(&self.config.voice_name);

        let request = self.synthesis_request(text, voice_name);
        let model = &self.config.gemini.tts_model;

        let response = generate_content(&self.client, &self.config.gemini, model, &request)
            .await
            .context("Gemini TTS request failed")?;

        let clip = clip_from_response(&response, self.config.sample_rate)?;
        info!(
            voice = voice_name,
            duration_ms = clip.duration().as_millis() as u64,
            "Synthesized speech"
        );
        Ok(clip)
    }

    async fn list_voices(&self) -> Result<Vec<Voice>> {
        Ok(PREBUILT_VOICES
            .iter()
            .map(|(id, style)| Voice {
                id: id.to_string(),
                name: format!("{id} ({style})"),
            })
            .collect())
    }
}
