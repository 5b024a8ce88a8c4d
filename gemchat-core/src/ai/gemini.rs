//! Client for the Gemini `generateContent` REST endpoint.

use anyhow::{anyhow, Context};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

use crate::ai::{error::AiError, provider::AiProvider, types::*};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_CHAT_MODEL: &str = "gemini-2.5-flash-preview-05-20";
pub const DEFAULT_TTS_MODEL: &str = "gemini-2.5-flash-preview-tts";

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub base_url: String,
    pub chat_model: String,
    pub tts_model: String,
}

impl GeminiConfig {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            tts_model: DEFAULT_TTS_MODEL.to_string(),
        }
    }

    pub(crate) fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            model
        )
    }

    pub(crate) fn http_client(&self) -> anyhow::Result<Client> {
        Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .context("Failed to create HTTP client")
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentRequest {
    pub contents: Vec<WireContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<WirePart>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WirePart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
    /// Set on reasoning summaries, which are not part of the reply.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thought: Option<bool>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_modalities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speech_config: Option<SpeechConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SpeechConfig {
    pub voice_config: VoiceConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VoiceConfig {
    pub prebuilt_voice_config: PrebuiltVoiceConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PrebuiltVoiceConfig {
    pub voice_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Candidate {
    #[serde(default)]
    pub content: Option<WireContent>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: u32,
    #[serde(default)]
    pub candidates_token_count: u32,
}

impl GenerateContentResponse {
    /// Parts of the first candidate; the only candidate we ever request.
    pub(crate) fn first_parts(&self) -> Result<&[WirePart], AiError> {
        let candidate = self
            .candidates
            .first()
            .ok_or_else(|| AiError::MalformedResponse(anyhow!("response has no candidates")))?;

        match &candidate.content {
            Some(content) if !content.parts.is_empty() => Ok(&content.parts),
            _ => Err(AiError::MalformedResponse(anyhow!(
                "candidate has no content (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            ))),
        }
    }

    pub(crate) fn reply_text(&self) -> Result<String, AiError> {
        let texts: Vec<&str> = self
            .first_parts()?
            .iter()
            .filter(|part| part.thought != Some(true))
            .filter_map(|part| part.text.as_deref())
            .collect();

        if texts.is_empty() {
            return Err(AiError::MalformedResponse(anyhow!(
                "response has no text part"
            )));
        }
        Ok(texts.concat())
    }

    fn usage(&self) -> Option<TokenUsage> {
        self.usage_metadata
            .as_ref()
            .map(|usage| TokenUsage::new(usage.prompt_token_count, usage.candidates_token_count))
    }
}

pub(crate) fn to_wire_contents(turns: &[Turn]) -> Vec<WireContent> {
    turns
        .iter()
        .map(|turn| WireContent {
            role: Some(
                match turn.role {
                    Role::User => "user",
                    Role::Model => "model",
                }
                .to_string(),
            ),
            parts: turn
                .parts
                .iter()
                .map(|part| match part {
                    Part::Text(text) => WirePart {
                        text: Some(text.clone()),
                        ..Default::default()
                    },
                    Part::InlineData(data) => WirePart {
                        inline_data: Some(data.clone()),
                        ..Default::default()
                    },
                })
                .collect(),
        })
        .collect()
}

pub(crate) fn request_body(request: &ConversationRequest) -> GenerateContentRequest {
    let response_schema = match &request.response_format {
        ResponseFormat::Text => None,
        ResponseFormat::Json { schema } => Some(schema.clone()),
    };

    GenerateContentRequest {
        contents: to_wire_contents(&request.turns),
        generation_config: Some(GenerationConfig {
            response_mime_type: Some(request.response_format.mime_type().to_string()),
            response_schema,
            ..Default::default()
        }),
        model: None,
    }
}

/// POSTs a request body to `model`'s generateContent endpoint and parses
/// the reply. Non-2xx statuses become [`AiError::Api`].
pub(crate) async fn generate_content<B: Serialize + ?Sized>(
    client: &Client,
    config: &GeminiConfig,
    model: &str,
    body: &B,
) -> Result<GenerateContentResponse, AiError> {
    let response = client
        .post(config.endpoint(model))
        .query(&[("key", config.api_key.as_str())])
        .json(body)
        .send()
        .await
        .map_err(|e| {
            // The URL carries the API key.
            let e = e.without_url();
            debug!(?e, model, "Gemini API call failed");
            AiError::Network(anyhow!("{}", e))
        })?;

    let status = response.status();
    let response_text = response
        .text()
        .await
        .map_err(|e| AiError::Network(anyhow!("Failed to read response: {}", e.without_url())))?;

    if !status.is_success() {
        debug!(?status, body = %response_text, "Gemini API returned error");
        return Err(AiError::Api {
            status: status.as_u16(),
            body: response_text,
        });
    }

    serde_json::from_str(&response_text).map_err(|e| {
        AiError::MalformedResponse(anyhow!(
            "Failed to parse Gemini response: {} - Response: {}",
            e,
            response_text
        ))
    })
}

#[derive(Clone)]
pub struct GeminiProvider {
    client: Client,
    config: GeminiConfig,
}

impl GeminiProvider {
    pub fn new(config: GeminiConfig) -> anyhow::Result<Self> {
        Ok(Self {
            client: config.http_client()?,
            config,
        })
    }
}

#[async_trait::async_trait]
impl AiProvider for GeminiProvider {
    fn name(&self) -> &'static str {
        "Gemini"
    }

    async fn converse(
        &self,
        request: ConversationRequest,
    ) -> Result<ConversationResponse, AiError> {
        let body = request_body(&request);
        debug!(
            model = %self.config.chat_model,
            turns = request.turns.len(),
            response_mime_type = request.response_format.mime_type(),
            "Sending Gemini request"
        );

        let response =
            generate_content(&self.client, &self.config, &self.config.chat_model, &body).await?;
        let text = response.reply_text()?;
        let usage = response.usage();

        info!(
            model = %self.config.chat_model,
            reply_len = text.len(),
            input_tokens = usage.as_ref().map(|u| u.input_tokens),
            output_tokens = usage.as_ref().map(|u| u.output_tokens),
            "Gemini reply received"
        );

        Ok(ConversationResponse { text, usage })
    }
}
