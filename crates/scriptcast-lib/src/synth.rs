//! Speech-synthesis providers.
//!
//! The orchestrator only sees the [`Synthesizer`] trait. Two HTTP providers
//! are wired up:
//!
//! ```text
//! ElevenLabs: POST {base}/v1/text-to-speech/{voice}  xi-api-key  → audio/mpeg body
//! Speechify:  POST {base}/v1/audio/speech            Bearer      → {"audio_data": base64}
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose};
use tracing::debug;

use scriptcast_core::types::ProviderKind;

pub const ELEVENLABS_BASE_URL: &str = "https://api.elevenlabs.io";
pub const SPEECHIFY_BASE_URL: &str = "https://api.sws.speechify.com";

const ELEVENLABS_MODEL: &str = "eleven_turbo_v2_5";
const SPEECHIFY_MODEL: &str = "simba-english";

/// Why a provider call produced no audio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderFailure {
    /// Upstream HTTP status; `None` when no usable response arrived.
    pub status: Option<u16>,
    /// Raw upstream error body, or a description of what was missing.
    pub body: String,
}

impl ProviderFailure {
    pub fn new(status: Option<u16>, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    fn missing_audio(provider: &str) -> Self {
        Self::new(None, format!("No audio data received from {provider}"))
    }
}

/// Converts one `(voice, text)` pair into audio bytes.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    async fn synthesize(
        &self,
        voice_id: &str,
        text: &str,
        credential: &str,
    ) -> Result<Vec<u8>, ProviderFailure>;
}

/// Build the provider selected by configuration.
pub fn build(
    kind: ProviderKind,
    base_url: Option<String>,
    client: reqwest::Client,
) -> Arc<dyn Synthesizer> {
    match kind {
        ProviderKind::ElevenLabs => Arc::new(ElevenLabs::new(
            client,
            base_url.unwrap_or_else(|| ELEVENLABS_BASE_URL.to_string()),
        )),
        ProviderKind::Speechify => Arc::new(Speechify::new(
            client,
            base_url.unwrap_or_else(|| SPEECHIFY_BASE_URL.to_string()),
        )),
    }
}

// ─── ElevenLabs ───────────────────────────────────────────────────────────

pub struct ElevenLabs {
    client: reqwest::Client,
    base_url: String,
}

impl ElevenLabs {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Synthesizer for ElevenLabs {
    async fn synthesize(
        &self,
        voice_id: &str,
        text: &str,
        credential: &str,
    ) -> Result<Vec<u8>, ProviderFailure> {
        let url = format!("{}/v1/text-to-speech/{voice_id}", self.base_url);
        let body = serde_json::json!({
            "text": text,
            "model_id": ELEVENLABS_MODEL,
            "voice_settings": {
                "stability": 0.5,
                "similarity_boost": 0.8,
                "style": 0.0,
                "use_speaker_boost": true,
            },
        });

        debug!("elevenlabs: POST {} chars as {voice_id}", text.len());

        let resp = self
            .client
            .post(&url)
            .header("xi-api-key", credential)
            .header(reqwest::header::ACCEPT, "audio/mpeg")
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderFailure::new(None, format!("request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(ProviderFailure::new(Some(status.as_u16()), text));
        }

        let audio = resp
            .bytes()
            .await
            .map_err(|e| ProviderFailure::new(Some(status.as_u16()), format!("body read failed: {e}")))?;
        if audio.is_empty() {
            return Err(ProviderFailure::missing_audio("ElevenLabs"));
        }
        Ok(audio.to_vec())
    }
}

// ─── Speechify ────────────────────────────────────────────────────────────

pub struct Speechify {
    client: reqwest::Client,
    base_url: String,
}

impl Speechify {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[derive(serde::Deserialize)]
struct SpeechifyResponse {
    #[serde(default)]
    audio_data: Option<String>,
}

#[async_trait]
impl Synthesizer for Speechify {
    async fn synthesize(
        &self,
        voice_id: &str,
        text: &str,
        credential: &str,
    ) -> Result<Vec<u8>, ProviderFailure> {
        let url = format!("{}/v1/audio/speech", self.base_url);
        let body = serde_json::json!({
            "input": text,
            "voice_id": voice_id,
            "audio_format": "mp3",
            "model": SPEECHIFY_MODEL,
        });

        debug!("speechify: POST {} chars as {voice_id}", text.len());

        let resp = self
            .client
            .post(&url)
            .bearer_auth(credential)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderFailure::new(None, format!("request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(ProviderFailure::new(Some(status.as_u16()), text));
        }

        let raw = resp
            .text()
            .await
            .map_err(|e| ProviderFailure::new(Some(status.as_u16()), format!("body read failed: {e}")))?;
        decode_speechify(&raw)
    }
}

/// Pull the base64 `audio_data` field out of a Speechify response body.
fn decode_speechify(raw: &str) -> Result<Vec<u8>, ProviderFailure> {
    let parsed: SpeechifyResponse = serde_json::from_str(raw)
        .map_err(|e| ProviderFailure::new(None, format!("invalid Speechify response: {e}")))?;
    let encoded = parsed
        .audio_data
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ProviderFailure::missing_audio("Speechify"))?;
    general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|e| ProviderFailure::new(None, format!("invalid audio_data: {e}")))
}
