//! HTTP API for scriptcast.
//!
//! Runs on port 2004 by default. CORS-permissive so browser front-ends on
//! other origins can post scripts, decks and URLs directly.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::{Engine, engine::general_purpose};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

use scriptcast_core::script::segment;
use scriptcast_core::types::{CleaningPolicy, PipelineConfig, Segment, VoiceRegistry};

use crate::error::Error;
use crate::orchestrator::synthesize_with_deadline;
use crate::synth::{self, Synthesizer};
use crate::{slides, webpage};

/// Shared, immutable per-process state.
#[derive(Clone)]
pub struct AppState {
    registry: Arc<VoiceRegistry>,
    policy: CleaningPolicy,
    request_timeout: Duration,
    synthesizer: Arc<dyn Synthesizer>,
    client: reqwest::Client,
}

impl AppState {
    /// Build state with the provider named in `config`.
    pub fn new(config: PipelineConfig) -> Self {
        let client = reqwest::Client::new();
        let synthesizer = synth::build(config.provider, config.base_url.clone(), client.clone());
        Self::with_synthesizer(config, synthesizer, client)
    }

    /// Build state around an explicit synthesizer.
    pub fn with_synthesizer(
        config: PipelineConfig,
        synthesizer: Arc<dyn Synthesizer>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            registry: Arc::new(config.registry),
            policy: config.policy,
            request_timeout: config.request_timeout,
            synthesizer,
            client,
        }
    }
}

/// Build the axum router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/segment", post(segment_script))
        .route("/api/generate-audio", post(generate_audio))
        .route("/api/parse-ppt", post(parse_ppt))
        .route("/api/scrape-webpage", post(scrape_webpage))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ─── Error mapping ────────────────────────────────────────────────────────

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Error::MissingParameter(_) | Error::EmptyResult(_) | Error::InvalidBody(_) => {
                (StatusCode::BAD_REQUEST, json!({ "error": self.to_string() }))
            }
            Error::Provider { index, status, body } => (
                upstream_status(*status),
                json!({
                    "error": self.to_string(),
                    "details": {
                        "segmentIndex": index,
                        "upstreamStatus": status,
                        "body": body,
                    },
                }),
            ),
            Error::Upstream { status, body } => (
                upstream_status(*status),
                json!({ "error": body, "details": { "upstreamStatus": status } }),
            ),
            Error::DeadlineExceeded(_) => {
                (StatusCode::GATEWAY_TIMEOUT, json!({ "error": self.to_string() }))
            }
            _ => {
                error!("internal error: {self:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "internal error", "details": self.to_string() }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        warn!("rejected body: {rejection}");
        Error::InvalidBody(rejection.body_text())
    }
}

/// Mirror a failing upstream status; fall back to 502 when there is none.
fn upstream_status(status: Option<u16>) -> StatusCode {
    status
        .and_then(|s| StatusCode::from_u16(s).ok())
        .filter(|s| s.is_client_error() || s.is_server_error())
        .unwrap_or(StatusCode::BAD_GATEWAY)
}

// ─── Handlers ─────────────────────────────────────────────────────────────

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "ok": true }))
}

#[derive(serde::Deserialize)]
struct SegmentRequest {
    #[serde(default)]
    text: String,
}

#[derive(serde::Serialize)]
struct SegmentResponse {
    segments: Vec<Segment>,
}

async fn segment_script(
    State(state): State<AppState>,
    payload: Result<Json<SegmentRequest>, JsonRejection>,
) -> Result<Json<SegmentResponse>, Error> {
    let Json(req) = payload?;
    if req.text.trim().is_empty() {
        return Err(Error::MissingParameter("text"));
    }
    let segments = segment(&req.text, &state.registry, state.policy);
    Ok(Json(SegmentResponse { segments }))
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    #[serde(default)]
    api_key: String,
    #[serde(default)]
    eleven_labs_key: String,
    #[serde(default)]
    speechify_key: String,
    #[serde(default)]
    text: String,
}

impl GenerateRequest {
    /// First non-blank of `apiKey`, `elevenLabsKey`, `speechifyKey`.
    fn credential(&self) -> Option<&str> {
        [&self.api_key, &self.eleven_labs_key, &self.speechify_key]
            .into_iter()
            .map(|k| k.trim())
            .find(|k| !k.is_empty())
    }
}

#[derive(serde::Serialize)]
struct GenerateResponse {
    audio: String,
    segments: usize,
}

async fn generate_audio(
    State(state): State<AppState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<GenerateResponse>, Error> {
    let Json(req) = payload?;
    let credential = req.credential();
    info!(
        "generate-audio: key present={}, {} chars",
        credential.is_some(),
        req.text.len()
    );

    let Some(credential) = credential else {
        return Err(Error::MissingParameter("apiKey"));
    };
    if req.text.trim().is_empty() {
        return Err(Error::MissingParameter("text"));
    }

    let segments = segment(&req.text, &state.registry, state.policy);
    info!("parsed {} segments from script", segments.len());
    if segments.is_empty() {
        warn!("script has no speakable lines");
        return Err(Error::EmptyResult("No speakable text in script".into()));
    }

    let audio = synthesize_with_deadline(
        &segments,
        credential,
        state.synthesizer.as_ref(),
        state.request_timeout,
    )
    .await?;

    Ok(Json(GenerateResponse {
        audio: general_purpose::STANDARD.encode(&audio),
        segments: segments.len(),
    }))
}

#[derive(serde::Deserialize)]
struct ParsePptRequest {
    #[serde(default)]
    data: String,
    #[serde(default)]
    filename: Option<String>,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct ParsePptResponse {
    text: String,
    slide_count: usize,
}

async fn parse_ppt(
    payload: Result<Json<ParsePptRequest>, JsonRejection>,
) -> Result<Json<ParsePptResponse>, Error> {
    let Json(req) = payload?;
    info!("parse-ppt: {}", req.filename.as_deref().unwrap_or("<unnamed>"));
    // Unzipping is blocking work
    let extracted = tokio::task::spawn_blocking(move || slides::extract_text(&req.data))
        .await
        .map_err(|e| Error::Io(std::io::Error::other(e)))??;
    Ok(Json(ParsePptResponse {
        text: extracted.text,
        slide_count: extracted.slide_count,
    }))
}

#[derive(serde::Deserialize)]
struct ScrapeRequest {
    #[serde(default)]
    url: String,
}

#[derive(serde::Serialize)]
struct ScrapeResponse {
    content: String,
    url: String,
    length: usize,
}

async fn scrape_webpage(
    State(state): State<AppState>,
    payload: Result<Json<ScrapeRequest>, JsonRejection>,
) -> Result<Json<ScrapeResponse>, Error> {
    let Json(req) = payload?;
    let content = webpage::scrape(&state.client, &req.url).await?;
    Ok(Json(ScrapeResponse {
        length: content.chars().count(),
        content,
        url: req.url.trim().to_string(),
    }))
}
