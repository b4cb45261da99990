// Copyright 2026 The EasyTable Project
// SPDX-License-Identifier: Apache-2.0

// HTTP relay.
//
// Responsibilities:
// - Accept an image as the raw request body
// - Gate the request on the quota service (fail closed)
// - Forward to the model API via the injected CompletionClient
// - Stream extracted HTML back as a chunked text/html body
// - Heartbeat endpoint

use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::extract::rejection::{BytesRejection, FailedToBufferBody};
use axum::extract::{DefaultBodyLimit, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use uuid::Uuid;

use crate::auth::{derive_key, AesGcmCipher, AuthClient, QuotaGate, RemoteQuotaGate};
use crate::config::Config;
use crate::llm::{CompletionClient, ImageRef, OpenAiCompatClient, UpstreamError};
use crate::stream::extract_fragments;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Request-level failures, mapped to HTTP statuses.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("No image found in request")]
    NoImage,

    #[error("failed to read request body: {0}")]
    BadBody(String),

    #[error("image exceeds the {limit} byte limit")]
    TooLarge { limit: usize },

    #[error("quota exhausted")]
    QuotaDenied,

    #[error("Failed to send request to LLM \n{}", upstream_detail(.0))]
    Upstream(#[from] UpstreamError),
}

fn upstream_detail(err: &UpstreamError) -> String {
    match err {
        UpstreamError::Status { body, .. } => body.clone(),
        other => other.to_string(),
    }
}

impl IntoResponse for ExtractError {
    fn into_response(self) -> Response {
        let status = match &self {
            ExtractError::NoImage | ExtractError::BadBody(_) => StatusCode::BAD_REQUEST,
            ExtractError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ExtractError::QuotaDenied => StatusCode::FORBIDDEN,
            ExtractError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}

// ---------------------------------------------------------------------------
// Shared application state
// ---------------------------------------------------------------------------

/// Shared state injected into axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub llm: Arc<dyn CompletionClient>,
    /// `None` skips the quota check.
    pub quota: Option<Arc<dyn QuotaGate>>,
    pub max_image_bytes: usize,
}

/// Wire the real model and quota clients from config.
///
/// The envelope key is derived here, once per process.
pub fn build_app_state(config: &Config) -> AppState {
    let http = reqwest::Client::new();

    let quota = config.auth.as_ref().map(|auth| {
        let cipher = Arc::new(AesGcmCipher::new(&derive_key(&auth.encryption_key)));
        let mut client = AuthClient::new(http.clone(), auth.url.clone(), cipher);
        if let Some(ms) = auth.timeout_ms {
            client = client.with_timeout(Duration::from_millis(ms));
        }
        Arc::new(RemoteQuotaGate::new(client, auth.token.clone(), auth.max_quota)) as Arc<dyn QuotaGate>
    });

    AppState {
        llm: Arc::new(OpenAiCompatClient::new(http, config.llm.clone())),
        quota,
        max_image_bytes: config.server.max_image_bytes,
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Heartbeat endpoint: GET /api/heartbeat -> 200 OK
pub async fn heartbeat() -> StatusCode {
    StatusCode::OK
}

/// Extraction endpoint: POST /api/extract
///
/// The response body is produced lazily from the upstream stream. If the
/// client goes away the body is dropped, which closes the upstream
/// connection.
pub async fn extract_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, ExtractError> {
    let trace_id = Uuid::new_v4().to_string();

    let body = body.map_err(|rejection| match rejection {
        BytesRejection::FailedToBufferBody(FailedToBufferBody::LengthLimitError(_)) => {
            tracing::warn!(%trace_id, limit = state.max_image_bytes, "image body exceeded limit");
            ExtractError::TooLarge {
                limit: state.max_image_bytes,
            }
        }
        other => ExtractError::BadBody(other.body_text()),
    })?;

    let content_type = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok());
    let image = ImageRef::from_body(&body, content_type).ok_or(ExtractError::NoImage)?;

    tracing::info!(%trace_id, image_bytes = body.len(), "extraction requested");

    if let Some(gate) = &state.quota {
        let decision = gate.check(&trace_id).await;
        if !decision.is_allowed() {
            tracing::info!(%trace_id, ?decision, "extraction denied");
            return Err(ExtractError::QuotaDenied);
        }
    }

    let upstream = state.llm.stream_completion(&image).await?;
    let fragments = extract_fragments(upstream);

    Ok(([(CONTENT_TYPE, "text/html")], Body::from_stream(fragments)).into_response())
}

// ---------------------------------------------------------------------------
// Router construction
// ---------------------------------------------------------------------------

/// Build the axum router. Clients are injected through `state`; the
/// inbound body is capped at `state.max_image_bytes`.
pub fn build_router(state: AppState) -> Router {
    let limit = state.max_image_bytes;
    Router::new()
        .route("/api/heartbeat", get(heartbeat))
        .route("/api/extract", post(extract_handler))
        .layer(DefaultBodyLimit::max(limit))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
