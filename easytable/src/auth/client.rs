// Copyright 2026 The EasyTable Project
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;

use super::codec::{seal_request, EncryptedEnvelope, EnvelopeCipher};
use super::error::AuthError;
use super::request::AuthRequest;

/// Client for the quota service.
///
/// Requests go out encrypted; responses come back as plaintext JSON.
/// One attempt per call, no retries.
#[derive(Clone)]
pub struct AuthClient {
    http: reqwest::Client,
    url: String,
    cipher: Arc<dyn EnvelopeCipher>,
    timeout: Option<Duration>,
}

impl AuthClient {
    pub fn new(http: reqwest::Client, url: impl Into<String>, cipher: Arc<dyn EnvelopeCipher>) -> Self {
        Self {
            http,
            url: url.into(),
            cipher,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Seal `request` with the injected cipher and send it.
    pub async fn send(&self, request: &AuthRequest) -> Result<serde_json::Value, AuthError> {
        let envelope = seal_request(request, self.cipher.as_ref())?;
        tracing::debug!(
            url = %self.url,
            trace_id = request.trace_id.as_deref().unwrap_or(""),
            envelope_bytes = envelope.len(),
            "sending auth request"
        );
        self.send_auth_request(envelope).await
    }

    /// POST an already-sealed envelope and parse the JSON response.
    pub async fn send_auth_request(&self, envelope: EncryptedEnvelope) -> Result<serde_json::Value, AuthError> {
        let mut req = self
            .http
            .post(&self.url)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(envelope.into_bytes());

        if let Some(timeout) = self.timeout {
            req = req.timeout(timeout);
        }

        let resp = req.send().await.map_err(|e| AuthError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AuthError::Transport {
                status_code: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or("").to_string(),
            });
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;
        serde_json::from_slice(&body).map_err(|e| AuthError::InvalidResponse(e.to_string()))
    }
}
