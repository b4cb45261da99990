// Copyright 2026 The EasyTable Project
// SPDX-License-Identifier: Apache-2.0

// Model API client.
//
// Sends one streaming chat completion request per extraction to an
// OpenAI-compatible gateway and hands back the raw response body as a
// byte stream for the decoder.

use std::pin::Pin;

use async_trait::async_trait;
use base64::Engine as _;
use bytes::Bytes;
use futures_util::stream::Stream;
use futures_util::TryStreamExt;
use reqwest::header::CONTENT_TYPE;

use crate::config::LlmConfig;

/// Prompt sent alongside the image.
pub const INSTRUCTION: &str = "Please analyze these image and extract any tables as HTML tables. \
Handle line wraps in cells carefully, using '<br/>' when needed.\n\
the <table> tag should have the class 'easy-table', no other classes or attributes should be added to the table. \n";

/// Upstream response body, chunk by chunk.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, UpstreamError>> + Send>>;

/// Failures talking to the model API.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// Non-2xx answer. `body` is kept for diagnostics.
    #[error("upstream returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("upstream request failed: {0}")]
    Network(String),

    #[error("upstream request timed out: {0}")]
    Timeout(String),
}

impl From<reqwest::Error> for UpstreamError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            UpstreamError::Timeout(e.to_string())
        } else {
            UpstreamError::Network(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Image reference
// ---------------------------------------------------------------------------

/// URL of the image handed to the model: a `data:` URL or an http(s) link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef(String);

impl ImageRef {
    /// Interpret an inbound request body.
    ///
    /// Text bodies that already are a `data:` or http(s) URL pass through.
    /// Anything else is treated as raw image bytes and wrapped into a base64
    /// data URL using the request content type (`image/png` if absent or not
    /// an image type). Empty and whitespace-only bodies give `None`.
    pub fn from_body(body: &[u8], content_type: Option<&str>) -> Option<Self> {
        if let Ok(text) = std::str::from_utf8(body) {
            let text = text.trim();
            if text.is_empty() {
                return None;
            }
            if text.starts_with("data:") || text.starts_with("http://") || text.starts_with("https://") {
                return Some(ImageRef(text.to_string()));
            }
        }

        let mime = content_type
            .and_then(|ct| ct.split(';').next())
            .map(str::trim)
            .filter(|m| m.starts_with("image/"))
            .unwrap_or("image/png");
        let encoded = base64::engine::general_purpose::STANDARD.encode(body);
        Some(ImageRef(format!("data:{mime};base64,{encoded}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Request body
// ---------------------------------------------------------------------------

/// Build the streaming chat completion request for one image.
pub fn build_completion_request(image_url: &str, model: &str) -> serde_json::Value {
    serde_json::json!({
        "model": model,
        "messages": [
            {
                "role": "user",
                "content": [
                    { "type": "image_url", "image_url": { "url": image_url } },
                    { "type": "text", "text": INSTRUCTION },
                ],
            }
        ],
        "stream": true,
        "stream_options": { "include_usage": true },
    })
}

/// Copy of `value` with every `url` field replaced by `"omit"`, for logging.
pub fn redact_urls(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => serde_json::Value::Object(
            map.iter()
                .map(|(k, v)| {
                    let v = if k == "url" {
                        serde_json::Value::String("omit".into())
                    } else {
                        redact_urls(v)
                    };
                    (k.clone(), v)
                })
                .collect(),
        ),
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.iter().map(redact_urls).collect())
        }
        other => other.clone(),
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Starts a streaming extraction against the model API.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn stream_completion(&self, image: &ImageRef) -> Result<ByteStream, UpstreamError>;
}

/// Client for OpenAI-compatible `/chat/completions` endpoints.
pub struct OpenAiCompatClient {
    http: reqwest::Client,
    config: LlmConfig,
}

impl OpenAiCompatClient {
    pub fn new(http: reqwest::Client, config: LlmConfig) -> Self {
        Self { http, config }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }
}

#[async_trait]
impl CompletionClient for OpenAiCompatClient {
    async fn stream_completion(&self, image: &ImageRef) -> Result<ByteStream, UpstreamError> {
        let body = build_completion_request(image.as_str(), &self.config.model);
        let url = self.endpoint();

        tracing::info!(%url, request = %redact_urls(&body), "sending request to llm");

        let mut req = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .bearer_auth(&self.config.api_key)
            .json(&body);
        if !self.config.provider.is_empty() {
            req = req.header("x-portkey-provider", &self.config.provider);
        }

        let resp = req.send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), %body, "failed to send request to llm");
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(Box::pin(resp.bytes_stream().map_err(UpstreamError::from)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::extract_fragments;
    use futures_util::StreamExt;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(base_url: &str, provider: &str) -> LlmConfig {
        LlmConfig {
            base_url: base_url.to_string(),
            api_key: "sk-test".into(),
            provider: provider.into(),
            model: "gpt-4o".into(),
        }
    }

    fn image() -> ImageRef {
        ImageRef::from_body(b"data:image/png;base64,iVBORw0KGgo=", None).unwrap()
    }

    // -----------------------------------------------------------------------
    // Request body
    // -----------------------------------------------------------------------

    #[test]
    fn request_body_has_image_then_instruction() {
        let body = build_completion_request("data:image/png;base64,AAAA", "gpt-4o");
        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["stream"], true);
        assert_eq!(body["stream_options"]["include_usage"], true);

        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["role"], "user");

        let content = messages[0]["content"].as_array().unwrap();
        assert_eq!(content[0]["type"], "image_url");
        assert_eq!(content[0]["image_url"]["url"], "data:image/png;base64,AAAA");
        assert_eq!(content[1]["type"], "text");
        assert_eq!(content[1]["text"], INSTRUCTION);
    }

    #[test]
    fn instruction_asks_for_easy_table_class() {
        assert!(INSTRUCTION.contains("'easy-table'"));
        assert!(INSTRUCTION.contains("<br/>"));
    }

    #[test]
    fn redaction_hides_image_url_only() {
        let body = build_completion_request("data:image/png;base64,SECRET", "gpt-4o");
        let redacted = redact_urls(&body);
        let rendered = redacted.to_string();
        assert!(!rendered.contains("SECRET"));
        assert_eq!(redacted["messages"][0]["content"][0]["image_url"]["url"], "omit");
        assert_eq!(redacted["model"], "gpt-4o");
    }

    // -----------------------------------------------------------------------
    // ImageRef
    // -----------------------------------------------------------------------

    #[test]
    fn data_url_body_passes_through() {
        let img = ImageRef::from_body(b"  data:image/jpeg;base64,/9j/4AAQ\n", None).unwrap();
        assert_eq!(img.as_str(), "data:image/jpeg;base64,/9j/4AAQ");
    }

    #[test]
    fn https_url_body_passes_through() {
        let img = ImageRef::from_body(b"https://cdn.example/table.png", None).unwrap();
        assert_eq!(img.as_str(), "https://cdn.example/table.png");
    }

    #[test]
    fn raw_bytes_wrapped_with_content_type() {
        let png = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];
        let img = ImageRef::from_body(&png, Some("image/webp; q=1")).unwrap();
        assert_eq!(img.as_str(), "data:image/webp;base64,iVBORw0KGgo=");
    }

    #[test]
    fn raw_bytes_default_to_png() {
        let img = ImageRef::from_body(&[0xff, 0xd8], Some("application/octet-stream")).unwrap();
        assert_eq!(img.as_str(), "data:image/png;base64,/9g=");
    }

    #[test]
    fn empty_body_is_no_image() {
        assert_eq!(ImageRef::from_body(b"", None), None);
        assert_eq!(ImageRef::from_body(b"  \n", Some("image/png")), None);
    }

    // -----------------------------------------------------------------------
    // Client
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn streams_response_body_with_auth_headers() {
        let server = MockServer::start().await;
        let sse = "data: {\"choices\":[{\"delta\":{\"content\":\"<table>\"}}]}\n\n\
                   data: {\"choices\":[{\"delta\":{\"content\":\"</table>\"}}]}\n\n\
                   data: [DONE]\n\n";

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(header("x-portkey-provider", "openai"))
            .and(body_partial_json(json!({"model": "gpt-4o", "stream": true})))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(sse),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = OpenAiCompatClient::new(
            reqwest::Client::new(),
            config(&format!("{}/v1", server.uri()), "openai"),
        );
        let stream = client.stream_completion(&image()).await.unwrap();
        let fragments: Vec<String> = extract_fragments(stream)
            .map(|r| r.unwrap())
            .collect()
            .await;
        assert_eq!(fragments, vec!["<table>", "</table>"]);
    }

    #[tokio::test]
    async fn provider_header_omitted_when_unset() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string(""))
            .mount(&server)
            .await;

        let client = OpenAiCompatClient::new(reqwest::Client::new(), config(&server.uri(), ""));
        client.stream_completion(&image()).await.unwrap();

        let received = server.received_requests().await.unwrap();
        assert!(received[0].headers.get("x-portkey-provider").is_none());
    }

    #[tokio::test]
    async fn error_status_carries_upstream_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("{\"error\":\"bad key\"}"))
            .mount(&server)
            .await;

        let client = OpenAiCompatClient::new(reqwest::Client::new(), config(&server.uri(), "openai"));
        match client.stream_completion(&image()).await {
            Err(UpstreamError::Status { status, body }) => {
                assert_eq!(status, 401);
                assert_eq!(body, "{\"error\":\"bad key\"}");
            }
            Err(other) => panic!("expected Status, got {other:?}"),
            Ok(_) => panic!("expected error"),
        }
    }

    #[tokio::test]
    async fn unreachable_upstream_is_network_error() {
        let client = OpenAiCompatClient::new(
            reqwest::Client::new(),
            config("http://127.0.0.1:1", "openai"),
        );
        assert!(matches!(
            client.stream_completion(&image()).await,
            Err(UpstreamError::Network(_))
        ));
    }
}
