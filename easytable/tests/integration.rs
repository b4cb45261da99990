// Integration tests
//
// End-to-end through the relay:
// request -> quota gate (encrypted) -> model API -> SSE decode -> response
//
// Uses wiremock for both the quota service and the model API,
// tower::ServiceExt::oneshot for in-process HTTP, and the real clients.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use easytable::auth::{derive_key, AesGcmCipher, EncryptedEnvelope, EnvelopeCipher};
use easytable::config::{self, StringSource};
use easytable::relay;
use serde_json::json;
use tower::ServiceExt;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SECRET: &str = "integration-secret";

const SSE_BODY: &str = concat!(
    "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n",
    "data: {\"choices\":[{\"delta\":{\"content\":\"<table class=\\\"easy-table\\\">\"}}]}\n\n",
    "data: {\"choices\":[{\"delta\":{\"content\":\"<tr><td>A</td></tr>\"}}]}\n\n",
    "data: {\"choices\":[{\"delta\":{\"content\":\"</table>\"}}]}\n\n",
    "data: {\"choices\":[],\"usage\":{\"prompt_tokens\":10,\"completion_tokens\":5}}\n\n",
    "data: [DONE]\n\n",
);

const EXPECTED_HTML: &str = "<table class=\"easy-table\"><tr><td>A</td></tr></table>";

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

fn yaml(llm: &MockServer, auth: Option<&MockServer>) -> String {
    let mut out = format!(
        r#"easytable: v1
llm:
  base_url: "{}/v1/"
  api_key: "sk-test"
  provider: "openai"
  model: "gpt-4o"
"#,
        llm.uri()
    );
    if let Some(auth) = auth {
        out.push_str(&format!(
            r#"auth:
  url: "{}/auth"
  token: "tok-int"
  encryption_key: "{SECRET}"
  max_quota: 10
  timeout_ms: 2000
"#,
            auth.uri()
        ));
    }
    out
}

fn app(yaml: String) -> axum::Router {
    let source = StringSource::new(yaml);
    let config = config::load_config(&source).unwrap();
    relay::build_router(relay::build_app_state(&config))
}

fn extract(body: &'static str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/extract")
        .body(Body::from(body))
        .unwrap()
}

async fn body_string(resp: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn mount_quota(server: &MockServer, remaining: i64) {
    Mock::given(method("POST"))
        .and(path("/auth"))
        .and(header("content-type", "application/octet-stream"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"quota": {"quota": remaining}})),
        )
        .mount(server)
        .await;
}

async fn mount_llm(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(header("x-portkey-provider", "openai"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(SSE_BODY),
        )
        .expect(expected_calls)
        .mount(server)
        .await;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn heartbeat() {
    let llm = MockServer::start().await;
    let resp = app(yaml(&llm, None))
        .oneshot(Request::builder().uri("/api/heartbeat").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn allowed_request_streams_html() {
    let llm = MockServer::start().await;
    let auth = MockServer::start().await;
    mount_llm(&llm, 1).await;
    mount_quota(&auth, 5).await;

    let resp = app(yaml(&llm, Some(&auth)))
        .oneshot(extract("data:image/png;base64,iVBORw0KGgo="))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["content-type"], "text/html");
    assert_eq!(body_string(resp).await, EXPECTED_HTML);

    // Model request carries the image and asks for a stream.
    let sent = &llm.received_requests().await.unwrap()[0];
    let body: serde_json::Value = serde_json::from_slice(&sent.body).unwrap();
    assert_eq!(body["model"], "gpt-4o");
    assert_eq!(body["stream"], true);
    assert_eq!(
        body["messages"][0]["content"][0]["image_url"]["url"],
        "data:image/png;base64,iVBORw0KGgo="
    );
}

#[tokio::test]
async fn quota_request_is_encrypted_consume() {
    let llm = MockServer::start().await;
    let auth = MockServer::start().await;
    mount_llm(&llm, 1).await;
    mount_quota(&auth, 5).await;

    let resp = app(yaml(&llm, Some(&auth)))
        .oneshot(extract("data:image/png;base64,iVBORw0KGgo="))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let sent = &auth.received_requests().await.unwrap()[0];
    assert!(!sent.body.starts_with(b"{"), "quota request must not be plaintext");

    let cipher = AesGcmCipher::new(&derive_key(SECRET));
    let plaintext = cipher
        .open(&EncryptedEnvelope::from_bytes(sent.body.clone()))
        .unwrap();
    assert_eq!(plaintext.len() % 16, 0);

    let parsed: serde_json::Value = serde_json::from_slice(&plaintext).unwrap();
    assert_eq!(parsed["quota"], json!({"token": "tok-int", "maxQuota": 10}));
    assert!(parsed["traceId"].as_str().is_some_and(|t| !t.is_empty()));
}

#[tokio::test]
async fn exhausted_quota_is_forbidden_without_model_call() {
    let llm = MockServer::start().await;
    let auth = MockServer::start().await;
    mount_llm(&llm, 0).await;
    mount_quota(&auth, 0).await;

    let resp = app(yaml(&llm, Some(&auth)))
        .oneshot(extract("data:image/png;base64,iVBORw0KGgo="))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn quota_service_failure_is_forbidden() {
    let llm = MockServer::start().await;
    let auth = MockServer::start().await;
    mount_llm(&llm, 0).await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&auth)
        .await;

    let resp = app(yaml(&llm, Some(&auth)))
        .oneshot(extract("data:image/png;base64,iVBORw0KGgo="))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn missing_image_is_bad_request() {
    let llm = MockServer::start().await;
    let auth = MockServer::start().await;
    mount_llm(&llm, 0).await;

    let resp = app(yaml(&llm, Some(&auth)))
        .oneshot(extract("   "))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(auth.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn model_error_is_500_with_body() {
    let llm = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&llm)
        .await;

    let resp = app(yaml(&llm, None))
        .oneshot(extract("data:image/png;base64,iVBORw0KGgo="))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_string(resp).await,
        "Failed to send request to LLM \ninvalid api key"
    );
}

#[tokio::test]
async fn malformed_stream_lines_are_skipped() {
    let llm = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string(concat!(
            "data: {\"choices\":[{\"delta\":{\"content\":\"<table>\"}}]}\n",
            "data: {not json\n",
            ": keep-alive\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"</table>\"}}]}\n",
        )))
        .mount(&llm)
        .await;

    let resp = app(yaml(&llm, None))
        .oneshot(extract("data:image/png;base64,iVBORw0KGgo="))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_string(resp).await, "<table></table>");
}
