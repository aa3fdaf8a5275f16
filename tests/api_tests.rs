use chat_relay::config::Config;
use chat_relay::message::{ChatResponse, ErrorBody, HealthResponse, StatusResponse};
use chat_relay::routes::{api_routes, cors_layer, create_router, with_middleware};
use chat_relay::services::completion::{
    CompletionClient, CompletionConfig, QUOTA_EXCEEDED_REPLY, SYSTEM_PROMPT,
};
use chat_relay::state::AppState;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode, header};
use axum::routing::get;
use mockito::{Matcher, Server, ServerGuard};
use secrecy::SecretString;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tower::util::ServiceExt;

fn app(completion: Option<CompletionClient>) -> Router {
    create_router("public").with_state(Arc::new(AppState::new(completion)))
}

fn client_for(server: &ServerGuard) -> CompletionClient {
    CompletionClient::new(CompletionConfig {
        api_key: SecretString::from("test-key".to_string()),
        base_url: server.url(),
        model: "test-model".to_string(),
    })
    .unwrap()
}

fn post_message(body: impl Into<String>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/message")
        .header("content-type", "application/json")
        .body(Body::from(body.into()))
        .unwrap()
}

async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_message_endpoint_relays_completion() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .match_header("authorization", "Bearer test-key")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"Paris."}}]}"#)
        .create_async()
        .await;

    let response = app(Some(client_for(&server)))
        .oneshot(post_message(r#"{"message": "Capital of France?"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let chat_resp: ChatResponse = serde_json::from_str(&body_string(response).await).unwrap();
    assert!(chat_resp.success);
    assert_eq!(chat_resp.response, "Paris.");
    assert!(chrono::DateTime::parse_from_rfc3339(&chat_resp.timestamp).is_ok());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_any_non_empty_message_is_forwarded_verbatim() {
    let long = "why is the sky blue? ".repeat(200);
    let inputs = ["  ", "\n", "héllo wörld, 你好 👋", "a", long.as_str()];

    for input in inputs {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_body(Matcher::PartialJson(json!({
                "messages": [
                    { "role": "system", "content": SYSTEM_PROMPT },
                    { "role": "user", "content": input }
                ]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"Noted."}}]}"#)
            .create_async()
            .await;

        let body = json!({ "message": input }).to_string();
        let response = app(Some(client_for(&server)))
            .oneshot(post_message(body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK, "input: {input:?}");
        let chat_resp: ChatResponse = serde_json::from_str(&body_string(response).await).unwrap();
        assert!(chat_resp.success);
        assert!(!chat_resp.response.is_empty());
        mock.assert_async().await;
    }
}

#[tokio::test]
async fn test_empty_message_is_rejected() {
    let response = app(None)
        .oneshot(post_message(r#"{"message": ""}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_string(response).await, r#"{"error":"Message is required"}"#);
}

#[tokio::test]
async fn test_missing_message_is_rejected() {
    for body in [r#"{}"#, r#"{"message": null}"#, r#"{"message": 42}"#, "not json"] {
        let response = app(None).oneshot(post_message(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body}");
        let error: ErrorBody = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(error.error, "Message is required");
    }
}

#[tokio::test]
async fn test_missing_api_key_is_a_server_error() {
    let response = app(None)
        .oneshot(post_message(r#"{"message": "hello"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_string(response).await,
        r#"{"error":"Server configuration error: API key not found"}"#
    );
}

#[tokio::test]
async fn test_quota_exhaustion_is_answered_as_success() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/chat/completions")
        .with_status(429)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"error":{"message":"You exceeded your current quota","type":"insufficient_quota","code":"insufficient_quota"}}"#,
        )
        .create_async()
        .await;

    let response = app(Some(client_for(&server)))
        .oneshot(post_message(r#"{"message": "hello"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let chat_resp: ChatResponse = serde_json::from_str(&body_string(response).await).unwrap();
    assert!(chat_resp.success);
    assert_eq!(chat_resp.response, QUOTA_EXCEEDED_REPLY);
}

#[tokio::test]
async fn test_root_reports_healthy() {
    let response = app(None)
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let status: StatusResponse = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(status.status, "healthy");
    assert!(!status.message.is_empty());
}

#[tokio::test]
async fn test_health_uptime_never_decreases() {
    let app = app(None);
    let health = |app: Router| async move {
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        serde_json::from_str::<HealthResponse>(&body_string(response).await).unwrap()
    };

    let first = health(app.clone()).await;
    tokio::time::sleep(Duration::from_millis(5)).await;
    let second = health(app).await;

    assert_eq!(first.status, "OK");
    assert!(first.uptime >= 0.0);
    assert!(second.uptime >= first.uptime);
}

async fn boom() -> &'static str {
    panic!("boom")
}

#[tokio::test]
async fn test_panic_becomes_internal_server_error() {
    // Same composition as `create_router`, with one extra route that panics.
    let app = with_middleware(api_routes("public").route("/boom", get(boom)))
        .with_state(Arc::new(AppState::new(None)));

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/boom").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_string(response).await, r#"{"error":"Internal server error"}"#);

    // The server keeps answering after a handler panicked.
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_browser_ui_is_served() {
    let response = app(None)
        .oneshot(Request::builder().uri("/ui/index.html").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("/api/message"));
}

#[tokio::test]
async fn test_production_cors_only_allows_configured_origins() {
    let config = Config::from_lookup(|key| match key {
        "APP_ENV" => Some("production".to_string()),
        "ALLOWED_ORIGINS" => Some("https://chat.example.com".to_string()),
        _ => None,
    })
    .unwrap();
    let app = app(None).layer(cors_layer(&config));

    let request = |origin: &str| {
        Request::builder()
            .uri("/health")
            .header(header::ORIGIN, origin)
            .body(Body::empty())
            .unwrap()
    };

    let allowed = app.clone().oneshot(request("https://chat.example.com")).await.unwrap();
    assert_eq!(
        allowed.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "https://chat.example.com"
    );

    let denied = app.oneshot(request("https://evil.example.com")).await.unwrap();
    assert!(denied.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}
