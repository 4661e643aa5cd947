use axum::{
    extract::Query,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use secrecy::Secret;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use webs_core::{
    config::{AuthScheme, ProviderDefinition, RequestShape},
    traits::ChatBackend,
    types::Turn,
    Error,
};
use webs_model_gateway::{FallbackChain, HttpProvider};

const KEY: &str = "test-key";

// =============================================================================
// Local backend
// =============================================================================

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {}", KEY))
        .unwrap_or(false)
}

async fn openai_ok(headers: HeaderMap, Json(body): Json<Value>) -> impl IntoResponse {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": {"message": "bad key"}})));
    }
    let messages = body["messages"].as_array().cloned().unwrap_or_default();
    let last = messages
        .last()
        .and_then(|m| m["content"].as_str())
        .unwrap_or("")
        .to_string();
    (
        StatusCode::OK,
        Json(json!({
            "choices": [{"message": {"role": "assistant",
                "content": format!(" {} saw {} turns: {} ", body["model"].as_str().unwrap_or(""), messages.len(), last)}}]
        })),
    )
}

async fn openai_error() -> impl IntoResponse {
    (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded")
}

async fn openai_empty() -> impl IntoResponse {
    Json(json!({"choices": []}))
}

async fn slow() -> impl IntoResponse {
    tokio::time::sleep(Duration::from_secs(2)).await;
    Json(json!({"choices": [{"message": {"content": "too late"}}]}))
}

async fn gemini(
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    if query.get("key").map(String::as_str) != Some(KEY) {
        return (StatusCode::FORBIDDEN, Json(json!({"error": "missing key"})));
    }
    let roles: Vec<String> = body["contents"]
        .as_array()
        .unwrap_or(&Vec::new())
        .iter()
        .filter_map(|c| c["role"].as_str().map(str::to_string))
        .collect();
    (
        StatusCode::OK,
        Json(json!({
            "candidates": [{"content": {"parts": [{"text": roles.join(",")}]}}]
        })),
    )
}

async fn models(headers: HeaderMap) -> impl IntoResponse {
    if authorized(&headers) {
        (StatusCode::OK, Json(json!({"data": [{"id": "m"}]})))
    } else {
        (StatusCode::UNAUTHORIZED, Json(json!({"error": "bad key"})))
    }
}

async fn spawn_backend() -> String {
    let app = Router::new()
        .route("/openai/ok", post(openai_ok))
        .route("/openai/error", post(openai_error))
        .route("/openai/empty", post(openai_empty))
        .route("/slow", post(slow))
        .route("/gemini/:model/generate", post(gemini))
        .route("/models", get(models));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn definition(name: &str, endpoint: String) -> ProviderDefinition {
    ProviderDefinition {
        name: name.into(),
        endpoint,
        model: "test-model".into(),
        api_key: Some(Secret::new(KEY.into())),
        timeout_ms: 1_000,
        ..ProviderDefinition::default()
    }
}

fn provider(def: &ProviderDefinition) -> HttpProvider {
    HttpProvider::new(def, Secret::new(KEY.into()), reqwest::Client::new())
}

fn conversation() -> Vec<Turn> {
    vec![
        Turn::user("hello"),
        Turn::assistant("hi"),
        Turn::user("what's up?"),
    ]
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn test_openai_shape_round_trip() {
    let base = spawn_backend().await;
    let p = provider(&definition("openai", format!("{}/openai/ok", base)));

    let reply = p.chat(&conversation()).await.unwrap();
    assert_eq!(reply, "test-model saw 3 turns: what's up?");
}

#[tokio::test]
async fn test_wrong_key_is_backend_error_with_status() {
    let base = spawn_backend().await;
    let def = definition("openai", format!("{}/openai/ok", base));
    let p = HttpProvider::new(&def, Secret::new("wrong".into()), reqwest::Client::new());

    let err = p.chat(&conversation()).await.unwrap_err();
    assert!(matches!(err, Error::Backend { status: Some(401), .. }));
}

#[tokio::test]
async fn test_server_error_is_backend_error() {
    let base = spawn_backend().await;
    let p = provider(&definition("openai", format!("{}/openai/error", base)));

    match p.chat(&conversation()).await {
        Err(Error::Backend { provider, status, cause }) => {
            assert_eq!(provider, "openai");
            assert_eq!(status, Some(500));
            assert!(cause.contains("upstream exploded"));
        }
        other => panic!("expected backend error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_reply_field_is_backend_error() {
    let base = spawn_backend().await;
    let p = provider(&definition("openai", format!("{}/openai/empty", base)));

    let err = p.chat(&conversation()).await.unwrap_err();
    assert!(matches!(err, Error::Backend { status: Some(200), .. }));
}

#[tokio::test]
async fn test_timeout_is_backend_error() {
    let base = spawn_backend().await;
    let mut def = definition("slow", format!("{}/slow", base));
    def.timeout_ms = 100;
    let p = provider(&def);

    match p.chat(&conversation()).await {
        Err(Error::Backend { status: None, cause, .. }) => assert!(cause.contains("timed out")),
        other => panic!("expected timeout, got {:?}", other),
    }
}

#[tokio::test]
async fn test_connection_refused_is_backend_error() {
    // Nothing listens on the discard port.
    let p = provider(&definition("down", "http://127.0.0.1:9/v1/chat".into()));
    let err = p.chat(&conversation()).await.unwrap_err();
    assert!(matches!(err, Error::Backend { status: None, .. }));
}

#[tokio::test]
async fn test_transport_error_does_not_expose_query_key() {
    let def = ProviderDefinition {
        shape: RequestShape::GeminiGenerate,
        auth: AuthScheme::Query { param: "key".into() },
        models_url: Some("http://127.0.0.1:9/models".into()),
        ..definition(
            "gemini",
            "http://127.0.0.1:9/v1beta/models/{model}:generateContent".into(),
        )
    };
    let p = HttpProvider::new(&def, Secret::new("SUPER-SECRET-KEY".into()), reqwest::Client::new());

    let err = p.chat(&conversation()).await.unwrap_err();
    assert!(matches!(err, Error::Backend { status: None, .. }));
    assert!(!err.to_string().contains("SUPER-SECRET-KEY"), "{}", err);

    let err = p.health_check().await.unwrap_err();
    assert!(!err.to_string().contains("SUPER-SECRET-KEY"), "{}", err);
}

#[tokio::test]
async fn test_gemini_shape_with_query_key() {
    let base = spawn_backend().await;
    let def = ProviderDefinition {
        shape: RequestShape::GeminiGenerate,
        auth: AuthScheme::Query { param: "key".into() },
        ..definition("gemini", format!("{}/gemini/{{model}}/generate", base))
    };
    let p = provider(&def);

    let reply = p.chat(&conversation()).await.unwrap();
    assert_eq!(reply, "user,model,user");
}

#[tokio::test]
async fn test_health_check() {
    let base = spawn_backend().await;

    let mut def = definition("openai", format!("{}/openai/ok", base));
    def.models_url = Some(format!("{}/models", base));
    assert!(provider(&def).health_check().await.is_ok());

    let bad = HttpProvider::new(&def, Secret::new("wrong".into()), reqwest::Client::new());
    assert!(bad.health_check().await.is_err());

    def.models_url = None;
    assert!(provider(&def).health_check().await.is_ok());
}

#[tokio::test]
async fn test_chain_over_http_falls_back() {
    let base = spawn_backend().await;
    let chain = FallbackChain::new(vec![
        Arc::new(provider(&definition("broken", format!("{}/openai/error", base)))) as Arc<dyn ChatBackend>,
        Arc::new(provider(&definition("empty", format!("{}/openai/empty", base)))),
        Arc::new(provider(&definition("working", format!("{}/openai/ok", base)))),
    ]);

    let reply = chain.reply(&[Turn::user("ping")]).await.unwrap();
    assert_eq!(reply.provider, "working");
    assert_eq!(reply.content, "test-model saw 1 turns: ping");
}
