//! End-to-end: gateway router -> orchestrator -> HTTP providers -> local upstream.

use axum::{
    body::Body,
    http::{HeaderMap, Request, StatusCode},
    routing::post,
    Json, Router,
};
use secrecy::Secret;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

use webs_core::config::{AppConfig, ProviderDefinition};
use webs_gateway::{ChatOrchestrator, GatewayConfig, GatewayServer};
use webs_model_gateway::FallbackChain;

#[derive(Clone, Default)]
struct Upstream {
    calls: Arc<AtomicUsize>,
}

async fn spawn_upstream(upstream: Upstream) -> String {
    let counter = upstream.calls.clone();
    let app = Router::new()
        .route(
            "/down",
            post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "overloaded") }),
        )
        .route(
            "/up",
            post(move |headers: HeaderMap, Json(body): Json<Value>| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    let authorized = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        == Some("Bearer secret");
                    if !authorized {
                        return (StatusCode::UNAUTHORIZED, Json(json!({})));
                    }
                    let turns = body["messages"].as_array().map(Vec::len).unwrap_or(0);
                    (
                        StatusCode::OK,
                        Json(json!({
                            "choices": [{"message": {"content": format!("answer after {} turns", turns)}}]
                        })),
                    )
                }
            }),
        );

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
        model: "m".into(),
        api_key: Some(Secret::new("secret".into())),
        timeout_ms: 2_000,
        ..ProviderDefinition::default()
    }
}

async fn gateway(base: &str, order: &[&str]) -> Router {
    let definitions = vec![
        definition("down", format!("{}/down", base)),
        definition("up", format!("{}/up", base)),
        ProviderDefinition {
            enabled: false,
            ..definition("disabled", format!("{}/up", base))
        },
        ProviderDefinition {
            api_key: None,
            api_key_env: Some("WEBS_TEST_KEY_THAT_IS_NEVER_SET".into()),
            ..definition("keyless", format!("{}/up", base))
        },
    ];
    let order: Vec<String> = order.iter().map(|s| s.to_string()).collect();
    let providers = FallbackChain::from_definitions(&definitions, &order).unwrap();

    let mut config = AppConfig::default();
    config.session.max_replies = 3;

    let orchestrator = ChatOrchestrator::builder()
        .with_config(&config)
        .with_providers(providers)
        .build();
    GatewayServer::new(GatewayConfig::from(&config.server), orchestrator).build_router()
}

async fn post_chat(app: &Router, message: &str, session: &str) -> (StatusCode, String) {
    let request = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header("Content-Type", "application/json")
        .body(Body::from(
            json!({"message": message, "sessionId": session}).to_string(),
        ))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    (status, json["reply"].as_str().unwrap().to_string())
}

async fn get_json(app: &Router, uri: &str) -> Value {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_chain_skips_disabled_and_keyless_providers() {
    let base = spawn_upstream(Upstream::default()).await;
    let app = gateway(&base, &[]).await;

    let banner = get_json(&app, "/").await;
    assert_eq!(banner["providers"], json!(["down", "up"]));
}

#[tokio::test]
async fn test_provider_order_override() {
    let base = spawn_upstream(Upstream::default()).await;
    let app = gateway(&base, &["up", "unknown", "down"]).await;

    let banner = get_json(&app, "/").await;
    assert_eq!(banner["providers"], json!(["up", "down"]));
}

#[tokio::test]
async fn test_conversation_flow() {
    let upstream = Upstream::default();
    let base = spawn_upstream(upstream.clone()).await;
    let app = gateway(&base, &[]).await;

    // Falls back past the 503 provider and sends the pending user turn.
    let (status, reply) = post_chat(&app, "Tell me a joke", "alice").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply, "answer after 1 turns");

    // History grows: two committed turns plus the new one.
    let (_, reply) = post_chat(&app, "Another one", "alice").await;
    assert_eq!(reply, "answer after 3 turns");
    assert_eq!(upstream.calls.load(Ordering::SeqCst), 2);

    // Another session asking the same question is served from the cache.
    let (status, reply) = post_chat(&app, "tell me a joke ", "bob").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply, "answer after 1 turns");
    assert_eq!(upstream.calls.load(Ordering::SeqCst), 2);

    // Identity questions never reach the upstream.
    let (_, reply) = post_chat(&app, "who built you", "alice").await;
    assert!(reply.starts_with("I am Webs"));
    assert_eq!(upstream.calls.load(Ordering::SeqCst), 2);

    // Third countable reply exhausted alice's quota.
    let (status, reply) = post_chat(&app, "One more?", "alice").await;
    assert_eq!(status, StatusCode::OK);
    assert!(reply.contains("message limit"));
    assert_eq!(upstream.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_total_outage() {
    let base = spawn_upstream(Upstream::default()).await;
    let app = gateway(&base, &["down"]).await;

    let (status, reply) = post_chat(&app, "Hello?", "carol").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(reply, "All AI models failed. Please try again later.");

    let report = get_json(&app, "/v1/doctor").await;
    // No models_url configured, so the health check passes.
    assert_eq!(report["overall_status"], "healthy");
}
