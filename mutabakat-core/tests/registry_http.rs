//! HttpRegistry against a real HTTP server
//!
//! These tests run an axum app on an ephemeral port that behaves like the
//! push endpoints of the API:
//! - Every route requires the bearer credential
//! - Errors are reported as `{"detail": "..."}`

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use url::Url;

use mutabakat_core::push::mock::{MockPlatform, generate_server_key};
use mutabakat_core::push::{HttpRegistry, Outcome, Readiness, Registry};
use mutabakat_core::{Credential, PushRegistrationManager, RegistryError};

const TOKEN: &str = "session-token";

#[derive(Default)]
struct ApiState {
    server_key: String,
    records: Mutex<HashMap<String, Value>>,
    fail_test: bool,
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value == format!("Bearer {}", TOKEN))
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "detail": "Not authenticated" })),
    )
        .into_response()
}

async fn status(State(state): State<Arc<ApiState>>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let enabled = !state.records.lock().unwrap().is_empty();
    Json(json!({ "vapid_public_key": state.server_key, "enabled": enabled })).into_response()
}

async fn subscribe(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let endpoint = body["endpoint"].as_str().unwrap_or_default().to_string();
    state.records.lock().unwrap().insert(endpoint, body);
    Json(json!({ "message": "subscribed" })).into_response()
}

async fn unsubscribe(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let Some(endpoint) = params.get("endpoint") else {
        return (StatusCode::BAD_REQUEST, "missing endpoint").into_response();
    };
    state.records.lock().unwrap().remove(endpoint);
    StatusCode::NO_CONTENT.into_response()
}

async fn send_test(State(state): State<Arc<ApiState>>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    if state.fail_test {
        return (
            StatusCode::BAD_GATEWAY,
            Json(json!({ "detail": "push service down" })),
        )
            .into_response();
    }
    Json(json!({ "message": "sent" })).into_response()
}

/// Serve the API and return its `/api/` base URL
async fn spawn_api(state: Arc<ApiState>) -> Url {
    let app = Router::new()
        .route("/api/push/status", get(status))
        .route("/api/push/subscribe", post(subscribe))
        .route("/api/push/unsubscribe", delete(unsubscribe))
        .route("/api/push/test", post(send_test))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Url::parse(&format!("http://{}/api", addr)).unwrap()
}

fn api_state() -> Arc<ApiState> {
    Arc::new(ApiState {
        server_key: generate_server_key(),
        ..ApiState::default()
    })
}

#[tokio::test]
async fn status_returns_server_key() {
    let state = api_state();
    let registry = HttpRegistry::new(spawn_api(state.clone()).await);

    let status = registry.status(&Credential::new(TOKEN)).await.unwrap();

    assert_eq!(status.vapid_public_key, state.server_key);
    assert!(!status.enabled);
}

#[tokio::test]
async fn wrong_credential_surfaces_detail() {
    let registry = HttpRegistry::new(spawn_api(api_state()).await);

    let err = registry.status(&Credential::new("stale")).await.unwrap_err();

    match err {
        RegistryError::Status { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "Not authenticated");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn send_test_reports_server_failure() {
    let state = Arc::new(ApiState {
        fail_test: true,
        ..ApiState::default()
    });
    let registry = HttpRegistry::new(spawn_api(state).await);

    let err = registry.send_test(&Credential::new(TOKEN)).await.unwrap_err();
    assert!(err.to_string().contains("push service down"));
}

#[tokio::test]
async fn subscribe_and_unsubscribe_round_trip_through_manager() {
    let state = api_state();
    let registry = Arc::new(HttpRegistry::new(spawn_api(state.clone()).await));
    let platform = Arc::new(MockPlatform::new());
    let mut manager = PushRegistrationManager::new(
        platform.clone(),
        registry,
        Arc::new(Credential::new(TOKEN)),
    );

    assert!(manager.check_capability());
    assert_eq!(manager.fetch_server_key_material().await, Outcome::Completed);
    assert_eq!(manager.subscribe().await.unwrap(), Outcome::Completed);
    assert_eq!(manager.readiness(), Readiness::Ready { subscribed: true });

    let endpoint = manager.subscription().unwrap().endpoint.clone();
    {
        let records = state.records.lock().unwrap();
        let record = &records[&endpoint];
        assert_eq!(record["user_agent"], "MockPlatform/1.0");
        assert!(record["keys"]["p256dh"].as_str().is_some_and(|k| !k.is_empty()));
        assert!(record["keys"]["auth"].as_str().is_some_and(|k| !k.is_empty()));
    }

    assert_eq!(manager.unsubscribe().await.unwrap(), Outcome::Completed);
    assert!(state.records.lock().unwrap().is_empty());
    assert!(platform.active_subscription().is_none());
    assert_eq!(manager.readiness(), Readiness::Ready { subscribed: false });
}

#[tokio::test]
async fn base_without_trailing_slash_keeps_api_prefix() {
    let base = spawn_api(api_state()).await;
    assert!(!base.path().ends_with('/'));

    let registry = HttpRegistry::new(base);
    assert!(registry.base().path().ends_with("/api/"));
    registry.send_test(&Credential::new(TOKEN)).await.unwrap();
}
