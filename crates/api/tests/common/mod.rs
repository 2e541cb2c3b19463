#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use lapublica_api::auth::jwt::{generate_access_token, JwtConfig};
use lapublica_api::config::ServerConfig;
use lapublica_api::router::build_app_router;
use lapublica_api::state::AppState;
use lapublica_core::lead::LeadData;
use lapublica_core::resolution::SystemProfile;
use lapublica_core::store::memory::InMemoryStore;
use lapublica_core::types::DbId;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 15,
        },
        profile: SystemProfile::default(),
    }
}

/// Build the full application router over an in-memory store, with the same
/// middleware stack production uses.
pub fn build_test_app(store: Arc<InMemoryStore>) -> Router {
    let config = test_config();
    let state = AppState::new(config.clone(), store);
    build_app_router(state, &config)
}

/// Fresh store plus router over it.
pub fn setup() -> (Arc<InMemoryStore>, Router) {
    let store = Arc::new(InMemoryStore::new());
    let app = build_test_app(store.clone());
    (store, app)
}

/// Bearer token for a user with the given role.
pub fn token(user_id: DbId, role: &str) -> String {
    generate_access_token(user_id, role, Some("Laia Vidal"), &test_config().jwt)
        .expect("token generation should succeed")
}

pub fn seed_lead(store: &InMemoryStore, id: DbId, company: &str, contact: &str) {
    store.insert_lead(LeadData {
        id,
        company_name: company.to_string(),
        contact_name: contact.to_string(),
        email: Some("contacte@example.cat".to_string()),
        phone: None,
        estimated_revenue: Some(15000.0),
        priority: Some("HIGH".to_string()),
        status: Some("NEW".to_string()),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    });
}

/// JSON body for a speech resource.
pub fn speech_body(slug: &str, script: &str, access_roles: &[&str]) -> Value {
    serde_json::json!({
        "slug": slug,
        "title": "Guió de primer contacte",
        "description": "Trucada inicial",
        "phase": "FIRST_CONTACT",
        "category": "SALES",
        "content": { "type": "SPEECH", "script": script },
        "tags": ["trucada"],
        "accessRoles": access_roles,
    })
}

/// Send a request through the router.
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn post_json(app: &Router, uri: &str, token: &str, body: Value) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn put_json(app: &Router, uri: &str, token: &str, body: Value) -> Response<Body> {
    send(app, Method::PUT, uri, Some(token), Some(body)).await
}

pub async fn delete(app: &Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, Some(token), None).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Create a resource as ADMIN and return its id.
pub async fn create_resource(app: &Router, body: Value) -> DbId {
    let response = post_json(app, "/api/v1/resources", &token(1, "ADMIN"), body).await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}
