//! Shared fixtures for handoff integration tests.

use std::sync::Arc;

use axum::{body::Body, response::Response};
use http_body_util::BodyExt;
use uuid::Uuid;

use handoff_api::{HandoffState, MemorySessions};
use handoff_core::{HandoffConfig, InMemoryUserRepository, ModelRegistry, RouteMap, UserRecord};

pub const TEST_SECRET: &[u8] = b"integration-test-shared-secret";

pub fn ada() -> UserRecord {
    UserRecord::new(Uuid::from_u128(1), "ada@example.com")
}

pub fn grace() -> UserRecord {
    UserRecord::new(Uuid::from_u128(2), "grace@example.com").with_external_ref("legacy-77")
}

pub fn test_routes() -> RouteMap {
    [
        ("/dashboard".to_string(), "/home".to_string()),
        ("/reports/{id}".to_string(), "/analytics/{id}".to_string()),
    ]
    .into_iter()
    .collect()
}

pub fn test_config() -> HandoffConfig {
    HandoffConfig::with_default_ttl("https://remote.app", test_routes(), "users", TEST_SECRET)
        .expect("valid test config")
}

/// State backed by a seeded in-memory repository and recording sessions.
pub fn test_state() -> (HandoffState, Arc<MemorySessions>) {
    state_with_repository(InMemoryUserRepository::with_users(vec![ada(), grace()]))
}

pub fn state_with_repository(
    repository: InMemoryUserRepository,
) -> (HandoffState, Arc<MemorySessions>) {
    let registry = Arc::new(ModelRegistry::new());
    registry.register("users", Arc::new(repository));

    let sessions = MemorySessions::new();
    let state = HandoffState::new(test_config(), registry, sessions.clone());
    (state, sessions)
}

/// Strip the origin from an absolute URL so it can be fed to `oneshot`.
pub fn path_and_query(url: &str) -> String {
    let parsed = url::Url::parse(url).expect("absolute URL");
    match parsed.query() {
        Some(query) => format!("{}?{query}", parsed.path()),
        None => parsed.path().to_string(),
    }
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("JSON body")
}
