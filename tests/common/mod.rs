#![allow(dead_code)]

use axum_test::TestServer;
use chrono::Duration;
use river_monitor::application::reading_worker::run_reading_worker;
use river_monitor::domain::reading_event::ReadingEvent;
use river_monitor::infrastructure::Container;
use river_monitor::infrastructure::cache::NullCache;
use river_monitor::routes::router;
use river_monitor::state::{AppState, ServiceSettings};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::sync::mpsc;

pub const ADMIN: (&str, &str) = ("admin", "admin123");
pub const TECNICO: (&str, &str) = ("tecnico", "tecnico123");
pub const OBSERVADOR: (&str, &str) = ("observador", "observador123");

pub fn test_settings() -> ServiceSettings {
    ServiceSettings {
        token_signing_secret: "test-signing-secret-with-enough-length".to_string(),
        token_ttl: Duration::hours(24),
        critical_station_ids: vec![1, 2],
    }
}

/// Seeded in-memory state. The receiver is returned so tests decide whether
/// readings are drained.
pub fn create_test_state(
    queue_capacity: usize,
) -> (AppState, mpsc::Receiver<ReadingEvent>) {
    let (tx, rx) = mpsc::channel(queue_capacity);
    let state = AppState::new(
        Container::in_memory(true),
        test_settings(),
        Arc::new(NullCache::new()),
        tx,
    );
    (state, rx)
}

pub fn create_test_server(state: AppState) -> TestServer {
    TestServer::new(router(state, false)).unwrap()
}

/// Server over seeded data. Queued readings stay in the returned receiver.
pub fn setup() -> (TestServer, mpsc::Receiver<ReadingEvent>) {
    let (state, rx) = create_test_state(100);
    (create_test_server(state), rx)
}

/// Server over seeded data with the reading worker running.
pub fn setup_with_worker() -> (TestServer, AppState) {
    let (state, rx) = create_test_state(100);
    tokio::spawn(run_reading_worker(
        rx,
        state.measurement_service.clone(),
        state.alert_service.clone(),
        state.cache.clone(),
        2,
    ));
    (create_test_server(state.clone()), state)
}

pub async fn login(server: &TestServer, (username, password): (&str, &str)) -> String {
    let response = server
        .post("/api/auth/login")
        .json(&json!({ "username": username, "password": password }))
        .await;
    response.assert_status_ok();

    let body = response.json::<Value>();
    body["token"].as_str().unwrap().to_string()
}

pub fn error_code(body: &Value) -> &str {
    body["error"]["code"].as_str().unwrap_or_default()
}
