#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::path::PathBuf;
use tempfile::TempDir;
use tower::ServiceExt;

// Re-export the main app modules for testing
use content_site::{build_router, utils, AppState};

pub const TEST_TOKEN: &str = "test-admin-token";

/// A router over temporary config/data files. The directory lives as long
/// as this value does.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub temp_dir: TempDir,
}

impl TestApp {
    pub fn config_path(&self) -> PathBuf {
        self.temp_dir.path().join("config.json")
    }

    pub fn data_path(&self) -> PathBuf {
        self.temp_dir.path().join("data.json")
    }

    /// Send a request and return the status and raw body.
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    /// Send a request and parse the body as JSON.
    pub async fn send_json(&self, request: Request<Body>) -> (StatusCode, Value) {
        let (status, body) = self.send(request).await;
        let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, json)
    }
}

/// Setup a test application with temporary storage and an admin token
pub async fn setup_test_app() -> TestApp {
    let app = setup_unconfigured_app().await;
    std::fs::write(
        app.config_path(),
        format!(r#"{{"title":"Test Site","adminToken":"{}"}}"#, TEST_TOKEN),
    )
    .unwrap();
    app
}

/// Setup a test application with no config document at all
pub async fn setup_unconfigured_app() -> TestApp {
    let temp_dir = TempDir::new().unwrap();

    let config = utils::config::AppConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        config_file: temp_dir.path().join("config.json").to_string_lossy().into_owned(),
        data_file: temp_dir.path().join("data.json").to_string_lossy().into_owned(),
        ..Default::default()
    };

    let state = AppState::new(config);
    let router = build_router(state.clone());

    TestApp {
        router,
        state,
        temp_dir,
    }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method("GET")
        .body(Body::empty())
        .unwrap()
}

/// Build a JSON request carrying the admin token in the `x-admin-token` header
pub fn admin_json(method: &str, uri: &str, token: &str, body: Value) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method(method)
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-admin-token", token)
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

/// Build a JSON request without any token header
pub fn plain_json(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method(method)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}
