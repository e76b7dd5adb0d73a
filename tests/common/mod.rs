//! Shared setup for the HTTP integration tests
//!
//! Each test gets its own SQLite file in a TempDir, so tests never share
//! users or links.

#![allow(dead_code)]

use actix_web::dev::ServiceResponse;
use actix_web::test::{self, TestRequest};
use serde_json::{Value, json};
use tempfile::TempDir;

use condensr::api::AppState;
use condensr::config::StaticConfig;
use condensr::storage::StorageFactory;

pub const PUBLIC_BASE: &str = "https://cdsr.test";
pub const PASSWORD: &str = "correct-horse-battery";

pub struct TestEnv {
    pub state: AppState,
    pub config: StaticConfig,
    _dir: TempDir,
}

pub async fn setup() -> TestEnv {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = dir.path().join("condensr_test.db");

    let mut config = StaticConfig::default();
    config.database.database_url = format!("sqlite://{}?mode=rwc", db_path.display());
    config.auth.jwt_secret = "integration-test-secret-0123456789abcdef".to_string();
    config.server.public_base_url = PUBLIC_BASE.to_string();
    // 测试里手动 flush
    config.analytics.flush_interval_secs = 3600;

    let storage = StorageFactory::create(&config.database)
        .await
        .expect("Failed to create storage");
    let state = AppState::new(&config, storage);

    TestEnv {
        state,
        config,
        _dir: dir,
    }
}

/// Build the full app for a `TestEnv`
#[macro_export]
macro_rules! init_app {
    ($env:expr) => {{
        let state = actix_web::web::Data::new($env.state.clone());
        let auth = $env.config.auth.clone();
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(state)
                .configure(move |cfg| condensr::api::services::routes::configure(cfg, &auth)),
        )
        .await
    }};
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}

pub async fn body_json(resp: ServiceResponse) -> Value {
    test::read_body_json(resp).await
}

pub fn register_request(name: &str, email: &str) -> TestRequest {
    TestRequest::post()
        .uri("/api/auth/register")
        .peer_addr("10.1.2.3:40000".parse().unwrap())
        .set_json(json!({
            "name": name,
            "email": email,
            "password": PASSWORD,
        }))
}

pub fn login_request(email: &str, password: &str) -> TestRequest {
    TestRequest::post()
        .uri("/api/auth/login")
        .peer_addr("10.1.2.3:40000".parse().unwrap())
        .set_json(json!({ "email": email, "password": password }))
}

/// Register a user and return `(token, user id)`
#[macro_export]
macro_rules! register_user {
    ($app:expr, $name:expr, $email:expr) => {{
        let resp = actix_web::test::call_service(
            &$app,
            $crate::common::register_request($name, $email).to_request(),
        )
        .await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::CREATED);
        let body: serde_json::Value = actix_web::test::read_body_json(resp).await;
        (
            body["data"]["token"].as_str().unwrap().to_string(),
            body["data"]["user"]["id"].as_str().unwrap().to_string(),
        )
    }};
}

/// Create a link as `$token` and return the response body `data`
#[macro_export]
macro_rules! create_link {
    ($app:expr, $token:expr, $body:expr) => {{
        let resp = actix_web::test::call_service(
            &$app,
            actix_web::test::TestRequest::post()
                .uri("/api/links")
                .insert_header($crate::common::bearer(&$token))
                .set_json($body)
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::CREATED);
        let body: serde_json::Value = actix_web::test::read_body_json(resp).await;
        body["data"].clone()
    }};
}
