//! Auth and account API integration tests

#[macro_use]
mod common;

use actix_web::http::StatusCode;
use actix_web::test::{self, TestRequest};
use serde_json::json;

use common::{PASSWORD, bearer, body_json, login_request, register_request, setup};

#[actix_rt::test]
async fn test_first_user_is_admin_and_second_is_not() {
    let env = setup().await;
    let app = init_app!(env);

    let resp = test::call_service(&app, register_request("Ada", "ada@example.com").to_request()).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = body_json(resp).await;
    assert_eq!(body["code"], 0);
    assert_eq!(body["data"]["tokenType"], "Bearer");
    assert_eq!(body["data"]["user"]["roles"], json!(["admin", "user"]));
    assert_eq!(body["data"]["user"]["status"], "active");
    assert!(body["data"]["user"].get("passwordHash").is_none());

    let resp = test::call_service(&app, register_request("Bob", "bob@example.com").to_request()).await;
    let body = body_json(resp).await;
    assert_eq!(body["data"]["user"]["roles"], json!(["user"]));
}

#[actix_rt::test]
async fn test_register_rejects_duplicate_email_and_weak_password() {
    let env = setup().await;
    let app = init_app!(env);

    register_user!(app, "Ada", "ada@example.com");

    // 邮箱比较忽略大小写
    let resp = test::call_service(&app, register_request("Ada 2", "ADA@example.com").to_request()).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(resp).await["code"], 4000);

    let resp = test::call_service(
        &app,
        TestRequest::post()
            .uri("/api/auth/register")
            .set_json(json!({ "name": "Eve", "email": "eve@example.com", "password": "short" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["code"], 4002);
}

#[actix_rt::test]
async fn test_login_and_me() {
    let env = setup().await;
    let app = init_app!(env);
    register_user!(app, "Ada", "ada@example.com");

    let resp = test::call_service(&app, login_request("ada@example.com", "wrong-password").to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(resp).await["code"], 2000);

    let resp = test::call_service(&app, login_request("nobody@example.com", PASSWORD).to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = test::call_service(&app, login_request("ada@example.com", PASSWORD).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let token = body_json(resp).await["data"]["token"].as_str().unwrap().to_string();

    let resp = test::call_service(
        &app,
        TestRequest::get()
            .uri("/api/user/me")
            .insert_header(bearer(&token))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["data"]["email"], "ada@example.com");
    assert_eq!(body["data"]["linksCount"], 0);
}

#[actix_rt::test]
async fn test_protected_routes_require_token() {
    let env = setup().await;
    let app = init_app!(env);

    let resp = test::call_service(&app, TestRequest::get().uri("/api/links").to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(resp).await["code"], 2002);

    let resp = test::call_service(
        &app,
        TestRequest::get()
            .uri("/api/user/me")
            .insert_header(bearer("not-a-jwt"))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn test_change_password_flow() {
    let env = setup().await;
    let app = init_app!(env);
    let (token, _) = register_user!(app, "Ada", "ada@example.com");

    let change = |current: &str, new: &str, confirm: &str| {
        TestRequest::post()
            .uri("/api/user/change-password")
            .insert_header(bearer(&token))
            .set_json(json!({
                "currentPassword": current,
                "newPassword": new,
                "confirmPassword": confirm,
            }))
            .to_request()
    };

    let resp = test::call_service(&app, change(PASSWORD, "new-password-1", "new-password-2")).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = test::call_service(&app, change("not-my-password", "new-password-1", "new-password-1")).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = test::call_service(&app, change(PASSWORD, "new-password-1", "new-password-1")).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = test::call_service(&app, login_request("ada@example.com", PASSWORD).to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let resp = test::call_service(&app, login_request("ada@example.com", "new-password-1").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_rt::test]
async fn test_update_profile() {
    let env = setup().await;
    let app = init_app!(env);
    let (token, _) = register_user!(app, "Ada", "ada@example.com");
    register_user!(app, "Bob", "bob@example.com");

    let resp = test::call_service(
        &app,
        TestRequest::put()
            .uri("/api/user/profile")
            .insert_header(bearer(&token))
            .set_json(json!({ "name": "Ada Lovelace", "customDomain": "go.ada.dev" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["data"]["name"], "Ada Lovelace");
    assert_eq!(body["data"]["customDomain"], "go.ada.dev");
    assert_eq!(body["data"]["notificationsEnabled"], true);

    // null 清除域名，未出现的字段保持不变
    let resp = test::call_service(
        &app,
        TestRequest::put()
            .uri("/api/user/profile")
            .insert_header(bearer(&token))
            .set_json(json!({ "customDomain": null, "notificationsEnabled": false }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert!(body["data"]["customDomain"].is_null());
    assert_eq!(body["data"]["notificationsEnabled"], false);
    assert_eq!(body["data"]["name"], "Ada Lovelace");

    let resp = test::call_service(
        &app,
        TestRequest::get()
            .uri("/api/user/profile")
            .insert_header(bearer(&token))
            .to_request(),
    )
    .await;
    assert_eq!(body_json(resp).await["data"]["notificationsEnabled"], false);

    let resp = test::call_service(
        &app,
        TestRequest::put()
            .uri("/api/user/profile")
            .insert_header(bearer(&token))
            .set_json(json!({ "email": "bob@example.com" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[actix_rt::test]
async fn test_suspended_user_loses_access() {
    let env = setup().await;
    let app = init_app!(env);
    let (admin_token, _) = register_user!(app, "Ada", "ada@example.com");
    let (bob_token, bob_id) = register_user!(app, "Bob", "bob@example.com");

    let resp = test::call_service(
        &app,
        TestRequest::put()
            .uri(&format!("/api/admin/users/{}/status", bob_id))
            .insert_header(bearer(&admin_token))
            .set_json(json!({ "status": "suspended" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    // 已签发的 token 也立即失效
    let resp = test::call_service(
        &app,
        TestRequest::get()
            .uri("/api/user/me")
            .insert_header(bearer(&bob_token))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = test::call_service(&app, login_request("bob@example.com", PASSWORD).to_request()).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(resp).await["code"], 4001);
}

#[actix_rt::test]
async fn test_login_is_rate_limited_per_ip() {
    let mut env = setup().await;
    env.config.auth.login_burst = 2;
    env.config.auth.login_replenish_secs = 60;
    let app = init_app!(env);
    register_user!(app, "Ada", "ada@example.com");

    for _ in 0..2 {
        let resp = test::call_service(&app, login_request("ada@example.com", PASSWORD).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
    let resp = test::call_service(&app, login_request("ada@example.com", PASSWORD).to_request()).await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
}
