//! Admin API integration tests

#[macro_use]
mod common;

use actix_web::http::StatusCode;
use actix_web::test::{self, TestRequest};
use serde_json::json;

use common::{bearer, body_json, setup};

#[actix_rt::test]
async fn test_admin_routes_reject_regular_users() {
    let env = setup().await;
    let app = init_app!(env);
    register_user!(app, "Ada", "ada@example.com");
    let (bob, _) = register_user!(app, "Bob", "bob@example.com");

    for uri in ["/api/admin/users", "/api/admin/stats"] {
        let resp = test::call_service(
            &app,
            TestRequest::get().uri(uri).insert_header(bearer(&bob)).to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN, "{}", uri);
        assert_eq!(body_json(resp).await["code"], 1003);
    }
}

#[actix_rt::test]
async fn test_list_users_with_search() {
    let env = setup().await;
    let app = init_app!(env);
    let (admin, _) = register_user!(app, "Ada", "ada@example.com");
    let (bob, _) = register_user!(app, "Bob Builder", "bob@example.com");

    create_link!(app, bob, json!({ "originalUrl": "https://example.com/bob" }));

    let resp = test::call_service(
        &app,
        TestRequest::get()
            .uri("/api/admin/users")
            .insert_header(bearer(&admin))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["data"].as_array().unwrap().len(), 2);

    let resp = test::call_service(
        &app,
        TestRequest::get()
            .uri("/api/admin/users?search=builder")
            .insert_header(bearer(&admin))
            .to_request(),
    )
    .await;
    let body = body_json(resp).await;
    let users = body["data"].as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["email"], "bob@example.com");
    assert_eq!(users[0]["linksCount"], 1);
}

#[actix_rt::test]
async fn test_roles_and_status_guards() {
    let env = setup().await;
    let app = init_app!(env);
    let (admin, admin_id) = register_user!(app, "Ada", "ada@example.com");
    let (bob, bob_id) = register_user!(app, "Bob", "bob@example.com");

    // 不能移除自己的 admin 角色
    let resp = test::call_service(
        &app,
        TestRequest::put()
            .uri(&format!("/api/admin/users/{}/roles", admin_id))
            .insert_header(bearer(&admin))
            .set_json(json!({ "roles": ["user"] }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // 也不能修改自己的状态
    let resp = test::call_service(
        &app,
        TestRequest::put()
            .uri(&format!("/api/admin/users/{}/status", admin_id))
            .insert_header(bearer(&admin))
            .set_json(json!({ "status": "inactive" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = test::call_service(
        &app,
        TestRequest::put()
            .uri(&format!("/api/admin/users/{}/roles", bob_id))
            .insert_header(bearer(&admin))
            .set_json(json!({ "roles": ["admin"] }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["data"]["roles"], json!(["admin", "user"]));

    // 角色在每次请求时重新读取，不依赖 token 里的 claims
    let resp = test::call_service(
        &app,
        TestRequest::get()
            .uri("/api/admin/users")
            .insert_header(bearer(&bob))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = test::call_service(
        &app,
        TestRequest::put()
            .uri(&format!("/api/admin/users/{}/status", bob_id))
            .insert_header(bearer(&admin))
            .set_json(json!({ "status": "banned" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = test::call_service(
        &app,
        TestRequest::put()
            .uri("/api/admin/users/missing-user/roles")
            .insert_header(bearer(&admin))
            .set_json(json!({ "roles": ["user"] }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_system_stats() {
    let env = setup().await;
    let app = init_app!(env);
    let (admin, _) = register_user!(app, "Ada", "ada@example.com");
    let (bob, _) = register_user!(app, "Bob", "bob@example.com");

    let link = create_link!(app, bob, json!({ "originalUrl": "https://example.com/stats" }));
    create_link!(app, admin, json!({ "originalUrl": "https://example.com/idle" }));
    for _ in 0..3 {
        test::call_service(
            &app,
            TestRequest::get()
                .uri(&format!("/{}", link["shortCode"].as_str().unwrap()))
                .to_request(),
        )
        .await;
    }
    env.state.recorder.flush().await;

    let resp = test::call_service(
        &app,
        TestRequest::get()
            .uri("/api/admin/stats")
            .insert_header(bearer(&admin))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    let stats = &body["data"];
    assert_eq!(stats["totalUsers"], 2);
    assert_eq!(stats["totalLinks"], 2);
    assert_eq!(stats["totalClicks"], 3);
    assert_eq!(stats["activeLinksToday"], 1);
    assert_eq!(stats["averageClickRate"], 1.5);
    for key in ["cpu", "memory", "storage"] {
        let value = stats["systemUsage"][key].as_f64().unwrap();
        assert!((0.0..=100.0).contains(&value));
    }
}

#[actix_rt::test]
async fn test_delete_account_cascades_and_protects_last_admin() {
    let env = setup().await;
    let app = init_app!(env);
    let (admin, _) = register_user!(app, "Ada", "ada@example.com");
    let (bob, _) = register_user!(app, "Bob", "bob@example.com");

    let link = create_link!(app, bob, json!({ "originalUrl": "https://example.com/bye", "alias": "bye" }));

    let resp = test::call_service(
        &app,
        TestRequest::delete()
            .uri("/api/user/account")
            .insert_header(bearer(&admin))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = test::call_service(
        &app,
        TestRequest::delete()
            .uri("/api/user/account")
            .insert_header(bearer(&bob))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    assert!(
        env.state
            .storage
            .find_link(link["id"].as_str().unwrap())
            .await
            .unwrap()
            .is_none()
    );
    let resp = test::call_service(&app, TestRequest::get().uri("/bye").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // 账户删除后旧 token 失效
    let resp = test::call_service(
        &app,
        TestRequest::get()
            .uri("/api/user/me")
            .insert_header(bearer(&bob))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn test_health_check() {
    let env = setup().await;
    let app = init_app!(env);

    let resp = test::call_service(&app, TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["data"]["status"], "healthy");
    assert_eq!(body["data"]["database"]["status"], "healthy");
    assert_eq!(body["data"]["database"]["backend"], "sqlite");
}
