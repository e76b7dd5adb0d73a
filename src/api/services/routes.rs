//! API 路由配置
//!
//! `/api` 下按功能拆分 scope；`/{code}` 必须最后注册。

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, error, web};

use crate::api::middleware::BearerAuth;
use crate::config::AuthConfig;

use super::admin::{list_users, set_user_roles, set_user_status};
use super::analytics::{account_analytics, system_stats};
use super::auth::{login, login_rate_limiter, register};
use super::error_code::ErrorCode;
use super::health::health_check;
use super::helpers::error_response;
use super::links::{
    alias_availability, bulk_delete, create_link, delete_link, get_link, list_links,
    suggest_link_alias, update_link,
};
use super::redirect::handle_redirect;
use super::user::{change_password, delete_account, me, update_profile};

/// 请求体 / 查询参数解析失败时也返回统一的 JSON 信封
fn bad_request(err: impl std::fmt::Display) -> error::Error {
    let message = err.to_string();
    error::InternalError::from_response(
        message.clone(),
        error_response(StatusCode::BAD_REQUEST, ErrorCode::BadRequest, &message),
    )
    .into()
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(256 * 1024)
        .error_handler(|err, _req| bad_request(err))
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| bad_request(err))
}

fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err, _req| bad_request(err))
}

/// 认证路由 `/auth`（不需要 token，登录带限流）
pub fn auth_routes(config: &AuthConfig) -> actix_web::Scope {
    web::scope("/auth")
        .route("/register", web::post().to(register))
        .route(
            "/login",
            web::post().to(login).wrap(login_rate_limiter(config)),
        )
}

/// 链接路由 `/links`
pub fn links_routes() -> actix_web::Scope {
    web::scope("/links")
        .route("", web::get().to(list_links))
        .route("", web::post().to(create_link))
        // 固定路径必须在 /{id} 之前
        .route("/alias-availability", web::get().to(alias_availability))
        .route("/suggest-alias", web::get().to(suggest_link_alias))
        .route("/bulk-delete", web::delete().to(bulk_delete))
        .route("/{id}", web::get().to(get_link))
        .route("/{id}", web::put().to(update_link))
        .route("/{id}", web::delete().to(delete_link))
}

/// 当前用户路由 `/user`
pub fn user_routes() -> actix_web::Scope {
    web::scope("/user")
        .route("/me", web::get().to(me))
        .route("/profile", web::get().to(me))
        .route("/profile", web::put().to(update_profile))
        .route("/change-password", web::post().to(change_password))
        .route("/account", web::delete().to(delete_account))
}

/// 管理路由 `/admin`（handler 通过 `AdminUser` 校验角色）
pub fn admin_routes() -> actix_web::Scope {
    web::scope("/admin")
        .route("/users", web::get().to(list_users))
        .route("/users/{id}/status", web::put().to(set_user_status))
        .route("/users/{id}/roles", web::put().to(set_user_roles))
        .route("/stats", web::get().to(system_stats))
}

async fn api_not_found() -> HttpResponse {
    error_response(StatusCode::NOT_FOUND, ErrorCode::NotFound, "Not Found")
}

/// Register every route on the app
pub fn configure(cfg: &mut web::ServiceConfig, auth: &AuthConfig) {
    cfg.app_data(json_config())
        .app_data(query_config())
        .app_data(path_config())
        .route("/health", web::get().to(health_check))
        .service(
            web::scope("/api")
                .wrap(BearerAuth)
                .service(auth_routes(auth))
                .service(links_routes())
                .route("/analytics", web::get().to(account_analytics))
                .service(user_routes())
                .service(admin_routes())
                .default_service(web::to(api_not_found)),
        )
        .route("/{code}", web::get().to(handle_redirect));
}
