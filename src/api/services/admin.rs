//! 管理员端点：用户列表、状态、角色

use actix_web::{HttpResponse, web};

use crate::api::AppState;
use crate::api::middleware::AdminUser;
use crate::services::{SetRolesRequest, SetStatusRequest};

use super::helpers::api_result;
use super::types::SearchQuery;

/// GET /api/admin/users?search=
pub async fn list_users(
    state: web::Data<AppState>,
    _admin: AdminUser,
    query: web::Query<SearchQuery>,
) -> HttpResponse {
    api_result(state.users.list_users(query.search.as_deref()).await)
}

/// PUT /api/admin/users/{id}/status
pub async fn set_user_status(
    state: web::Data<AppState>,
    AdminUser(admin): AdminUser,
    path: web::Path<String>,
    body: web::Json<SetStatusRequest>,
) -> HttpResponse {
    api_result(state.users.set_status(&admin, &path, body.status).await)
}

/// PUT /api/admin/users/{id}/roles
pub async fn set_user_roles(
    state: web::Data<AppState>,
    AdminUser(admin): AdminUser,
    path: web::Path<String>,
    body: web::Json<SetRolesRequest>,
) -> HttpResponse {
    api_result(state.users.set_roles(&admin, &path, &body.roles).await)
}
