//! 链接 CRUD 端点

use actix_web::{HttpResponse, web};

use crate::api::AppState;
use crate::api::middleware::AuthUser;
use crate::services::{CreateLinkRequest, ListLinksParams, UpdateLinkRequest};
use crate::utils::suggest_alias;

use super::helpers::{api_result, created_response, error_from_condensr, success_response};
use super::types::{
    AliasQuery, BulkDeleteRequest, DaysQuery, MessageResponse, SuggestAliasQuery,
    SuggestAliasResponse,
};

/// GET /api/links
pub async fn list_links(
    state: web::Data<AppState>,
    AuthUser(user): AuthUser,
    query: web::Query<ListLinksParams>,
) -> HttpResponse {
    api_result(state.links.list_links(&user, query.into_inner()).await)
}

/// POST /api/links
pub async fn create_link(
    state: web::Data<AppState>,
    AuthUser(user): AuthUser,
    body: web::Json<CreateLinkRequest>,
) -> HttpResponse {
    match state.links.create_link(&user, body.into_inner()).await {
        Ok(link) => created_response(link),
        Err(e) => error_from_condensr(&e),
    }
}

/// GET /api/links/alias-availability?alias=
pub async fn alias_availability(
    state: web::Data<AppState>,
    _user: AuthUser,
    query: web::Query<AliasQuery>,
) -> HttpResponse {
    api_result(state.links.alias_available(&query.alias).await)
}

/// GET /api/links/suggest-alias?url=
pub async fn suggest_link_alias(_user: AuthUser, query: web::Query<SuggestAliasQuery>) -> HttpResponse {
    success_response(SuggestAliasResponse {
        alias: suggest_alias(&query.url),
    })
}

/// DELETE /api/links/bulk-delete
pub async fn bulk_delete(
    state: web::Data<AppState>,
    AuthUser(user): AuthUser,
    body: web::Json<BulkDeleteRequest>,
) -> HttpResponse {
    api_result(state.links.bulk_delete(&user, body.into_inner().ids).await)
}

/// GET /api/links/{id}?days=
pub async fn get_link(
    state: web::Data<AppState>,
    AuthUser(user): AuthUser,
    path: web::Path<String>,
    query: web::Query<DaysQuery>,
) -> HttpResponse {
    api_result(state.links.get_link(&user, &path, query.days).await)
}

/// PUT /api/links/{id}
pub async fn update_link(
    state: web::Data<AppState>,
    AuthUser(user): AuthUser,
    path: web::Path<String>,
    body: web::Json<UpdateLinkRequest>,
) -> HttpResponse {
    api_result(state.links.update_link(&user, &path, body.into_inner()).await)
}

/// DELETE /api/links/{id}
pub async fn delete_link(
    state: web::Data<AppState>,
    AuthUser(user): AuthUser,
    path: web::Path<String>,
) -> HttpResponse {
    api_result(
        state
            .links
            .delete_link(&user, &path)
            .await
            .map(|_| MessageResponse {
                message: format!("Link '{}' deleted", path),
            }),
    )
}
