//! Analytics 端点

use actix_web::{HttpResponse, web};

use crate::api::AppState;
use crate::api::middleware::{AdminUser, AuthUser};

use super::helpers::api_result;
use super::types::DaysQuery;

/// GET /api/analytics?days=
pub async fn account_analytics(
    state: web::Data<AppState>,
    AuthUser(user): AuthUser,
    query: web::Query<DaysQuery>,
) -> HttpResponse {
    api_result(state.analytics.account_overview(&user, query.days).await)
}

/// GET /api/admin/stats
pub async fn system_stats(state: web::Data<AppState>, _admin: AdminUser) -> HttpResponse {
    api_result(state.analytics.system_stats().await)
}
