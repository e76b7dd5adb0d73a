//! 当前用户端点：资料、密码、注销账户

use actix_web::{HttpResponse, web};

use crate::api::AppState;
use crate::api::middleware::AuthUser;
use crate::services::{ChangePasswordRequest, ProfileUpdateRequest};

use super::helpers::api_result;
use super::types::MessageResponse;

/// GET /api/user/me, GET /api/user/profile
pub async fn me(state: web::Data<AppState>, AuthUser(user): AuthUser) -> HttpResponse {
    api_result(state.users.view(user).await)
}

/// PUT /api/user/profile
pub async fn update_profile(
    state: web::Data<AppState>,
    AuthUser(user): AuthUser,
    body: web::Json<ProfileUpdateRequest>,
) -> HttpResponse {
    api_result(state.users.update_profile(&user, body.into_inner()).await)
}

/// POST /api/user/change-password
pub async fn change_password(
    state: web::Data<AppState>,
    AuthUser(user): AuthUser,
    body: web::Json<ChangePasswordRequest>,
) -> HttpResponse {
    api_result(
        state
            .users
            .change_password(&user, body.into_inner())
            .await
            .map(|_| MessageResponse {
                message: "Password changed".to_string(),
            }),
    )
}

/// DELETE /api/user/account
pub async fn delete_account(state: web::Data<AppState>, AuthUser(user): AuthUser) -> HttpResponse {
    api_result(
        state
            .users
            .delete_account(&user)
            .await
            .map(|_| MessageResponse {
                message: "Account deleted".to_string(),
            }),
    )
}
