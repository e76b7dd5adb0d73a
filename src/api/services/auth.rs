//! 认证相关端点：注册、登录

use actix_governor::{Governor, GovernorConfigBuilder, KeyExtractor, SimpleKeyExtractionError};
use actix_web::dev::ServiceRequest;
use actix_web::{HttpResponse, web};
use governor::middleware::NoOpMiddleware;
use tracing::{debug, error};

use crate::api::AppState;
use crate::config::AuthConfig;
use crate::errors::{CondensrError, Result};
use crate::services::{LoginRequest, RegisterRequest};
use crate::storage::User;
use crate::utils::ip::extract_client_ip;

use super::helpers::{api_result, created_response, error_from_condensr};
use super::types::AuthSuccessResponse;

/// 基于客户端 IP 的限流 key 提取器
///
/// 转发头只在连接来自内网/本机（反向代理）时才采信，见 `extract_client_ip`。
#[derive(Clone, Copy)]
pub struct LoginKeyExtractor;

impl KeyExtractor for LoginKeyExtractor {
    type Key = String;
    type KeyExtractionError = SimpleKeyExtractionError<&'static str>;

    fn extract(&self, req: &ServiceRequest) -> std::result::Result<Self::Key, Self::KeyExtractionError> {
        let key = extract_client_ip(req.request()).unwrap_or_else(|| "unknown".to_string());
        debug!("Login rate limit key: {}", key);
        Ok(key)
    }
}

/// 创建登录限流器，超限返回 HTTP 429 Too Many Requests
pub fn login_rate_limiter(config: &AuthConfig) -> Governor<LoginKeyExtractor, NoOpMiddleware> {
    let replenish = config.login_replenish_secs.max(1);
    let burst = config.login_burst.max(1);

    let governor_config = GovernorConfigBuilder::default()
        .seconds_per_request(replenish)
        .burst_size(burst)
        .key_extractor(LoginKeyExtractor)
        .finish()
        .expect("Invalid rate limit config");

    debug!("Login rate limiter created: 1 req/{}s, burst {}", replenish, burst);
    Governor::new(&governor_config)
}

async fn issue_token(state: &AppState, user: User) -> Result<AuthSuccessResponse> {
    let token = state.jwt.generate_access_token(&user).map_err(|e| {
        error!("Failed to sign access token: {}", e);
        CondensrError::token_invalid("Failed to issue token")
    })?;

    Ok(AuthSuccessResponse {
        token,
        token_type: "Bearer",
        expires_in: state.jwt.access_token_minutes() * 60,
        user: state.users.view(user).await?,
    })
}

/// POST /api/auth/register
pub async fn register(state: web::Data<AppState>, body: web::Json<RegisterRequest>) -> HttpResponse {
    let result = async {
        let user = state.users.register(body.into_inner()).await?;
        issue_token(&state, user).await
    }
    .await;

    match result {
        Ok(data) => created_response(data),
        Err(e) => error_from_condensr(&e),
    }
}

/// POST /api/auth/login
pub async fn login(state: web::Data<AppState>, body: web::Json<LoginRequest>) -> HttpResponse {
    let result = async {
        let user = state.users.login(body.into_inner()).await?;
        issue_token(&state, user).await
    }
    .await;
    api_result(result)
}
