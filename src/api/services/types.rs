//! API 类型定义

use serde::{Deserialize, Serialize};

use crate::services::UserView;

/// Response envelope: `code` 0 means success
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub message: String,
    pub data: Option<T>,
}

#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AuthSuccessResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
    pub user: UserView,
}

#[derive(Serialize, Clone, Debug)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct DaysQuery {
    pub days: Option<u32>,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct SearchQuery {
    pub search: Option<String>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct AliasQuery {
    pub alias: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct SuggestAliasQuery {
    pub url: String,
}

#[derive(Serialize, Clone, Debug)]
pub struct SuggestAliasResponse {
    pub alias: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct BulkDeleteRequest {
    pub ids: Vec<String>,
}

/// `?password=` on the redirect route
#[derive(Deserialize, Clone, Debug, Default)]
pub struct RedirectQuery {
    pub password: Option<String>,
}

#[derive(Serialize, Clone, Debug)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: HealthCheck,
    pub version: &'static str,
    pub uptime_secs: u64,
}

#[derive(Serialize, Clone, Debug)]
pub struct HealthCheck {
    pub status: &'static str,
    pub backend: String,
    pub response_time_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
