use actix_web::http::StatusCode;
use actix_web::{HttpResponse, web};
use std::time::{Duration, Instant};
use tracing::{error, trace};

use crate::api::AppState;

use super::error_code::ErrorCode;
use super::helpers::json_response;
use super::types::{HealthCheck, HealthResponse};

/// GET /health
///
/// 只做一次数据库 ping，不经过业务服务；超时 5 秒视为不可用。
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let start = Instant::now();
    trace!("Received health check request");

    let ping = tokio::time::timeout(Duration::from_secs(5), state.storage.ping()).await;
    let error = match ping {
        Ok(Ok(())) => None,
        Ok(Err(e)) => {
            error!("Storage health check failed: {}", e);
            Some(e.message().to_string())
        }
        Err(_) => {
            error!("Storage health check timeout");
            Some("timeout".to_string())
        }
    };
    let healthy = error.is_none();

    let data = HealthResponse {
        status: if healthy { "healthy" } else { "unhealthy" },
        database: HealthCheck {
            status: if healthy { "healthy" } else { "unhealthy" },
            backend: state.storage.backend_name().to_string(),
            response_time_ms: start.elapsed().as_millis() as u64,
            error,
        },
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.started_at.elapsed().as_secs(),
    };

    if healthy {
        json_response(StatusCode::OK, ErrorCode::Success, "OK", Some(data))
    } else {
        json_response(
            StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::ServiceUnavailable,
            "Database unavailable",
            Some(data),
        )
    }
}
