//! Server mode
//!
//! Configures and starts the HTTP server. actix-web handles SIGINT/SIGTERM
//! with a graceful stop; buffered click events are flushed afterwards.

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware::Compress, web};
use anyhow::Result;
use tracing::{info, warn};

use crate::api::middleware::TimingMiddleware;
use crate::api::services::configure;
use crate::config::{CorsConfig, StaticConfig};
use crate::runtime::lifetime;

/// Build CORS middleware from `[cors]`
///
/// 未配置来源时不放开跨域（浏览器同源策略）；`*` 表示任意来源，此时不允许携带凭据。
fn build_cors_middleware(config: &CorsConfig) -> Cors {
    let origins = &config.allowed_origins;
    if origins.is_empty() {
        return Cors::default();
    }

    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_headers(vec!["Content-Type", "Authorization", "Accept", "X-Link-Password"])
        .max_age(3600);

    if origins.iter().any(|o| o == "*") {
        cors = cors.allow_any_origin();
    } else {
        for origin in origins {
            cors = cors.allowed_origin(origin);
        }
    }
    cors
}

/// Run the HTTP server
///
/// **Note**: Logging system must be initialized before calling this function
pub async fn run_server(config: &StaticConfig) -> Result<()> {
    let state = lifetime::startup::prepare_server_startup(config)
        .await
        .map_err(|e| {
            tracing::error!("Server startup failed: {}", e);
            e
        })?;
    let recorder = state.recorder.clone();

    if config.cors.allowed_origins.is_empty() {
        info!("CORS disabled (no allowed origins configured)");
    } else {
        info!("CORS allowed origins: {:?}", config.cors.allowed_origins);
    }

    let workers = config.server.workers.clamp(1, 32);
    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    let cors_config = config.cors.clone();
    let auth_config = config.auth.clone();

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TimingMiddleware)
            .wrap(build_cors_middleware(&cors_config))
            .wrap(Compress::default())
            .app_data(web::Data::new(state.clone()))
            .configure(|cfg| configure(cfg, &auth_config))
    })
    .keep_alive(std::time::Duration::from_secs(30))
    .workers(workers)
    .bind(&bind_address)?;

    warn!(
        "Starting server at http://{} with {} workers (public URL: {})",
        bind_address, workers, config.server.public_base_url
    );

    server.run().await?;

    info!("HTTP server stopped");
    lifetime::shutdown::flush_on_shutdown(&recorder).await;
    Ok(())
}
