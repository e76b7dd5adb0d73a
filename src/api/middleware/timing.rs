//! HTTP timing middleware
//!
//! Logs one line per request through `tracing`: method, endpoint class,
//! status and duration.

use actix_service::{Service, Transform};
use actix_web::{
    Error,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::rc::Rc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// HTTP timing middleware factory
#[derive(Clone, Default)]
pub struct TimingMiddleware;

impl<S, B> Transform<S, ServiceRequest> for TimingMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = TimingService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(TimingService {
            service: Rc::new(service),
        }))
    }
}

pub struct TimingService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for TimingService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        let start = Instant::now();
        let method = req.method().clone();
        let path = req.path().to_string();
        let endpoint = classify_endpoint(&path);

        Box::pin(async move {
            let result = srv.call(req).await;
            let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

            match &result {
                Ok(response) => log_request(&method, &path, endpoint, response.status(), elapsed_ms),
                Err(e) => warn!(
                    "{} {} [{}] failed after {:.2}ms: {}",
                    method, path, endpoint, elapsed_ms, e
                ),
            }

            result
        })
    }
}

fn log_request(
    method: &actix_web::http::Method,
    path: &str,
    endpoint: &str,
    status: StatusCode,
    elapsed_ms: f64,
) {
    if status.is_server_error() {
        warn!("{} {} [{}] {} {:.2}ms", method, path, endpoint, status.as_u16(), elapsed_ms);
    } else if endpoint == "redirect" || endpoint == "health" {
        // 重定向与探针请求量大，降到 debug
        debug!("{} {} [{}] {} {:.2}ms", method, path, endpoint, status.as_u16(), elapsed_ms);
    } else {
        info!("{} {} [{}] {} {:.2}ms", method, path, endpoint, status.as_u16(), elapsed_ms);
    }
}

/// Classify request path into endpoint category
fn classify_endpoint(path: &str) -> &'static str {
    if path.starts_with("/api/admin") {
        "admin"
    } else if path.starts_with("/api/auth") {
        "auth"
    } else if path.starts_with("/api/") {
        "api"
    } else if path == "/health" {
        "health"
    } else {
        "redirect"
    }
}
