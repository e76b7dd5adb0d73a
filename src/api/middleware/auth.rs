//! Bearer authentication for `/api/*`
//!
//! 校验 JWT 后重新加载用户，被停用的账户在下一次请求即失效。
//! 通过的请求把 `User` 放进 request extensions，由 `AuthUser` / `AdminUser` 取出。

use actix_service::{Service, Transform};
use actix_web::{
    Error, FromRequest, HttpMessage, HttpRequest,
    body::EitherBody,
    dev::{Payload, ServiceRequest, ServiceResponse},
    http::Method,
    web,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::rc::Rc;
use tracing::{debug, info, trace};

use crate::api::AppState;
use crate::api::services::error_from_condensr;
use crate::errors::CondensrError;
use crate::storage::User;

/// Paths under this prefix are reachable without a token
const PUBLIC_PREFIX: &str = "/api/auth/";

/// Bearer authentication middleware
#[derive(Clone, Default)]
pub struct BearerAuth;

impl<S, B> Transform<S, ServiceRequest> for BearerAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = BearerAuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(BearerAuthMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct BearerAuthMiddleware<S> {
    service: Rc<S>,
}

/// 从 Authorization header 提取 Bearer token
fn extract_bearer_token(req: &ServiceRequest) -> Option<String> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn is_public(req: &ServiceRequest) -> bool {
    req.method() == Method::OPTIONS || req.path().starts_with(PUBLIC_PREFIX)
}

async fn authenticate(req: &ServiceRequest) -> Result<User, CondensrError> {
    let token = extract_bearer_token(req)
        .ok_or_else(|| CondensrError::token_invalid("Missing bearer token"))?;

    let state = req
        .app_data::<web::Data<AppState>>()
        .cloned()
        .ok_or_else(|| CondensrError::database_config("Application state not configured"))?;

    let claims = state.jwt.validate_access_token(&token).map_err(|e| {
        info!("Bearer token validation failed: {}", e);
        CondensrError::token_invalid("Invalid or expired token")
    })?;

    let user = state.users.authenticate(&claims.sub).await?;
    trace!("Authenticated {} ({})", user.email, user.id);
    Ok(user)
}

impl<S, B> Service<ServiceRequest> for BearerAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
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

        Box::pin(async move {
            if is_public(&req) {
                return srv.call(req).await.map(ServiceResponse::map_into_left_body);
            }

            match authenticate(&req).await {
                Ok(user) => {
                    req.extensions_mut().insert(user);
                    srv.call(req).await.map(ServiceResponse::map_into_left_body)
                }
                Err(e) => {
                    debug!("Rejected {} {}: {}", req.method(), req.path(), e);
                    Ok(req.into_response(error_from_condensr(&e).map_into_right_body()))
                }
            }
        })
    }
}

/// The authenticated caller
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

impl FromRequest for AuthUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let user = req.extensions().get::<User>().cloned();
        ready(match user {
            Some(user) => Ok(AuthUser(user)),
            None => Err(CondensrError::token_invalid("Missing bearer token").into()),
        })
    }
}

/// The authenticated caller, required to hold the admin role
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

impl FromRequest for AdminUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let user = req.extensions().get::<User>().cloned();
        ready(match user {
            Some(user) if user.is_admin() => Ok(AdminUser(user)),
            Some(user) => {
                info!("Non-admin {} denied on {}", user.id, req.path());
                Err(CondensrError::forbidden("Admin role required").into())
            }
            None => Err(CondensrError::token_invalid("Missing bearer token").into()),
        })
    }
}
