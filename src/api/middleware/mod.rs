pub mod auth;
pub mod timing;

pub use auth::{AdminUser, AuthUser, BearerAuth};
pub use timing::TimingMiddleware;
