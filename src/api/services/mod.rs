//! HTTP handlers
//!
//! 每个文件对应一组端点；handler 只做参数提取与响应封装，业务逻辑在 `crate::services`。

mod admin;
mod analytics;
mod auth;
pub mod error_code;
mod health;
mod helpers;
mod links;
mod redirect;
pub mod routes;
mod types;
mod user;

pub use error_code::ErrorCode;
pub use helpers::{
    api_result, created_response, error_from_condensr, error_response, json_response,
    success_response,
};
pub use redirect::LINK_PASSWORD_HEADER;
pub use routes::configure;
pub use types::*;
