//! Mode routing
//!
//! - `serve`（默认）：HTTP 服务
//! - `migrate`：只执行数据库迁移
//! - `config-gen`：输出示例配置

pub mod maintenance;
#[cfg(feature = "server")]
pub mod server;

pub use maintenance::{generate_config, run_migrations_only};
#[cfg(feature = "server")]
pub use server::run_server;
