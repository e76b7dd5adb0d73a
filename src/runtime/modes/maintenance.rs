use anyhow::{Context, Result};
use tracing::info;

use crate::config::StaticConfig;
use crate::storage::StorageFactory;

/// 连接数据库并执行全部待执行的迁移后退出
pub async fn run_migrations_only(config: &StaticConfig) -> Result<()> {
    let storage = StorageFactory::create(&config.database)
        .await
        .inspect_err(|e| eprintln!("{}", e.format_colored()))
        .context("Failed to run migrations")?;
    info!(
        "Migrations applied on {} database",
        storage.backend_name()
    );
    Ok(())
}

/// 输出示例配置；`output` 为空时打印到 stdout
pub fn generate_config(output: Option<&str>) -> Result<()> {
    match output {
        Some(path) => {
            StaticConfig::default().save_to_file(path)?;
            println!("Sample configuration written to {}", path);
        }
        None => print!("{}", StaticConfig::generate_sample_config()),
    }
    Ok(())
}
