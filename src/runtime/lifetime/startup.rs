use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info};

use crate::api::AppState;
use crate::config::StaticConfig;
use crate::storage::StorageFactory;

/// 准备服务器启动的上下文：连接数据库、执行迁移、组装服务，并启动点击事件刷盘任务
pub async fn prepare_server_startup(config: &StaticConfig) -> Result<AppState> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    let storage = StorageFactory::create(&config.database)
        .await
        .inspect_err(|e| eprintln!("{}", e.format_colored()))
        .context("Failed to initialize storage")?;
    info!("Using storage backend: {}", storage.backend_name());

    let state = AppState::new(config, Arc::clone(&storage));

    let recorder = state.recorder.clone();
    tokio::spawn(async move {
        recorder.start_background_task().await;
    });
    info!(
        "Click recorder started (flush every {}s, early flush at {} events)",
        config.analytics.flush_interval_secs, config.analytics.max_buffer
    );

    debug!(
        "Pre-startup processing completed in {} ms",
        start_time.elapsed().as_millis()
    );
    Ok(state)
}
