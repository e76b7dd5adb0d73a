use std::time::Duration;
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::analytics::ClickRecorder;

/// 刷盘超时时间（秒）
const FLUSH_TIMEOUT_SECS: u64 = 10;

/// 服务停止后把缓冲区里的点击事件写入数据库
pub async fn flush_on_shutdown(recorder: &ClickRecorder) {
    let pending = recorder.pending();
    if pending == 0 {
        info!("No pending click events, shutting down");
        return;
    }

    info!("Flushing {} pending click events...", pending);
    match timeout(Duration::from_secs(FLUSH_TIMEOUT_SECS), recorder.flush()).await {
        Ok(()) if recorder.pending() == 0 => info!("ClickRecorder flushed successfully"),
        Ok(()) => warn!(
            "ClickRecorder flush left {} events unwritten",
            recorder.pending()
        ),
        Err(_) => error!(
            "ClickRecorder flush timed out after {} seconds",
            FLUSH_TIMEOUT_SECS
        ),
    }
}
