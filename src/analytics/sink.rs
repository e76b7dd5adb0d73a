use crate::storage::NewClickEvent;

/// 点击事件写入端
#[async_trait::async_trait]
pub trait ClickSink: Send + Sync {
    async fn write_events(&self, events: Vec<NewClickEvent>) -> anyhow::Result<()>;
}
