//! 点击事件记录器
//!
//! 重定向热路径只把事件放进内存缓冲区，由后台任务批量写库：
//! - DashMap 缓冲，无锁写入
//! - 定时刷盘，缓冲达到阈值时提前刷盘
//! - 刷盘失败时事件回填缓冲区，总量上限为 `max_buffer * BUFFER_CAP_FACTOR`，超出丢弃最旧的事件

use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicU64, Ordering},
};

use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio::time::{Duration, sleep};
use tracing::{debug, trace, warn};

use crate::analytics::ClickSink;
use crate::storage::NewClickEvent;

/// 缓冲区上限相对于刷盘阈值的倍数
const BUFFER_CAP_FACTOR: usize = 10;

struct EventBuffer {
    data: DashMap<u64, NewClickEvent>,
    next_id: AtomicU64,
    /// 刷盘锁，防止并发刷盘
    flush_lock: Mutex<()>,
    /// 是否已有阈值触发的刷盘任务（防止重复 spawn）
    flush_pending: AtomicBool,
}

impl EventBuffer {
    fn new() -> Self {
        Self {
            data: DashMap::new(),
            next_id: AtomicU64::new(0),
            flush_lock: Mutex::new(()),
            flush_pending: AtomicBool::new(false),
        }
    }

    fn push(&self, event: NewClickEvent) -> usize {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.data.insert(id, event);
        self.data.len()
    }

    /// 逐个 remove 快照中的 key，窗口期新增的事件留在缓冲区
    fn drain(&self) -> Vec<NewClickEvent> {
        let mut keys: Vec<u64> = self.data.iter().map(|r| *r.key()).collect();
        keys.sort_unstable();

        keys.into_iter()
            .filter_map(|key| self.data.remove(&key).map(|(_, event)| event))
            .collect()
    }

    /// 回填刷盘失败的事件，最多填到 `cap`；返回丢弃的（最旧的）事件数
    fn restore(&self, events: Vec<NewClickEvent>, cap: usize) -> usize {
        let room = cap.saturating_sub(self.len());
        let dropped = events.len().saturating_sub(room);
        for event in events.into_iter().skip(dropped) {
            self.push(event);
        }
        dropped
    }

    fn len(&self) -> usize {
        self.data.len()
    }
}

/// Buffers click events off the redirect path and writes them in batches
#[derive(Clone)]
pub struct ClickRecorder {
    buffer: Arc<EventBuffer>,
    sink: Arc<dyn ClickSink>,
    flush_interval: Duration,
    max_buffer: usize,
    capacity: usize,
}

impl ClickRecorder {
    pub fn new(sink: Arc<dyn ClickSink>, flush_interval: Duration, max_buffer: usize) -> Self {
        let max_buffer = max_buffer.max(1);
        Self {
            buffer: Arc::new(EventBuffer::new()),
            sink,
            flush_interval,
            max_buffer,
            capacity: max_buffer.saturating_mul(BUFFER_CAP_FACTOR),
        }
    }

    /// 记录一次点击（不阻塞调用方）
    pub fn record(&self, event: NewClickEvent) {
        let size = self.buffer.push(event);
        trace!("ClickRecorder: buffer size {}", size);

        if size >= self.max_buffer
            && self
                .buffer
                .flush_pending
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::Relaxed)
                .is_ok()
        {
            let buffer = Arc::clone(&self.buffer);
            let sink = Arc::clone(&self.sink);
            let capacity = self.capacity;
            tokio::spawn(async move {
                if let Ok(_guard) = buffer.flush_lock.try_lock() {
                    Self::flush_buffer(&buffer, &sink, capacity).await;
                } else {
                    trace!("ClickRecorder: flush already in progress, skipping");
                }
                buffer.flush_pending.store(false, Ordering::Release);
            });
        }
    }

    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// 后台定时刷盘循环
    pub async fn start_background_task(&self) {
        loop {
            sleep(self.flush_interval).await;

            if let Ok(_guard) = self.buffer.flush_lock.try_lock() {
                Self::flush_buffer(&self.buffer, &self.sink, self.capacity).await;
            } else {
                trace!("ClickRecorder: flush already in progress, skipping scheduled flush");
            }
        }
    }

    /// 手动刷盘（等待进行中的刷盘完成）
    pub async fn flush(&self) {
        debug!("ClickRecorder: manual flush triggered");
        let _guard = self.buffer.flush_lock.lock().await;
        Self::flush_buffer(&self.buffer, &self.sink, self.capacity).await;
    }

    async fn flush_buffer(buffer: &EventBuffer, sink: &Arc<dyn ClickSink>, capacity: usize) {
        let events = buffer.drain();
        if events.is_empty() {
            return;
        }

        let count = events.len();
        match sink.write_events(events.clone()).await {
            Ok(()) => debug!("ClickRecorder: flushed {} events", count),
            Err(e) => {
                let dropped = buffer.restore(events, capacity);
                warn!(
                    "ClickRecorder: write_events failed: {}, {} events restored to buffer",
                    e,
                    count - dropped
                );
                if dropped > 0 {
                    warn!(
                        "ClickRecorder: buffer full ({}), dropped {} oldest events",
                        capacity, dropped
                    );
                }
            }
        }
    }
}
