//! 事件发射器 - 业务能力层
//!
//! 每次状态变化后组装一份不可变快照，推送到"重放最近一条"的多播通道

use crate::models::{BatchEvent, BatchResult, FileSlot};
use crate::services::{ProgressAggregator, StateTracker};
use tokio::sync::broadcast;
use tracing::trace;

/// 默认的事件通道容量
pub const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// 重放最近一条快照的多播发射器
///
/// 新的订阅者先拿到 `last`，再接收之后的所有快照
#[derive(Debug)]
pub struct EventEmitter {
    sender: broadcast::Sender<BatchEvent>,
    last: Option<BatchEvent>,
}

impl EventEmitter {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender, last: None }
    }

    /// 推送快照并保留为最近一条
    pub fn emit(&mut self, event: BatchEvent) {
        trace!(
            "推送快照: 未完成 {}, 进行中 {}, 已完成 {}, 总体 {:.2}%",
            event.incomplete_file_count,
            event.active_file_count,
            event.done_file_count,
            event.overall_progress
        );
        // 没有接收者时发送失败，最近一条仍然保留给后来的订阅者
        let _ = self.sender.send(event.clone());
        self.last = Some(event);
    }

    /// 订阅：返回需要重放的最近快照和后续快照的接收端
    pub fn subscribe(&self) -> (Option<BatchEvent>, broadcast::Receiver<BatchEvent>) {
        (self.last.clone(), self.sender.subscribe())
    }

    pub fn last(&self) -> Option<&BatchEvent> {
        self.last.as_ref()
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::new(EVENT_CHANNEL_CAPACITY)
    }
}

/// 由当前状态组装一份快照
///
/// 总体进度限制在 0..=100，批次完成后固定为 100
pub fn assemble(
    slots: &[FileSlot],
    aggregator: &ProgressAggregator,
    tracker: &StateTracker,
    result: Option<&BatchResult>,
) -> BatchEvent {
    let is_complete = tracker.is_complete();
    let overall_progress = if is_complete {
        100.0
    } else {
        aggregator.overall().clamp(0.0, 100.0)
    };

    BatchEvent {
        all_files: slots.to_vec(),
        is_complete,
        overall_progress,
        upload_progress: aggregator.latest_progress().clone(),
        incomplete_file_count: tracker.incomplete_count(),
        active_file_count: tracker.active_count(),
        done_file_count: tracker.done_count(),
        result: if is_complete { result.cloned() } else { None },
    }
}
