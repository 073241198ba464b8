//! 批次共享状态 - 流程层
//!
//! 文件槽位、进度聚合器、状态追踪器、结果汇总器和事件发射器放在同一把锁后面。
//! 每次变更都在锁内完成，并在同一把锁内推送快照，因此不同文件的事件不会互相竞争，
//! 订阅者也总能拿到一致的"最近快照 + 后续快照"

use crate::error::UploadError;
use crate::models::{BatchEvent, BatchResult, FileSlot, ProgressSample, RemoteFile, UploadFile};
use crate::services::event_emitter::{self, EventEmitter};
use crate::services::{ProgressAggregator, ProgressUpdate, ResultFinalizer, StateTracker, UploadControl};
use crate::utils::logging;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tracing::warn;

pub struct BatchState {
    start_time: DateTime<Utc>,
    slots: Vec<FileSlot>,
    controls: Vec<Option<Arc<dyn UploadControl>>>,
    aggregator: ProgressAggregator,
    tracker: StateTracker,
    finalizer: ResultFinalizer,
    emitter: EventEmitter,
}

impl BatchState {
    /// 为每个文件创建槽位并推送初始快照（空批次此时即已完成）
    pub fn new(files: &[UploadFile], event_capacity: usize) -> Self {
        let total = files.len();
        let mut state = Self {
            start_time: Utc::now(),
            slots: files
                .iter()
                .enumerate()
                .map(|(index, file)| FileSlot::new(index, file.clone()))
                .collect(),
            controls: vec![None; total],
            aggregator: ProgressAggregator::new(total),
            tracker: StateTracker::new(total),
            finalizer: ResultFinalizer::new(),
            emitter: EventEmitter::new(event_capacity),
        };
        state.settle();
        state
    }

    /// 开始前取消：起止时间都记为现在，不调用处理器
    pub fn mark_canceled(&mut self, index: usize) {
        let now = Utc::now();
        let Some(slot) = self.open_slot(index) else {
            return;
        };
        slot.start_time = Some(now);
        slot.end_time = Some(now);
        slot.canceled = true;
        slot.success = false;

        self.settle_terminal(index, ProgressUpdate::terminal());
    }

    /// 处理器连开始都失败了；开始时间依然记录
    pub fn mark_start_failed(&mut self, index: usize, started_at: DateTime<Utc>, error: UploadError) {
        let Some(slot) = self.open_slot(index) else {
            return;
        };
        slot.start_time = Some(started_at);
        slot.end_time = Some(Utc::now());
        slot.success = false;
        slot.error = Some(error.clone());

        self.settle_terminal(index, ProgressUpdate::failed(error));
    }

    /// 上传已开始：记录远端引用和控制句柄，进入 active
    pub fn mark_active(
        &mut self,
        index: usize,
        started_at: DateTime<Utc>,
        remote_file: RemoteFile,
        control: Arc<dyn UploadControl>,
    ) {
        let Some(slot) = self.open_slot(index) else {
            return;
        };
        slot.start_time = Some(started_at);
        slot.remote_file = Some(remote_file);
        self.controls[index] = Some(control);

        self.tracker.on_start(index);
        self.settle();
    }

    /// 非终态的进度样本
    pub fn record_progress(&mut self, index: usize, sample: ProgressSample) {
        if self.open_slot(index).is_none() {
            return;
        }
        self.aggregator.update(index, ProgressUpdate::sample(sample));
        self.settle();
    }

    /// 进度通道关闭：`Ok` 为正常关闭（成功），`Err` 为以错误关闭（失败）
    pub fn mark_finished(&mut self, index: usize, outcome: Result<(), UploadError>) {
        let Some(slot) = self.open_slot(index) else {
            return;
        };
        slot.end_time = Some(Utc::now());

        let update = match outcome {
            Ok(()) => {
                slot.success = true;
                ProgressUpdate::terminal()
            }
            Err(error) => {
                slot.success = false;
                slot.error = Some(error.clone());
                ProgressUpdate::failed(error)
            }
        };

        self.settle_terminal(index, update);
    }

    pub fn subscribe(&self) -> (Option<BatchEvent>, broadcast::Receiver<BatchEvent>) {
        self.emitter.subscribe()
    }

    pub fn latest(&self) -> Option<BatchEvent> {
        self.emitter.last().cloned()
    }

    pub fn is_complete(&self) -> bool {
        self.tracker.is_complete()
    }

    pub fn result(&self) -> Option<&BatchResult> {
        self.finalizer.result()
    }

    pub fn control(&self, index: usize) -> Option<Arc<dyn UploadControl>> {
        self.controls.get(index).cloned().flatten()
    }

    /// 取出尚未进入终态的槽位；终态之后的任何迁移都被忽略
    fn open_slot(&mut self, index: usize) -> Option<&mut FileSlot> {
        let total = self.slots.len();
        match self.slots.get_mut(index) {
            Some(slot) if !slot.is_terminal() => Some(slot),
            Some(_) => {
                warn!("文件 #{} 已处于终态，忽略后续状态变更", index + 1);
                None
            }
            None => {
                warn!("文件索引 {} 超出范围 (共 {} 个)", index, total);
                None
            }
        }
    }

    /// 把所有尚未进入终态的文件记为失败，保证批次一定能完成
    ///
    /// 只在调度本身异常终止时使用，返回被关闭的文件数
    pub fn fail_open_slots(&mut self, error: UploadError) -> usize {
        let open: Vec<usize> = self
            .slots
            .iter()
            .filter(|slot| !slot.is_terminal())
            .map(|slot| slot.index)
            .collect();

        for &index in &open {
            self.mark_finished(index, Err(error.clone()));
        }
        open.len()
    }

    fn settle_terminal(&mut self, index: usize, update: ProgressUpdate) {
        self.aggregator.update(index, update);
        self.tracker.on_terminal(index);
        self.settle();
    }

    /// 每次变更之后：必要时汇总结果，然后推送快照
    fn settle(&mut self) {
        if self
            .finalizer
            .try_finalize(&self.tracker, self.start_time, &self.slots)
        {
            if let Some(result) = self.finalizer.result() {
                logging::log_batch_complete(result);
            }
        }

        let event = event_emitter::assemble(
            &self.slots,
            &self.aggregator,
            &self.tracker,
            self.finalizer.result(),
        );
        self.emitter.emit(event);
    }
}

/// 在任务之间共享的批次状态
#[derive(Clone)]
pub struct SharedBatchState {
    inner: Arc<Mutex<BatchState>>,
}

impl SharedBatchState {
    pub fn new(state: BatchState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(state)),
        }
    }

    /// 在锁内执行一次同步操作；锁中毒时沿用内部数据
    pub fn with<R>(&self, f: impl FnOnce(&mut BatchState) -> R) -> R {
        let mut guard = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard)
    }
}
