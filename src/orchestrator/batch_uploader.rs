//! 批量上传编排器 - 编排层
//!
//! ## 核心功能
//!
//! 1. **冷启动**：`upload()` 只保存请求，第一次 `subscribe()` 才创建文件槽位并开始上传
//! 2. **并发控制**：有界任务池按顺序放行最多 `max_parallel_uploads` 个文件任务
//! 3. **事件推送**：每次状态变化推送一份快照，新订阅者先收到最近一份
//! 4. **有界取消**：`cancel()` 只影响尚未开始的文件，已开始的上传自然结束
//! 5. **资源释放**：最后一个订阅者在完成前离开时，中止所有后台任务
//!
//! `subscribe()` 需要在 tokio 运行时中调用

use crate::config::DEFAULT_MAX_PARALLEL_UPLOADS;
use crate::error::UploadError;
use crate::infrastructure::{run_bounded, SubscriptionRegistry, TaskPoolOptions};
use crate::models::{BatchEvent, BatchResult, UploadFile};
use crate::services::event_emitter::EVENT_CHANNEL_CAPACITY;
use crate::services::{UploadControl, UploadHandler};
use crate::utils::logging;
use crate::workflow::{BatchState, FileOutcome, FileTask, SharedBatchState};
use futures::Stream;
use std::convert::Infallible;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, error, info, warn};

/// 一次批量上传请求，单次运行内不可变
#[derive(Clone)]
pub struct UploadBatchRequest {
    pub files: Vec<UploadFile>,
    pub handler: Arc<dyn UploadHandler>,
    pub max_parallel_uploads: usize,
}

impl UploadBatchRequest {
    pub fn new(files: Vec<UploadFile>, handler: Arc<dyn UploadHandler>) -> Self {
        Self {
            files,
            handler,
            max_parallel_uploads: DEFAULT_MAX_PARALLEL_UPLOADS,
        }
    }

    /// 设置最大并行上传数（0 视为 1）
    pub fn with_max_parallel_uploads(mut self, max_parallel_uploads: usize) -> Self {
        self.max_parallel_uploads = max_parallel_uploads.max(1);
        self
    }
}

/// 创建一次批量上传；在第一个订阅者出现之前不会做任何事
pub fn upload(request: UploadBatchRequest) -> BatchUpload {
    let UploadBatchRequest {
        files,
        handler,
        max_parallel_uploads,
    } = request;

    BatchUpload {
        shared: Arc::new(Shared {
            files: files.into(),
            handler,
            max_parallel_uploads: max_parallel_uploads.max(1),
            canceled: Arc::new(AtomicBool::new(false)),
            registry: SubscriptionRegistry::new(),
            state: OnceLock::new(),
            observers: AtomicUsize::new(0),
        }),
    }
}

struct Shared {
    files: Arc<[UploadFile]>,
    handler: Arc<dyn UploadHandler>,
    max_parallel_uploads: usize,
    canceled: Arc<AtomicBool>,
    registry: SubscriptionRegistry,
    state: OnceLock<SharedBatchState>,
    observers: AtomicUsize,
}

impl Shared {
    /// 创建批次状态并启动任务池
    fn start(&self) -> SharedBatchState {
        let total = self.files.len();
        logging::log_batch_start(total, self.max_parallel_uploads);

        let state = SharedBatchState::new(BatchState::new(&self.files, EVENT_CHANNEL_CAPACITY));

        if total == 0 {
            return state;
        }

        if self.canceled.load(Ordering::SeqCst) {
            warn!("⏹️ 批次在开始前已被取消，{} 个文件全部跳过", total);
            for index in 0..total {
                state.with(|state| state.mark_canceled(index));
            }
            return state;
        }

        self.spawn_driver(state.clone());
        state
    }

    fn spawn_driver(&self, state: SharedBatchState) {
        let task = FileTask::new(
            self.files.clone(),
            self.handler.clone(),
            state.clone(),
            self.canceled.clone(),
            self.registry.clone(),
        );
        let indices: Vec<usize> = (0..self.files.len()).collect();
        let options = TaskPoolOptions::new(self.max_parallel_uploads);

        let driver = tokio::spawn(async move {
            let outcomes = run_bounded(
                indices,
                move |index| {
                    let task = task.clone();
                    async move { Ok::<_, Infallible>(task.run(index).await) }
                },
                options,
            )
            .await;

            match outcomes {
                Ok(outcomes) => {
                    let count = |expected: FileOutcome| {
                        outcomes
                            .iter()
                            .filter(|o| matches!(o, Ok(outcome) if *outcome == expected))
                            .count()
                    };
                    debug!(
                        "任务池结束: 成功 {}, 失败 {}, 取消 {}, 释放 {}",
                        count(FileOutcome::Succeeded),
                        count(FileOutcome::Failed),
                        count(FileOutcome::Canceled),
                        count(FileOutcome::Detached)
                    );
                }
                Err(e) => {
                    error!("❌ 任务池异常终止: {}", e);
                    let closed = state.with(|state| {
                        state.fail_open_slots(UploadError::transfer_failed(format!("调度异常终止: {}", e)))
                    });
                    if closed > 0 {
                        warn!("⚠️ {} 个未结束的文件已记为失败", closed);
                    }
                }
            }
        });
        self.registry.add(driver.abort_handle());
    }

    fn is_complete(&self) -> bool {
        self.state
            .get()
            .map(|state| state.with(|state| state.is_complete()))
            .unwrap_or(false)
    }

    fn cancel(&self) {
        if self.is_complete() {
            debug!("批次已完成，忽略取消请求");
            return;
        }
        if !self.canceled.swap(true, Ordering::SeqCst) {
            info!("⏹️ 收到取消请求，尚未开始的文件将被跳过");
        }
    }

    fn detach_observer(&self) {
        if self.observers.fetch_sub(1, Ordering::SeqCst) != 1 {
            return;
        }
        if self.state.get().is_some() && !self.is_complete() {
            warn!("⚠️ 所有观察者已在完成前离开，释放全部订阅");
            self.registry.unsub();
        }
    }
}

/// 一次批量上传的外部接口：事件通道 + 取消控制
#[derive(Clone)]
pub struct BatchUpload {
    shared: Arc<Shared>,
}

impl BatchUpload {
    /// 订阅批次事件；第一次订阅会启动上传
    ///
    /// 返回的接收端先给出最近一份快照，再给出之后的每一份快照
    pub fn subscribe(&self) -> BatchEvents {
        self.shared.observers.fetch_add(1, Ordering::SeqCst);
        let state = self.shared.state.get_or_init(|| self.shared.start());
        let (pending, receiver) = state.with(|state| state.subscribe());

        BatchEvents {
            pending,
            receiver,
            finished: false,
            shared: self.shared.clone(),
        }
    }

    /// 取消尚未开始的文件；幂等，批次完成后无效
    pub fn cancel(&self) {
        self.shared.cancel();
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            shared: self.shared.clone(),
        }
    }

    /// 最近一份快照；尚未启动时为 `None`，不会触发启动
    pub fn latest(&self) -> Option<BatchEvent> {
        self.shared
            .state
            .get()
            .and_then(|state| state.with(|state| state.latest()))
    }

    /// 已开始文件的处理器控制句柄（暂停/继续/取消）
    pub fn upload_control(&self, index: usize) -> Option<Arc<dyn UploadControl>> {
        self.shared
            .state
            .get()
            .and_then(|state| state.with(|state| state.control(index)))
    }
}

/// 可以单独传递的取消句柄
#[derive(Clone)]
pub struct CancelHandle {
    shared: Arc<Shared>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.shared.cancel();
    }

    pub fn is_canceled(&self) -> bool {
        self.shared.canceled.load(Ordering::SeqCst)
    }
}

/// 批次事件接收端
///
/// 收到完成快照之后结束（`next()` 返回 `None`）。
/// 丢弃最后一个接收端且批次尚未完成时，释放所有后台任务
pub struct BatchEvents {
    pending: Option<BatchEvent>,
    receiver: broadcast::Receiver<BatchEvent>,
    finished: bool,
    shared: Arc<Shared>,
}

impl BatchEvents {
    pub async fn next(&mut self) -> Option<BatchEvent> {
        if let Some(event) = self.pending.take() {
            self.finished = event.is_complete;
            return Some(event);
        }
        if self.finished || self.shared.registry.is_disposed() {
            return None;
        }

        loop {
            match self.receiver.recv().await {
                Ok(event) => {
                    self.finished = event.is_complete;
                    return Some(event);
                }
                Err(RecvError::Lagged(skipped)) => {
                    debug!("事件接收落后，跳过 {} 份快照", skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// 一直读取到完成快照，返回批次结果
    pub async fn wait_for_result(mut self) -> Option<BatchResult> {
        while let Some(event) = self.next().await {
            if let Some(result) = event.result {
                return Some(result);
            }
        }
        None
    }

    pub fn into_stream(self) -> impl Stream<Item = BatchEvent> + Send + 'static {
        futures::stream::unfold(self, |mut events| async move {
            let event = events.next().await?;
            Some((event, events))
        })
    }
}

impl Drop for BatchEvents {
    fn drop(&mut self) {
        self.shared.detach_observer();
    }
}
