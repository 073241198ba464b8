//! 单文件上传任务 - 流程层
//!
//! 把"一个文件 + 它的索引"接到外部处理器上，把处理器的事件和失败统一转成
//! 批次状态上的变更。任务本身永远不向外抛出错误，只返回一个结果值。
//!
//! 流程：
//! 1. 批次已取消 → 记为开始前取消，不调用处理器
//! 2. 调用处理器开始上传，失败或 panic 都记为失败（不重试）
//! 3. 进入 active，订阅进度通道直到通道关闭

use crate::error::UploadError;
use crate::infrastructure::task_pool::panic_message;
use crate::infrastructure::SubscriptionRegistry;
use crate::models::UploadFile;
use crate::services::{ProgressStream, StartedUpload, UploadHandler};
use crate::workflow::batch_state::SharedBatchState;
use crate::workflow::file_ctx::FileCtx;
use chrono::Utc;
use futures::{FutureExt, StreamExt};
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// 单个文件任务的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    /// 进度通道正常关闭
    Succeeded,
    /// 开始失败或通道以错误关闭
    Failed,
    /// 开始前批次已被取消
    Canceled,
    /// 观察者离开，进度订阅被释放，结果不再记录
    Detached,
}

/// 单文件上传任务
#[derive(Clone)]
pub struct FileTask {
    files: Arc<[UploadFile]>,
    handler: Arc<dyn UploadHandler>,
    state: SharedBatchState,
    canceled: Arc<AtomicBool>,
    registry: SubscriptionRegistry,
}

impl FileTask {
    pub fn new(
        files: Arc<[UploadFile]>,
        handler: Arc<dyn UploadHandler>,
        state: SharedBatchState,
        canceled: Arc<AtomicBool>,
        registry: SubscriptionRegistry,
    ) -> Self {
        Self {
            files,
            handler,
            state,
            canceled,
            registry,
        }
    }

    pub async fn run(&self, index: usize) -> FileOutcome {
        let Some(file) = self.files.get(index) else {
            error!("文件索引 {} 超出范围 (共 {} 个)", index, self.files.len());
            return FileOutcome::Failed;
        };
        let ctx = FileCtx::new(index, &file.name);

        if self.canceled.load(Ordering::SeqCst) {
            info!("{} ⏹️ 批次已取消，跳过上传", ctx);
            self.state.with(|state| state.mark_canceled(index));
            return FileOutcome::Canceled;
        }

        let started_at = Utc::now();
        info!("{} 📤 开始上传", ctx);

        let start = AssertUnwindSafe(async { self.handler.upload_file(file).await })
            .catch_unwind()
            .await;
        let started = match start {
            Ok(Ok(started)) => started,
            Ok(Err(e)) => {
                warn!("{} ❌ 上传启动失败: {}", ctx, e);
                self.state
                    .with(|state| state.mark_start_failed(index, started_at, e));
                return FileOutcome::Failed;
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!("{} ❌ 处理器启动时发生 panic: {}", ctx, message);
                self.state.with(|state| {
                    state.mark_start_failed(index, started_at, UploadError::start_failed(message))
                });
                return FileOutcome::Failed;
            }
        };

        let StartedUpload {
            remote_file,
            control,
            progress,
        } = started;
        debug!("{} 远端对象: {}", ctx, remote_file.key);
        self.state
            .with(|state| state.mark_active(index, started_at, remote_file, control));

        let attachment = tokio::spawn(watch_progress(
            ctx.clone(),
            progress,
            self.state.clone(),
        ));
        self.registry.add(attachment.abort_handle());

        match attachment.await {
            Ok(outcome) => outcome,
            Err(e) if e.is_cancelled() => {
                debug!("{} 进度订阅已释放", ctx);
                FileOutcome::Detached
            }
            Err(e) => {
                error!("{} 进度处理异常: {}", ctx, e);
                self.state.with(|state| {
                    state.mark_finished(index, Err(UploadError::transfer_failed(e.to_string())))
                });
                FileOutcome::Failed
            }
        }
    }
}

/// 消费单个文件的进度通道，直到它关闭
///
/// 终态更新在这里写入状态，之后任务才算结束
async fn watch_progress(ctx: FileCtx, mut progress: ProgressStream, state: SharedBatchState) -> FileOutcome {
    let index = ctx.index;

    while let Some(item) = progress.next().await {
        match item {
            Ok(sample) => {
                debug!("{} 进度样本: {:?}", ctx, sample.effective_progress());
                state.with(|state| state.record_progress(index, sample));
            }
            Err(e) => {
                warn!("{} ❌ 上传失败: {}", ctx, e);
                state.with(|state| state.mark_finished(index, Err(e)));
                return FileOutcome::Failed;
            }
        }
    }

    info!("{} ✅ 上传完成", ctx);
    state.with(|state| state.mark_finished(index, Ok(())));
    FileOutcome::Succeeded
}
