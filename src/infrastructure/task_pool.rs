//! 有界任务池 - 基础设施层
//!
//! 只负责"最多同时跑 N 个任务"这一能力，不认识文件也不认识上传

use crate::error::TaskPoolError;
use futures::FutureExt;
use std::fmt::Display;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// 任务池参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskPoolOptions {
    /// 同时运行的最大任务数（0 视为 1）
    pub max_parallel_tasks: usize,
    /// 单个任务失败后允许的重试次数
    pub retries_allowed: usize,
}

impl TaskPoolOptions {
    pub fn new(max_parallel_tasks: usize) -> Self {
        Self {
            max_parallel_tasks,
            retries_allowed: 0,
        }
    }

    pub fn with_retries(mut self, retries_allowed: usize) -> Self {
        self.retries_allowed = retries_allowed;
        self
    }
}

/// 以有界并发运行所有任务
///
/// 按输入顺序获取信号量许可后再 spawn，因此排队的任务按顺序被放行。
/// 所有任务完成后返回，结果与输入顺序一一对应。
/// 任务返回 `Err` 时按 `retries_allowed` 重试；任务 panic 视为任务池缺陷。
pub async fn run_bounded<T, R, E, F, Fut>(
    items: Vec<T>,
    task_fn: F,
    options: TaskPoolOptions,
) -> Result<Vec<Result<R, E>>, TaskPoolError>
where
    T: Clone + Send + 'static,
    R: Send + 'static,
    E: Display + Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
{
    let total = items.len();
    let semaphore = Arc::new(Semaphore::new(options.max_parallel_tasks.max(1)));
    let task_fn = Arc::new(task_fn);
    let mut join_set = JoinSet::new();

    debug!(
        "任务池启动: {} 个任务, 最大并发 {}, 重试 {} 次",
        total, options.max_parallel_tasks, options.retries_allowed
    );

    for (position, item) in items.into_iter().enumerate() {
        let permit = semaphore.clone().acquire_owned().await?;
        let task_fn = task_fn.clone();
        let retries_allowed = options.retries_allowed;

        join_set.spawn(async move {
            let _permit = permit;
            let mut attempt = 0;
            loop {
                let outcome = AssertUnwindSafe(task_fn(item.clone())).catch_unwind().await;
                match outcome {
                    Ok(Ok(value)) => return (position, Ok(Ok(value))),
                    Ok(Err(e)) if attempt < retries_allowed => {
                        attempt += 1;
                        warn!("任务 #{} 第 {} 次失败: {}，准备重试", position, attempt, e);
                    }
                    Ok(Err(e)) => return (position, Ok(Err(e))),
                    Err(payload) => return (position, Err(panic_message(payload.as_ref()))),
                }
            }
        });
    }

    let mut outcomes: Vec<Option<Result<R, E>>> = (0..total).map(|_| None).collect();
    while let Some(joined) = join_set.join_next().await {
        match joined? {
            (position, Ok(outcome)) => outcomes[position] = Some(outcome),
            (position, Err(message)) => {
                return Err(TaskPoolError::TaskPanicked { position, message });
            }
        }
    }

    debug!("任务池完成: {} 个任务", total);
    Ok(outcomes.into_iter().flatten().collect())
}

/// 取出 panic 载荷中的文本
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "未知 panic".to_string()
    }
}
