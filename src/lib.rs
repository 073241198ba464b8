//! # Batch Upload
//!
//! 一个有界并发的多文件批量上传编排库
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 只提供调度与释放能力，不认识文件
//! - `task_pool` - 有界并发任务池（信号量 + JoinSet）
//! - `SubscriptionRegistry` - 后台任务的统一释放登记表
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，每个能力只管一件事
//! - `UploadHandler` - 调用方提供的单文件上传处理器接口
//! - `ProgressAggregator` - 按权重累加总体进度
//! - `StateTracker` - incomplete / active / done 三个索引集合
//! - `ResultFinalizer` - 完成时汇总一次结果
//! - `EventEmitter` - 组装快照并推送到重放通道
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个文件"的完整上传流程
//! - `FileCtx` - 上下文封装（文件索引 + 文件名）
//! - `BatchState` - 所有共享状态放在同一把锁后
//! - `FileTask` - 流程编排（取消检查 → 开始上传 → 订阅进度 → 终态）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_uploader` - 冷启动、并发、取消与释放
//!
//! ## 使用方式
//!
//! ```no_run
//! use batch_upload::{upload, LocalDirHandler, UploadBatchRequest, UploadFile};
//! use std::sync::Arc;
//!
//! # async fn demo() {
//! let files = vec![UploadFile::new("a.txt").with_path("data/a.txt")];
//! let handler = Arc::new(LocalDirHandler::new("bucket"));
//! let batch = upload(UploadBatchRequest::new(files, handler).with_max_parallel_uploads(2));
//!
//! let mut events = batch.subscribe();
//! while let Some(event) = events.next().await {
//!     println!("{:.1}%", event.overall_progress);
//! }
//! # }
//! ```
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult, ConfigError, TaskPoolError, UploadError};
pub use models::{BatchEvent, BatchResult, FileResult, FileSlot, ProgressSample, RemoteFile, UploadFile};
pub use orchestrator::{upload, BatchEvents, BatchUpload, CancelHandle, UploadBatchRequest};
pub use services::{LocalDirHandler, ProgressStream, StartedUpload, UploadControl, UploadHandler};
pub use workflow::{FileCtx, FileOutcome};
