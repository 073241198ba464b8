//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量上传的调度，是整个系统对外的唯一入口。
//!
//! ### `batch_uploader` - 批量上传编排器
//! - 接收一次批量上传请求（`UploadBatchRequest`）
//! - 冷启动：第一个订阅者出现时才创建状态并开始上传
//! - 通过有界任务池控制并发数量（零重试）
//! - 对外只暴露事件通道和取消控制
//! - 观察者全部离开时释放所有订阅
//!
//! ## 层次关系
//!
//! ```text
//! orchestrator::batch_uploader (处理 Vec<UploadFile>)
//!     ↓
//! workflow::FileTask (处理单个文件) + workflow::BatchState (共享状态)
//!     ↓
//! services (能力层：handler / aggregator / tracker / finalizer / emitter)
//!     ↓
//! infrastructure (基础设施：task_pool / subscriptions)
//! ```

pub mod batch_uploader;

pub use batch_uploader::{upload, BatchEvents, BatchUpload, CancelHandle, UploadBatchRequest};
