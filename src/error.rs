use serde::Serialize;
use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 单个文件上传错误
    #[error("上传错误: {0}")]
    Upload(#[from] UploadError),
    /// 任务池错误
    #[error("任务池错误: {0}")]
    Pool(#[from] TaskPoolError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 文件操作错误
    #[error("文件错误 ({path}): {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// 单个文件的上传错误
///
/// 这些错误永远不会从编排器向外抛出，而是作为数据记录在
/// `FileSlot.error` / `FileResult.error` 中，因此需要 `Clone` 与 `Serialize`。
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum UploadError {
    /// 处理器连上传都没能开始
    #[error("上传启动失败: {0}")]
    StartFailed(String),
    /// 传输过程中进度通道以错误关闭
    #[error("传输失败: {0}")]
    TransferFailed(String),
    /// 本地源文件不存在
    #[error("源文件不存在: {0}")]
    SourceMissing(String),
    /// 处理器自身的取消导致中止
    #[error("上传已中止: {0}")]
    Aborted(String),
}

impl UploadError {
    pub fn start_failed(msg: impl Into<String>) -> Self {
        UploadError::StartFailed(msg.into())
    }

    pub fn transfer_failed(msg: impl Into<String>) -> Self {
        UploadError::TransferFailed(msg.into())
    }
}

/// 任务池错误
///
/// 只有任务池本身的缺陷才会产生此类错误
#[derive(Debug, Error)]
pub enum TaskPoolError {
    /// 并发信号量被意外关闭
    #[error("并发信号量已关闭")]
    SemaphoreClosed(#[from] tokio::sync::AcquireError),
    /// 任务发生 panic
    #[error("任务 #{position} 发生 panic: {message}")]
    TaskPanicked { position: usize, message: String },
    /// 等待任务结束失败
    #[error("等待任务结束失败: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 读取配置文件失败
    #[error("读取配置文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建文件操作错误
    pub fn file(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File {
            path: path.into(),
            source,
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
