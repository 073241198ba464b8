use crate::error::ConfigError;
use crate::models::UploadFile;
use crate::orchestrator::UploadBatchRequest;
use crate::services::UploadHandler;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

/// 默认的最大并行上传数
pub const DEFAULT_MAX_PARALLEL_UPLOADS: usize = 3;

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 同时上传的文件数量
    pub max_parallel_uploads: usize,
    /// 待上传文件所在目录
    pub source_folder: String,
    /// 上传目标目录（本地演示用的对象存储）
    pub target_folder: String,
    /// 每次读取/写入的块大小（字节）
    pub chunk_size: usize,
    /// 每个块之间的等待时间（毫秒），用于观察进度
    pub chunk_delay_ms: u64,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 批次结果输出文件（JSON）
    pub result_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_parallel_uploads: DEFAULT_MAX_PARALLEL_UPLOADS,
            source_folder: "upload_source".to_string(),
            target_folder: "upload_target".to_string(),
            chunk_size: 64 * 1024,
            chunk_delay_ms: 0,
            verbose_logging: false,
            result_file: "upload_result.json".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            max_parallel_uploads: std::env::var("MAX_PARALLEL_UPLOADS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_parallel_uploads),
            source_folder: std::env::var("UPLOAD_SOURCE_FOLDER").unwrap_or(default.source_folder),
            target_folder: std::env::var("UPLOAD_TARGET_FOLDER").unwrap_or(default.target_folder),
            chunk_size: std::env::var("UPLOAD_CHUNK_SIZE").ok().and_then(|v| v.parse().ok()).unwrap_or(default.chunk_size),
            chunk_delay_ms: std::env::var("UPLOAD_CHUNK_DELAY_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.chunk_delay_ms),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            result_file: std::env::var("UPLOAD_RESULT_FILE").unwrap_or(default.result_file),
        }
    }

    /// 从 TOML 文件加载配置，缺失的字段使用默认值
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content).map_err(|source| ConfigError::TomlParseFailed {
            path: path.display().to_string(),
            source,
        })
    }

    fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// 严格读取一个数值型环境变量
    ///
    /// 与 `from_env` 的静默回退不同，这里会把无法解析的值报告出来
    pub fn parse_env_var<T: std::str::FromStr>(var_name: &str) -> Result<Option<T>, ConfigError> {
        match std::env::var(var_name) {
            Ok(value) => value
                .parse()
                .map(Some)
                .map_err(|_| ConfigError::EnvVarParseFailed {
                    var_name: var_name.to_string(),
                    value,
                    expected_type: std::any::type_name::<T>().to_string(),
                }),
            Err(_) => Ok(None),
        }
    }

    /// 按当前配置构建一次批量上传请求
    pub fn batch_request(
        &self,
        files: Vec<UploadFile>,
        handler: Arc<dyn UploadHandler>,
    ) -> UploadBatchRequest {
        UploadBatchRequest::new(files, handler).with_max_parallel_uploads(self.max_parallel_uploads)
    }
}
