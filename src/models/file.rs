use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 待上传的文件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadFile {
    /// 文件名（用于日志和远端对象键）
    pub name: String,
    /// 本地路径（由处理器决定是否需要）
    pub path: Option<PathBuf>,
    /// 文件大小（字节）
    pub size: Option<u64>,
}

impl UploadFile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: None,
            size: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }
}

/// 远端文件引用，由处理器在上传开始时给出
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFile {
    /// 对象键
    pub key: String,
    /// 对象位置（URL 或目标路径）
    pub location: Option<String>,
}

impl RemoteFile {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            location: None,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}
