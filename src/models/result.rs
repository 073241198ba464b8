use crate::error::UploadError;
use crate::models::file::{RemoteFile, UploadFile};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// 单个文件的最终结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileResult {
    pub index: usize,
    pub file: UploadFile,
    pub remote_file: Option<RemoteFile>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub success: bool,
    pub canceled: bool,
    pub error: Option<UploadError>,
}

/// 整个批次的结果
///
/// `file_results` 与输入文件一一对应；成功/失败两个列表互斥且覆盖全部文件
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchResult {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub file_results: Vec<FileResult>,
    pub success_file_results: Vec<FileResult>,
    pub error_file_results: Vec<FileResult>,
}

impl BatchResult {
    /// 是否全部成功（空批次视为全部成功）
    pub fn is_all_succeeded(&self) -> bool {
        self.error_file_results.is_empty()
    }

    /// 开始前被取消的文件数
    pub fn canceled_count(&self) -> usize {
        self.file_results.iter().filter(|r| r.canceled).count()
    }
}
