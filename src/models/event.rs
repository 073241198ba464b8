//! 批次事件快照

use crate::error::UploadError;
use crate::models::file::{RemoteFile, UploadFile};
use crate::models::progress::ProgressSample;
use crate::models::result::BatchResult;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// 单个文件的簿记记录
///
/// 批次开始时为每个文件创建一条，按稳定索引定位，永不删除
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileSlot {
    pub index: usize,
    pub file: UploadFile,
    pub remote_file: Option<RemoteFile>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub success: bool,
    pub error: Option<UploadError>,
    pub canceled: bool,
}

impl FileSlot {
    pub fn new(index: usize, file: UploadFile) -> Self {
        Self {
            index,
            file,
            remote_file: None,
            start_time: None,
            end_time: None,
            success: false,
            error: None,
            canceled: false,
        }
    }

    /// 是否已进入终态（成功 / 失败 / 开始前取消）
    pub fn is_terminal(&self) -> bool {
        self.end_time.is_some()
    }
}

/// 每次状态变化后推送的不可变快照
///
/// `result` 有值 ⟺ `is_complete`；`is_complete` ⟺ `incomplete_file_count == 0`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchEvent {
    pub all_files: Vec<FileSlot>,
    pub is_complete: bool,
    /// 0..=100 的加权总体进度
    pub overall_progress: f64,
    /// 每个文件最近一次的进度样本（稀疏）
    pub upload_progress: BTreeMap<usize, ProgressSample>,
    pub incomplete_file_count: usize,
    pub active_file_count: usize,
    pub done_file_count: usize,
    pub result: Option<BatchResult>,
}
