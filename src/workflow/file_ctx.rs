//! 文件上传上下文
//!
//! 封装"我正在上传批次中的第几个文件"这一信息

use crate::utils::logging::truncate_text;
use std::fmt::Display;

/// 文件上传上下文（仅用于日志）
#[derive(Debug, Clone)]
pub struct FileCtx {
    /// 文件在批次中的稳定索引（从0开始）
    pub index: usize,

    /// 文件名
    pub name: String,
}

impl FileCtx {
    pub fn new(index: usize, name: impl Into<String>) -> Self {
        Self {
            index,
            name: name.into(),
        }
    }
}

impl Display for FileCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[文件 #{} {}]", self.index + 1, truncate_text(&self.name, 40))
    }
}
