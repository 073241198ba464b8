//! 结果汇总器 - 业务能力层
//!
//! 在未完成文件数归零的那一刻汇总一次结果，之后不再重算

use crate::models::{BatchResult, FileResult, FileSlot};
use crate::services::StateTracker;
use chrono::{DateTime, Utc};
use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct ResultFinalizer {
    result: Option<BatchResult>,
}

impl ResultFinalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 批次完成且尚未汇总时生成结果，返回本次是否触发
    pub fn try_finalize(
        &mut self,
        tracker: &StateTracker,
        start_time: DateTime<Utc>,
        slots: &[FileSlot],
    ) -> bool {
        if self.result.is_some() || !tracker.is_complete() {
            return false;
        }

        let result = build_result(start_time, Utc::now(), slots);
        info!(
            "📦 批次结果已生成: 成功 {}, 失败 {}, 共 {}",
            result.success_file_results.len(),
            result.error_file_results.len(),
            result.file_results.len()
        );
        self.result = Some(result);
        true
    }

    pub fn result(&self) -> Option<&BatchResult> {
        self.result.as_ref()
    }
}

/// 按 `success` 标记把每个文件槽位划分为成功/失败两组
pub fn build_result(
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    slots: &[FileSlot],
) -> BatchResult {
    let file_results: Vec<FileResult> = slots.iter().map(file_result).collect();
    let (success_file_results, error_file_results): (Vec<_>, Vec<_>) =
        file_results.iter().cloned().partition(|r| r.success);

    BatchResult {
        start_time,
        end_time,
        file_results,
        success_file_results,
        error_file_results,
    }
}

fn file_result(slot: &FileSlot) -> FileResult {
    FileResult {
        index: slot.index,
        file: slot.file.clone(),
        remote_file: slot.remote_file.clone(),
        start_time: slot.start_time,
        end_time: slot.end_time,
        success: slot.success,
        canceled: slot.canceled,
        error: slot.error.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UploadError;
    use crate::models::UploadFile;

    fn slot(index: usize, success: bool) -> FileSlot {
        let mut slot = FileSlot::new(index, UploadFile::new(format!("f{index}")));
        slot.start_time = Some(Utc::now());
        slot.end_time = Some(Utc::now());
        slot.success = success;
        if !success {
            slot.error = Some(UploadError::start_failed("拒绝"));
        }
        slot
    }

    #[test]
    fn test_partition_is_exhaustive_and_disjoint() {
        let slots = vec![slot(0, true), slot(1, false), slot(2, true)];
        let result = build_result(Utc::now(), Utc::now(), &slots);

        assert_eq!(result.file_results.len(), 3);
        assert_eq!(result.success_file_results.len(), 2);
        assert_eq!(result.error_file_results.len(), 1);
        assert_eq!(result.error_file_results[0].index, 1);
        assert!(!result.is_all_succeeded());
    }

    #[test]
    fn test_fires_only_once_when_complete() {
        let mut tracker = StateTracker::new(1);
        let mut finalizer = ResultFinalizer::new();
        let slots = vec![slot(0, true)];

        assert!(!finalizer.try_finalize(&tracker, Utc::now(), &slots));
        assert!(finalizer.result().is_none());

        tracker.on_terminal(0);
        assert!(finalizer.try_finalize(&tracker, Utc::now(), &slots));
        let first = finalizer.result().cloned();

        assert!(!finalizer.try_finalize(&tracker, Utc::now(), &slots));
        assert_eq!(finalizer.result().cloned(), first);
    }
}
