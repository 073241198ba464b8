use serde::{Deserialize, Serialize};

/// 处理器上报的单次进度样本
///
/// 所有字段都是可选的，处理器只需要填写它知道的部分
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressSample {
    pub bytes_transferred: Option<u64>,
    pub total_bytes: Option<u64>,
    /// 0..1 之间的完成比例
    pub progress: Option<f64>,
    pub failed: Option<bool>,
    pub error: Option<String>,
}

impl ProgressSample {
    /// 只带完成比例的样本
    pub fn fraction(progress: f64) -> Self {
        Self {
            progress: Some(progress),
            ..Default::default()
        }
    }

    /// 由字节数构造样本，并同时计算完成比例
    pub fn bytes(bytes_transferred: u64, total_bytes: u64) -> Self {
        Self {
            bytes_transferred: Some(bytes_transferred),
            total_bytes: Some(total_bytes),
            progress: Some(progress_from_bytes(bytes_transferred, total_bytes)),
            ..Default::default()
        }
    }

    /// 有效的完成比例
    ///
    /// 优先使用 `progress`，否则尝试由字节数推算；结果限制在 0..=1
    pub fn effective_progress(&self) -> Option<f64> {
        let raw = match (self.progress, self.bytes_transferred, self.total_bytes) {
            (Some(p), _, _) => p,
            (None, Some(done), Some(total)) => progress_from_bytes(done, total),
            _ => return None,
        };
        if raw.is_nan() {
            return None;
        }
        Some(raw.clamp(0.0, 1.0))
    }
}

/// 由字节数计算完成比例，空文件视为已完成
pub fn progress_from_bytes(bytes_transferred: u64, total_bytes: u64) -> f64 {
    if total_bytes == 0 {
        return 1.0;
    }
    (bytes_transferred as f64 / total_bytes as f64).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_progress_prefers_fraction() {
        let sample = ProgressSample {
            bytes_transferred: Some(10),
            total_bytes: Some(100),
            progress: Some(0.5),
            ..Default::default()
        };
        assert_eq!(sample.effective_progress(), Some(0.5));
    }

    #[test]
    fn test_effective_progress_from_bytes() {
        let sample = ProgressSample {
            bytes_transferred: Some(25),
            total_bytes: Some(100),
            ..Default::default()
        };
        assert_eq!(sample.effective_progress(), Some(0.25));
        assert_eq!(ProgressSample::bytes(0, 0).effective_progress(), Some(1.0));
    }

    #[test]
    fn test_effective_progress_clamped() {
        assert_eq!(ProgressSample::fraction(1.7).effective_progress(), Some(1.0));
        assert_eq!(ProgressSample::fraction(-0.3).effective_progress(), Some(0.0));
        assert_eq!(ProgressSample::default().effective_progress(), None);
    }
}
