//! 进度聚合器 - 业务能力层
//!
//! 保存每个文件最近一次的进度样本，并把单文件百分比的变化量
//! 按权重 `100 / N` 累加成一个总体百分比

use crate::error::UploadError;
use crate::models::ProgressSample;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// 一次单文件进度更新
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressUpdate {
    pub latest_progress: Option<ProgressSample>,
    /// 该文件是否已进入终态
    pub terminal: bool,
    pub error: Option<UploadError>,
}

impl ProgressUpdate {
    /// 非终态的进度样本
    pub fn sample(sample: ProgressSample) -> Self {
        Self {
            latest_progress: Some(sample),
            ..Default::default()
        }
    }

    /// 成功结束或开始前取消
    pub fn terminal() -> Self {
        Self {
            terminal: true,
            ..Default::default()
        }
    }

    /// 以错误结束
    pub fn failed(error: UploadError) -> Self {
        Self {
            terminal: true,
            error: Some(error),
            ..Default::default()
        }
    }
}

/// 进度聚合器
#[derive(Debug, Clone)]
pub struct ProgressAggregator {
    /// 单个文件最多贡献的总体百分点
    weight: f64,
    percent_by_index: HashMap<usize, f64>,
    latest_by_index: BTreeMap<usize, ProgressSample>,
    overall: f64,
}

impl ProgressAggregator {
    pub fn new(total_files: usize) -> Self {
        let weight = if total_files == 0 {
            0.0
        } else {
            100.0 / total_files as f64
        };
        Self {
            weight,
            percent_by_index: HashMap::new(),
            latest_by_index: BTreeMap::new(),
            overall: 0.0,
        }
    }

    /// 折算一次更新，返回新的总体进度
    ///
    /// 终态更新强制把该文件视为 100%，保证每个文件最终都贡献满权重
    pub fn update(&mut self, index: usize, update: ProgressUpdate) -> f64 {
        let next_percent = if update.terminal {
            100.0
        } else {
            update
                .latest_progress
                .as_ref()
                .and_then(ProgressSample::effective_progress)
                .unwrap_or(0.0)
                * 100.0
        };

        let previous_percent = self.percent_by_index.insert(index, next_percent).unwrap_or(0.0);
        let delta = next_percent - previous_percent;
        self.overall += delta * self.weight / 100.0;

        if let Some(sample) = update.latest_progress {
            self.latest_by_index.insert(index, sample);
        }

        if let Some(error) = update.error {
            let entry = self.latest_by_index.entry(index).or_default();
            entry.failed = Some(true);
            entry.error = Some(error.to_string());
        }

        debug!(
            "文件 #{} 进度 {:.1}% (变化 {:+.1}), 总体 {:.2}%",
            index, next_percent, delta, self.overall
        );

        self.overall
    }

    /// 当前累加出的总体进度（未截断）
    pub fn overall(&self) -> f64 {
        self.overall
    }

    pub fn latest_progress(&self) -> &BTreeMap<usize, ProgressSample> {
        &self.latest_by_index
    }
}
