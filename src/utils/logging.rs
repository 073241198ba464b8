//! 日志工具模块
//!
//! 提供日志初始化、批次日志格式化和输出的辅助函数

use crate::config::Config;
use crate::models::BatchResult;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// 初始化全局日志
///
/// `RUST_LOG` 优先；否则默认 `info`，开启详细日志时为 `debug`。
/// 重复调用不会报错（测试中常见）
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
///
/// # 参数
/// - `config`: 当前配置
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 批量并行上传模式");
    info!("📊 最大并行上传数: {}", config.max_parallel_uploads);
    info!("📁 源目录: {}", config.source_folder);
    info!("🎯 目标目录: {}", config.target_folder);
    info!("{}", "=".repeat(60));
}

/// 记录批次开始信息
///
/// # 参数
/// - `total`: 文件总数
/// - `max_parallel`: 最大并行数
pub fn log_batch_start(total: usize, max_parallel: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📦 开始批量上传: 共 {} 个文件", total);
    info!("📋 最多同时上传 {} 个", max_parallel);
    info!("{}", "=".repeat(60));
}

/// 记录批次完成信息
pub fn log_batch_complete(result: &BatchResult) {
    let elapsed = result.end_time - result.start_time;
    info!("\n{}", "─".repeat(60));
    info!(
        "✓ 批次完成: 成功 {}/{}，耗时 {} 毫秒",
        result.success_file_results.len(),
        result.file_results.len(),
        elapsed.num_milliseconds()
    );
    info!("{}", "─".repeat(60));
}

/// 打印最终统计信息
///
/// # 参数
/// - `result`: 批次结果
/// - `result_file_path`: 结果文件路径
pub fn print_final_stats(result: &BatchResult, result_file_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部上传完成统计");
    info!(
        "完成时间: {}",
        result.end_time.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", result.success_file_results.len(), result.file_results.len());
    info!("⏹️ 取消: {}", result.canceled_count());
    info!("❌ 失败: {}", result.error_file_results.len() - result.canceled_count());
    for failed in result.error_file_results.iter().filter(|r| !r.canceled) {
        if let Some(error) = &failed.error {
            warn!("  - {}: {}", truncate_text(&failed.file.name, 40), error);
        }
    }
    info!("{}", "=".repeat(60));
    info!("\n结果已保存至: {}", result_file_path);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
