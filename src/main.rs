use anyhow::{Context, Result};
use batch_upload::models::load_upload_files;
use batch_upload::utils::logging;
use batch_upload::{upload, Config, LocalDirHandler};
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let mut config = match std::env::var("UPLOAD_CONFIG") {
        Ok(path) => Config::from_toml_file(&path)?,
        Err(_) => Config::from_env(),
    };
    if let Some(max_parallel) = Config::parse_env_var::<usize>("MAX_PARALLEL_UPLOADS")? {
        config.max_parallel_uploads = max_parallel;
    }

    // 初始化日志
    logging::init(config.verbose_logging);
    logging::log_startup(&config);

    // 扫描待上传文件
    info!("\n📁 正在扫描待上传的文件...");
    let files = load_upload_files(&config.source_folder)
        .await
        .context("扫描待上传文件失败")?;
    if files.is_empty() {
        warn!("⚠️ 没有找到待上传的文件，程序结束");
        return Ok(());
    }

    let handler = Arc::new(LocalDirHandler::from_config(&config));
    let batch = upload(config.batch_request(files, handler));
    let cancel = batch.cancel_handle();
    let mut events = batch.subscribe();

    let mut last_logged_percent = None;
    let mut final_result = None;
    loop {
        tokio::select! {
            event = events.next() => {
                let Some(event) = event else { break };

                let percent = event.overall_progress.floor() as u32;
                if last_logged_percent != Some(percent) {
                    info!(
                        "⏳ 总体进度 {}% (进行中 {}, 已完成 {}/{})",
                        percent,
                        event.active_file_count,
                        event.done_file_count,
                        event.all_files.len()
                    );
                    last_logged_percent = Some(percent);
                }

                if let Some(result) = event.result {
                    final_result = Some(result);
                }
            }
            _ = tokio::signal::ctrl_c(), if !cancel.is_canceled() => {
                warn!("⚠️ 收到中断信号，尚未开始的文件将被取消，进行中的上传会继续完成");
                cancel.cancel();
            }
        }
    }

    let Some(result) = final_result else {
        warn!("⚠️ 事件通道提前结束，未得到批次结果");
        return Ok(());
    };

    let json = serde_json::to_string_pretty(&result)?;
    tokio::fs::write(&config.result_file, json)
        .await
        .with_context(|| format!("无法写入结果文件: {}", config.result_file))?;

    logging::print_final_stats(&result, &config.result_file);

    Ok(())
}
