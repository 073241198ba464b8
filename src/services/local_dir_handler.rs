//! 本地目录上传处理器 - 业务能力层
//!
//! 把本地文件分块复制到目标目录，模拟一个对象存储。
//! 每写完一块上报一次字节进度，支持暂停/继续/取消

use crate::config::Config;
use crate::error::UploadError;
use crate::models::{ProgressSample, RemoteFile, UploadFile};
use crate::services::upload_handler::{StartedUpload, UploadControl, UploadHandler};
use futures::channel::mpsc::{self, UnboundedSender};
use futures::future::BoxFuture;
use futures::{FutureExt, StreamExt};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::Notify;
use tracing::debug;

/// 本地目录上传处理器
#[derive(Debug, Clone)]
pub struct LocalDirHandler {
    target_dir: PathBuf,
    chunk_size: usize,
    chunk_delay: Duration,
}

impl LocalDirHandler {
    pub fn new(target_dir: impl Into<PathBuf>) -> Self {
        Self {
            target_dir: target_dir.into(),
            chunk_size: 64 * 1024,
            chunk_delay: Duration::ZERO,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.target_folder)
            .with_chunk_size(config.chunk_size)
            .with_chunk_delay(Duration::from_millis(config.chunk_delay_ms))
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn with_chunk_delay(mut self, chunk_delay: Duration) -> Self {
        self.chunk_delay = chunk_delay;
        self
    }
}

impl UploadHandler for LocalDirHandler {
    fn upload_file(&self, file: &UploadFile) -> BoxFuture<'static, Result<StartedUpload, UploadError>> {
        let file = file.clone();
        let handler = self.clone();

        async move {
            let source = file
                .path
                .clone()
                .ok_or_else(|| UploadError::start_failed(format!("{} 没有本地路径", file.name)))?;

            let metadata = fs::metadata(&source)
                .await
                .map_err(|_| UploadError::SourceMissing(source.display().to_string()))?;

            fs::create_dir_all(&handler.target_dir).await.map_err(|e| {
                UploadError::start_failed(format!(
                    "无法创建目标目录 {}: {}",
                    handler.target_dir.display(),
                    e
                ))
            })?;

            let destination = handler.target_dir.join(&file.name);
            let reader = fs::File::open(&source)
                .await
                .map_err(|e| UploadError::start_failed(format!("无法打开 {}: {}", source.display(), e)))?;
            let writer = fs::File::create(&destination)
                .await
                .map_err(|e| UploadError::start_failed(format!("无法创建 {}: {}", destination.display(), e)))?;

            let control = Arc::new(CopyControl::default());
            let (tx, rx) = mpsc::unbounded();

            let job = CopyJob {
                reader,
                writer,
                total_bytes: metadata.len(),
                chunk_size: handler.chunk_size,
                chunk_delay: handler.chunk_delay,
                control: control.clone(),
            };
            tokio::spawn(job.run(tx));

            let remote_file =
                RemoteFile::new(file.name.clone()).with_location(destination.display().to_string());
            Ok(StartedUpload::new(remote_file, control, rx.boxed()))
        }
        .boxed()
    }
}

/// 复制任务的控制标记
#[derive(Debug, Default)]
struct CopyControl {
    paused: AtomicBool,
    canceled: AtomicBool,
    resumed: Notify,
}

impl CopyControl {
    async fn wait_while_paused(&self) {
        loop {
            let resumed = self.resumed.notified();
            if !self.paused.load(Ordering::SeqCst) || self.canceled.load(Ordering::SeqCst) {
                return;
            }
            resumed.await;
        }
    }
}

impl UploadControl for CopyControl {
    fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
        self.resumed.notify_waiters();
    }

    fn cancel(&self) {
        self.canceled.store(true, Ordering::SeqCst);
        self.resumed.notify_waiters();
    }
}

struct CopyJob {
    reader: fs::File,
    writer: fs::File,
    total_bytes: u64,
    chunk_size: usize,
    chunk_delay: Duration,
    control: Arc<CopyControl>,
}

type ProgressSender = UnboundedSender<Result<ProgressSample, UploadError>>;

/// 推送一条进度；接收端已离开时中止复制
fn report(tx: &ProgressSender, sample: ProgressSample) -> Result<(), UploadError> {
    tx.unbounded_send(Ok(sample))
        .map_err(|_| UploadError::Aborted("进度接收端已关闭".to_string()))
}

impl CopyJob {
    /// 执行复制；出错时把错误作为通道的最后一条，随后关闭通道
    async fn run(mut self, tx: ProgressSender) {
        if let Err(e) = self.copy_chunks(&tx).await {
            debug!("本地复制失败: {}", e);
            if tx.unbounded_send(Err(e)).is_err() {
                debug!("进度接收端已关闭，丢弃失败信息");
            }
        }
    }

    async fn copy_chunks(&mut self, tx: &ProgressSender) -> Result<(), UploadError> {
        let mut buffer = vec![0u8; self.chunk_size];
        let mut transferred = 0u64;
        report(tx, ProgressSample::bytes(0, self.total_bytes))?;

        loop {
            self.control.wait_while_paused().await;
            if self.control.canceled.load(Ordering::SeqCst) {
                return Err(UploadError::Aborted("复制已被取消".to_string()));
            }

            let read = self
                .reader
                .read(&mut buffer)
                .await
                .map_err(|e| UploadError::transfer_failed(format!("读取失败: {}", e)))?;
            if read == 0 {
                break;
            }

            self.writer
                .write_all(&buffer[..read])
                .await
                .map_err(|e| UploadError::transfer_failed(format!("写入失败: {}", e)))?;
            transferred += read as u64;
            report(tx, ProgressSample::bytes(transferred, self.total_bytes))?;

            if !self.chunk_delay.is_zero() {
                tokio::time::sleep(self.chunk_delay).await;
            }
        }

        self.writer
            .flush()
            .await
            .map_err(|e| UploadError::transfer_failed(format!("刷新失败: {}", e)))?;
        Ok(())
    }
}
