//! 集成测试共用的脚本化上传处理器

#![allow(dead_code)]

use batch_upload::services::upload_handler::NoopControl;
use batch_upload::{ProgressSample, RemoteFile, StartedUpload, UploadError, UploadFile, UploadHandler};
use futures::future::BoxFuture;
use futures::stream::{self, StreamExt};
use futures::FutureExt;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// 单个文件的处理脚本
#[derive(Clone)]
pub enum Script {
    /// 依次上报这些完成比例后正常关闭
    Succeed(Vec<f64>),
    /// 连开始都失败
    FailAtStart(String),
    /// 开始上传的 future 直接 panic
    PanicAtStart(String),
    /// 上报这些完成比例后以错误关闭
    FailMidway(Vec<f64>, String),
    /// 等待闸门打开后再上报并正常关闭
    Gated(Arc<Notify>, Vec<f64>),
    /// 进度通道永不关闭；通道被丢弃时置位标记
    Hang(Arc<AtomicBool>),
}

#[derive(Default)]
struct Counters {
    calls: AtomicUsize,
    active: AtomicUsize,
    peak: AtomicUsize,
}

/// 通道存活期间计为一个进行中的上传
struct ActiveGuard(Arc<Counters>);

impl ActiveGuard {
    fn enter(counters: Arc<Counters>) -> Self {
        let now = counters.active.fetch_add(1, Ordering::SeqCst) + 1;
        counters.peak.fetch_max(now, Ordering::SeqCst);
        Self(counters)
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.active.fetch_sub(1, Ordering::SeqCst);
    }
}

struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// 按文件名查脚本的处理器，未配置的文件按 0 → 0.5 → 1 成功
pub struct ScriptedHandler {
    scripts: HashMap<String, Script>,
    step_delay: Duration,
    counters: Arc<Counters>,
}

impl ScriptedHandler {
    pub fn new() -> Self {
        Self {
            scripts: HashMap::new(),
            step_delay: Duration::from_millis(2),
            counters: Arc::new(Counters::default()),
        }
    }

    pub fn with_script(mut self, name: &str, script: Script) -> Self {
        self.scripts.insert(name.to_string(), script);
        self
    }

    pub fn with_step_delay(mut self, step_delay: Duration) -> Self {
        self.step_delay = step_delay;
        self
    }

    /// 处理器 `upload_file` 被调用的次数
    pub fn calls(&self) -> usize {
        self.counters.calls.load(Ordering::SeqCst)
    }

    /// 同时存活的进度通道数的峰值
    pub fn peak(&self) -> usize {
        self.counters.peak.load(Ordering::SeqCst)
    }
}

fn samples(
    fractions: Vec<f64>,
    step_delay: Duration,
    gate: Option<Arc<Notify>>,
) -> stream::BoxStream<'static, Result<ProgressSample, UploadError>> {
    stream::iter(fractions.into_iter().enumerate())
        .then(move |(i, fraction)| {
            let gate = gate.clone();
            async move {
                if let (0, Some(gate)) = (i, gate) {
                    gate.notified().await;
                }
                tokio::time::sleep(step_delay).await;
                Ok(ProgressSample::fraction(fraction))
            }
        })
        .boxed()
}

impl UploadHandler for ScriptedHandler {
    fn upload_file(&self, file: &UploadFile) -> BoxFuture<'static, Result<StartedUpload, UploadError>> {
        self.counters.calls.fetch_add(1, Ordering::SeqCst);

        let script = self
            .scripts
            .get(&file.name)
            .cloned()
            .unwrap_or_else(|| Script::Succeed(vec![0.0, 0.5, 1.0]));
        let step_delay = self.step_delay;
        let counters = self.counters.clone();
        let remote_file = RemoteFile::new(format!("remote/{}", file.name));

        async move {
            tokio::time::sleep(step_delay).await;

            let progress = match script {
                Script::FailAtStart(message) => return Err(UploadError::start_failed(message)),
                Script::PanicAtStart(message) => panic!("{}", message),
                Script::Succeed(fractions) => samples(fractions, step_delay, None),
                Script::Gated(gate, fractions) => samples(fractions, step_delay, Some(gate)),
                Script::FailMidway(fractions, message) => samples(fractions, step_delay, None)
                    .chain(stream::once(async move { Err(UploadError::transfer_failed(message)) }))
                    .boxed(),
                Script::Hang(dropped) => {
                    let flag = DropFlag(dropped);
                    stream::pending()
                        .map(move |item: Result<ProgressSample, UploadError>| {
                            let _ = &flag;
                            item
                        })
                        .boxed()
                }
            };

            let guard = ActiveGuard::enter(counters);
            let progress = progress
                .map(move |item| {
                    let _ = &guard;
                    item
                })
                .boxed();

            Ok(StartedUpload::new(remote_file, Arc::new(NoopControl), progress))
        }
        .boxed()
    }
}

pub fn files(names: &[&str]) -> Vec<UploadFile> {
    names.iter().map(|name| UploadFile::new(*name)).collect()
}

/// 轮询直到条件成立或超时
pub async fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}
