//! 单文件上传处理器接口 - 业务能力层
//!
//! 真正把字节搬到远端的是调用方提供的处理器，这里只定义它的形状

use crate::error::UploadError;
use crate::models::{ProgressSample, RemoteFile, UploadFile};
use futures::future::BoxFuture;
use futures::stream::BoxStream;
use std::sync::Arc;

/// 单个文件的进度通道
///
/// - `Ok(sample)`：一次进度样本
/// - `Err(e)`：通道以错误关闭（失败），之后不再读取
/// - 流正常结束：上传成功
pub type ProgressStream = BoxStream<'static, Result<ProgressSample, UploadError>>;

/// 已开始的上传对外暴露的控制能力
pub trait UploadControl: Send + Sync {
    fn pause(&self);
    fn resume(&self);
    fn cancel(&self);
}

/// 处理器成功开始一次上传后返回的句柄
pub struct StartedUpload {
    pub remote_file: RemoteFile,
    pub control: Arc<dyn UploadControl>,
    pub progress: ProgressStream,
}

impl StartedUpload {
    pub fn new(remote_file: RemoteFile, control: Arc<dyn UploadControl>, progress: ProgressStream) -> Self {
        Self {
            remote_file,
            control,
            progress,
        }
    }
}

/// 单文件上传处理器
///
/// `upload_file` 返回的 future 以错误结束表示"连开始都失败了"
pub trait UploadHandler: Send + Sync {
    fn upload_file(&self, file: &UploadFile) -> BoxFuture<'static, Result<StartedUpload, UploadError>>;
}

/// 没有任何控制能力的处理器可以使用的空实现
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopControl;

impl UploadControl for NoopControl {
    fn pause(&self) {}
    fn resume(&self) {}
    fn cancel(&self) {}
}
