//! 订阅释放登记表 - 基础设施层
//!
//! 收集批次运行中产生的所有后台任务句柄，观察者提前离开时统一中止

use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::AbortHandle;
use tracing::debug;

#[derive(Debug, Default)]
struct RegistryInner {
    handles: Vec<AbortHandle>,
    disposed: bool,
}

/// 释放登记表
///
/// 克隆后共享同一份登记；`unsub()` 之后再登记的句柄会被立即中止
#[derive(Debug, Clone, Default)]
pub struct SubscriptionRegistry {
    inner: Arc<Mutex<RegistryInner>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记一个或多个任务句柄
    pub fn add_subs(&self, handles: impl IntoIterator<Item = AbortHandle>) {
        let mut inner = self.lock();
        for handle in handles {
            if inner.disposed {
                handle.abort();
            } else {
                inner.handles.push(handle);
            }
        }
    }

    /// 登记单个任务句柄
    pub fn add(&self, handle: AbortHandle) {
        self.add_subs(std::iter::once(handle));
    }

    /// 中止所有已登记的任务（尽力而为，不保证进行中的网络调用停止）
    pub fn unsub(&self) {
        let handles = {
            let mut inner = self.lock();
            inner.disposed = true;
            std::mem::take(&mut inner.handles)
        };
        debug!("释放 {} 个订阅", handles.len());
        for handle in handles {
            handle.abort();
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.lock().disposed
    }

    fn lock(&self) -> MutexGuard<'_, RegistryInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
