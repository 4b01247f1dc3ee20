// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::OnceCell;
use tracing::info;

/// 延迟初始化的共享客户端
///
/// 首次使用时才建立底层连接。并发的首次调用只会触发一次初始化，
/// 其余调用等待同一结果；初始化失败不会被缓存，下一次调用重新尝试。
pub struct LazyClient<T> {
    name: &'static str,
    cell: OnceCell<T>,
    initializations: AtomicUsize,
}

impl<T> LazyClient<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            cell: OnceCell::new(),
            initializations: AtomicUsize::new(0),
        }
    }

    /// 用已有的值构造（测试或外部注入）
    pub fn with_value(name: &'static str, value: T) -> Self {
        Self {
            name,
            cell: OnceCell::new_with(Some(value)),
            initializations: AtomicUsize::new(0),
        }
    }

    /// 获取客户端，未初始化时执行 `init`
    pub async fn get_or_try_init<F, Fut, E>(&self, init: F) -> Result<&T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.cell
            .get_or_try_init(|| async {
                self.initializations.fetch_add(1, Ordering::SeqCst);
                let value = init().await?;
                info!("Initialized shared {} client", self.name);
                Ok(value)
            })
            .await
    }

    /// 已初始化时返回客户端
    pub fn get(&self) -> Option<&T> {
        self.cell.get()
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.initialized()
    }

    /// 初始化函数被调用的次数（含失败）
    pub fn initializations(&self) -> usize {
        self.initializations.load(Ordering::SeqCst)
    }
}
