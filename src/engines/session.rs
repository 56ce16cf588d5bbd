// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::config::settings::SessionSettings;
use crate::engines::browser_pool::{PoolStatus, ResourcePool};
use crate::engines::traits::{PageSession, ResourceManager, SessionError, SessionHost, SessionOptions};

impl From<&SessionSettings> for SessionOptions {
    fn from(settings: &SessionSettings) -> Self {
        Self {
            navigation_timeout: Duration::from_millis(settings.navigation_timeout_ms),
            user_agent: settings.user_agent.clone(),
            block_resources: settings.block_resources,
            settle: Duration::from_millis(settings.settle_ms),
        }
    }
}

/// 页面守卫
///
/// 未调用 `close` 就被丢弃时（回调 panic 或外层任务被取消），在后台关闭页面
struct PageGuard {
    page: Option<Arc<dyn PageSession>>,
}

impl PageGuard {
    fn new(page: Arc<dyn PageSession>) -> Self {
        Self { page: Some(page) }
    }

    async fn close(mut self) {
        if let Some(page) = self.page.take() {
            close_page(page).await;
        }
    }
}

impl Drop for PageGuard {
    fn drop(&mut self) {
        let Some(page) = self.page.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(close_page(page));
            }
            Err(_) => debug!("Runtime gone, page left to the browser"),
        }
    }
}

async fn close_page(page: Arc<dyn PageSession>) {
    if let Err(e) = page.close().await {
        debug!("Failed to close page: {}", e);
    }
}

/// 会话作用域
///
/// 访问池化浏览器的唯一入口：借出资源、按固定配置打开页面、执行回调，
/// 无论回调成功与否都会关闭页面并归还资源
pub struct SessionScope<M: ResourceManager> {
    pool: ResourcePool<M>,
    options: SessionOptions,
}

impl<M> Clone for SessionScope<M>
where
    M: ResourceManager,
{
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            options: self.options.clone(),
        }
    }
}

impl<M> SessionScope<M>
where
    M: ResourceManager,
    M::Resource: SessionHost,
{
    pub fn new(pool: ResourcePool<M>, options: SessionOptions) -> Self {
        Self { pool, options }
    }

    /// 在一个页面会话中执行回调
    ///
    /// # 参数
    ///
    /// * `f` - 接收页面会话的回调
    ///
    /// # 返回值
    ///
    /// 回调的结果；借出资源或打开页面失败时返回对应错误
    pub async fn with_session<F, Fut, T>(&self, f: F) -> Result<T, SessionError>
    where
        F: FnOnce(Arc<dyn PageSession>) -> Fut + Send,
        Fut: Future<Output = Result<T, SessionError>> + Send,
        T: Send,
    {
        let resource = self.pool.acquire().await?;

        let page: Arc<dyn PageSession> = match resource.open_page(&self.options).await {
            Ok(page) => Arc::from(page),
            Err(e) => {
                resource.release().await;
                return Err(e);
            }
        };

        let guard = PageGuard::new(Arc::clone(&page));

        let result = f(page).await;

        guard.close().await;
        resource.release().await;

        result
    }

    pub fn pool(&self) -> &ResourcePool<M> {
        &self.pool
    }

    pub fn pool_status(&self) -> PoolStatus {
        self.pool.status()
    }
}
