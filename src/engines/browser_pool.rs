// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 有界资源池
//!
//! 借出前做存活探测，失效资源直接销毁并重新获取；
//! 借出数量由信号量限制，永远不会超过 `max`。

use std::collections::VecDeque;
use std::ops::Deref;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use metrics::gauge;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::settings::BrowserPoolSettings;
use crate::engines::traits::{PoolError, ResourceManager};

/// 池中没有存活资源时，判定为无法创建前的最多尝试次数
const CREATE_ATTEMPTS: u32 = 3;
/// 创建重试的退避基数，第n次重试前等待 n 倍
const CREATE_RETRY_BACKOFF: Duration = Duration::from_millis(100);

/// 资源池配置
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// 常驻的最小空闲资源数
    pub min: usize,
    /// 同时借出的最大资源数
    pub max: usize,
    /// 获取资源的超时时间
    pub acquire_timeout: Duration,
    /// 空闲回收检查间隔
    pub idle_eviction_interval: Duration,
    /// 空闲资源存活时间
    pub idle_timeout: Duration,
}

impl From<&BrowserPoolSettings> for PoolConfig {
    fn from(settings: &BrowserPoolSettings) -> Self {
        Self {
            min: settings.min,
            max: settings.max,
            acquire_timeout: Duration::from_millis(settings.acquire_timeout_ms),
            idle_eviction_interval: Duration::from_millis(settings.idle_eviction_interval_ms),
            idle_timeout: Duration::from_millis(settings.idle_timeout_ms),
        }
    }
}

/// 资源池状态快照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolStatus {
    /// 存活资源总数（空闲 + 借出）
    pub size: usize,
    /// 空闲资源数
    pub available: usize,
    /// 借出资源数
    pub borrowed: usize,
    /// 正在排队等待的调用方数
    pub pending: usize,
    pub min: usize,
    pub max: usize,
}

struct IdleEntry<R> {
    resource: R,
    last_used: Instant,
}

struct PoolInner<M: ResourceManager> {
    manager: M,
    config: PoolConfig,
    idle: Mutex<VecDeque<IdleEntry<M::Resource>>>,
    permits: Arc<Semaphore>,
    size: AtomicUsize,
    borrowed: AtomicUsize,
    pending: AtomicUsize,
    closed: AtomicBool,
    evictor: Mutex<Option<JoinHandle<()>>>,
}

impl<M: ResourceManager> PoolInner<M> {
    fn push_idle(&self, resource: M::Resource) {
        self.idle.lock().push_back(IdleEntry {
            resource,
            last_used: Instant::now(),
        });
    }

    async fn discard(&self, resource: M::Resource) {
        self.size.fetch_sub(1, Ordering::SeqCst);
        self.manager.destroy(resource).await;
    }

    fn publish_gauges(&self) {
        gauge!("browser_pool_borrowed").set(self.borrowed.load(Ordering::SeqCst) as f64);
        gauge!("browser_pool_idle").set(self.idle.lock().len() as f64);
    }

    /// 归还资源；资源池已关闭时改为销毁
    fn return_resource(self: &Arc<Self>, resource: M::Resource) {
        self.borrowed.fetch_sub(1, Ordering::SeqCst);
        if self.closed.load(Ordering::SeqCst) {
            let inner = Arc::clone(self);
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    handle.spawn(async move { inner.discard(resource).await });
                }
                Err(_) => {
                    // 运行时已退出，只能直接丢弃
                    self.size.fetch_sub(1, Ordering::SeqCst);
                }
            }
        } else {
            self.push_idle(resource);
        }
        self.publish_gauges();
    }
}

/// 有界资源池
///
/// 克隆开销很小，所有克隆共享同一组资源
pub struct ResourcePool<M: ResourceManager> {
    inner: Arc<PoolInner<M>>,
}

impl<M: ResourceManager> Clone for ResourcePool<M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<M: ResourceManager> ResourcePool<M> {
    /// 创建资源池，不会预先创建资源
    ///
    /// # 参数
    ///
    /// * `manager` - 资源管理器
    /// * `config` - 资源池配置
    pub fn new(manager: M, config: PoolConfig) -> Self {
        let permits = Arc::new(Semaphore::new(config.max));
        Self {
            inner: Arc::new(PoolInner {
                manager,
                config,
                idle: Mutex::new(VecDeque::new()),
                permits,
                size: AtomicUsize::new(0),
                borrowed: AtomicUsize::new(0),
                pending: AtomicUsize::new(0),
                closed: AtomicBool::new(false),
                evictor: Mutex::new(None),
            }),
        }
    }

    /// 预热到 `min` 个资源并启动空闲回收任务
    ///
    /// # 返回值
    ///
    /// * `Ok(())` - 预热完成
    /// * `Err(PoolError)` - 一个资源都无法创建
    pub async fn start(&self) -> Result<(), PoolError> {
        self.ensure_min().await?;

        let pool = self.clone();
        let interval = self.inner.config.idle_eviction_interval;
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if pool.inner.closed.load(Ordering::SeqCst) {
                    break;
                }
                pool.evict_idle().await;
                if let Err(e) = pool.ensure_min().await {
                    warn!("Failed to refill browser pool to minimum: {}", e);
                }
            }
        });
        *self.inner.evictor.lock() = Some(handle);

        info!(
            min = self.inner.config.min,
            max = self.inner.config.max,
            "Browser pool started"
        );
        Ok(())
    }

    /// 借出一个资源
    ///
    /// 池满时排队等待，最多等待 `acquire_timeout`。空闲资源借出前先做存活探测，
    /// 探测失败的资源被销毁后继续尝试下一个。
    pub async fn acquire(&self) -> Result<PooledResource<M>, PoolError> {
        let inner = &self.inner;
        if inner.closed.load(Ordering::SeqCst) {
            return Err(PoolError::Closed);
        }

        inner.pending.fetch_add(1, Ordering::SeqCst);
        let waited = tokio::time::timeout(
            inner.config.acquire_timeout,
            Arc::clone(&inner.permits).acquire_owned(),
        )
        .await;
        inner.pending.fetch_sub(1, Ordering::SeqCst);

        let permit = match waited {
            Err(_) => return Err(PoolError::Timeout(inner.config.acquire_timeout)),
            Ok(Err(_)) => return Err(PoolError::Closed),
            Ok(Ok(permit)) => permit,
        };

        loop {
            let candidate = inner.idle.lock().pop_back();
            match candidate {
                Some(entry) => {
                    if inner.manager.is_valid(&entry.resource).await {
                        return Ok(self.lease(entry.resource, permit));
                    }
                    warn!("Pooled resource failed liveness check, destroying it");
                    inner.discard(entry.resource).await;
                }
                None => {
                    return match self.create_resource().await {
                        Ok(resource) => {
                            inner.size.fetch_add(1, Ordering::SeqCst);
                            debug!(size = inner.size.load(Ordering::SeqCst), "Created pooled resource");
                            Ok(self.lease(resource, permit))
                        }
                        Err(e) => {
                            drop(permit);
                            Err(e)
                        }
                    };
                }
            }
        }
    }

    /// 创建新资源
    ///
    /// 池中没有任何存活资源时最多尝试 `CREATE_ATTEMPTS` 次，全部失败才返回
    /// `PoolError::Unavailable`；池中已有资源时只尝试一次，失败返回 `CreateFailed`
    async fn create_resource(&self) -> Result<M::Resource, PoolError> {
        let inner = &self.inner;
        let attempts = if inner.size.load(Ordering::SeqCst) == 0 {
            CREATE_ATTEMPTS
        } else {
            1
        };

        let mut last_error = String::new();
        for attempt in 1..=attempts {
            if attempt > 1 {
                tokio::time::sleep(CREATE_RETRY_BACKOFF * (attempt - 1)).await;
            }
            if inner.closed.load(Ordering::SeqCst) {
                return Err(PoolError::Closed);
            }

            let created = tokio::time::timeout(inner.config.acquire_timeout, inner.manager.create())
                .await
                .unwrap_or_else(|_| Err(PoolError::CreateFailed("resource creation timed out".into())));
            match created {
                Ok(resource) => return Ok(resource),
                Err(PoolError::CreateFailed(message)) | Err(PoolError::Unavailable(message)) => {
                    warn!(attempt, attempts, "Resource creation failed: {}", message);
                    last_error = message;
                }
                Err(other) => return Err(other),
            }
        }

        // 重试期间其他调用方可能已经创建成功
        if inner.size.load(Ordering::SeqCst) == 0 && attempts > 1 {
            Err(PoolError::Unavailable(last_error))
        } else {
            Err(PoolError::CreateFailed(last_error))
        }
    }

    fn lease(&self, resource: M::Resource, permit: OwnedSemaphorePermit) -> PooledResource<M> {
        self.inner.borrowed.fetch_add(1, Ordering::SeqCst);
        self.inner.publish_gauges();
        PooledResource {
            resource: Some(resource),
            inner: Arc::clone(&self.inner),
            _permit: permit,
        }
    }

    /// 销毁超过空闲存活时间的资源，保留 `min` 个
    pub async fn evict_idle(&self) {
        let inner = &self.inner;
        let expired: Vec<M::Resource> = {
            let mut idle = inner.idle.lock();
            let size = inner.size.load(Ordering::SeqCst);
            let removable = size.saturating_sub(inner.config.min);
            let mut expired = Vec::new();
            let mut kept = VecDeque::with_capacity(idle.len());
            // 从最旧的开始回收
            while let Some(entry) = idle.pop_front() {
                if expired.len() < removable && entry.last_used.elapsed() >= inner.config.idle_timeout {
                    expired.push(entry.resource);
                } else {
                    kept.push_back(entry);
                }
            }
            *idle = kept;
            expired
        };

        if !expired.is_empty() {
            debug!(count = expired.len(), "Evicting idle pooled resources");
        }
        for resource in expired {
            inner.discard(resource).await;
        }
        inner.publish_gauges();
    }

    async fn ensure_min(&self) -> Result<(), PoolError> {
        let inner = &self.inner;
        while !inner.closed.load(Ordering::SeqCst)
            && inner.size.load(Ordering::SeqCst) < inner.config.min
        {
            let resource = self.create_resource().await?;
            inner.size.fetch_add(1, Ordering::SeqCst);
            inner.push_idle(resource);
        }
        inner.publish_gauges();
        Ok(())
    }

    /// 当前状态快照
    pub fn status(&self) -> PoolStatus {
        let inner = &self.inner;
        PoolStatus {
            size: inner.size.load(Ordering::SeqCst),
            available: inner.idle.lock().len(),
            borrowed: inner.borrowed.load(Ordering::SeqCst),
            pending: inner.pending.load(Ordering::SeqCst),
            min: inner.config.min,
            max: inner.config.max,
        }
    }

    pub fn config(&self) -> &PoolConfig {
        &self.inner.config
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// 关闭资源池
    ///
    /// 不再接受新的借出请求，立即销毁空闲资源；借出中的资源在归还时销毁
    pub async fn destroy(&self) {
        let inner = &self.inner;
        if inner.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        inner.permits.close();
        if let Some(handle) = inner.evictor.lock().take() {
            handle.abort();
        }

        let drained: Vec<M::Resource> = inner.idle.lock().drain(..).map(|e| e.resource).collect();
        let count = drained.len();
        for resource in drained {
            inner.discard(resource).await;
        }
        inner.publish_gauges();
        info!(
            destroyed = count,
            still_borrowed = inner.borrowed.load(Ordering::SeqCst),
            "Browser pool drained"
        );
    }
}

/// 借出的资源
///
/// 离开作用域时自动归还，调用方出错或 panic 时也不会泄漏
pub struct PooledResource<M: ResourceManager> {
    resource: Option<M::Resource>,
    inner: Arc<PoolInner<M>>,
    _permit: OwnedSemaphorePermit,
}

impl<M: ResourceManager> PooledResource<M> {
    /// 归还资源，归还前做一次存活探测，失效则销毁
    pub async fn release(mut self) {
        let Some(resource) = self.resource.take() else {
            return;
        };
        if self.inner.closed.load(Ordering::SeqCst) || !self.inner.manager.is_valid(&resource).await {
            self.inner.borrowed.fetch_sub(1, Ordering::SeqCst);
            self.inner.discard(resource).await;
            self.inner.publish_gauges();
        } else {
            self.inner.return_resource(resource);
        }
    }
}

impl<M: ResourceManager> Deref for PooledResource<M> {
    type Target = M::Resource;

    fn deref(&self) -> &Self::Target {
        // resource 只在 release/drop 时被取走
        self.resource.as_ref().expect("pooled resource already released")
    }
}

impl<M: ResourceManager> Drop for PooledResource<M> {
    fn drop(&mut self) {
        if let Some(resource) = self.resource.take() {
            self.inner.return_resource(resource);
        }
    }
}
