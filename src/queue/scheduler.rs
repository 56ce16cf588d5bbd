// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::counter;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use sysinfo::System;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::application::use_cases::crawl_orchestrator::CrawlOrchestrator;
use crate::config::settings::{ScheduleMode, SchedulerSettings};
use crate::domain::models::crawl::CrawlReport;
use crate::engines::traits::{ResourceManager, SessionHost};

/// 被调度器触发的一次完整爬取
#[async_trait]
pub trait CrawlJob: Send + Sync {
    async fn run(&self) -> CrawlReport;
}

#[async_trait]
impl<M> CrawlJob for CrawlOrchestrator<M>
where
    M: ResourceManager,
    M::Resource: SessionHost,
{
    async fn run(&self) -> CrawlReport {
        self.crawl_all().await
    }
}

/// 计算本副本首次运行前的等待时间
///
/// # 参数
///
/// * `interval` - 爬取周期
/// * `index` - 副本序号
/// * `total` - 副本总数
/// * `mode` - 错开策略
///
/// # 返回值
///
/// 静态模式为 `interval / total * index`；抖动模式为 `[0, interval / total)` 内的随机值
pub fn first_run_delay(interval: Duration, index: u32, total: u32, mode: ScheduleMode) -> Duration {
    let total = u64::from(total.max(1));
    let slot = interval.as_millis() as u64 / total;
    match mode {
        ScheduleMode::Static => Duration::from_millis(slot * u64::from(index)),
        ScheduleMode::Jitter if slot == 0 => Duration::ZERO,
        ScheduleMode::Jitter => Duration::from_millis(rand::random_range(0..slot)),
    }
}

/// 触发结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerOutcome {
    /// 已在后台开始一轮爬取
    Started,
    /// 上一轮仍在进行，本次触发被跳过
    Skipped,
}

/// 调度器状态快照
#[derive(Debug, Clone, Serialize)]
pub struct SchedulerStatus {
    pub host: Option<String>,
    pub auto_crawl: bool,
    pub mode: &'static str,
    pub replica_index: u32,
    pub total_replicas: u32,
    pub interval_ms: u64,
    pub first_run_delay_ms: u64,
    pub running: bool,
    pub last_run: Option<DateTime<Utc>>,
    pub next_run: Option<DateTime<Utc>>,
}

/// 运行标志守卫，离开作用域时清除运行标志
struct RunGuard {
    running: Arc<AtomicBool>,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

/// 副本调度器
///
/// 每个实例独立计时，按副本序号或随机抖动错开首次运行，
/// 之后按固定周期触发。定时触发与手动触发共用同一个运行标志，
/// 同一实例上不会同时存在两轮爬取
pub struct ReplicaScheduler {
    job: Arc<dyn CrawlJob>,
    settings: SchedulerSettings,
    first_delay: Duration,
    running: Arc<AtomicBool>,
    last_run: Arc<RwLock<Option<DateTime<Utc>>>>,
    next_run: RwLock<Option<DateTime<Utc>>>,
    /// 后台运行中那一轮爬取的句柄
    in_flight: Mutex<Option<JoinHandle<()>>>,
}

impl ReplicaScheduler {
    pub fn new(job: Arc<dyn CrawlJob>, settings: SchedulerSettings) -> Self {
        let first_delay = first_run_delay(
            Duration::from_millis(settings.interval_ms),
            settings.replica_index,
            settings.total_replicas,
            settings.mode,
        );
        Self {
            job,
            settings,
            first_delay,
            running: Arc::new(AtomicBool::new(false)),
            last_run: Arc::new(RwLock::new(None)),
            next_run: RwLock::new(None),
            in_flight: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.settings.interval_ms)
    }

    pub fn first_delay(&self) -> Duration {
        self.first_delay
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn try_begin(&self) -> Option<RunGuard> {
        self.running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| RunGuard {
                running: Arc::clone(&self.running),
            })
    }

    /// 在后台开始一轮爬取
    ///
    /// # 返回值
    ///
    /// 上一轮尚未结束时返回 `TriggerOutcome::Skipped`，不会排队
    pub fn trigger(&self) -> TriggerOutcome {
        let Some(guard) = self.try_begin() else {
            counter!("crawl_runs_skipped_total").increment(1);
            warn!("Previous crawl still running, trigger skipped");
            return TriggerOutcome::Skipped;
        };

        let job = Arc::clone(&self.job);
        let last_run = Arc::clone(&self.last_run);
        let handle = tokio::spawn(async move {
            let started = Utc::now();
            *last_run.write() = Some(started);
            let report = job.run().await;
            info!(
                persisted = report.totals.persisted,
                duplicates = report.totals.duplicates,
                failed = report.totals.failed,
                aborted = report.aborted.len(),
                elapsed_ms = (Utc::now() - started).num_milliseconds(),
                "Scheduled crawl finished"
            );
            drop(guard);
        });
        *self.in_flight.lock() = Some(handle);
        TriggerOutcome::Started
    }

    /// 等待后台运行中的一轮爬取结束
    ///
    /// 关闭时在资源池停止借出之后调用，让已借出会话的那一批完成写入
    ///
    /// # 参数
    ///
    /// * `timeout` - 最长等待时间
    ///
    /// # 返回值
    ///
    /// 没有运行中的爬取或在超时前结束时返回true
    pub async fn wait_for_run(&self, timeout: Duration) -> bool {
        let Some(mut handle) = self.in_flight.lock().take() else {
            return true;
        };
        match tokio::time::timeout(timeout, &mut handle).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                error!("Crawl run ended abnormally: {}", e);
                true
            }
            Err(_) => {
                warn!(timeout_ms = timeout.as_millis() as u64, "Crawl run still in progress");
                *self.in_flight.lock() = Some(handle);
                false
            }
        }
    }

    /// 在当前任务中执行一轮爬取并等待结束
    ///
    /// # 返回值
    ///
    /// 上一轮尚未结束时返回 `None`
    pub async fn run_now(&self) -> Option<CrawlReport> {
        let Some(_guard) = self.try_begin() else {
            counter!("crawl_runs_skipped_total").increment(1);
            warn!("Previous crawl still running, run skipped");
            return None;
        };
        *self.last_run.write() = Some(Utc::now());
        Some(self.job.run().await)
    }

    pub fn status(&self) -> SchedulerStatus {
        SchedulerStatus {
            host: System::host_name(),
            auto_crawl: self.settings.auto_crawl,
            mode: match self.settings.mode {
                ScheduleMode::Static => "static",
                ScheduleMode::Jitter => "jitter",
            },
            replica_index: self.settings.replica_index,
            total_replicas: self.settings.total_replicas,
            interval_ms: self.settings.interval_ms,
            first_run_delay_ms: self.first_delay.as_millis() as u64,
            running: self.is_running(),
            last_run: *self.last_run.read(),
            next_run: *self.next_run.read(),
        }
    }

    fn schedule_next(&self, after: Duration) {
        let next = chrono::Duration::from_std(after)
            .ok()
            .map(|d| Utc::now() + d);
        *self.next_run.write() = next;
    }

    /// 启动定时循环
    ///
    /// # 参数
    ///
    /// * `shutdown` - 关闭信号，值变为true时循环退出
    ///
    /// # 返回值
    ///
    /// 返回后台任务的句柄
    pub fn start(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let period = self.interval();
            info!(
                host = %System::host_name().unwrap_or_default(),
                replica = self.settings.replica_index,
                total = self.settings.total_replicas,
                mode = ?self.settings.mode,
                first_delay_ms = self.first_delay.as_millis() as u64,
                interval_ms = self.settings.interval_ms,
                "Replica scheduler started"
            );

            self.schedule_next(self.first_delay);
            let mut ticker = interval_at(Instant::now() + self.first_delay, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        self.schedule_next(period);
                        self.trigger();
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }

            *self.next_run.write() = None;
            info!("Replica scheduler stopped");
        })
    }
}
