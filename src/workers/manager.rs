// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use tokio::signal;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::queue::scheduler::ReplicaScheduler;
use crate::workers::Worker;

/// 工作管理器
///
/// 持有调度循环与后台Worker的句柄，统一负责关闭
pub struct WorkerManager {
    shutdown: watch::Sender<bool>,
    handles: Vec<(String, JoinHandle<()>)>,
}

impl Default for WorkerManager {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkerManager {
    pub fn new() -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            shutdown,
            handles: Vec::new(),
        }
    }

    /// 启动副本调度循环
    pub fn start_scheduler(&mut self, scheduler: Arc<ReplicaScheduler>) {
        let handle = scheduler.start(self.shutdown.subscribe());
        self.handles.push(("replica-scheduler".to_string(), handle));
    }

    /// 启动后台Worker
    ///
    /// Worker的 `run` 在收到关闭信号时被取消
    ///
    /// # 参数
    ///
    /// * `worker` - 要启动的Worker
    pub fn start_worker<W>(&mut self, worker: W)
    where
        W: Worker + 'static,
    {
        let name = worker.name().to_string();
        let mut shutdown = self.shutdown.subscribe();
        let task_name = name.clone();
        let handle = tokio::spawn(async move {
            tokio::select! {
                result = worker.run() => {
                    if let Err(e) = result {
                        error!("Worker {} exited with error: {}", task_name, e);
                    }
                }
                _ = shutdown.wait_for(|stop| *stop) => {}
            }
        });
        info!("Worker {} started", name);
        self.handles.push((name, handle));
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// 通知所有循环停止并等待其退出
    pub async fn shutdown(&mut self) {
        info!("Shutting down workers...");
        // 没有订阅者时发送会失败，这种情况无需处理
        let _ = self.shutdown.send(true);

        for (name, handle) in self.handles.drain(..) {
            if let Err(e) = handle.await {
                error!("Worker {} did not stop cleanly: {}", name, e);
            }
        }

        info!("Workers shut down successfully");
    }
}

/// 等待 SIGINT 或 SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Unable to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Unable to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
