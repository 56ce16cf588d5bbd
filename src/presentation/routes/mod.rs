// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use axum::{
    extract::Extension,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::application::use_cases::crawl_orchestrator::CrawlOrchestrator;
use crate::engines::traits::{ResourceManager, SessionHost};
use crate::presentation::handlers::{crawl_handler, status_handler};
use crate::queue::scheduler::ReplicaScheduler;

/// 创建应用路由
///
/// # 参数
///
/// * `orchestrator` - 爬取编排器
/// * `scheduler` - 副本调度器，手动全量触发与定时触发共用
///
/// # 返回值
///
/// 返回配置好的路由
pub fn routes<M>(orchestrator: Arc<CrawlOrchestrator<M>>, scheduler: Arc<ReplicaScheduler>) -> Router
where
    M: ResourceManager,
    M::Resource: SessionHost,
{
    Router::new()
        .route("/health", get(status_handler::health::<M>))
        .route("/v1/version", get(version))
        .route("/v1/status", get(status_handler::status::<M>))
        .route("/v1/crawl/{source}", post(crawl_handler::crawl_source::<M>))
        .route("/v1/crawl-all", post(crawl_handler::crawl_all))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(Extension(orchestrator))
                .layer(Extension(scheduler)),
        )
}

/// 版本信息端点
///
/// # 返回值
///
/// 返回应用版本号
pub async fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
