// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{extract::Extension, Json};
use std::sync::Arc;

use crate::{
    application::{
        dto::crawl_response::{HealthResponseDto, StatusResponseDto},
        use_cases::crawl_orchestrator::CrawlOrchestrator,
    },
    engines::traits::{ResourceManager, SessionHost},
    queue::scheduler::ReplicaScheduler,
};

/// 健康检查端点
///
/// # 返回值
///
/// 资源池统计与是否仍在接受借出
pub async fn health<M>(Extension(orchestrator): Extension<Arc<CrawlOrchestrator<M>>>) -> Json<HealthResponseDto>
where
    M: ResourceManager,
    M::Resource: SessionHost,
{
    let pool = orchestrator.sessions().pool();
    let initialized = !pool.is_closed();
    Json(HealthResponseDto {
        status: if initialized { "ok" } else { "shutting_down" },
        initialized,
        pool: pool.status(),
    })
}

/// 资源池与调度器状态
pub async fn status<M>(
    Extension(orchestrator): Extension<Arc<CrawlOrchestrator<M>>>,
    Extension(scheduler): Extension<Arc<ReplicaScheduler>>,
) -> Json<StatusResponseDto>
where
    M: ResourceManager,
    M::Resource: SessionHost,
{
    Json(StatusResponseDto {
        pool: orchestrator.sessions().pool_status(),
        scheduler: scheduler.status(),
        sources: orchestrator.registry().names(),
        phases: orchestrator.phases(),
    })
}
