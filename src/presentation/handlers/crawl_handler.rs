// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use tracing::info;

use crate::{
    application::{dto::crawl_response::TriggerResponseDto, use_cases::crawl_orchestrator::CrawlOrchestrator},
    domain::models::crawl::CrawlSummary,
    engines::traits::{ResourceManager, SessionHost},
    presentation::errors::AppError,
    queue::scheduler::ReplicaScheduler,
};

/// 同步爬取单个新闻源
///
/// # 参数
///
/// * `orchestrator` - 爬取编排器
/// * `source` - 新闻源名称
///
/// # 返回值
///
/// 本轮统计；未注册的新闻源返回404，无法启动浏览器时返回503
pub async fn crawl_source<M>(
    Extension(orchestrator): Extension<Arc<CrawlOrchestrator<M>>>,
    Path(source): Path<String>,
) -> Result<Json<CrawlSummary>, AppError>
where
    M: ResourceManager,
    M::Resource: SessionHost,
{
    info!(source = %source, "Manual crawl requested");
    let summary = orchestrator.crawl_source(&source).await?;
    Ok(Json(summary))
}

/// 在后台爬取全部新闻源
///
/// 始终返回202，响应体说明是否已开始或因已有爬取在进行而被跳过
pub async fn crawl_all(Extension(scheduler): Extension<Arc<ReplicaScheduler>>) -> impl IntoResponse {
    let outcome = scheduler.trigger();
    info!(?outcome, "Manual crawl of all sources requested");
    (StatusCode::ACCEPTED, Json(TriggerResponseDto::from(outcome)))
}
