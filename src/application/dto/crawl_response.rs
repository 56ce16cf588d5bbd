// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::models::crawl::CrawlPhase;
use crate::engines::browser_pool::PoolStatus;
use crate::queue::scheduler::{SchedulerStatus, TriggerOutcome};

/// 全量爬取触发响应
#[derive(Debug, Serialize)]
pub struct TriggerResponseDto {
    pub status: TriggerOutcome,
    pub message: &'static str,
}

impl From<TriggerOutcome> for TriggerResponseDto {
    fn from(status: TriggerOutcome) -> Self {
        let message = match status {
            TriggerOutcome::Started => "crawl of all sources started in background",
            TriggerOutcome::Skipped => "a crawl is already running on this instance",
        };
        Self { status, message }
    }
}

/// 健康检查响应
#[derive(Debug, Serialize)]
pub struct HealthResponseDto {
    pub status: &'static str,
    /// 资源池是否仍在接受借出
    pub initialized: bool,
    pub pool: PoolStatus,
}

/// 状态查询响应
#[derive(Debug, Serialize)]
pub struct StatusResponseDto {
    pub pool: PoolStatus,
    pub scheduler: SchedulerStatus,
    /// 已注册的新闻源
    pub sources: Vec<String>,
    /// 各新闻源最近一次爬取所处的阶段
    pub phases: BTreeMap<String, CrawlPhase>,
}
