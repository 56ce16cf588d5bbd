// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use tokio::time::interval;
use tracing::{error, info, warn};

use crate::config::settings::BackfillSettings;
use crate::domain::repositories::article_repository::ArticleRepository;
use crate::domain::services::enrichment_service::{EnrichmentDispatcher, EnrichmentKinds};
use crate::utils::errors::WorkerError;

/// 一轮回填的处理结果
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BackfillStats {
    /// 派发了富化请求的文章数
    pub dispatched: usize,
    /// 派发的摘要请求数
    pub summaries: usize,
    /// 派发的倾向分析请求数
    pub analyses: usize,
}

/// 富化回填Worker
///
/// 定期查找缺少摘要或倾向分析的文章，重新派发富化请求。
/// 重复爬取到的文章不会触发富化，补齐由该Worker负责
pub struct BackfillWorker {
    articles: Arc<dyn ArticleRepository>,
    dispatcher: Arc<EnrichmentDispatcher>,
    process_interval: Duration,
    batch_size: u64,
    min_content_length: usize,
    pause: Duration,
}

impl BackfillWorker {
    pub fn new(
        articles: Arc<dyn ArticleRepository>,
        dispatcher: Arc<EnrichmentDispatcher>,
        settings: &BackfillSettings,
        min_content_length: usize,
    ) -> Self {
        Self {
            articles,
            dispatcher,
            process_interval: Duration::from_millis(settings.interval_ms),
            batch_size: settings.batch_size,
            min_content_length,
            pause: Duration::from_millis(settings.pause_ms),
        }
    }

    /// 处理一批待回填的文章
    ///
    /// 每篇文章的富化请求结束后再处理下一篇，文章之间间隔 `pause`
    pub async fn run_once(&self) -> Result<BackfillStats, WorkerError> {
        let candidates = self
            .articles
            .find_needing_enrichment(self.min_content_length, self.batch_size)
            .await?;

        if candidates.is_empty() {
            info!("没有需要回填富化的文章");
            return Ok(BackfillStats::default());
        }

        info!("发现 {} 篇需要回填富化的文章", candidates.len());

        let mut stats = BackfillStats::default();
        for (index, candidate) in candidates.into_iter().enumerate() {
            if index > 0 && !self.pause.is_zero() {
                tokio::time::sleep(self.pause).await;
            }

            let kinds = EnrichmentKinds {
                summary: candidate.needs_summary,
                bias: candidate.needs_bias,
            };
            let handles = self
                .dispatcher
                .dispatch(candidate.article.id, &candidate.article.content, kinds);
            if handles.is_empty() {
                continue;
            }

            for result in join_all(handles).await {
                if let Err(e) = result {
                    warn!(article_id = %candidate.article.id, "富化任务异常退出: {}", e);
                }
            }

            stats.dispatched += 1;
            stats.summaries += usize::from(kinds.summary);
            stats.analyses += usize::from(kinds.bias);
        }

        info!(
            "富化回填完成: 文章={}, 摘要={}, 倾向分析={}",
            stats.dispatched, stats.summaries, stats.analyses
        );
        Ok(stats)
    }
}

#[async_trait]
impl crate::workers::Worker for BackfillWorker {
    async fn run(&self) -> Result<(), WorkerError> {
        info!("富化回填Worker启动");

        let mut interval = interval(self.process_interval);

        loop {
            interval.tick().await;

            if let Err(e) = self.run_once().await {
                error!("富化回填时发生错误: {}", e);
            }
        }
    }

    fn name(&self) -> &str {
        "backfill-worker"
    }
}
