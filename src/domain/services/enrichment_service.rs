// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use metrics::counter;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::domain::models::article::BiasAssessment;
use crate::domain::repositories::article_repository::ArticleRepository;

/// 外部富化服务特质
///
/// 摘要与倾向分析由外部服务完成，这里只定义调用契约
#[async_trait]
pub trait EnrichmentService: Send + Sync {
    /// 生成摘要
    ///
    /// # 参数
    ///
    /// * `article_id` - 文章ID
    /// * `text` - 正文
    ///
    /// # 返回值
    ///
    /// * `Ok(Some(String))` - 摘要
    /// * `Ok(None)` - 服务未返回摘要
    /// * `Err(anyhow::Error)` - 调用失败
    async fn summarize(&self, article_id: Uuid, text: &str) -> Result<Option<String>>;

    /// 倾向分析
    ///
    /// # 参数
    ///
    /// * `article_id` - 文章ID
    /// * `text` - 正文
    async fn analyze_bias(&self, article_id: Uuid, text: &str) -> Result<Option<BiasAssessment>>;
}

/// 需要派发的富化种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnrichmentKinds {
    pub summary: bool,
    pub bias: bool,
}

impl EnrichmentKinds {
    pub const ALL: EnrichmentKinds = EnrichmentKinds {
        summary: true,
        bias: true,
    };
}

/// 富化派发器
///
/// 每种富化作为独立的后台任务执行，调用方不等待结果；
/// 失败只记录日志与指标，不影响文章写入
pub struct EnrichmentDispatcher {
    service: Arc<dyn EnrichmentService>,
    articles: Arc<dyn ArticleRepository>,
    min_text_length: usize,
}

impl EnrichmentDispatcher {
    pub fn new(
        service: Arc<dyn EnrichmentService>,
        articles: Arc<dyn ArticleRepository>,
        min_text_length: usize,
    ) -> Self {
        Self {
            service,
            articles,
            min_text_length,
        }
    }

    /// 派发富化请求
    ///
    /// # 返回值
    ///
    /// 已启动的后台任务句柄，调用方可以忽略
    pub fn dispatch(&self, article_id: Uuid, text: &str, kinds: EnrichmentKinds) -> Vec<JoinHandle<()>> {
        let length = text.chars().count();
        if length < self.min_text_length {
            debug!(%article_id, length, "Text too short, skipping enrichment");
            return Vec::new();
        }

        let text: Arc<str> = Arc::from(text);
        let mut handles = Vec::with_capacity(2);

        if kinds.summary {
            let service = Arc::clone(&self.service);
            let articles = Arc::clone(&self.articles);
            let text = Arc::clone(&text);
            handles.push(tokio::spawn(async move {
                let outcome = match service.summarize(article_id, &text).await {
                    Ok(Some(summary)) => articles
                        .save_summary(article_id, &summary)
                        .await
                        .map_err(anyhow::Error::from),
                    Ok(None) => Ok(()),
                    Err(e) => Err(e),
                };
                match outcome {
                    Ok(()) => info!(%article_id, "AI summary stored"),
                    Err(e) => {
                        counter!("enrichment_dispatch_failed_total", "kind" => "summary").increment(1);
                        error!(%article_id, "AI summary failed: {:#}", e);
                    }
                }
            }));
        }

        if kinds.bias {
            let service = Arc::clone(&self.service);
            let articles = Arc::clone(&self.articles);
            handles.push(tokio::spawn(async move {
                let outcome = match service.analyze_bias(article_id, &text).await {
                    Ok(Some(assessment)) => articles
                        .save_bias(article_id, &assessment)
                        .await
                        .map_err(anyhow::Error::from),
                    Ok(None) => Ok(()),
                    Err(e) => Err(e),
                };
                match outcome {
                    Ok(()) => info!(%article_id, "Bias analysis stored"),
                    Err(e) => {
                        counter!("enrichment_dispatch_failed_total", "kind" => "bias").increment(1);
                        error!(%article_id, "Bias analysis failed: {:#}", e);
                    }
                }
            }));
        }

        handles
    }
}
