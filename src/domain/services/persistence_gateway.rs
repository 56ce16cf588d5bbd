// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, instrument, warn};

use crate::domain::models::article::{NewArticle, ParsedArticle, SaveOutcome, DEFAULT_CATEGORY};
use crate::domain::repositories::article_repository::ArticleRepository;
use crate::domain::repositories::catalog_repository::CatalogRepository;
use crate::domain::services::enrichment_service::{EnrichmentDispatcher, EnrichmentKinds};
use crate::domain::services::source_resolver::resolve_source;
use crate::utils::errors::RepositoryError;

/// 持久化网关
///
/// 以URL为唯一键写入文章：应用层先做存在性检查，存储层的唯一约束兜底，
/// 并发写入同一URL时只有一方成功，另一方得到 `SaveOutcome::Duplicate`
pub struct PersistenceGateway {
    articles: Arc<dyn ArticleRepository>,
    catalog: Arc<dyn CatalogRepository>,
    enrichment: Option<Arc<EnrichmentDispatcher>>,
}

impl PersistenceGateway {
    pub fn new(
        articles: Arc<dyn ArticleRepository>,
        catalog: Arc<dyn CatalogRepository>,
        enrichment: Option<Arc<EnrichmentDispatcher>>,
    ) -> Self {
        Self {
            articles,
            catalog,
            enrichment,
        }
    }

    /// 将解析结果规范化为待写入的文章
    ///
    /// # 参数
    ///
    /// * `parsed` - 解析结果
    /// * `nominal_source` - 栏目的名义来源
    pub fn canonicalize(parsed: ParsedArticle, nominal_source: &str) -> NewArticle {
        let source = resolve_source(parsed.origin_source.as_deref(), &parsed.url, nominal_source);
        let category = parsed
            .category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());

        NewArticle {
            title: parsed.title,
            content: parsed.content,
            url: parsed.url,
            source,
            category,
            reporter: parsed.reporter,
            image_url: parsed.image_url,
            published_at: parsed.published_at.unwrap_or_else(Utc::now),
        }
    }

    /// 保存文章
    ///
    /// # 参数
    ///
    /// * `article` - 规范化后的文章
    ///
    /// # 返回值
    ///
    /// * `Ok(SaveOutcome::Created)` - 新建，已初始化统计并派发富化
    /// * `Ok(SaveOutcome::Duplicate)` - URL已存在，未做修改
    /// * `Err(RepositoryError)` - 写入失败
    #[instrument(skip(self, article), fields(url = %article.url, source = %article.source))]
    pub async fn save(&self, article: &NewArticle) -> Result<SaveOutcome, RepositoryError> {
        if self.articles.exists_by_url(&article.url).await? {
            debug!("Article already stored");
            return Ok(SaveOutcome::Duplicate);
        }

        let source_id = self.catalog.ensure_source(&article.source).await?;
        let category_id = self.catalog.ensure_category(&article.category).await?;

        let id = match self.articles.insert(article, source_id, category_id).await {
            Ok(id) => id,
            Err(RepositoryError::AlreadyExists) => {
                debug!("Lost insert race, treating as duplicate");
                return Ok(SaveOutcome::Duplicate);
            }
            Err(e) => return Err(e),
        };

        if let Err(e) = self.articles.init_stats(id).await {
            warn!(article_id = %id, "Failed to initialize article stats: {}", e);
        }

        if let Some(dispatcher) = &self.enrichment {
            dispatcher.dispatch(id, &article.content, EnrichmentKinds::ALL);
        }

        Ok(SaveOutcome::Created(id))
    }
}
