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

use crate::domain::models::article::{BiasAssessment, NewArticle, StoredArticle};
use crate::domain::repositories::article_repository::{ArticleRepository, EnrichmentCandidate};
use crate::infrastructure::database::entities::{article_stat, bias_analysis, news_article};
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::*;
use std::sync::Arc;
use uuid::Uuid;

/// 文章仓库实现
pub struct ArticleRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl ArticleRepositoryImpl {
    /// 创建新的文章仓库实例
    ///
    /// # 参数
    ///
    /// * `db` - 数据库连接
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

fn to_stored(m: news_article::Model) -> StoredArticle {
    StoredArticle {
        id: m.id,
        title: m.title,
        content: m.content,
        url: m.url,
        source_id: m.source_id,
        category_id: m.category_id,
        ai_summary: m.ai_summary,
        published_at: m.published_at.into(),
    }
}

#[async_trait]
impl ArticleRepository for ArticleRepositoryImpl {
    async fn exists_by_url(&self, url: &str) -> Result<bool, RepositoryError> {
        let count = news_article::Entity::find()
            .filter(news_article::Column::Url.eq(url))
            .count(self.db.as_ref())
            .await?;
        Ok(count > 0)
    }

    async fn insert(
        &self,
        article: &NewArticle,
        source_id: i32,
        category_id: i32,
    ) -> Result<Uuid, RepositoryError> {
        let id = Uuid::new_v4();
        let model = news_article::ActiveModel {
            id: Set(id),
            title: Set(article.title.clone()),
            content: Set(article.content.clone()),
            url: Set(article.url.clone()),
            source_id: Set(source_id),
            category_id: Set(category_id),
            reporter: Set(article.reporter.clone()),
            image_url: Set(article.image_url.clone()),
            ai_summary: Set(None),
            published_at: Set(article.published_at.into()),
            created_at: Set(Utc::now().into()),
        };

        news_article::Entity::insert(model)
            .exec_without_returning(self.db.as_ref())
            .await?;
        Ok(id)
    }

    async fn init_stats(&self, article_id: Uuid) -> Result<(), RepositoryError> {
        let model = article_stat::ActiveModel {
            article_id: Set(article_id),
            view_count: Set(0),
            like_count: Set(0),
            bookmark_count: Set(0),
        };

        article_stat::Entity::insert(model)
            .on_conflict(
                OnConflict::column(article_stat::Column::ArticleId)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await?;
        Ok(())
    }

    async fn save_summary(&self, article_id: Uuid, summary: &str) -> Result<(), RepositoryError> {
        let result = news_article::Entity::update_many()
            .col_expr(news_article::Column::AiSummary, Expr::value(summary))
            .filter(news_article::Column::Id.eq(article_id))
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn save_bias(
        &self,
        article_id: Uuid,
        assessment: &BiasAssessment,
    ) -> Result<(), RepositoryError> {
        let model = bias_analysis::ActiveModel {
            id: Set(Uuid::new_v4()),
            article_id: Set(article_id),
            bias_score: Set(assessment.bias_score),
            political_leaning: Set(assessment.political_leaning.clone()),
            confidence: Set(assessment.confidence),
            analysis_data: Set(Some(assessment.analysis_data.clone())),
            analyzed_at: Set(Utc::now().into()),
        };

        bias_analysis::Entity::insert(model)
            .on_conflict(
                OnConflict::column(bias_analysis::Column::ArticleId)
                    .update_columns([
                        bias_analysis::Column::BiasScore,
                        bias_analysis::Column::PoliticalLeaning,
                        bias_analysis::Column::Confidence,
                        bias_analysis::Column::AnalysisData,
                        bias_analysis::Column::AnalyzedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await?;
        Ok(())
    }

    async fn find_needing_enrichment(
        &self,
        min_content_length: usize,
        limit: u64,
    ) -> Result<Vec<EnrichmentCandidate>, RepositoryError> {
        let rows = news_article::Entity::find()
            .find_also_related(bias_analysis::Entity)
            .filter(
                Condition::any()
                    .add(news_article::Column::AiSummary.is_null())
                    .add(bias_analysis::Column::Id.is_null()),
            )
            .filter(
                Expr::expr(Expr::cust("LENGTH(news_articles.content)"))
                    .gte(min_content_length as i64),
            )
            .order_by_desc(news_article::Column::CreatedAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await?;

        Ok(rows
            .into_iter()
            .map(|(article, bias)| EnrichmentCandidate {
                needs_summary: article.ai_summary.is_none(),
                needs_bias: bias.is_none(),
                article: to_stored(article),
            })
            .collect())
    }

    async fn find_by_url(&self, url: &str) -> Result<Option<StoredArticle>, RepositoryError> {
        let model = news_article::Entity::find()
            .filter(news_article::Column::Url.eq(url))
            .one(self.db.as_ref())
            .await?;
        Ok(model.map(to_stored))
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        Ok(news_article::Entity::find().count(self.db.as_ref()).await?)
    }
}
