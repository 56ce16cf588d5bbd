// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::article::{BiasAssessment, NewArticle, StoredArticle};
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;
use uuid::Uuid;

/// 文章仓库特质
///
/// `url` 在存储层唯一，重复插入返回 `RepositoryError::AlreadyExists`
#[async_trait]
pub trait ArticleRepository: Send + Sync {
    /// 检查URL是否已入库
    ///
    /// # 参数
    ///
    /// * `url` - 文章URL
    ///
    /// # 返回值
    ///
    /// * `Ok(true)` - 已存在
    /// * `Ok(false)` - 不存在
    /// * `Err(RepositoryError)` - 查询失败
    async fn exists_by_url(&self, url: &str) -> Result<bool, RepositoryError>;

    /// 插入文章
    ///
    /// # 参数
    ///
    /// * `article` - 待写入的文章
    /// * `source_id` - 已解析的新闻源ID
    /// * `category_id` - 已解析的分类ID
    ///
    /// # 返回值
    ///
    /// * `Ok(Uuid)` - 新文章ID
    /// * `Err(RepositoryError::AlreadyExists)` - URL已存在
    async fn insert(
        &self,
        article: &NewArticle,
        source_id: i32,
        category_id: i32,
    ) -> Result<Uuid, RepositoryError>;

    /// 初始化文章的零值统计，已存在时不做任何事
    async fn init_stats(&self, article_id: Uuid) -> Result<(), RepositoryError>;

    /// 写入摘要
    async fn save_summary(&self, article_id: Uuid, summary: &str) -> Result<(), RepositoryError>;

    /// 写入或覆盖倾向分析结果
    async fn save_bias(
        &self,
        article_id: Uuid,
        assessment: &BiasAssessment,
    ) -> Result<(), RepositoryError>;

    /// 查找缺少摘要或倾向分析的文章
    ///
    /// # 参数
    ///
    /// * `min_content_length` - 正文最小长度
    /// * `limit` - 最多返回的条数
    async fn find_needing_enrichment(
        &self,
        min_content_length: usize,
        limit: u64,
    ) -> Result<Vec<EnrichmentCandidate>, RepositoryError>;

    /// 按URL查找文章
    async fn find_by_url(&self, url: &str) -> Result<Option<StoredArticle>, RepositoryError>;

    /// 文章总数
    async fn count(&self) -> Result<u64, RepositoryError>;
}

/// 待回填富化的文章
#[derive(Debug, Clone)]
pub struct EnrichmentCandidate {
    pub article: StoredArticle,
    /// 缺少摘要
    pub needs_summary: bool,
    /// 缺少倾向分析
    pub needs_bias: bool,
}
