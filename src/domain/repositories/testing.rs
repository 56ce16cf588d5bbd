// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 单元测试使用的内存仓库

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use uuid::Uuid;

use crate::domain::models::article::{BiasAssessment, NewArticle, StoredArticle};
use crate::domain::repositories::article_repository::{ArticleRepository, EnrichmentCandidate};
use crate::domain::repositories::catalog_repository::CatalogRepository;
use crate::utils::errors::RepositoryError;

#[derive(Debug, Clone)]
pub struct StoredRow {
    pub article: StoredArticle,
    pub reporter: Option<String>,
    pub image_url: Option<String>,
    pub bias: Option<BiasAssessment>,
    pub stats_initialized: bool,
}

#[derive(Default)]
pub struct InMemoryArticleRepository {
    pub rows: Mutex<HashMap<String, StoredRow>>,
    pub fail_stats: bool,
    pub inserts: AtomicUsize,
}

impl InMemoryArticleRepository {
    pub fn row(&self, url: &str) -> Option<StoredRow> {
        self.rows.lock().get(url).cloned()
    }

    pub fn row_by_id(&self, id: Uuid) -> Option<StoredRow> {
        self.rows.lock().values().find(|r| r.article.id == id).cloned()
    }

    pub fn insert_count(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArticleRepository for InMemoryArticleRepository {
    async fn exists_by_url(&self, url: &str) -> Result<bool, RepositoryError> {
        Ok(self.rows.lock().contains_key(url))
    }

    async fn insert(
        &self,
        article: &NewArticle,
        source_id: i32,
        category_id: i32,
    ) -> Result<Uuid, RepositoryError> {
        let mut rows = self.rows.lock();
        if rows.contains_key(&article.url) {
            return Err(RepositoryError::AlreadyExists);
        }
        let id = Uuid::new_v4();
        rows.insert(
            article.url.clone(),
            StoredRow {
                article: StoredArticle {
                    id,
                    title: article.title.clone(),
                    content: article.content.clone(),
                    url: article.url.clone(),
                    source_id,
                    category_id,
                    ai_summary: None,
                    published_at: article.published_at,
                },
                reporter: article.reporter.clone(),
                image_url: article.image_url.clone(),
                bias: None,
                stats_initialized: false,
            },
        );
        self.inserts.fetch_add(1, Ordering::SeqCst);
        Ok(id)
    }

    async fn init_stats(&self, article_id: Uuid) -> Result<(), RepositoryError> {
        if self.fail_stats {
            return Err(RepositoryError::DatabaseError("stats table unavailable".into()));
        }
        let mut rows = self.rows.lock();
        match rows.values_mut().find(|r| r.article.id == article_id) {
            Some(row) => {
                row.stats_initialized = true;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    async fn save_summary(&self, article_id: Uuid, summary: &str) -> Result<(), RepositoryError> {
        let mut rows = self.rows.lock();
        let row = rows
            .values_mut()
            .find(|r| r.article.id == article_id)
            .ok_or(RepositoryError::NotFound)?;
        row.article.ai_summary = Some(summary.to_string());
        Ok(())
    }

    async fn save_bias(
        &self,
        article_id: Uuid,
        assessment: &BiasAssessment,
    ) -> Result<(), RepositoryError> {
        let mut rows = self.rows.lock();
        let row = rows
            .values_mut()
            .find(|r| r.article.id == article_id)
            .ok_or(RepositoryError::NotFound)?;
        row.bias = Some(assessment.clone());
        Ok(())
    }

    async fn find_needing_enrichment(
        &self,
        min_content_length: usize,
        limit: u64,
    ) -> Result<Vec<EnrichmentCandidate>, RepositoryError> {
        let rows = self.rows.lock();
        let mut candidates: Vec<EnrichmentCandidate> = rows
            .values()
            .filter(|r| r.article.content.chars().count() >= min_content_length)
            .filter(|r| r.article.ai_summary.is_none() || r.bias.is_none())
            .map(|r| EnrichmentCandidate {
                article: r.article.clone(),
                needs_summary: r.article.ai_summary.is_none(),
                needs_bias: r.bias.is_none(),
            })
            .collect();
        candidates.sort_by(|a, b| b.article.published_at.cmp(&a.article.published_at));
        candidates.truncate(limit as usize);
        Ok(candidates)
    }

    async fn find_by_url(&self, url: &str) -> Result<Option<StoredArticle>, RepositoryError> {
        Ok(self.rows.lock().get(url).map(|r| r.article.clone()))
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        Ok(self.rows.lock().len() as u64)
    }
}

#[derive(Default)]
pub struct InMemoryCatalogRepository {
    pub sources: Mutex<Vec<String>>,
    pub categories: Mutex<Vec<String>>,
}

fn ensure(names: &Mutex<Vec<String>>, name: &str) -> i32 {
    let mut names = names.lock();
    let index = match names.iter().position(|n| n == name) {
        Some(index) => index,
        None => {
            names.push(name.to_string());
            names.len() - 1
        }
    };
    index as i32 + 1
}

impl InMemoryCatalogRepository {
    pub fn source_names(&self) -> Vec<String> {
        self.sources.lock().clone()
    }

    pub fn category_names(&self) -> Vec<String> {
        self.categories.lock().clone()
    }
}

#[async_trait]
impl CatalogRepository for InMemoryCatalogRepository {
    async fn ensure_source(&self, name: &str) -> Result<i32, RepositoryError> {
        Ok(ensure(&self.sources, name))
    }

    async fn ensure_category(&self, name: &str) -> Result<i32, RepositoryError> {
        Ok(ensure(&self.categories, name))
    }
}
