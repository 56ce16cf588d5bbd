// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::repositories::catalog_repository::CatalogRepository;
use crate::infrastructure::database::entities::{category, source};
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use sea_orm::*;
use std::sync::Arc;
use tracing::info;

/// 目录仓库实现
///
/// 名称到ID的映射缓存在内存中，新闻源与分类在运行期间只增不改
pub struct CatalogRepositoryImpl {
    db: Arc<DatabaseConnection>,
    sources: DashMap<String, i32>,
    categories: DashMap<String, i32>,
}

impl CatalogRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            db,
            sources: DashMap::new(),
            categories: DashMap::new(),
        }
    }

    async fn find_source(&self, name: &str) -> Result<Option<i32>, RepositoryError> {
        Ok(source::Entity::find()
            .filter(source::Column::Name.eq(name))
            .one(self.db.as_ref())
            .await?
            .map(|m| m.id))
    }

    async fn find_category(&self, name: &str) -> Result<Option<i32>, RepositoryError> {
        Ok(category::Entity::find()
            .filter(category::Column::Name.eq(name))
            .one(self.db.as_ref())
            .await?
            .map(|m| m.id))
    }
}

#[async_trait]
impl CatalogRepository for CatalogRepositoryImpl {
    async fn ensure_source(&self, name: &str) -> Result<i32, RepositoryError> {
        if let Some(id) = self.sources.get(name) {
            return Ok(*id);
        }

        let id = match self.find_source(name).await? {
            Some(id) => id,
            None => {
                let model = source::ActiveModel {
                    name: Set(name.to_string()),
                    logo_url: Set(None),
                    created_at: Set(Utc::now().into()),
                    ..Default::default()
                };
                match model.insert(self.db.as_ref()).await.map_err(RepositoryError::from) {
                    Ok(created) => {
                        info!("新闻源已创建: {}", name);
                        created.id
                    }
                    // 另一个副本刚刚创建了同名新闻源
                    Err(RepositoryError::AlreadyExists) => {
                        self.find_source(name).await?.ok_or(RepositoryError::NotFound)?
                    }
                    Err(e) => return Err(e),
                }
            }
        };

        self.sources.insert(name.to_string(), id);
        Ok(id)
    }

    async fn ensure_category(&self, name: &str) -> Result<i32, RepositoryError> {
        if let Some(id) = self.categories.get(name) {
            return Ok(*id);
        }

        let id = match self.find_category(name).await? {
            Some(id) => id,
            None => {
                let model = category::ActiveModel {
                    name: Set(name.to_string()),
                    created_at: Set(Utc::now().into()),
                    ..Default::default()
                };
                match model.insert(self.db.as_ref()).await.map_err(RepositoryError::from) {
                    Ok(created) => {
                        info!("分类已创建: {}", name);
                        created.id
                    }
                    Err(RepositoryError::AlreadyExists) => {
                        self.find_category(name).await?.ok_or(RepositoryError::NotFound)?
                    }
                    Err(e) => return Err(e),
                }
            }
        };

        self.categories.insert(name.to_string(), id);
        Ok(id)
    }
}
