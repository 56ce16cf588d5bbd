// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::utils::errors::RepositoryError;
use async_trait::async_trait;

/// 目录仓库特质
///
/// 新闻源与分类按名称解析为ID，不存在时创建
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// 解析或创建新闻源
    ///
    /// # 参数
    ///
    /// * `name` - 新闻源名称
    ///
    /// # 返回值
    ///
    /// * `Ok(i32)` - 新闻源ID
    /// * `Err(RepositoryError)` - 操作失败
    async fn ensure_source(&self, name: &str) -> Result<i32, RepositoryError>;

    /// 解析或创建分类
    ///
    /// # 参数
    ///
    /// * `name` - 分类名称
    ///
    /// # 返回值
    ///
    /// * `Ok(i32)` - 分类ID
    /// * `Err(RepositoryError)` - 操作失败
    async fn ensure_category(&self, name: &str) -> Result<i32, RepositoryError>;
}
