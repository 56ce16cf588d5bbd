// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库接口模块
///
/// 该模块定义了领域层的仓库接口，具体实现由基础设施层提供。
///
/// 包含的仓库接口：
/// - 文章仓库（article_repository）：文章、统计与富化结果的持久化
/// - 目录仓库（catalog_repository）：新闻源与分类的解析与创建
pub mod article_repository;
pub mod catalog_repository;

#[cfg(test)]
pub(crate) mod testing;
