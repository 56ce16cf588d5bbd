// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 文章模型
///
/// 解析结果、待写入文章、持久化结果等
pub mod article;

/// 爬取模型
///
/// 栏目目标、候选链接、运行阶段与统计
pub mod crawl;
