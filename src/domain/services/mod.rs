// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 该模块包含新闻采集的核心业务规则，不依赖具体的浏览器或数据库实现。
///
/// 包含的服务：
/// - 正文规范化（content_normalizer）：清洗正文并做合理性检查
/// - 富化服务（enrichment_service）：摘要与倾向分析的调用契约与后台派发
/// - 持久化网关（persistence_gateway）：按URL去重写入文章
/// - 来源解析（source_resolver）：由URL确定文章的真实媒体
pub mod content_normalizer;
pub mod enrichment_service;
pub mod persistence_gateway;
pub mod source_resolver;
