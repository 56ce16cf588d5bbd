// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// HTTP请求处理器模块
///
/// - 爬取触发（crawl_handler）：单个新闻源同步爬取、全量后台爬取
/// - 状态查询（status_handler）：健康检查、资源池与调度器状态
pub mod crawl_handler;
pub mod status_handler;
