// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用程序模块
///
/// 爬取编排与对外接口的数据结构
pub mod application;

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 包含核心业务实体、服务和仓库接口
pub mod domain;

/// 引擎模块
///
/// 浏览器资源池与页面会话
pub mod engines;

/// 基础设施模块
///
/// 提供外部服务集成，如数据库、指标导出与富化服务客户端
pub mod infrastructure;

/// 解析器模块
///
/// 各新闻站点的链接发现与文章解析
pub mod parsers;

/// 表示层模块
///
/// 处理HTTP请求和响应，包括路由和处理器
pub mod presentation;

/// 队列模块
///
/// 副本调度
pub mod queue;

/// 工具模块
///
/// 错误类型与日志初始化
pub mod utils;

/// 工作器模块
///
/// 实现后台任务处理和工作器管理
pub mod workers;
