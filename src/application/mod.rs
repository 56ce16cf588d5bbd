// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用程序模块
///
/// 编排领域服务完成一轮爬取，并定义对外接口使用的数据结构
pub mod dto;
pub mod use_cases;
