// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施服务模块
///
/// 提供领域服务特质的外部实现，目前包括调用摘要与倾向分析服务的HTTP客户端
pub mod enrichment_client;
