// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 调度模块
///
/// 负责决定本实例何时触发一轮完整爬取
pub mod scheduler;
