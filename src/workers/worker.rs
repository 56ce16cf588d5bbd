// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::utils::errors::WorkerError;
use async_trait::async_trait;

/// 后台Worker特质
///
/// `run` 通常是一个不会主动返回的周期循环，
/// 由 `WorkerManager` 在关闭时取消
#[async_trait]
pub trait Worker: Send + Sync {
    /// 运行Worker循环
    async fn run(&self) -> Result<(), WorkerError>;

    /// Worker名称，用于日志
    fn name(&self) -> &str;
}
