// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::settings::LoggingSettings;

/// 未设置 `RUST_LOG` 时使用的过滤规则
pub const DEFAULT_FILTER: &str = "info,newscrawl=debug";

/// 初始化日志
///
/// # 参数
///
/// * `settings` - 日志配置，`json` 为true时输出JSON格式
pub fn init_telemetry(settings: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);

    if settings.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
