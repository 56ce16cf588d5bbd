// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::net::SocketAddr;

use anyhow::Context;
use metrics::{describe_counter, describe_gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::info;

use crate::config::settings::MetricsSettings;

/// 初始化指标系统
///
/// 在 `listen_addr` 上启动 Prometheus 导出端并注册各类监控指标；
/// 未启用时不安装记录器，指标宏成为空操作
///
/// # 参数
///
/// * `settings` - 指标配置
pub fn init_metrics(settings: &MetricsSettings) -> anyhow::Result<()> {
    if !settings.enabled {
        info!("Metrics exporter disabled");
        return Ok(());
    }

    let addr: SocketAddr = settings
        .listen_addr
        .parse()
        .with_context(|| format!("invalid metrics address {}", settings.listen_addr))?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .context("failed to install Prometheus recorder")?;

    describe_metrics();
    info!("Metrics exporter listening on {}", addr);
    Ok(())
}

fn describe_metrics() {
    describe_counter!(
        "crawl_urls_discovered_total",
        "Article URLs discovered on section pages, after de-duplication"
    );
    describe_counter!("crawl_articles_parsed_total", "Articles parsed and validated");
    describe_counter!("crawl_articles_persisted_total", "Articles newly stored");
    describe_counter!(
        "crawl_articles_duplicate_total",
        "Articles skipped because the URL was already stored"
    );
    describe_counter!(
        "crawl_articles_failed_total",
        "Articles that failed navigation, parsing or storage"
    );
    describe_counter!(
        "crawl_articles_skipped_total",
        "Pages without a plausible article body"
    );
    describe_counter!(
        "crawl_runs_skipped_total",
        "Crawl triggers skipped because a run was still in progress"
    );
    describe_counter!(
        "enrichment_dispatch_failed_total",
        "Failed enrichment requests by kind"
    );
    describe_gauge!("browser_pool_borrowed", "Browser resources currently borrowed");
    describe_gauge!("browser_pool_idle", "Browser resources currently idle");
}
