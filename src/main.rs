// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::sync::Arc;
use std::time::Duration;

use newscrawl::application::use_cases::crawl_orchestrator::{CrawlOrchestrator, CrawlPacing};
use newscrawl::config::settings::Settings;
use newscrawl::domain::repositories::article_repository::ArticleRepository;
use newscrawl::domain::repositories::catalog_repository::CatalogRepository;
use newscrawl::domain::services::content_normalizer::{ContentNormalizer, ContentRules};
use newscrawl::domain::services::enrichment_service::EnrichmentDispatcher;
use newscrawl::domain::services::persistence_gateway::PersistenceGateway;
use newscrawl::engines::browser_pool::{PoolConfig, ResourcePool};
use newscrawl::engines::chromium::ChromiumManager;
use newscrawl::engines::session::SessionScope;
use newscrawl::engines::traits::SessionOptions;
use newscrawl::infrastructure::database::connection;
use newscrawl::infrastructure::observability::metrics;
use newscrawl::infrastructure::repositories::article_repo_impl::ArticleRepositoryImpl;
use newscrawl::infrastructure::repositories::catalog_repo_impl::CatalogRepositoryImpl;
use newscrawl::infrastructure::services::enrichment_client::HttpEnrichmentClient;
use newscrawl::parsers::ParserRegistry;
use newscrawl::presentation::routes;
use newscrawl::queue::scheduler::ReplicaScheduler;
use newscrawl::utils::telemetry;
use newscrawl::workers::backfill_worker::BackfillWorker;
use newscrawl::workers::manager::{shutdown_signal, WorkerManager};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::{error, info, warn};

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并启动服务
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. 加载配置并初始化日志与指标
    let settings = Settings::new()?;
    telemetry::init_telemetry(&settings.logging);
    info!("Starting newscrawl {}...", env!("CARGO_PKG_VERSION"));
    metrics::init_metrics(&settings.metrics)?;

    // 2. 连接数据库并执行迁移
    let db = Arc::new(connection::connect_and_migrate(&settings.database).await?);
    info!("Database connection established");

    let articles: Arc<dyn ArticleRepository> = Arc::new(ArticleRepositoryImpl::new(db.clone()));
    let catalog: Arc<dyn CatalogRepository> = Arc::new(CatalogRepositoryImpl::new(db.clone()));

    // 3. 富化派发
    let dispatcher = if settings.enrichment.enabled {
        let client = Arc::new(HttpEnrichmentClient::new(&settings.enrichment)?);
        Some(Arc::new(EnrichmentDispatcher::new(
            client,
            articles.clone(),
            settings.enrichment.min_text_length,
        )))
    } else {
        info!("Enrichment dispatch disabled");
        None
    };

    // 4. 浏览器资源池
    let manager = ChromiumManager::new(
        &settings.browser_pool,
        Duration::from_millis(settings.session.navigation_timeout_ms),
    );
    let pool = ResourcePool::new(manager, PoolConfig::from(&settings.browser_pool));
    if let Err(e) = pool.start().await {
        error!("Browser pool warm-up failed, crawls will retry on demand: {}", e);
    }

    // 5. 编排器与调度器
    let registry = Arc::new(ParserRegistry::with_defaults(&settings));
    info!(sources = ?registry.names(), "Parsers registered");

    let gateway = Arc::new(PersistenceGateway::new(articles.clone(), catalog, dispatcher.clone()));
    let orchestrator = Arc::new(CrawlOrchestrator::new(
        registry,
        SessionScope::new(pool.clone(), SessionOptions::from(&settings.session)),
        gateway,
        Arc::new(ContentNormalizer::new(ContentRules::from(&settings.content))),
        CrawlPacing::from_settings(&settings),
    ));
    let scheduler = Arc::new(ReplicaScheduler::new(
        orchestrator.clone(),
        settings.scheduler.clone(),
    ));

    // 6. 后台循环
    let mut workers = WorkerManager::new();
    if settings.scheduler.auto_crawl {
        workers.start_scheduler(scheduler.clone());
    } else {
        info!("Automatic crawling disabled");
    }
    match (&dispatcher, settings.backfill.enabled) {
        (Some(dispatcher), true) => workers.start_worker(BackfillWorker::new(
            articles.clone(),
            dispatcher.clone(),
            &settings.backfill,
            settings.enrichment.min_text_length,
        )),
        (None, true) => warn!("Backfill enabled but enrichment is disabled, skipping"),
        _ => {}
    }

    // 7. 关闭顺序：停止后台循环 → 关闭资源池 → 等待进行中的爬取 → 停止HTTP服务
    let (stopped_tx, stopped_rx) = oneshot::channel();
    let drain_pool = pool.clone();
    let drain_scheduler = scheduler.clone();
    let run_grace = Duration::from_millis(settings.session.navigation_timeout_ms * 2);
    tokio::spawn(async move {
        shutdown_signal().await;
        workers.shutdown().await;
        drain_pool.destroy().await;
        info!("Browser pool drained");
        if drain_scheduler.wait_for_run(run_grace).await {
            info!("In-flight crawl finished");
        }
        let _ = stopped_tx.send(());
    });

    // 8. 启动HTTP服务
    let app = routes::routes(orchestrator, scheduler);
    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = stopped_rx.await;
        })
        .await?;

    info!("Server stopped");
    Ok(())
}
