// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum_test::TestServer;
use newscrawl::application::use_cases::crawl_orchestrator::{CrawlOrchestrator, CrawlPacing};
use newscrawl::config::settings::{DatabaseSettings, ScheduleMode, SchedulerSettings};
use newscrawl::domain::models::article::{BiasAssessment, ParsedArticle};
use newscrawl::domain::models::crawl::{DiscoveredUrl, SectionTarget};
use newscrawl::domain::repositories::article_repository::ArticleRepository;
use newscrawl::domain::services::content_normalizer::ContentNormalizer;
use newscrawl::domain::services::enrichment_service::{EnrichmentDispatcher, EnrichmentService};
use newscrawl::domain::services::persistence_gateway::PersistenceGateway;
use newscrawl::engines::browser_pool::{PoolConfig, ResourcePool};
use newscrawl::engines::session::SessionScope;
use newscrawl::engines::traits::{
    PageSession, PoolError, ResourceManager, SessionError, SessionHost, SessionOptions,
};
use newscrawl::infrastructure::database::connection;
use newscrawl::infrastructure::repositories::article_repo_impl::ArticleRepositoryImpl;
use newscrawl::infrastructure::repositories::catalog_repo_impl::CatalogRepositoryImpl;
use newscrawl::parsers::{common, PageExtractor, ParserRegistry};
use newscrawl::presentation::routes;
use newscrawl::queue::scheduler::ReplicaScheduler;
use scraper::Html;
use sea_orm::DatabaseConnection;
use uuid::Uuid;

/// 每个测试独占的内存SQLite数据库，已执行全部迁移
pub async fn test_db() -> Arc<DatabaseConnection> {
    let settings = DatabaseSettings {
        url: "sqlite::memory:".to_string(),
        max_connections: Some(1),
        min_connections: Some(1),
        connect_timeout: Some(5),
        idle_timeout: None,
    };
    Arc::new(
        connection::connect_and_migrate(&settings)
            .await
            .expect("failed to prepare test database"),
    )
}

/// 假浏览器共享的状态：页面内容、失败URL与并发统计
#[derive(Default)]
pub struct FakeWeb {
    pages: Mutex<HashMap<String, String>>,
    failing: Mutex<HashSet<String>>,
    pub open_pages: AtomicUsize,
    pub max_open_pages: AtomicUsize,
    pub navigations: AtomicUsize,
    /// 每次导航额外耗费的毫秒数
    pub extra_latency_ms: AtomicU64,
}

impl FakeWeb {
    pub fn serve(&self, url: &str, html: impl Into<String>) {
        self.pages.lock().unwrap().insert(url.to_string(), html.into());
    }

    pub fn fail(&self, url: &str) {
        self.failing.lock().unwrap().insert(url.to_string());
    }
}

/// 假资源管理器
pub struct FakeManager {
    pub web: Arc<FakeWeb>,
    pub created: Arc<AtomicUsize>,
    /// 为true时无法创建任何浏览器
    pub broken: bool,
}

pub struct FakeBrowser {
    web: Arc<FakeWeb>,
}

struct FakePage {
    web: Arc<FakeWeb>,
    current: Mutex<Option<String>>,
}

#[async_trait]
impl ResourceManager for FakeManager {
    type Resource = FakeBrowser;

    async fn create(&self) -> Result<FakeBrowser, PoolError> {
        if self.broken {
            return Err(PoolError::CreateFailed("chromium executable not found".into()));
        }
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(FakeBrowser {
            web: Arc::clone(&self.web),
        })
    }

    async fn is_valid(&self, _resource: &FakeBrowser) -> bool {
        true
    }

    async fn destroy(&self, _resource: FakeBrowser) {}
}

#[async_trait]
impl SessionHost for FakeBrowser {
    async fn open_page(&self, _options: &SessionOptions) -> Result<Box<dyn PageSession>, SessionError> {
        let open = self.web.open_pages.fetch_add(1, Ordering::SeqCst) + 1;
        self.web.max_open_pages.fetch_max(open, Ordering::SeqCst);
        Ok(Box::new(FakePage {
            web: Arc::clone(&self.web),
            current: Mutex::new(None),
        }))
    }
}

#[async_trait]
impl PageSession for FakePage {
    async fn navigate(&self, url: &str) -> Result<(), SessionError> {
        self.web.navigations.fetch_add(1, Ordering::SeqCst);
        // 让同一批次的其他会话有机会并发运行
        let latency = 5 + self.web.extra_latency_ms.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(latency)).await;
        if self.web.failing.lock().unwrap().contains(url) {
            return Err(SessionError::Navigation {
                url: url.to_string(),
                message: "net::ERR_CONNECTION_RESET".into(),
            });
        }
        *self.current.lock().unwrap() = Some(url.to_string());
        Ok(())
    }

    async fn wait_for_selector(&self, _selector: &str, _timeout: Duration) -> bool {
        true
    }

    async fn settle(&self) {}

    async fn html(&self) -> Result<String, SessionError> {
        let current = self.current.lock().unwrap().clone().unwrap_or_default();
        Ok(self
            .web
            .pages
            .lock()
            .unwrap()
            .get(&current)
            .cloned()
            .unwrap_or_else(|| "<html><body></body></html>".to_string()))
    }

    async fn close(&self) -> Result<(), SessionError> {
        self.web.open_pages.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

pub fn pool_config(max: usize) -> PoolConfig {
    PoolConfig {
        min: 0,
        max,
        acquire_timeout: Duration::from_secs(2),
        idle_eviction_interval: Duration::from_secs(60),
        idle_timeout: Duration::from_secs(60),
    }
}

pub fn session_options() -> SessionOptions {
    SessionOptions {
        navigation_timeout: Duration::from_secs(5),
        user_agent: "newscrawl-test".into(),
        block_resources: true,
        settle: Duration::ZERO,
    }
}

/// 单栏目的测试站点解析器，走与真实解析器相同的页面加载与提取流程
pub struct WireParser {
    pub name: &'static str,
    pub section_url: String,
    normalizer: Arc<ContentNormalizer>,
}

impl WireParser {
    pub fn new(name: &'static str, section_url: &str) -> Self {
        Self {
            name,
            section_url: section_url.to_string(),
            normalizer: Arc::new(ContentNormalizer::default()),
        }
    }
}

impl PageExtractor for WireParser {
    fn source_name(&self) -> &str {
        self.name
    }

    fn sections(&self) -> Vec<SectionTarget> {
        vec![SectionTarget::new(self.name, "경제", self.section_url.clone())]
    }

    fn extract_links(&self, document: &Html, section: &SectionTarget) -> Vec<DiscoveredUrl> {
        common::collect_links(
            document,
            &section.url,
            "a.headline",
            |url| url.path().starts_with("/article/"),
            &section.category,
            50,
        )
    }

    fn extract_article(&self, document: &Html, target: &DiscoveredUrl) -> Option<ParsedArticle> {
        let title = common::first_text(document, &["h1"])?;
        let content = common::first_plausible(
            &self.normalizer,
            [common::paragraphs(document, "div.body p", 10, &[])],
        )?;
        Some(ParsedArticle {
            title,
            content,
            url: target.url.clone(),
            image_url: None,
            reporter: None,
            published_at: None,
            category: target.category.clone(),
            origin_source: None,
        })
    }
}

/// 栏目页HTML
pub fn listing_html(links: &[String]) -> String {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<li><a class="headline" href="{}">기사</a></li>"#, href))
        .collect();
    format!("<html><body><ul>{}</ul></body></html>", anchors)
}

/// 正文足够长且为韩文的文章页HTML
pub fn article_html(title: &str) -> String {
    format!(
        r#"<html><body><h1>{}</h1><div class="body">
           <p>정부는 오늘 내년도 경제정책 방향을 발표하고 내수 회복을 위한 지원책을 내놓았다.</p>
           <p>기획재정부는 소비 심리가 점차 살아나고 있지만 수출 둔화 우려가 남아 있다고 설명했다.</p>
           <p>전문가들은 금리 흐름과 물가 상황을 함께 지켜봐야 한다고 조언했다.</p>
           </div></body></html>"#,
        title
    )
}

/// 记录调用的富化服务
#[derive(Default)]
pub struct RecordingEnrichment {
    pub summarized: Mutex<Vec<Uuid>>,
    pub analyzed: Mutex<Vec<Uuid>>,
}

#[async_trait]
impl EnrichmentService for RecordingEnrichment {
    async fn summarize(&self, article_id: Uuid, _text: &str) -> anyhow::Result<Option<String>> {
        self.summarized.lock().unwrap().push(article_id);
        Ok(Some("경제정책 방향 발표".into()))
    }

    async fn analyze_bias(&self, article_id: Uuid, _text: &str) -> anyhow::Result<Option<BiasAssessment>> {
        self.analyzed.lock().unwrap().push(article_id);
        Ok(Some(BiasAssessment {
            bias_score: Some(0.1),
            political_leaning: Some("neutral".into()),
            confidence: Some(0.8),
            analysis_data: serde_json::json!({ "political": { "bias_score": 0.1 } }),
        }))
    }
}

/// 组装好的测试应用
#[allow(dead_code)]
pub struct TestApp {
    pub db: Arc<DatabaseConnection>,
    pub web: Arc<FakeWeb>,
    pub articles: Arc<ArticleRepositoryImpl>,
    pub enrichment: Arc<RecordingEnrichment>,
    pub orchestrator: Arc<CrawlOrchestrator<FakeManager>>,
    pub scheduler: Arc<ReplicaScheduler>,
}

impl TestApp {
    pub fn server(&self) -> TestServer {
        TestServer::new(routes::routes(self.orchestrator.clone(), self.scheduler.clone()))
            .expect("failed to start test server")
    }

    pub async fn stored(&self) -> u64 {
        self.articles.count().await.unwrap()
    }
}

pub struct TestAppOptions {
    pub pool_max: usize,
    pub broken_browser: bool,
    pub enrichment: bool,
}

impl Default for TestAppOptions {
    fn default() -> Self {
        Self {
            pool_max: 3,
            broken_browser: false,
            enrichment: false,
        }
    }
}

pub async fn create_test_app(parsers: Vec<WireParser>) -> TestApp {
    create_test_app_with_options(parsers, TestAppOptions::default()).await
}

pub async fn create_test_app_with_options(parsers: Vec<WireParser>, options: TestAppOptions) -> TestApp {
    let db = test_db().await;
    let web = Arc::new(FakeWeb::default());

    let manager = FakeManager {
        web: Arc::clone(&web),
        created: Arc::new(AtomicUsize::new(0)),
        broken: options.broken_browser,
    };
    let pool = ResourcePool::new(manager, pool_config(options.pool_max));

    let mut registry = ParserRegistry::new();
    for parser in parsers {
        registry.register(Arc::new(parser));
    }

    let articles = Arc::new(ArticleRepositoryImpl::new(db.clone()));
    let enrichment = Arc::new(RecordingEnrichment::default());
    let dispatcher = options.enrichment.then(|| {
        Arc::new(EnrichmentDispatcher::new(
            enrichment.clone(),
            articles.clone(),
            100,
        ))
    });
    let gateway = Arc::new(PersistenceGateway::new(
        articles.clone(),
        Arc::new(CatalogRepositoryImpl::new(db.clone())),
        dispatcher,
    ));

    let orchestrator = Arc::new(CrawlOrchestrator::new(
        Arc::new(registry),
        SessionScope::new(pool, session_options()),
        gateway,
        Arc::new(ContentNormalizer::default()),
        CrawlPacing {
            request_delay: Duration::ZERO,
            section_delay: Duration::ZERO,
            chunk_size: options.pool_max,
        },
    ));
    let scheduler = Arc::new(ReplicaScheduler::new(
        orchestrator.clone(),
        SchedulerSettings {
            auto_crawl: false,
            interval_ms: 180_000,
            mode: ScheduleMode::Static,
            replica_index: 0,
            total_replicas: 1,
        },
    ));

    TestApp {
        db,
        web,
        articles,
        enrichment,
        orchestrator,
        scheduler,
    }
}
