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

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use futures::future::join_all;
use metrics::counter;
use tracing::{debug, error, info, instrument, warn};

use crate::config::settings::Settings;
use crate::domain::models::article::{ParsedArticle, SaveOutcome};
use crate::domain::models::crawl::{CrawlPhase, CrawlReport, CrawlSummary, DiscoveredUrl, SectionTarget};
use crate::domain::services::content_normalizer::ContentNormalizer;
use crate::domain::services::persistence_gateway::PersistenceGateway;
use crate::engines::session::SessionScope;
use crate::engines::traits::{ResourceManager, SessionError, SessionHost};
use crate::parsers::{ParserRegistry, SiteParser};
use crate::utils::errors::CrawlError;

/// 对目标站点的请求节奏
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlPacing {
    /// 同一批次内相邻请求的间隔，批次之间也等待同样的时长
    pub request_delay: Duration,
    /// 相邻栏目之间的间隔
    pub section_delay: Duration,
    /// 每批并发处理的链接数
    pub chunk_size: usize,
}

impl CrawlPacing {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            request_delay: Duration::from_millis(settings.crawler.request_delay_ms),
            section_delay: Duration::from_millis(settings.crawler.section_delay_ms),
            chunk_size: settings.browser_pool.max.max(1),
        }
    }
}

/// 单个链接抓取阶段的结果
enum FetchOutcome {
    Parsed(ParsedArticle),
    Skipped,
    Failed { fatal: bool, message: String },
}

/// 爬取编排器
///
/// 对单个新闻源依次执行：发现链接 → 分批并发抓取解析 → 写入。
/// 单个栏目或链接的失败只计入统计，只有致命错误才会中止本轮
pub struct CrawlOrchestrator<M: ResourceManager> {
    registry: Arc<ParserRegistry>,
    sessions: SessionScope<M>,
    gateway: Arc<PersistenceGateway>,
    normalizer: Arc<ContentNormalizer>,
    pacing: CrawlPacing,
    phases: DashMap<String, CrawlPhase>,
}

impl<M> CrawlOrchestrator<M>
where
    M: ResourceManager,
    M::Resource: SessionHost,
{
    pub fn new(
        registry: Arc<ParserRegistry>,
        sessions: SessionScope<M>,
        gateway: Arc<PersistenceGateway>,
        normalizer: Arc<ContentNormalizer>,
        pacing: CrawlPacing,
    ) -> Self {
        Self {
            registry,
            sessions,
            gateway,
            normalizer,
            pacing,
            phases: DashMap::new(),
        }
    }

    pub fn registry(&self) -> &ParserRegistry {
        &self.registry
    }

    pub fn sessions(&self) -> &SessionScope<M> {
        &self.sessions
    }

    /// 各新闻源最近一次爬取所处的阶段
    pub fn phases(&self) -> BTreeMap<String, CrawlPhase> {
        self.phases
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect()
    }

    fn enter(&self, source: &str, phase: CrawlPhase) {
        debug!(source, %phase, "Crawl phase");
        self.phases.insert(source.to_string(), phase);
    }

    /// 依次爬取所有已注册的新闻源
    ///
    /// # 返回值
    ///
    /// 各新闻源的统计与合计；遇到致命错误时停止并在 `aborted` 中记录
    pub async fn crawl_all(&self) -> CrawlReport {
        let mut report = CrawlReport::default();
        let names = self.registry.names();
        info!("Starting crawl of {} sources", names.len());

        for source in names {
            match self.crawl_source(&source).await {
                Ok(summary) => report.push(summary),
                Err(e) if e.is_fatal() => {
                    error!(source = %source, "Crawl aborted: {}", e);
                    report.aborted.push(format!("{}: {}", source, e));
                    break;
                }
                Err(e) => {
                    warn!(source = %source, "Source skipped: {}", e);
                    report.aborted.push(format!("{}: {}", source, e));
                }
            }
        }

        info!(
            discovered = report.totals.discovered,
            persisted = report.totals.persisted,
            duplicates = report.totals.duplicates,
            failed = report.totals.failed,
            "Crawl of all sources finished"
        );
        report
    }

    /// 爬取单个新闻源
    ///
    /// # 参数
    ///
    /// * `source` - 新闻源名称
    ///
    /// # 返回值
    ///
    /// * `Ok(CrawlSummary)` - 本轮统计，局部失败体现在计数中
    /// * `Err(CrawlError::UnknownSource)` - 没有注册该新闻源
    /// * `Err(CrawlError)` - 致命错误，本轮中止
    #[instrument(skip(self), fields(source = %source))]
    pub async fn crawl_source(&self, source: &str) -> Result<CrawlSummary, CrawlError> {
        let parser = self
            .registry
            .get(source)
            .ok_or_else(|| CrawlError::UnknownSource(source.to_string()))?;

        let mut summary = CrawlSummary::new(source);

        self.enter(source, CrawlPhase::Discovering);
        let targets = match self.discover(&parser, &mut summary).await {
            Ok(targets) => targets,
            Err(e) => {
                self.enter(source, CrawlPhase::PartialFailure);
                return Err(e);
            }
        };
        summary.discovered = targets.len();
        counter!("crawl_urls_discovered_total", "source" => source.to_string())
            .increment(targets.len() as u64);
        info!("Discovered {} article URLs", targets.len());

        for (index, chunk) in targets.chunks(self.pacing.chunk_size.max(1)).enumerate() {
            if index > 0 {
                tokio::time::sleep(self.pacing.request_delay).await;
            }

            self.enter(source, CrawlPhase::FetchingBatch);
            let outcomes = join_all(chunk.iter().enumerate().map(|(position, target)| {
                let parser = Arc::clone(&parser);
                async move {
                    let delay = self.pacing.request_delay * position as u32;
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    (target, self.fetch(parser, target.clone()).await)
                }
            }))
            .await;

            let mut fatal = None;
            let mut parsed = Vec::new();
            for (target, outcome) in outcomes {
                match outcome {
                    FetchOutcome::Parsed(article) => parsed.push(article),
                    FetchOutcome::Skipped => {
                        summary.skipped += 1;
                        counter!("crawl_articles_skipped_total", "source" => source.to_string()).increment(1);
                    }
                    FetchOutcome::Failed { fatal: is_fatal, message } => {
                        summary.failed += 1;
                        counter!("crawl_articles_failed_total", "source" => source.to_string()).increment(1);
                        warn!(url = %target.url, "Article failed: {}", message);
                        if is_fatal {
                            fatal = Some(message);
                        }
                    }
                }
            }
            summary.parsed += parsed.len();
            counter!("crawl_articles_parsed_total", "source" => source.to_string())
                .increment(parsed.len() as u64);

            self.enter(source, CrawlPhase::Persisting);
            for article in parsed {
                self.persist(article, source, &mut summary).await;
            }

            if let Some(message) = fatal {
                self.enter(source, CrawlPhase::PartialFailure);
                error!(?summary, "Aborting crawl after fatal error");
                return Err(CrawlError::Fatal(message));
            }
        }

        summary.phase = if summary.has_failures() {
            CrawlPhase::PartialFailure
        } else {
            CrawlPhase::Done
        };
        self.enter(source, summary.phase);

        info!(
            discovered = summary.discovered,
            parsed = summary.parsed,
            persisted = summary.persisted,
            duplicates = summary.duplicates,
            failed = summary.failed,
            skipped = summary.skipped,
            failed_sections = summary.failed_sections,
            "Source crawl finished"
        );
        Ok(summary)
    }

    /// 按配置顺序发现各栏目的文章链接，跨栏目去重，先出现的栏目分类优先
    async fn discover(
        &self,
        parser: &Arc<dyn SiteParser>,
        summary: &mut CrawlSummary,
    ) -> Result<Vec<DiscoveredUrl>, CrawlError> {
        let mut seen = HashSet::new();
        let mut targets = Vec::new();

        for (index, section) in parser.sections().into_iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.pacing.section_delay).await;
            }

            match self.discover_section(Arc::clone(parser), section.clone()).await {
                Ok(urls) => {
                    debug!(section = %section.url, count = urls.len(), "Section discovered");
                    for url in urls {
                        if seen.insert(url.url.clone()) {
                            targets.push(url);
                        }
                    }
                }
                Err(e) if e.is_fatal() => return Err(CrawlError::Session(e)),
                Err(e) => {
                    summary.failed_sections += 1;
                    self.enter(&summary.source, CrawlPhase::PartialFailure);
                    warn!(section = %section.url, "Section discovery failed: {}", e);
                }
            }
        }

        Ok(targets)
    }

    async fn discover_section(
        &self,
        parser: Arc<dyn SiteParser>,
        section: SectionTarget,
    ) -> Result<Vec<DiscoveredUrl>, SessionError> {
        self.sessions
            .with_session(|page| async move { parser.discover_urls(page.as_ref(), &section).await })
            .await
    }

    /// 在独立会话中抓取并解析一个链接
    async fn fetch(&self, parser: Arc<dyn SiteParser>, target: DiscoveredUrl) -> FetchOutcome {
        let url = target.url.clone();
        let result = self
            .sessions
            .with_session(|page| async move { parser.parse_article(page.as_ref(), &target).await })
            .await;

        match result {
            Ok(Some(article)) => match self.validate(&article) {
                Ok(()) => FetchOutcome::Parsed(article),
                Err(reason) => {
                    debug!(url = %url, "Parsed article rejected: {}", reason);
                    FetchOutcome::Skipped
                }
            },
            Ok(None) => {
                debug!(url = %url, "No article on page");
                FetchOutcome::Skipped
            }
            Err(e) => FetchOutcome::Failed {
                fatal: e.is_fatal(),
                message: e.to_string(),
            },
        }
    }

    /// 写入前再次确认标题、正文与合理性检查
    fn validate(&self, article: &ParsedArticle) -> Result<(), String> {
        if article.title.trim().is_empty() {
            return Err("empty title".to_string());
        }
        self.normalizer
            .check(&article.content)
            .map_err(|rejection| rejection.to_string())
    }

    async fn persist(&self, article: ParsedArticle, source: &str, summary: &mut CrawlSummary) {
        let url = article.url.clone();
        let canonical = PersistenceGateway::canonicalize(article, source);

        match self.gateway.save(&canonical).await {
            Ok(SaveOutcome::Created(id)) => {
                summary.persisted += 1;
                counter!("crawl_articles_persisted_total", "source" => source.to_string()).increment(1);
                debug!(url = %url, article_id = %id, "Article stored");
            }
            Ok(SaveOutcome::Duplicate) => {
                summary.duplicates += 1;
                counter!("crawl_articles_duplicate_total", "source" => source.to_string()).increment(1);
            }
            Err(e) => {
                summary.failed += 1;
                counter!("crawl_articles_failed_total", "source" => source.to_string()).increment(1);
                warn!(url = %url, "Failed to store article: {}", e);
            }
        }
    }
}
