// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 站点解析器模块
///
/// 每个新闻源对应一个解析器，实现“发现文章链接”与“解析文章”两项能力；
/// 编排器只依赖 `SiteParser` 特质，不关心具体站点。
///
/// 包含的解析器：
/// - 다음（daum）：聚合站点，真实来源取自页面中的媒体标识
/// - JTBC（jtbc）
/// - 한국일보（hankook）
/// - 중앙일보（joongang）
/// - 문화일보（munhwa）
///
/// 后三者只在选择器上有差异，由 `profile` 中的通用解析器按站点描述工作
pub mod common;
pub mod daum;
pub mod hankook;
pub mod jtbc;
pub mod joongang;
pub mod munhwa;
pub mod profile;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use scraper::Html;
use tracing::debug;

use crate::config::settings::Settings;
use crate::domain::models::article::ParsedArticle;
use crate::domain::models::crawl::{DiscoveredUrl, SectionTarget};
use crate::domain::services::content_normalizer::{ContentNormalizer, ContentRules};
use crate::engines::traits::{PageSession, SessionError};

/// 等待关键元素出现的默认时长
pub const READY_TIMEOUT: Duration = Duration::from_secs(10);

/// 站点解析器特质
#[async_trait]
pub trait SiteParser: Send + Sync {
    /// 新闻源名称
    fn source_name(&self) -> &str;

    /// 按顺序爬取的栏目
    fn sections(&self) -> Vec<SectionTarget>;

    /// 在栏目页中发现文章链接
    ///
    /// # 参数
    ///
    /// * `page` - 页面会话
    /// * `section` - 栏目
    ///
    /// # 返回值
    ///
    /// * `Ok(Vec<DiscoveredUrl>)` - 去重且有上限的链接列表
    /// * `Err(SessionError)` - 导航或页面操作失败
    async fn discover_urls(
        &self,
        page: &dyn PageSession,
        section: &SectionTarget,
    ) -> Result<Vec<DiscoveredUrl>, SessionError>;

    /// 解析文章页
    ///
    /// # 返回值
    ///
    /// * `Ok(Some(ParsedArticle))` - 解析成功，正文已通过合理性检查
    /// * `Ok(None)` - 页面中没有可识别的文章
    /// * `Err(SessionError)` - 导航或页面操作失败
    async fn parse_article(
        &self,
        page: &dyn PageSession,
        target: &DiscoveredUrl,
    ) -> Result<Option<ParsedArticle>, SessionError>;
}

/// 基于静态HTML的站点提取规则
///
/// 页面加载与等待由 `SiteParser` 的通用实现完成，
/// 实现方只需要从渲染后的HTML中提取数据
pub trait PageExtractor: Send + Sync {
    fn source_name(&self) -> &str;

    fn sections(&self) -> Vec<SectionTarget>;

    /// 栏目页加载完成的标志元素
    fn listing_ready_selector(&self) -> Option<&str> {
        None
    }

    /// 文章页加载完成的标志元素
    fn article_ready_selector(&self) -> Option<&str> {
        None
    }

    fn extract_links(&self, document: &Html, section: &SectionTarget) -> Vec<DiscoveredUrl>;

    fn extract_article(&self, document: &Html, target: &DiscoveredUrl) -> Option<ParsedArticle>;
}

async fn load(page: &dyn PageSession, url: &str, ready: Option<&str>) -> Result<String, SessionError> {
    page.navigate(url).await?;
    if let Some(selector) = ready {
        if !page.wait_for_selector(selector, READY_TIMEOUT).await {
            debug!(url, selector, "Ready selector did not appear");
        }
    }
    page.settle().await;
    page.html().await
}

#[async_trait]
impl<T> SiteParser for T
where
    T: PageExtractor,
{
    fn source_name(&self) -> &str {
        PageExtractor::source_name(self)
    }

    fn sections(&self) -> Vec<SectionTarget> {
        PageExtractor::sections(self)
    }

    async fn discover_urls(
        &self,
        page: &dyn PageSession,
        section: &SectionTarget,
    ) -> Result<Vec<DiscoveredUrl>, SessionError> {
        let html = load(page, &section.url, self.listing_ready_selector()).await?;
        Ok(self.extract_links(&Html::parse_document(&html), section))
    }

    async fn parse_article(
        &self,
        page: &dyn PageSession,
        target: &DiscoveredUrl,
    ) -> Result<Option<ParsedArticle>, SessionError> {
        let html = load(page, &target.url, self.article_ready_selector()).await?;
        Ok(self.extract_article(&Html::parse_document(&html), target))
    }
}

/// 解析器注册表
///
/// 启动时按新闻源名称注册，之后只读
#[derive(Default, Clone)]
pub struct ParserRegistry {
    parsers: BTreeMap<String, Arc<dyn SiteParser>>,
    order: Vec<String>,
}

impl ParserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册解析器，同名解析器会被替换
    pub fn register(&mut self, parser: Arc<dyn SiteParser>) {
        let name = parser.source_name().to_string();
        if self.parsers.insert(name.clone(), parser).is_none() {
            self.order.push(name);
        }
    }

    pub fn get(&self, source: &str) -> Option<Arc<dyn SiteParser>> {
        self.parsers.get(source).cloned()
    }

    /// 按注册顺序返回新闻源名称
    pub fn names(&self) -> Vec<String> {
        self.order.clone()
    }

    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }

    /// 注册内置的五个站点解析器
    ///
    /// `crawler.enabled_sources` 非空时只注册其中列出的新闻源
    pub fn with_defaults(settings: &Settings) -> Self {
        let normalizer = Arc::new(ContentNormalizer::new(ContentRules::from(&settings.content)));
        let limit = settings.crawler.max_urls_per_section;

        let all: Vec<Arc<dyn SiteParser>> = vec![
            Arc::new(daum::DaumParser::new(Arc::clone(&normalizer), limit)),
            Arc::new(jtbc::JtbcParser::new(Arc::clone(&normalizer), limit)),
            Arc::new(hankook::parser(Arc::clone(&normalizer), limit)),
            Arc::new(joongang::parser(Arc::clone(&normalizer), limit)),
            Arc::new(munhwa::parser(Arc::clone(&normalizer), limit)),
        ];

        let enabled = &settings.crawler.enabled_sources;
        let mut registry = Self::new();
        for parser in all {
            if enabled.is_empty() || enabled.iter().any(|s| s == parser.source_name()) {
                registry.register(parser);
            }
        }
        registry
    }
}
