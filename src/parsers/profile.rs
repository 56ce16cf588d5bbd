// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use scraper::Html;
use tracing::debug;

use super::common;
use super::PageExtractor;
use crate::domain::models::article::ParsedArticle;
use crate::domain::models::crawl::{DiscoveredUrl, SectionTarget};
use crate::domain::services::content_normalizer::ContentNormalizer;

/// 纯选择器驱动的站点描述
///
/// 各项选择器按优先级排列，依次尝试直到得到结果
#[derive(Debug)]
pub struct SiteProfile {
    /// 新闻源名称
    pub source: &'static str,
    /// 文章链接所在的主机名（含子域名）
    pub host: &'static str,
    /// （栏目URL，分类）
    pub sections: &'static [(&'static str, &'static str)],
    /// 栏目页中的文章链接
    pub link_selector: &'static str,
    /// 文章链接路径需要包含的片段
    pub link_path: &'static str,
    pub listing_ready: Option<&'static str>,
    pub article_ready: Option<&'static str>,
    pub title: &'static [&'static str],
    pub body: &'static [&'static str],
    pub images: &'static [&'static str],
    pub reporter: &'static [&'static str],
    pub date: &'static [&'static str],
    /// 提取正文时跳过的元素
    pub excluded: &'static [&'static str],
}

/// 按 `SiteProfile` 工作的解析器
pub struct ProfileParser {
    profile: &'static SiteProfile,
    normalizer: Arc<ContentNormalizer>,
    max_urls: usize,
}

impl ProfileParser {
    pub fn new(profile: &'static SiteProfile, normalizer: Arc<ContentNormalizer>, max_urls: usize) -> Self {
        Self {
            profile,
            normalizer,
            max_urls,
        }
    }

    pub fn profile(&self) -> &'static SiteProfile {
        self.profile
    }
}

impl PageExtractor for ProfileParser {
    fn source_name(&self) -> &str {
        self.profile.source
    }

    fn sections(&self) -> Vec<SectionTarget> {
        self.profile
            .sections
            .iter()
            .map(|(url, category)| SectionTarget::new(self.profile.source, *category, *url))
            .collect()
    }

    fn listing_ready_selector(&self) -> Option<&str> {
        self.profile.listing_ready
    }

    fn article_ready_selector(&self) -> Option<&str> {
        self.profile.article_ready
    }

    fn extract_links(&self, document: &Html, section: &SectionTarget) -> Vec<DiscoveredUrl> {
        let host = self.profile.host;
        let path = self.profile.link_path;
        common::collect_links(
            document,
            &section.url,
            self.profile.link_selector,
            |url| {
                url.host_str()
                    .is_some_and(|h| h == host || h.ends_with(&format!(".{}", host)))
                    && url.path().contains(path)
            },
            &section.category,
            self.max_urls,
        )
    }

    fn extract_article(&self, document: &Html, target: &DiscoveredUrl) -> Option<ParsedArticle> {
        let title = common::first_text(document, self.profile.title)
            .map(|t| self.normalizer.clean_title(&t))
            .filter(|t| !t.is_empty())?;

        let excluded = common::selectors(self.profile.excluded);
        let candidates = self
            .profile
            .body
            .iter()
            .map(|css| common::all_text(document, css, &excluded));
        let Some(content) = common::first_plausible(&self.normalizer, candidates) else {
            debug!(url = %target.url, source = self.profile.source, "No plausible body");
            return None;
        };

        Some(ParsedArticle {
            title,
            content,
            url: target.url.clone(),
            image_url: common::pick_image(document, &target.url, self.profile.images),
            reporter: common::first_reporter(document, self.profile.reporter),
            published_at: common::first_date(document, self.profile.date),
            category: target.category.clone(),
            origin_source: None,
        })
    }
}
