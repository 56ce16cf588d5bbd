// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use scraper::Html;

use super::common;
use super::PageExtractor;
use crate::domain::models::article::ParsedArticle;
use crate::domain::models::crawl::{DiscoveredUrl, SectionTarget};
use crate::domain::services::content_normalizer::ContentNormalizer;

pub const SOURCE_NAME: &str = "JTBC";

const SECTIONS: &[(&str, &str)] = &[
    ("politics", "정치"),
    ("economy", "경제"),
    ("society", "사회"),
    ("international", "세계"),
    ("culture", "생활/문화"),
];

/// 标题短于该长度时多半是站点名或栏目名
const MIN_TITLE_CHARS: usize = 10;

const ARTICLE_EXCLUDED: &[&str] = &[
    ".ad", ".advertisement", ".related", ".share", ".social", "nav", "footer", "header",
];

const PAGE_EXCLUDED: &[&str] = &[
    "nav", "footer", "header", ".ad", ".advertisement", ".menu", ".sidebar", ".related", ".share",
];

const REPORTER_SELECTORS: &[&str] = &[
    ".article_reporter",
    ".reporter_name",
    "[class*=\"reporter\"]",
    "[class*=\"journalist\"]",
    ".byline",
];

/// JTBC 뉴스解析器
///
/// 站点由前端渲染，元素大多没有稳定的类名，正文按段落收集
pub struct JtbcParser {
    normalizer: Arc<ContentNormalizer>,
    max_urls: usize,
}

impl JtbcParser {
    pub fn new(normalizer: Arc<ContentNormalizer>, max_urls: usize) -> Self {
        Self { normalizer, max_urls }
    }
}

impl PageExtractor for JtbcParser {
    fn source_name(&self) -> &str {
        SOURCE_NAME
    }

    fn sections(&self) -> Vec<SectionTarget> {
        SECTIONS
            .iter()
            .map(|(path, category)| {
                SectionTarget::new(
                    SOURCE_NAME,
                    *category,
                    format!("https://news.jtbc.co.kr/sections/{}", path),
                )
            })
            .collect()
    }

    fn article_ready_selector(&self) -> Option<&str> {
        Some("h1")
    }

    fn extract_links(&self, document: &Html, section: &SectionTarget) -> Vec<DiscoveredUrl> {
        common::collect_links(
            document,
            &section.url,
            "a[href*=\"/article/\"]",
            |url| {
                url.host_str().is_some_and(|h| h.ends_with("jtbc.co.kr"))
                    && url.path().starts_with("/article/")
            },
            &section.category,
            self.max_urls,
        )
    }

    fn extract_article(&self, document: &Html, target: &DiscoveredUrl) -> Option<ParsedArticle> {
        let title = common::first_text(document, &["h1"])
            .map(|t| self.normalizer.clean_title(&t))
            .filter(|t| t.chars().count() > MIN_TITLE_CHARS)?;

        let article_excluded = common::selectors(ARTICLE_EXCLUDED);
        let page_excluded = common::selectors(PAGE_EXCLUDED);
        let content = common::first_plausible(
            &self.normalizer,
            [
                common::paragraphs(document, "article p", 20, &article_excluded),
                common::paragraphs(document, "p", 20, &page_excluded),
            ],
        )?;

        Some(ParsedArticle {
            title,
            content,
            url: target.url.clone(),
            image_url: common::pick_image(
                document,
                &target.url,
                &["article img", "meta[property=\"og:image\"]"],
            ),
            reporter: common::first_reporter(document, REPORTER_SELECTORS),
            published_at: common::first_date(document, &["time", "[class*=\"date\"]"]),
            category: target.category.clone(),
            origin_source: None,
        })
    }
}
