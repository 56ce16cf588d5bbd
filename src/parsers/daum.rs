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

pub const SOURCE_NAME: &str = "다음";

/// 栏目路径与分类
const SECTIONS: &[(&str, &str)] = &[
    ("politics", "정치"),
    ("economic", "경제"),
    ("society", "사회"),
    ("foreign", "세계"),
    ("culture", "생활/문화"),
    ("digital", "IT/과학"),
    ("entertain", "연예"),
];

const IMAGE_SELECTORS: &[&str] = &[
    "div.article_view img.thumb_g",
    "div.article_view .wrap_thumb img",
    "div.article_view figure img",
    "div.article_view img",
    "meta[property=\"og:image\"]",
    "meta[name=\"twitter:image\"]",
    "img.thumb_g",
];

const EXCLUDED: &[&str] = &[
    "script",
    "style",
    ".ad",
    ".advertisement",
    ".aside_g",
    ".cmt_fold",
    ".link_figure",
    "figure",
    ".btn_fold",
    ".alex_area",
    ".layer_video",
];

/// 다음 뉴스解析器
///
/// 다음 是聚合站点，文章页中的 `#kakaoServiceLogo` 给出原始媒体，
/// 持久化时以它作为文章来源
pub struct DaumParser {
    normalizer: Arc<ContentNormalizer>,
    max_urls: usize,
}

impl DaumParser {
    pub fn new(normalizer: Arc<ContentNormalizer>, max_urls: usize) -> Self {
        Self { normalizer, max_urls }
    }
}

impl PageExtractor for DaumParser {
    fn source_name(&self) -> &str {
        SOURCE_NAME
    }

    fn sections(&self) -> Vec<SectionTarget> {
        SECTIONS
            .iter()
            .map(|(path, category)| {
                SectionTarget::new(SOURCE_NAME, *category, format!("https://news.daum.net/{}", path))
            })
            .collect()
    }

    fn article_ready_selector(&self) -> Option<&str> {
        Some("h3.tit_view")
    }

    fn extract_links(&self, document: &Html, section: &SectionTarget) -> Vec<DiscoveredUrl> {
        common::collect_links(
            document,
            &section.url,
            "a[href*=\"v.daum.net/v/\"]",
            |url| url.host_str() == Some("v.daum.net") && url.path().starts_with("/v/"),
            &section.category,
            self.max_urls,
        )
    }

    fn extract_article(&self, document: &Html, target: &DiscoveredUrl) -> Option<ParsedArticle> {
        let title = common::first_text(document, &["h3.tit_view"])
            .map(|t| self.normalizer.clean_title(&t))
            .filter(|t| !t.is_empty())?;

        let excluded = common::selectors(EXCLUDED);
        let content = common::first_plausible(
            &self.normalizer,
            [
                common::paragraphs(document, "div.article_view p", 30, &excluded),
                common::container_text(document, "div.article_view", &excluded),
            ],
        );
        let Some(content) = content else {
            debug!(url = %target.url, "No plausible body");
            return None;
        };

        let reporter = common::first_text(document, &[".txt_info"])
            .and_then(|info| common::reporter_from_text(&info));

        Some(ParsedArticle {
            title,
            content,
            url: target.url.clone(),
            image_url: common::pick_image(document, &target.url, IMAGE_SELECTORS),
            reporter,
            published_at: common::first_date(document, &[".num_date"]),
            category: target.category.clone(),
            origin_source: common::first_text(document, &["#kakaoServiceLogo"]),
        })
    }
}
