// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use super::profile::{ProfileParser, SiteProfile};
use crate::domain::services::content_normalizer::ContentNormalizer;

pub const SOURCE_NAME: &str = "한국일보";

pub static PROFILE: SiteProfile = SiteProfile {
    source: SOURCE_NAME,
    host: "hankookilbo.com",
    sections: &[
        ("https://www.hankookilbo.com/News/Politics", "정치"),
        ("https://www.hankookilbo.com/News/Economy", "경제"),
        ("https://www.hankookilbo.com/News/Society", "사회"),
        ("https://www.hankookilbo.com/News/World", "세계"),
        ("https://www.hankookilbo.com/News/Culture", "생활/문화"),
        ("https://www.hankookilbo.com/News/Science", "IT/과학"),
    ],
    link_selector: "a[href*=\"/News/Read/\"]",
    link_path: "/News/Read/",
    listing_ready: Some(".article-list"),
    article_ready: Some(".article-body"),
    title: &[".headline", "h1"],
    body: &[".article-body", ".editor-p"],
    images: &[
        ".article-body img",
        "meta[property=\"og:image\"]",
        "meta[name=\"twitter:image\"]",
    ],
    reporter: &[".byline .name", ".reporter"],
    date: &[".byline time", ".date-time"],
    excluded: &["script", "style", ".ad", ".advertisement", "figure", ".related", ".share"],
};

/// 한국일보解析器
pub fn parser(normalizer: Arc<ContentNormalizer>, max_urls: usize) -> ProfileParser {
    ProfileParser::new(&PROFILE, normalizer, max_urls)
}
