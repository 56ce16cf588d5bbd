// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use super::profile::{ProfileParser, SiteProfile};
use crate::domain::services::content_normalizer::ContentNormalizer;

pub const SOURCE_NAME: &str = "문화일보";

pub static PROFILE: SiteProfile = SiteProfile {
    source: SOURCE_NAME,
    host: "munhwa.com",
    sections: &[
        ("https://www.munhwa.com/news/section_list.html?sec=pol", "정치"),
        ("https://www.munhwa.com/news/section_list.html?sec=eco", "경제"),
        ("https://www.munhwa.com/news/section_list.html?sec=soc", "사회"),
        ("https://www.munhwa.com/news/section_list.html?sec=int", "세계"),
        ("https://www.munhwa.com/news/section_list.html?sec=cul", "생활/문화"),
        ("https://www.munhwa.com/news/section_list.html?sec=tec", "IT/과학"),
    ],
    link_selector: "a[href*=\"/news/view.html\"]",
    link_path: "/news/view.html",
    listing_ready: None,
    article_ready: Some(".news_body"),
    title: &[".news_title", "h1"],
    body: &[".news_body_text", ".news_body"],
    images: &[
        ".news_body img",
        ".news_body_text img",
        "article img",
        "figure img",
        "meta[property=\"og:image\"]",
        "meta[name=\"twitter:image\"]",
        "img",
    ],
    reporter: &[".news_reporter", ".byline"],
    date: &[".date_time", ".news_date"],
    excluded: &["script", "style", ".ad", "figure", "table"],
};

/// 문화일보解析器
pub fn parser(normalizer: Arc<ContentNormalizer>, max_urls: usize) -> ProfileParser {
    ProfileParser::new(&PROFILE, normalizer, max_urls)
}
