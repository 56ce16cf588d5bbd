// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use super::profile::{ProfileParser, SiteProfile};
use crate::domain::services::content_normalizer::ContentNormalizer;

pub const SOURCE_NAME: &str = "중앙일보";

pub static PROFILE: SiteProfile = SiteProfile {
    source: SOURCE_NAME,
    host: "joongang.co.kr",
    sections: &[
        ("https://www.joongang.co.kr/politics", "정치"),
        ("https://www.joongang.co.kr/economy", "경제"),
        ("https://www.joongang.co.kr/society", "사회"),
        ("https://www.joongang.co.kr/world", "세계"),
        ("https://www.joongang.co.kr/culture", "생활/문화"),
        ("https://www.joongang.co.kr/tech", "IT/과학"),
    ],
    link_selector: "a[href*=\"/article/\"]",
    link_path: "/article/",
    listing_ready: Some(".card"),
    article_ready: Some(".article_body"),
    title: &[".headline", "h1"],
    body: &[".article_body"],
    images: &[
        ".article_body img",
        ".article_view img",
        "article img",
        "figure img",
        "meta[property=\"og:image\"]",
        "meta[name=\"twitter:image\"]",
        "img",
    ],
    reporter: &[".reporter", ".byline"],
    date: &[".byline time", "time"],
    excluded: &["script", "style", ".ad", ".ab_photo", ".ab_related_article", "figure", ".caption"],
};

/// 중앙일보解析器
pub fn parser(normalizer: Arc<ContentNormalizer>, max_urls: usize) -> ProfileParser {
    ProfileParser::new(&PROFILE, normalizer, max_urls)
}
