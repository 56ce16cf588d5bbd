// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 各站点解析器共用的HTML提取工具

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use std::collections::HashSet;
use tracing::debug;
use url::Url;

use crate::domain::models::crawl::DiscoveredUrl;
use crate::domain::services::content_normalizer::ContentNormalizer;

/// 小于该尺寸的图片视为图标或跟踪像素
const MIN_IMAGE_SIZE: u32 = 50;

/// 懒加载图片可能使用的属性，按顺序读取
const IMAGE_ATTRS: &[&str] = &["src", "data-src", "data-lazy-src", "data-original"];

/// 提取文本时换行的块级元素
const BLOCK_ELEMENTS: &[&str] = &[
    "p", "div", "br", "li", "h1", "h2", "h3", "h4", "h5", "h6", "section", "article", "tr",
    "blockquote",
];

static DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(\d{4})\s*[-./년]\s*(\d{1,2})\s*[-./월]\s*(\d{1,2})\s*[.일]?[\sT]*(?:(오전|오후|AM|PM)\s*)?(?:(\d{1,2}):(\d{2})(?::(\d{2}))?)?",
    )
    .unwrap()
});
/// 韩国标准时间 UTC+9
static KST: Lazy<FixedOffset> = Lazy::new(|| FixedOffset::east_opt(9 * 3600).unwrap());
static REPORTER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"([가-힣]{2,4})\s*기자").unwrap());
static REPORTER_TITLE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"기자|리포터|앵커").unwrap());

/// 解析CSS选择器，无效的选择器记录后忽略
pub fn selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(selector) => Some(selector),
        Err(e) => {
            debug!("Invalid selector {:?}: {:?}", css, e);
            None
        }
    }
}

/// 批量解析选择器
pub fn selectors(list: &[&str]) -> Vec<Selector> {
    list.iter().filter_map(|css| selector(css)).collect()
}

/// 将空白合并为单个空格
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 元素是否位于任一排除元素内部（含自身）
pub fn is_excluded(element: ElementRef<'_>, excluded: &[Selector]) -> bool {
    if excluded.iter().any(|s| s.matches(&element)) {
        return true;
    }
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| excluded.iter().any(|s| s.matches(&ancestor)))
}

/// 提取元素文本，跳过排除的子树，块级元素之间换行
pub fn element_text(element: ElementRef<'_>, excluded: &[Selector]) -> String {
    fn walk(element: ElementRef<'_>, excluded: &[Selector], out: &mut String) {
        for child in element.children() {
            match child.value() {
                Node::Text(text) => out.push_str(text),
                Node::Element(_) => {
                    let Some(child) = ElementRef::wrap(child) else {
                        continue;
                    };
                    if excluded.iter().any(|s| s.matches(&child)) {
                        continue;
                    }
                    let name = child.value().name();
                    if matches!(name, "script" | "style" | "noscript") {
                        continue;
                    }
                    let block = BLOCK_ELEMENTS.contains(&name);
                    if block {
                        out.push('\n');
                    }
                    walk(child, excluded, out);
                    if block {
                        out.push('\n');
                    }
                }
                _ => {}
            }
        }
    }

    let mut out = String::new();
    walk(element, excluded, &mut out);
    out.lines()
        .map(collapse_whitespace)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// 按顺序尝试选择器，返回第一个非空的单行文本
pub fn first_text(document: &Html, candidates: &[&str]) -> Option<String> {
    candidates.iter().find_map(|css| {
        let selector = selector(css)?;
        document
            .select(&selector)
            .map(|el| collapse_whitespace(&el.text().collect::<String>()))
            .find(|text| !text.is_empty())
    })
}

/// 第一个匹配元素的属性值
pub fn first_attr(document: &Html, css: &str, attr: &str) -> Option<String> {
    let selector = selector(css)?;
    document
        .select(&selector)
        .filter_map(|el| el.value().attr(attr))
        .map(str::trim)
        .find(|v| !v.is_empty())
        .map(str::to_string)
}

/// 收集容器内长度超过 `min_chars` 的段落，段落之间换行
///
/// # 参数
///
/// * `document` - 文档
/// * `paragraph_css` - 段落选择器，例如 `div.article_view p`
/// * `min_chars` - 段落最小字符数（不含）
/// * `excluded` - 排除的元素
pub fn paragraphs(
    document: &Html,
    paragraph_css: &str,
    min_chars: usize,
    excluded: &[Selector],
) -> Option<String> {
    let selector = selector(paragraph_css)?;
    let collected: Vec<String> = document
        .select(&selector)
        .filter(|p| !is_excluded(*p, excluded))
        .map(|p| collapse_whitespace(&element_text(p, excluded)))
        .filter(|text| text.chars().count() > min_chars)
        .collect();

    if collected.is_empty() {
        None
    } else {
        Some(collected.join("\n"))
    }
}

/// 第一个匹配容器的全部文本
pub fn container_text(document: &Html, css: &str, excluded: &[Selector]) -> Option<String> {
    let selector = selector(css)?;
    document
        .select(&selector)
        .map(|el| element_text(el, excluded))
        .find(|text| !text.is_empty())
}

/// 全部匹配元素的文本，元素之间换行
pub fn all_text(document: &Html, css: &str, excluded: &[Selector]) -> Option<String> {
    let selector = selector(css)?;
    let parts: Vec<String> = document
        .select(&selector)
        .filter(|el| !is_excluded(*el, excluded))
        .map(|el| element_text(el, excluded))
        .filter(|text| !text.is_empty())
        .collect();
    (!parts.is_empty()).then(|| parts.join("\n"))
}

/// 依次尝试候选正文，返回第一个通过合理性检查的清洗结果
pub fn first_plausible<I>(normalizer: &ContentNormalizer, candidates: I) -> Option<String>
where
    I: IntoIterator<Item = Option<String>>,
{
    for candidate in candidates.into_iter().flatten() {
        match normalizer.normalize(&candidate) {
            Ok(content) => return Some(content),
            Err(rejection) => debug!("Body candidate rejected: {}", rejection),
        }
    }
    None
}

/// 在页面中收集文章链接
///
/// 相对链接按页面地址解析，去掉片段后去重并保持页面顺序，最多返回 `limit` 条
///
/// # 参数
///
/// * `document` - 栏目页文档
/// * `page_url` - 栏目页地址
/// * `link_css` - 链接选择器
/// * `accept` - 对绝对地址的过滤条件
/// * `category` - 栏目分类
/// * `limit` - 数量上限
pub fn collect_links<F>(
    document: &Html,
    page_url: &str,
    link_css: &str,
    accept: F,
    category: &str,
    limit: usize,
) -> Vec<DiscoveredUrl>
where
    F: Fn(&Url) -> bool,
{
    let Some(selector) = selector(link_css) else {
        return Vec::new();
    };
    let Ok(base) = Url::parse(page_url) else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut urls = Vec::new();
    for href in document.select(&selector).filter_map(|a| a.value().attr("href")) {
        let href = href.trim();
        if href.is_empty() || href.starts_with("javascript:") {
            continue;
        }
        let Ok(mut absolute) = base.join(href) else {
            continue;
        };
        if !matches!(absolute.scheme(), "http" | "https") || !accept(&absolute) {
            continue;
        }
        absolute.set_fragment(None);
        if seen.insert(absolute.to_string()) {
            urls.push(DiscoveredUrl::new(absolute.as_str(), Some(category.to_string())));
            if urls.len() >= limit {
                break;
            }
        }
    }
    urls
}

fn declared_size(element: ElementRef<'_>, attr: &str) -> Option<u32> {
    element
        .value()
        .attr(attr)
        .and_then(|v| v.trim().trim_end_matches("px").parse().ok())
}

fn absolute_image(src: &str, base: Option<&Url>) -> Option<String> {
    let src = src.trim();
    if src.starts_with("http://") || src.starts_with("https://") {
        return Some(src.to_string());
    }
    // 协议相对地址
    if src.starts_with("//") {
        return base.and_then(|b| b.join(src).ok()).map(|u| u.to_string());
    }
    None
}

/// 按优先级选取代表图片
///
/// 只接受 http(s) 地址；声明的宽或高小于 50 像素的图片跳过；
/// `meta` 选择器读取 `content` 属性
pub fn pick_image(document: &Html, page_url: &str, candidates: &[&str]) -> Option<String> {
    let base = Url::parse(page_url).ok();
    for css in candidates {
        let Some(selector) = selector(css) else {
            continue;
        };
        for element in document.select(&selector) {
            let value = element.value();
            let src = if value.name() == "meta" {
                value.attr("content")
            } else {
                IMAGE_ATTRS
                    .iter()
                    .filter_map(|attr| value.attr(attr))
                    .find(|v| !v.trim().is_empty())
            };
            let Some(src) = src.and_then(|s| absolute_image(s, base.as_ref())) else {
                continue;
            };
            let too_small = [declared_size(element, "width"), declared_size(element, "height")]
                .into_iter()
                .flatten()
                .any(|size| size < MIN_IMAGE_SIZE);
            if too_small {
                continue;
            }
            return Some(src);
        }
    }
    None
}

/// 从署名文本中提取“某某 기자”的姓名
pub fn reporter_from_text(text: &str) -> Option<String> {
    REPORTER_RE.captures(text).map(|c| c[1].to_string())
}

/// 去掉记者、主播等头衔后的署名，长度不在 2..=9 个字符之间时丢弃
pub fn strip_reporter_title(text: &str) -> Option<String> {
    let name = collapse_whitespace(&REPORTER_TITLE_RE.replace_all(text, ""));
    let length = name.chars().count();
    (length > 1 && length < 10).then_some(name)
}

/// 按顺序尝试署名选择器
pub fn first_reporter(document: &Html, candidates: &[&str]) -> Option<String> {
    candidates.iter().find_map(|css| {
        let selector = selector(css)?;
        document
            .select(&selector)
            .map(|el| el.text().collect::<String>())
            .find_map(|text| reporter_from_text(&text).or_else(|| strip_reporter_title(&text)))
    })
}

/// 解析发布时间
///
/// 支持 ISO-8601（含时区），以及 `YYYY-MM-DD HH:mm[:ss]`、`YYYY.MM.DD HH:mm`、
/// `YYYY. M. D. 오후 3:20` 等不带时区的写法，后者按韩国时间处理
pub fn parse_published(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    let caps = DATE_RE.captures(raw)?;
    let year: i32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let day: u32 = caps[3].parse().ok()?;
    let mut hour: u32 = caps.get(5).map_or(Some(0), |m| m.as_str().parse().ok())?;
    let minute: u32 = caps.get(6).map_or(Some(0), |m| m.as_str().parse().ok())?;
    let second: u32 = caps.get(7).map_or(Some(0), |m| m.as_str().parse().ok())?;

    match caps.get(4).map(|m| m.as_str()) {
        Some("오후") | Some("PM") if hour < 12 => hour += 12,
        Some("오전") | Some("AM") if hour == 12 => hour = 0,
        _ => {}
    }

    let naive = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)?;
    KST.from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

/// 按顺序尝试日期元素：优先读取 `datetime` 属性，其次读取文本
pub fn first_date(document: &Html, candidates: &[&str]) -> Option<DateTime<Utc>> {
    candidates.iter().find_map(|css| {
        let selector = selector(css)?;
        document.select(&selector).find_map(|el| {
            el.value()
                .attr("datetime")
                .and_then(parse_published)
                .or_else(|| parse_published(&collapse_whitespace(&el.text().collect::<String>())))
        })
    })
}
