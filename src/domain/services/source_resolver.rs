// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use url::Url;

/// 域名到媒体名称的规则，按顺序匹配，域名本身或其任意子域名都算命中
const DOMAIN_RULES: &[(&[&str], &str)] = &[
    (&["donga.com"], "동아일보"),
    (&["chosun.com"], "조선일보"),
    (&["hani.co.kr"], "한겨레"),
    (&["khan.co.kr"], "경향신문"),
    (&["joongang.co.kr", "joins.com"], "중앙일보"),
    (&["yna.co.kr", "yonhapnews.co.kr"], "연합뉴스"),
    (&["mk.co.kr"], "매일경제"),
    (&["hankyung.com"], "한국경제"),
    (&["mt.co.kr", "mtn.co.kr"], "머니투데이"),
    (&["ytn.co.kr"], "YTN"),
    (&["jtbc.co.kr", "jtbc.joins.com"], "JTBC"),
    (&["munhwa.com"], "문화일보"),
    (&["segye.com"], "세계일보"),
    (&["hankookilbo.com"], "한국일보"),
    (&["kmib.co.kr"], "국민일보"),
];

fn host_matches(host: &str, domain: &str) -> bool {
    host == domain
        || host
            .strip_suffix(domain)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

/// 根据URL的主机名解析媒体名称
///
/// # 参数
///
/// * `url` - 文章URL
///
/// # 返回值
///
/// 命中规则时返回媒体名称
pub fn source_from_url(url: &str) -> Option<&'static str> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();

    // 更具体的规则优先，例如 jtbc.joins.com 应归到 JTBC 而不是 중앙일보
    let mut best: Option<(&'static str, usize)> = None;
    for (domains, name) in DOMAIN_RULES {
        for domain in *domains {
            if host_matches(&host, domain) && best.map_or(true, |(_, len)| domain.len() > len) {
                best = Some((*name, domain.len()));
            }
        }
    }
    best.map(|(name, _)| name)
}

/// 确定文章的真实来源
///
/// 依次使用解析器提供的来源、域名规则、栏目的名义来源
pub fn resolve_source(reported: Option<&str>, url: &str, nominal: &str) -> String {
    if let Some(name) = reported.map(str::trim).filter(|s| !s.is_empty()) {
        return name.to_string();
    }
    source_from_url(url)
        .map(str::to_string)
        .unwrap_or_else(|| nominal.to_string())
}
