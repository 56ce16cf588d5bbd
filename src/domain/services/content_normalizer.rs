// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 正文清洗与合理性检查
//!
//! 全部为无状态的纯函数：先清洗（去掉残留标签、界面文案、邮箱与链接，
//! 合并空白与重复段落），再用合理性检查过滤掉被误当作正文的导航或样板文字。

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

use crate::config::settings::ContentSettings;

static SCRIPT_STYLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<(script|style|noscript)[^>]*>.*?</(script|style|noscript)>").unwrap());
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());
static CSS_RULE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{[^}]*(font|color|margin)[^}]*\}").unwrap());
static CSS_DECL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"font-(family|size|weight):[^;]+;").unwrap());
static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(https?://|www\.|doi\.org/)\S+").unwrap());
static BYLINE_EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*기자\s*[A-Za-z0-9._%+-]+@\S*").unwrap());
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap());
static EDIT_STAMP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(기자\s*)?(수정|등록)\s*\d{4}-\d{2}-\d{2}").unwrap());
static UI_PHRASE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"기자\s*구독\s*공유하기|SNS 퍼가기|URL 복사|글자크기 설정|",
        r"뉴스 요약쏙|AI 요약은|OpenAI의 최신 기술을|",
        r"읽는 재미의 발견|크롬브라우저만 가능|웹 알림 동의|",
        r"무단전재 및 재배포 금지|무단 전재 및 재배포 금지|저작권자|ⓒ|Copyright|copyright|",
        r"기사제보|보도자료|관련기사|추천기사|인기기사|많이 본 뉴스|실시간 뉴스|다른기사 보기"
    ))
    .unwrap()
});
static SPACES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t\u{00A0}]+").unwrap());
static BLANK_LINES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());
static NATIVE_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[가-힣]{5,}").unwrap());

/// 看起来像热搜榜、排行榜而不是正文的模式
static EMPTY_CONTENT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"실시간\s*(인기)?검색어",
        r"HOT\s*클릭",
        r"급상승\s*검색어",
        r"인기\s*검색어",
        r"^\d+위\s+",
        r"네이버\s*실시간",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// 页面界面关键词
const UI_KEYWORDS: &[&str] = &[
    "로그인",
    "회원가입",
    "구독",
    "공유하기",
    "페이스북",
    "트위터",
    "카카오톡",
    "SNS",
    "글자크기",
    "창 닫기",
    "웹 알림",
    "크롬브라우저",
    "읽는 재미의 발견",
    "새로워진",
];

/// 两个段落相似度超过该值时视为重复
const DUPLICATE_PARAGRAPH_SIMILARITY: f64 = 0.9;

/// 合理性检查阈值
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContentRules {
    /// 最小字符数
    pub min_length: usize,
    /// 韩文字符最低占比
    pub min_native_ratio: f64,
    /// 界面关键词上限，达到即拒绝
    pub max_ui_keywords: usize,
}

impl Default for ContentRules {
    fn default() -> Self {
        Self {
            min_length: 100,
            min_native_ratio: 0.3,
            max_ui_keywords: 5,
        }
    }
}

impl From<&ContentSettings> for ContentRules {
    fn from(settings: &ContentSettings) -> Self {
        Self {
            min_length: settings.min_length,
            min_native_ratio: settings.min_native_ratio,
            max_ui_keywords: settings.max_ui_keywords,
        }
    }
}

/// 合理性检查的拒绝原因
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    Empty,
    TooShort { length: usize, min: usize },
    EmptyContentPattern,
    TooManyUiKeywords { count: usize, max: usize },
    NoNativeRun,
    LowNativeRatio { ratio: f64, min: f64 },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Rejection::Empty => write!(f, "empty"),
            Rejection::TooShort { length, min } => write!(f, "too short ({} < {})", length, min),
            Rejection::EmptyContentPattern => write!(f, "looks like a keyword ranking"),
            Rejection::TooManyUiKeywords { count, max } => {
                write!(f, "{} UI keywords (limit {})", count, max)
            }
            Rejection::NoNativeRun => write!(f, "no run of native-script text"),
            Rejection::LowNativeRatio { ratio, min } => {
                write!(f, "native ratio {:.2} < {:.2}", ratio, min)
            }
        }
    }
}

/// 正文规范化器
#[derive(Debug, Clone, Default)]
pub struct ContentNormalizer {
    rules: ContentRules,
}

impl ContentNormalizer {
    pub fn new(rules: ContentRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &ContentRules {
        &self.rules
    }

    /// 清洗正文
    ///
    /// # 参数
    ///
    /// * `raw` - 从页面提取的原始文本，段落以换行分隔
    ///
    /// # 返回值
    ///
    /// 清洗后的正文，段落之间以空行分隔
    pub fn clean(&self, raw: &str) -> String {
        let text = SCRIPT_STYLE_RE.replace_all(raw, " ");
        let text = TAG_RE.replace_all(&text, " ");
        let text = html_escape::decode_html_entities(&text);
        let text = CSS_RULE_RE.replace_all(&text, "");
        let text = CSS_DECL_RE.replace_all(&text, "");
        let text = URL_RE.replace_all(&text, "");
        let text = BYLINE_EMAIL_RE.replace_all(&text, "");
        let text = EMAIL_RE.replace_all(&text, "");
        let text = EDIT_STAMP_RE.replace_all(&text, "");
        let text = UI_PHRASE_RE.replace_all(&text, "");

        let paragraphs: Vec<String> = text
            .split('\n')
            .map(|line| SPACES_RE.replace_all(line, " ").trim().to_string())
            .filter(|line| !line.is_empty())
            .collect();

        let merged = merge_duplicate_paragraphs(paragraphs).join("\n\n");
        BLANK_LINES_RE.replace_all(&merged, "\n\n").trim().to_string()
    }

    /// 清洗标题：去掉标签与实体，合并空白为单行
    pub fn clean_title(&self, raw: &str) -> String {
        let text = TAG_RE.replace_all(raw, " ");
        let text = html_escape::decode_html_entities(&text);
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// 合理性检查
    ///
    /// # 返回值
    ///
    /// * `Ok(())` - 可以作为正文
    /// * `Err(Rejection)` - 拒绝原因
    pub fn check(&self, text: &str) -> Result<(), Rejection> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Rejection::Empty);
        }

        let length = text.chars().count();
        if length < self.rules.min_length {
            return Err(Rejection::TooShort {
                length,
                min: self.rules.min_length,
            });
        }

        if EMPTY_CONTENT_PATTERNS.iter().any(|p| p.is_match(text)) {
            return Err(Rejection::EmptyContentPattern);
        }

        let ui_count = count_ui_keywords(text);
        if ui_count >= self.rules.max_ui_keywords {
            return Err(Rejection::TooManyUiKeywords {
                count: ui_count,
                max: self.rules.max_ui_keywords,
            });
        }

        if !NATIVE_RUN_RE.is_match(text) {
            return Err(Rejection::NoNativeRun);
        }

        let ratio = native_ratio(text);
        if ratio < self.rules.min_native_ratio {
            return Err(Rejection::LowNativeRatio {
                ratio,
                min: self.rules.min_native_ratio,
            });
        }

        Ok(())
    }

    pub fn is_plausible(&self, text: &str) -> bool {
        self.check(text).is_ok()
    }

    /// 清洗后再检查，通过时返回清洗结果
    pub fn normalize(&self, raw: &str) -> Result<String, Rejection> {
        let cleaned = self.clean(raw);
        self.check(&cleaned)?;
        Ok(cleaned)
    }
}

/// 出现的界面关键词种类数
pub fn count_ui_keywords(text: &str) -> usize {
    UI_KEYWORDS.iter().filter(|k| text.contains(*k)).count()
}

/// 韩文音节占全部字符的比例
pub fn native_ratio(text: &str) -> f64 {
    let total = text.chars().count();
    if total == 0 {
        return 0.0;
    }
    let native = text.chars().filter(|c| is_hangul_syllable(*c)).count();
    native as f64 / total as f64
}

fn is_hangul_syllable(c: char) -> bool {
    ('가'..='힣').contains(&c)
}

/// 合并重复段落；部分页面会把导语段重复一次
fn merge_duplicate_paragraphs(paragraphs: Vec<String>) -> Vec<String> {
    let mut kept: Vec<String> = Vec::with_capacity(paragraphs.len());
    for paragraph in paragraphs {
        let duplicate = kept.iter().any(|existing| {
            existing == &paragraph
                || strsim::normalized_levenshtein(existing, &paragraph)
                    >= DUPLICATE_PARAGRAPH_SIMILARITY
        });
        if !duplicate {
            kept.push(paragraph);
        }
    }
    kept
}
