// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 栏目目标
///
/// 一个可爬取的栏目列表页，由（新闻源、分类、URL）三元组确定。
/// 属于静态配置，不持久化。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionTarget {
    /// 名义上的新闻源
    pub source: String,
    /// 栏目对应的分类
    pub category: String,
    /// 栏目列表页URL
    pub url: String,
}

impl SectionTarget {
    pub fn new(source: impl Into<String>, category: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            category: category.into(),
            url: url.into(),
        }
    }
}

/// 栏目页中发现的候选文章链接
///
/// 只在一轮爬取中存在
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DiscoveredUrl {
    /// 去掉片段后的文章URL
    pub url: String,
    /// 来源栏目的分类
    pub category: Option<String>,
}

impl DiscoveredUrl {
    /// 创建候选链接，URL中的 `#片段` 会被去掉
    pub fn new(url: impl AsRef<str>, category: Option<String>) -> Self {
        let url = url.as_ref();
        let url = url.split('#').next().unwrap_or(url).to_string();
        Self { url, category }
    }
}

/// 单个新闻源一次爬取的阶段
///
/// Idle → Discovering → FetchingBatch → Persisting → Done，
/// Discovering 与 FetchingBatch 可以进入 PartialFailure 而不中止本轮
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CrawlPhase {
    #[default]
    Idle,
    Discovering,
    FetchingBatch,
    Persisting,
    PartialFailure,
    Done,
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CrawlPhase::Idle => write!(f, "idle"),
            CrawlPhase::Discovering => write!(f, "discovering"),
            CrawlPhase::FetchingBatch => write!(f, "fetching_batch"),
            CrawlPhase::Persisting => write!(f, "persisting"),
            CrawlPhase::PartialFailure => write!(f, "partial_failure"),
            CrawlPhase::Done => write!(f, "done"),
        }
    }
}

/// 单个新闻源一次爬取的统计结果
///
/// 仅用于观测，不驱动重试
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlSummary {
    /// 新闻源名称
    pub source: String,
    /// 去重后发现的文章链接数
    pub discovered: usize,
    /// 成功解析的文章数
    pub parsed: usize,
    /// 新写入的文章数
    pub persisted: usize,
    /// 已存在而跳过写入的文章数
    pub duplicates: usize,
    /// 导航、解析或写入失败的链接数
    pub failed: usize,
    /// 页面中没有可识别正文的链接数
    pub skipped: usize,
    /// 发现阶段失败的栏目数
    pub failed_sections: usize,
    /// 结束时所处阶段
    pub phase: CrawlPhase,
}

impl CrawlSummary {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Default::default()
        }
    }

    /// 是否存在局部失败
    pub fn has_failures(&self) -> bool {
        self.failed > 0 || self.failed_sections > 0
    }

    /// 累加另一份统计
    pub fn absorb(&mut self, other: &CrawlSummary) {
        self.discovered += other.discovered;
        self.parsed += other.parsed;
        self.persisted += other.persisted;
        self.duplicates += other.duplicates;
        self.failed += other.failed;
        self.skipped += other.skipped;
        self.failed_sections += other.failed_sections;
    }
}

/// 全部新闻源一次爬取的汇总
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrawlReport {
    /// 各新闻源的统计
    pub sources: Vec<CrawlSummary>,
    /// 全部新闻源的合计
    pub totals: CrawlSummary,
    /// 被中止的新闻源及原因
    pub aborted: Vec<String>,
}

impl CrawlReport {
    pub fn push(&mut self, summary: CrawlSummary) {
        self.totals.absorb(&summary);
        self.sources.push(summary);
    }
}
