// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 无法确定分类时使用的“其他”分类
pub const DEFAULT_CATEGORY: &str = "기타";

/// 解析得到的文章
///
/// 标题与正文非空且正文通过合理性检查后才允许持久化
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedArticle {
    /// 标题
    pub title: String,
    /// 正文
    pub content: String,
    /// 文章URL
    pub url: String,
    /// 代表图片
    pub image_url: Option<String>,
    /// 记者
    pub reporter: Option<String>,
    /// 发布时间
    pub published_at: Option<DateTime<Utc>>,
    /// 分类
    pub category: Option<String>,
    /// 真实来源，聚合站点转载时为原始媒体
    pub origin_source: Option<String>,
}

/// 待写入的规范化文章
#[derive(Debug, Clone)]
pub struct NewArticle {
    pub title: String,
    pub content: String,
    pub url: String,
    pub source: String,
    pub category: String,
    pub reporter: Option<String>,
    pub image_url: Option<String>,
    pub published_at: DateTime<Utc>,
}

/// 已持久化的文章
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredArticle {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub url: String,
    pub source_id: i32,
    pub category_id: i32,
    pub ai_summary: Option<String>,
    pub published_at: DateTime<Utc>,
}

/// 持久化结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome", content = "id")]
pub enum SaveOutcome {
    /// 新建
    Created(Uuid),
    /// URL 已存在，未做任何修改
    Duplicate,
}

/// 倾向分析结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiasAssessment {
    pub bias_score: Option<f64>,
    pub political_leaning: Option<String>,
    pub confidence: Option<f64>,
    /// 服务返回的完整数据
    pub analysis_data: serde_json::Value,
}
