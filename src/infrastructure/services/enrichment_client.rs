// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::EnrichmentSettings;
use crate::domain::models::article::BiasAssessment;
use crate::domain::services::enrichment_service::EnrichmentService;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// 摘要的最大长度
const SUMMARY_MAX_LENGTH: usize = 150;

#[derive(Serialize)]
struct SummarizeRequest<'a> {
    text: &'a str,
    max_length: usize,
}

#[derive(Deserialize)]
struct SummarizeResponse {
    summary: Option<String>,
}

#[derive(Serialize)]
struct BiasRequest<'a> {
    text: &'a str,
    article_id: Uuid,
}

/// 基于HTTP的富化服务实现
pub struct HttpEnrichmentClient {
    /// HTTP 客户端
    client: reqwest::Client,
    summarize_url: String,
    bias_url: String,
}

impl HttpEnrichmentClient {
    /// 创建新的富化客户端
    pub fn new(settings: &EnrichmentSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(settings.timeout_ms))
            .build()?;

        Ok(Self {
            client,
            summarize_url: settings.summarize_url.trim_end_matches('/').to_string(),
            bias_url: settings.bias_url.trim_end_matches('/').to_string(),
        })
    }

    async fn post_json<B: Serialize + ?Sized>(&self, url: &str, body: &B) -> Result<reqwest::Response> {
        let response = self.client.post(url).json(body).send().await?;

        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(anyhow!("{} failed with status {}: {}", url, status, body))
        }
    }
}

/// 从倾向分析服务的完整响应中提取关键字段
fn assessment_from_response(data: serde_json::Value) -> BiasAssessment {
    let political = data.get("political");
    let bias_score = political
        .and_then(|p| p.get("bias_score"))
        .and_then(|v| v.as_f64())
        .unwrap_or(0.0);
    let political_leaning = political
        .and_then(|p| p.get("leaning"))
        .and_then(|v| v.as_str())
        .unwrap_or("neutral")
        .to_string();
    let confidence = data
        .get("sentiment")
        .and_then(|s| s.get("confidence"))
        .and_then(|v| v.as_f64())
        .unwrap_or(0.0);

    BiasAssessment {
        bias_score: Some(bias_score),
        political_leaning: Some(political_leaning),
        confidence: Some(confidence),
        analysis_data: data,
    }
}

#[async_trait]
impl EnrichmentService for HttpEnrichmentClient {
    async fn summarize(&self, _article_id: Uuid, text: &str) -> Result<Option<String>> {
        let url = format!("{}/ai/summarize", self.summarize_url);
        let response = self
            .post_json(
                &url,
                &SummarizeRequest {
                    text,
                    max_length: SUMMARY_MAX_LENGTH,
                },
            )
            .await?;

        let body: SummarizeResponse = response.json().await?;
        Ok(body.summary.filter(|s| !s.trim().is_empty()))
    }

    async fn analyze_bias(&self, article_id: Uuid, text: &str) -> Result<Option<BiasAssessment>> {
        let url = format!("{}/analyze/full", self.bias_url);
        let response = self.post_json(&url, &BiasRequest { text, article_id }).await?;

        let data: serde_json::Value = response.json().await?;
        if data.is_null() {
            return Ok(None);
        }
        Ok(Some(assessment_from_response(data)))
    }
}
