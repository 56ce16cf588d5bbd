// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::time::Duration;

use axum::http::StatusCode;
use serde_json::Value;

use super::helpers::{
    article_html, create_test_app, create_test_app_with_options, listing_html, TestApp,
    TestAppOptions, WireParser,
};

const SECTION: &str = "https://wire.example.com/economy";

fn publish(app: &TestApp, count: usize) {
    let links: Vec<String> = (1..=count).map(|n| format!("/article/{}", n)).collect();
    app.web.serve(SECTION, listing_html(&links));
    for n in 1..=count {
        app.web.serve(
            &format!("https://wire.example.com/article/{}", n),
            article_html(&format!("경제 기사 {}", n)),
        );
    }
}

/// 测试健康检查
///
/// 返回资源池统计，池未关闭时 initialized 为 true
#[tokio::test]
async fn test_health_reports_pool() {
    let app = create_test_app(vec![WireParser::new("example-wire", SECTION)]).await;
    let server = app.server();

    let response = server.get("/health").await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let body: Value = response.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["initialized"], true);
    assert_eq!(body["pool"]["max"], 3);
    assert_eq!(body["pool"]["borrowed"], 0);
}

/// 测试资源池关闭后的健康检查
#[tokio::test]
async fn test_health_after_pool_destroyed() {
    let app = create_test_app(vec![WireParser::new("example-wire", SECTION)]).await;
    app.orchestrator.sessions().pool().destroy().await;

    let body: Value = app.server().get("/health").await.json();
    assert_eq!(body["status"], "shutting_down");
    assert_eq!(body["initialized"], false);
}

#[tokio::test]
async fn test_version() {
    let app = create_test_app(vec![]).await;

    let response = app.server().get("/v1/version").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.text(), env!("CARGO_PKG_VERSION"));
}

/// 测试按名称爬取单个新闻源
///
/// 同步执行并返回本轮统计
#[tokio::test]
async fn test_crawl_source_returns_summary() {
    let app = create_test_app(vec![WireParser::new("example-wire", SECTION)]).await;
    publish(&app, 3);
    let server = app.server();

    let response = server.post("/v1/crawl/example-wire").await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let summary: Value = response.json();
    assert_eq!(summary["source"], "example-wire");
    assert_eq!(summary["discovered"], 3);
    assert_eq!(summary["persisted"], 3);
    assert_eq!(summary["phase"], "done");
    assert_eq!(app.stored().await, 3);

    let again: Value = server.post("/v1/crawl/example-wire").await.json();
    assert_eq!(again["persisted"], 0);
    assert_eq!(again["duplicates"], 3);
}

/// 测试未注册的新闻源返回404
#[tokio::test]
async fn test_crawl_unknown_source_is_not_found() {
    let app = create_test_app(vec![WireParser::new("example-wire", SECTION)]).await;

    let response = app.server().post("/v1/crawl/nowhere").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("nowhere"));
}

/// 测试浏览器不可用时返回503
#[tokio::test]
async fn test_crawl_without_browser_is_unavailable() {
    let app = create_test_app_with_options(
        vec![WireParser::new("example-wire", SECTION)],
        TestAppOptions {
            broken_browser: true,
            ..Default::default()
        },
    )
    .await;
    publish(&app, 1);

    let response = app.server().post("/v1/crawl/example-wire").await;
    assert_eq!(response.status_code(), StatusCode::SERVICE_UNAVAILABLE);
}

/// 测试全量爬取触发
///
/// 立即返回202；上一轮未结束时再次触发被跳过
#[tokio::test]
async fn test_crawl_all_starts_then_skips() {
    let app = create_test_app(vec![WireParser::new("example-wire", SECTION)]).await;
    publish(&app, 6);
    let server = app.server();

    let first = server.post("/v1/crawl-all").await;
    assert_eq!(first.status_code(), StatusCode::ACCEPTED);
    assert_eq!(first.json::<Value>()["status"], "started");

    let second = server.post("/v1/crawl-all").await;
    assert_eq!(second.status_code(), StatusCode::ACCEPTED);
    assert_eq!(second.json::<Value>()["status"], "skipped");

    for _ in 0..200 {
        if !app.scheduler.is_running() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(!app.scheduler.is_running());
    assert_eq!(app.stored().await, 6);
}

/// 测试状态端点
///
/// 包含已注册新闻源、调度器配置与最近一次爬取阶段
#[tokio::test]
async fn test_status_lists_sources_and_phases() {
    let app = create_test_app(vec![
        WireParser::new("example-wire", SECTION),
        WireParser::new("other-wire", "https://other.example.com/economy"),
    ])
    .await;
    publish(&app, 1);
    let server = app.server();

    server.post("/v1/crawl/example-wire").await;

    let response = server.get("/v1/status").await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let body: Value = response.json();
    assert_eq!(body["sources"], serde_json::json!(["example-wire", "other-wire"]));
    assert_eq!(body["phases"]["example-wire"], "done");
    assert!(body["phases"].get("other-wire").is_none());
    assert_eq!(body["scheduler"]["total_replicas"], 1);
    assert_eq!(body["scheduler"]["running"], false);
    assert_eq!(body["pool"]["max"], 3);
}
