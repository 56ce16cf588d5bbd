// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::atomic::Ordering;

use newscrawl::domain::models::crawl::CrawlPhase;
use newscrawl::infrastructure::database::entities::{news_article, source};
use newscrawl::utils::errors::CrawlError;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use super::helpers::{
    article_html, create_test_app, create_test_app_with_options, listing_html, TestApp,
    TestAppOptions, WireParser,
};

const SECTION: &str = "https://wire.example.com/economy";

fn article_url(n: usize) -> String {
    format!("https://wire.example.com/article/{}", n)
}

/// 在栏目页上挂出 `count` 篇文章，并提供每篇文章的页面
fn publish(app: &TestApp, count: usize) {
    let links: Vec<String> = (1..=count).map(|n| format!("/article/{}", n)).collect();
    app.web.serve(SECTION, listing_html(&links));
    for n in 1..=count {
        app.web.serve(&article_url(n), article_html(&format!("경제 기사 {}", n)));
    }
}

/// 测试单个新闻源的完整爬取
///
/// 栏目页包含3篇文章与1个重复链接，全部写入后统计为 3/3/3/0
#[tokio::test]
async fn test_crawl_source_persists_discovered_articles() {
    let app = create_test_app(vec![WireParser::new("example-wire", SECTION)]).await;
    let links = vec![
        "/article/1".to_string(),
        "/article/2".to_string(),
        "/article/3".to_string(),
        "/article/1#comments".to_string(),
    ];
    app.web.serve(SECTION, listing_html(&links));
    for n in 1..=3 {
        app.web.serve(&article_url(n), article_html(&format!("경제 기사 {}", n)));
    }

    let summary = app.orchestrator.crawl_source("example-wire").await.unwrap();

    assert_eq!(summary.discovered, 3);
    assert_eq!(summary.parsed, 3);
    assert_eq!(summary.persisted, 3);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.phase, CrawlPhase::Done);
    assert_eq!(app.stored().await, 3);

    let stored = news_article::Entity::find()
        .filter(news_article::Column::Url.eq(article_url(2)))
        .one(app.db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.title, "경제 기사 2");
    let wire = source::Entity::find_by_id(stored.source_id)
        .one(app.db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(wire.name, "example-wire");
}

/// 测试再次爬取同一批文章
///
/// 第二轮不会写入新行，全部计为重复
#[tokio::test]
async fn test_recrawl_reports_duplicates() {
    let app = create_test_app(vec![WireParser::new("example-wire", SECTION)]).await;
    publish(&app, 3);

    app.orchestrator.crawl_source("example-wire").await.unwrap();
    let second = app.orchestrator.crawl_source("example-wire").await.unwrap();

    assert_eq!(second.discovered, 3);
    assert_eq!(second.persisted, 0);
    assert_eq!(second.duplicates, 3);
    assert_eq!(app.stored().await, 3);
}

/// 测试部分链接失败
///
/// 失败的链接只计数，其余文章照常写入，阶段为 PartialFailure
#[tokio::test]
async fn test_failed_urls_do_not_abort_the_run() {
    let app = create_test_app(vec![WireParser::new("example-wire", SECTION)]).await;
    publish(&app, 10);
    app.web.fail(&article_url(3));
    app.web.fail(&article_url(7));

    let summary = app.orchestrator.crawl_source("example-wire").await.unwrap();

    assert_eq!(summary.discovered, 10);
    assert_eq!(summary.failed, 2);
    assert_eq!(summary.persisted, 8);
    assert_eq!(summary.phase, CrawlPhase::PartialFailure);
    assert_eq!(app.stored().await, 8);
    assert_eq!(
        app.orchestrator.phases().get("example-wire"),
        Some(&CrawlPhase::PartialFailure)
    );
}

/// 测试没有可识别正文的页面被跳过
#[tokio::test]
async fn test_pages_without_article_body_are_skipped() {
    let app = create_test_app(vec![WireParser::new("example-wire", SECTION)]).await;
    publish(&app, 2);
    app.web.serve(
        &article_url(2),
        "<html><body><h1>Subscribe</h1><div class=\"body\"><p>Please log in to continue.</p></div></body></html>",
    );

    let summary = app.orchestrator.crawl_source("example-wire").await.unwrap();

    assert_eq!(summary.persisted, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.phase, CrawlPhase::Done);
}

/// 测试栏目页失败
///
/// 栏目页无法加载时计入 failed_sections，不影响其他新闻源
#[tokio::test]
async fn test_failed_section_is_counted() {
    let app = create_test_app(vec![
        WireParser::new("broken-wire", "https://broken.example.com/economy"),
        WireParser::new("example-wire", SECTION),
    ])
    .await;
    app.web.fail("https://broken.example.com/economy");
    publish(&app, 2);

    let report = app.orchestrator.crawl_all().await;

    assert!(report.aborted.is_empty());
    assert_eq!(report.sources.len(), 2);
    assert_eq!(report.sources[0].failed_sections, 1);
    assert_eq!(report.sources[0].phase, CrawlPhase::PartialFailure);
    assert_eq!(report.sources[1].persisted, 2);
    assert_eq!(report.totals.persisted, 2);
}

/// 测试并发页面数量受资源池上限约束
#[tokio::test]
async fn test_open_pages_never_exceed_pool_max() {
    let app = create_test_app_with_options(
        vec![WireParser::new("example-wire", SECTION)],
        TestAppOptions {
            pool_max: 2,
            ..Default::default()
        },
    )
    .await;
    publish(&app, 9);

    let summary = app.orchestrator.crawl_source("example-wire").await.unwrap();

    assert_eq!(summary.persisted, 9);
    let peak = app.web.max_open_pages.load(Ordering::SeqCst);
    assert!(peak >= 1 && peak <= 2, "peak open pages was {}", peak);
    assert_eq!(app.web.open_pages.load(Ordering::SeqCst), 0);
    assert_eq!(app.orchestrator.sessions().pool_status().borrowed, 0);
}

/// 测试浏览器无法启动
///
/// 致命错误中止整轮爬取，后续新闻源不再尝试
#[tokio::test]
async fn test_unavailable_browser_aborts_crawl_all() {
    let app = create_test_app_with_options(
        vec![
            WireParser::new("example-wire", SECTION),
            WireParser::new("other-wire", "https://other.example.com/economy"),
        ],
        TestAppOptions {
            broken_browser: true,
            ..Default::default()
        },
    )
    .await;
    publish(&app, 3);

    let err = app.orchestrator.crawl_source("example-wire").await.unwrap_err();
    assert!(err.is_fatal());

    let report = app.orchestrator.crawl_all().await;
    assert!(report.sources.is_empty());
    assert_eq!(report.aborted.len(), 1);
    assert!(report.aborted[0].starts_with("example-wire"));
    assert_eq!(app.web.navigations.load(Ordering::SeqCst), 0);
    assert_eq!(app.stored().await, 0);
}

/// 测试未注册的新闻源
#[tokio::test]
async fn test_unknown_source_is_rejected() {
    let app = create_test_app(vec![WireParser::new("example-wire", SECTION)]).await;

    let err = app.orchestrator.crawl_source("nowhere").await.unwrap_err();
    assert!(matches!(err, CrawlError::UnknownSource(name) if name == "nowhere"));
}
