// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use newscrawl::config::settings::{ScheduleMode, SchedulerSettings};
use newscrawl::domain::models::crawl::CrawlPhase;
use newscrawl::queue::scheduler::{ReplicaScheduler, TriggerOutcome};
use tokio::sync::watch;

use super::helpers::{article_html, create_test_app, listing_html, TestApp, WireParser};

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

async fn wait_until_idle(scheduler: &ReplicaScheduler) {
    for _ in 0..200 {
        if !scheduler.is_running() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("crawl did not finish in time");
}

/// 测试运行中的爬取不会重叠
///
/// 第二次触发被跳过，手动执行也返回 None；结束后可以再次运行
#[tokio::test]
async fn test_overlapping_triggers_are_skipped() {
    let app = create_test_app(vec![WireParser::new("example-wire", SECTION)]).await;
    publish(&app, 6);

    assert_eq!(app.scheduler.trigger(), TriggerOutcome::Started);
    assert!(app.scheduler.is_running());
    assert_eq!(app.scheduler.trigger(), TriggerOutcome::Skipped);
    assert!(app.scheduler.run_now().await.is_none());

    wait_until_idle(&app.scheduler).await;
    assert_eq!(app.stored().await, 6);
    assert!(app.scheduler.status().last_run.is_some());

    let report = app.scheduler.run_now().await.expect("scheduler should be idle");
    assert_eq!(report.totals.persisted, 0);
    assert_eq!(report.totals.duplicates, 6);
    assert!(!app.scheduler.is_running());
}

/// 测试定时循环执行爬取并响应关闭信号
#[tokio::test]
async fn test_scheduler_loop_crawls_until_shutdown() {
    let app = create_test_app(vec![WireParser::new("example-wire", SECTION)]).await;
    publish(&app, 2);

    let scheduler = Arc::new(ReplicaScheduler::new(
        app.orchestrator.clone(),
        SchedulerSettings {
            auto_crawl: true,
            interval_ms: 50,
            mode: ScheduleMode::Static,
            replica_index: 0,
            total_replicas: 1,
        },
    ));
    assert_eq!(scheduler.first_delay(), Duration::ZERO);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = scheduler.clone().start(shutdown_rx);

    let mut stored = 0;
    for _ in 0..100 {
        stored = app.stored().await;
        if stored == 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(stored, 2);
    assert!(scheduler.status().next_run.is_some());

    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("scheduler loop did not stop")
        .unwrap();
}

/// 测试副本的首次运行偏移出现在状态中
#[tokio::test]
async fn test_status_reports_replica_offset() {
    let app = create_test_app(vec![WireParser::new("example-wire", SECTION)]).await;
    let scheduler = ReplicaScheduler::new(
        app.orchestrator.clone(),
        SchedulerSettings {
            auto_crawl: true,
            interval_ms: 180_000,
            mode: ScheduleMode::Static,
            replica_index: 2,
            total_replicas: 3,
        },
    );

    let status = scheduler.status();
    assert_eq!(status.first_run_delay_ms, 120_000);
    assert_eq!(status.mode, "static");
    assert!(!status.running);
    assert!(status.last_run.is_none());
}

/// 测试关闭时等待进行中的爬取
///
/// 资源池在栏目发现期间关闭，本轮在下一次借出时停止，不再抓取任何文章
#[tokio::test]
async fn test_shutdown_waits_for_in_flight_crawl() {
    let app = create_test_app(vec![
        WireParser::new("example-wire", SECTION),
        WireParser::new("other-wire", "https://other.example.com/economy"),
    ])
    .await;
    publish(&app, 4);
    app.web.extra_latency_ms.store(200, Ordering::SeqCst);

    assert!(app.scheduler.wait_for_run(Duration::from_millis(10)).await);
    assert_eq!(app.scheduler.trigger(), TriggerOutcome::Started);
    for _ in 0..100 {
        if app.web.navigations.load(Ordering::SeqCst) > 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    app.orchestrator.sessions().pool().destroy().await;
    assert!(app.scheduler.wait_for_run(Duration::from_secs(2)).await);

    assert!(!app.scheduler.is_running());
    assert_eq!(app.web.navigations.load(Ordering::SeqCst), 1);
    assert_eq!(app.stored().await, 0);
    let phases = app.orchestrator.phases();
    assert_eq!(phases.get("example-wire"), Some(&CrawlPhase::PartialFailure));
    assert!(phases.get("other-wire").is_none());
}
