// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use newscrawl::domain::models::article::{NewArticle, ParsedArticle, SaveOutcome, DEFAULT_CATEGORY};
use newscrawl::domain::services::enrichment_service::EnrichmentDispatcher;
use newscrawl::domain::services::persistence_gateway::PersistenceGateway;
use newscrawl::infrastructure::database::entities::{article_stat, bias_analysis, category, news_article, source};
use newscrawl::infrastructure::repositories::article_repo_impl::ArticleRepositoryImpl;
use newscrawl::infrastructure::repositories::catalog_repo_impl::CatalogRepositoryImpl;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};

use super::helpers::{test_db, RecordingEnrichment};

fn gateway(db: &Arc<DatabaseConnection>, enrichment: Option<Arc<RecordingEnrichment>>) -> PersistenceGateway {
    let articles = Arc::new(ArticleRepositoryImpl::new(db.clone()));
    let dispatcher = enrichment.map(|service| {
        Arc::new(EnrichmentDispatcher::new(service, articles.clone(), 100))
    });
    PersistenceGateway::new(articles, Arc::new(CatalogRepositoryImpl::new(db.clone())), dispatcher)
}

fn article(url: &str) -> NewArticle {
    NewArticle {
        title: "한국은행 기준금리 동결".into(),
        content: "한국은행 금융통화위원회는 오늘 기준금리를 연 3.5%로 동결했다. ".repeat(5),
        url: url.into(),
        source: "연합뉴스".into(),
        category: "경제".into(),
        reporter: Some("김기자".into()),
        image_url: None,
        published_at: Utc::now(),
    }
}

async fn rows_for(db: &DatabaseConnection, url: &str) -> u64 {
    news_article::Entity::find()
        .filter(news_article::Column::Url.eq(url))
        .count(db)
        .await
        .unwrap()
}

/// 等待后台富化任务完成
async fn wait_for(enrichment: &RecordingEnrichment, expected: usize) {
    for _ in 0..100 {
        let done = enrichment.summarized.lock().unwrap().len() >= expected
            && enrichment.analyzed.lock().unwrap().len() >= expected;
        if done {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("enrichment did not finish in time");
}

/// 测试重复保存同一URL
///
/// 第二次保存返回 Duplicate，数据库中只有一行
#[tokio::test]
async fn test_sequential_saves_store_one_row() {
    let db = test_db().await;
    let gateway = gateway(&db, None);
    let url = "https://www.yna.co.kr/view/AKR20250101000100001";

    let first = gateway.save(&article(url)).await.unwrap();
    assert!(matches!(first, SaveOutcome::Created(_)));

    let second = gateway.save(&article(url)).await.unwrap();
    assert_eq!(second, SaveOutcome::Duplicate);

    assert_eq!(rows_for(&db, url).await, 1);
}

/// 测试新文章同时初始化统计行
#[tokio::test]
async fn test_created_article_gets_stats_row() {
    let db = test_db().await;
    let gateway = gateway(&db, None);

    let SaveOutcome::Created(id) = gateway.save(&article("https://news.jtbc.co.kr/article/1")).await.unwrap() else {
        panic!("expected a new article");
    };

    let stats = article_stat::Entity::find_by_id(id).one(db.as_ref()).await.unwrap().unwrap();
    assert_eq!(stats.view_count, 0);
    assert_eq!(stats.like_count, 0);
    assert_eq!(stats.bookmark_count, 0);
}

/// 测试并发保存同一URL
///
/// 只有一个调用得到 Created，其余都是 Duplicate
#[tokio::test]
async fn test_concurrent_saves_store_one_row() {
    let db = test_db().await;
    let gateway = Arc::new(gateway(&db, None));
    let url = "https://www.hankookilbo.com/News/Read/A2025010112000001";

    let saves = (0..8).map(|_| {
        let gateway = gateway.clone();
        async move { gateway.save(&article(url)).await }
    });
    let outcomes: Vec<SaveOutcome> = join_all(saves)
        .await
        .into_iter()
        .map(|outcome| outcome.unwrap())
        .collect();

    let created = outcomes
        .iter()
        .filter(|o| matches!(o, SaveOutcome::Created(_)))
        .count();
    assert_eq!(created, 1);
    assert_eq!(rows_for(&db, url).await, 1);
}

/// 测试新闻源与分类按名称复用
#[tokio::test]
async fn test_source_and_category_are_created_once() {
    let db = test_db().await;
    let gateway = gateway(&db, None);

    for n in 0..3 {
        let url = format!("https://www.yna.co.kr/view/AKR2025010100{}", n);
        gateway.save(&article(&url)).await.unwrap();
    }

    let sources = source::Entity::find()
        .filter(source::Column::Name.eq("연합뉴스"))
        .count(db.as_ref())
        .await
        .unwrap();
    let categories = category::Entity::find()
        .filter(category::Column::Name.eq("경제"))
        .count(db.as_ref())
        .await
        .unwrap();
    assert_eq!(sources, 1);
    assert_eq!(categories, 1);
}

/// 测试缺失分类时归入默认分类
#[tokio::test]
async fn test_missing_category_falls_back_to_default() {
    let db = test_db().await;
    let gateway = gateway(&db, None);

    let parsed = ParsedArticle {
        title: "주말 날씨 맑음".into(),
        content: "이번 주말 전국이 대체로 맑겠다고 기상청이 밝혔다. ".repeat(5),
        url: "https://www.munhwa.com/news/view.html?no=2025010101".into(),
        image_url: None,
        reporter: None,
        published_at: None,
        category: None,
        origin_source: None,
    };
    let outcome = gateway
        .save(&PersistenceGateway::canonicalize(parsed, "문화일보"))
        .await
        .unwrap();
    assert!(matches!(outcome, SaveOutcome::Created(_)));

    let stored = category::Entity::find()
        .filter(category::Column::Name.eq(DEFAULT_CATEGORY))
        .one(db.as_ref())
        .await
        .unwrap();
    assert!(stored.is_some());
}

/// 测试富化只对新文章派发
///
/// 新文章的摘要与倾向分析都写回数据库；重复保存不会再次调用富化服务
#[tokio::test]
async fn test_enrichment_dispatched_for_new_articles_only() {
    let db = test_db().await;
    let enrichment = Arc::new(RecordingEnrichment::default());
    let gateway = gateway(&db, Some(enrichment.clone()));
    let url = "https://v.daum.net/v/20250101120000001";

    let SaveOutcome::Created(id) = gateway.save(&article(url)).await.unwrap() else {
        panic!("expected a new article");
    };
    wait_for(&enrichment, 1).await;

    assert_eq!(gateway.save(&article(url)).await.unwrap(), SaveOutcome::Duplicate);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(*enrichment.summarized.lock().unwrap(), vec![id]);
    assert_eq!(*enrichment.analyzed.lock().unwrap(), vec![id]);

    // 后台任务写回可能略晚于服务调用
    let mut stored = None;
    for _ in 0..50 {
        let article = news_article::Entity::find_by_id(id).one(db.as_ref()).await.unwrap().unwrap();
        let bias = bias_analysis::Entity::find()
            .filter(bias_analysis::Column::ArticleId.eq(id))
            .one(db.as_ref())
            .await
            .unwrap();
        if article.ai_summary.is_some() && bias.is_some() {
            stored = Some((article, bias));
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let (article, bias) = stored.expect("enrichment results were not stored");
    assert_eq!(article.ai_summary.as_deref(), Some("경제정책 방향 발표"));
    assert_eq!(bias.unwrap().political_leaning.as_deref(), Some("neutral"));
}

/// 测试正文过短时不派发富化
#[tokio::test]
async fn test_short_text_is_not_enriched() {
    let db = test_db().await;
    let enrichment = Arc::new(RecordingEnrichment::default());
    let gateway = gateway(&db, Some(enrichment.clone()));

    let mut short = article("https://www.joongang.co.kr/article/25000001");
    short.content = "짧은 기사 본문".into();
    assert!(matches!(gateway.save(&short).await.unwrap(), SaveOutcome::Created(_)));

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(enrichment.summarized.lock().unwrap().is_empty());
    assert!(enrichment.analyzed.lock().unwrap().is_empty());
}
