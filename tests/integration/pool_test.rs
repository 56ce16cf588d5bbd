// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use newscrawl::engines::browser_pool::ResourcePool;
use newscrawl::engines::session::SessionScope;
use newscrawl::engines::traits::{PoolError, SessionError};

use super::helpers::{pool_config, session_options, FakeManager, FakeWeb};

fn scope(web: &Arc<FakeWeb>, max: usize) -> (SessionScope<FakeManager>, Arc<AtomicUsize>) {
    let created = Arc::new(AtomicUsize::new(0));
    let manager = FakeManager {
        web: Arc::clone(web),
        created: created.clone(),
        broken: false,
    };
    (
        SessionScope::new(ResourcePool::new(manager, pool_config(max)), session_options()),
        created,
    )
}

#[tokio::test]
async fn test_borrowed_never_exceeds_max_under_load() {
    let web = Arc::new(FakeWeb::default());
    let (sessions, created) = scope(&web, 3);

    let tasks = (0..40).map(|i| {
        let sessions = sessions.clone();
        let watcher = sessions.clone();
        async move {
            sessions
                .with_session(|page| async move {
                    let status = watcher.pool_status();
                    assert!(status.borrowed <= 3, "borrowed {} > max", status.borrowed);
                    page.navigate(&format!("https://wire.test/article/{}", i)).await?;
                    tokio::time::sleep(Duration::from_millis(2)).await;
                    Ok(())
                })
                .await
        }
    });
    let results = join_all(tasks).await;

    assert!(results.iter().all(|r| r.is_ok()));
    assert!(web.max_open_pages.load(Ordering::SeqCst) <= 3);
    assert!(created.load(Ordering::SeqCst) <= 3);

    let status = sessions.pool_status();
    assert_eq!(status.borrowed, 0);
    assert_eq!(status.pending, 0);
    assert_eq!(web.open_pages.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_failing_callback_still_releases_resource() {
    let web = Arc::new(FakeWeb::default());
    web.fail("https://wire.test/down");
    let (sessions, _) = scope(&web, 1);

    let before = sessions.pool_status().borrowed;
    let result: Result<(), SessionError> = sessions
        .with_session(|page| async move { page.navigate("https://wire.test/down").await })
        .await;
    assert!(matches!(result, Err(SessionError::Navigation { .. })));
    assert_eq!(sessions.pool_status().borrowed, before);
    assert_eq!(web.open_pages.load(Ordering::SeqCst), 0);

    // 唯一的资源已归还，可以再次借出
    let again = sessions
        .with_session(|page| async move { page.navigate("https://wire.test/up").await })
        .await;
    assert!(again.is_ok());
}

#[tokio::test]
async fn test_destroyed_pool_rejects_sessions() {
    let web = Arc::new(FakeWeb::default());
    let (sessions, _) = scope(&web, 2);
    sessions.pool().destroy().await;

    let result = sessions.with_session(|_page| async move { Ok(()) }).await;
    assert!(matches!(result, Err(SessionError::Pool(PoolError::Closed))));
}
