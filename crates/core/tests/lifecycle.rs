//! Registry lifecycle: validation, eviction, teardown.

use std::sync::Arc;
use std::time::Duration;

use drover::testing::{FakeDriver, PageScript};
use drover::{
    AllowedOrigins, BrowserDriver, CommandDispatcher, CommandRequest, Config, LifecycleSweeper,
    SessionRegistry,
};

const APP_URL: &str = "http://localhost:3000/";

fn config() -> Config {
    Config::new(AllowedOrigins::new([APP_URL]).unwrap())
}

#[tokio::test]
async fn disallowed_origin_is_rejected_before_page_acquisition() {
    let driver = FakeDriver::new(PageScript::Echo);
    let registry = SessionRegistry::new(Arc::clone(&driver) as Arc<dyn BrowserDriver>, config());

    let err = registry.create("http://evil.example/").await.unwrap_err();
    assert!(matches!(err, drover::Error::Validation(_)));
    assert_eq!(driver.launches(), 0);
}

#[tokio::test]
async fn unparseable_url_is_rejected() {
    let driver = FakeDriver::new(PageScript::Echo);
    let registry = SessionRegistry::new(Arc::clone(&driver) as Arc<dyn BrowserDriver>, config());

    assert!(registry.create("not a url").await.is_err());
    assert_eq!(driver.launches(), 0);
}

#[tokio::test]
async fn driver_launch_failure_leaves_no_session_behind() {
    let driver = FakeDriver::failing_launch();
    let registry = SessionRegistry::new(driver, config());

    let err = registry.create(APP_URL).await.unwrap_err();
    assert!(matches!(err, drover::Error::Driver(_)));
    assert!(registry.is_empty());
}

#[tokio::test]
async fn remove_closes_the_page_and_forgets_the_id() {
    let driver = FakeDriver::new(PageScript::Echo);
    let registry = SessionRegistry::new(Arc::clone(&driver) as Arc<dyn BrowserDriver>, config());

    let id = registry.create(APP_URL).await.unwrap();
    assert!(registry.get(&id).is_some());

    registry.remove(&id).await.unwrap();
    assert!(registry.get(&id).is_none());
    assert_eq!(driver.closes(), 1);
}

#[tokio::test]
async fn remove_unknown_id_reports_not_found() {
    let driver = FakeDriver::new(PageScript::Echo);
    let registry = SessionRegistry::new(driver, config());

    let err = registry.remove("missing").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn concurrent_removes_have_a_single_winner() {
    let driver = FakeDriver::new(PageScript::Echo);
    let registry = Arc::new(SessionRegistry::new(driver, config()));

    let id = registry.create(APP_URL).await.unwrap();

    let a = tokio::spawn({
        let registry = Arc::clone(&registry);
        let id = id.clone();
        async move { registry.remove(&id).await }
    });
    let b = tokio::spawn({
        let registry = Arc::clone(&registry);
        let id = id.clone();
        async move { registry.remove(&id).await }
    });

    let outcomes = [a.await.unwrap(), b.await.unwrap()];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(registry.is_empty());
}

#[tokio::test(start_paused = true)]
async fn idle_sessions_are_evicted_while_active_ones_survive() {
    let driver = FakeDriver::new(PageScript::Echo);
    let config = config()
        .with_idle_threshold(Duration::from_millis(200))
        .with_sweep_interval(Duration::from_millis(50));
    let registry = Arc::new(SessionRegistry::new(driver, config));
    let dispatcher = CommandDispatcher::new(Arc::clone(&registry));

    let idle = registry.create(APP_URL).await.unwrap();
    let busy = registry.create(APP_URL).await.unwrap();

    let sweeper = LifecycleSweeper::spawn(Arc::clone(&registry));

    // Keep one session active well past the other's eviction point.
    for _ in 0..10 {
        tokio::time::sleep(Duration::from_millis(60)).await;
        dispatcher
            .submit(&busy, CommandRequest::click("keepalive"))
            .await
            .unwrap();
    }

    assert!(registry.get(&idle).is_none(), "idle session should be evicted");
    assert!(registry.get(&busy).is_some(), "active session should survive");

    sweeper.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn sweep_outlives_per_session_close_failures() {
    let driver = FakeDriver::with_failing_close(PageScript::Echo);
    let config = config()
        .with_idle_threshold(Duration::from_millis(100))
        .with_sweep_interval(Duration::from_millis(50));
    let registry = Arc::new(SessionRegistry::new(Arc::clone(&driver) as Arc<dyn BrowserDriver>, config));

    registry.create(APP_URL).await.unwrap();
    registry.create(APP_URL).await.unwrap();

    let sweeper = LifecycleSweeper::spawn(Arc::clone(&registry));
    tokio::time::sleep(Duration::from_millis(400)).await;

    // Both sessions were swept despite each close failing.
    assert!(registry.is_empty());
    assert_eq!(driver.closes(), 2);

    sweeper.shutdown().await;
}

#[tokio::test]
async fn drain_closes_every_session() {
    let driver = FakeDriver::new(PageScript::Echo);
    let registry = SessionRegistry::new(Arc::clone(&driver) as Arc<dyn BrowserDriver>, config());

    for _ in 0..3 {
        registry.create(APP_URL).await.unwrap();
    }
    assert_eq!(registry.len(), 3);

    registry.drain().await;
    assert!(registry.is_empty());
    assert_eq!(driver.closes(), 3);
}

#[tokio::test]
async fn snapshot_reports_live_sessions() {
    let driver = FakeDriver::new(PageScript::Echo);
    let registry = SessionRegistry::new(driver, config());

    let id = registry.create(APP_URL).await.unwrap();
    let snapshot = registry.snapshot();

    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].id, id);
    assert_eq!(snapshot[0].state, drover::SessionState::Active);
}
