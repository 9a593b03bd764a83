//! Navigation to handlers that load data before rendering.

use std::time::Duration;

use scoped_router::routing::{Handler, RouteTree};
use scoped_router::{AsyncLoadError, NavigationState, RouterError, RouterOptions};
use tokio::time::sleep;

mod common;
use common::{harness_with_loader, Calls, Harness, TestRenderer, TimedLoader};

fn app_tree() -> RouteTree {
    RouteTree::builder()
        .route("/__zuul", Handler::with_async_load("main"))
        .route("/__zuul/about", Handler::with_async_load("about"))
        .route("/__zuul/fast", Handler::with_async_load("fast"))
        .route("/__zuul/broken", Handler::with_async_load("broken"))
        .route("/__zuul/plain", Handler::new("plain"))
        .build()
        .unwrap()
}

fn setup() -> Harness {
    let loader = TimedLoader::new()
        .ok("main", 20, "main")
        .ok("about", 200, "about")
        .ok("fast", 20, "fast")
        .fail("broken", 10, "backend unavailable");
    harness_with_loader("/__zuul", TestRenderer::new(), loader)
}

#[tokio::test(start_paused = true)]
async fn test_renders_after_load() {
    let h = setup();
    let root = h.registry.mount_root(app_tree(), RouterOptions::default());

    assert_eq!(root.state(), NavigationState::Resolving);
    assert_eq!(h.renderer.content(), "");

    sleep(Duration::from_millis(50)).await;
    assert_eq!(root.state(), NavigationState::Committed);
    assert_eq!(h.renderer.content(), "main");
}

#[tokio::test(start_paused = true)]
async fn test_previous_view_stays_until_load_completes() {
    let h = setup();
    let root = h.registry.mount_root(app_tree(), RouterOptions::default());
    sleep(Duration::from_millis(100)).await;
    assert_eq!(h.renderer.content(), "main");

    let calls = Calls::new();
    root.navigate("/__zuul/about", calls.callback()).unwrap();
    assert_eq!(h.renderer.content(), "main");
    assert_eq!(calls.count(), 0);
    assert_eq!(h.browser.history_len(), 1);

    sleep(Duration::from_millis(350)).await;
    assert_eq!(calls.all(), vec![Ok(())]);
    assert_eq!(h.renderer.content(), "about");
    assert_eq!(h.browser.history_len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_navigating_back_to_current_cancels_pending() {
    let h = setup();
    let root = h.registry.mount_root(app_tree(), RouterOptions::default());
    sleep(Duration::from_millis(100)).await;

    let about = Calls::new();
    let main = Calls::new();
    root.navigate("/__zuul/about", about.callback()).unwrap();
    root.navigate("/__zuul", main.callback()).unwrap();

    assert_eq!(main.all(), vec![Ok(())]);
    assert_eq!(root.state(), NavigationState::Committed);

    sleep(Duration::from_millis(250)).await;
    assert_eq!(h.renderer.content(), "main");
    assert_eq!(about.count(), 0);
    assert_eq!(h.loader.started(), vec!["main", "about"]);
    assert_eq!(h.browser.history_len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_later_navigation_wins() {
    let h = setup();
    let root = h.registry.mount_root(app_tree(), RouterOptions::default());
    sleep(Duration::from_millis(100)).await;

    let slow = Calls::new();
    let fast = Calls::new();
    root.navigate("/__zuul/about", slow.callback()).unwrap();
    root.navigate("/__zuul/fast", fast.callback()).unwrap();

    sleep(Duration::from_millis(30)).await;
    assert_eq!(h.renderer.content(), "fast");
    assert_eq!(fast.count(), 1);

    sleep(Duration::from_millis(220)).await;
    assert_eq!(root.current_match().unwrap().path(), "/__zuul/fast");
    assert_eq!(h.renderer.content(), "fast");
    assert_eq!(slow.count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_immediate_route_supersedes_pending_load() {
    let h = setup();
    let root = h.registry.mount_root(app_tree(), RouterOptions::default());
    sleep(Duration::from_millis(100)).await;

    root.navigate("/__zuul/about", |_| {}).unwrap();
    root.navigate("/__zuul/plain", |_| {}).unwrap();
    assert_eq!(h.renderer.content(), "plain");

    sleep(Duration::from_millis(300)).await;
    assert_eq!(h.renderer.content(), "plain");
}

#[tokio::test(start_paused = true)]
async fn test_same_pending_path_is_coalesced() {
    let h = setup();
    let root = h.registry.mount_root(app_tree(), RouterOptions::default());
    sleep(Duration::from_millis(100)).await;

    let calls = Calls::new();
    root.navigate("/__zuul/about", calls.callback()).unwrap();
    let token = root.latest_token();
    root.navigate("/__zuul/about/", calls.callback()).unwrap();
    assert_eq!(root.latest_token(), token);

    sleep(Duration::from_millis(250)).await;
    assert_eq!(calls.all(), vec![Ok(()), Ok(())]);
    assert_eq!(h.loader.started(), vec!["main", "about"]);
}

#[tokio::test(start_paused = true)]
async fn test_load_error_reaches_callback_after_commit() {
    let h = setup();
    let root = h.registry.mount_root(app_tree(), RouterOptions::default());
    sleep(Duration::from_millis(100)).await;

    let calls = Calls::new();
    root.navigate("/__zuul/broken", calls.callback()).unwrap();
    sleep(Duration::from_millis(20)).await;

    assert_eq!(
        calls.all(),
        vec![Err(AsyncLoadError::new("backend unavailable"))]
    );
    assert_eq!(root.current_match().unwrap().path(), "/__zuul/broken");
    assert_eq!(h.renderer.content(), "broken");
}

#[tokio::test(start_paused = true)]
async fn test_navigate_and_wait() {
    let h = setup();
    let root = h.registry.mount_root(app_tree(), RouterOptions::default());

    root.navigate_and_wait("/__zuul/about").await.unwrap();
    assert_eq!(h.renderer.content(), "about");

    let err = root.navigate_and_wait("/__zuul/broken").await.unwrap_err();
    assert_eq!(
        err,
        RouterError::AsyncLoad(AsyncLoadError::new("backend unavailable"))
    );
}

#[tokio::test(start_paused = true)]
async fn test_navigate_and_wait_superseded() {
    let h = setup();
    let root = h.registry.mount_root(app_tree(), RouterOptions::default());
    sleep(Duration::from_millis(100)).await;

    let waiting = {
        let root = root.clone();
        tokio::spawn(async move { root.navigate_and_wait("/__zuul/about").await })
    };
    sleep(Duration::from_millis(1)).await;
    root.navigate("/__zuul/plain", |_| {}).unwrap();

    let result = waiting.await.unwrap();
    assert_eq!(
        result,
        Err(RouterError::Superseded {
            path: "/__zuul/about".into()
        })
    );
}

#[tokio::test(start_paused = true)]
async fn test_renavigating_current_async_route_loads_once() {
    let h = setup();
    let root = h.registry.mount_root(app_tree(), RouterOptions::default());
    sleep(Duration::from_millis(50)).await;
    assert_eq!(h.loader.started(), vec!["main"]);

    let calls = Calls::new();
    root.navigate("/__zuul", calls.callback()).unwrap();
    root.navigate("/__zuul", calls.callback()).unwrap();

    assert_eq!(calls.all(), vec![Ok(()), Ok(())]);
    assert_eq!(root.state(), NavigationState::Committed);

    sleep(Duration::from_millis(50)).await;
    assert_eq!(h.loader.started(), vec!["main"]);
    assert_eq!(h.renderer.content(), "main");
    assert_eq!(h.browser.history_len(), 1);
}
