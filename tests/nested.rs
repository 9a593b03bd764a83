//! Routers mounted inside the views of other routers.

use std::time::Duration;

use scoped_router::routing::{Handler, RouteTree};
use scoped_router::{
    AsyncLoadError, BrowserNavigation, Link, NavigationState, RouterError, RouterMode,
    RouterOptions,
};

mod common;
use common::{harness, harness_with_loader, Calls, Harness, TestRenderer, TimedLoader};

fn nested_tree() -> RouteTree {
    RouteTree::builder()
        .route("/__zuul/nested/", Handler::new("nested/root"))
        .route("/__zuul/nested/page", Handler::new("nested/page"))
        .build()
        .unwrap()
}

fn subcat_tree() -> RouteTree {
    RouteTree::builder()
        .route("/", Handler::new("subcat/root"))
        .route("/page", Handler::new("subcat/page"))
        .build()
        .unwrap()
}

fn app_tree() -> RouteTree {
    RouteTree::builder()
        .route("/__zuul", Handler::new("mainpage"))
        .route("/__zuul/nested/*", Handler::new("nested"))
        .route("/__zuul/subcat/*", Handler::new("subcat"))
        .build()
        .unwrap()
}

fn setup(path: &str) -> Harness {
    let renderer = TestRenderer::new()
        .text("nested", |_| String::new())
        .text("subcat", |_| String::new())
        .nest("nested", nested_tree, RouterOptions::default())
        .nest("subcat", subcat_tree, RouterOptions::contextual());
    harness(path, renderer)
}

#[test]
fn test_nested_router_reads_full_path() {
    let h = setup("/__zuul");
    let root = h.registry.mount_root(app_tree(), RouterOptions::default());
    assert_eq!(h.renderer.content(), "mainpage");

    let calls = Calls::new();
    root.navigate("/__zuul/nested/page", calls.callback()).unwrap();
    assert_eq!(calls.count(), 1);
    assert_eq!(h.renderer.content(), "nested/page");

    let children = h.registry.children_of(root.id());
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].mode(), RouterMode::History);
    assert_eq!(h.registry.roots().len(), 2);
}

#[test]
fn test_nested_router_root_case() {
    let h = setup("/__zuul");
    let root = h.registry.mount_root(app_tree(), RouterOptions::default());

    root.navigate("/__zuul/nested/", |_| {}).unwrap();
    assert_eq!(h.renderer.content(), "nested/root");
    assert_eq!(root.current_match().unwrap().residual(), Some(""));
}

#[test]
fn test_nested_router_follows_history() {
    let h = setup("/__zuul/nested");
    let root = h.registry.mount_root(app_tree(), RouterOptions::default());
    assert_eq!(h.renderer.content(), "nested/root");

    root.navigate("/__zuul/nested/page", |_| {}).unwrap();
    assert_eq!(h.renderer.content(), "nested/page");

    h.browser.back();
    assert_eq!(h.renderer.content(), "nested/root");

    root.navigate("/__zuul", |_| {}).unwrap();
    assert_eq!(h.renderer.content(), "mainpage");
    assert!(h.registry.children_of(root.id()).is_empty());
    assert_eq!(h.registry.history().roots().len(), 1);
}

#[test]
fn test_contextual_router_subroute() {
    let h = setup("/__zuul");
    let root = h.registry.mount_root(app_tree(), RouterOptions::default());

    root.navigate("/__zuul/subcat/page", |_| {}).unwrap();
    assert_eq!(h.renderer.content(), "subcat/page");

    let child = h.registry.children_of(root.id())[0].clone();
    assert_eq!(child.mode(), RouterMode::Contextual);
    assert_eq!(child.current_match().unwrap().path(), "/page");
    assert_eq!(h.registry.roots().len(), 1);
}

#[test]
fn test_contextual_router_root_case() {
    let h = setup("/__zuul");
    let root = h.registry.mount_root(app_tree(), RouterOptions::default());

    root.navigate("/__zuul/subcat/", |_| {}).unwrap();
    assert_eq!(h.renderer.content(), "subcat/root");
}

#[test]
fn test_contextual_navigate_is_scoped() {
    let h = setup("/__zuul");
    let root = h.registry.mount_root(app_tree(), RouterOptions::default());
    root.navigate("/__zuul/subcat/", |_| {}).unwrap();
    let child = h.registry.children_of(root.id())[0].clone();

    let calls = Calls::new();
    child.navigate("/page", calls.callback()).unwrap();

    assert_eq!(calls.all(), vec![Ok(())]);
    assert_eq!(h.renderer.content(), "subcat/page");
    assert_eq!(h.browser.current_path(), "/__zuul/subcat/page");
    assert_eq!(root.current_match().unwrap().path(), "/__zuul/subcat/page");
    assert_eq!(child.current_match().unwrap().path(), "/page");
    assert!(child.is_mounted());
    assert_eq!(h.registry.children_of(root.id())[0].id(), child.id());
}

#[test]
fn test_contextual_link_is_scoped() {
    let h = setup("/__zuul");
    let root = h.registry.mount_root(app_tree(), RouterOptions::default());
    root.navigate("/__zuul/subcat/page", |_| {}).unwrap();
    let child = h.registry.children_of(root.id())[0].clone();

    Link::within(child.id(), "/").activate(&h.registry).unwrap();

    assert_eq!(h.renderer.content(), "subcat/root");
    assert_eq!(h.browser.current_path(), "/__zuul/subcat");
}

#[test]
fn test_contextual_router_follows_back() {
    let h = setup("/__zuul/subcat");
    let root = h.registry.mount_root(app_tree(), RouterOptions::default());
    let child = h.registry.children_of(root.id())[0].clone();
    assert_eq!(h.renderer.content(), "subcat/root");

    child.navigate("/page", |_| {}).unwrap();
    assert_eq!(h.renderer.content(), "subcat/page");

    h.browser.back();
    assert_eq!(h.renderer.content(), "subcat/root");
    assert_eq!(child.current_match().unwrap().path(), "/");

    root.navigate("/__zuul", |_| {}).unwrap();
    assert!(!child.is_mounted());
    assert!(child.navigate("/page", |_| {}).is_err());
}

fn loading_subcat_tree() -> RouteTree {
    RouteTree::builder()
        .route("/", Handler::new("subcat/root"))
        .route("/page", Handler::with_async_load("broken"))
        .route("/report", Handler::with_async_load("report"))
        .build()
        .unwrap()
}

fn setup_loading() -> Harness {
    let renderer = TestRenderer::new()
        .text("subcat", |_| String::new())
        .nest("subcat", loading_subcat_tree, RouterOptions::contextual());
    let loader = TimedLoader::new()
        .fail("broken", 10, "backend unavailable")
        .ok("report", 30, "subcat/report");
    harness_with_loader("/__zuul/subcat", renderer, loader)
}

#[tokio::test(start_paused = true)]
async fn test_contextual_async_load_error_reaches_callback() {
    let h = setup_loading();
    let root = h.registry.mount_root(app_tree(), RouterOptions::default());
    let child = h.registry.children_of(root.id())[0].clone();
    assert_eq!(child.current_match().unwrap().path(), "/");

    let calls = Calls::new();
    child.navigate("/page", calls.callback()).unwrap();

    assert_eq!(calls.count(), 0);
    assert_eq!(child.state(), NavigationState::Resolving);
    assert_eq!(child.current_match().unwrap().path(), "/");
    assert_eq!(h.browser.current_path(), "/__zuul/subcat/page");

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(
        calls.all(),
        vec![Err(AsyncLoadError::new("backend unavailable"))]
    );
    assert_eq!(child.current_match().unwrap().path(), "/page");
    assert_eq!(h.loader.started(), vec!["broken"]);
}

#[tokio::test(start_paused = true)]
async fn test_contextual_navigate_and_wait_waits_for_child() {
    let h = setup_loading();
    let root = h.registry.mount_root(app_tree(), RouterOptions::default());
    let child = h.registry.children_of(root.id())[0].clone();

    child.navigate_and_wait("/report").await.unwrap();
    assert_eq!(child.current_match().unwrap().path(), "/report");
    assert_eq!(h.renderer.content(), "subcat/report");

    let err = child.navigate_and_wait("/page").await.unwrap_err();
    assert_eq!(
        err,
        RouterError::AsyncLoad(AsyncLoadError::new("backend unavailable"))
    );
}
