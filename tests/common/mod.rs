//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock, Weak};
use std::time::Duration;

use scoped_router::error::AsyncLoadError;
use scoped_router::navigation::{AsyncLoader, LoadCompletion, RenderRequest, ViewHandle, ViewRenderer};
use scoped_router::routing::{Handler, Params, RouteTree};
use scoped_router::{MemoryBrowser, RouterOptions, ScopeId, ScopeRegistry};
use serde_json::{Map, Value};

type TextFn = Arc<dyn Fn(&RenderRequest<'_>) -> String + Send + Sync>;
type TreeFn = Arc<dyn Fn() -> RouteTree + Send + Sync>;

/// A live view as the renderer last drew it.
#[derive(Debug, Clone)]
pub struct View {
    pub scope: ScopeId,
    pub handle: u64,
    pub handler: String,
    pub text: String,
    pub params: Params,
    pub residual: Option<String>,
    pub extra: Map<String, Value>,
    pub class_name: Option<String>,
}

/// Renderer that records live views as text and mounts nested routers
/// for configured handlers.
#[derive(Default)]
pub struct TestRenderer {
    next: AtomicU64,
    views: Mutex<Vec<View>>,
    renders: AtomicUsize,
    updates: AtomicUsize,
    texts: HashMap<String, TextFn>,
    nested: HashMap<String, (TreeFn, RouterOptions)>,
    registry: OnceLock<Weak<ScopeRegistry>>,
}

impl TestRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render `handler` with custom text instead of its name.
    pub fn text(
        mut self,
        handler: &str,
        text: impl Fn(&RenderRequest<'_>) -> String + Send + Sync + 'static,
    ) -> Self {
        self.texts.insert(handler.to_string(), Arc::new(text));
        self
    }

    /// Render `handler` as `slug` param plus `suffix`.
    pub fn slug(self, handler: &str, suffix: &'static str) -> Self {
        self.text(handler, move |r| {
            format!("{}{suffix}", r.params.get("slug").unwrap_or_default())
        })
    }

    /// Mount a router inside every view of `handler`.
    pub fn nest(
        mut self,
        handler: &str,
        tree: impl Fn() -> RouteTree + Send + Sync + 'static,
        options: RouterOptions,
    ) -> Self {
        self.nested
            .insert(handler.to_string(), (Arc::new(tree), options));
        self
    }

    pub fn bind(&self, registry: &Arc<ScopeRegistry>) {
        let _ = self.registry.set(Arc::downgrade(registry));
    }

    /// Live views ordered by scope.
    pub fn views(&self) -> Vec<View> {
        let mut views = self.views.lock().unwrap().clone();
        views.sort_by_key(|v| (v.scope, v.handle));
        views
    }

    /// Text of the live view of `scope`, empty if nothing is rendered.
    pub fn rendered(&self, scope: ScopeId) -> String {
        self.views()
            .into_iter()
            .filter(|v| v.scope == scope)
            .map(|v| v.text)
            .collect()
    }

    /// All live views concatenated in scope order.
    pub fn content(&self) -> String {
        self.views().into_iter().map(|v| v.text).collect()
    }

    pub fn view_of(&self, scope: ScopeId) -> Option<View> {
        self.views().into_iter().find(|v| v.scope == scope)
    }

    pub fn render_count(&self) -> usize {
        self.renders.load(Ordering::SeqCst)
    }

    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    fn draw(&self, handle: u64, request: &RenderRequest<'_>) -> View {
        let name = request.handler.name();
        let text = match (self.texts.get(name), request.data) {
            (Some(text), _) => text(request),
            (None, Some(Value::String(data))) => data.clone(),
            (None, _) => name.to_string(),
        };
        View {
            scope: request.scope,
            handle,
            handler: name.to_string(),
            text,
            params: request.params.clone(),
            residual: request.residual.map(str::to_string),
            extra: request.extra.clone(),
            class_name: request.class_name.map(str::to_string),
        }
    }
}

impl ViewRenderer for TestRenderer {
    fn render(&self, request: &RenderRequest<'_>) -> ViewHandle {
        let handle = self.next.fetch_add(1, Ordering::SeqCst) + 1;
        let view = self.draw(handle, request);
        self.views.lock().unwrap().push(view);
        self.renders.fetch_add(1, Ordering::SeqCst);

        // Mount after the lock is released; the child renders synchronously.
        if let Some((tree, options)) = self.nested.get(request.handler.name()) {
            let registry = self.registry.get().and_then(Weak::upgrade);
            if let Some(registry) = registry {
                registry
                    .mount_within(request.scope, tree(), options.clone())
                    .unwrap();
            }
        }
        ViewHandle::new(handle)
    }

    fn update(&self, handle: ViewHandle, request: &RenderRequest<'_>) {
        let view = self.draw(handle.id(), request);
        let mut views = self.views.lock().unwrap();
        if let Some(slot) = views.iter_mut().find(|v| v.handle == handle.id()) {
            *slot = view;
        }
        self.updates.fetch_add(1, Ordering::SeqCst);
    }

    fn unmount(&self, handle: ViewHandle) {
        self.views.lock().unwrap().retain(|v| v.handle != handle.id());
    }
}

/// Loader that completes each handler's load after a fixed delay.
#[derive(Default)]
pub struct TimedLoader {
    plans: HashMap<String, (Duration, Result<Value, AsyncLoadError>)>,
    started: Mutex<Vec<String>>,
}

impl TimedLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `data` for `handler` after `millis`.
    pub fn ok(mut self, handler: &str, millis: u64, data: impl Into<Value>) -> Self {
        self.plans.insert(
            handler.to_string(),
            (Duration::from_millis(millis), Ok(data.into())),
        );
        self
    }

    /// Fail the load for `handler` after `millis`.
    pub fn fail(mut self, handler: &str, millis: u64, message: &str) -> Self {
        self.plans.insert(
            handler.to_string(),
            (Duration::from_millis(millis), Err(AsyncLoadError::new(message))),
        );
        self
    }

    /// Handler names in the order their loads began.
    pub fn started(&self) -> Vec<String> {
        self.started.lock().unwrap().clone()
    }
}

impl AsyncLoader for TimedLoader {
    fn begin_load(&self, handler: &Handler, _params: &Params, completion: LoadCompletion) {
        self.started.lock().unwrap().push(handler.name().to_string());
        let (delay, result) = self
            .plans
            .get(handler.name())
            .cloned()
            .unwrap_or((Duration::ZERO, Ok(Value::Null)));

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            completion.complete(result);
        });
    }
}

/// Browser, renderer, loader and registry wired together.
pub struct Harness {
    pub browser: Arc<MemoryBrowser>,
    pub renderer: Arc<TestRenderer>,
    pub loader: Arc<TimedLoader>,
    pub registry: Arc<ScopeRegistry>,
}

pub fn harness(path: &str, renderer: TestRenderer) -> Harness {
    harness_with_loader(path, renderer, TimedLoader::new())
}

pub fn harness_with_loader(path: &str, renderer: TestRenderer, loader: TimedLoader) -> Harness {
    let browser = Arc::new(MemoryBrowser::new(path));
    let renderer = Arc::new(renderer);
    let loader = Arc::new(loader);
    let registry = ScopeRegistry::builder(browser.clone())
        .renderer(renderer.clone())
        .loader(loader.clone())
        .build();
    renderer.bind(&registry);

    Harness {
        browser,
        renderer,
        loader,
        registry,
    }
}

/// Records every callback outcome for later assertions.
#[derive(Clone, Default)]
pub struct Calls(Arc<Mutex<Vec<Result<(), AsyncLoadError>>>>);

impl Calls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn callback(&self) -> impl FnOnce(Result<(), AsyncLoadError>) + Send + 'static {
        let calls = Arc::clone(&self.0);
        move |result| calls.lock().unwrap().push(result)
    }

    pub fn all(&self) -> Vec<Result<(), AsyncLoadError>> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.0.lock().unwrap().len()
    }
}
