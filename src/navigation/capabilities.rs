//! Capabilities the controller consumes from the view layer.
//!
//! # Responsibilities
//! - Render a view for a committed match, update it, detach it
//! - Begin an async load for a handler and deliver its result
//!
//! # Design Decisions
//! - The core never looks inside a `ViewHandle`
//! - No cancel call: completions carry the token they were requested
//!   under and the controller discards stale ones
//! - A `LoadCompletion` is consumed on delivery, so a load completes once

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Weak;

use serde_json::{Map, Value};

use crate::error::AsyncLoadError;
use crate::navigation::controller::RouterInstance;
use crate::navigation::token::NavigationToken;
use crate::routing::{Handler, Params};
use crate::scope::ScopeId;

/// Opaque reference to a rendered view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewHandle(u64);

impl ViewHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(self) -> u64 {
        self.0
    }
}

/// Everything the view layer needs to render a committed match.
#[derive(Debug, Clone, Copy)]
pub struct RenderRequest<'a> {
    /// The scope doing the rendering; nested routers mount within it.
    pub scope: ScopeId,
    pub handler: &'a Handler,
    pub params: &'a Params,
    pub residual: Option<&'a str>,
    pub extra: &'a Map<String, Value>,
    /// Result of the async load, when the handler declared one.
    pub data: Option<&'a Value>,
    pub class_name: Option<&'a str>,
}

/// Render capability provided by the UI framework.
pub trait ViewRenderer: Send + Sync {
    /// Mount a view for a newly matched route.
    fn render(&self, request: &RenderRequest<'_>) -> ViewHandle;

    /// Re-render a live view whose route stayed the same (new params or residual).
    fn update(&self, handle: ViewHandle, request: &RenderRequest<'_>) {
        let _ = (handle, request);
    }

    /// Detach a view subtree.
    fn unmount(&self, handle: ViewHandle);
}

/// Renderer that draws nothing; useful for headless routing.
#[derive(Debug, Default)]
pub struct NullRenderer {
    next: AtomicU64,
}

impl ViewRenderer for NullRenderer {
    fn render(&self, _request: &RenderRequest<'_>) -> ViewHandle {
        ViewHandle(self.next.fetch_add(1, Ordering::Relaxed))
    }

    fn unmount(&self, _handle: ViewHandle) {}
}

/// Async-load capability for handlers with `Readiness::Async`.
pub trait AsyncLoader: Send + Sync {
    /// Start loading data for `handler`; deliver the outcome through `completion`.
    fn begin_load(&self, handler: &Handler, params: &Params, completion: LoadCompletion);
}

impl<F> AsyncLoader for F
where
    F: Fn(&Handler, &Params, LoadCompletion) + Send + Sync,
{
    fn begin_load(&self, handler: &Handler, params: &Params, completion: LoadCompletion) {
        self(handler, params, completion)
    }
}

/// Delivery slot for one async load, tagged with its navigation token.
#[derive(Debug)]
pub struct LoadCompletion {
    token: NavigationToken,
    target: Weak<RouterInstance>,
}

impl LoadCompletion {
    pub(crate) fn new(token: NavigationToken, target: Weak<RouterInstance>) -> Self {
        Self { token, target }
    }

    pub fn token(&self) -> NavigationToken {
        self.token
    }

    /// Deliver the load outcome. Stale or orphaned completions are ignored.
    pub fn complete(self, result: Result<Value, AsyncLoadError>) {
        match self.target.upgrade() {
            Some(instance) => instance.finish_load(self.token, result),
            None => tracing::debug!(token = %self.token, "Load completed after router was dropped"),
        }
    }
}
