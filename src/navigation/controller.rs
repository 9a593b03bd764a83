//! Navigation state machine for one router scope.
//!
//! # States
//! - Idle: nothing committed yet
//! - Resolving: a navigation token is waiting on an async load
//! - Committed: the current match is live and rendered
//!
//! # State Transitions
//! ```text
//! Idle/Committed → Resolving: navigate() to an async route
//! Idle/Committed → Committed: navigate() to an immediate route
//! Resolving → Committed:     load completes for the latest token
//! Resolving → Resolving:     navigate() again; the older token goes stale
//! ```
//!
//! # Design Decisions
//! - The instance lock is held only while deciding; renderer, loader,
//!   browser and callbacks run after it is released, so they may re-enter
//! - The committed match is published through an `ArcSwapOption` so readers
//!   never take the lock
//! - Superseded navigations drop their callbacks without calling them

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use arc_swap::ArcSwapOption;
use serde_json::Value;

use crate::error::{AsyncLoadError, RouterError, RouterResult};
use crate::history::browser::Subscription;
use crate::history::sync::HistorySync;
use crate::navigation::capabilities::{
    AsyncLoader, LoadCompletion, RenderRequest, ViewHandle, ViewRenderer,
};
use crate::navigation::token::NavigationToken;
use crate::observability::metrics;
use crate::routing::{join_paths, normalize_path, Handler, MatchSource, RouteMatch, RouteTree};
use crate::scope::registry::ScopeRegistry;
use crate::scope::ScopeId;

/// Callback invoked once a navigation commits.
pub type NavigateCallback = Box<dyn FnOnce(Result<(), AsyncLoadError>) + Send>;

/// How a scope interprets paths and where its navigation state lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouterMode {
    /// Root scope bound to the session history path.
    History,
    /// Root scope bound to the location hash fragment.
    Hash,
    /// Child scope; paths are relative to the parent's matched prefix.
    Contextual,
}

impl RouterMode {
    pub fn as_str(self) -> &'static str {
        match self {
            RouterMode::History => "history",
            RouterMode::Hash => "hash",
            RouterMode::Contextual => "contextual",
        }
    }

    pub fn is_root(self) -> bool {
        !matches!(self, RouterMode::Contextual)
    }
}

/// Observable controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationState {
    Idle,
    Resolving,
    Committed,
}

/// Why a transition was started; decides whether the browser is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Cause {
    /// Programmatic navigate() on this root. Publishes on commit.
    Initiator,
    /// Another root of the same mode navigated.
    Replica,
    /// The browser changed (popstate, hashchange, initial mount).
    External,
    /// A contextual child following its parent's residual.
    Parent,
}

struct Pending {
    token: NavigationToken,
    target: RouteMatch,
    cause: Cause,
    callbacks: Vec<NavigateCallback>,
}

struct Commit {
    token: NavigationToken,
    target: RouteMatch,
    cause: Cause,
    callbacks: Vec<NavigateCallback>,
    data: Option<Value>,
    error: Option<AsyncLoadError>,
}

#[derive(Debug, Clone, Copy)]
struct LiveView {
    handle: ViewHandle,
    source: MatchSource,
}

#[derive(Default)]
struct ControllerState {
    latest: NavigationToken,
    committed: Option<NavigationToken>,
    pending: Option<Pending>,
    view: Option<LiveView>,
    subscriptions: Vec<Subscription>,
    torn_down: bool,
}

/// What a transition decided to do once the lock is released.
enum Step {
    /// Nothing to do (coalesced into a pending navigation, or torn down).
    None,
    /// Already showing this path.
    Noop {
        callback: Option<NavigateCallback>,
        superseded: Option<Pending>,
    },
    Load {
        token: NavigationToken,
        handler: Handler,
        target: RouteMatch,
        loader: Arc<dyn AsyncLoader>,
        superseded: Option<Pending>,
    },
    Commit(Commit, Option<Pending>),
}

enum Reconcile {
    Update(ViewHandle),
    Replace(Option<ViewHandle>),
}

/// Construction inputs for a router instance.
pub(crate) struct InstanceParts {
    pub id: ScopeId,
    pub mode: RouterMode,
    pub class_name: Option<String>,
    pub tree: Arc<RouteTree>,
    pub parent: Option<Weak<RouterInstance>>,
    pub registry: Weak<ScopeRegistry>,
    pub sync: Option<Arc<HistorySync>>,
    pub renderer: Arc<dyn ViewRenderer>,
    pub loader: Option<Arc<dyn AsyncLoader>>,
}

/// One mounted router scope.
pub struct RouterInstance {
    id: ScopeId,
    mode: RouterMode,
    class_name: Option<String>,
    tree: Arc<RouteTree>,
    parent: Option<Weak<RouterInstance>>,
    registry: Weak<ScopeRegistry>,
    sync: Option<Arc<HistorySync>>,
    renderer: Arc<dyn ViewRenderer>,
    loader: Option<Arc<dyn AsyncLoader>>,
    current: ArcSwapOption<RouteMatch>,
    state: Mutex<ControllerState>,
    me: Weak<RouterInstance>,
}

impl RouterInstance {
    pub(crate) fn new(parts: InstanceParts) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            id: parts.id,
            mode: parts.mode,
            class_name: parts.class_name,
            tree: parts.tree,
            parent: parts.parent,
            registry: parts.registry,
            sync: parts.sync,
            renderer: parts.renderer,
            loader: parts.loader,
            current: ArcSwapOption::empty(),
            state: Mutex::new(ControllerState::default()),
            me: me.clone(),
        })
    }

    pub fn id(&self) -> ScopeId {
        self.id
    }

    pub fn mode(&self) -> RouterMode {
        self.mode
    }

    /// Pass-through styling hint from the scope declaration.
    pub fn class_name(&self) -> Option<&str> {
        self.class_name.as_deref()
    }

    pub fn tree(&self) -> &RouteTree {
        &self.tree
    }

    /// The parent scope of a contextual router.
    pub fn parent(&self) -> Option<Arc<RouterInstance>> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }

    /// The committed match, if any.
    pub fn current_match(&self) -> Option<Arc<RouteMatch>> {
        self.current.load_full()
    }

    pub fn state(&self) -> NavigationState {
        let state = self.lock_state();
        if state.pending.is_some() {
            NavigationState::Resolving
        } else if state.committed.is_some() {
            NavigationState::Committed
        } else {
            NavigationState::Idle
        }
    }

    /// Highest token issued so far.
    pub fn latest_token(&self) -> NavigationToken {
        self.lock_state().latest
    }

    pub fn is_mounted(&self) -> bool {
        !self.lock_state().torn_down
    }

    /// Navigate to `path` and invoke `callback` once it commits.
    ///
    /// For a contextual scope `path` is relative to the scope root.
    /// Fails only when the scope has been torn down; load errors reach
    /// the callback after the new match is committed.
    pub fn navigate<F>(&self, path: &str, callback: F) -> RouterResult<()>
    where
        F: FnOnce(Result<(), AsyncLoadError>) + Send + 'static,
    {
        self.navigate_boxed(path, Box::new(callback))
    }

    /// Navigate and wait for the commit.
    pub async fn navigate_and_wait(&self, path: &str) -> RouterResult<()> {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.navigate(path, move |result| {
            let _ = tx.send(result);
        })?;

        match rx.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) => Err(RouterError::AsyncLoad(err)),
            Err(_) => Err(RouterError::Superseded {
                path: path.to_string(),
            }),
        }
    }

    pub(crate) fn navigate_boxed(&self, path: &str, callback: NavigateCallback) -> RouterResult<()> {
        if !self.is_mounted() {
            return Err(RouterError::NoSuchScope { scope: self.id });
        }

        if self.mode == RouterMode::Contextual {
            let parent = self
                .parent()
                .ok_or(RouterError::NoSuchScope { scope: self.id })?;
            let local = self.tree.resolve(path);
            let prefix = parent
                .current_match()
                .map(|m| m.prefix().to_string())
                .unwrap_or_default();
            let target = join_paths(&prefix, path);

            tracing::debug!(
                scope = %self.id,
                parent = %parent.id,
                relative = %path,
                target = %target,
                handler = local.handler().map(Handler::name),
                "Delegating scoped navigation to parent"
            );

            // The caller hears back once this scope settles on `local`, not
            // when the parent commits; an async child load reports here.
            let me = self.me.clone();
            let local_path = local.path().to_string();
            let relay: NavigateCallback = Box::new(move |result| match (result, me.upgrade()) {
                (Ok(()), Some(child)) if child.is_mounted() => {
                    child.transition(&local_path, Cause::Parent, Some(callback));
                }
                (result, _) => callback(result),
            });
            return parent.navigate_boxed(&target, relay);
        }

        tracing::debug!(scope = %self.id, mode = self.mode.as_str(), path = %path, "Navigation requested");
        self.transition(path, Cause::Initiator, Some(callback));
        if let Some(sync) = &self.sync {
            sync.fan_out(self.id, path);
        }
        Ok(())
    }

    /// Resolve `path` and move towards committing it.
    pub(crate) fn transition(&self, path: &str, cause: Cause, callback: Option<NavigateCallback>) {
        let path = normalize_path(path);
        let step = self.plan(&path, cause, callback);

        match step {
            Step::None => {}
            Step::Noop {
                callback,
                superseded,
            } => {
                drop(superseded);
                tracing::trace!(scope = %self.id, path = %path, "Already at path");
                metrics::record_navigation(self.mode.as_str(), "noop");
                if let Some(callback) = callback {
                    callback(Ok(()));
                }
            }
            Step::Load {
                token,
                handler,
                target,
                loader,
                superseded,
            } => {
                drop(superseded);
                tracing::debug!(
                    scope = %self.id,
                    path = %path,
                    token = %token,
                    handler = handler.name(),
                    "Waiting for async load"
                );
                metrics::record_navigation(self.mode.as_str(), "pending");
                let completion = LoadCompletion::new(token, self.me.clone());
                loader.begin_load(&handler, target.params(), completion);
            }
            Step::Commit(commit, superseded) => {
                drop(superseded);
                self.commit(commit);
            }
        }
    }

    fn plan(&self, path: &str, cause: Cause, callback: Option<NavigateCallback>) -> Step {
        let mut state = self.lock_state();
        if state.torn_down {
            return Step::None;
        }

        if let Some(pending) = state.pending.as_mut() {
            if pending.target.path() == path {
                pending.callbacks.extend(callback);
                if cause == Cause::Initiator {
                    pending.cause = Cause::Initiator;
                }
                tracing::trace!(scope = %self.id, path = %path, "Joined pending navigation");
                return Step::None;
            }
        }

        let at_path = state.committed.is_some()
            && self
                .current
                .load()
                .as_ref()
                .is_some_and(|m| m.path() == path);
        if at_path {
            // A newer request for the committed path retires any pending load.
            state.latest = state.latest.next();
            return Step::Noop {
                callback,
                superseded: state.pending.take(),
            };
        }

        let target = self.tree.resolve(path);
        let token = state.latest.next();
        state.latest = token;
        let superseded = state.pending.take();
        let callbacks: Vec<NavigateCallback> = callback.into_iter().collect();

        let handler = target.handler().filter(|h| h.is_async()).cloned();
        match (handler, &self.loader) {
            (Some(handler), Some(loader)) => {
                let loader = Arc::clone(loader);
                state.pending = Some(Pending {
                    token,
                    target: target.clone(),
                    cause,
                    callbacks,
                });
                Step::Load {
                    token,
                    handler,
                    target,
                    loader,
                    superseded,
                }
            }
            (handler, _) => {
                if let Some(handler) = handler {
                    tracing::warn!(
                        scope = %self.id,
                        handler = handler.name(),
                        "Async handler without a loader, committing immediately"
                    );
                }
                Step::Commit(
                    Commit {
                        token,
                        target,
                        cause,
                        callbacks,
                        data: None,
                        error: None,
                    },
                    superseded,
                )
            }
        }
    }

    /// Called by `LoadCompletion::complete`.
    pub(crate) fn finish_load(&self, token: NavigationToken, result: Result<Value, AsyncLoadError>) {
        let pending = {
            let mut state = self.lock_state();
            let current = state.pending.as_ref().map(|p| p.token);
            if state.torn_down || current != Some(token) {
                None
            } else {
                state.pending.take()
            }
        };

        let Some(pending) = pending else {
            tracing::debug!(scope = %self.id, token = %token, "Discarding stale load completion");
            metrics::record_stale_completion(self.mode.as_str());
            return;
        };

        let (data, error) = match result {
            Ok(data) => (Some(data), None),
            Err(err) => {
                tracing::warn!(scope = %self.id, token = %token, error = %err, "Async load failed");
                (None, Some(err))
            }
        };

        self.commit(Commit {
            token,
            target: pending.target,
            cause: pending.cause,
            callbacks: pending.callbacks,
            data,
            error,
        });
    }

    fn commit(&self, commit: Commit) {
        let Commit {
            token,
            target,
            cause,
            callbacks,
            data,
            error,
        } = commit;
        let target = Arc::new(target);

        let reconcile = {
            let mut state = self.lock_state();
            if state.torn_down {
                return;
            }
            state.committed = Some(token);
            self.current.store(Some(Arc::clone(&target)));
            match state.view {
                Some(view) if view.source == target.source() => Reconcile::Update(view.handle),
                _ => Reconcile::Replace(state.view.take().map(|v| v.handle)),
            }
        };

        tracing::info!(
            scope = %self.id,
            mode = self.mode.as_str(),
            path = %target.path(),
            token = %token,
            handler = target.handler().map(Handler::name),
            "Navigation committed"
        );
        metrics::record_navigation(self.mode.as_str(), "committed");

        if cause == Cause::Initiator {
            if let Some(sync) = &self.sync {
                sync.publish(target.path());
            }
        }

        let registry = self.registry.upgrade();
        match reconcile {
            Reconcile::Update(handle) => {
                if let Some(registry) = &registry {
                    registry.sync_children(self.id, &target);
                }
                if let Some(request) = self.render_request(&target, data.as_ref()) {
                    self.renderer.update(handle, &request);
                }
            }
            Reconcile::Replace(previous) => {
                if let Some(registry) = &registry {
                    registry.teardown_children(self.id);
                }
                if let Some(handle) = previous {
                    self.renderer.unmount(handle);
                }
                if let Some(request) = self.render_request(&target, data.as_ref()) {
                    let handle = self.renderer.render(&request);
                    self.adopt_view(token, handle, target.source());
                }
            }
        }

        for callback in callbacks {
            callback(error.clone().map_or(Ok(()), Err));
        }
    }

    fn adopt_view(&self, token: NavigationToken, handle: ViewHandle, source: MatchSource) {
        let keep = {
            let mut state = self.lock_state();
            let live = !state.torn_down && state.committed == Some(token) && state.view.is_none();
            if live {
                state.view = Some(LiveView { handle, source });
            }
            live
        };
        if !keep {
            // Superseded while rendering.
            self.renderer.unmount(handle);
        }
    }

    fn render_request<'a>(
        &'a self,
        target: &'a RouteMatch,
        data: Option<&'a Value>,
    ) -> Option<RenderRequest<'a>> {
        let definition = target.definition()?;
        Some(RenderRequest {
            scope: self.id,
            handler: definition.handler(),
            params: target.params(),
            residual: target.residual(),
            extra: definition.extra(),
            data,
            class_name: self.class_name(),
        })
    }

    pub(crate) fn hold_subscription(&self, subscription: Subscription) {
        let mut state = self.lock_state();
        if state.torn_down {
            drop(state);
            drop(subscription);
            return;
        }
        state.subscriptions.push(subscription);
    }

    /// Detach this scope: no further commits, subscriptions disposed, view unmounted.
    pub(crate) fn tear_down(&self) {
        let (view, subscriptions, pending) = {
            let mut state = self.lock_state();
            if state.torn_down {
                return;
            }
            state.torn_down = true;
            (
                state.view.take(),
                std::mem::take(&mut state.subscriptions),
                state.pending.take(),
            )
        };
        self.current.store(None);
        drop(pending);
        drop(subscriptions);

        if let Some(sync) = &self.sync {
            sync.detach(self.id);
        }
        if let Some(view) = view {
            self.renderer.unmount(view.handle);
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for RouterInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterInstance")
            .field("id", &self.id)
            .field("mode", &self.mode)
            .field("class_name", &self.class_name)
            .field("routes", &self.tree.len())
            .field("current", &self.current.load().as_ref().map(|m| m.path().to_string()))
            .finish()
    }
}

/// Path a contextual child resolves for its parent's match.
pub(crate) fn child_path(parent: Option<&RouteMatch>) -> String {
    let residual = parent.and_then(RouteMatch::residual).unwrap_or_default();
    format!("/{residual}")
}
