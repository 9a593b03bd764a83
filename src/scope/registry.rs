//! Registry of mounted router scopes.
//!
//! # Responsibilities
//! - Allocate scope ids and own every `RouterInstance`
//! - Bind root scopes to the history or hash `HistorySync`
//! - Keep contextual children in step with their parent's residual
//! - Tear down scopes anchored to a view when that view goes away
//!
//! # Design Decisions
//! - Entries are copied out of the map before calling into an instance;
//!   instances call back into the registry while committing
//! - Two `HistorySync`s per registry, one per root mode

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use dashmap::DashMap;

use crate::config::RouterOptions;
use crate::error::{RouterError, RouterResult};
use crate::history::{BrowserNavigation, HistoryMode, HistorySync};
use crate::navigation::controller::{child_path, Cause, InstanceParts};
use crate::navigation::{AsyncLoader, NullRenderer, RouterInstance, RouterMode, ViewRenderer};
use crate::observability::metrics;
use crate::routing::{RouteMatch, RouteTree};
use crate::scope::ScopeId;

struct ScopeEntry {
    instance: Arc<RouterInstance>,
    /// Scope whose view this one was mounted in.
    parent: Option<ScopeId>,
}

/// Owner of all router scopes sharing one browser.
pub struct ScopeRegistry {
    me: Weak<ScopeRegistry>,
    renderer: Arc<dyn ViewRenderer>,
    loader: Option<Arc<dyn AsyncLoader>>,
    history: Arc<HistorySync>,
    hash: Arc<HistorySync>,
    scopes: DashMap<ScopeId, ScopeEntry>,
    next_id: AtomicU64,
}

/// Builder for [`ScopeRegistry`].
pub struct ScopeRegistryBuilder {
    browser: Arc<dyn BrowserNavigation>,
    renderer: Option<Arc<dyn ViewRenderer>>,
    loader: Option<Arc<dyn AsyncLoader>>,
}

impl ScopeRegistryBuilder {
    pub fn renderer(mut self, renderer: Arc<dyn ViewRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn loader(mut self, loader: Arc<dyn AsyncLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    pub fn build(self) -> Arc<ScopeRegistry> {
        let renderer = self
            .renderer
            .unwrap_or_else(|| Arc::new(NullRenderer::default()));
        let history = Arc::new(HistorySync::new(Arc::clone(&self.browser), HistoryMode::History));
        let hash = Arc::new(HistorySync::new(self.browser, HistoryMode::Hash));

        Arc::new_cyclic(|me| ScopeRegistry {
            me: me.clone(),
            renderer,
            loader: self.loader,
            history,
            hash,
            scopes: DashMap::new(),
            next_id: AtomicU64::new(1),
        })
    }
}

impl ScopeRegistry {
    pub fn builder(browser: Arc<dyn BrowserNavigation>) -> ScopeRegistryBuilder {
        ScopeRegistryBuilder {
            browser,
            renderer: None,
            loader: None,
        }
    }

    /// Registry with a renderer and no async loader.
    pub fn new(browser: Arc<dyn BrowserNavigation>, renderer: Arc<dyn ViewRenderer>) -> Arc<Self> {
        Self::builder(browser).renderer(renderer).build()
    }

    /// Mount a top-level router. The initial path is read from the browser.
    pub fn mount_root(&self, tree: RouteTree, options: RouterOptions) -> Arc<RouterInstance> {
        if options.contextual {
            tracing::warn!("Contextual option ignored for a top-level router");
        }
        self.attach_root(None, tree, options)
    }

    /// Mount a router inside the live view of `parent`.
    ///
    /// A contextual router follows the parent's residual; any other router
    /// becomes an additional root that lives as long as the parent's view.
    pub fn mount_within(
        &self,
        parent: ScopeId,
        tree: RouteTree,
        options: RouterOptions,
    ) -> RouterResult<Arc<RouterInstance>> {
        let anchor = self
            .get(parent)
            .filter(|p| p.is_mounted())
            .ok_or(RouterError::NoSuchScope { scope: parent })?;

        if !options.contextual {
            return Ok(self.attach_root(Some(parent), tree, options));
        }
        if options.hash {
            tracing::warn!(parent = %parent, "Hash option ignored for a contextual router");
        }

        let id = self.allocate();
        let instance = RouterInstance::new(InstanceParts {
            id,
            mode: RouterMode::Contextual,
            class_name: options.class_name,
            tree: Arc::new(tree),
            parent: Some(Arc::downgrade(&anchor)),
            registry: self.me.clone(),
            sync: None,
            renderer: Arc::clone(&self.renderer),
            loader: self.loader.clone(),
        });
        self.scopes.insert(
            id,
            ScopeEntry {
                instance: Arc::clone(&instance),
                parent: Some(parent),
            },
        );

        tracing::info!(scope = %id, parent = %parent, "Mounted contextual router");
        metrics::record_scope_mounted(RouterMode::Contextual.as_str());

        let path = child_path(anchor.current_match().as_deref());
        instance.transition(&path, Cause::Parent, None);
        Ok(instance)
    }

    /// Tear down a scope and everything mounted within it.
    pub fn unmount(&self, id: ScopeId) -> RouterResult<()> {
        let (_, entry) = self
            .scopes
            .remove(&id)
            .ok_or(RouterError::NoSuchScope { scope: id })?;

        self.teardown_children(id);
        entry.instance.tear_down();

        tracing::info!(scope = %id, mode = entry.instance.mode().as_str(), "Router torn down");
        metrics::record_scope_torn_down(entry.instance.mode().as_str());
        Ok(())
    }

    pub fn get(&self, id: ScopeId) -> Option<Arc<RouterInstance>> {
        self.scopes.get(&id).map(|entry| Arc::clone(&entry.instance))
    }

    /// All root scopes (top-level and anchored), ordered by id.
    pub fn roots(&self) -> Vec<Arc<RouterInstance>> {
        self.collect(|entry| entry.instance.mode().is_root())
    }

    /// The earliest registered root.
    pub fn first_root(&self) -> Option<Arc<RouterInstance>> {
        self.roots().into_iter().next()
    }

    /// Scopes mounted within the view of `id`, ordered by id.
    pub fn children_of(&self, id: ScopeId) -> Vec<Arc<RouterInstance>> {
        self.collect(|entry| entry.parent == Some(id))
    }

    pub fn parent_of(&self, id: ScopeId) -> Option<ScopeId> {
        self.scopes.get(&id).and_then(|entry| entry.parent)
    }

    /// The scope a link declared in `scope` should drive.
    ///
    /// Falls back to the first root when `scope` is `None` or gone.
    pub fn nearest_scope(&self, scope: Option<ScopeId>) -> RouterResult<Arc<RouterInstance>> {
        if let Some(instance) = scope.and_then(|id| self.get(id)).filter(|i| i.is_mounted()) {
            return Ok(instance);
        }
        self.first_root().ok_or(RouterError::NoSuchScope {
            scope: scope.unwrap_or(ScopeId::DETACHED),
        })
    }

    pub fn history(&self) -> &Arc<HistorySync> {
        &self.history
    }

    pub fn hash(&self) -> &Arc<HistorySync> {
        &self.hash
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Pass a parent's new residual to its contextual children.
    pub(crate) fn sync_children(&self, id: ScopeId, target: &RouteMatch) {
        let path = child_path(Some(target));
        let children: Vec<Arc<RouterInstance>> = self.collect(|entry| {
            entry.parent == Some(id) && entry.instance.mode() == RouterMode::Contextual
        });

        for child in children {
            tracing::trace!(scope = %child.id(), parent = %id, path = %path, "Following parent");
            child.transition(&path, Cause::Parent, None);
        }
    }

    /// Tear down every scope mounted within the view of `id`.
    pub(crate) fn teardown_children(&self, id: ScopeId) {
        let children: Vec<ScopeId> = self
            .scopes
            .iter()
            .filter(|entry| entry.parent == Some(id))
            .map(|entry| *entry.key())
            .collect();

        for child in children {
            // Already removed by a concurrent unmount.
            let _ = self.unmount(child);
        }
    }

    fn attach_root(
        &self,
        anchor: Option<ScopeId>,
        tree: RouteTree,
        options: RouterOptions,
    ) -> Arc<RouterInstance> {
        let (mode, sync) = if options.hash {
            (RouterMode::Hash, &self.hash)
        } else {
            (RouterMode::History, &self.history)
        };

        let id = self.allocate();
        let instance = RouterInstance::new(InstanceParts {
            id,
            mode,
            class_name: options.class_name,
            tree: Arc::new(tree),
            parent: None,
            registry: self.me.clone(),
            sync: Some(Arc::clone(sync)),
            renderer: Arc::clone(&self.renderer),
            loader: self.loader.clone(),
        });
        self.scopes.insert(
            id,
            ScopeEntry {
                instance: Arc::clone(&instance),
                parent: anchor,
            },
        );
        instance.hold_subscription(sync.attach(&instance));

        tracing::info!(
            scope = %id,
            mode = mode.as_str(),
            anchor = ?anchor.map(ScopeId::value),
            "Mounted root router"
        );
        metrics::record_scope_mounted(mode.as_str());

        instance.transition(&sync.location(), Cause::External, None);
        instance
    }

    fn allocate(&self) -> ScopeId {
        ScopeId::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    fn collect(&self, keep: impl Fn(&ScopeEntry) -> bool) -> Vec<Arc<RouterInstance>> {
        let mut found: Vec<Arc<RouterInstance>> = self
            .scopes
            .iter()
            .filter(|entry| keep(entry.value()))
            .map(|entry| Arc::clone(&entry.instance))
            .collect();
        found.sort_by_key(|instance| instance.id());
        found
    }
}

impl fmt::Debug for ScopeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeRegistry")
            .field("scopes", &self.scopes.len())
            .field("history", &self.history)
            .field("hash", &self.hash)
            .finish()
    }
}
