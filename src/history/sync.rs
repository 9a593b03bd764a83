//! Browser synchronization for root scopes.
//!
//! # Responsibilities
//! - Publish committed programmatic navigations to the browser
//! - Forward popstate/hashchange to every attached root
//! - Fan a programmatic navigation out to the other roots of the same mode
//!
//! # Design Decisions
//! - One `HistorySync` per mode, shared by all roots of that mode
//! - Each root owns its own browser subscription
//! - Publishing is skipped when the browser already shows the path, so
//!   back/forward never grow the history stack

use std::fmt;
use std::sync::{Arc, Weak};

use dashmap::DashMap;

use crate::history::browser::{hash_to_path, BrowserNavigation, Listener, Subscription};
use crate::navigation::controller::{Cause, RouterInstance};
use crate::observability::metrics;
use crate::routing::normalize_path;
use crate::scope::ScopeId;

/// Which part of the browser location carries the path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HistoryMode {
    /// Session history path (`pushState`/popstate).
    History,
    /// Location hash fragment (`#/path`/hashchange).
    Hash,
}

impl HistoryMode {
    pub fn as_str(self) -> &'static str {
        match self {
            HistoryMode::History => "history",
            HistoryMode::Hash => "hash",
        }
    }
}

/// Shared browser binding for all roots of one mode.
pub struct HistorySync {
    browser: Arc<dyn BrowserNavigation>,
    mode: HistoryMode,
    roots: DashMap<ScopeId, Weak<RouterInstance>>,
}

impl HistorySync {
    pub fn new(browser: Arc<dyn BrowserNavigation>, mode: HistoryMode) -> Self {
        Self {
            browser,
            mode,
            roots: DashMap::new(),
        }
    }

    pub fn mode(&self) -> HistoryMode {
        self.mode
    }

    /// Path currently shown by the browser for this mode.
    pub fn location(&self) -> String {
        match self.mode {
            HistoryMode::History => normalize_path(&self.browser.current_path()),
            HistoryMode::Hash => hash_to_path(&self.browser.current_hash()),
        }
    }

    /// Live roots attached to this binding, ordered by id.
    pub fn roots(&self) -> Vec<Arc<RouterInstance>> {
        let mut roots: Vec<Arc<RouterInstance>> = self
            .roots
            .iter()
            .filter_map(|entry| entry.value().upgrade())
            .collect();
        roots.sort_by_key(|root| root.id());
        roots
    }

    /// Register `root` and subscribe it to browser-driven changes.
    pub(crate) fn attach(self: &Arc<Self>, root: &Arc<RouterInstance>) -> Subscription {
        self.roots.insert(root.id(), Arc::downgrade(root));

        let sync = Arc::downgrade(self);
        let target = Arc::downgrade(root);
        let listener: Listener = Arc::new(move || {
            let (Some(sync), Some(root)) = (sync.upgrade(), target.upgrade()) else {
                return;
            };
            let path = sync.location();
            tracing::debug!(
                scope = %root.id(),
                mode = sync.mode.as_str(),
                path = %path,
                "Browser location changed"
            );
            root.transition(&path, Cause::External, None);
        });

        match self.mode {
            HistoryMode::History => self.browser.on_pop_state(listener),
            HistoryMode::Hash => self.browser.on_hash_change(listener),
        }
    }

    pub(crate) fn detach(&self, id: ScopeId) {
        self.roots.remove(&id);
    }

    /// Write a committed path to the browser unless it is already there.
    pub(crate) fn publish(&self, path: &str) {
        if self.location() == path {
            tracing::trace!(mode = self.mode.as_str(), path = %path, "Browser already at path");
            return;
        }

        tracing::debug!(mode = self.mode.as_str(), path = %path, "Publishing navigation");
        metrics::record_history_publish(self.mode.as_str());
        match self.mode {
            HistoryMode::History => self.browser.push_path(path),
            HistoryMode::Hash => self.browser.set_hash(path),
        }
    }

    /// Replay a programmatic navigation on every other attached root.
    pub(crate) fn fan_out(&self, origin: ScopeId, path: &str) {
        let others: Vec<Arc<RouterInstance>> = self
            .roots()
            .into_iter()
            .filter(|root| root.id() != origin)
            .collect();

        for root in others {
            root.transition(path, Cause::Replica, None);
        }
    }
}

impl fmt::Debug for HistorySync {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistorySync")
            .field("mode", &self.mode)
            .field("roots", &self.roots.len())
            .finish()
    }
}
