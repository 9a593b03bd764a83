//! Browser navigation capability.
//!
//! # Responsibilities
//! - Read and write the session history path
//! - Read and write the location hash fragment
//! - Deliver back/forward and hash-change notifications
//!
//! # Design Decisions
//! - Process-wide state behind a trait; roots subscribe individually
//! - Every subscription returns a disposer that runs on teardown
//! - Hash values are exchanged without the leading `#`

use std::fmt;
use std::sync::Arc;

/// Notification callback registered with the browser.
pub type Listener = Arc<dyn Fn() + Send + Sync>;

/// Thin interface over the browser's history and location APIs.
pub trait BrowserNavigation: Send + Sync {
    /// Current session history path.
    fn current_path(&self) -> String;

    /// Push a new session history entry. Must not notify pop-state listeners.
    fn push_path(&self, path: &str);

    /// Current hash fragment, without `#`.
    fn current_hash(&self) -> String;

    /// Replace the hash fragment.
    fn set_hash(&self, path: &str);

    /// Subscribe to back/forward navigation.
    fn on_pop_state(&self, listener: Listener) -> Subscription;

    /// Subscribe to hash changes.
    fn on_hash_change(&self, listener: Listener) -> Subscription;
}

/// Disposer for a browser subscription; runs when dropped.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    disposer: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(disposer: impl FnOnce() + Send + 'static) -> Self {
        Self {
            disposer: Some(Box::new(disposer)),
        }
    }

    /// A subscription with nothing to dispose.
    pub fn empty() -> Self {
        Self { disposer: None }
    }

    /// Unsubscribe now.
    pub fn dispose(mut self) {
        self.run();
    }

    fn run(&mut self) {
        if let Some(disposer) = self.disposer.take() {
            disposer();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.disposer.is_some())
            .finish()
    }
}

/// Path carried by a hash fragment; an empty fragment is the root.
pub fn hash_to_path(hash: &str) -> String {
    let hash = hash.strip_prefix('#').unwrap_or(hash);
    if hash.is_empty() {
        "/".to_string()
    } else {
        crate::routing::normalize_path(hash)
    }
}
