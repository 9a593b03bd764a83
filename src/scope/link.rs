//! In-app links.
//!
//! A link remembers the scope it was declared in. Activating it navigates
//! that scope (relative to the scope root for contextual routers); a link
//! declared outside any scope, or whose scope is gone, drives the first
//! root instead.

use std::sync::Arc;

use serde::Serialize;

use crate::error::{AsyncLoadError, RouterResult};
use crate::navigation::RouterInstance;
use crate::scope::{ScopeId, ScopeRegistry};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    href: String,
    scope: Option<ScopeId>,
}

impl Link {
    /// A link outside any router scope.
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            scope: None,
        }
    }

    /// A link rendered inside the view of `scope`.
    pub fn within(scope: ScopeId, href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            scope: Some(scope),
        }
    }

    pub fn href(&self) -> &str {
        &self.href
    }

    pub fn scope(&self) -> Option<ScopeId> {
        self.scope
    }

    /// The router this link will drive.
    pub fn target(&self, registry: &ScopeRegistry) -> RouterResult<Arc<RouterInstance>> {
        registry.nearest_scope(self.scope)
    }

    /// Follow the link (a click).
    pub fn activate(&self, registry: &ScopeRegistry) -> RouterResult<()> {
        self.navigate(registry, |_| {})
    }

    /// Follow the link and report when the navigation commits.
    pub fn navigate<F>(&self, registry: &ScopeRegistry, callback: F) -> RouterResult<()>
    where
        F: FnOnce(Result<(), AsyncLoadError>) + Send + 'static,
    {
        let target = self.target(registry)?;
        tracing::debug!(scope = %target.id(), href = %self.href, "Link activated");
        target.navigate(&self.href, callback)
    }
}
