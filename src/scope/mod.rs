//! Router scopes.
//!
//! # Data Flow
//! ```text
//! mount_root(tree, options)
//!     → registry.rs (allocate ScopeId, attach to HistorySync)
//!     → RouterInstance reads the browser location and commits
//!
//! mount_within(parent, tree, options)   (from inside a rendered view)
//!     → contextual: child follows the parent's residual
//!     → otherwise:  extra root, torn down with the parent's view
//!
//! Link::activate
//!     → link.rs (nearest scope, else the first root)
//!     → RouterInstance::navigate
//! ```
//!
//! # Design Decisions
//! - The registry is the only owner of instances; everything else holds
//!   `Weak` references or ids
//! - Child scopes are anchored to the view of the scope they were mounted in

pub mod link;
pub mod registry;

use std::fmt;

use serde::Serialize;

pub use link::Link;
pub use registry::{ScopeRegistry, ScopeRegistryBuilder};

/// Identity of a mounted router scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ScopeId(u64);

impl ScopeId {
    /// Placeholder id reported when no scope could be chosen.
    pub const DETACHED: ScopeId = ScopeId(0);

    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scope-{}", self.0)
    }
}
