//! Navigation subsystem.
//!
//! # Data Flow
//! ```text
//! navigate(path, callback)
//!     → controller.rs (contextual scopes delegate to their parent)
//!     → RouteTree::resolve (match selected)
//!     → token.rs (mint a new token; older tokens go stale)
//!     → immediate handler: commit now
//!       async handler: capabilities.rs AsyncLoader::begin_load
//!         → LoadCompletion::complete → commit if token is still latest
//!
//! Commit:
//!     store match → publish to browser (roots) → reconcile child scopes
//!     → ViewRenderer::render/update/unmount → callbacks
//! ```
//!
//! # Design Decisions
//! - Token comparison is the only cancellation mechanism
//! - Load failures never block a transition; they reach the callback
//! - Re-navigating to the committed path is a no-op that still calls back

pub mod capabilities;
pub mod controller;
pub mod token;

pub use capabilities::{
    AsyncLoader, LoadCompletion, NullRenderer, RenderRequest, ViewHandle, ViewRenderer,
};
pub use controller::{NavigateCallback, NavigationState, RouterInstance, RouterMode};
pub use token::NavigationToken;
