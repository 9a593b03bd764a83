//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route declaration (once per router mount):
//!     pattern strings + handlers
//!     → matcher.rs (compile segments, reject bad patterns)
//!     → router.rs (ordered RouteTree, optional not-found)
//!
//! Lookup (every navigation):
//!     candidate path
//!     → router.rs (walk definitions in declaration order)
//!     → matcher.rs (segment match, params, residual)
//!     → RouteMatch (route, not-found, or empty)
//! ```
//!
//! # Design Decisions
//! - Trees are immutable after construction
//! - Deterministic: same path and tree always yield the same match
//! - First match wins (declaration order, no specificity scoring)

pub mod matcher;
pub mod router;

pub use matcher::{join_paths, normalize_path, Params, RoutePattern, Segment};
pub use router::{
    Handler, MatchSource, Readiness, RouteDefinition, RouteMatch, RouteTree, RouteTreeBuilder,
};
