//! Client-side navigation engine with nested and contextual router scopes.
//!
//! A [`ScopeRegistry`] owns every mounted router. Root routers bind to the
//! browser's session history or hash fragment; routers mounted inside a
//! rendered view either follow their parent's unmatched path suffix
//! (contextual) or act as additional roots. Rendering and data loading are
//! capabilities supplied by the embedding UI layer.

pub mod config;
pub mod error;
pub mod history;
pub mod navigation;
pub mod observability;
pub mod routing;
pub mod scope;

pub use config::{RouterConfig, RouterOptions};
pub use error::{AsyncLoadError, InvalidPatternError, RouterError, RouterResult};
pub use history::{BrowserNavigation, MemoryBrowser, Subscription};
pub use navigation::{
    AsyncLoader, LoadCompletion, NavigationState, NavigationToken, RenderRequest, RouterInstance,
    RouterMode, ViewHandle, ViewRenderer,
};
pub use routing::{Handler, RouteMatch, RouteTree};
pub use scope::{Link, ScopeId, ScopeRegistry};
