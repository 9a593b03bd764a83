//! Route declarations and lookup for one router scope.
//!
//! # Responsibilities
//! - Hold route definitions in declaration order
//! - Resolve a path to exactly one match (falling back to not-found)
//! - Look definitions up by key
//!
//! # Design Decisions
//! - Immutable after construction, shared via Arc
//! - First match wins; declaration order is the only precedence rule
//! - Resolution is total: a tree without a not-found route resolves
//!   unmatched paths to an empty match that renders nothing

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::InvalidPatternError;
use crate::routing::matcher::{normalize_path, Params, RoutePattern};

/// Whether a handler needs data before its view can commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Readiness {
    /// Commit as soon as the route matches.
    #[default]
    Immediate,
    /// Ask the async loader first; commit when it completes.
    Async,
}

/// Opaque reference to the view that renders a route.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Handler {
    name: String,
    #[serde(default)]
    readiness: Readiness,
}

impl Handler {
    /// A handler that renders immediately.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            readiness: Readiness::Immediate,
        }
    }

    /// A handler that declares an async readiness requirement.
    pub fn with_async_load(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            readiness: Readiness::Async,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn readiness(&self) -> Readiness {
        self.readiness
    }

    pub fn is_async(&self) -> bool {
        self.readiness == Readiness::Async
    }
}

/// A declared route: pattern, handler, and pass-through configuration.
#[derive(Debug, Clone)]
pub struct RouteDefinition {
    pattern: RoutePattern,
    handler: Handler,
    extra: Map<String, Value>,
    key: Option<String>,
}

impl RouteDefinition {
    pub fn new(pattern: &str, handler: Handler) -> Result<Self, InvalidPatternError> {
        Ok(Self {
            pattern: RoutePattern::compile(pattern)?,
            handler,
            extra: Map::new(),
            key: None,
        })
    }

    /// Attach an identifying key for lookup.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Add one entry to the extra configuration handed to the renderer.
    pub fn with_extra(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(name.into(), value.into());
        self
    }

    pub fn with_extras(mut self, extra: Map<String, Value>) -> Self {
        self.extra.extend(extra);
        self
    }

    pub fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }

    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }
}

/// Which declaration produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "index")]
pub enum MatchSource {
    /// The route at this declaration index.
    Route(usize),
    /// The not-found fallback.
    NotFound,
    /// Nothing matched and no fallback was declared.
    Empty,
}

/// Result of resolving a path against a route tree.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    source: MatchSource,
    definition: Option<Arc<RouteDefinition>>,
    path: String,
    params: Params,
    prefix: String,
    residual: Option<String>,
}

impl RouteMatch {
    pub fn source(&self) -> MatchSource {
        self.source
    }

    /// The matched definition; `None` for the empty match.
    pub fn definition(&self) -> Option<&RouteDefinition> {
        self.definition.as_deref()
    }

    pub fn handler(&self) -> Option<&Handler> {
        self.definition.as_ref().map(|d| d.handler())
    }

    /// The normalized path this match was resolved from.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Part of the path consumed by the matched pattern.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Unconsumed suffix; set for wildcard routes and for not-found.
    pub fn residual(&self) -> Option<&str> {
        self.residual.as_deref()
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.source, MatchSource::NotFound | MatchSource::Empty)
    }
}

/// Ordered route definitions for one router scope.
#[derive(Debug, Clone, Default)]
pub struct RouteTree {
    routes: Vec<Arc<RouteDefinition>>,
    not_found: Option<Arc<RouteDefinition>>,
}

impl RouteTree {
    pub fn builder() -> RouteTreeBuilder {
        RouteTreeBuilder::default()
    }

    pub fn new(routes: Vec<RouteDefinition>, not_found: Option<Handler>) -> Self {
        Self {
            routes: routes.into_iter().map(Arc::new).collect(),
            not_found: not_found.map(not_found_definition),
        }
    }

    pub fn routes(&self) -> impl Iterator<Item = &RouteDefinition> {
        self.routes.iter().map(|r| r.as_ref())
    }

    pub fn not_found(&self) -> Option<&RouteDefinition> {
        self.not_found.as_deref()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Find a definition by its identifying key.
    pub fn get(&self, key: &str) -> Option<&RouteDefinition> {
        self.routes().find(|r| r.key() == Some(key))
    }

    /// Resolve a path to its match. Never fails.
    pub fn resolve(&self, path: &str) -> RouteMatch {
        let path = normalize_path(path);

        for (index, route) in self.routes.iter().enumerate() {
            if let Some(m) = route.pattern().match_path(&path) {
                return RouteMatch {
                    source: MatchSource::Route(index),
                    definition: Some(Arc::clone(route)),
                    path,
                    params: m.params,
                    prefix: m.prefix,
                    residual: m.residual,
                };
            }
        }

        let residual = Some(path.trim_start_matches('/').to_string());
        let (source, definition) = match &self.not_found {
            Some(def) => (MatchSource::NotFound, Some(Arc::clone(def))),
            None => (MatchSource::Empty, None),
        };

        RouteMatch {
            source,
            definition,
            path,
            params: Params::default(),
            prefix: String::new(),
            residual,
        }
    }
}

fn not_found_definition(handler: Handler) -> Arc<RouteDefinition> {
    Arc::new(RouteDefinition {
        pattern: RoutePattern::catch_all(),
        handler,
        extra: Map::new(),
        key: None,
    })
}

/// Collects route declarations; the first invalid pattern fails `build`.
#[derive(Debug, Default)]
pub struct RouteTreeBuilder {
    routes: Vec<RouteDefinition>,
    not_found: Option<Handler>,
    error: Option<InvalidPatternError>,
}

impl RouteTreeBuilder {
    pub fn route(self, pattern: &str, handler: Handler) -> Self {
        self.push(RouteDefinition::new(pattern, handler))
    }

    /// Declare a route and attach a lookup key.
    pub fn keyed_route(self, key: &str, pattern: &str, handler: Handler) -> Self {
        self.push(RouteDefinition::new(pattern, handler).map(|d| d.with_key(key)))
    }

    pub fn definition(mut self, definition: RouteDefinition) -> Self {
        self.routes.push(definition);
        self
    }

    pub fn not_found(mut self, handler: Handler) -> Self {
        self.not_found = Some(handler);
        self
    }

    pub fn build(self) -> Result<RouteTree, InvalidPatternError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(RouteTree::new(self.routes, self.not_found)),
        }
    }

    fn push(mut self, definition: Result<RouteDefinition, InvalidPatternError>) -> Self {
        match definition {
            Ok(def) => self.routes.push(def),
            Err(err) => {
                self.error.get_or_insert(err);
            }
        }
        self
    }
}
