//! Configuration schema definitions.
//!
//! Declarative route files: scope options, ordered routes, an optional
//! not-found handler and logging settings. All types derive Serde traits
//! for deserialization from TOML.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::InvalidPatternError;
use crate::routing::{Handler, RouteDefinition, RouteTree};

/// Root configuration for one router scope.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RouterConfig {
    /// Scope options.
    pub router: RouterOptions,

    /// Route definitions in precedence order.
    pub routes: Vec<RouteConfig>,

    /// Fallback rendered when no route matches.
    pub not_found: Option<NotFoundConfig>,

    /// Logging settings (used by the CLI).
    pub logging: LoggingConfig,
}

impl RouterConfig {
    /// Parse configuration from TOML text. No semantic validation.
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Compile the declared routes into a route tree.
    pub fn build_tree(&self) -> Result<RouteTree, InvalidPatternError> {
        let mut builder = RouteTree::builder();
        for route in &self.routes {
            builder = builder.definition(route.to_definition()?);
        }
        if let Some(not_found) = &self.not_found {
            builder = builder.not_found(not_found.handler());
        }
        builder.build()
    }
}

/// How a scope binds to its surroundings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RouterOptions {
    /// Resolve paths relative to the enclosing scope's matched prefix.
    pub contextual: bool,

    /// Keep the path in the location hash instead of session history.
    pub hash: bool,

    /// Styling hint passed through to rendered views.
    pub class_name: Option<String>,
}

impl RouterOptions {
    pub fn contextual() -> Self {
        Self {
            contextual: true,
            ..Self::default()
        }
    }

    pub fn hash() -> Self {
        Self {
            hash: true,
            ..Self::default()
        }
    }

    pub fn with_class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }
}

/// One route declaration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Path pattern (`/users/:id`, `/docs/*`).
    pub path: String,

    /// Handler name handed to the view layer.
    pub handler: String,

    /// Whether the handler needs an async load before it renders.
    #[serde(rename = "async", default)]
    pub async_load: bool,

    /// Identifying key for lookups.
    #[serde(default)]
    pub key: Option<String>,

    /// Extra properties forwarded to the rendered view.
    #[serde(default)]
    pub extra: Map<String, Value>,
}

impl RouteConfig {
    pub fn to_definition(&self) -> Result<RouteDefinition, InvalidPatternError> {
        let mut definition = RouteDefinition::new(&self.path, handler(&self.handler, self.async_load))?
            .with_extras(self.extra.clone());
        if let Some(key) = &self.key {
            definition = definition.with_key(key.clone());
        }
        Ok(definition)
    }
}

/// Not-found fallback declaration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotFoundConfig {
    pub handler: String,

    #[serde(rename = "async", default)]
    pub async_load: bool,
}

impl NotFoundConfig {
    pub fn handler(&self) -> Handler {
        handler(&self.handler, self.async_load)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter (trace, debug, info, warn, error); `RUST_LOG` overrides it.
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

fn handler(name: &str, async_load: bool) -> Handler {
    if async_load {
        Handler::with_async_load(name)
    } else {
        Handler::new(name)
    }
}
