//! Error types shared by the router subsystems.

use thiserror::Error;

use crate::scope::ScopeId;

/// A route pattern that cannot be compiled.
///
/// Fatal to the route declaring it; reported while the route tree is built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidPatternError {
    /// A `*` segment appears before the last segment.
    #[error("pattern `{pattern}`: wildcard must be the final segment")]
    NonTrailingWildcard { pattern: String },

    /// More than one `*` segment.
    #[error("pattern `{pattern}`: at most one wildcard segment is allowed")]
    MultipleWildcards { pattern: String },

    /// Two `:name` segments bind the same name.
    #[error("pattern `{pattern}`: parameter `{name}` is declared twice")]
    DuplicateParameter { pattern: String, name: String },

    /// A bare `:` segment.
    #[error("pattern `{pattern}`: parameter name is empty")]
    EmptyParameterName { pattern: String },
}

/// Error delivered by the async-load capability for a current navigation.
///
/// Never returned synchronously: it reaches the caller through the
/// navigate callback, after the new match has been committed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("async load failed: {message}")]
pub struct AsyncLoadError {
    message: String,
}

impl AsyncLoadError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors surfaced by the router API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouterError {
    /// Route declaration failed.
    #[error(transparent)]
    InvalidPattern(#[from] InvalidPatternError),

    /// The scope was torn down or was never registered.
    #[error("no such router scope: {scope}")]
    NoSuchScope { scope: ScopeId },

    /// Navigation committed, but its load reported an error.
    #[error(transparent)]
    AsyncLoad(#[from] AsyncLoadError),

    /// A later navigation replaced this one before it committed.
    #[error("navigation to `{path}` was superseded")]
    Superseded { path: String },
}

/// Result type for router operations.
pub type RouterResult<T> = Result<T, RouterError>;
