//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Compile every route pattern
//! - Detect duplicate route keys and conflicting scope options
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RouterConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashMap;

use thiserror::Error;

use crate::config::schema::RouterConfig;
use crate::error::InvalidPatternError;
use crate::routing::RoutePattern;

/// A single semantic problem in a route file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("route {index}: {source}")]
    InvalidPattern {
        index: usize,
        #[source]
        source: InvalidPatternError,
    },

    #[error("route {index}: handler name is empty")]
    EmptyHandler { index: usize },

    #[error("not_found: handler name is empty")]
    EmptyNotFoundHandler,

    #[error("route {index}: key `{key}` is already used by route {first}")]
    DuplicateKey { index: usize, first: usize, key: String },

    #[error("router: a contextual scope cannot use hash routing")]
    ContextualHash,
}

/// Validate a parsed configuration, collecting every error.
pub fn validate_config(config: &RouterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.router.contextual && config.router.hash {
        errors.push(ValidationError::ContextualHash);
    }

    let mut keys: HashMap<&str, usize> = HashMap::new();
    for (index, route) in config.routes.iter().enumerate() {
        if let Err(source) = RoutePattern::compile(&route.path) {
            errors.push(ValidationError::InvalidPattern { index, source });
        }

        if route.handler.trim().is_empty() {
            errors.push(ValidationError::EmptyHandler { index });
        }

        if let Some(key) = route.key.as_deref() {
            match keys.get(key) {
                Some(&first) => errors.push(ValidationError::DuplicateKey {
                    index,
                    first,
                    key: key.to_string(),
                }),
                None => {
                    keys.insert(key, index);
                }
            }
        }
    }

    if config
        .not_found
        .as_ref()
        .is_some_and(|nf| nf.handler.trim().is_empty())
    {
        errors.push(ValidationError::EmptyNotFoundHandler);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
