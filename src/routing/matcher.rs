//! Path pattern compilation and matching.
//!
//! # Responsibilities
//! - Compile pattern strings into segment lists
//! - Match a candidate path segment by segment
//! - Extract named parameters and the wildcard residual
//!
//! # Design Decisions
//! - Pure functions, no state
//! - Literal segments compare exactly (case-sensitive)
//! - No regex; matching is a single linear walk
//! - A single trailing slash is insignificant, but an empty residual after a
//!   wildcard is a real match (the sub-scope root)

use serde::Serialize;

use crate::error::InvalidPatternError;

/// One compiled pattern segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Must equal the path segment exactly.
    Literal(String),
    /// `:name`, binds exactly one path segment.
    Param(String),
    /// Trailing `*`, consumes the rest of the path.
    Wildcard,
}

/// A compiled route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    source: String,
    segments: Vec<Segment>,
    wildcard: bool,
}

impl RoutePattern {
    /// Compile a pattern string such as `/users/:id` or `/docs/*`.
    pub fn compile(pattern: &str) -> Result<Self, InvalidPatternError> {
        let normalized = normalize_path(pattern);
        let raw: Vec<&str> = split_segments(&normalized).collect();

        let wildcards = raw.iter().filter(|s| **s == "*").count();
        if wildcards > 1 {
            return Err(InvalidPatternError::MultipleWildcards {
                pattern: pattern.to_string(),
            });
        }

        let mut segments = Vec::with_capacity(raw.len());
        let mut names: Vec<&str> = Vec::new();

        for (idx, seg) in raw.iter().enumerate() {
            if *seg == "*" {
                if idx + 1 != raw.len() {
                    return Err(InvalidPatternError::NonTrailingWildcard {
                        pattern: pattern.to_string(),
                    });
                }
                segments.push(Segment::Wildcard);
            } else if let Some(name) = seg.strip_prefix(':') {
                if name.is_empty() {
                    return Err(InvalidPatternError::EmptyParameterName {
                        pattern: pattern.to_string(),
                    });
                }
                if names.contains(&name) {
                    return Err(InvalidPatternError::DuplicateParameter {
                        pattern: pattern.to_string(),
                        name: name.to_string(),
                    });
                }
                names.push(name);
                segments.push(Segment::Param(name.to_string()));
            } else {
                segments.push(Segment::Literal((*seg).to_string()));
            }
        }

        Ok(Self {
            source: pattern.to_string(),
            wildcard: wildcards == 1,
            segments,
        })
    }

    /// `/*`: matches every path.
    pub fn catch_all() -> Self {
        Self {
            source: "/*".to_string(),
            segments: vec![Segment::Wildcard],
            wildcard: true,
        }
    }

    /// The pattern as declared.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Whether the pattern ends in a wildcard and so accepts any suffix.
    pub fn is_wildcard(&self) -> bool {
        self.wildcard
    }

    /// Parameter names in declaration order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param(name) => Some(name.as_str()),
            _ => None,
        })
    }

    /// Match a candidate path against this pattern.
    ///
    /// Returns `None` when the path does not match.
    pub fn match_path(&self, path: &str) -> Option<PatternMatch> {
        let normalized = normalize_path(path);
        let path_segments: Vec<&str> = split_segments(&normalized).collect();

        let mut params = Params::default();
        let mut consumed = 0;

        for segment in &self.segments {
            match segment {
                Segment::Wildcard => {
                    let residual = path_segments[consumed..].join("/");
                    return Some(PatternMatch {
                        params,
                        prefix: join_prefix(&path_segments[..consumed]),
                        residual: Some(residual),
                    });
                }
                Segment::Param(name) => {
                    let value = path_segments.get(consumed)?;
                    params.insert(name.clone(), decode_segment(value));
                    consumed += 1;
                }
                Segment::Literal(expected) => {
                    let value = path_segments.get(consumed)?;
                    if value != expected {
                        return None;
                    }
                    consumed += 1;
                }
            }
        }

        if consumed == path_segments.len() {
            Some(PatternMatch {
                params,
                prefix: normalized,
                residual: None,
            })
        } else {
            None
        }
    }
}

/// Parts of a successful pattern match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMatch {
    pub params: Params,
    /// The consumed part of the path, with a leading slash (empty when the
    /// pattern is a bare `/*`).
    pub prefix: String,
    /// Unconsumed segments joined with `/`, for wildcard patterns only.
    pub residual: Option<String>,
}

/// Decoded path parameters, in pattern order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Params(Vec<(String, String)>);

impl Params {
    /// Get a parameter value by name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    fn insert(&mut self, name: String, value: String) {
        self.0.push((name, value));
    }
}

/// Canonical form of a path: leading slash, no single trailing slash.
pub fn normalize_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len() + 1);
    if !path.starts_with('/') {
        out.push('/');
    }
    out.push_str(path);
    if out.len() > 1 && out.ends_with('/') {
        out.pop();
    }
    out
}

/// Join a scope prefix and a path relative to that scope.
pub fn join_paths(prefix: &str, relative: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    if relative.starts_with('/') {
        format!("{prefix}{relative}")
    } else {
        format!("{prefix}/{relative}")
    }
}

fn split_segments(normalized: &str) -> impl Iterator<Item = &str> {
    let trimmed = normalized.strip_prefix('/').unwrap_or(normalized);
    trimmed.split('/').filter(move |_| !trimmed.is_empty())
}

fn join_prefix(consumed: &[&str]) -> String {
    consumed.iter().fold(String::new(), |mut acc, seg| {
        acc.push('/');
        acc.push_str(seg);
        acc
    })
}

fn decode_segment(raw: &str) -> String {
    urlencoding::decode(raw)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}
