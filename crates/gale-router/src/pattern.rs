//! Route template compiler
//!
//! Turns `/users/:id/files/*rest` into typed segments once, at registration,
//! so matching never re-parses the template.

use crate::{Error, Result};
use std::cmp::Ordering;
use std::fmt;

/// Binding key used by a bare `*` wildcard
pub const WILDCARD_KEY: &str = "*";

/// Binding names starting with this are left to middleware annotations
/// (`_auth_user`, `_request_id`), so a path can never forge them
pub const RESERVED_PREFIX: char = '_';

/// One `/`-delimited unit of a route template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Must equal the path segment exactly (case-sensitive)
    Literal(String),
    /// `:name` - captures one non-empty path segment
    Param(String),
    /// `*name` or `*` - captures the remaining path; always last
    Wildcard(String),
}

impl Segment {
    fn parse(raw: &str, pattern: &str) -> Result<Self> {
        if let Some(name) = raw.strip_prefix(':') {
            if name.is_empty() {
                return Err(Error::invalid(pattern, "empty parameter name"));
            }
            if !is_valid_name(name) {
                return Err(Error::invalid(pattern, "parameter name must be alphanumeric or '_'"));
            }
            if name.starts_with(RESERVED_PREFIX) {
                return Err(Error::invalid(pattern, "parameter name must not start with '_'"));
            }
            Ok(Segment::Param(name.to_string()))
        } else if let Some(name) = raw.strip_prefix('*') {
            if name.is_empty() {
                return Ok(Segment::Wildcard(WILDCARD_KEY.to_string()));
            }
            if !is_valid_name(name) {
                return Err(Error::invalid(pattern, "wildcard name must be alphanumeric or '_'"));
            }
            if name.starts_with(RESERVED_PREFIX) {
                return Err(Error::invalid(pattern, "wildcard name must not start with '_'"));
            }
            Ok(Segment::Wildcard(name.to_string()))
        } else {
            Ok(Segment::Literal(raw.to_string()))
        }
    }

    /// Binding name for params and wildcards
    pub fn name(&self) -> Option<&str> {
        match self {
            Segment::Literal(_) => None,
            Segment::Param(name) | Segment::Wildcard(name) => Some(name),
        }
    }
}

fn is_valid_name(name: &str) -> bool {
    name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// Ranking used to pick between several matching routes.
///
/// Compares `(literals, no wildcard, -params)` lexicographically; the greater
/// value is the more specific route. This ranks the wildcard flag before the
/// param count, unlike a plain `(literals, -params, wildcard)` tuple, which
/// would put `/a/*` above `/a/:x`. A trailing wildcard therefore always loses
/// to a route with the same number of literals that does not have one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Specificity {
    pub literals: usize,
    pub params: usize,
    pub wildcard: bool,
}

impl Specificity {
    fn key(&self) -> (usize, bool, std::cmp::Reverse<usize>) {
        (self.literals, !self.wildcard, std::cmp::Reverse(self.params))
    }
}

impl Ord for Specificity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl PartialOrd for Specificity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Specificity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "literals={} params={} wildcard={}",
            self.literals, self.params, self.wildcard
        )
    }
}

/// A validated route template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledPattern {
    raw: String,
    segments: Vec<Segment>,
    specificity: Specificity,
}

impl CompiledPattern {
    /// The template exactly as registered
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn specificity(&self) -> Specificity {
        self.specificity
    }

    /// Whether the last segment is a wildcard
    pub fn has_wildcard(&self) -> bool {
        self.specificity.wildcard
    }

    /// Binding names in template order
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(Segment::name)
    }
}

impl fmt::Display for CompiledPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Compile a route template.
///
/// Leading, trailing and doubled slashes are ignored, so `/` and `//` both
/// compile to the root pattern with zero segments.
///
/// # Example
/// ```
/// use gale_router::{compile, Segment};
///
/// let p = compile("/users/:id").unwrap();
/// assert_eq!(
///     p.segments(),
///     &[Segment::Literal("users".into()), Segment::Param("id".into())]
/// );
/// assert!(compile("/files/*rest/more").is_err());
/// ```
pub fn compile(pattern: &str) -> Result<CompiledPattern> {
    if pattern.is_empty() {
        return Err(Error::invalid(pattern, "empty pattern"));
    }

    let mut segments: Vec<Segment> = Vec::new();
    let mut specificity = Specificity::default();

    for raw in pattern.split('/').filter(|s| !s.is_empty()) {
        if specificity.wildcard {
            return Err(Error::invalid(pattern, "wildcard must be the last segment"));
        }

        let segment = Segment::parse(raw, pattern)?;
        if let Some(name) = segment.name() {
            if segments.iter().any(|s| s.name() == Some(name)) {
                return Err(Error::invalid(pattern, "duplicate parameter name"));
            }
        }

        match segment {
            Segment::Literal(_) => specificity.literals += 1,
            Segment::Param(_) => specificity.params += 1,
            Segment::Wildcard(_) => specificity.wildcard = true,
        }
        segments.push(segment);
    }

    Ok(CompiledPattern {
        raw: pattern.to_string(),
        segments,
        specificity,
    })
}
