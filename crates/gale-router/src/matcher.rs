//! Matcher - picks the most specific route for a method + path

use crate::pattern::{CompiledPattern, Segment};
use crate::table::{CompiledRoute, RouteTable};
use percent_encoding::percent_decode_str;
use std::collections::HashMap;

/// Values captured from a request path, in template order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bindings(Vec<(String, String)>);

impl Bindings {
    /// Value bound to `name`
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get bindings as HashMap for convenient access
    pub fn to_map(&self) -> HashMap<String, String> {
        self.0.iter().cloned().collect()
    }

    pub fn into_vec(self) -> Vec<(String, String)> {
        self.0
    }
}

impl IntoIterator for Bindings {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Outcome of a lookup. `NotFound` is an ordinary result, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchResult<'a> {
    Matched {
        route: &'a CompiledRoute,
        bindings: Bindings,
    },
    NotFound,
}

impl<'a> MatchResult<'a> {
    pub fn is_match(&self) -> bool {
        matches!(self, MatchResult::Matched { .. })
    }

    /// The matched route, if any
    pub fn route(&self) -> Option<&'a CompiledRoute> {
        match self {
            MatchResult::Matched { route, .. } => Some(*route),
            MatchResult::NotFound => None,
        }
    }

    /// Handler identifier of the matched route
    pub fn handler(&self) -> Option<&'a str> {
        self.route().map(CompiledRoute::handler)
    }

    pub fn bindings(&self) -> Option<&Bindings> {
        match self {
            MatchResult::Matched { bindings, .. } => Some(bindings),
            MatchResult::NotFound => None,
        }
    }
}

/// Split a request path into decoded segments.
///
/// Drops the query string and fragment, ignores empty segments (so `/users/`,
/// `//users` and `users` are all `["users"]`), and percent-decodes each
/// segment after splitting, so an encoded `%2F` stays inside its segment.
pub fn normalize_path(path: &str) -> Vec<String> {
    let path = path.split(|c: char| c == '?' || c == '#').next().unwrap_or_default();
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(|s| percent_decode_str(s).decode_utf8_lossy().into_owned())
        .collect()
}

/// Try a single pattern against normalized path segments
fn bind(pattern: &CompiledPattern, path: &[String]) -> Option<Bindings> {
    let mut bindings = Vec::new();

    for (i, segment) in pattern.segments().iter().enumerate() {
        match segment {
            Segment::Literal(literal) => {
                if path.get(i)? != literal {
                    return None;
                }
            }
            Segment::Param(name) => {
                bindings.push((name.clone(), path.get(i)?.clone()));
            }
            Segment::Wildcard(name) => {
                let rest = path.get(i..).unwrap_or_default().join("/");
                bindings.push((name.clone(), rest));
                return Some(Bindings(bindings));
            }
        }
    }

    // without a wildcard every path segment must be consumed
    (path.len() == pattern.segments().len()).then_some(Bindings(bindings))
}

impl RouteTable {
    /// Find the most specific route for `method` + `path`.
    ///
    /// Ties between equally specific routes go to the one registered first.
    ///
    /// # Example
    /// ```
    /// use gale_router::RouteTable;
    ///
    /// let mut table = RouteTable::new();
    /// table.register("GET", "/users/:id", ["auth"], "show_user").unwrap();
    /// table.register("GET", "/users/me", ["auth"], "show_me").unwrap();
    ///
    /// let m = table.find("GET", "/users/42");
    /// assert_eq!(m.handler(), Some("show_user"));
    /// assert_eq!(m.bindings().unwrap().get("id"), Some("42"));
    ///
    /// assert_eq!(table.find("GET", "/users/me").handler(), Some("show_me"));
    /// assert!(!table.find("POST", "/users/42").is_match());
    /// ```
    pub fn find(&self, method: &str, path: &str) -> MatchResult<'_> {
        let candidates = self.lookup(method);
        if candidates.is_empty() {
            tracing::trace!(method, path, "no routes for method");
            return MatchResult::NotFound;
        }

        let segments = normalize_path(path);
        let mut best: Option<(&CompiledRoute, Bindings)> = None;

        for route in candidates {
            if let Some((current, _)) = &best {
                // strictly greater only: the earlier registration keeps a tie
                if route.specificity() <= current.specificity() {
                    continue;
                }
            }
            if let Some(bindings) = bind(route.pattern(), &segments) {
                best = Some((route, bindings));
            }
        }

        match best {
            Some((route, bindings)) => {
                tracing::trace!(method, path, pattern = %route.pattern(), "route matched");
                MatchResult::Matched { route, bindings }
            }
            None => {
                tracing::trace!(method, path, "no route matched");
                MatchResult::NotFound
            }
        }
    }

    /// Methods with at least one route matching `path`, sorted
    pub fn allowed_methods(&self, path: &str) -> Vec<String> {
        let segments = normalize_path(path);
        let mut methods: Vec<String> = self
            .methods()
            .into_iter()
            .filter(|m| {
                self.lookup(m)
                    .iter()
                    .any(|r| bind(r.pattern(), &segments).is_some())
            })
            .collect();
        methods.sort();
        methods
    }
}
