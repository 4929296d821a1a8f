//! Route table - compiled routes grouped by HTTP method
//!
//! Each method keeps its routes in registration order; the matcher relies on
//! that order to break specificity ties.

use crate::pattern::{compile, CompiledPattern, Specificity};
use crate::{Error, Result};
use std::collections::HashMap;

/// A registered route. Immutable once stored in the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledRoute {
    method: String,
    pattern: CompiledPattern,
    handler: String,
    middleware: Vec<String>,
}

impl CompiledRoute {
    /// Upper-cased HTTP method
    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn pattern(&self) -> &CompiledPattern {
        &self.pattern
    }

    /// Handler identifier, resolved by the application
    pub fn handler(&self) -> &str {
        &self.handler
    }

    /// Middleware identifiers in execution order
    pub fn middleware(&self) -> &[String] {
        &self.middleware
    }

    pub fn specificity(&self) -> Specificity {
        self.pattern.specificity()
    }
}

/// Method -> routes in registration order
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: HashMap<String, Vec<CompiledRoute>>,
    len: usize,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile `pattern` and store it under `method`.
    ///
    /// Methods are case-insensitive. Fails with [`Error::InvalidPattern`] for a
    /// malformed template and [`Error::DuplicateRoute`] when the same method and
    /// raw pattern string are already present.
    pub fn register<I, S>(
        &mut self,
        method: &str,
        pattern: &str,
        middleware: I,
        handler: &str,
    ) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let pattern = compile(pattern)?;
        let method = method.to_uppercase();
        let routes = self.routes.entry(method.clone()).or_default();

        if routes.iter().any(|r| r.pattern.as_str() == pattern.as_str()) {
            return Err(Error::DuplicateRoute {
                method,
                pattern: pattern.as_str().to_string(),
            });
        }

        tracing::debug!(
            method = %method,
            pattern = %pattern,
            handler = handler,
            specificity = %pattern.specificity(),
            "route registered"
        );

        routes.push(CompiledRoute {
            method,
            pattern,
            handler: handler.to_string(),
            middleware: middleware.into_iter().map(Into::into).collect(),
        });
        self.len += 1;
        Ok(())
    }

    /// Routes for `method` in registration order; empty for unknown methods
    pub fn lookup(&self, method: &str) -> &[CompiledRoute] {
        self.routes
            .get(&method.to_uppercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Check if a method has any routes registered
    pub fn has_method(&self, method: &str) -> bool {
        self.routes.contains_key(&method.to_uppercase())
    }

    /// Get all registered methods
    pub fn methods(&self) -> Vec<String> {
        self.routes.keys().cloned().collect()
    }

    /// Every route, grouped by method
    pub fn routes(&self) -> impl Iterator<Item = &CompiledRoute> {
        self.routes.values().flatten()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NONE: [&str; 0] = [];

    #[test]
    fn test_register_and_lookup() {
        let mut table = RouteTable::new();
        table.register("GET", "/users", NONE, "list_users").unwrap();
        table.register("GET", "/users/:id", ["auth", "audit"], "show_user").unwrap();
        table.register("POST", "/users", ["auth"], "create_user").unwrap();

        let get = table.lookup("GET");
        assert_eq!(get.len(), 2);
        assert_eq!(get[0].handler(), "list_users");
        assert_eq!(get[1].handler(), "show_user");
        assert_eq!(get[1].middleware(), &["auth".to_string(), "audit".to_string()]);
        assert_eq!(get[1].pattern().as_str(), "/users/:id");

        assert_eq!(table.lookup("POST").len(), 1);
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_unknown_method_is_empty() {
        let mut table = RouteTable::new();
        table.register("GET", "/", NONE, "home").unwrap();

        assert!(table.lookup("DELETE").is_empty());
        assert!(RouteTable::new().lookup("GET").is_empty());
        assert!(RouteTable::new().is_empty());
    }

    #[test]
    fn test_duplicate_route() {
        let mut table = RouteTable::new();
        table.register("GET", "/users/:id", NONE, "a").unwrap();

        let err = table.register("get", "/users/:id", NONE, "b").unwrap_err();
        assert_eq!(
            err,
            Error::DuplicateRoute {
                method: "GET".into(),
                pattern: "/users/:id".into(),
            }
        );
        assert_eq!(table.len(), 1);

        // same shape under another method or another raw string is allowed
        table.register("PUT", "/users/:id", NONE, "c").unwrap();
        table.register("GET", "/users/:user_id", NONE, "d").unwrap();
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_invalid_pattern_not_stored() {
        let mut table = RouteTable::new();
        assert!(matches!(
            table.register("GET", "/files/*rest/more", NONE, "files"),
            Err(Error::InvalidPattern { .. })
        ));
        assert!(table.is_empty());
        assert!(!table.has_method("GET"));
    }

    #[test]
    fn test_methods() {
        let mut table = RouteTable::new();
        table.register("GET", "/users", NONE, "1").unwrap();
        table.register("post", "/users", NONE, "2").unwrap();
        table.register("DELETE", "/users/:id", NONE, "3").unwrap();

        assert!(table.has_method("GET"));
        assert!(table.has_method("POST"));
        assert!(table.has_method("delete"));
        assert!(!table.has_method("PUT"));

        let mut methods = table.methods();
        methods.sort();
        assert_eq!(methods, vec!["DELETE", "GET", "POST"]);
        assert_eq!(table.routes().count(), 3);
    }
}
