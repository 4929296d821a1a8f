//! Router - route registration and request dispatch
//!
//! Setup happens on a [`RouterBuilder`]: routes name their handler and
//! middlewares by id, and the application registers what those ids mean.
//! [`RouterBuilder::build`] resolves every id once and freezes the result
//! into a [`Router`], which is read-only and can be shared across threads.

use crate::handler::{self, Handler};
use crate::middleware::{Middleware, MiddlewareChain};
use crate::{Error, Method, Request, Response, Result, RouterConfig};
use gale_router::{Bindings, CompiledRoute, MatchResult, RouteTable};
use std::collections::HashMap;
use std::sync::Arc;

/// Resolved chain and handler for one route
struct Endpoint {
    chain: MiddlewareChain,
    handler: Arc<dyn Handler>,
}

/// Mutable setup-phase router
pub struct RouterBuilder {
    table: RouteTable,
    handlers: HashMap<String, Arc<dyn Handler>>,
    middlewares: HashMap<String, Arc<dyn Middleware>>,
    global: Vec<String>,
    fallback: Option<Arc<dyn Handler>>,
    config: RouterConfig,
}

impl Default for RouterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RouterBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            table: RouteTable::new(),
            handlers: HashMap::new(),
            middlewares: HashMap::new(),
            global: Vec::new(),
            fallback: None,
            config: RouterConfig::default(),
        }
    }

    pub fn config(&mut self, config: RouterConfig) -> &mut Self {
        self.config = config;
        self
    }

    /// Make `id` resolve to `handler`. Re-registering an id replaces it.
    pub fn handler(&mut self, id: impl Into<String>, handler: impl Handler + 'static) -> &mut Self {
        self.handlers.insert(id.into(), Arc::new(handler));
        self
    }

    /// Make `id` resolve to `middleware`. Re-registering an id replaces it.
    pub fn middleware(
        &mut self,
        id: impl Into<String>,
        middleware: impl Middleware + 'static,
    ) -> &mut Self {
        self.middlewares.insert(id.into(), Arc::new(middleware));
        self
    }

    /// Run middleware `id` ahead of every route's own chain
    pub fn global(&mut self, id: impl Into<String>) -> &mut Self {
        self.global.push(id.into());
        self
    }

    /// Handler for requests no route matches (default: plain 404)
    pub fn fallback(&mut self, handler: impl Handler + 'static) -> &mut Self {
        self.fallback = Some(Arc::new(handler));
        self
    }

    /// Add a route
    ///
    /// Fails with `InvalidMethod`, or with `InvalidPattern` / `DuplicateRoute`
    /// (wrapped in [`Error::Route`]).
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
        let method = Method::parse(method)?;
        self.table
            .register(method.as_str(), pattern, middleware, handler)?;
        Ok(())
    }

    /// Add a GET route
    pub fn get<I, S>(&mut self, pattern: &str, middleware: I, handler: &str) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.register(Method::Get.as_str(), pattern, middleware, handler)
    }

    /// Add a POST route
    pub fn post<I, S>(&mut self, pattern: &str, middleware: I, handler: &str) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.register(Method::Post.as_str(), pattern, middleware, handler)
    }

    /// Add a PUT route
    pub fn put<I, S>(&mut self, pattern: &str, middleware: I, handler: &str) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.register(Method::Put.as_str(), pattern, middleware, handler)
    }

    /// Add a DELETE route
    pub fn delete<I, S>(&mut self, pattern: &str, middleware: I, handler: &str) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.register(Method::Delete.as_str(), pattern, middleware, handler)
    }

    /// Add a PATCH route
    pub fn patch<I, S>(&mut self, pattern: &str, middleware: I, handler: &str) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.register(Method::Patch.as_str(), pattern, middleware, handler)
    }

    fn resolve(&self, route: &CompiledRoute) -> Result<Endpoint> {
        let handler = self
            .handlers
            .get(route.handler())
            .cloned()
            .ok_or_else(|| Error::UnknownHandler(route.handler().to_string()))?;

        let mut chain = MiddlewareChain::new();
        for id in self.global.iter().chain(route.middleware()) {
            let middleware = self
                .middlewares
                .get(id)
                .cloned()
                .ok_or_else(|| Error::UnknownMiddleware(id.clone()))?;
            chain.add(id.clone(), middleware);
        }

        Ok(Endpoint { chain, handler })
    }

    /// Resolve every handler and middleware id and freeze the router.
    ///
    /// Fails with `UnknownHandler` / `UnknownMiddleware` if a route names an
    /// id that was never registered.
    pub fn build(self) -> Result<Router> {
        let mut endpoints: HashMap<String, HashMap<String, Endpoint>> = HashMap::new();
        for route in self.table.routes() {
            let endpoint = self.resolve(route)?;
            endpoints
                .entry(route.method().to_string())
                .or_default()
                .insert(route.pattern().as_str().to_string(), endpoint);
        }

        tracing::debug!(
            routes = self.table.len(),
            handlers = self.handlers.len(),
            middlewares = self.middlewares.len(),
            "router built"
        );

        let fallback: Arc<dyn Handler> = match self.fallback {
            Some(fallback) => fallback,
            None => Arc::new(handler::not_found),
        };

        Ok(Router {
            table: self.table,
            endpoints,
            fallback,
            config: self.config,
        })
    }
}

/// Immutable dispatch-phase router
///
/// # Example
/// ```
/// use gale_core::{Method, Request, Response, Result, RouterBuilder};
///
/// let mut builder = RouterBuilder::new();
/// builder.handler("show_user", |req: &Request| -> Result<Response> {
///     Ok(Response::text(format!("user {}", req.param("id").unwrap_or("?"))))
/// });
/// builder.get("/users/:id", [] as [&str; 0], "show_user").unwrap();
/// let router = builder.build().unwrap();
///
/// let res = router.dispatch(Request::new(Method::Get, "/users/42")).unwrap();
/// assert_eq!(res.body_string().as_deref(), Some("user 42"));
///
/// let res = router.dispatch(Request::new(Method::Get, "/nope")).unwrap();
/// assert_eq!(res.status.as_u16(), 404);
/// ```
pub struct Router {
    table: RouteTable,
    endpoints: HashMap<String, HashMap<String, Endpoint>>,
    fallback: Arc<dyn Handler>,
    config: RouterConfig,
}

impl Router {
    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    /// Match without dispatching
    pub fn find(&self, method: &str, path: &str) -> MatchResult<'_> {
        self.table.find(method, path)
    }

    /// The underlying route table
    pub fn routes(&self) -> &RouteTable {
        &self.table
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Route `req` to its handler through the route's middleware chain.
    ///
    /// Unmatched requests go to the fallback exactly once. Errors from
    /// middlewares and handlers are returned unchanged.
    pub fn dispatch(&self, req: Request) -> Result<Response> {
        if let MatchResult::Matched { route, bindings } = self.table.find(req.method.as_str(), &req.path) {
            return self.run(route, bindings, req);
        }

        if req.method == Method::Head && self.config.head_to_get {
            if let MatchResult::Matched { route, bindings } =
                self.table.find(Method::Get.as_str(), &req.path)
            {
                tracing::debug!(path = %req.path, pattern = %route.pattern(), "HEAD served by GET route");
                return Ok(self.run(route, bindings, req)?.without_body());
            }
        }

        if self.config.method_not_allowed {
            let allowed = self.allowed_methods(&req.path);
            if !allowed.is_empty() {
                tracing::debug!(method = %req.method, path = %req.path, ?allowed, "method not allowed");
                return Ok(Response::method_not_allowed(&allowed));
            }
        }

        tracing::debug!(method = %req.method, path = %req.path, "no route matched, using fallback");
        self.fallback.call(&req)
    }

    /// Sorted methods that would serve `path`, counting HEAD when it is
    /// answered by a GET route
    pub fn allowed_methods(&self, path: &str) -> Vec<String> {
        let mut allowed = self.table.allowed_methods(path);
        let (get, head) = (Method::Get, Method::Head);
        if self.config.head_to_get
            && allowed.iter().any(|m| m == get.as_str())
            && !allowed.iter().any(|m| m == head.as_str())
        {
            allowed.push(head.to_string());
            allowed.sort();
        }
        allowed
    }

    fn run(&self, route: &CompiledRoute, bindings: Bindings, mut req: Request) -> Result<Response> {
        let endpoint = self
            .endpoints
            .get(route.method())
            .and_then(|by_pattern| by_pattern.get(route.pattern().as_str()))
            .ok_or_else(|| Error::UnknownHandler(route.handler().to_string()))?;

        req.params.extend(bindings);
        endpoint.chain.run(&mut req, endpoint.handler.as_ref())
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.table.len())
            .field("config", &self.config)
            .finish()
    }
}
