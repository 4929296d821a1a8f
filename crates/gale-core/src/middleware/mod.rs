//! Middleware chain
//!
//! Each middleware sees the request before the handler and may answer it
//! itself. Results are explicit values: `Next::Continue` runs the rest of the
//! chain, `Next::Respond` stops it, and `Err` aborts dispatch unchanged.

pub mod auth;
pub mod tracing;

// Re-exports for convenience
pub use auth::{ApiKeyAuth, BearerAuth, BearerToken, CredentialSource, AUTH_USER_PARAM};
pub use self::tracing::{IdGenerator, Tracing, TracingConfig, REQUEST_ID_PARAM};

use crate::{Handler, Request, Response, Result};
use std::sync::Arc;

/// What the chain does after a middleware's `before` hook
#[derive(Debug)]
pub enum Next {
    /// Run the rest of the chain
    Continue,
    /// Skip the remaining middlewares and the handler
    Respond(Response),
}

/// Middleware trait - process request/response
pub trait Middleware: Send + Sync {
    /// Process request before handler
    fn before(&self, req: &mut Request) -> Result<Next>;

    /// Process response after handler. Runs in reverse order, only for
    /// middlewares whose `before` ran.
    fn after(&self, _req: &Request, _res: &mut Response) -> Result<()> {
        Ok(())
    }
}

/// Middleware built from a closure, see [`from_fn`]
pub struct FromFn<F> {
    f: F,
}

/// Use a closure as a `before`-only middleware
///
/// ```
/// use gale_core::middleware::{from_fn, Middleware, Next};
/// use gale_core::{Method, Request, Response, StatusCode};
///
/// let guard = from_fn(|req: &mut Request| {
///     Ok(match req.header("x-api-key") {
///         Some(_) => Next::Continue,
///         None => Next::Respond(Response::new(StatusCode::FORBIDDEN)),
///     })
/// });
///
/// let mut req = Request::new(Method::Get, "/");
/// assert!(matches!(guard.before(&mut req).unwrap(), Next::Respond(_)));
/// ```
pub fn from_fn<F>(f: F) -> FromFn<F>
where
    F: Fn(&mut Request) -> Result<Next> + Send + Sync,
{
    FromFn { f }
}

impl<F> Middleware for FromFn<F>
where
    F: Fn(&mut Request) -> Result<Next> + Send + Sync,
{
    fn before(&self, req: &mut Request) -> Result<Next> {
        (self.f)(req)
    }
}

/// Middleware chain
#[derive(Clone, Default)]
pub struct MiddlewareChain {
    middlewares: Vec<(String, Arc<dyn Middleware>)>,
}

impl MiddlewareChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, id: impl Into<String>, middleware: Arc<dyn Middleware>) {
        self.middlewares.push((id.into(), middleware));
    }

    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }

    /// Middleware ids in execution order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.middlewares.iter().map(|(id, _)| id.as_str())
    }

    /// Run `before` hooks front to back, then `handler`, then `after` hooks
    /// back to front.
    pub fn run(&self, req: &mut Request, handler: &dyn Handler) -> Result<Response> {
        let mut entered = 0;
        let mut early = None;

        for (id, middleware) in &self.middlewares {
            entered += 1;
            match middleware.before(req)? {
                Next::Continue => {}
                Next::Respond(res) => {
                    ::tracing::debug!(
                        middleware = %id,
                        status = res.status.as_u16(),
                        "chain short-circuited"
                    );
                    early = Some(res);
                    break;
                }
            }
        }

        let mut res = match early {
            Some(res) => res,
            None => handler.call(req)?,
        };

        for (_, middleware) in self.middlewares[..entered].iter().rev() {
            middleware.after(req, &mut res)?;
        }

        Ok(res)
    }
}

impl std::fmt::Debug for MiddlewareChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.ids()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, Method, StatusCode};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Records before/after calls into a shared log
    struct Recorder {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
        stop: bool,
    }

    impl Middleware for Recorder {
        fn before(&self, _req: &mut Request) -> Result<Next> {
            self.log.lock().unwrap().push(format!("before:{}", self.name));
            if self.stop {
                Ok(Next::Respond(Response::new(StatusCode::FORBIDDEN)))
            } else {
                Ok(Next::Continue)
            }
        }

        fn after(&self, _req: &Request, res: &mut Response) -> Result<()> {
            self.log.lock().unwrap().push(format!("after:{}", self.name));
            res.headers.push(("x-seen".into(), self.name.into()));
            Ok(())
        }
    }

    fn recorder(name: &'static str, log: &Arc<Mutex<Vec<String>>>, stop: bool) -> Arc<dyn Middleware> {
        Arc::new(Recorder {
            name,
            log: log.clone(),
            stop,
        })
    }

    #[test]
    fn test_runs_in_order_around_handler() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut chain = MiddlewareChain::new();
        chain.add("a", recorder("a", &log, false));
        chain.add("b", recorder("b", &log, false));

        let handler_log = log.clone();
        let handler = move |_req: &Request| -> Result<Response> {
            handler_log.lock().unwrap().push("handler".to_string());
            Ok(Response::ok())
        };

        let mut req = Request::new(Method::Get, "/");
        let res = chain.run(&mut req, &handler).unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec!["before:a", "before:b", "handler", "after:b", "after:a"]
        );
        assert_eq!(res.headers.len(), 2);
        assert_eq!(res.headers[0].1, "b");
    }

    #[test]
    fn test_short_circuit_skips_rest_and_handler() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut chain = MiddlewareChain::new();
        chain.add("a", recorder("a", &log, false));
        chain.add("guard", recorder("guard", &log, true));
        chain.add("c", recorder("c", &log, false));

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let handler = move |_req: &Request| -> Result<Response> {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Response::ok())
        };

        let mut req = Request::new(Method::Get, "/");
        let res = chain.run(&mut req, &handler).unwrap();

        assert_eq!(res.status, StatusCode::FORBIDDEN);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            *log.lock().unwrap(),
            vec!["before:a", "before:guard", "after:guard", "after:a"]
        );
    }

    #[test]
    fn test_errors_propagate_unchanged() {
        let mut chain = MiddlewareChain::new();
        chain.add("boom", Arc::new(from_fn(|_req: &mut Request| Err(Error::middleware("denied")))));

        let handler = |_req: &Request| -> Result<Response> { Ok(Response::ok()) };
        let mut req = Request::new(Method::Get, "/");
        let err = chain.run(&mut req, &handler).unwrap_err();
        assert!(matches!(err, Error::Middleware(ref e) if e.to_string() == "denied"));

        let failing = |_req: &Request| -> Result<Response> { Err(Error::handler("db down")) };
        let err = MiddlewareChain::new().run(&mut req, &failing).unwrap_err();
        assert!(matches!(err, Error::Handler(ref e) if e.to_string() == "db down"));
    }

    #[test]
    fn test_middleware_mutates_request_for_handler() {
        let mut chain = MiddlewareChain::new();
        chain.add(
            "tag",
            Arc::new(from_fn(|req: &mut Request| {
                req.params.insert("tenant".into(), "acme".into());
                Ok(Next::Continue)
            })),
        );

        let handler = |req: &Request| -> Result<Response> {
            Ok(Response::text(req.param("tenant").unwrap_or("-").to_string()))
        };
        let mut req = Request::new(Method::Get, "/");
        let res = chain.run(&mut req, &handler).unwrap();
        assert_eq!(res.body_string().as_deref(), Some("acme"));
    }

    #[test]
    fn test_ids() {
        let mut chain = MiddlewareChain::new();
        chain.add("x", Arc::new(from_fn(|_req: &mut Request| Ok(Next::Continue))));
        chain.add("y", Arc::new(from_fn(|_req: &mut Request| Ok(Next::Continue))));
        assert_eq!(chain.ids().collect::<Vec<_>>(), vec!["x", "y"]);
        assert_eq!(format!("{chain:?}"), r#"["x", "y"]"#);
    }
}
