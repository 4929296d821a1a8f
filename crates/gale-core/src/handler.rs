//! Terminal request handlers

use crate::{Request, Response, Result};

/// The last link of a route's chain. Also used for the router fallback.
///
/// Implemented for any `Fn(&Request) -> Result<Response>`:
/// ```
/// use gale_core::{Handler, Method, Request, Response, Result};
///
/// let hello = |req: &Request| -> Result<Response> {
///     Ok(Response::text(format!("hello {}", req.path)))
/// };
/// let res = hello.call(&Request::new(Method::Get, "/world")).unwrap();
/// assert_eq!(res.body_string().as_deref(), Some("hello /world"));
/// ```
pub trait Handler: Send + Sync {
    fn call(&self, req: &Request) -> Result<Response>;
}

impl<F> Handler for F
where
    F: Fn(&Request) -> Result<Response> + Send + Sync,
{
    fn call(&self, req: &Request) -> Result<Response> {
        self(req)
    }
}

/// Default fallback: a plain 404
pub(crate) fn not_found(_req: &Request) -> Result<Response> {
    Ok(Response::not_found())
}
