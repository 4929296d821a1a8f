//! gale-core: Request dispatch core
//!
//! Builds request/response handling on top of `gale-router`:
//! routes are registered with handler and middleware ids, the application
//! registers what those ids mean, and a frozen [`Router`] dispatches requests
//! through each route's middleware chain.
//!
//! ## Features
//! - `config` (default) - TOML route manifests via serde
//!
//! ## Example
//! ```
//! use gale_core::middleware::{BearerAuth, Tracing};
//! use gale_core::{Method, Request, Response, Result, RouterBuilder, StatusCode};
//!
//! let mut builder = RouterBuilder::new();
//! builder
//!     .middleware("tracing", Tracing::default())
//!     .middleware("auth", BearerAuth::new(|token: &str| (token == "t0k").then(|| "ada".to_string())))
//!     .global("tracing")
//!     .handler("list_orders", |req: &Request| -> Result<Response> {
//!         Ok(Response::text(format!("orders of {}", req.param("id").unwrap_or("?"))))
//!     });
//! builder.get("/users/:id/orders", ["auth"], "list_orders").unwrap();
//! let router = builder.build().unwrap();
//!
//! let denied = router.dispatch(Request::new(Method::Get, "/users/7/orders")).unwrap();
//! assert_eq!(denied.status, StatusCode::UNAUTHORIZED);
//!
//! let req = Request::new(Method::Get, "/users/7/orders")
//!     .with_header("Authorization", "Bearer t0k");
//! let res = router.dispatch(req).unwrap();
//! assert_eq!(res.body_string().as_deref(), Some("orders of 7"));
//! assert!(res.header("x-request-id").is_some());
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod handler;
pub mod middleware;
pub mod request;
pub mod response;
pub mod router;

// Re-exports
pub use config::RouterConfig;
#[cfg(feature = "config")]
pub use config::{RouteEntry, RouteManifest};
pub use error::{BoxError, Error, Result};
pub use handler::Handler;
pub use request::{Method, Request};
pub use response::{Response, StatusCode};
pub use router::{Router, RouterBuilder};

// Middleware re-exports
pub use middleware::{Middleware, MiddlewareChain, Next};

// Router crate re-exports
pub use gale_router::{Bindings, CompiledRoute, MatchResult, Segment, WILDCARD_KEY};
