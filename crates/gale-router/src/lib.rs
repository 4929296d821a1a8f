//! gale-router: Method + path route matcher
//!
//! Route matching for gale-core. Holds no HTTP types: routes point at
//! handler and middleware identifiers that the application resolves.
//!
//! ## Features
//! - Route templates compiled once into typed segments
//! - Static paths: `/users`, `/api/v1/health`
//! - Parameters: `/users/:id`, `/posts/:postId/comments/:commentId`
//! - Wildcards: `/files/*path`, `/static/*`
//! - Percent-decoded, slash-normalized request paths
//!
//! ## Path Syntax
//! - `:name` - Named parameter (captures one segment, `[A-Za-z0-9_]+`, not starting with `_`)
//! - `*` or `*name` - Wildcard (captures remaining path, final segment only)
//!
//! ## Priority
//! 1. More literal segments
//! 2. No wildcard over wildcard
//! 3. Fewer parameters
//! 4. Earlier registration
//!
//! ## Example
//! ```
//! use gale_router::{MatchResult, RouteTable};
//!
//! let mut table = RouteTable::new();
//! table.register("GET", "/users", ["log"], "list_users").unwrap();
//! table.register("GET", "/users/:id", ["log", "auth"], "show_user").unwrap();
//! table.register("GET", "/files/*path", ["log"], "serve_file").unwrap();
//!
//! match table.find("GET", "/users/123") {
//!     MatchResult::Matched { route, bindings } => {
//!         assert_eq!(route.handler(), "show_user");
//!         assert_eq!(route.middleware(), &["log", "auth"]);
//!         assert_eq!(bindings.get("id"), Some("123"));
//!     }
//!     MatchResult::NotFound => unreachable!(),
//! }
//! ```

pub mod error;
pub mod matcher;
pub mod pattern;
pub mod table;

pub use error::{Error, Result};
pub use matcher::{normalize_path, Bindings, MatchResult};
pub use pattern::{compile, CompiledPattern, Segment, Specificity, RESERVED_PREFIX, WILDCARD_KEY};
pub use table::{CompiledRoute, RouteTable};
