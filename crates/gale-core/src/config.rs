//! Router configuration
//!
//! `RouterConfig` tunes dispatch behaviour. With the `config` feature, a whole
//! route table can also be described in TOML and applied to a
//! [`RouterBuilder`](crate::RouterBuilder):
//!
//! ```toml
//! global = ["tracing"]
//!
//! [router]
//! method_not_allowed = true
//!
//! [[routes]]
//! method = "GET"
//! path = "/users/:id"
//! middleware = ["auth"]
//! handler = "show_user"
//! ```

/// Dispatch options. Everything is off by default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(serde::Deserialize))]
#[cfg_attr(feature = "config", serde(default, deny_unknown_fields))]
pub struct RouterConfig {
    /// Answer HEAD with the GET route when no HEAD route matches
    pub head_to_get: bool,
    /// Answer 405 with an `Allow` header, instead of the fallback, when the
    /// path matches under other methods
    pub method_not_allowed: bool,
}

impl RouterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn head_to_get(mut self) -> Self {
        self.head_to_get = true;
        self
    }

    pub fn method_not_allowed(mut self) -> Self {
        self.method_not_allowed = true;
        self
    }
}

#[cfg(feature = "config")]
pub use manifest::{RouteEntry, RouteManifest};

#[cfg(feature = "config")]
mod manifest {
    use super::RouterConfig;
    use crate::{Result, RouterBuilder};
    use serde::Deserialize;
    use std::path::Path;

    /// One `[[routes]]` entry
    #[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
    #[serde(deny_unknown_fields)]
    pub struct RouteEntry {
        pub method: String,
        pub path: String,
        #[serde(default)]
        pub middleware: Vec<String>,
        pub handler: String,
    }

    /// Routes and options loaded from TOML
    #[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
    #[serde(default, deny_unknown_fields)]
    pub struct RouteManifest {
        pub router: RouterConfig,
        /// Middleware ids run before every route's own chain
        pub global: Vec<String>,
        pub routes: Vec<RouteEntry>,
    }

    impl RouteManifest {
        pub fn from_toml_str(s: &str) -> Result<Self> {
            Ok(toml::from_str(s)?)
        }

        /// Read and parse a manifest file
        pub fn load(path: impl AsRef<Path>) -> Result<Self> {
            let path = path.as_ref();
            let content = std::fs::read_to_string(path)?;
            let manifest = Self::from_toml_str(&content)?;
            tracing::debug!(path = %path.display(), routes = manifest.routes.len(), "route manifest loaded");
            Ok(manifest)
        }
    }

    impl RouterBuilder {
        /// Register everything a manifest describes.
        ///
        /// Stops at the first invalid or duplicate route; entries before it
        /// stay registered.
        pub fn apply_manifest(&mut self, manifest: &RouteManifest) -> Result<&mut Self> {
            self.config(manifest.router.clone());
            for id in &manifest.global {
                self.global(id.clone());
            }
            for entry in &manifest.routes {
                self.register(&entry.method, &entry.path, &entry.middleware, &entry.handler)?;
            }
            Ok(self)
        }
    }

}
