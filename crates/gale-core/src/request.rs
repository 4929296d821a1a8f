//! Requests as seen by middlewares and handlers
//!
//! A [`Request`] doubles as the per-request context: the router merges route
//! bindings into [`Request::params`] and middlewares add their own entries
//! there (conventionally under `_`-prefixed keys).

use crate::{Error, Result};
use bytes::Bytes;
use percent_encoding::percent_decode_str;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::time::Instant;

macro_rules! methods {
    ($($variant:ident => $name:literal),+ $(,)?) => {
        /// HTTP method
        ///
        /// Registered methods get their own variant; any other RFC 9110 token
        /// (`PURGE`, `PROPFIND`, ...) is carried upper-cased in `Extension`.
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum Method {
            $($variant,)+
            Extension(String),
        }

        impl Method {
            /// Every standard method, in declaration order
            pub const ALL: &'static [Method] = &[$(Method::$variant,)+];

            /// Upper-case wire name
            pub fn as_str(&self) -> &str {
                match self {
                    $(Method::$variant => $name,)+
                    Method::Extension(name) => name,
                }
            }
        }
    };
}

methods! {
    Get => "GET",
    Post => "POST",
    Put => "PUT",
    Delete => "DELETE",
    Patch => "PATCH",
    Head => "HEAD",
    Options => "OPTIONS",
    Connect => "CONNECT",
    Trace => "TRACE",
}

/// RFC 9110 `tchar`
fn is_token_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}

impl Method {
    /// Case-insensitive lookup by name.
    ///
    /// Unknown names become [`Method::Extension`]; only input that is not an
    /// HTTP token (empty, whitespace, separators) is rejected.
    pub fn parse(s: &str) -> Result<Self> {
        if s.is_empty() || !s.bytes().all(is_token_char) {
            return Err(Error::InvalidMethod(s.to_string()));
        }
        Ok(Method::ALL
            .iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .cloned()
            .unwrap_or_else(|| Method::Extension(s.to_ascii_uppercase())))
    }
}

impl std::str::FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Method::parse(s)
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Incoming request
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    /// Raw path, percent-encoded, without the query string
    pub path: String,
    /// Query string without the leading `?`
    pub query: Option<String>,
    pub headers: SmallVec<[(String, String); 16]>,
    pub body: Bytes,
    /// Route bindings and middleware annotations
    pub params: HashMap<String, String>,
    /// Creation time, used for access-log latency
    pub received_at: Instant,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: None,
            headers: SmallVec::new(),
            body: Bytes::new(),
            params: HashMap::new(),
            received_at: Instant::now(),
        }
    }

    /// Split a request-target such as `/search?q=gale` into path and query
    pub fn from_uri(method: Method, uri: &str) -> Self {
        let (path, query) = match uri.split_once('?') {
            Some((path, query)) => (path, Some(query.to_string())),
            None => (uri, None),
        };
        Self {
            query,
            ..Self::new(method, path)
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// First header named `name`, ignoring ASCII case
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find_map(|(k, v)| k.eq_ignore_ascii_case(name).then_some(v.as_str()))
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Route binding or middleware annotation
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Capture of a bare `*` route
    pub fn wildcard(&self) -> Option<&str> {
        self.param(gale_router::WILDCARD_KEY)
    }

    /// Decoded query pairs. Later duplicates win; a key without `=` maps to
    /// an empty value.
    pub fn query_params(&self) -> HashMap<String, String> {
        self.query
            .as_deref()
            .unwrap_or_default()
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| {
                let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
                (form_decode(key), form_decode(value))
            })
            .collect()
    }
}

/// Decode one `application/x-www-form-urlencoded` component
fn form_decode(s: &str) -> String {
    percent_decode_str(&s.replace('+', " "))
        .decode_utf8_lossy()
        .into_owned()
}
