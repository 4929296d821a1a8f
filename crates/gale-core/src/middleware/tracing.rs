//! Request ids and access logging
//!
//! [`Tracing`] gives every request an id, reusing the caller's when it looks
//! sane, echoes it back on the response and can emit one access-log event per
//! request through the `tracing` facade.

use super::{Middleware, Next};
use crate::{Request, Response, Result};
use std::sync::atomic::{AtomicU64, Ordering};

/// Key under which the request id is stored in `Request::params`
pub const REQUEST_ID_PARAM: &str = "_request_id";

/// Incoming ids longer than this are replaced
const MAX_INCOMING_ID_LEN: usize = 128;

static COUNTER: AtomicU64 = AtomicU64::new(0);

/// Where fresh request ids come from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IdGenerator {
    /// Random UUID v4
    Uuid,
    /// Process-wide counter, 16 hex digits
    Counter,
}

impl IdGenerator {
    pub fn generate(self) -> String {
        match self {
            IdGenerator::Uuid => uuid::Uuid::new_v4().to_string(),
            IdGenerator::Counter => format!("{:016x}", COUNTER.fetch_add(1, Ordering::Relaxed)),
        }
    }
}

#[derive(Clone, Debug)]
pub struct TracingConfig {
    /// Header read from the request and written to the response
    pub header_name: String,
    /// `None` only propagates incoming ids
    pub id_generator: Option<IdGenerator>,
    /// Emit one event per request once the response is known
    pub access_log: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            header_name: "X-Request-ID".to_string(),
            id_generator: Some(IdGenerator::Uuid),
            access_log: false,
        }
    }
}

impl TracingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header_name(mut self, name: impl Into<String>) -> Self {
        self.header_name = name.into();
        self
    }

    pub fn id_generator(mut self, generator: Option<IdGenerator>) -> Self {
        self.id_generator = generator;
        self
    }

    pub fn access_log(mut self) -> Self {
        self.access_log = true;
        self
    }
}

/// Request id and access-log middleware
#[derive(Default)]
pub struct Tracing {
    config: TracingConfig,
}

impl Tracing {
    pub fn new(config: TracingConfig) -> Self {
        Self { config }
    }

    fn incoming_id<'r>(&self, req: &'r Request) -> Option<&'r str> {
        req.header(&self.config.header_name)
            .map(str::trim)
            .filter(|id| is_valid_id(id))
    }
}

fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_INCOMING_ID_LEN
        && id.bytes().all(|b| b.is_ascii_graphic())
}

impl Middleware for Tracing {
    fn before(&self, req: &mut Request) -> Result<Next> {
        let id = match self.incoming_id(req) {
            Some(id) => Some(id.to_string()),
            None => self.config.id_generator.map(IdGenerator::generate),
        };
        if let Some(id) = id {
            req.params.insert(REQUEST_ID_PARAM.to_string(), id);
        }
        Ok(Next::Continue)
    }

    fn after(&self, req: &Request, res: &mut Response) -> Result<()> {
        let id = req.param(REQUEST_ID_PARAM);
        if let Some(id) = id {
            res.set_header(self.config.header_name.as_str(), id);
        }

        if self.config.access_log {
            let elapsed_ms = req.received_at.elapsed().as_secs_f64() * 1000.0;
            let id = id.unwrap_or("-");
            let status = res.status.as_u16();
            if res.status.is_error() {
                tracing::warn!(request_id = id, method = %req.method, path = %req.path, status, elapsed_ms, "request failed");
            } else {
                tracing::info!(request_id = id, method = %req.method, path = %req.path, status, elapsed_ms, "request served");
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Method, StatusCode};

    fn traced(tracing: &Tracing, mut req: Request, status: StatusCode) -> (Request, Response) {
        assert!(matches!(tracing.before(&mut req).unwrap(), Next::Continue));
        let mut res = Response::new(status);
        tracing.after(&req, &mut res).unwrap();
        (req, res)
    }

    #[test]
    fn test_generators() {
        let uuid = IdGenerator::Uuid.generate();
        assert_eq!(uuid.len(), 36);
        assert_eq!(uuid.matches('-').count(), 4);

        let a = IdGenerator::Counter.generate();
        let b = IdGenerator::Counter.generate();
        assert_ne!(a, b);
        assert_eq!(a.len(), 16);
    }

    #[test]
    fn test_generates_and_echoes_id() {
        let tracing = Tracing::new(TracingConfig::new().access_log());
        let (req, res) = traced(&tracing, Request::new(Method::Get, "/"), StatusCode::OK);

        let id = req.param(REQUEST_ID_PARAM).unwrap();
        assert_eq!(id.len(), 36);
        assert_eq!(res.header("x-request-id"), Some(id));
    }

    #[test]
    fn test_keeps_incoming_id() {
        let tracing = Tracing::new(TracingConfig::new().header_name("X-Trace"));
        let req = Request::new(Method::Get, "/")
            .with_header("x-trace", " abc123 ");

        let (req, res) = traced(&tracing, req, StatusCode::NOT_FOUND);
        assert_eq!(req.param(REQUEST_ID_PARAM), Some("abc123"));
        assert_eq!(res.header("X-Trace"), Some("abc123"));
    }

    #[test]
    fn test_replaces_malformed_incoming_id() {
        let tracing = Tracing::new(TracingConfig::new().id_generator(Some(IdGenerator::Counter)));
        let too_long = "x".repeat(MAX_INCOMING_ID_LEN + 1);
        for bad in ["", "has space", too_long.as_str()] {
            let req = Request::new(Method::Get, "/").with_header("X-Request-ID", bad);
            let (req, _) = traced(&tracing, req, StatusCode::OK);
            assert_eq!(req.param(REQUEST_ID_PARAM).map(str::len), Some(16));
        }
    }

    #[test]
    fn test_propagate_only() {
        let tracing = Tracing::new(TracingConfig::new().id_generator(None).access_log());
        let (req, res) = traced(&tracing, Request::new(Method::Get, "/"), StatusCode::INTERNAL_SERVER_ERROR);

        assert_eq!(req.param(REQUEST_ID_PARAM), None);
        assert!(res.header("x-request-id").is_none());
    }
}
