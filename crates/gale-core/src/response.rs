//! Responses produced by handlers, short-circuiting middlewares and the
//! fallback.

use bytes::Bytes;
use smallvec::SmallVec;

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

macro_rules! status_codes {
    ($($name:ident = $code:literal, $reason:literal;)+) => {
        impl StatusCode {
            $(pub const $name: StatusCode = StatusCode($code);)+

            /// Canonical reason phrase, `"Unknown"` for codes not listed here
            pub fn reason_phrase(self) -> &'static str {
                match self.0 {
                    $($code => $reason,)+
                    _ => "Unknown",
                }
            }
        }
    };
}

/// HTTP status code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusCode(pub u16);

status_codes! {
    OK = 200, "OK";
    CREATED = 201, "Created";
    NO_CONTENT = 204, "No Content";
    BAD_REQUEST = 400, "Bad Request";
    UNAUTHORIZED = 401, "Unauthorized";
    FORBIDDEN = 403, "Forbidden";
    NOT_FOUND = 404, "Not Found";
    METHOD_NOT_ALLOWED = 405, "Method Not Allowed";
    CONFLICT = 409, "Conflict";
    TOO_MANY_REQUESTS = 429, "Too Many Requests";
    INTERNAL_SERVER_ERROR = 500, "Internal Server Error";
    SERVICE_UNAVAILABLE = 503, "Service Unavailable";
}

impl StatusCode {
    pub fn as_u16(self) -> u16 {
        self.0
    }

    /// 2xx
    pub fn is_success(self) -> bool {
        self.0 / 100 == 2
    }

    /// 4xx or 5xx
    pub fn is_error(self) -> bool {
        matches!(self.0 / 100, 4 | 5)
    }
}

impl From<u16> for StatusCode {
    fn from(code: u16) -> Self {
        StatusCode(code)
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.0, self.reason_phrase())
    }
}

/// HTTP response
///
/// Constructors chain by value:
/// ```
/// use gale_core::{Response, StatusCode};
///
/// let res = Response::new(StatusCode::CREATED)
///     .with_header("location", "/users/7")
///     .with_body("created");
/// assert_eq!(res.header("Location"), Some("/users/7"));
/// ```
#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    pub headers: SmallVec<[(String, String); 8]>,
    pub body: Bytes,
}

impl Response {
    /// Empty response with `status`
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: SmallVec::new(),
            body: Bytes::new(),
        }
    }

    pub fn ok() -> Self {
        Self::new(StatusCode::OK)
    }

    pub fn json(body: impl Into<Bytes>) -> Self {
        Self::ok()
            .with_header("content-type", "application/json")
            .with_body(body)
    }

    pub fn text(body: impl Into<Bytes>) -> Self {
        Self::ok().with_header("content-type", TEXT_PLAIN).with_body(body)
    }

    /// Plain-text response whose body is the status reason phrase
    pub fn status_page(status: StatusCode) -> Self {
        Self::new(status)
            .with_header("content-type", TEXT_PLAIN)
            .with_body(status.reason_phrase())
    }

    /// The default fallback answer
    pub fn not_found() -> Self {
        Self::status_page(StatusCode::NOT_FOUND)
    }

    /// 405 carrying an `Allow` header with `allowed` joined by `", "`
    pub fn method_not_allowed(allowed: &[String]) -> Self {
        Self::status_page(StatusCode::METHOD_NOT_ALLOWED).with_header("allow", allowed.join(", "))
    }

    /// 401 carrying `challenge` as `WWW-Authenticate`
    pub fn unauthorized(challenge: &str) -> Self {
        Self::status_page(StatusCode::UNAUTHORIZED).with_header("www-authenticate", challenge)
    }

    /// Append a header
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Drop the body, keeping status and headers
    pub fn without_body(self) -> Self {
        self.with_body(Bytes::new())
    }

    /// First header named `name`, ignoring ASCII case
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find_map(|(k, v)| k.eq_ignore_ascii_case(name).then_some(v.as_str()))
    }

    /// Replace every header named `name` with a single value
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Body as text, `None` if it is not UTF-8
    pub fn body_string(&self) -> Option<String> {
        String::from_utf8(self.body.to_vec()).ok()
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code() {
        assert!(StatusCode::NO_CONTENT.is_success());
        assert!(StatusCode::NOT_FOUND.is_error());
        assert!(StatusCode::SERVICE_UNAVAILABLE.is_error());
        assert!(!StatusCode::OK.is_error());
        assert_eq!(StatusCode::METHOD_NOT_ALLOWED.to_string(), "405 Method Not Allowed");
        assert_eq!(StatusCode::from(418).reason_phrase(), "Unknown");
    }

    #[test]
    fn test_response_json() {
        let res = Response::json(r#"{"foo":"bar"}"#);
        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.content_type(), Some("application/json"));
    }

    #[test]
    fn test_set_header_replaces() {
        let mut res = Response::text("hi").with_header("x-request-id", "a");
        res.set_header("X-Request-ID", "b");
        assert_eq!(res.header("x-request-id"), Some("b"));
        assert_eq!(res.headers.len(), 2);
    }

    #[test]
    fn test_status_pages() {
        let res = Response::not_found();
        assert_eq!(res.status, StatusCode::NOT_FOUND);
        assert_eq!(res.body_string().as_deref(), Some("Not Found"));

        let res = Response::method_not_allowed(&["GET".to_string(), "POST".to_string()]);
        assert_eq!(res.status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(res.header("Allow"), Some("GET, POST"));

        let res = Response::unauthorized("Bearer");
        assert_eq!(res.header("WWW-Authenticate"), Some("Bearer"));
    }

    #[test]
    fn test_without_body_keeps_headers() {
        let res = Response::text("hello").without_body();
        assert!(res.body.is_empty());
        assert_eq!(res.content_type(), Some(TEXT_PLAIN));
    }
}
