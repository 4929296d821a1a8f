//! Authentication guards
//!
//! Both guards answer 401 themselves when the credential is missing or
//! rejected, so the rest of the chain and the handler never run.

use super::{Middleware, Next};
use crate::{Request, Response, Result};

/// Key under which an authenticated identity is stored in `Request::params`
pub const AUTH_USER_PARAM: &str = "_auth_user";

/// Token of an `Authorization: Bearer <token>` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerToken(pub String);

impl BearerToken {
    /// Scheme is matched case-insensitively; an empty token is no token
    pub fn parse(header: &str) -> Option<Self> {
        let (scheme, token) = header.trim().split_once(' ')?;
        let token = token.trim();
        (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty())
            .then(|| Self(token.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Where a guard looks for its credential
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    Bearer,
    Header(String),
    Query(String),
}

impl CredentialSource {
    pub fn extract(&self, req: &Request) -> Option<String> {
        match self {
            CredentialSource::Bearer => req
                .header("authorization")
                .and_then(BearerToken::parse)
                .map(|token| token.0),
            CredentialSource::Header(name) => req
                .header(name)
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string),
            CredentialSource::Query(name) => req.query_params().remove(name),
        }
    }
}

/// Accepts requests whose bearer token the validator maps to an identity.
///
/// The identity ends up under [`AUTH_USER_PARAM`].
pub struct BearerAuth<F> {
    validator: F,
}

impl<F> BearerAuth<F>
where
    F: Fn(&str) -> Option<String> + Send + Sync,
{
    pub fn new(validator: F) -> Self {
        Self { validator }
    }
}

impl<F> Middleware for BearerAuth<F>
where
    F: Fn(&str) -> Option<String> + Send + Sync,
{
    fn before(&self, req: &mut Request) -> Result<Next> {
        let Some(token) = CredentialSource::Bearer.extract(req) else {
            return Ok(Next::Respond(Response::unauthorized("Bearer")));
        };

        Ok(match (self.validator)(&token) {
            Some(identity) => {
                req.params.insert(AUTH_USER_PARAM.to_string(), identity);
                Next::Continue
            }
            None => Next::Respond(Response::unauthorized(r#"Bearer error="invalid_token""#)),
        })
    }
}

/// Accepts requests carrying a key the validator approves, read from a
/// header or a query parameter
pub struct ApiKeyAuth<F> {
    source: CredentialSource,
    validator: F,
}

impl<F> ApiKeyAuth<F>
where
    F: Fn(&str) -> bool + Send + Sync,
{
    pub fn header(name: impl Into<String>, validator: F) -> Self {
        Self {
            source: CredentialSource::Header(name.into()),
            validator,
        }
    }

    pub fn query(name: impl Into<String>, validator: F) -> Self {
        Self {
            source: CredentialSource::Query(name.into()),
            validator,
        }
    }
}

impl<F> Middleware for ApiKeyAuth<F>
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn before(&self, req: &mut Request) -> Result<Next> {
        match self.source.extract(req) {
            Some(key) if (self.validator)(&key) => Ok(Next::Continue),
            found => {
                tracing::debug!(source = ?self.source, present = found.is_some(), "api key rejected");
                Ok(Next::Respond(Response::unauthorized("ApiKey")))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Method, StatusCode};

    fn tokens(token: &str) -> Option<String> {
        (token == "s3cret").then(|| "alice".to_string())
    }

    fn rejected(guard: &impl Middleware, req: &mut Request) -> Option<Response> {
        match guard.before(req).unwrap() {
            Next::Continue => None,
            Next::Respond(res) => Some(res),
        }
    }

    #[test]
    fn test_bearer_token_parse() {
        assert_eq!(BearerToken::parse("Bearer abc123").unwrap().as_str(), "abc123");
        assert_eq!(BearerToken::parse("bearer  abc123 ").unwrap().as_str(), "abc123");
        assert!(BearerToken::parse("Basic abc123").is_none());
        assert!(BearerToken::parse("Bearer ").is_none());
        assert!(BearerToken::parse("Bearer").is_none());
    }

    #[test]
    fn test_bearer_accepts_valid_token() {
        let auth = BearerAuth::new(tokens);
        let mut req = Request::new(Method::Get, "/")
            .with_header("Authorization", "Bearer s3cret");

        assert!(rejected(&auth, &mut req).is_none());
        assert_eq!(req.param(AUTH_USER_PARAM), Some("alice"));
    }

    #[test]
    fn test_bearer_rejects() {
        let auth = BearerAuth::new(tokens);

        let mut missing = Request::new(Method::Get, "/");
        let res = rejected(&auth, &mut missing).unwrap();
        assert_eq!(res.status, StatusCode::UNAUTHORIZED);
        assert_eq!(res.header("www-authenticate"), Some("Bearer"));

        let mut wrong = Request::new(Method::Get, "/")
            .with_header("Authorization", "Bearer nope");
        let res = rejected(&auth, &mut wrong).unwrap();
        assert_eq!(res.header("www-authenticate"), Some(r#"Bearer error="invalid_token""#));
        assert_eq!(wrong.param(AUTH_USER_PARAM), None);
    }

    #[test]
    fn test_api_key_header_and_query() {
        let by_header = ApiKeyAuth::header("x-api-key", |k: &str| k == "k1");
        let mut req = Request::new(Method::Get, "/").with_header("X-Api-Key", " k1 ");
        assert!(rejected(&by_header, &mut req).is_none());

        let by_query = ApiKeyAuth::query("key", |k: &str| k == "k1");
        let mut ok = Request::new(Method::Get, "/").with_query("key=k1");
        let mut bad = Request::new(Method::Get, "/").with_query("key=k2");
        let mut absent = Request::new(Method::Get, "/");
        assert!(rejected(&by_query, &mut ok).is_none());
        assert_eq!(rejected(&by_query, &mut bad).unwrap().status, StatusCode::UNAUTHORIZED);
        assert!(rejected(&by_query, &mut absent).is_some());
    }
}
