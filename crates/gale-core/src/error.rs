//! Error types for gale-core

use thiserror::Error;

/// Result type alias for gale operations
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed error produced by application handlers and middlewares
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error types for registration and dispatch
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid pattern or duplicate route
    #[error(transparent)]
    Route(#[from] gale_router::Error),

    /// Route references a handler id nobody registered
    #[error("Unknown handler: {0}")]
    UnknownHandler(String),

    /// Route references a middleware id nobody registered
    #[error("Unknown middleware: {0}")]
    UnknownMiddleware(String),

    /// Method name that is not an HTTP token
    #[error("Invalid HTTP method: {0}")]
    InvalidMethod(String),

    /// Failure raised by a handler
    #[error("Handler error: {0}")]
    Handler(#[source] BoxError),

    /// Failure raised by a middleware
    #[error("Middleware error: {0}")]
    Middleware(#[source] BoxError),

    /// Route manifest could not be parsed
    #[cfg(feature = "config")]
    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    /// Route manifest could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Wrap an application error raised inside a handler
    pub fn handler(err: impl Into<BoxError>) -> Self {
        Error::Handler(err.into())
    }

    /// Wrap an application error raised inside a middleware
    pub fn middleware(err: impl Into<BoxError>) -> Self {
        Error::Middleware(err.into())
    }
}
