//! Error taxonomy.
//!
//! Load errors are fatal at startup. Select and handler errors are
//! per-request and map onto an HTTP status.

use axum::http::StatusCode;
use std::path::PathBuf;

/// Fatal error raised while building the route table.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// Directory or fixture file could not be read.
    #[error("unable to read in {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Fixture file is not a valid stub document.
    #[error("unable to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Fixture parsed but violates a shape constraint.
    #[error("invalid fixture {}: {reason}", .path.display())]
    Invalid { path: PathBuf, reason: String },

    /// Two fixture files declare the same route.
    #[error(
        "duplicate route {route} in {} (already bound by {})",
        .path.display(),
        .existing.display()
    )]
    DuplicateRoute {
        route: String,
        path: PathBuf,
        existing: PathBuf,
    },
}

/// Reasons the selector refuses a request.
#[derive(Debug, thiserror::Error)]
pub enum SelectError {
    /// No stub declares the live method.
    #[error("method not allowed")]
    MethodNotAllowed,

    /// The live body is not valid JSON.
    #[error("malformed request body: {0}")]
    MalformedBody(#[source] serde_json::Error),

    /// A payload-carrying stub was declared for a method that carries neither body nor query.
    #[error("invalid request")]
    UnsupportedMethod,

    /// Every candidate was scanned without a match.
    #[error("invalid request")]
    NoMatch,

    /// A stub payload could not be re-encoded for comparison.
    #[error("unable to encode stub payload: {0}")]
    Encode(#[source] serde_json::Error),
}

impl SelectError {
    /// Status code reported to the client.
    pub fn status(&self) -> StatusCode {
        match self {
            SelectError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            SelectError::MalformedBody(_)
            | SelectError::UnsupportedMethod
            | SelectError::NoMatch => StatusCode::BAD_REQUEST,
            SelectError::Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Per-request failures that are the server's fault.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("unable to read fixture {}: {source}", .path.display())]
    Fixture {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to parse fixture {}: {source}", .path.display())]
    FixtureParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unable to convert results to JSON: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("unable to read request body: {0}")]
    Body(String),
}

impl HandlerError {
    pub fn status(&self) -> StatusCode {
        match self {
            HandlerError::Body(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
