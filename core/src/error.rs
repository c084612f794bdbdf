//! Error types for the todo API client.
//!
//! # Design
//! `NotFound` and `BadRequest` get dedicated variants because callers branch
//! on them: the server answers 400 with an `errorKey` (`idexists`,
//! `idnotfound`, ...) naming the rule that was violated. Every other non-2xx
//! response lands in `HttpError` with the raw status code and body.

use thiserror::Error;

/// Errors returned by `TodoClient` build and parse methods.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server returned 404; the requested todo does not exist.
    #[error("resource not found")]
    NotFound,

    /// The server rejected the request with 400.
    #[error("bad request ({}): {body}", error_key.as_deref().unwrap_or("no error key"))]
    BadRequest {
        error_key: Option<String>,
        body: String,
    },

    /// The server returned a non-2xx status other than 400 or 404.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// An update was requested for a todo that carries no id.
    #[error("todo has no id")]
    MissingId,
}
