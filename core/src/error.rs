//! Error types for the Pwinty API client.
//!
//! # Design
//! `NotFound` gets a dedicated variant because callers frequently distinguish
//! "the order does not exist" from "the server returned an unexpected
//! status." All other non-2xx responses land in `HttpError` with the raw
//! status code and body for debugging.
//!
//! Domain-level validation failures are not errors: the service reports them
//! inside a successfully decoded `Order` or `Photo` (`is_valid`,
//! `general_errors`, `errors`, `warnings`).

use thiserror::Error;

/// Errors returned by `PwintyClient` operations and `parse_*` methods.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The HTTP round trip itself failed (connection, TLS, timeout, body read).
    #[error("transport failed: {0}")]
    Transport(String),

    /// The server returned 404 for the requested order.
    #[error("resource not found")]
    NotFound,

    /// The server returned a non-2xx status other than 404.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(#[from] serde_json::Error),

    /// An argument was rejected before any request was sent.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
