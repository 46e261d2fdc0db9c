use thiserror::Error;

/// Errors produced by the transport layer.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Connection, timeout, or body-decoding failure from the HTTP stack.
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("Server responded {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    /// The base URL in the configuration could not be parsed.
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),
}
