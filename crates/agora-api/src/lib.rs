//! # agora-api
//!
//! HTTP transport for the Agora backend. The backend is an opaque REST
//! collaborator: five JSON endpoints under an authenticated base path, no
//! push channel. [`ApiClient`] is the production implementation;
//! [`ChatTransport`] is the seam the sync engine is written against, so
//! tests can drive it with an in-memory fake instead of a live server.

pub mod client;
pub mod dto;
pub mod transport;

mod error;

pub use client::ApiClient;
pub use dto::{CreateChatRequest, SendMessageRequest};
pub use error::ApiError;
pub use transport::ChatTransport;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ApiError>;
