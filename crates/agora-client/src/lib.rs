//! # agora-client
//!
//! The conversation synchronization engine behind the Agora chat feature.
//!
//! [`ChatEngine`] keeps a locally-held view of the user's conversations
//! consistent under periodic background refresh: it polls the backend for
//! chats and messages, derives unread counts from timestamps, coordinates
//! optimistic sends against eventually-consistent server data, and merges
//! server-authoritative state with durable local preferences (archived /
//! muted / pinned / favorite chats, last-read timestamps, starred and
//! pinned messages).
//!
//! There is no push channel; freshness is capped at the poll interval.

pub mod cache;
pub mod config;
pub mod directory;
pub mod engine;
pub mod prefs;
pub mod send;
pub mod unread;
pub mod view;

mod error;
mod mutex;

pub use cache::MessageCache;
pub use config::ClientConfig;
pub use directory::ChatDirectory;
pub use engine::ChatEngine;
pub use error::ClientError;
pub use prefs::PreferenceStore;
pub use send::{Draft, SendCoordinator, SendState};
pub use view::{compose, ChatEntry};

use tracing_subscriber::{fmt, EnvFilter};

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Install the default tracing subscriber for an embedding application.
///
/// Honors `RUST_LOG`; falls back to a sensible per-crate filter.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("agora_client=debug,agora_api=debug,agora_store=info,warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}
