//! # agora-store
//!
//! Local durable storage for the Agora client: per-chat preference flags
//! (archived, muted, pinned, favorite), per-chat last-read timestamps, and
//! the global starred/pinned message-id sets.
//!
//! Everything here is purely local. The backend has no knowledge of any of
//! it; if these records ever need to live elsewhere, they must be exported
//! by the client alone. The crate exposes a synchronous `Database` handle
//! that wraps a `rusqlite::Connection` and provides typed helpers for every
//! record kind.

pub mod database;
pub mod message_flags;
pub mod migrations;
pub mod models;
pub mod prefs;

mod error;

pub use database::Database;
pub use error::StoreError;
pub use models::*;
