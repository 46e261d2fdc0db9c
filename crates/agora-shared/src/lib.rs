//! # agora-shared
//!
//! Domain types shared by every Agora crate: strongly-typed ids, the chat
//! and message models exchanged with the backend, the transient attachment
//! draft, and protocol-wide constants.

pub mod attachment;
pub mod constants;
pub mod models;
pub mod types;

pub use attachment::AttachmentDraft;
pub use models::{Chat, Message};
pub use types::{ChatFilter, ChatId, MessageId, UserId};
