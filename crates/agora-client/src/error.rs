use thiserror::Error;

use agora_shared::ChatId;

/// Errors surfaced by the sync engine.
///
/// Transient fetch failures never appear here: the poller logs them and
/// leaves state frozen at last-known-good until the next tick. What does
/// appear is everything the embedding UI must show the user -- send
/// failures and compose precondition violations.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The draft has neither text (after trimming) nor an attachment.
    #[error("Nothing to send: add a message or an attachment")]
    EmptyDraft,

    /// The attachment source file exceeds the fixed cap.
    #[error("Attachment too large: {size} bytes (max {max})")]
    AttachmentTooLarge { size: usize, max: usize },

    /// The chat id is not present in the local directory.
    #[error("Unknown chat: {0}")]
    UnknownChat(ChatId),

    /// A chat-list refresh coalesced onto a concurrent request that failed.
    /// The request owner reports the underlying [`ApiError`](agora_api::ApiError).
    #[error("Chat list refresh failed")]
    RefreshFailed,

    /// The backend rejected or failed a mutation.
    #[error(transparent)]
    Api(#[from] agora_api::ApiError),
}
