//! The outgoing-message pipeline.
//!
//! One draft per chat accumulates text and at most one attachment. A send
//! walks the state machine `Composing -> Submitting -> Confirmed | Failed`:
//! preconditions are checked before anything touches the network, the
//! optimistic entry goes into the cache the moment submission starts, and
//! a failure rolls the entry back while keeping the draft intact so the
//! user can retry without re-typing or re-selecting the file.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::Utc;
use tracing::{debug, warn};

use agora_api::{ChatTransport, SendMessageRequest};
use agora_shared::constants::MAX_ATTACHMENT_SIZE;
use agora_shared::{AttachmentDraft, ChatId, Message, MessageId, UserId};

use crate::cache::MessageCache;
use crate::directory::ChatDirectory;
use crate::error::ClientError;
use crate::mutex::lock;
use crate::Result;

/// Where a chat's most recent send attempt stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendState {
    /// Accumulating text and/or an attachment; nothing in flight.
    Composing,
    /// The mutation is in flight; an optimistic entry is visible.
    Submitting,
    /// The server confirmed the send under this id.
    Confirmed(MessageId),
    /// The send failed; the draft was kept for retry.
    Failed(String),
}

/// What the user has typed and attached for one chat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub text: String,
    pub attachment: Option<AttachmentDraft>,
}

impl Draft {
    /// A draft with no trimmed text and no attachment cannot be sent.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty() && self.attachment.is_none()
    }
}

/// Accepts compose input, runs precondition checks, issues the send
/// mutation, and reconciles the result into the cache and directory.
pub struct SendCoordinator {
    current_user: UserId,
    drafts: Mutex<HashMap<ChatId, Draft>>,
    states: Mutex<HashMap<ChatId, SendState>>,
}

impl SendCoordinator {
    pub fn new(current_user: UserId) -> Self {
        Self {
            current_user,
            drafts: Mutex::new(HashMap::new()),
            states: Mutex::new(HashMap::new()),
        }
    }

    // ------------------------------------------------------------------
    // Composing
    // ------------------------------------------------------------------

    pub fn draft(&self, chat_id: ChatId) -> Draft {
        lock(&self.drafts).get(&chat_id).cloned().unwrap_or_default()
    }

    pub fn set_text(&self, chat_id: ChatId, text: impl Into<String>) {
        lock(&self.drafts).entry(chat_id).or_default().text = text.into();
    }

    pub fn attach(&self, chat_id: ChatId, attachment: AttachmentDraft) {
        lock(&self.drafts).entry(chat_id).or_default().attachment = Some(attachment);
    }

    pub fn clear_attachment(&self, chat_id: ChatId) {
        if let Some(draft) = lock(&self.drafts).get_mut(&chat_id) {
            draft.attachment = None;
        }
    }

    /// The state of the chat's most recent send attempt.
    pub fn state(&self, chat_id: ChatId) -> SendState {
        lock(&self.states)
            .get(&chat_id)
            .cloned()
            .unwrap_or(SendState::Composing)
    }

    fn set_state(&self, chat_id: ChatId, state: SendState) {
        lock(&self.states).insert(chat_id, state);
    }

    // ------------------------------------------------------------------
    // Submission
    // ------------------------------------------------------------------

    /// Check the draft against the send preconditions without touching
    /// any state. Called by [`send`](Self::send) before `Submitting`.
    fn validate(draft: &Draft) -> Result<()> {
        if draft.is_empty() {
            return Err(ClientError::EmptyDraft);
        }
        if let Some(attachment) = &draft.attachment {
            if attachment.size() > MAX_ATTACHMENT_SIZE {
                return Err(ClientError::AttachmentTooLarge {
                    size: attachment.size(),
                    max: MAX_ATTACHMENT_SIZE,
                });
            }
        }
        Ok(())
    }

    /// Send the chat's current draft.
    ///
    /// On success the optimistic entry is replaced by the server's message,
    /// the chat's last-message marker advances, and the draft is cleared.
    /// On failure the optimistic entry is rolled back and the draft kept.
    pub async fn send(
        &self,
        transport: &dyn ChatTransport,
        cache: &MessageCache,
        directory: &ChatDirectory,
        chat_id: ChatId,
    ) -> Result<Message> {
        let draft = self.draft(chat_id);
        Self::validate(&draft)?;

        let trimmed = draft.text.trim();
        let content = (!trimmed.is_empty()).then(|| trimmed.to_string());
        let attachment_url = draft.attachment.as_ref().map(|a| a.to_data_url());

        let optimistic = Message {
            id: MessageId::new(),
            chat_id,
            sender_id: self.current_user,
            content: content.clone(),
            attachment_url: attachment_url.clone(),
            created_at: Utc::now(),
        };
        let local_id = optimistic.id;

        self.set_state(chat_id, SendState::Submitting);
        cache.append_optimistic(optimistic);
        debug!(chat = %chat_id, local = %local_id, "submitting message");

        let request = SendMessageRequest {
            content,
            attachment_url,
        };

        match transport.send_message(chat_id, request).await {
            Ok(confirmed) => {
                cache.confirm(chat_id, local_id, confirmed.clone());
                directory.touch(chat_id, confirmed.created_at, confirmed.preview());
                lock(&self.drafts).remove(&chat_id);
                self.set_state(chat_id, SendState::Confirmed(confirmed.id));
                Ok(confirmed)
            }
            Err(e) => {
                warn!(chat = %chat_id, local = %local_id, error = %e, "send failed, rolling back");
                cache.reject(chat_id, local_id);
                self.set_state(chat_id, SendState::Failed(e.to_string()));
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use uuid::Uuid;

    use super::*;

    #[test]
    fn empty_draft_is_rejected() {
        let draft = Draft {
            text: "   \n".to_string(),
            attachment: None,
        };
        assert!(matches!(
            SendCoordinator::validate(&draft),
            Err(ClientError::EmptyDraft)
        ));
    }

    #[test]
    fn oversized_attachment_is_rejected() {
        let draft = Draft {
            text: String::new(),
            attachment: Some(AttachmentDraft::new(
                Bytes::from(vec![0u8; 11 * 1024 * 1024]),
                "video.mp4",
                "video/mp4",
            )),
        };
        assert!(matches!(
            SendCoordinator::validate(&draft),
            Err(ClientError::AttachmentTooLarge { .. })
        ));
    }

    #[test]
    fn attachment_alone_is_a_valid_payload() {
        let draft = Draft {
            text: String::new(),
            attachment: Some(AttachmentDraft::new(
                Bytes::from_static(b"img"),
                "photo.png",
                "image/png",
            )),
        };
        assert!(SendCoordinator::validate(&draft).is_ok());
    }

    #[test]
    fn draft_edits_accumulate_per_chat() {
        let coordinator = SendCoordinator::new(UserId(Uuid::new_v4()));
        let a = ChatId::new();
        let b = ChatId::new();

        coordinator.set_text(a, "first");
        coordinator.set_text(b, "second");
        coordinator.attach(a, AttachmentDraft::new(Bytes::from_static(b"x"), "x.bin", "application/octet-stream"));

        assert_eq!(coordinator.draft(a).text, "first");
        assert!(coordinator.draft(a).attachment.is_some());
        assert_eq!(coordinator.draft(b).text, "second");
        assert!(coordinator.draft(b).attachment.is_none());

        coordinator.clear_attachment(a);
        assert!(coordinator.draft(a).attachment.is_none());
    }
}
