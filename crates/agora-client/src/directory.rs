//! The poll-refreshed list of conversations the user participates in.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::debug;

use agora_api::ChatTransport;
use agora_shared::{Chat, ChatId};

use crate::error::ClientError;
use crate::mutex::lock;
use crate::Result;

/// Local mirror of the server's chat list, keyed by id.
///
/// Refreshed by the poll timer and by on-demand triggers (chat created,
/// message sent). A refresh already in flight is never duplicated: later
/// callers subscribe to the outstanding request and share its outcome.
pub struct ChatDirectory {
    chats: Mutex<HashMap<ChatId, Chat>>,
    in_flight: Mutex<Option<watch::Receiver<Option<bool>>>>,
}

enum RefreshRole {
    Leader(watch::Sender<Option<bool>>),
    Follower(watch::Receiver<Option<bool>>),
}

impl ChatDirectory {
    pub fn new() -> Self {
        Self {
            chats: Mutex::new(HashMap::new()),
            in_flight: Mutex::new(None),
        }
    }

    // ------------------------------------------------------------------
    // Refresh
    // ------------------------------------------------------------------

    /// Re-fetch the chat list and apply it.
    ///
    /// Idempotent and coalesced: concurrent callers share one request.
    /// `keep` names the currently selected chat, which is retained even if
    /// the server snapshot no longer contains it, so the open conversation
    /// does not vanish mid-read. Any other missing chat is dropped.
    pub async fn refresh(&self, transport: &dyn ChatTransport, keep: Option<ChatId>) -> Result<()> {
        let role = {
            let mut guard = lock(&self.in_flight);
            match &*guard {
                Some(rx) => RefreshRole::Follower(rx.clone()),
                None => {
                    let (tx, rx) = watch::channel(None);
                    *guard = Some(rx);
                    RefreshRole::Leader(tx)
                }
            }
        };

        match role {
            RefreshRole::Follower(mut rx) => {
                // The leader publishes its outcome (or drops the sender)
                // when done. A missing outcome means the leader never
                // finished; report failure either way.
                let _ = rx.changed().await;
                let succeeded = *rx.borrow();
                match succeeded {
                    Some(true) => Ok(()),
                    _ => Err(ClientError::RefreshFailed),
                }
            }
            RefreshRole::Leader(tx) => {
                let result = transport.list_chats().await;
                lock(&self.in_flight).take();

                let outcome = match result {
                    Ok(snapshot) => {
                        self.apply_snapshot(snapshot, keep);
                        Ok(())
                    }
                    Err(e) => Err(e.into()),
                };
                let _ = tx.send(Some(outcome.is_ok()));
                outcome
            }
        }
    }

    /// Replace the local set with a server snapshot, by id.
    fn apply_snapshot(&self, snapshot: Vec<Chat>, keep: Option<ChatId>) {
        let mut chats = lock(&self.chats);

        let mut next: HashMap<ChatId, Chat> =
            snapshot.into_iter().map(|c| (c.id, c)).collect();

        if let Some(selected) = keep {
            if !next.contains_key(&selected) {
                if let Some(existing) = chats.get(&selected) {
                    debug!(chat = %selected, "selected chat missing from snapshot, retained");
                    next.insert(selected, existing.clone());
                }
            }
        }

        *chats = next;
    }

    // ------------------------------------------------------------------
    // Local reads and writes
    // ------------------------------------------------------------------

    pub fn get(&self, id: ChatId) -> Option<Chat> {
        lock(&self.chats).get(&id).cloned()
    }

    pub fn contains(&self, id: ChatId) -> bool {
        lock(&self.chats).contains_key(&id)
    }

    pub fn chat_ids(&self) -> Vec<ChatId> {
        lock(&self.chats).keys().copied().collect()
    }

    pub fn snapshot(&self) -> Vec<Chat> {
        lock(&self.chats).values().cloned().collect()
    }

    /// Insert or replace a chat, e.g. right after `POST /chats` returns.
    pub fn upsert(&self, chat: Chat) {
        lock(&self.chats).insert(chat.id, chat);
    }

    /// Drop a chat locally. Returns `true` if it was present.
    pub fn remove(&self, id: ChatId) -> bool {
        lock(&self.chats).remove(&id).is_some()
    }

    /// Advance a chat's last-message marker after a confirmed send. Older
    /// timestamps are ignored so concurrent confirmations cannot move the
    /// marker backwards.
    pub fn touch(&self, id: ChatId, at: DateTime<Utc>, preview: String) {
        let mut chats = lock(&self.chats);
        if let Some(chat) = chats.get_mut(&id) {
            if chat.last_message_at.map_or(true, |prev| prev < at) {
                chat.last_message_at = Some(at);
                chat.last_message_preview = Some(preview);
            }
        }
    }
}

impl Default for ChatDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use uuid::Uuid;

    use agora_api::{CreateChatRequest, SendMessageRequest};
    use agora_shared::{Message, UserId};

    use super::*;

    fn chat(id: ChatId) -> Chat {
        Chat {
            id,
            name: Some("test".into()),
            is_group: false,
            created_by: UserId(Uuid::nil()),
            created_at: Utc::now(),
            last_message_at: None,
            last_message_preview: None,
        }
    }

    /// Counts `list_chats` calls and delays each one so concurrent
    /// refreshes can overlap.
    struct SlowTransport {
        chats: Vec<Chat>,
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl ChatTransport for SlowTransport {
        async fn list_chats(&self) -> agora_api::Result<Vec<Chat>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            if self.fail {
                return Err(agora_api::ApiError::Status {
                    status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                    body: "backend unavailable".to_string(),
                });
            }
            Ok(self.chats.clone())
        }

        async fn create_chat(&self, _req: CreateChatRequest) -> agora_api::Result<Chat> {
            unimplemented!()
        }

        async fn list_messages(&self, _chat_id: ChatId) -> agora_api::Result<Vec<Message>> {
            unimplemented!()
        }

        async fn send_message(
            &self,
            _chat_id: ChatId,
            _req: SendMessageRequest,
        ) -> agora_api::Result<Message> {
            unimplemented!()
        }

        async fn delete_chat(&self, _chat_id: ChatId) -> agora_api::Result<()> {
            unimplemented!()
        }
    }

    #[tokio::test]
    async fn concurrent_refreshes_share_one_request() {
        let a = ChatId::new();
        let transport = SlowTransport {
            chats: vec![chat(a)],
            calls: AtomicUsize::new(0),
            fail: false,
        };
        let directory = ChatDirectory::new();

        let (r1, r2) = tokio::join!(
            directory.refresh(&transport, None),
            directory.refresh(&transport, None),
        );
        r1.unwrap();
        r2.unwrap();

        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
        assert!(directory.contains(a));
    }

    #[tokio::test]
    async fn followers_observe_the_shared_requests_failure() {
        let transport = SlowTransport {
            chats: Vec::new(),
            calls: AtomicUsize::new(0),
            fail: true,
        };
        let directory = ChatDirectory::new();

        let (r1, r2) = tokio::join!(
            directory.refresh(&transport, None),
            directory.refresh(&transport, None),
        );

        assert!(r1.is_err());
        assert!(r2.is_err());
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn snapshot_drops_missing_chats_except_selected() {
        let directory = ChatDirectory::new();
        let a = ChatId::new();
        let b = ChatId::new();
        directory.upsert(chat(a));
        directory.upsert(chat(b));

        // b disappears from the server set while selected: retained.
        directory.apply_snapshot(vec![chat(a)], Some(b));
        assert!(directory.contains(a));
        assert!(directory.contains(b));

        // b disappears while not selected: dropped.
        directory.apply_snapshot(vec![chat(a)], None);
        assert!(directory.contains(a));
        assert!(!directory.contains(b));
    }

    #[test]
    fn touch_never_moves_marker_backwards() {
        let directory = ChatDirectory::new();
        let a = ChatId::new();
        directory.upsert(chat(a));

        let newer = Utc::now();
        let older = newer - chrono::Duration::seconds(60);

        directory.touch(a, newer, "new".into());
        directory.touch(a, older, "old".into());

        let stored = directory.get(a).unwrap();
        assert_eq!(stored.last_message_at, Some(newer));
        assert_eq!(stored.last_message_preview.as_deref(), Some("new"));
    }
}
