//! Per-chat, lazily-fetched, chronologically ordered message lists.
//!
//! Server fetches *merge* into the existing list rather than replacing it.
//! The merge is a union on message identity, which is what lets an
//! optimistic, not-yet-confirmed message survive a background refresh that
//! raced it: the refresh result does not contain the optimistic entry, and
//! a plain replace would clobber it.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use futures::future::join_all;
use tracing::warn;

use agora_api::ChatTransport;
use agora_shared::constants::ECHO_MATCH_WINDOW_SECS;
use agora_shared::{ChatId, Message, MessageId};

use crate::mutex::lock;
use crate::Result;

#[derive(Default)]
struct ChatHistory {
    /// Sorted by `created_at`; ties keep arrival order (stable sort).
    messages: Vec<Message>,
    /// Ids of optimistic entries awaiting server confirmation.
    pending: HashSet<MessageId>,
}

/// The engine's message store, keyed by chat.
pub struct MessageCache {
    histories: Mutex<HashMap<ChatId, ChatHistory>>,
}

impl MessageCache {
    pub fn new() -> Self {
        Self {
            histories: Mutex::new(HashMap::new()),
        }
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// The chat's messages in chronological order. Empty when never
    /// fetched (or when every fetch so far has failed).
    pub fn messages(&self, chat_id: ChatId) -> Vec<Message> {
        lock(&self.histories)
            .get(&chat_id)
            .map(|h| h.messages.clone())
            .unwrap_or_default()
    }

    /// Snapshot of every chat's messages, for unread aggregation.
    pub fn snapshot(&self) -> HashMap<ChatId, Vec<Message>> {
        lock(&self.histories)
            .iter()
            .map(|(id, h)| (*id, h.messages.clone()))
            .collect()
    }

    // ------------------------------------------------------------------
    // Fetch & merge
    // ------------------------------------------------------------------

    /// Fetch a chat's messages from the server and merge them in.
    /// Returns the post-merge history.
    pub async fn fetch(
        &self,
        transport: &dyn ChatTransport,
        chat_id: ChatId,
    ) -> Result<Vec<Message>> {
        let incoming = transport.list_messages(chat_id).await?;
        self.merge(chat_id, incoming);
        Ok(self.messages(chat_id))
    }

    /// Fan out independent fetches for many chats, e.g. to compute unread
    /// counts across conversations the user is not viewing.
    ///
    /// Partial failure is isolated: a chat whose fetch fails keeps (or
    /// starts with) an empty history and the batch continues. Returns the
    /// ids whose fetch succeeded, so callers can tell a fresh history from
    /// a stale one.
    pub async fn fetch_all(
        &self,
        transport: &dyn ChatTransport,
        chat_ids: &[ChatId],
    ) -> HashSet<ChatId> {
        let fetches = chat_ids.iter().map(|&id| async move {
            (id, transport.list_messages(id).await)
        });

        let mut fetched = HashSet::new();
        for (id, result) in join_all(fetches).await {
            match result {
                Ok(incoming) => {
                    self.merge(id, incoming);
                    fetched.insert(id);
                }
                Err(e) => {
                    warn!(chat = %id, error = %e, "message fetch failed, keeping last-known state");
                    self.ensure(id);
                }
            }
        }
        fetched
    }

    /// Union-merge a server result into the chat's history.
    ///
    /// Per message: a known id is replaced in place (the later response
    /// wins on content); an unknown message that looks like the echo of a
    /// pending optimistic entry replaces that entry; anything else is
    /// appended. The list is then re-sorted (stable) by `created_at`.
    pub fn merge(&self, chat_id: ChatId, incoming: Vec<Message>) {
        let mut histories = lock(&self.histories);
        let history = histories.entry(chat_id).or_default();

        for message in incoming {
            if let Some(existing) = history.messages.iter_mut().find(|m| m.id == message.id) {
                *existing = message;
                continue;
            }

            let echo_of = history
                .messages
                .iter()
                .position(|m| history.pending.contains(&m.id) && is_echo(m, &message));
            match echo_of {
                Some(index) => {
                    let optimistic = history.messages[index].id;
                    history.pending.remove(&optimistic);
                    history.messages[index] = message;
                }
                None => history.messages.push(message),
            }
        }

        history.messages.sort_by_key(|m| m.created_at);
    }

    /// Make sure a chat has an entry, defaulting to empty history.
    fn ensure(&self, chat_id: ChatId) {
        lock(&self.histories).entry(chat_id).or_default();
    }

    // ------------------------------------------------------------------
    // Optimistic entries
    // ------------------------------------------------------------------

    /// Append an optimistic message so the sender sees it immediately.
    pub fn append_optimistic(&self, message: Message) {
        let mut histories = lock(&self.histories);
        let history = histories.entry(message.chat_id).or_default();
        history.pending.insert(message.id);
        history.messages.push(message);
        history.messages.sort_by_key(|m| m.created_at);
    }

    /// Replace an optimistic entry with its confirmed server counterpart.
    ///
    /// Falls back to a plain merge when a background refresh already
    /// reconciled the optimistic entry away.
    pub fn confirm(&self, chat_id: ChatId, local_id: MessageId, confirmed: Message) {
        {
            let mut histories = lock(&self.histories);
            let history = histories.entry(chat_id).or_default();
            history.pending.remove(&local_id);

            if let Some(index) = history.messages.iter().position(|m| m.id == local_id) {
                history.messages[index] = confirmed;
                history.messages.sort_by_key(|m| m.created_at);
                return;
            }
        }
        self.merge(chat_id, vec![confirmed]);
    }

    /// Roll back an optimistic entry after a failed send.
    pub fn reject(&self, chat_id: ChatId, local_id: MessageId) {
        let mut histories = lock(&self.histories);
        if let Some(history) = histories.get_mut(&chat_id) {
            history.pending.remove(&local_id);
            history.messages.retain(|m| m.id != local_id);
        }
    }

    /// Drop a chat's history entirely (chat deleted).
    pub fn remove(&self, chat_id: ChatId) {
        lock(&self.histories).remove(&chat_id);
    }
}

impl Default for MessageCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Best-effort identity for a server message that did not echo our client
/// id: same author, same body, timestamps within a fixed window.
fn is_echo(optimistic: &Message, candidate: &Message) -> bool {
    optimistic.sender_id == candidate.sender_id
        && optimistic.content == candidate.content
        && (optimistic.created_at - candidate.created_at)
            .num_seconds()
            .abs()
            <= ECHO_MATCH_WINDOW_SECS
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    use agora_shared::UserId;

    use super::*;

    fn user() -> UserId {
        UserId(Uuid::new_v4())
    }

    fn message(chat_id: ChatId, sender: UserId, text: &str, offset_secs: i64) -> Message {
        Message {
            id: MessageId::new(),
            chat_id,
            sender_id: sender,
            content: Some(text.to_string()),
            attachment_url: None,
            created_at: Utc::now() + Duration::seconds(offset_secs),
        }
    }

    #[test]
    fn merge_is_a_union_by_id() {
        let cache = MessageCache::new();
        let chat = ChatId::new();
        let sender = user();

        let first = message(chat, sender, "one", -20);
        let second = message(chat, sender, "two", -10);
        cache.merge(chat, vec![first.clone()]);
        cache.merge(chat, vec![first.clone(), second.clone()]);

        let messages = cache.messages(chat);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].id, first.id);
        assert_eq!(messages[1].id, second.id);
    }

    #[test]
    fn later_response_wins_on_content() {
        let cache = MessageCache::new();
        let chat = ChatId::new();
        let sender = user();

        let mut msg = message(chat, sender, "draft", -5);
        cache.merge(chat, vec![msg.clone()]);

        msg.content = Some("edited".to_string());
        cache.merge(chat, vec![msg.clone()]);

        let messages = cache.messages(chat);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content.as_deref(), Some("edited"));
    }

    #[test]
    fn optimistic_entry_survives_refresh_without_it() {
        let cache = MessageCache::new();
        let chat = ChatId::new();
        let sender = user();

        let optimistic = message(chat, sender, "on its way", 0);
        cache.append_optimistic(optimistic.clone());

        // Background refresh raced the send: result predates the send.
        let old = message(chat, user(), "earlier", -60);
        cache.merge(chat, vec![old]);

        let messages = cache.messages(chat);
        assert_eq!(messages.len(), 2);
        assert!(messages.iter().any(|m| m.id == optimistic.id));
    }

    #[test]
    fn refresh_echo_replaces_optimistic_without_duplicate() {
        let cache = MessageCache::new();
        let chat = ChatId::new();
        let sender = user();

        let optimistic = message(chat, sender, "hello", 0);
        cache.append_optimistic(optimistic.clone());

        // The server assigned its own id; content and timestamp match.
        let mut echo = message(chat, sender, "hello", 1);
        echo.created_at = optimistic.created_at + Duration::seconds(1);
        cache.merge(chat, vec![echo.clone()]);

        let messages = cache.messages(chat);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].id, echo.id);
    }

    #[test]
    fn confirm_replaces_in_place() {
        let cache = MessageCache::new();
        let chat = ChatId::new();
        let sender = user();

        let optimistic = message(chat, sender, "sending", 0);
        cache.append_optimistic(optimistic.clone());

        let confirmed = message(chat, sender, "sending", 0);
        cache.confirm(chat, optimistic.id, confirmed.clone());

        let messages = cache.messages(chat);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].id, confirmed.id);
    }

    #[test]
    fn reject_rolls_back_optimistic() {
        let cache = MessageCache::new();
        let chat = ChatId::new();
        let sender = user();

        let kept = message(chat, user(), "kept", -10);
        cache.merge(chat, vec![kept]);

        let optimistic = message(chat, sender, "failed", 0);
        cache.append_optimistic(optimistic.clone());
        cache.reject(chat, optimistic.id);

        let messages = cache.messages(chat);
        assert_eq!(messages.len(), 1);
        assert!(messages.iter().all(|m| m.id != optimistic.id));
    }

    #[test]
    fn messages_stay_chronological() {
        let cache = MessageCache::new();
        let chat = ChatId::new();
        let sender = user();

        let late = message(chat, sender, "late", 10);
        let early = message(chat, sender, "early", -10);
        cache.merge(chat, vec![late.clone(), early.clone()]);

        let messages = cache.messages(chat);
        assert_eq!(messages[0].id, early.id);
        assert_eq!(messages[1].id, late.id);
    }
}
