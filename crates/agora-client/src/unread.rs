//! Unread-count derivation.
//!
//! A chat's unread count is the number of cached messages authored by
//! others and created after the viewer's last-read timestamp for that
//! chat (all of them when the chat was never read). The currently
//! selected chat is always 0: selecting is reading.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use agora_shared::{ChatId, Message, UserId};

/// Count unread messages in one chat's history.
pub fn unread_count(
    messages: &[Message],
    current_user: UserId,
    last_read: Option<DateTime<Utc>>,
) -> usize {
    messages
        .iter()
        .filter(|m| !m.is_from(current_user))
        .filter(|m| match last_read {
            Some(read_at) => m.created_at > read_at,
            None => true,
        })
        .count()
}

/// Unread counts for a set of chats, forcing the selected chat to 0.
///
/// `last_read` is the per-chat last-read lookup; chats without cached
/// messages count 0 (missing data is "no messages", never an error).
pub fn unread_counts(
    chat_ids: &[ChatId],
    histories: &HashMap<ChatId, Vec<Message>>,
    last_read: impl Fn(ChatId) -> Option<DateTime<Utc>>,
    current_user: UserId,
    selected: Option<ChatId>,
) -> HashMap<ChatId, usize> {
    chat_ids
        .iter()
        .map(|&id| {
            let count = if selected == Some(id) {
                0
            } else {
                histories
                    .get(&id)
                    .map(|m| unread_count(m, current_user, last_read(id)))
                    .unwrap_or(0)
            };
            (id, count)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use uuid::Uuid;

    use agora_shared::MessageId;

    use super::*;

    fn message(chat_id: ChatId, sender: UserId, offset_secs: i64) -> Message {
        Message {
            id: MessageId::new(),
            chat_id,
            sender_id: sender,
            content: Some("bonjour".to_string()),
            attachment_url: None,
            created_at: Utc::now() + Duration::seconds(offset_secs),
        }
    }

    #[test]
    fn never_read_counts_all_messages_from_others() {
        let chat = ChatId::new();
        let me = UserId(Uuid::new_v4());
        let other = UserId(Uuid::new_v4());

        let messages = vec![
            message(chat, other, -30),
            message(chat, other, -20),
            message(chat, other, -10),
        ];

        assert_eq!(unread_count(&messages, me, None), 3);
    }

    #[test]
    fn own_messages_never_count() {
        let chat = ChatId::new();
        let me = UserId(Uuid::new_v4());
        let other = UserId(Uuid::new_v4());

        let messages = vec![
            message(chat, me, -30),
            message(chat, other, -20),
            message(chat, me, -10),
        ];

        assert_eq!(unread_count(&messages, me, None), 1);
    }

    #[test]
    fn only_messages_after_last_read_count() {
        let chat = ChatId::new();
        let me = UserId(Uuid::new_v4());
        let other = UserId(Uuid::new_v4());

        let messages = vec![
            message(chat, other, -30),
            message(chat, other, -20),
            message(chat, other, -10),
        ];
        let read_at = Utc::now() - Duration::seconds(15);

        assert_eq!(unread_count(&messages, me, Some(read_at)), 1);
    }

    #[test]
    fn selected_chat_is_forced_to_zero() {
        let chat = ChatId::new();
        let me = UserId(Uuid::new_v4());
        let other = UserId(Uuid::new_v4());

        let mut histories = HashMap::new();
        histories.insert(chat, vec![message(chat, other, -10)]);

        let counts = unread_counts(&[chat], &histories, |_| None, me, Some(chat));
        assert_eq!(counts[&chat], 0);

        let counts = unread_counts(&[chat], &histories, |_| None, me, None);
        assert_eq!(counts[&chat], 1);
    }

    #[test]
    fn missing_history_counts_zero() {
        let chat = ChatId::new();
        let me = UserId(Uuid::new_v4());

        let counts = unread_counts(&[chat], &HashMap::new(), |_| None, me, None);
        assert_eq!(counts[&chat], 0);
    }
}
