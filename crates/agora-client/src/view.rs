//! The chat-list view composer.
//!
//! A pure function of its inputs: directory snapshot, preference records,
//! unread counts, the active filter tab, and the free-text search term.
//! It owns no state and is safe to call at any frequency.

use std::collections::HashMap;

use serde::Serialize;

use agora_shared::{Chat, ChatFilter, ChatId};
use agora_store::ChatPrefs;

/// One row of the conversation list, ready to hand to a UI layer.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ChatEntry {
    pub chat: Chat,
    pub prefs: ChatPrefs,
    pub unread: usize,
}

/// Build the ordered list a user sees.
///
/// Order of operations: (1) exclude archived chats unless viewing the
/// archived tab, (2) apply the tab's predicate, (3) case-insensitive
/// substring match on display name or id, (4) sort pinned-first, then by
/// last activity descending, then by creation time descending.
pub fn compose(
    chats: &[Chat],
    prefs: &HashMap<ChatId, ChatPrefs>,
    unread: &HashMap<ChatId, usize>,
    filter: ChatFilter,
    search: &str,
) -> Vec<ChatEntry> {
    let needle = search.trim().to_lowercase();

    let mut entries: Vec<ChatEntry> = chats
        .iter()
        .map(|chat| ChatEntry {
            chat: chat.clone(),
            prefs: prefs
                .get(&chat.id)
                .cloned()
                .unwrap_or_else(|| ChatPrefs::default_for(chat.id)),
            unread: unread.get(&chat.id).copied().unwrap_or(0),
        })
        .filter(|entry| entry.prefs.archived == (filter == ChatFilter::Archived))
        .filter(|entry| match filter {
            ChatFilter::All | ChatFilter::Archived => true,
            ChatFilter::Unread => entry.unread > 0,
            ChatFilter::Favorites => entry.prefs.favorite,
            ChatFilter::Groups => entry.chat.is_group,
        })
        .filter(|entry| {
            needle.is_empty()
                || entry.chat.display_name().to_lowercase().contains(&needle)
                || entry.chat.id.to_string().to_lowercase().contains(&needle)
        })
        .collect();

    entries.sort_by(|a, b| {
        b.prefs
            .pinned
            .cmp(&a.prefs.pinned)
            .then_with(|| b.chat.last_message_at.cmp(&a.chat.last_message_at))
            .then_with(|| b.chat.created_at.cmp(&a.chat.created_at))
    });

    entries
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    use agora_shared::UserId;
    use agora_store::PrefsPatch;

    use super::*;

    fn chat(name: &str, last_message_offset: Option<i64>) -> Chat {
        Chat {
            id: ChatId::new(),
            name: Some(name.to_string()),
            is_group: false,
            created_by: UserId(Uuid::nil()),
            created_at: Utc::now() - Duration::hours(1),
            last_message_at: last_message_offset.map(|s| Utc::now() + Duration::seconds(s)),
            last_message_preview: None,
        }
    }

    fn prefs_with(chat_id: ChatId, patch: PrefsPatch) -> ChatPrefs {
        let mut prefs = ChatPrefs::default_for(chat_id);
        patch.apply(&mut prefs);
        prefs
    }

    #[test]
    fn pinned_sort_before_unpinned_regardless_of_activity() {
        let stale_but_pinned = chat("stale", Some(-3600));
        let fresh = chat("fresh", Some(-10));

        let mut prefs = HashMap::new();
        prefs.insert(
            stale_but_pinned.id,
            prefs_with(stale_but_pinned.id, PrefsPatch::pinned(true)),
        );

        let entries = compose(
            &[fresh.clone(), stale_but_pinned.clone()],
            &prefs,
            &HashMap::new(),
            ChatFilter::All,
            "",
        );

        assert_eq!(entries[0].chat.id, stale_but_pinned.id);
        assert_eq!(entries[1].chat.id, fresh.id);
    }

    #[test]
    fn last_activity_orders_within_a_group() {
        let older = chat("older", Some(-300));
        let newer = chat("newer", Some(-30));
        let silent = chat("silent", None);

        let entries = compose(
            &[silent.clone(), older.clone(), newer.clone()],
            &HashMap::new(),
            &HashMap::new(),
            ChatFilter::All,
            "",
        );

        assert_eq!(entries[0].chat.id, newer.id);
        assert_eq!(entries[1].chat.id, older.id);
        assert_eq!(entries[2].chat.id, silent.id);
    }

    #[test]
    fn archived_chats_only_appear_in_the_archived_tab() {
        let active = chat("active", None);
        let archived = chat("archived", None);

        let mut prefs = HashMap::new();
        prefs.insert(
            archived.id,
            prefs_with(archived.id, PrefsPatch::archived(true)),
        );

        let chats = [active.clone(), archived.clone()];

        let all = compose(&chats, &prefs, &HashMap::new(), ChatFilter::All, "");
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].chat.id, active.id);

        let archived_view = compose(&chats, &prefs, &HashMap::new(), ChatFilter::Archived, "");
        assert_eq!(archived_view.len(), 1);
        assert_eq!(archived_view[0].chat.id, archived.id);
    }

    #[test]
    fn unread_tab_keeps_only_chats_with_unread() {
        let read = chat("read", None);
        let unread_chat = chat("unread", None);

        let mut unread = HashMap::new();
        unread.insert(unread_chat.id, 2usize);

        let entries = compose(
            &[read, unread_chat.clone()],
            &HashMap::new(),
            &unread,
            ChatFilter::Unread,
            "",
        );

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].chat.id, unread_chat.id);
    }

    #[test]
    fn search_matches_name_case_insensitively() {
        let promo = chat("Promo 2026", None);
        let staff = chat("Staff room", None);

        let entries = compose(
            &[promo.clone(), staff],
            &HashMap::new(),
            &HashMap::new(),
            ChatFilter::All,
            "pRoMo",
        );

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].chat.id, promo.id);
    }

    #[test]
    fn search_matches_id_for_unnamed_chats() {
        let mut unnamed = chat("", None);
        unnamed.name = None;
        let fragment = unnamed.id.to_string()[..8].to_string();

        let entries = compose(
            &[unnamed.clone()],
            &HashMap::new(),
            &HashMap::new(),
            ChatFilter::All,
            &fragment,
        );

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].chat.id, unnamed.id);
    }
}
