//! The conversation engine: wiring, selection, and the polling loop.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use agora_api::{ApiClient, ChatTransport, CreateChatRequest};
use agora_shared::{AttachmentDraft, Chat, ChatFilter, ChatId, Message, MessageId, UserId};
use agora_store::{ChatPrefs, MessageFlag, PrefsPatch};

use crate::cache::MessageCache;
use crate::config::ClientConfig;
use crate::directory::ChatDirectory;
use crate::error::ClientError;
use crate::mutex::lock;
use crate::prefs::PreferenceStore;
use crate::send::{Draft, SendCoordinator, SendState};
use crate::view::{compose, ChatEntry};
use crate::{unread, Result};

/// The chat feature's single entry point.
///
/// Owns the directory, message cache, send coordinator, and preference
/// store, and exposes every user-facing operation. All reads are cheap
/// snapshots; the only suspension points are network round-trips.
pub struct ChatEngine {
    transport: Arc<dyn ChatTransport>,
    config: ClientConfig,
    prefs: PreferenceStore,
    directory: ChatDirectory,
    cache: MessageCache,
    sender: SendCoordinator,
    selected: Mutex<Option<ChatId>>,
    /// Bumped on every selection change. A fetch started under an older
    /// epoch may still merge its messages (union), but must not advance
    /// the last-read timestamp: the completion is provably stale.
    selection_epoch: AtomicU64,
}

impl ChatEngine {
    /// Build an engine over an explicit transport and preference store.
    pub fn with_store(
        transport: Arc<dyn ChatTransport>,
        config: ClientConfig,
        prefs: PreferenceStore,
    ) -> Self {
        let current_user = config.current_user;
        Self {
            transport,
            config,
            prefs,
            directory: ChatDirectory::new(),
            cache: MessageCache::new(),
            sender: SendCoordinator::new(current_user),
            selected: Mutex::new(None),
            selection_epoch: AtomicU64::new(0),
        }
    }

    /// Build an engine over an explicit transport, opening the preference
    /// store at the configured (or platform default) data directory.
    pub fn new(transport: Arc<dyn ChatTransport>, config: ClientConfig) -> Self {
        let prefs = PreferenceStore::open(config.data_dir.as_deref());
        Self::with_store(transport, config, prefs)
    }

    /// Build an engine talking HTTP to the configured backend.
    pub fn from_config(config: ClientConfig) -> Result<Self> {
        let client = ApiClient::new(config.base_url.clone(), config.auth_token.clone())?;
        Ok(Self::new(Arc::new(client), config))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn epoch(&self) -> u64 {
        self.selection_epoch.load(Ordering::SeqCst)
    }

    fn bump_epoch(&self) {
        self.selection_epoch.fetch_add(1, Ordering::SeqCst);
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    pub fn selected(&self) -> Option<ChatId> {
        *lock(&self.selected)
    }

    /// Open a conversation.
    ///
    /// Selecting is reading: the chat's last-read timestamp advances to
    /// now immediately, and again once the fresh message fetch lands (if
    /// the chat is still selected by then). A fetch failure is transient
    /// and leaves the cached history as-is.
    pub async fn select_chat(&self, chat_id: ChatId) -> Result<()> {
        if !self.directory.contains(chat_id) {
            return Err(ClientError::UnknownChat(chat_id));
        }

        {
            let mut selected = lock(&self.selected);
            *selected = Some(chat_id);
        }
        self.bump_epoch();
        self.prefs.set_last_read(chat_id, Utc::now());

        let epoch = self.epoch();
        match self.cache.fetch(&*self.transport, chat_id).await {
            Ok(_) => {
                if epoch == self.epoch() && self.selected() == Some(chat_id) {
                    self.prefs.set_last_read(chat_id, Utc::now());
                }
            }
            Err(e) => {
                debug!(chat = %chat_id, error = %e, "message fetch on select failed, keeping cache");
            }
        }
        Ok(())
    }

    pub fn clear_selection(&self) {
        *lock(&self.selected) = None;
        self.bump_epoch();
    }

    /// Reset a non-selected chat to "never read". A no-op on the selected
    /// chat, whose unread count is pinned to 0 while open.
    pub fn mark_unread(&self, chat_id: ChatId) {
        if self.selected() == Some(chat_id) {
            debug!(chat = %chat_id, "mark-unread ignored for the selected chat");
            return;
        }
        self.prefs.clear_last_read(chat_id);
    }

    // ------------------------------------------------------------------
    // Preference flags
    // ------------------------------------------------------------------

    pub fn prefs_for(&self, chat_id: ChatId) -> ChatPrefs {
        self.prefs.get(chat_id)
    }

    pub fn set_archived(&self, chat_id: ChatId, value: bool) -> ChatPrefs {
        self.prefs.update(chat_id, &PrefsPatch::archived(value))
    }

    pub fn set_muted(&self, chat_id: ChatId, value: bool) -> ChatPrefs {
        self.prefs.update(chat_id, &PrefsPatch::muted(value))
    }

    pub fn set_pinned(&self, chat_id: ChatId, value: bool) -> ChatPrefs {
        self.prefs.update(chat_id, &PrefsPatch::pinned(value))
    }

    pub fn set_favorite(&self, chat_id: ChatId, value: bool) -> ChatPrefs {
        self.prefs.update(chat_id, &PrefsPatch::favorite(value))
    }

    // ------------------------------------------------------------------
    // Starred / pinned messages
    // ------------------------------------------------------------------

    pub fn star_message(&self, message_id: MessageId) {
        self.prefs.flag_message(message_id, MessageFlag::Starred);
    }

    pub fn unstar_message(&self, message_id: MessageId) {
        self.prefs.unflag_message(message_id, MessageFlag::Starred);
    }

    pub fn starred_messages(&self) -> HashSet<MessageId> {
        self.prefs.flagged_messages(MessageFlag::Starred)
    }

    pub fn pin_message(&self, message_id: MessageId) {
        self.prefs.flag_message(message_id, MessageFlag::Pinned);
    }

    pub fn unpin_message(&self, message_id: MessageId) {
        self.prefs.unflag_message(message_id, MessageFlag::Pinned);
    }

    pub fn pinned_messages(&self) -> HashSet<MessageId> {
        self.prefs.flagged_messages(MessageFlag::Pinned)
    }

    // ------------------------------------------------------------------
    // Composing & sending
    // ------------------------------------------------------------------

    pub fn draft(&self, chat_id: ChatId) -> Draft {
        self.sender.draft(chat_id)
    }

    pub fn set_draft_text(&self, chat_id: ChatId, text: impl Into<String>) {
        self.sender.set_text(chat_id, text);
    }

    pub fn attach(&self, chat_id: ChatId, attachment: AttachmentDraft) {
        self.sender.attach(chat_id, attachment);
    }

    pub fn clear_attachment(&self, chat_id: ChatId) {
        self.sender.clear_attachment(chat_id);
    }

    pub fn send_state(&self, chat_id: ChatId) -> SendState {
        self.sender.state(chat_id)
    }

    /// Send the chat's current draft, then trigger an on-demand directory
    /// refresh so the chat list reflects the new last-message marker.
    pub async fn send(&self, chat_id: ChatId) -> Result<Message> {
        let message = self
            .sender
            .send(&*self.transport, &self.cache, &self.directory, chat_id)
            .await?;

        if let Err(e) = self.directory.refresh(&*self.transport, self.selected()).await {
            debug!(error = %e, "post-send directory refresh failed");
        }
        Ok(message)
    }

    // ------------------------------------------------------------------
    // Chat lifecycle
    // ------------------------------------------------------------------

    /// Create a conversation and make it visible locally right away.
    pub async fn create_chat(
        &self,
        name: Option<String>,
        is_group: bool,
        member_ids: Vec<UserId>,
    ) -> Result<Chat> {
        let chat = self
            .transport
            .create_chat(CreateChatRequest {
                name,
                is_group: Some(is_group),
                member_ids,
            })
            .await?;

        info!(chat = %chat.id, group = chat.is_group, "chat created");
        self.directory.upsert(chat.clone());

        if let Err(e) = self.directory.refresh(&*self.transport, self.selected()).await {
            debug!(error = %e, "post-create directory refresh failed");
        }
        Ok(chat)
    }

    /// Delete a conversation on the server and drop it locally.
    ///
    /// Preference records for the chat are deliberately retained; they are
    /// harmless and local-only.
    pub async fn delete_chat(&self, chat_id: ChatId) -> Result<()> {
        self.transport.delete_chat(chat_id).await?;

        self.directory.remove(chat_id);
        self.cache.remove(chat_id);
        if self.selected() == Some(chat_id) {
            self.clear_selection();
        }
        info!(chat = %chat_id, "chat deleted");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Refresh
    // ------------------------------------------------------------------

    /// One background refresh pass: chat list, then a fan-out message
    /// fetch across every known chat.
    ///
    /// Failures here are transient by definition; state stays frozen at
    /// last-known-good and the next tick retries implicitly.
    pub async fn tick(&self) {
        if let Err(e) = self.directory.refresh(&*self.transport, self.selected()).await {
            warn!(error = %e, "chat list refresh failed, keeping last-known state");
        }

        let ids = self.directory.chat_ids();
        let epoch = self.epoch();
        let fetched = self.cache.fetch_all(&*self.transport, &ids).await;

        // New messages were fetched for the selected chat while it stayed
        // selected, so it remains fully read. A selection change since the
        // fetch started makes this completion stale, and a failed fetch for
        // the selected chat means its history may be missing messages that
        // would be marked read; skip both.
        if let Some(selected) = self.selected() {
            if epoch == self.epoch() && fetched.contains(&selected) {
                self.prefs.set_last_read(selected, Utc::now());
            }
        }
    }

    /// Run [`tick`](Self::tick) forever on the configured interval.
    pub fn spawn_poller(self: &Arc<Self>) -> JoinHandle<()> {
        let engine = Arc::clone(self);
        info!(interval = ?engine.config.poll_interval, "starting background poller");

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(engine.config.poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                engine.tick().await;
            }
        })
    }

    // ------------------------------------------------------------------
    // Views
    // ------------------------------------------------------------------

    /// The ordered conversation list for a filter tab and search term.
    pub fn chat_list(&self, filter: ChatFilter, search: &str) -> Vec<ChatEntry> {
        let chats = self.directory.snapshot();
        let ids: Vec<ChatId> = chats.iter().map(|c| c.id).collect();
        let histories = self.cache.snapshot();
        let prefs = self.prefs.snapshot();

        let counts = unread::unread_counts(
            &ids,
            &histories,
            |id| prefs.get(&id).and_then(|p| p.last_read_at),
            self.config.current_user,
            self.selected(),
        );

        compose(&chats, &prefs, &counts, filter, search)
    }

    /// The selected chat's message stream, chronologically ordered.
    pub fn selected_messages(&self) -> Vec<Message> {
        match self.selected() {
            Some(chat_id) => self.cache.messages(chat_id),
            None => Vec::new(),
        }
    }

    pub fn messages(&self, chat_id: ChatId) -> Vec<Message> {
        self.cache.messages(chat_id)
    }

    /// A single chat's unread count, honoring the selected-chat rule.
    pub fn unread_count(&self, chat_id: ChatId) -> usize {
        if self.selected() == Some(chat_id) {
            return 0;
        }
        unread::unread_count(
            &self.cache.messages(chat_id),
            self.config.current_user,
            self.prefs.last_read(chat_id),
        )
    }
}
