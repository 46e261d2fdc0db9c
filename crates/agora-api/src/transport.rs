//! The seam between the sync engine and the backend.

use async_trait::async_trait;

use agora_shared::{Chat, ChatId, Message};

use crate::dto::{CreateChatRequest, SendMessageRequest};
use crate::Result;

/// The five backend operations the engine consumes.
///
/// [`ApiClient`] implements this over HTTP; engine tests implement it with
/// an in-memory fake. The engine never talks to the network any other way.
///
/// [`ApiClient`]: crate::ApiClient
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// `GET /chats`
    async fn list_chats(&self) -> Result<Vec<Chat>>;

    /// `POST /chats`
    async fn create_chat(&self, req: CreateChatRequest) -> Result<Chat>;

    /// `GET /chats/{id}/messages`
    async fn list_messages(&self, chat_id: ChatId) -> Result<Vec<Message>>;

    /// `POST /chats/{id}/messages`
    async fn send_message(&self, chat_id: ChatId, req: SendMessageRequest) -> Result<Message>;

    /// `DELETE /chats/{id}`
    async fn delete_chat(&self, chat_id: ChatId) -> Result<()>;
}
