//! HTTP implementation of [`ChatTransport`] over the backend REST contract.

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response};
use tracing::debug;

use agora_shared::{Chat, ChatId, Message};

use crate::dto::{
    ChatEnvelope, ChatsEnvelope, CreateChatRequest, MessageEnvelope, MessagesEnvelope,
    SendMessageRequest,
};
use crate::error::ApiError;
use crate::transport::ChatTransport;
use crate::Result;

/// Authenticated JSON client for the Agora backend.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    auth_token: Option<String>,
}

impl ApiClient {
    /// Build a client for the given base URL (e.g. `https://host/api`).
    ///
    /// A bearer token, when present, is attached to every request.
    pub fn new(base_url: impl Into<String>, auth_token: Option<String>) -> Result<Self> {
        let base_url = base_url.into();
        let trimmed = base_url.trim_end_matches('/').to_string();

        if !trimmed.starts_with("http://") && !trimmed.starts_with("https://") {
            return Err(ApiError::InvalidBaseUrl(base_url));
        }

        Ok(Self {
            http: reqwest::Client::new(),
            base_url: trimmed,
            auth_token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Turn a non-success status into [`ApiError::Status`] with the
    /// response body preserved for logging.
    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Status { status, body })
    }
}

#[async_trait]
impl ChatTransport for ApiClient {
    async fn list_chats(&self) -> Result<Vec<Chat>> {
        let response = self.authed(self.http.get(self.url("/chats"))).send().await?;
        let envelope: ChatsEnvelope = Self::check(response).await?.json().await?;

        debug!(count = envelope.chats.len(), "listed chats");
        Ok(envelope.chats)
    }

    async fn create_chat(&self, req: CreateChatRequest) -> Result<Chat> {
        let response = self
            .authed(self.http.post(self.url("/chats")).json(&req))
            .send()
            .await?;
        let envelope: ChatEnvelope = Self::check(response).await?.json().await?;

        debug!(chat = %envelope.chat.id, "created chat");
        Ok(envelope.chat)
    }

    async fn list_messages(&self, chat_id: ChatId) -> Result<Vec<Message>> {
        let response = self
            .authed(self.http.get(self.url(&format!("/chats/{chat_id}/messages"))))
            .send()
            .await?;
        let envelope: MessagesEnvelope = Self::check(response).await?.json().await?;

        debug!(chat = %chat_id, count = envelope.messages.len(), "listed messages");
        Ok(envelope.messages)
    }

    async fn send_message(&self, chat_id: ChatId, req: SendMessageRequest) -> Result<Message> {
        let response = self
            .authed(
                self.http
                    .post(self.url(&format!("/chats/{chat_id}/messages")))
                    .json(&req),
            )
            .send()
            .await?;
        let envelope: MessageEnvelope = Self::check(response).await?.json().await?;

        debug!(chat = %chat_id, message = %envelope.message.id, "sent message");
        Ok(envelope.message)
    }

    async fn delete_chat(&self, chat_id: ChatId) -> Result<()> {
        let response = self
            .authed(self.http.delete(self.url(&format!("/chats/{chat_id}"))))
            .send()
            .await?;
        Self::check(response).await?;

        debug!(chat = %chat_id, "deleted chat");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_base_url_without_scheme() {
        assert!(matches!(
            ApiClient::new("example.org/api", None),
            Err(ApiError::InvalidBaseUrl(_))
        ));
    }

    #[test]
    fn trims_trailing_slash() {
        let client = ApiClient::new("https://example.org/api/", None).unwrap();
        assert_eq!(client.url("/chats"), "https://example.org/api/chats");
    }
}
