//! Wire envelopes for the backend's JSON bodies.
//!
//! Every response wraps its payload in a single-field object (`{chats}`,
//! `{chat}`, `{messages}`, `{message}`); requests use camelCase field names.

use serde::{Deserialize, Serialize};

use agora_shared::{Chat, Message, UserId};

#[derive(Debug, Deserialize)]
pub struct ChatsEnvelope {
    pub chats: Vec<Chat>,
}

#[derive(Debug, Deserialize)]
pub struct ChatEnvelope {
    pub chat: Chat,
}

#[derive(Debug, Deserialize)]
pub struct MessagesEnvelope {
    pub messages: Vec<Message>,
}

#[derive(Debug, Deserialize)]
pub struct MessageEnvelope {
    pub message: Message,
}

/// Body of `POST /chats`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreateChatRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_group: Option<bool>,
    pub member_ids: Vec<UserId>,
}

/// Body of `POST /chats/{id}/messages`.
///
/// At least one field is always present; the send path rejects empty
/// payloads before building this request.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_request_omits_absent_fields() {
        let req = SendMessageRequest {
            content: Some("salut".into()),
            attachment_url: None,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json, serde_json::json!({ "content": "salut" }));
    }

    #[test]
    fn create_request_uses_camel_case() {
        let req = CreateChatRequest {
            name: Some("Promo 2026".into()),
            is_group: Some(true),
            member_ids: vec![],
        };
        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("isGroup").is_some());
        assert!(json.get("memberIds").is_some());
    }
}
