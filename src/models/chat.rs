use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// A single chatbot exchange entry. Owned exclusively by its conversation;
/// `uuid` is unique within that conversation's message list and is always
/// generated server-side for new messages.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    #[serde(default)]
    pub id_persona: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub fecha: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub uuid: String,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub documentos_url: Option<String>,
}

/// Conversation document stored per user. `uuid_conversation` never changes
/// after the first save; `estado = false` is the soft-delete marker.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    #[serde(default)]
    pub uuid_conversation: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub date: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub estado: bool,
    #[serde(default)]
    pub messages: Option<Vec<ChatMessage>>,
    #[serde(default)]
    pub modelo_documento: Option<bool>,
}

impl Conversation {
    pub fn new(uuid_conversation: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            uuid_conversation: uuid_conversation.into(),
            name: name.into(),
            date: None,
            estado: false,
            messages: None,
            modelo_documento: None,
        }
    }
}

/// Shared request body of the Chat routes: save carries `conversation`, the
/// message merge carries `messages`, delete carries the id and new status.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsultRequest {
    #[serde(default)]
    pub conversation_id: String,
    #[serde(default)]
    pub status: Option<bool>,
    #[serde(default)]
    pub conversation: Option<Conversation>,
    #[serde(default)]
    pub messages: Option<Vec<ChatMessage>>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFieldConversationRequest {
    #[serde(default)]
    pub conversation_id: String,
    #[serde(default)]
    pub modelo_documento: Option<bool>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteByIdsRequest {
    #[serde(default)]
    pub conversation_ids: Vec<String>,
    #[serde(default)]
    pub status: Option<bool>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteBySearchRequest {
    #[serde(default)]
    pub status: Option<bool>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub from: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub to: Option<DateTime<FixedOffset>>,
}
