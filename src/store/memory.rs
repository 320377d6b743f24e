use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use crate::models::chat::{ChatMessage, Conversation};
use crate::store::{DocumentStore, StoreError};

/// In-process document store for tests and local runs. The write lock gives
/// the same read-then-write atomicity the Redis pipeline provides.
#[derive(Default)]
pub struct MemoryDocumentStore {
    users: RwLock<BTreeMap<String, BTreeMap<String, Conversation>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(
        &self,
        user_id: &str,
        conversation_id: &str,
    ) -> Result<Option<Conversation>, StoreError> {
        let users = self.users.read().await;
        Ok(users
            .get(user_id)
            .and_then(|c| c.get(conversation_id))
            .cloned())
    }

    async fn put(&self, user_id: &str, conversation: &Conversation) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        users
            .entry(user_id.to_string())
            .or_default()
            .insert(conversation.uuid_conversation.clone(), conversation.clone());
        Ok(())
    }

    async fn list(&self, user_id: &str) -> Result<Option<Vec<Conversation>>, StoreError> {
        let users = self.users.read().await;
        Ok(users
            .get(user_id)
            .map(|c| c.values().cloned().collect::<Vec<_>>()))
    }

    async fn list_users(&self) -> Result<Vec<String>, StoreError> {
        let users = self.users.read().await;
        Ok(users.keys().cloned().collect())
    }

    async fn set_messages(
        &self,
        user_id: &str,
        conversation_id: &str,
        messages: &[ChatMessage],
    ) -> Result<Conversation, StoreError> {
        let mut users = self.users.write().await;
        let conversation = users
            .get_mut(user_id)
            .and_then(|c| c.get_mut(conversation_id))
            .ok_or(StoreError::MissingDocument)?;
        conversation.messages = Some(messages.to_vec());
        Ok(conversation.clone())
    }

    async fn set_estado(
        &self,
        user_id: &str,
        conversation_id: &str,
        estado: bool,
    ) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        let conversation = users
            .get_mut(user_id)
            .and_then(|c| c.get_mut(conversation_id))
            .ok_or(StoreError::MissingDocument)?;
        conversation.estado = estado;
        Ok(())
    }

    async fn set_modelo_documento(
        &self,
        user_id: &str,
        conversation_id: &str,
        value: Option<bool>,
    ) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        let conversation = users
            .get_mut(user_id)
            .and_then(|c| c.get_mut(conversation_id))
            .ok_or(StoreError::MissingDocument)?;
        conversation.modelo_documento = value;
        Ok(())
    }
}
