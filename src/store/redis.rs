use async_trait::async_trait;
use log::error;
use redis::{AsyncCommands, Client};

use crate::cli::Args;
use crate::models::chat::{ChatMessage, Conversation};
use crate::store::{DocumentStore, StoreError};

/// Document store backed by Redis. Each conversation is one JSON document
/// under `{prefix}doc:{user}:{conversation}`; membership sets
/// (`{prefix}users`, `{prefix}user:{user}`) stand in for the two-level
/// collection hierarchy. Writes go through an atomic MULTI/EXEC pipeline
/// after the in-process read of the same document.
pub struct RedisDocumentStore {
    client: Client,
    key_prefix: String,
}

impl RedisDocumentStore {
    pub fn new(args: &Args) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        Ok(Self {
            client: Client::open(args.store_host.as_str())?,
            key_prefix: args.store_prefix.clone(),
        })
    }

    async fn get_connection(&self) -> Result<redis::aio::MultiplexedConnection, redis::RedisError> {
        self.client.get_multiplexed_async_connection().await
    }

    fn users_key(&self) -> String {
        format!("{}users", self.key_prefix)
    }

    fn user_key(&self, user_id: &str) -> String {
        format!("{}user:{}", self.key_prefix, user_id)
    }

    fn doc_key(&self, user_id: &str, conversation_id: &str) -> String {
        format!("{}doc:{}:{}", self.key_prefix, user_id, conversation_id)
    }

    async fn read_document(
        &self,
        conn: &mut redis::aio::MultiplexedConnection,
        user_id: &str,
        conversation_id: &str,
    ) -> Result<Option<Conversation>, StoreError> {
        let raw: Option<String> = conn.get(self.doc_key(user_id, conversation_id)).await?;
        match raw {
            Some(json) => match serde_json::from_str::<Conversation>(&json) {
                Ok(conversation) => Ok(Some(conversation)),
                Err(e) => {
                    error!("Error decoding conversation document: {}", e);
                    Err(StoreError::Serde(e))
                }
            },
            None => Ok(None),
        }
    }

    async fn write_document(
        &self,
        conn: &mut redis::aio::MultiplexedConnection,
        user_id: &str,
        conversation: &Conversation,
    ) -> Result<(), StoreError> {
        let json = serde_json::to_string(conversation)?;
        redis::pipe()
            .atomic()
            .set(
                self.doc_key(user_id, &conversation.uuid_conversation),
                json,
            )
            .ignore()
            .sadd(self.user_key(user_id), &conversation.uuid_conversation)
            .ignore()
            .sadd(self.users_key(), user_id)
            .ignore()
            .query_async::<_, ()>(conn)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for RedisDocumentStore {
    async fn get(
        &self,
        user_id: &str,
        conversation_id: &str,
    ) -> Result<Option<Conversation>, StoreError> {
        let mut conn = self.get_connection().await?;
        self.read_document(&mut conn, user_id, conversation_id).await
    }

    async fn put(&self, user_id: &str, conversation: &Conversation) -> Result<(), StoreError> {
        let mut conn = self.get_connection().await?;
        self.write_document(&mut conn, user_id, conversation).await
    }

    async fn list(&self, user_id: &str) -> Result<Option<Vec<Conversation>>, StoreError> {
        let mut conn = self.get_connection().await?;
        let known: bool = conn.sismember(self.users_key(), user_id).await?;
        if !known {
            return Ok(None);
        }
        let ids: Vec<String> = conn.smembers(self.user_key(user_id)).await?;
        let mut conversations = Vec::with_capacity(ids.len());
        for id in &ids {
            if let Some(conversation) = self.read_document(&mut conn, user_id, id).await? {
                conversations.push(conversation);
            }
        }
        Ok(Some(conversations))
    }

    async fn list_users(&self) -> Result<Vec<String>, StoreError> {
        let mut conn = self.get_connection().await?;
        let users: Vec<String> = conn.smembers(self.users_key()).await?;
        Ok(users)
    }

    async fn set_messages(
        &self,
        user_id: &str,
        conversation_id: &str,
        messages: &[ChatMessage],
    ) -> Result<Conversation, StoreError> {
        let mut conn = self.get_connection().await?;
        let mut conversation = self
            .read_document(&mut conn, user_id, conversation_id)
            .await?
            .ok_or(StoreError::MissingDocument)?;
        conversation.messages = Some(messages.to_vec());
        self.write_document(&mut conn, user_id, &conversation).await?;
        Ok(conversation)
    }

    async fn set_estado(
        &self,
        user_id: &str,
        conversation_id: &str,
        estado: bool,
    ) -> Result<(), StoreError> {
        let mut conn = self.get_connection().await?;
        let mut conversation = self
            .read_document(&mut conn, user_id, conversation_id)
            .await?
            .ok_or(StoreError::MissingDocument)?;
        conversation.estado = estado;
        self.write_document(&mut conn, user_id, &conversation).await
    }

    async fn set_modelo_documento(
        &self,
        user_id: &str,
        conversation_id: &str,
        value: Option<bool>,
    ) -> Result<(), StoreError> {
        let mut conn = self.get_connection().await?;
        let mut conversation = self
            .read_document(&mut conn, user_id, conversation_id)
            .await?
            .ok_or(StoreError::MissingDocument)?;
        conversation.modelo_documento = value;
        self.write_document(&mut conn, user_id, &conversation).await
    }
}
