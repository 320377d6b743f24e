mod memory;
mod objects;
mod redis;

use async_trait::async_trait;
use log::info;
use std::sync::Arc;
use thiserror::Error;

use crate::cli::Args;
use crate::models::chat::{ChatMessage, Conversation};

pub use memory::MemoryDocumentStore;
pub use objects::{create_object_store, FsObjectStore, MemoryObjectStore, ObjectStore};
pub use redis::RedisDocumentStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("redis error: {0}")]
    Redis(#[from] ::redis::RedisError),
    #[error("document decode error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("object store error: {0}")]
    Io(#[from] std::io::Error),
    /// An existence-gated write found no document; the whole write is aborted.
    #[error("La conversación no existe.")]
    MissingDocument,
}

/// Per-user document hierarchy with field-level partial updates. Mutating
/// operations are atomic read-then-write cycles; the ones gated on existence
/// abort with [`StoreError::MissingDocument`] when the document is absent.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(
        &self,
        user_id: &str,
        conversation_id: &str,
    ) -> Result<Option<Conversation>, StoreError>;

    /// Inserts or overwrites the whole document.
    async fn put(&self, user_id: &str, conversation: &Conversation) -> Result<(), StoreError>;

    /// All conversations of one user. `None` means the user has no
    /// conversation collection at all, distinct from an empty list.
    async fn list(&self, user_id: &str) -> Result<Option<Vec<Conversation>>, StoreError>;

    /// Distinct owning-user ids across the whole store.
    async fn list_users(&self) -> Result<Vec<String>, StoreError>;

    /// Replaces the message list field and returns the updated document.
    async fn set_messages(
        &self,
        user_id: &str,
        conversation_id: &str,
        messages: &[ChatMessage],
    ) -> Result<Conversation, StoreError>;

    /// Flips the active flag. Soft delete; nothing is physically removed.
    async fn set_estado(
        &self,
        user_id: &str,
        conversation_id: &str,
        estado: bool,
    ) -> Result<(), StoreError>;

    async fn set_modelo_documento(
        &self,
        user_id: &str,
        conversation_id: &str,
        value: Option<bool>,
    ) -> Result<(), StoreError>;
}

pub fn create_document_store(
    args: &Args,
) -> Result<Arc<dyn DocumentStore>, Box<dyn std::error::Error + Send + Sync>> {
    match args.store_type.to_lowercase().as_str() {
        "redis" => {
            let store = redis::RedisDocumentStore::new(args)?;
            Ok(Arc::new(store))
        }
        "memory" => Ok(Arc::new(memory::MemoryDocumentStore::new())),
        _ => Err(Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("Unsupported document store type: {}", args.store_type),
        ))),
    }
}

pub fn initialize_document_store(
    args: &Args,
) -> Result<Arc<dyn DocumentStore>, Box<dyn std::error::Error + Send + Sync>> {
    info!(
        "Conversations will be stored in: {} at {}",
        args.store_type, args.store_host
    );
    create_document_store(args)
}
