use chrono::{DateTime, FixedOffset};
use log::error;
use std::error::Error;
use std::sync::Arc;

use crate::models::chat::{ChatMessage, Conversation};
use crate::store::DocumentStore;
use crate::text;

/// Query construction over the per-user conversation sub-collection.
///
/// Two different name filters live here on purpose: the listing path fetches
/// and then does an accent-insensitive substring match client-side, while the
/// delete-by-search path uses index-style prefix matching. Callers must not
/// assume they behave identically.
pub struct ChatRepository {
    store: Arc<dyn DocumentStore>,
}

impl ChatRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn get_conversation_by_user(
        &self,
        user_id: &str,
        name: Option<&str>,
        from: Option<DateTime<FixedOffset>>,
        to: Option<DateTime<FixedOffset>>,
    ) -> Result<Option<Vec<Conversation>>, Box<dyn Error + Send + Sync>> {
        let listed = self.store.list(user_id).await.map_err(|e| {
            error!("Failed to list conversations for {}: {}", user_id, e);
            e
        })?;
        let Some(conversations) = listed else {
            return Ok(None);
        };

        let mut filtered: Vec<Conversation> = conversations
            .into_iter()
            .filter(|c| c.estado)
            .filter(|c| in_date_range(c.date, from, to))
            .collect();

        if let Some(term) = name.filter(|n| !n.is_empty()) {
            filtered.retain(|c| text::contains_folded(&c.name, term));
        }

        Ok(Some(filtered))
    }

    pub async fn get_conversation_by_id(
        &self,
        user_id: &str,
        conversation_id: &str,
    ) -> Result<Option<Conversation>, Box<dyn Error + Send + Sync>> {
        let conversation = self.store.get(user_id, conversation_id).await.map_err(|e| {
            error!("Failed to read conversation {}: {}", conversation_id, e);
            e
        })?;
        Ok(conversation)
    }

    pub async fn insert(
        &self,
        user_id: &str,
        conversation: &Conversation,
    ) -> Result<bool, Box<dyn Error + Send + Sync>> {
        self.store.put(user_id, conversation).await.map_err(|e| {
            error!("Failed to insert conversation: {}", e);
            e
        })?;
        Ok(true)
    }

    /// Overwrites the whole document and returns the re-read copy.
    pub async fn update(
        &self,
        user_id: &str,
        conversation: &Conversation,
    ) -> Result<Conversation, Box<dyn Error + Send + Sync>> {
        self.store.put(user_id, conversation).await.map_err(|e| {
            error!("Failed to update conversation: {}", e);
            e
        })?;
        let updated = self
            .store
            .get(user_id, &conversation.uuid_conversation)
            .await?;
        Ok(updated.unwrap_or_else(|| Conversation::new("", "")))
    }

    /// Replaces the message list field and returns the updated document.
    pub async fn update_messages(
        &self,
        user_id: &str,
        conversation_id: &str,
        messages: &[ChatMessage],
    ) -> Result<Conversation, Box<dyn Error + Send + Sync>> {
        let updated = self
            .store
            .set_messages(user_id, conversation_id, messages)
            .await
            .map_err(|e| {
                error!("Failed to replace messages on {}: {}", conversation_id, e);
                e
            })?;
        Ok(updated)
    }

    pub async fn delete_conversation(
        &self,
        user_id: &str,
        conversation_id: &str,
        new_status: bool,
    ) -> Result<bool, Box<dyn Error + Send + Sync>> {
        self.store
            .set_estado(user_id, conversation_id, new_status)
            .await
            .map_err(|e| {
                error!("Failed to flip status on {}: {}", conversation_id, e);
                e
            })?;
        Ok(true)
    }

    /// Bulk soft delete by explicit ids. Every id is checked before any flag
    /// flips so a missing document aborts the whole batch.
    pub async fn delete_conversations_by_ids(
        &self,
        user_id: &str,
        conversation_ids: &[String],
        new_status: bool,
    ) -> Result<bool, Box<dyn Error + Send + Sync>> {
        for id in conversation_ids {
            if self.store.get(user_id, id).await?.is_none() {
                error!("Bulk delete aborted, missing conversation {}", id);
                return Err(Box::new(crate::store::StoreError::MissingDocument));
            }
        }
        for id in conversation_ids {
            self.store.set_estado(user_id, id, new_status).await?;
        }
        Ok(true)
    }

    /// Bulk soft delete by search. Name matching is prefix-style here, unlike
    /// the substring filter of the listing path.
    pub async fn delete_conversations_by_search(
        &self,
        user_id: &str,
        name: Option<&str>,
        from: Option<DateTime<FixedOffset>>,
        to: Option<DateTime<FixedOffset>>,
    ) -> Result<bool, Box<dyn Error + Send + Sync>> {
        let conversations = self.store.list(user_id).await?.unwrap_or_default();
        let matched: Vec<&Conversation> = conversations
            .iter()
            .filter(|c| c.estado)
            .filter(|c| match name.filter(|n| !n.is_empty()) {
                Some(prefix) => c.name.starts_with(prefix),
                None => true,
            })
            .filter(|c| in_date_range(c.date, from, to))
            .collect();

        for conversation in matched {
            self.store
                .set_estado(user_id, &conversation.uuid_conversation, false)
                .await?;
        }
        Ok(true)
    }

    pub async fn update_field_messages(
        &self,
        user_id: &str,
        conversation_id: &str,
        messages: &[ChatMessage],
    ) -> Result<bool, Box<dyn Error + Send + Sync>> {
        self.store
            .set_messages(user_id, conversation_id, messages)
            .await
            .map_err(|e| {
                error!("Failed to update messages on {}: {}", conversation_id, e);
                e
            })?;
        Ok(true)
    }

    pub async fn update_field_conversation(
        &self,
        user_id: &str,
        conversation_id: &str,
        modelo_documento: Option<bool>,
    ) -> Result<bool, Box<dyn Error + Send + Sync>> {
        self.store
            .set_modelo_documento(user_id, conversation_id, modelo_documento)
            .await
            .map_err(|e| {
                error!("Failed to update flag on {}: {}", conversation_id, e);
                e
            })?;
        Ok(true)
    }
}

fn in_date_range(
    date: Option<DateTime<FixedOffset>>,
    from: Option<DateTime<FixedOffset>>,
    to: Option<DateTime<FixedOffset>>,
) -> bool {
    if let Some(lower) = from {
        if !date.map_or(false, |d| d >= lower) {
            return false;
        }
    }
    if let Some(upper) = to {
        if !date.map_or(false, |d| d <= upper) {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryDocumentStore;
    use chrono::Utc;

    fn seeded() -> ChatRepository {
        ChatRepository::new(Arc::new(MemoryDocumentStore::new()))
    }

    async fn seed(repo: &ChatRepository, user: &str, id: &str, name: &str, estado: bool) {
        let mut conversation = Conversation::new(id, name);
        conversation.estado = estado;
        conversation.date = Some(Utc::now().fixed_offset());
        repo.insert(user, &conversation).await.unwrap();
    }

    #[tokio::test]
    async fn listing_filters_accent_insensitive_substring() {
        let repo = seeded();
        seed(&repo, "u", "1", "Primera Conversación", true).await;
        seed(&repo, "u", "2", "Segunda Conversación", true).await;
        seed(&repo, "u", "3", "Nuevo Estado", true).await;

        let found = repo
            .get_conversation_by_user("u", Some("Conversa"), None, None)
            .await
            .unwrap()
            .unwrap();
        let mut names: Vec<_> = found.iter().map(|c| c.name.as_str()).collect();
        names.sort();
        assert_eq!(names, ["Primera Conversación", "Segunda Conversación"]);
    }

    #[tokio::test]
    async fn listing_excludes_soft_deleted() {
        let repo = seeded();
        seed(&repo, "u", "1", "Visible", true).await;
        seed(&repo, "u", "2", "Oculta", false).await;

        let found = repo
            .get_conversation_by_user("u", None, None, None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Visible");
    }

    #[tokio::test]
    async fn delete_by_search_matches_prefix_not_substring() {
        let repo = seeded();
        seed(&repo, "u", "1", "Informe anual", true).await;
        seed(&repo, "u", "2", "Nuevo Informe", true).await;

        repo.delete_conversations_by_search("u", Some("Informe"), None, None)
            .await
            .unwrap();

        let remaining = repo
            .get_conversation_by_user("u", None, None, None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].name, "Nuevo Informe");
    }

    #[tokio::test]
    async fn bulk_delete_by_ids_aborts_on_missing_document() {
        let repo = seeded();
        seed(&repo, "u", "1", "Uno", true).await;

        let err = repo
            .delete_conversations_by_ids("u", &["1".into(), "ghost".into()], false)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "La conversación no existe.");

        // Aborted before any flag flipped.
        let kept = repo.get_conversation_by_id("u", "1").await.unwrap().unwrap();
        assert!(kept.estado);
    }
}
