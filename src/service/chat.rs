use chrono::{DateTime, FixedOffset, Utc};
use std::error::Error;
use std::sync::Arc;
use uuid::Uuid;

use crate::constants;
use crate::models::chat::{ChatMessage, ConsultRequest, Conversation};
use crate::models::result::OperationResult;
use crate::repository::ChatRepository;
use crate::text;

/// Orchestrates the conversation lifecycle: read-modify-write cycles for
/// create/update/delete flows and the field-merge policy.
///
/// Domain absence (missing conversation or message) is always reported as a
/// successful result carrying a sentinel message; only infrastructure
/// failures travel the error channel.
pub struct ChatService {
    repository: Arc<ChatRepository>,
}

/// Copies incoming non-empty fields onto the stored conversation. The id,
/// the message list and the active flag are never merged here; messages
/// append through their own path and the flag flips only via delete.
fn merge_conversation_fields(existing: &mut Conversation, incoming: &Conversation) {
    if !incoming.name.is_empty() {
        existing.name = incoming.name.clone();
    }
    if incoming.date.is_some() {
        existing.date = incoming.date;
    }
    if incoming.modelo_documento.is_some() {
        existing.modelo_documento = incoming.modelo_documento;
    }
}

/// Same overwrite-if-present rule for a single message, skipping `uuid`.
/// The favorite flag always carries over; it has no absent state.
fn merge_message_fields(existing: &mut ChatMessage, incoming: &ChatMessage) {
    if !incoming.id_persona.is_empty() {
        existing.id_persona = incoming.id_persona.clone();
    }
    if !incoming.message.is_empty() {
        existing.message = incoming.message.clone();
    }
    if incoming.fecha.is_some() {
        existing.fecha = incoming.fecha;
    }
    existing.is_favorite = incoming.is_favorite;
    if !incoming.kind.is_empty() {
        existing.kind = incoming.kind.clone();
    }
    if incoming
        .documentos_url
        .as_deref()
        .map_or(false, |u| !u.is_empty())
    {
        existing.documentos_url = incoming.documentos_url.clone();
    }
}

fn to_display_zone(mut conversation: Conversation) -> Conversation {
    conversation.date = conversation.date.map(text::to_display_zone);
    if let Some(messages) = conversation.messages.as_mut() {
        for message in messages {
            message.fecha = message.fecha.map(text::to_display_zone);
        }
    }
    conversation
}

impl ChatService {
    pub fn new(repository: Arc<ChatRepository>) -> Self {
        Self { repository }
    }

    pub async fn get_conversation_by_user(
        &self,
        user_id: &str,
        name: Option<&str>,
        from: Option<DateTime<FixedOffset>>,
        to: Option<DateTime<FixedOffset>>,
    ) -> Result<OperationResult, Box<dyn Error + Send + Sync>> {
        let listed = self
            .repository
            .get_conversation_by_user(user_id, name, from, to)
            .await?;

        let Some(conversations) = listed else {
            return Ok(OperationResult::conversation_not_found());
        };

        let converted: Vec<Conversation> =
            conversations.into_iter().map(to_display_zone).collect();
        Ok(OperationResult::ok(Some(serde_json::to_value(converted)?)))
    }

    pub async fn get_conversation_by_id(
        &self,
        user_id: &str,
        conversation_id: &str,
    ) -> Result<OperationResult, Box<dyn Error + Send + Sync>> {
        if user_id.is_empty() || conversation_id.is_empty() {
            // Both names are always listed, whichever one is missing.
            return Ok(OperationResult::ok(Some(serde_json::Value::String(
                format!("{} userId, conversationId", constants::PARAMS_REQUIRED),
            ))));
        }

        match self
            .repository
            .get_conversation_by_id(user_id, conversation_id)
            .await?
        {
            Some(conversation) => Ok(OperationResult::ok(Some(serde_json::to_value(
                to_display_zone(conversation),
            )?))),
            None => Ok(OperationResult::no_content(None)),
        }
    }

    /// Insert on first save, selective merge afterwards. New messages always
    /// get a fresh id and a current timestamp and are appended, never merged,
    /// so re-saving the same messages duplicates them by design.
    pub async fn save_conversation(
        &self,
        user_id: &str,
        incoming: Conversation,
    ) -> Result<OperationResult, Box<dyn Error + Send + Sync>> {
        let existing = self
            .repository
            .get_conversation_by_id(user_id, &incoming.uuid_conversation)
            .await?;

        match existing {
            None => {
                let mut conversation = incoming;
                conversation.date = Some(Utc::now().fixed_offset());
                conversation.estado = true;
                if conversation.messages.is_none() {
                    conversation.messages = Some(Vec::new());
                }
                self.repository.insert(user_id, &conversation).await?;
            }
            Some(mut stored) => {
                merge_conversation_fields(&mut stored, &incoming);
                if let Some(new_messages) = incoming.messages {
                    let target = stored.messages.get_or_insert_with(Vec::new);
                    for mut message in new_messages {
                        message.uuid = Uuid::new_v4().to_string();
                        message.fecha = Some(Utc::now().fixed_offset());
                        target.push(message);
                    }
                }
                self.repository.update(user_id, &stored).await?;
            }
        }

        Ok(OperationResult::ok(None))
    }

    /// Clears the whole message list.
    pub async fn update_messages(
        &self,
        user_id: &str,
        conversation_id: &str,
    ) -> Result<OperationResult, Box<dyn Error + Send + Sync>> {
        let Some(existing) = self
            .repository
            .get_conversation_by_id(user_id, conversation_id)
            .await?
        else {
            return Ok(OperationResult::conversation_not_found());
        };

        if existing.messages.is_none() {
            return Ok(OperationResult::messages_not_found());
        }

        let updated = self
            .repository
            .update_messages(user_id, conversation_id, &[])
            .await?;
        Ok(OperationResult::ok(Some(serde_json::to_value(updated)?)))
    }

    /// Merges incoming messages by `uuid`, overwriting only the text. When
    /// the stored list is empty the incoming list replaces it wholesale.
    pub async fn update_messages_merge(
        &self,
        user_id: &str,
        consult: ConsultRequest,
    ) -> Result<OperationResult, Box<dyn Error + Send + Sync>> {
        let Some(existing) = self
            .repository
            .get_conversation_by_id(user_id, &consult.conversation_id)
            .await?
        else {
            return Ok(OperationResult::conversation_not_found());
        };

        if existing.messages.is_none() {
            return Ok(OperationResult::messages_not_found());
        }
        let Some(incoming) = consult.messages else {
            return Ok(OperationResult::messages_not_found());
        };

        let mut messages = existing.messages.unwrap_or_default();
        if messages.is_empty() {
            messages = incoming;
        } else {
            for message in &incoming {
                if let Some(target) = messages.iter_mut().find(|m| m.uuid == message.uuid) {
                    target.message = message.message.clone();
                }
            }
        }

        let updated = self
            .repository
            .update_messages(user_id, &consult.conversation_id, &messages)
            .await?;
        Ok(OperationResult::ok(Some(serde_json::to_value(updated)?)))
    }

    pub async fn delete_conversation(
        &self,
        user_id: &str,
        conversation_id: &str,
        new_status: bool,
    ) -> Result<OperationResult, Box<dyn Error + Send + Sync>> {
        let existing = self
            .repository
            .get_conversation_by_id(user_id, conversation_id)
            .await?;

        match existing {
            Some(_) => {
                let deleted = self
                    .repository
                    .delete_conversation(user_id, conversation_id, new_status)
                    .await?;
                Ok(OperationResult::ok(Some(serde_json::Value::Bool(deleted))))
            }
            None => Ok(OperationResult::conversation_not_found()),
        }
    }

    pub async fn delete_conversations_by_ids(
        &self,
        user_id: &str,
        conversation_ids: &[String],
        new_status: bool,
    ) -> Result<OperationResult, Box<dyn Error + Send + Sync>> {
        let outcome = self
            .repository
            .delete_conversations_by_ids(user_id, conversation_ids, new_status)
            .await?;
        Ok(OperationResult::ok(Some(serde_json::Value::Bool(outcome))))
    }

    pub async fn delete_conversations_by_search(
        &self,
        user_id: &str,
        name: Option<&str>,
        from: Option<DateTime<FixedOffset>>,
        to: Option<DateTime<FixedOffset>>,
    ) -> Result<OperationResult, Box<dyn Error + Send + Sync>> {
        let outcome = self
            .repository
            .delete_conversations_by_search(user_id, name, from, to)
            .await?;
        Ok(OperationResult::ok(Some(serde_json::Value::Bool(outcome))))
    }

    /// Merges the incoming message's present fields onto the stored message
    /// with the same id, preserving its position in the list.
    pub async fn update_field_messages(
        &self,
        user_id: &str,
        conversation_id: &str,
        incoming: ChatMessage,
    ) -> Result<OperationResult, Box<dyn Error + Send + Sync>> {
        let Some(existing) = self
            .repository
            .get_conversation_by_id(user_id, conversation_id)
            .await?
        else {
            return Ok(OperationResult::conversation_not_found());
        };

        let mut messages = match existing.messages {
            Some(messages) if !messages.is_empty() => messages,
            _ => return Ok(OperationResult::messages_not_found()),
        };

        let Some(target) = messages.iter_mut().find(|m| m.uuid == incoming.uuid) else {
            return Ok(OperationResult::message_not_found_for_update());
        };

        merge_message_fields(target, &incoming);
        let merged = target.clone();

        let updated = self
            .repository
            .update_field_messages(user_id, conversation_id, &messages)
            .await?;

        let data = if updated {
            Some(serde_json::to_value(merged)?)
        } else {
            None
        };
        Ok(OperationResult::ok(data))
    }

    pub async fn update_field_conversation(
        &self,
        user_id: &str,
        conversation_id: &str,
        modelo_documento: Option<bool>,
    ) -> Result<OperationResult, Box<dyn Error + Send + Sync>> {
        let Some(mut existing) = self
            .repository
            .get_conversation_by_id(user_id, conversation_id)
            .await?
        else {
            return Ok(OperationResult::conversation_not_found());
        };

        existing.modelo_documento = modelo_documento;
        self.repository
            .update_field_conversation(user_id, conversation_id, modelo_documento)
            .await?;

        Ok(OperationResult::ok(Some(serde_json::to_value(existing)?)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryDocumentStore;
    use chrono::TimeZone;

    fn service() -> (ChatService, Arc<ChatRepository>) {
        let repository = Arc::new(ChatRepository::new(Arc::new(MemoryDocumentStore::new())));
        (ChatService::new(repository.clone()), repository)
    }

    fn message(uuid: &str, text_body: &str) -> ChatMessage {
        ChatMessage {
            id_persona: "user@test".into(),
            message: text_body.into(),
            fecha: None,
            uuid: uuid.into(),
            is_favorite: false,
            kind: "text".into(),
            documentos_url: None,
        }
    }

    #[tokio::test]
    async fn missing_params_message_is_identical_for_any_missing_param() {
        let (service, _) = service();
        for (user, conv) in [("", ""), ("u", ""), ("", "c")] {
            let result = service.get_conversation_by_id(user, conv).await.unwrap();
            assert!(result.success);
            assert_eq!(
                result.data,
                Some(serde_json::Value::String(
                    "Los siguientes parametros son obligatorios: userId, conversationId".into()
                ))
            );
        }
    }

    #[tokio::test]
    async fn get_by_id_missing_conversation_is_successful_no_content() {
        let (service, _) = service();
        let result = service.get_conversation_by_id("u", "ghost").await.unwrap();
        assert!(result.success);
        assert_eq!(result.message_http, constants::MSJ_204);
        assert_eq!(result.data, None);
    }

    #[tokio::test]
    async fn first_save_inserts_active_with_date_and_empty_messages() {
        let (service, repository) = service();
        service
            .save_conversation("u", Conversation::new("c1", "Hola"))
            .await
            .unwrap();

        let stored = repository
            .get_conversation_by_id("u", "c1")
            .await
            .unwrap()
            .unwrap();
        assert!(stored.estado);
        assert!(stored.date.is_some());
        assert_eq!(stored.messages, Some(Vec::new()));
    }

    #[tokio::test]
    async fn save_merges_fields_and_appends_messages_with_fresh_ids() {
        let (service, repository) = service();
        service
            .save_conversation("u", Conversation::new("c1", "Original"))
            .await
            .unwrap();

        let mut incoming = Conversation::new("c1", "Renombrada");
        incoming.modelo_documento = Some(true);
        let mut msg = message("client-supplied-id", "hola");
        msg.fecha = Some(
            Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0)
                .unwrap()
                .fixed_offset(),
        );
        incoming.messages = Some(vec![msg]);
        service.save_conversation("u", incoming).await.unwrap();

        let stored = repository
            .get_conversation_by_id("u", "c1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.name, "Renombrada");
        assert_eq!(stored.modelo_documento, Some(true));
        assert!(stored.estado);

        let messages = stored.messages.unwrap();
        assert_eq!(messages.len(), 1);
        // Client-supplied id and timestamp are discarded for new messages.
        assert_ne!(messages[0].uuid, "client-supplied-id");
        assert!(messages[0].fecha.unwrap().timestamp() > 946_684_800);
    }

    #[tokio::test]
    async fn save_with_empty_name_keeps_stored_name() {
        let (service, repository) = service();
        service
            .save_conversation("u", Conversation::new("c1", "Original"))
            .await
            .unwrap();
        service
            .save_conversation("u", Conversation::new("c1", ""))
            .await
            .unwrap();

        let stored = repository
            .get_conversation_by_id("u", "c1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.name, "Original");
    }

    #[tokio::test]
    async fn resaving_fields_is_idempotent_but_messages_duplicate() {
        let (service, repository) = service();
        service
            .save_conversation("u", Conversation::new("c1", "Hola"))
            .await
            .unwrap();

        for _ in 0..2 {
            let mut incoming = Conversation::new("c1", "Renombrada");
            incoming.messages = Some(vec![message("", "repetida")]);
            service.save_conversation("u", incoming).await.unwrap();
        }

        let stored = repository
            .get_conversation_by_id("u", "c1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.name, "Renombrada");
        // Appending, not merging: the same message saved twice is stored twice.
        assert_eq!(stored.messages.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn clear_messages_empties_the_list() {
        let (service, repository) = service();
        let mut conversation = Conversation::new("c1", "Hola");
        conversation.messages = Some(vec![message("m1", "uno")]);
        service.save_conversation("u", conversation).await.unwrap();

        let result = service.update_messages("u", "c1").await.unwrap();
        assert!(result.success);
        assert_eq!(result.message_http, constants::MSJ_200);

        let stored = repository
            .get_conversation_by_id("u", "c1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.messages, Some(Vec::new()));
    }

    #[tokio::test]
    async fn clear_messages_on_missing_conversation_returns_sentinel() {
        let (service, _) = service();
        let result = service.update_messages("u", "ghost").await.unwrap();
        assert!(result.success);
        assert_eq!(
            result.data,
            Some(serde_json::Value::String("La conversación no existe.".into()))
        );
    }

    #[tokio::test]
    async fn merge_messages_overwrites_only_matching_text() {
        let (service, repository) = service();
        service
            .save_conversation("u", Conversation::new("c1", "Hola"))
            .await
            .unwrap();
        // Append two messages, then look their server ids up.
        let mut incoming = Conversation::new("c1", "");
        incoming.messages = Some(vec![message("", "uno"), message("", "dos")]);
        service.save_conversation("u", incoming).await.unwrap();
        let stored = repository
            .get_conversation_by_id("u", "c1")
            .await
            .unwrap()
            .unwrap();
        let ids: Vec<String> = stored
            .messages
            .unwrap()
            .iter()
            .map(|m| m.uuid.clone())
            .collect();

        let consult = ConsultRequest {
            conversation_id: "c1".into(),
            status: None,
            conversation: None,
            messages: Some(vec![message(&ids[0], "uno editado"), message("ghost", "x")]),
        };
        service.update_messages_merge("u", consult).await.unwrap();

        let stored = repository
            .get_conversation_by_id("u", "c1")
            .await
            .unwrap()
            .unwrap();
        let messages = stored.messages.unwrap();
        assert_eq!(messages[0].message, "uno editado");
        assert_eq!(messages[1].message, "dos");
        assert_eq!(messages.len(), 2);
    }

    #[tokio::test]
    async fn merge_messages_replaces_wholesale_when_list_empty() {
        let (service, repository) = service();
        service
            .save_conversation("u", Conversation::new("c1", "Hola"))
            .await
            .unwrap();

        let consult = ConsultRequest {
            conversation_id: "c1".into(),
            status: None,
            conversation: None,
            messages: Some(vec![message("m1", "nuevo")]),
        };
        service.update_messages_merge("u", consult).await.unwrap();

        let stored = repository
            .get_conversation_by_id("u", "c1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.messages.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_missing_conversation_returns_sentinel() {
        let (service, _) = service();
        let result = service.delete_conversation("u", "ghost", false).await.unwrap();
        assert!(result.success);
        assert_eq!(result.message_http, constants::MSJ_204);
        assert_eq!(
            result.data,
            Some(serde_json::Value::String("La conversación no existe.".into()))
        );
    }

    #[tokio::test]
    async fn delete_flips_estado_without_removing_document() {
        let (service, repository) = service();
        service
            .save_conversation("u", Conversation::new("c1", "Hola"))
            .await
            .unwrap();

        let result = service.delete_conversation("u", "c1", false).await.unwrap();
        assert!(result.success);
        assert_eq!(result.data, Some(serde_json::Value::Bool(true)));

        let stored = repository
            .get_conversation_by_id("u", "c1")
            .await
            .unwrap()
            .unwrap();
        assert!(!stored.estado);
    }

    #[tokio::test]
    async fn favorite_flip_changes_only_that_field_and_keeps_position() {
        let (service, repository) = service();
        let mut conversation = Conversation::new("c1", "Hola");
        conversation.messages = Some(vec![message("", "")]);
        service.save_conversation("u", conversation).await.unwrap();
        let mut incoming = Conversation::new("c1", "");
        incoming.messages = Some(vec![message("", "uno"), message("", "dos")]);
        service.save_conversation("u", incoming).await.unwrap();

        let before = repository
            .get_conversation_by_id("u", "c1")
            .await
            .unwrap()
            .unwrap()
            .messages
            .unwrap();
        let target_id = before[1].uuid.clone();

        let mut flip = ChatMessage {
            uuid: target_id.clone(),
            ..message("", "")
        };
        flip.id_persona = String::new();
        flip.is_favorite = true;
        let result = service
            .update_field_messages("u", "c1", flip)
            .await
            .unwrap();
        assert!(result.success);

        let after = repository
            .get_conversation_by_id("u", "c1")
            .await
            .unwrap()
            .unwrap()
            .messages
            .unwrap();
        assert_eq!(after.len(), before.len());
        assert_eq!(after[1].uuid, target_id);
        assert!(after[1].is_favorite);
        assert_eq!(after[1].message, before[1].message);
        assert_eq!(after[0], before[0]);
    }

    #[tokio::test]
    async fn update_field_messages_unknown_id_returns_distinct_sentinel() {
        let (service, _) = service();
        let mut conversation = Conversation::new("c1", "Hola");
        conversation.messages = Some(vec![message("", "")]);
        service.save_conversation("u", conversation).await.unwrap();
        let mut incoming = Conversation::new("c1", "");
        incoming.messages = Some(vec![message("", "uno")]);
        service.save_conversation("u", incoming).await.unwrap();

        let result = service
            .update_field_messages("u", "c1", message("ghost", "x"))
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(
            result.data,
            Some(serde_json::Value::String(
                "No se encontró el mensaje a actualizar.".into()
            ))
        );
    }

    #[tokio::test]
    async fn update_field_conversation_sets_tri_state_flag() {
        let (service, repository) = service();
        service
            .save_conversation("u", Conversation::new("c1", "Hola"))
            .await
            .unwrap();

        for value in [Some(true), Some(false), None] {
            let result = service
                .update_field_conversation("u", "c1", value)
                .await
                .unwrap();
            assert!(result.success);
            let stored = repository
                .get_conversation_by_id("u", "c1")
                .await
                .unwrap()
                .unwrap();
            assert_eq!(stored.modelo_documento, value);
        }

        let missing = service
            .update_field_conversation("u", "ghost", Some(true))
            .await
            .unwrap();
        assert_eq!(missing.message_http, constants::MSJ_204);
    }

    #[tokio::test]
    async fn listing_converts_dates_to_display_zone() {
        let (service, repository) = service();
        let mut conversation = Conversation::new("c1", "Hola");
        conversation.estado = true;
        conversation.date = Some(
            Utc.with_ymd_and_hms(2024, 6, 1, 15, 0, 0)
                .unwrap()
                .fixed_offset(),
        );
        repository.insert("u", &conversation).await.unwrap();

        let result = service
            .get_conversation_by_user("u", None, None, None)
            .await
            .unwrap();
        let listed: Vec<Conversation> =
            serde_json::from_value(result.data.unwrap()).unwrap();
        assert_eq!(
            listed[0].date.unwrap().offset().local_minus_utc(),
            -5 * 3600
        );
    }

    #[tokio::test]
    async fn listing_for_unknown_user_reports_no_conversations() {
        let (service, _) = service();
        let result = service
            .get_conversation_by_user("ghost", None, None, None)
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.message_http, constants::MSJ_204);
        assert_eq!(
            result.data,
            Some(serde_json::Value::String("La conversación no existe.".into()))
        );
    }
}
