use log::error;
use std::error::Error;
use std::sync::Arc;

use crate::models::registry::{PaginatedResponse, RegistryRow};
use crate::models::result::OperationResult;
use crate::render::{excel, pdf, ArtifactStore};
use crate::repository::ChatRepository;

/// Renders listing pages to a spreadsheet and single transcripts to PDF.
/// Artifacts are written to the scratch directory, returned base64-encoded
/// and deleted immediately; a failed delete is a hard failure.
pub struct ReportService {
    repository: Arc<ChatRepository>,
    artifacts: ArtifactStore,
}

impl ReportService {
    pub fn new(repository: Arc<ChatRepository>, artifacts: ArtifactStore) -> Self {
        Self {
            repository,
            artifacts,
        }
    }

    pub fn generate_excel(
        &self,
        report: &PaginatedResponse<RegistryRow>,
    ) -> Result<OperationResult, Box<dyn Error + Send + Sync>> {
        self.artifacts.ensure_dir()?;
        let output = self.artifacts.path_for(excel::WORKBOOK_FILE_NAME);

        excel::write_workbook(&report.items, &output).map_err(|e| {
            error!("Failed to write listing workbook: {}", e);
            e
        })?;
        let encoded = self.artifacts.encode_and_remove(&output).map_err(|e| {
            error!("Failed to encode workbook: {}", e);
            e
        })?;

        Ok(OperationResult::ok(Some(serde_json::Value::String(encoded))))
    }

    pub async fn generate_pdf(
        &self,
        user_id: &str,
        conversation_id: &str,
    ) -> Result<OperationResult, Box<dyn Error + Send + Sync>> {
        // Existence is checked before any rendering happens.
        let Some(conversation) = self
            .repository
            .get_conversation_by_id(user_id, conversation_id)
            .await?
        else {
            return Ok(OperationResult::conversation_not_found());
        };

        self.artifacts.ensure_dir()?;
        let output = self
            .artifacts
            .path_for(&pdf::transcript_file_name(&conversation.uuid_conversation));

        pdf::write_transcript(&conversation, user_id, &output).map_err(|e| {
            error!("Failed to write transcript pdf: {}", e);
            e
        })?;
        let encoded = self.artifacts.encode_and_remove(&output).map_err(|e| {
            error!("Failed to encode transcript pdf: {}", e);
            e
        })?;

        Ok(OperationResult::ok(Some(serde_json::Value::String(encoded))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants;
    use crate::models::chat::Conversation;
    use crate::store::MemoryDocumentStore;

    fn service(dir: &std::path::Path) -> (ReportService, Arc<ChatRepository>) {
        let repository = Arc::new(ChatRepository::new(Arc::new(MemoryDocumentStore::new())));
        (
            ReportService::new(repository.clone(), ArtifactStore::new(dir)),
            repository,
        )
    }

    #[tokio::test]
    async fn excel_returns_base64_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let (service, _) = service(dir.path());
        let report = PaginatedResponse {
            items: vec![RegistryRow {
                conversation_id: "c1".into(),
                user_name: "ana".into(),
                name: "Hola".into(),
                date: "01/06/2024 10:30 AM".into(),
                estado: "Activo".into(),
            }],
            page: 1,
            page_size: 10,
            total_items: 1,
            total_pages: 1,
        };

        let result = service.generate_excel(&report).unwrap();
        assert!(result.success);
        assert!(matches!(result.data, Some(serde_json::Value::String(ref s)) if !s.is_empty()));
        assert!(!dir.path().join(excel::WORKBOOK_FILE_NAME).exists());
    }

    #[tokio::test]
    async fn pdf_for_missing_conversation_short_circuits_before_rendering() {
        let dir = tempfile::tempdir().unwrap();
        let (service, _) = service(dir.path());

        let result = service.generate_pdf("ana", "ghost").await.unwrap();
        assert!(result.success);
        assert_eq!(result.message_http, constants::MSJ_204);
        assert_eq!(
            result.data,
            Some(serde_json::Value::String("La conversación no existe.".into()))
        );
        // Nothing was written.
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
    }

    #[tokio::test]
    async fn pdf_returns_base64_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let (service, repository) = service(dir.path());
        let mut conversation = Conversation::new("c1", "Hola");
        conversation.estado = true;
        repository.insert("ana", &conversation).await.unwrap();

        let result = service.generate_pdf("ana", "c1").await.unwrap();
        assert!(result.success);
        assert!(matches!(result.data, Some(serde_json::Value::String(ref s)) if !s.is_empty()));
        assert!(!dir.path().join(pdf::transcript_file_name("c1")).exists());
    }
}
