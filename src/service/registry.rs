use chrono::{DateTime, FixedOffset};
use std::error::Error;
use std::sync::Arc;

use crate::models::registry::PaginatedResponse;
use crate::models::result::OperationResult;
use crate::repository::RegistryRepository;

/// Wraps the registry repository with in-memory page/offset pagination.
pub struct RegistryService {
    repository: Arc<RegistryRepository>,
}

impl RegistryService {
    pub fn new(repository: Arc<RegistryRepository>) -> Self {
        Self { repository }
    }

    pub async fn get_users(&self) -> Result<OperationResult, Box<dyn Error + Send + Sync>> {
        let users = self.repository.get_users().await?;
        Ok(OperationResult::ok(Some(serde_json::to_value(users)?)))
    }

    /// Pages the full result set in memory. A page beyond range or a zero
    /// page size yields an empty item slice, never an error.
    pub async fn get_all(
        &self,
        page: usize,
        page_size: usize,
        name: Option<&str>,
        from: Option<DateTime<FixedOffset>>,
        to: Option<DateTime<FixedOffset>>,
        status: Option<bool>,
        is_descending: Option<bool>,
    ) -> Result<OperationResult, Box<dyn Error + Send + Sync>> {
        let listed = self
            .repository
            .get_all_conversations(name, from, to, status, is_descending)
            .await?;

        let Some(rows) = listed else {
            return Ok(OperationResult::ok(None));
        };

        let total_items = rows.len();
        let total_pages = if page_size == 0 {
            0
        } else {
            total_items.div_ceil(page_size)
        };

        let items = rows
            .into_iter()
            .skip(page.saturating_sub(1).saturating_mul(page_size))
            .take(page_size)
            .collect();

        let response = PaginatedResponse {
            items,
            page,
            page_size,
            total_items,
            total_pages,
        };

        Ok(OperationResult::ok(Some(serde_json::to_value(response)?)))
    }
}
