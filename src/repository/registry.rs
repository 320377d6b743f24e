use chrono::{DateTime, FixedOffset};
use log::error;
use std::error::Error;
use std::sync::Arc;

use crate::constants;
use crate::models::chat::Conversation;
use crate::models::registry::RegistryRow;
use crate::store::DocumentStore;
use crate::text;

/// Cross-user queries: distinct user listing and the flattened conversation
/// projection used by the administrative registry.
pub struct RegistryRepository {
    store: Arc<dyn DocumentStore>,
}

impl RegistryRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn get_users(&self) -> Result<Vec<String>, Box<dyn Error + Send + Sync>> {
        let users = self.store.list_users().await.map_err(|e| {
            error!("Failed to list users: {}", e);
            e
        })?;
        Ok(users)
    }

    /// Collection-group scan, or a single-user scan when `name` is given.
    /// `name` means an exact user id on this path, not a free-text search.
    /// Date bounds are day-granular, the upper one rolled to end of day; the
    /// sort on date defaults to descending when the flag is unset. Returns
    /// `None` only when the named user has no conversation collection.
    pub async fn get_all_conversations(
        &self,
        name: Option<&str>,
        from: Option<DateTime<FixedOffset>>,
        to: Option<DateTime<FixedOffset>>,
        status: Option<bool>,
        is_descending: Option<bool>,
    ) -> Result<Option<Vec<RegistryRow>>, Box<dyn Error + Send + Sync>> {
        let mut scanned: Vec<(String, Conversation)> = Vec::new();
        match name.filter(|n| !n.is_empty()) {
            Some(user_id) => {
                let Some(conversations) = self.store.list(user_id).await? else {
                    return Ok(None);
                };
                scanned.extend(conversations.into_iter().map(|c| (user_id.to_string(), c)));
            }
            None => {
                for user_id in self.store.list_users().await? {
                    if let Some(conversations) = self.store.list(&user_id).await? {
                        scanned.extend(conversations.into_iter().map(|c| (user_id.clone(), c)));
                    }
                }
            }
        }

        let lower = from.and_then(start_of_day);
        let upper = to.and_then(end_of_day);

        let mut matched: Vec<(String, Conversation)> = scanned
            .into_iter()
            .filter(|(_, c)| lower.map_or(true, |b| c.date.map_or(false, |d| d >= b)))
            .filter(|(_, c)| upper.map_or(true, |b| c.date.map_or(false, |d| d <= b)))
            .filter(|(_, c)| status.map_or(true, |s| c.estado == s))
            .collect();

        let epoch = DateTime::UNIX_EPOCH.fixed_offset();
        matched.sort_by_key(|(_, c)| c.date.unwrap_or(epoch));
        if is_descending.unwrap_or(true) {
            matched.reverse();
        }

        let rows = matched
            .into_iter()
            .map(|(user_id, c)| RegistryRow {
                conversation_id: c.uuid_conversation,
                user_name: user_id,
                name: c.name,
                date: c.date.map(text::format_display_date).unwrap_or_default(),
                estado: if c.estado {
                    constants::STATUS_ACTIVE.to_string()
                } else {
                    constants::STATUS_INACTIVE.to_string()
                },
            })
            .collect();

        Ok(Some(rows))
    }
}

fn start_of_day(bound: DateTime<FixedOffset>) -> Option<DateTime<FixedOffset>> {
    bound
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .and_then(|dt| dt.and_local_timezone(*bound.offset()).single())
}

fn end_of_day(bound: DateTime<FixedOffset>) -> Option<DateTime<FixedOffset>> {
    bound
        .date_naive()
        .and_hms_opt(23, 59, 59)
        .and_then(|dt| dt.and_local_timezone(*bound.offset()).single())
}
