use serde::{Deserialize, Serialize};

/// Flattened per-conversation projection for the cross-user administrative
/// listing. Computed on every query, never persisted; date arrives already
/// formatted and status already translated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryRow {
    pub conversation_id: String,
    pub user_name: String,
    pub name: String,
    pub date: String,
    pub estado: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
}
