use serde::Serialize;
use std::error::Error;
use std::sync::Arc;
use uuid::Uuid;

use crate::cli::Args;
use crate::constants;
use crate::store::ObjectStore;

pub const MAX_UPLOAD_BYTES: u64 = 30 * 1024 * 1024;

const ALLOWED_EXTENSIONS: [&str; 5] = ["xlsx", "xls", "pdf", "docx", "doc"];

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedAsset {
    pub uri: String,
    pub original_name: String,
    pub size: u64,
}

/// Stores files uploaded for analysis into the configured bucket. Validation
/// (bucket configured, non-empty, size cap, extension whitelist) happens
/// before anything touches the store.
pub struct AssetService {
    store: Arc<dyn ObjectStore>,
    bucket: String,
}

impl AssetService {
    pub fn new(store: Arc<dyn ObjectStore>, bucket: impl Into<String>) -> Self {
        Self {
            store,
            bucket: bucket.into(),
        }
    }

    pub fn from_args(store: Arc<dyn ObjectStore>, args: &Args) -> Self {
        Self::new(store, args.assets_bucket.clone())
    }

    /// Rejections carry the literal message the route returns as a bad
    /// request.
    pub fn validate(&self, file_name: &str, size: u64) -> Result<(), &'static str> {
        if self.bucket.is_empty() {
            return Err(constants::BUCKET_NOT_CONFIGURED);
        }
        if size == 0 {
            return Err(constants::FILE_MISSING);
        }
        if size > MAX_UPLOAD_BYTES {
            return Err(constants::FILE_TOO_LARGE);
        }
        let extension = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase());
        match extension.as_deref() {
            Some(ext) if ALLOWED_EXTENSIONS.contains(&ext) => Ok(()),
            _ => Err(constants::FILE_TYPE_NOT_ALLOWED),
        }
    }

    pub async fn upload(
        &self,
        user_id: &str,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<UploadedAsset, Box<dyn Error + Send + Sync>> {
        let object = object_name(user_id, file_name);
        let uri = self.store.put_object(&self.bucket, &object, bytes).await?;
        Ok(UploadedAsset {
            uri,
            original_name: file_name.to_string(),
            size: bytes.len() as u64,
        })
    }
}

/// `{owner}-{uuid}-{file name}` with the owner's address flattened and
/// spaces replaced, so the object name is unique and path-safe.
fn object_name(user_id: &str, file_name: &str) -> String {
    let owner = user_id.replace('@', "_").replace('.', "_");
    format!("{}-{}-{}", owner, Uuid::new_v4(), file_name).replace(' ', "_")
}
