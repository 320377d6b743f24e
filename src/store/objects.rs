use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::cli::Args;
use crate::store::StoreError;

/// Bucketed blob storage for uploaded files. `put_object` returns the URI
/// under which the object is reachable.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put_object(
        &self,
        bucket: &str,
        object_name: &str,
        bytes: &[u8],
    ) -> Result<String, StoreError>;
}

/// Filesystem-backed object store: one directory per bucket under the base
/// directory.
pub struct FsObjectStore {
    base_dir: PathBuf,
}

impl FsObjectStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn put_object(
        &self,
        bucket: &str,
        object_name: &str,
        bytes: &[u8],
    ) -> Result<String, StoreError> {
        let dir = self.base_dir.join(bucket);
        tokio::fs::create_dir_all(&dir).await?;
        let path = dir.join(object_name);
        tokio::fs::write(&path, bytes).await?;
        Ok(format!("file://{}", path.display()))
    }
}

/// In-process object store for tests and local runs.
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: RwLock<HashMap<(String, String), Vec<u8>>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn object(&self, bucket: &str, object_name: &str) -> Option<Vec<u8>> {
        let objects = self.objects.read().await;
        objects
            .get(&(bucket.to_string(), object_name.to_string()))
            .cloned()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put_object(
        &self,
        bucket: &str,
        object_name: &str,
        bytes: &[u8],
    ) -> Result<String, StoreError> {
        let mut objects = self.objects.write().await;
        objects.insert(
            (bucket.to_string(), object_name.to_string()),
            bytes.to_vec(),
        );
        Ok(format!("mem://{}/{}", bucket, object_name))
    }
}

pub fn create_object_store(
    args: &Args,
) -> Result<Arc<dyn ObjectStore>, Box<dyn std::error::Error + Send + Sync>> {
    match args.asset_store_type.to_lowercase().as_str() {
        "local" => Ok(Arc::new(FsObjectStore::new(&args.assets_dir))),
        "memory" => Ok(Arc::new(MemoryObjectStore::new())),
        _ => Err(Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("Unsupported object store type: {}", args.asset_store_type),
        ))),
    }
}
