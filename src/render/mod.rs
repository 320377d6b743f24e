pub mod excel;
pub mod pdf;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

/// Local scratch space for generated report files: write, read once as
/// base64, delete. A failed delete propagates and the encoded result is
/// discarded, so callers never see a partial success.
#[derive(Clone)]
pub struct ArtifactStore {
    base_dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn path_for(&self, file_name: &str) -> PathBuf {
        self.base_dir.join(file_name)
    }

    pub fn ensure_dir(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        fs::create_dir_all(&self.base_dir)?;
        Ok(())
    }

    pub fn encode_and_remove(&self, path: &Path) -> Result<String, Box<dyn Error + Send + Sync>> {
        let bytes = fs::read(path)?;
        let encoded = BASE64.encode(bytes);
        fs::remove_file(path)?;
        Ok(encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_and_remove_deletes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let path = store.path_for("out.bin");
        fs::write(&path, b"hola").unwrap();

        let encoded = store.encode_and_remove(&path).unwrap();
        assert_eq!(encoded, "aG9sYQ==");
        assert!(!path.exists());
    }

    #[test]
    fn missing_file_propagates_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        assert!(store.encode_and_remove(&store.path_for("ghost")).is_err());
    }
}
