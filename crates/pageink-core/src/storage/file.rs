//! File-based storage: one JSON file per document.

use super::{BoxFuture, Storage, StorageError, StorageResult};
use crate::annotation::{AnnotationSet, annotation_set_from_str};
use std::fs;
use std::path::{Path, PathBuf};
use url::form_urlencoded;

/// File name of a document: its id form-urlencoded, so distinct ids never share a file.
pub fn document_file_name(id: &str) -> String {
    let encoded: String = form_urlencoded::byte_serialize(id.as_bytes()).collect();
    format!("{encoded}.json")
}

/// Stores each document's annotation set as `{id}.json` under a base directory.
pub struct FileStorage {
    base_path: PathBuf,
}

impl FileStorage {
    /// Create a file storage rooted at `base_path`, creating the directory if needed.
    pub fn new(base_path: PathBuf) -> StorageResult<Self> {
        if !base_path.exists() {
            fs::create_dir_all(&base_path)
                .map_err(|e| StorageError::Io(format!("Failed to create storage directory: {e}")))?;
        }
        Ok(Self { base_path })
    }

    /// Create file storage in the platform data directory (`.../pageink/annotations`).
    pub fn default_location() -> StorageResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StorageError::Io("Could not determine data directory".to_string()))?;
        Self::new(base.join("pageink").join("annotations"))
    }

    fn document_path(&self, id: &str) -> PathBuf {
        self.base_path.join(document_file_name(id))
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

impl Storage for FileStorage {
    fn save(&self, document_id: &str, annotations: &AnnotationSet) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.document_path(document_id);
        let json = serde_json::to_string(annotations);
        Box::pin(async move {
            let json = json.map_err(|e| StorageError::Serialization(e.to_string()))?;
            // Replace atomically via a temp file.
            let tmp = path.with_extension("json.tmp");
            fs::write(&tmp, json).map_err(|e| StorageError::Io(format!("Failed to write {}: {e}", tmp.display())))?;
            fs::rename(&tmp, &path).map_err(|e| StorageError::Io(format!("Failed to replace {}: {e}", path.display())))
        })
    }

    fn load(&self, document_id: &str) -> BoxFuture<'_, StorageResult<AnnotationSet>> {
        let path = self.document_path(document_id);
        let id = document_id.to_string();
        Box::pin(async move {
            if !path.exists() {
                return Err(StorageError::NotFound(id));
            }
            let json = fs::read_to_string(&path)
                .map_err(|e| StorageError::Io(format!("Failed to read {}: {e}", path.display())))?;
            annotation_set_from_str(&json)
                .map_err(|e| StorageError::Serialization(format!("Failed to parse {}: {e}", path.display())))
        })
    }

    fn delete(&self, document_id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.document_path(document_id);
        Box::pin(async move {
            if path.exists() {
                fs::remove_file(&path)
                    .map_err(|e| StorageError::Io(format!("Failed to delete {}: {e}", path.display())))?;
            }
            Ok(())
        })
    }

    fn exists(&self, document_id: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let path = self.document_path(document_id);
        Box::pin(async move { Ok(path.exists()) })
    }
}
