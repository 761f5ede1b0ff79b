//! Annotation sets held by the server, optionally mirrored to disk.

use dashmap::DashMap;
use pageink_core::storage::document_file_name;
use pageink_core::{AnnotationSet, StorageError, StorageResult, annotation_set_from_str};
use std::path::{Path, PathBuf};

/// Per-document annotation sets.
///
/// With a data directory every set is written through to a file named after
/// the encoded id (see [`document_file_name`]) and
/// documents missing from memory are looked up on disk.
pub struct AnnotationStore {
    documents: DashMap<String, AnnotationSet>,
    data_dir: Option<PathBuf>,
}

impl AnnotationStore {
    /// A store that forgets everything on restart.
    pub fn in_memory() -> Self {
        Self {
            documents: DashMap::new(),
            data_dir: None,
        }
    }

    /// A store persisted under `data_dir`, created if missing.
    pub async fn persistent(data_dir: PathBuf) -> StorageResult<Self> {
        tokio::fs::create_dir_all(&data_dir)
            .await
            .map_err(|e| StorageError::Io(format!("Failed to create {}: {e}", data_dir.display())))?;
        Ok(Self {
            documents: DashMap::new(),
            data_dir: Some(data_dir),
        })
    }

    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    fn document_path(&self, id: &str) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|dir| dir.join(document_file_name(id)))
    }

    /// Annotations of a document, `None` when nothing is stored.
    pub async fn load(&self, id: &str) -> StorageResult<Option<AnnotationSet>> {
        if let Some(set) = self.documents.get(id) {
            return Ok(Some(set.clone()));
        }
        let Some(path) = self.document_path(id) else {
            return Ok(None);
        };
        let json = match tokio::fs::read_to_string(&path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorageError::Io(format!("Failed to read {}: {e}", path.display()))),
        };
        let set = annotation_set_from_str(&json)
            .map_err(|e| StorageError::Serialization(format!("Failed to parse {}: {e}", path.display())))?;
        self.documents.insert(id.to_string(), set.clone());
        Ok(Some(set))
    }

    /// Replace a document's annotations. An empty set deletes the document.
    pub async fn save(&self, id: &str, annotations: AnnotationSet) -> StorageResult<()> {
        let empty = annotations.values().all(Vec::is_empty);
        if let Some(path) = self.document_path(id) {
            if empty {
                match tokio::fs::remove_file(&path).await {
                    Ok(()) => {}
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => return Err(StorageError::Io(format!("Failed to delete {}: {e}", path.display()))),
                }
            } else {
                let json =
                    serde_json::to_string(&annotations).map_err(|e| StorageError::Serialization(e.to_string()))?;
                let tmp = path.with_extension("json.tmp");
                tokio::fs::write(&tmp, json)
                    .await
                    .map_err(|e| StorageError::Io(format!("Failed to write {}: {e}", tmp.display())))?;
                tokio::fs::rename(&tmp, &path)
                    .await
                    .map_err(|e| StorageError::Io(format!("Failed to replace {}: {e}", path.display())))?;
            }
        }
        if empty {
            self.documents.remove(id);
        } else {
            self.documents.insert(id.to_string(), annotations);
        }
        Ok(())
    }

    /// Number of documents held in memory.
    pub fn cached(&self) -> usize {
        self.documents.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pageink_core::{Annotation, AnnotationPoint, InkColor, ToolKind};
    use tempfile::tempdir;

    fn sample() -> AnnotationSet {
        let mut set = AnnotationSet::new();
        set.insert(
            "2".to_string(),
            vec![Annotation::new(
                ToolKind::Rectangle,
                InkColor::new(0, 128, 0),
                2.0,
                1.0,
                vec![AnnotationPoint::new(5.0, 5.0), AnnotationPoint::new(40.0, 30.0)],
            )],
        );
        set
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = AnnotationStore::in_memory();
        assert_eq!(store.load("doc").await.unwrap(), None);
        store.save("doc", sample()).await.unwrap();
        assert_eq!(store.load("doc").await.unwrap(), Some(sample()));
        store.save("doc", AnnotationSet::new()).await.unwrap();
        assert_eq!(store.load("doc").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_persistent_store_survives_restart() {
        let dir = tempdir().unwrap();
        let store = AnnotationStore::persistent(dir.path().to_path_buf()).await.unwrap();
        store.save("class 3/a", sample()).await.unwrap();
        assert!(dir.path().join("class+3%2Fa.json").exists());

        let reopened = AnnotationStore::persistent(dir.path().to_path_buf()).await.unwrap();
        assert_eq!(reopened.cached(), 0);
        assert_eq!(reopened.load("class 3/a").await.unwrap(), Some(sample()));
        assert_eq!(reopened.cached(), 1);
    }

    #[tokio::test]
    async fn test_similar_ids_do_not_collide() {
        let dir = tempdir().unwrap();
        let store = AnnotationStore::persistent(dir.path().to_path_buf()).await.unwrap();
        store.save("a/b", sample()).await.unwrap();
        let mut other = sample();
        other.insert("9".to_string(), other["2"].clone());
        store.save("a_b", other.clone()).await.unwrap();

        let reopened = AnnotationStore::persistent(dir.path().to_path_buf()).await.unwrap();
        assert_eq!(reopened.load("a/b").await.unwrap(), Some(sample()));
        assert_eq!(reopened.load("a_b").await.unwrap(), Some(other));
    }

    #[tokio::test]
    async fn test_empty_save_deletes_file() {
        let dir = tempdir().unwrap();
        let store = AnnotationStore::persistent(dir.path().to_path_buf()).await.unwrap();
        store.save("doc", sample()).await.unwrap();
        store.save("doc", AnnotationSet::new()).await.unwrap();
        assert!(!dir.path().join("doc.json").exists());
        assert_eq!(store.load("doc").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_error() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("bad.json"), "[1, 2").unwrap();
        let store = AnnotationStore::persistent(dir.path().to_path_buf()).await.unwrap();
        assert!(matches!(store.load("bad").await, Err(StorageError::Serialization(_))));
    }
}
