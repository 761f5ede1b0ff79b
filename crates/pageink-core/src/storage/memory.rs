//! Annotation sets kept in process memory.

use super::{BoxFuture, Storage, StorageError, StorageResult};
use crate::annotation::AnnotationSet;
use std::collections::HashMap;
use std::sync::RwLock;

/// Storage that lives as long as the process; used by tests and previews.
#[derive(Default)]
pub struct MemoryStorage {
    documents: RwLock<HashMap<String, AnnotationSet>>,
}

impl MemoryStorage {
    /// Empty storage.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn save(&self, document_id: &str, annotations: &AnnotationSet) -> BoxFuture<'_, StorageResult<()>> {
        let id = document_id.to_string();
        let annotations = annotations.clone();
        Box::pin(async move {
            let mut docs = self
                .documents
                .write()
                .map_err(|e| StorageError::Other(format!("Lock error: {e}")))?;
            docs.insert(id, annotations);
            Ok(())
        })
    }

    fn load(&self, document_id: &str) -> BoxFuture<'_, StorageResult<AnnotationSet>> {
        let id = document_id.to_string();
        Box::pin(async move {
            let docs = self
                .documents
                .read()
                .map_err(|e| StorageError::Other(format!("Lock error: {e}")))?;
            docs.get(&id).cloned().ok_or(StorageError::NotFound(id))
        })
    }

    fn delete(&self, document_id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let id = document_id.to_string();
        Box::pin(async move {
            let mut docs = self
                .documents
                .write()
                .map_err(|e| StorageError::Other(format!("Lock error: {e}")))?;
            docs.remove(&id);
            Ok(())
        })
    }

    fn exists(&self, document_id: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let id = document_id.to_string();
        Box::pin(async move {
            let docs = self
                .documents
                .read()
                .map_err(|e| StorageError::Other(format!("Lock error: {e}")))?;
            Ok(docs.contains_key(&id))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{Annotation, AnnotationPoint, InkColor, ToolKind};
    use pollster::block_on;

    fn sample() -> AnnotationSet {
        let mut set = AnnotationSet::new();
        set.insert(
            "1".to_string(),
            vec![Annotation::new(
                ToolKind::Pen,
                InkColor::black(),
                2.0,
                1.0,
                vec![AnnotationPoint::new(0.0, 0.0), AnnotationPoint::new(1.0, 1.0)],
            )],
        );
        set
    }

    #[test]
    fn test_save_and_load() {
        let storage = MemoryStorage::new();
        block_on(storage.save("doc", &sample())).unwrap();
        assert_eq!(block_on(storage.load("doc")).unwrap(), sample());
    }

    #[test]
    fn test_not_found() {
        let storage = MemoryStorage::new();
        let result = block_on(storage.load("nonexistent"));
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_exists_and_delete() {
        let storage = MemoryStorage::new();
        assert!(!block_on(storage.exists("doc")).unwrap());
        block_on(storage.save("doc", &sample())).unwrap();
        assert!(block_on(storage.exists("doc")).unwrap());
        block_on(storage.delete("doc")).unwrap();
        assert!(!block_on(storage.exists("doc")).unwrap());
    }
}
