//! Storage abstraction for annotation persistence.

mod autosave;
mod file;
mod http;
mod memory;

pub use autosave::{PendingSave, PersistenceController};
pub use file::{FileStorage, document_file_name};
pub use http::HttpStorage;
pub use memory::MemoryStorage;

use crate::annotation::AnnotationSet;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Annotations not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("Save rejected by server: {0}")]
    Rejected(String),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed future returned by storage backends.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// A backend that stores whole per-page annotation sets by document id.
pub trait Storage: Send + Sync {
    /// Replace the stored annotations of a document.
    fn save(&self, document_id: &str, annotations: &AnnotationSet) -> BoxFuture<'_, StorageResult<()>>;

    /// Fetch the stored annotations of a document.
    ///
    /// Returns [`StorageError::NotFound`] when nothing was ever saved.
    fn load(&self, document_id: &str) -> BoxFuture<'_, StorageResult<AnnotationSet>>;

    /// Delete the stored annotations of a document.
    fn delete(&self, document_id: &str) -> BoxFuture<'_, StorageResult<()>>;

    /// Check whether annotations are stored for a document.
    fn exists(&self, document_id: &str) -> BoxFuture<'_, StorageResult<bool>>;
}
