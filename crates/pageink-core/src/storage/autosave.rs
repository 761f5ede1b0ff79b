//! Persistence controller: load, dirty-gated save, autosave and teardown save.

use crate::annotation::AnnotationSet;
use crate::engine::AnnotationEngine;
use crate::storage::{Storage, StorageError, StorageResult};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A save captured at a point in time. Edits made after capture are not part of it.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSave {
    pub document_id: String,
    /// Engine revision the snapshot reflects.
    pub revision: u64,
    pub annotations: AnnotationSet,
}

/// Moves annotation sets between an [`AnnotationEngine`] and a [`Storage`] backend.
pub struct PersistenceController<S: Storage> {
    storage: Arc<S>,
    document_id: String,
    interval: Duration,
    /// Last save attempt (or load), successful or not.
    last_attempt: Option<Instant>,
}

impl<S: Storage> PersistenceController<S> {
    pub fn new(storage: Arc<S>, document_id: impl Into<String>, interval: Duration) -> Self {
        Self {
            storage,
            document_id: document_id.into(),
            interval,
            last_attempt: None,
        }
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    /// Load stored annotations into the engine.
    ///
    /// Absence or failure leaves the engine with an empty set. Returns the
    /// number of annotations loaded.
    pub async fn load(&mut self, engine: &mut AnnotationEngine) -> usize {
        let set = match self.storage.load(&self.document_id).await {
            Ok(set) => set,
            Err(StorageError::NotFound(_)) => {
                log::info!("no stored annotations for {}", self.document_id);
                AnnotationSet::new()
            }
            Err(e) => {
                log::warn!("failed to load annotations for {}: {e}", self.document_id);
                AnnotationSet::new()
            }
        };
        engine.load_annotations(set);
        self.last_attempt = Some(Instant::now());
        engine.history().len()
    }

    /// Capture a save of the engine's live state, or `None` when nothing changed.
    pub fn prepare_save(&self, engine: &AnnotationEngine) -> Option<PendingSave> {
        if !engine.is_dirty() {
            return None;
        }
        let (revision, annotations) = engine.save_snapshot();
        Some(PendingSave {
            document_id: self.document_id.clone(),
            revision,
            annotations,
        })
    }

    /// Submit a captured save. Resolves to the revision that was stored.
    pub async fn submit(&self, pending: PendingSave) -> StorageResult<u64> {
        self.storage.save(&pending.document_id, &pending.annotations).await?;
        Ok(pending.revision)
    }

    /// Save if dirty. Returns whether a save was performed.
    ///
    /// On failure the engine stays dirty so the next tick retries.
    pub async fn save(&mut self, engine: &mut AnnotationEngine) -> StorageResult<bool> {
        self.save_at(engine, Instant::now()).await
    }

    async fn save_at(&mut self, engine: &mut AnnotationEngine, now: Instant) -> StorageResult<bool> {
        let Some(pending) = self.prepare_save(engine) else {
            return Ok(false);
        };
        self.last_attempt = Some(now);
        let count: usize = pending.annotations.values().map(Vec::len).sum();
        match self.submit(pending).await {
            Ok(revision) => {
                engine.mark_saved(revision);
                log::info!("saved {count} annotation(s) for {}", self.document_id);
                Ok(true)
            }
            Err(e) => {
                log::warn!("save failed for {}: {e}", self.document_id);
                Err(e)
            }
        }
    }

    /// Whether the autosave timer is due at `now`.
    pub fn should_save(&self, engine: &AnnotationEngine, now: Instant) -> bool {
        if !engine.is_dirty() {
            return false;
        }
        match self.last_attempt {
            Some(last) => now.saturating_duration_since(last) >= self.interval,
            None => true,
        }
    }

    /// Autosave timer callback: save when dirty and the interval has elapsed.
    pub async fn autosave_tick(&mut self, engine: &mut AnnotationEngine, now: Instant) -> StorageResult<bool> {
        if !self.should_save(engine, now) {
            return Ok(false);
        }
        self.save_at(engine, now).await
    }

    /// Best-effort blocking save for teardown paths (page hide, exit).
    pub fn save_on_teardown(&mut self, engine: &mut AnnotationEngine) -> bool {
        match pollster::block_on(self.save(engine)) {
            Ok(saved) => saved,
            Err(e) => {
                log::warn!("teardown save failed: {e}");
                false
            }
        }
    }
}
