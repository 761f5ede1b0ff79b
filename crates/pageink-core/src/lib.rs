//! PageInk Core Library
//!
//! Platform-agnostic annotation engine: persistent, undoable vector markup on
//! top of paginated raster documents.

pub mod annotation;
pub mod config;
pub mod document;
pub mod engine;
pub mod eraser;
pub mod geometry;
pub mod history;
pub mod input;
pub mod protocol;
pub mod shapes;
pub mod storage;
pub mod tools;

pub use annotation::{
    Annotation, AnnotationPoint, AnnotationSet, InkColor, PageId, ToolKind, annotation_set_from_str,
};
pub use config::{ConfigError, EngineConfig};
pub use document::{Document, Page, PageKind};
pub use engine::AnnotationEngine;
pub use eraser::{EraseOutcome, Eraser};
pub use history::{History, HistoryAction, HistoryEntry};
pub use input::{DeviceClass, PointerEvent, PointerPhase, Routing, route};
pub use shapes::{DrawOp, Label, ToolShape, shape_for};
pub use storage::{PersistenceController, Storage, StorageError, StorageResult};
pub use tools::{Preview, SessionOutput, SessionState, ToolSession, ToolSettings};
