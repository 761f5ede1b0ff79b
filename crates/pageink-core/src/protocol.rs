//! Request and response bodies of the annotation endpoints.

use crate::annotation::{AnnotationSet, deserialize_lenient};
use serde::{Deserialize, Serialize};

/// Response of `GET /annotations/{documentId}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadResponse {
    pub success: bool,
    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub annotations: AnnotationSet,
}

/// Body of `POST /annotations`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRequest {
    pub document_id: String,
    #[serde(deserialize_with = "deserialize_lenient")]
    pub annotations: AnnotationSet,
}

/// Response of `POST /annotations`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveResponse {
    pub success: bool,
}
