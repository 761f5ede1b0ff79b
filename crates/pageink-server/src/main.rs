//! PageInk annotation server
//!
//! Stores one annotation set per document and serves the endpoints the
//! editor's HTTP storage talks to.
//!
//! ## Endpoints
//!
//! ```text
//! GET  /annotations/{documentId}  -> { "success": true, "annotations": { "<pageId>": [..] } }
//!                                    404 { "success": false, "annotations": {} } when absent
//! POST /annotations               <- { "documentId": "..", "annotations": { .. } }
//!                                 -> { "success": true }
//! GET  /health                    -> ok
//! ```
//!
//! `PAGEINK_ADDR` sets the listen address (default `0.0.0.0:3030`);
//! `PAGEINK_DATA_DIR` enables write-through to one JSON file per document,
//! named after the form-urlencoded document id.

mod store;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use pageink_core::AnnotationSet;
use pageink_core::protocol::{LoadResponse, SaveRequest, SaveResponse};
use std::{net::SocketAddr, path::PathBuf, sync::Arc};
use store::AnnotationStore;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

const DEFAULT_ADDR: &str = "0.0.0.0:3030";

/// Shared application state
struct AppState {
    store: AnnotationStore,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pageink_server=info,tower_http=info".into()),
        )
        .init();

    let addr: SocketAddr = std::env::var("PAGEINK_ADDR")
        .unwrap_or_else(|_| DEFAULT_ADDR.to_string())
        .parse()?;
    let store = match std::env::var_os("PAGEINK_DATA_DIR") {
        Some(dir) => {
            let store = AnnotationStore::persistent(PathBuf::from(dir)).await?;
            info!("Persisting annotations under {:?}", store.data_dir());
            store
        }
        None => {
            info!("PAGEINK_DATA_DIR not set; annotations kept in memory");
            AnnotationStore::in_memory()
        }
    };

    let app = router(Arc::new(AppState { store }));

    info!("PageInk annotation server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/annotations", post(save_annotations))
        .route("/annotations/{document_id}", get(load_annotations))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check
async fn health() -> &'static str {
    "ok"
}

/// Annotations of one document; 404 with an empty set when none are stored.
async fn load_annotations(
    State(state): State<Arc<AppState>>,
    Path(document_id): Path<String>,
) -> (StatusCode, Json<LoadResponse>) {
    match state.store.load(&document_id).await {
        Ok(Some(annotations)) => (
            StatusCode::OK,
            Json(LoadResponse {
                success: true,
                annotations,
            }),
        ),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(LoadResponse {
                success: false,
                annotations: AnnotationSet::new(),
            }),
        ),
        Err(e) => {
            warn!("Failed to load {}: {}", document_id, e);
            (StatusCode::INTERNAL_SERVER_ERROR, Json(LoadResponse::default()))
        }
    }
}

/// Replace a document's annotations.
async fn save_annotations(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SaveRequest>,
) -> (StatusCode, Json<SaveResponse>) {
    if request.document_id.trim().is_empty() {
        return (StatusCode::BAD_REQUEST, Json(SaveResponse { success: false }));
    }
    let pages = request.annotations.len();
    match state.store.save(&request.document_id, request.annotations).await {
        Ok(()) => {
            info!("Saved {} page(s) for {}", pages, request.document_id);
            (StatusCode::OK, Json(SaveResponse { success: true }))
        }
        Err(e) => {
            warn!("Failed to save {}: {}", request.document_id, e);
            (StatusCode::INTERNAL_SERVER_ERROR, Json(SaveResponse { success: false }))
        }
    }
}
