use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State, multipart::MultipartError},
    http::{HeaderMap, HeaderName, Method, StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::storage::Storage;

/// Shared application state for all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<Storage>,
    /// Multipart field carrying the file.
    pub field: String,
    pub max_body_bytes: usize,
}

/// Body of a `201 Created` upload response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFile {
    pub name: String,
    pub stored_as: String,
    pub size: u64,
    pub sha256: String,
    /// Non-file form fields sent alongside the file.
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
    /// File parts other than the stored one; received but not kept.
    #[serde(default)]
    pub extra_files: Vec<ExtraFile>,
}

/// A file part the receiver acknowledged without storing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraFile {
    pub field: String,
    pub file_name: Option<String>,
    pub size: u64,
}

const X_FILE_NAME: HeaderName = HeaderName::from_static("x-file-name");
const X_REQUESTED_WITH: HeaderName = HeaderName::from_static("x-requested-with");

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([
            header::ACCEPT,
            header::CACHE_CONTROL,
            header::CONTENT_TYPE,
            X_FILE_NAME,
            X_REQUESTED_WITH,
        ])
        .allow_credentials(false);

    let limit = state.max_body_bytes;

    Router::new()
        .route("/", post(receive_upload).put(receive_upload))
        .route("/upload", post(receive_upload).put(receive_upload))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// POST / (and /upload): store the file part of one multipart upload.
pub async fn receive_upload(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let header_name = headers
        .get(&X_FILE_NAME)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned());

    let mut file: Option<(String, axum::body::Bytes)> = None;
    let mut fields = BTreeMap::new();
    let mut extra_files = Vec::new();

    while let Some(part) = multipart.next_field().await.map_err(reject)? {
        let Some(name) = part.name().map(str::to_owned) else {
            continue;
        };

        if name == state.field && file.is_none() {
            let file_name = part
                .file_name()
                .filter(|n| !n.is_empty())
                .map(str::to_owned)
                .or_else(|| header_name.clone())
                .unwrap_or_default();
            let data = part.bytes().await.map_err(reject)?;
            file = Some((file_name, data));
        } else if name == state.field || part.file_name().is_some() {
            // Binary parts never go through `text()`.
            let file_name = part.file_name().map(str::to_owned);
            let data = part.bytes().await.map_err(reject)?;
            extra_files.push(ExtraFile {
                field: name,
                file_name,
                size: data.len() as u64,
            });
        } else {
            let text = part.text().await.map_err(reject)?;
            fields.insert(name, text);
        }
    }

    let Some((name, data)) = file else {
        warn!("Upload without a {:?} field rejected", state.field);
        return Err((
            StatusCode::BAD_REQUEST,
            format!("missing multipart field {:?}", state.field),
        ));
    };

    let saved = state.storage.save(&name, &data).await.map_err(|e| {
        warn!("Failed to store {:?}: {:#}", name, e);
        (StatusCode::INTERNAL_SERVER_ERROR, "storage error".to_string())
    })?;

    info!(
        "Stored {:?} as {} ({} bytes, sha256 {})",
        name, saved.stored_as, saved.size, saved.sha256
    );

    Ok((
        StatusCode::CREATED,
        Json(StoredFile {
            name,
            stored_as: saved.stored_as,
            size: saved.size,
            sha256: saved.sha256,
            fields,
            extra_files,
        }),
    ))
}

/// GET /health
pub async fn health() -> &'static str {
    "ok"
}

fn reject(err: MultipartError) -> (StatusCode, String) {
    warn!("Malformed multipart body: {}", err.body_text());
    (err.status(), err.body_text())
}
