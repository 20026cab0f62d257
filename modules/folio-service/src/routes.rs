//! Axum route handlers for the folio HTTP API.

use crate::middleware::{log_requests, require_bearer};
use axum::Router;
use axum::extract::{Form, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, put};
use folio_store::{Folio, FolioError, FolioStore};
use folio_types::*;
use std::sync::Arc;
use std::time::Instant;
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

pub struct AppState {
    pub store: Arc<FolioStore>,
    pub auth_token: String,
    pub start_time: Instant,
}

/// Routes with auth and access logging, without path normalization.
pub fn router(state: Arc<AppState>) -> Router {
    let folios = Router::new()
        .route("/folios", get(list_folios).post(create_folio))
        .route(
            "/folios/:name",
            get(list_notes).post(append_note).delete(delete_folio),
        )
        .route("/folios/:name/:index", put(edit_note))
        .route("/folios/:name/:index/done", get(toggle_done))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_bearer,
        ));

    Router::new()
        .route("/status", get(status))
        .merge(folios)
        .fallback(not_found)
        .layer(axum::middleware::from_fn(log_requests))
        .with_state(state)
}

/// The full application: trailing slashes are trimmed before routing.
pub fn app(state: Arc<AppState>) -> NormalizePath<Router> {
    let cors = tower_http::cors::CorsLayer::permissive();
    NormalizePathLayer::trim_trailing_slash().layer(router(state).layer(cors))
}

// =====================================================
// Errors
// =====================================================

#[derive(Debug)]
pub enum ApiError {
    Store(FolioError),
    BadIndex(String),
}

impl From<FolioError> for ApiError {
    fn from(err: FolioError) -> Self {
        ApiError::Store(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadIndex(raw) => {
                (StatusCode::BAD_REQUEST, format!("Invalid note index: {}", raw))
            }
            ApiError::Store(err) => match err {
                FolioError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
                FolioError::AlreadyExists(_) => {
                    (StatusCode::BAD_REQUEST, DUPLICATE_NAME_MESSAGE.to_string())
                }
                FolioError::OutOfRange { .. } => (StatusCode::BAD_REQUEST, err.to_string()),
                FolioError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
                FolioError::Io(_) | FolioError::Parse { .. } => {
                    log::error!("Storage failure: {}", err);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Internal server error".to_string(),
                    )
                }
            },
        };
        (status, message).into_response()
    }
}

fn lookup(state: &AppState, name: &str) -> Result<Arc<Folio>, ApiError> {
    state
        .store
        .get(name)
        .ok_or_else(|| FolioError::NotFound(name.to_string()).into())
}

/// Parses a 0-based index from the URL. Negative numbers are out of range.
fn note_index(raw: &str, folio: &Folio) -> Result<usize, ApiError> {
    let signed: i64 = raw
        .parse()
        .map_err(|_| ApiError::BadIndex(raw.to_string()))?;
    usize::try_from(signed).map_err(|_| {
        FolioError::OutOfRange {
            index: signed,
            len: folio.len(),
        }
        .into()
    })
}

// =====================================================
// Folio Endpoints
// =====================================================

// GET /folios
pub async fn list_folios(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(state.store.names())
}

// POST /folios
pub async fn create_folio(
    State(state): State<Arc<AppState>>,
    Form(form): Form<CreateFolioForm>,
) -> Result<StatusCode, ApiError> {
    if !is_valid_folio_name(&form.name) {
        return Err(FolioError::Validation(INVALID_NAME_MESSAGE.to_string()).into());
    }
    state.store.create(&form.name)?;
    log::info!("Created folio named {}", form.name);
    Ok(StatusCode::CREATED)
}

// DELETE /folios/:name
pub async fn delete_folio(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.store.remove(&name)?;
    log::info!("Deleted folio {}", name);
    Ok(StatusCode::OK)
}

// =====================================================
// Note Endpoints
// =====================================================

// GET /folios/:name
pub async fn list_notes(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<Vec<String>>, ApiError> {
    let folio = lookup(&state, &name)?;
    let lines = folio.notes().iter().map(|n| n.display_line()).collect();
    Ok(Json(lines))
}

// POST /folios/:name
pub async fn append_note(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Form(form): Form<NoteForm>,
) -> Result<StatusCode, ApiError> {
    let folio = lookup(&state, &name)?;
    let note = folio.append(form.note)?;
    log::info!("Created note {} in folio {}", note.index(), name);
    Ok(StatusCode::CREATED)
}

// PUT /folios/:name/:index
pub async fn edit_note(
    State(state): State<Arc<AppState>>,
    Path((name, index)): Path<(String, String)>,
    Form(form): Form<NoteForm>,
) -> Result<StatusCode, ApiError> {
    let folio = lookup(&state, &name)?;
    let index = note_index(&index, &folio)?;
    folio.edit(index, form.note)?;
    log::info!("Edited note {} in folio {}", index, name);
    Ok(StatusCode::OK)
}

// GET /folios/:name/:index/done
pub async fn toggle_done(
    State(state): State<Arc<AppState>>,
    Path((name, index)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let folio = lookup(&state, &name)?;
    let index = note_index(&index, &folio)?;
    folio.toggle_done(index)?;
    log::info!("Toggled done on note {} in folio {}", index, name);
    Ok(StatusCode::CREATED)
}

// =====================================================
// Service
// =====================================================

// GET /status
pub async fn status(State(state): State<Arc<AppState>>) -> Json<ServiceStatus> {
    Json(ServiceStatus {
        running: true,
        uptime_secs: state.start_time.elapsed().as_secs(),
        folio_count: state.store.len(),
    })
}

pub async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}
