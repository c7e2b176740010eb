use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use base64::Engine;
use chrono::Local;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::{
    alerts::{Alerts, Notification},
    catalog::Catalog,
    history::HistoryStore,
    models::{ClothingItem, HistoryRecord, Size, SizeRequest, TryOnResult},
    orchestrator::{Orchestrator, Outcome, EMPTY_SELECTION, MISSING_PHOTO},
    photo::PersonPhoto,
    selection::{Toggle, MAX_SELECTION},
    session::{Precondition, SessionView, SharedSession},
    tryon::preview,
};

const PHOTO_FIELD: &str = "photo";
const UPLOAD_LIMIT: usize = 20 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub session: SharedSession,
    pub catalog: Arc<Catalog>,
    pub history: Arc<HistoryStore>,
    pub alerts: Arc<Alerts>,
    pub orchestrator: Arc<Orchestrator>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/catalog", get(list_catalog))
        .route("/api/sizes", get(list_sizes))
        .route("/api/session", get(get_session))
        .route("/api/session/photo", post(upload_photo).delete(clear_photo))
        .route("/api/session/selection", delete(clear_selection))
        .route("/api/session/selection/:id", post(toggle_item))
        .route("/api/session/size", put(set_size))
        .route("/api/session/generate", post(generate))
        .route("/api/session/reset", post(reset_session))
        .route("/api/results/:index/download", get(download_result))
        .route("/api/results/:index/save", post(save_result))
        .route("/api/history", get(get_history).delete(clear_history))
        .route("/api/notifications", get(drain_notifications))
        .layer(DefaultBodyLimit::max(UPLOAD_LIMIT))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}

pub async fn list_catalog(State(state): State<AppState>) -> Json<Vec<ClothingItem>> {
    Json(state.catalog.items().to_vec())
}

pub async fn list_sizes() -> Json<Value> {
    Json(json!({ "sizes": Size::ALL, "default": Size::default() }))
}

pub async fn get_session(State(state): State<AppState>) -> Json<SessionView> {
    Json(state.session.read().view())
}

pub async fn upload_photo(State(state): State<AppState>, mut multipart: Multipart) -> Result<Json<SessionView>, (StatusCode, String)> {
    while let Some(field) = multipart.next_field().await.map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))? {
        if field.name() != Some(PHOTO_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
        let photo = PersonPhoto::from_upload(filename, bytes).map_err(|e| {
            state.alerts.error(e.to_string());
            (StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
        })?;

        tracing::info!("📸 Photo received: {} ({}x{}, {} bytes)", photo.filename, photo.width, photo.height, photo.bytes.len());
        let mut session = state.session.write();
        session.set_photo(photo);
        return Ok(Json(session.view()));
    }
    Err((StatusCode::BAD_REQUEST, format!("missing '{PHOTO_FIELD}' field")))
}

pub async fn clear_photo(State(state): State<AppState>) -> Json<SessionView> {
    let mut session = state.session.write();
    session.clear_photo();
    Json(session.view())
}

#[derive(Debug, Serialize)]
pub struct ToggleReply {
    pub toggle: Toggle,
    pub session: SessionView,
}

pub async fn toggle_item(Path(id): Path<String>, State(state): State<AppState>) -> Result<Json<ToggleReply>, StatusCode> {
    let item = state.catalog.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    let (toggle, view) = {
        let mut session = state.session.write();
        let toggle = session.toggle(item);
        (toggle, session.view())
    };
    if toggle == Toggle::AtCapacity {
        state.alerts.warning(format!("You can select up to {MAX_SELECTION} items"));
    }
    tracing::info!("👕 {:?} {} ({} selected)", toggle, item.id, view.selection.len());
    Ok(Json(ToggleReply { toggle, session: view }))
}

pub async fn clear_selection(State(state): State<AppState>) -> Json<SessionView> {
    let mut session = state.session.write();
    session.clear_selection();
    Json(session.view())
}

pub async fn set_size(State(state): State<AppState>, Json(body): Json<SizeRequest>) -> Result<Json<SessionView>, (StatusCode, String)> {
    let size: Size = body.size.parse().map_err(|e| (StatusCode::UNPROCESSABLE_ENTITY, e))?;
    let mut session = state.session.write();
    session.set_size(size);
    Ok(Json(session.view()))
}

#[derive(Debug, Serialize)]
pub struct GenerateReply {
    pub outcome: &'static str,
    pub message: Option<String>,
    pub session: SessionView,
}

pub async fn generate(State(state): State<AppState>) -> (StatusCode, Json<GenerateReply>) {
    let busy = state.session.read().is_busy();
    if busy {
        let session = state.session.read().view();
        let reply = GenerateReply { outcome: "busy", message: Some("A try-on is already running".into()), session };
        return (StatusCode::CONFLICT, Json(reply));
    }

    let outcome = state.orchestrator.generate(&state.session).await;
    let session = state.session.read().view();
    let (status, outcome, message) = match outcome {
        Outcome::Succeeded => (StatusCode::OK, "succeeded", None),
        Outcome::Rejected(missing) => {
            let message = match missing {
                Precondition::MissingPhoto => MISSING_PHOTO,
                Precondition::EmptySelection => EMPTY_SELECTION,
            };
            (StatusCode::BAD_REQUEST, "rejected", Some(message.to_string()))
        }
        Outcome::Failed(message) => (StatusCode::BAD_GATEWAY, "failed", Some(message)),
    };
    (status, Json(GenerateReply { outcome, message, session }))
}

pub async fn reset_session(State(state): State<AppState>) -> (StatusCode, Json<SessionView>) {
    let mut session = state.session.write();
    if session.is_busy() {
        return (StatusCode::CONFLICT, Json(session.view()));
    }
    session.reset();
    (StatusCode::OK, Json(session.view()))
}

fn find_result(state: &AppState, index: u32) -> Option<TryOnResult> {
    state.session.read().results().iter().find(|r| r.index == index).cloned()
}

/// Splits `data:<mime>;base64,<payload>` into its MIME type and bytes.
pub fn decode_data_url(url: &str) -> Option<(String, Vec<u8>)> {
    let rest = url.strip_prefix("data:")?;
    let (meta, payload) = rest.split_once(',')?;
    let mime = meta.strip_suffix(";base64")?;
    let bytes = base64::engine::general_purpose::STANDARD.decode(payload.trim()).ok()?;
    let mime = if mime.is_empty() { "application/octet-stream" } else { mime };
    Some((mime.to_string(), bytes))
}

pub async fn download_result(Path(index): Path<u32>, State(state): State<AppState>) -> Response {
    let Some(result) = find_result(&state, index) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    if !result.image.starts_with("data:") {
        return match HeaderValue::from_str(&result.image) {
            Ok(location) => (StatusCode::TEMPORARY_REDIRECT, [(header::LOCATION, location)]).into_response(),
            Err(_) => {
                tracing::error!("❌ Result {} is not a usable image URL: {}", index, preview(&result.image));
                StatusCode::UNPROCESSABLE_ENTITY.into_response()
            }
        };
    }
    match decode_data_url(&result.image) {
        Some((mime, bytes)) => {
            let ext = mime.rsplit('/').next().filter(|e| !e.is_empty()).unwrap_or("bin").to_string();
            let disposition = format!("attachment; filename=\"tryon_{}.{}\"", index, ext);
            (StatusCode::OK, [(header::CONTENT_TYPE, mime), (header::CONTENT_DISPOSITION, disposition)], bytes).into_response()
        }
        None => {
            tracing::error!("❌ Result {} is not a decodable data URL: {}", index, preview(&result.image));
            StatusCode::UNPROCESSABLE_ENTITY.into_response()
        }
    }
}

pub async fn save_result(Path(index): Path<u32>, State(state): State<AppState>) -> Result<Json<HistoryRecord>, StatusCode> {
    let result = find_result(&state, index).ok_or(StatusCode::NOT_FOUND)?;
    let record = HistoryRecord::new(result.image, Local::now());
    state.history.append(record.clone()).map_err(|e| {
        tracing::error!("❌ Could not save to history: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    state.alerts.success("Saved to history");
    Ok(Json(record))
}

pub async fn get_history(State(state): State<AppState>) -> Result<Json<Vec<HistoryRecord>>, StatusCode> {
    state.history.load().map(Json).map_err(|e| {
        tracing::error!("❌ Could not read history: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

pub async fn clear_history(State(state): State<AppState>) -> StatusCode {
    match state.history.clear() {
        Ok(()) => StatusCode::NO_CONTENT,
        Err(e) => {
            tracing::error!("❌ Could not clear history: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

pub async fn drain_notifications(State(state): State<AppState>) -> Json<Vec<Notification>> {
    Json(state.alerts.drain())
}
