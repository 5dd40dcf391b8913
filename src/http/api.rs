//! JSON API handlers. Field names match what existing station clients send
//! and expect.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use base64::Engine as _;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use crate::catalog::metadata::read_picture;
use crate::catalog::CatalogRecord;
use crate::error::ApiError;
use crate::http::state::AppState;
use crate::station::history::HistoryEntry;

#[derive(Deserialize)]
struct SearchBody {
    search: String,
}

#[derive(Deserialize)]
struct RequestIdBody {
    #[serde(rename = "ID")]
    id: String,
}

#[derive(Deserialize)]
struct BestMatchBody {
    #[serde(rename = "Search")]
    search: String,
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::Validation(e.to_string()))
}

/// POST /api/search: ranked metadata of matching songs (paths withheld).
pub async fn search(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Vec<CatalogRecord>>, ApiError> {
    let SearchBody { search } = decode(&body)?;
    let results = state
        .catalog
        .search(&search)
        .await
        .map_err(|e| ApiError::dependency("catalog", e))?;
    Ok(Json(results))
}

/// POST /api/request/id: queue a song by catalog ID.
pub async fn request_id(State(state): State<AppState>, body: Bytes) -> Result<StatusCode, ApiError> {
    let RequestIdBody { id } = decode(&body)?;
    state.pipeline.by_id(&id).await?;
    Ok(StatusCode::ACCEPTED)
}

/// POST /api/request/bestmatch: queue the top search result.
pub async fn request_best_match(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let BestMatchBody { search } = decode(&body)?;
    state.pipeline.best_match(&search).await?;
    Ok(StatusCode::ACCEPTED)
}

/// GET /api/nowplaying/metadata
pub async fn now_playing_metadata(State(state): State<AppState>) -> Response {
    let station = state.station.snapshot();
    match station.now_playing().and_then(|now| now.record.as_ref()) {
        Some(record) => Json(record).into_response(),
        None => {
            tracing::warn!("The playing song is not resolved in the catalog");
            StatusCode::NOT_FOUND.into_response()
        }
    }
}

/// GET /api/nowplaying/albumart: base64 cover art embedded in the playing file.
pub async fn now_playing_album_art(State(state): State<AppState>) -> Result<Response, ApiError> {
    let station = state.station.snapshot();
    let Some(record) = station.now_playing().and_then(|now| now.record.clone()) else {
        return Ok(StatusCode::NOT_FOUND.into_response());
    };

    let path = record.path.clone();
    let picture = tokio::task::spawn_blocking(move || read_picture(&path))
        .await
        .map_err(|e| ApiError::dependency("art extraction", e))?
        .map_err(|e| ApiError::dependency("art extraction", e))?;

    Ok(match picture {
        Some(bytes) => Json(json!({
            "Picture": base64::engine::general_purpose::STANDARD.encode(bytes),
        }))
        .into_response(),
        None => {
            tracing::debug!("No embedded art in {}", record.path.display());
            StatusCode::NO_CONTENT.into_response()
        }
    })
}

/// GET /api/history: finished tracks, oldest first.
pub async fn history(State(state): State<AppState>) -> Json<Vec<HistoryEntry>> {
    let station = state.station.snapshot();
    Json(station.history.entries().cloned().collect())
}

/// GET /api/listenurl
pub async fn listen_url(State(state): State<AppState>) -> Response {
    match state.station.snapshot().now_playing() {
        Some(now) => Json(json!({ "ListenURL": now.listen_url() })).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// GET /api/listeners
pub async fn listeners(State(state): State<AppState>) -> impl IntoResponse {
    let listeners = state
        .station
        .snapshot()
        .now_playing()
        .map_or(0, |now| now.listeners);
    Json(json!({ "Listeners": listeners }))
}

/// GET /api/bitrate: stream bitrate in kbps.
pub async fn bitrate(State(state): State<AppState>) -> impl IntoResponse {
    let bitrate = state
        .station
        .snapshot()
        .now_playing()
        .map_or(0, |now| now.bitrate);
    Json(json!({ "Bitrate": bitrate }))
}

/// GET /api/version
pub async fn version(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({ "Version": state.version }))
}

/// GET /ready
pub async fn ready() -> StatusCode {
    StatusCode::OK
}

/// GET /api/dev/skip: only routed in development mode.
pub async fn dev_skip(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    state
        .engine
        .skip()
        .await
        .map_err(|e| ApiError::dependency("playback engine", e))?;
    Ok(StatusCode::OK)
}
