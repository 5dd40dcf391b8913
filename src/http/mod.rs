pub mod api;
pub mod limit;
pub mod state;

use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::http::state::AppState;

pub fn build_router(state: AppState) -> Router {
    // Song requests: one per client per window
    let requests = Router::new()
        .route("/api/request/id", post(api::request_id))
        .route("/api/request/bestmatch", post(api::request_best_match))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            limit::limit_requests,
        ));

    // Album art: graduated throttle, 304 once exhausted
    let art = Router::new()
        .route("/api/nowplaying/albumart", get(api::now_playing_album_art))
        .route_layer(middleware::from_fn_with_state(state.clone(), limit::limit_art));

    let mut router = Router::new()
        .route("/api/search", post(api::search))
        .route("/api/nowplaying/metadata", get(api::now_playing_metadata))
        .route("/api/history", get(api::history))
        .route("/api/listenurl", get(api::listen_url))
        .route("/api/listeners", get(api::listeners))
        .route("/api/bitrate", get(api::bitrate))
        .route("/api/version", get(api::version))
        .route("/ready", get(api::ready))
        .merge(requests)
        .merge(art);

    if state.dev_mode {
        router = router.route("/api/dev/skip", get(api::dev_skip));
    }

    router
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            state.request_timeout,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
