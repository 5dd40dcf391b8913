//! Rate-limit middleware.
//!
//! Clients are keyed by the connection's peer address only; forwarding
//! headers are client-controlled and ignored. A request without a peer
//! address fails extraction and is rejected with 500.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::ApiError;
use crate::http::state::AppState;
use crate::ratelimit::{Decision, Policy};

/// Gate for song request submission.
pub async fn limit_requests(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    req: Request,
    next: Next,
) -> Response {
    let policy = state.request_policy.clone();
    gate(&state, &policy, peer, req, next).await
}

/// Gate for album art fetches.
pub async fn limit_art(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    req: Request,
    next: Next,
) -> Response {
    let policy = state.art_policy.clone();
    gate(&state, &policy, peer, req, next).await
}

async fn gate(
    state: &AppState,
    policy: &Policy,
    peer: SocketAddr,
    req: Request,
    next: Next,
) -> Response {
    match state.limiter.admit(peer.ip(), policy).await {
        Ok(Decision::Allow) => next.run(req).await,
        Ok(Decision::Reject) => StatusCode::TOO_MANY_REQUESTS.into_response(),
        Ok(Decision::UseCached) => StatusCode::NOT_MODIFIED.into_response(),
        Err(e) => ApiError::dependency("rate-limit store", e).into_response(),
    }
}
