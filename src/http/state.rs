use std::sync::Arc;
use std::time::Duration;

use crate::catalog::CatalogIndex;
use crate::playback::PlaybackEngine;
use crate::ratelimit::{store::TtlStore, Policy, RateLimiter};
use crate::request::RequestPipeline;
use crate::station::StationState;

/// Shared application state injected into all route handlers via axum::extract::State.
/// Every field is cheap to clone; the station cell is written only by the synchronizer.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn CatalogIndex>,
    pub engine: Arc<dyn PlaybackEngine>,
    pub pipeline: RequestPipeline,
    pub limiter: RateLimiter,
    pub request_policy: Arc<Policy>,
    pub art_policy: Arc<Policy>,
    pub station: Arc<StationState>,
    pub version: String,
    pub dev_mode: bool,
    /// Per-request deadline.
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(
        catalog: Arc<dyn CatalogIndex>,
        engine: Arc<dyn PlaybackEngine>,
        store: Arc<dyn TtlStore>,
        station: Arc<StationState>,
        request_window: Duration,
    ) -> Self {
        Self {
            pipeline: RequestPipeline::new(Arc::clone(&catalog), Arc::clone(&engine)),
            catalog,
            engine,
            limiter: RateLimiter::new(store),
            request_policy: Arc::new(Policy::request(request_window)),
            art_policy: Arc::new(Policy::art()),
            station,
            version: env!("CADENCE_BUILD_VERSION").to_string(),
            dev_mode: false,
            request_timeout: Duration::from_secs(10),
        }
    }
}
