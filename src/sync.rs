//! Now-playing synchronizer.
//!
//! Polls the stream server on a fixed period, resolves what it reports against
//! the catalog and publishes a new [`Station`](crate::station::Station)
//! snapshot. Ticks run strictly one after another.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;

use crate::catalog::{CatalogIndex, CatalogRecord};
use crate::station::{NowPlaying, Resolution, SongMeta, StationState, Transition};
use crate::stream::{StreamError, StreamServer};

#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub interval: Duration,
    /// Upper bound on one whole tick, external calls included.
    pub tick_timeout: Duration,
}

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Stream(#[from] StreamError),

    #[error("tick exceeded {0:?}")]
    Timeout(Duration),
}

pub struct Synchronizer {
    stream: Arc<dyn StreamServer>,
    catalog: Arc<dyn CatalogIndex>,
    state: Arc<StationState>,
}

impl Synchronizer {
    pub fn new(
        stream: Arc<dyn StreamServer>,
        catalog: Arc<dyn CatalogIndex>,
        state: Arc<StationState>,
    ) -> Self {
        Self {
            stream,
            catalog,
            state,
        }
    }

    /// One poll. On error nothing is published and the previous snapshot
    /// stays in place.
    pub async fn tick(&self) -> Result<Transition, SyncError> {
        let status = self.stream.status().await?;
        let current = self.state.snapshot();

        let resolution = if current.is_track_change(&status) {
            let ended = match current.now_playing() {
                Some(previous) => self.resolve_ended(previous).await,
                None => None,
            };
            Resolution {
                next: self.resolve(&status.title, &status.artist).await,
                ended,
            }
        } else {
            Resolution::default()
        };

        let (next, transition) = current.observe(&status, resolution, Utc::now());
        match transition {
            Transition::Started | Transition::Changed => {
                let now = next.now_playing();
                tracing::info!(
                    "Now playing \"{}\" by {}{}",
                    status.title,
                    status.artist,
                    if now.is_some_and(|n| n.record.is_none()) {
                        " (not in catalog)"
                    } else {
                        ""
                    }
                );
            }
            Transition::Refreshed => {
                tracing::debug!(
                    "Still playing \"{}\" ({} listeners, {} kbps)",
                    status.title,
                    status.listeners,
                    status.bitrate
                );
            }
        }
        self.state.publish(next);
        Ok(transition)
    }

    /// Best catalog candidate for a reported title and artist. Catalog
    /// failures degrade to "unresolved".
    async fn resolve(&self, title: &str, artist: &str) -> Option<CatalogRecord> {
        match self.catalog.lookup_by_title_artist(title, artist).await {
            Ok(records) => records.into_iter().next(),
            Err(e) => {
                tracing::warn!(dependency = "catalog", "Cannot resolve \"{}\": {}", title, e);
                None
            }
        }
    }

    async fn resolve_ended(&self, previous: &NowPlaying) -> Option<SongMeta> {
        self.resolve(&previous.reported_title, &previous.reported_artist)
            .await
            .map(|record| SongMeta::from(&record))
    }
}

/// Drive [`Synchronizer::tick`] every `config.interval` until shutdown.
///
/// A slow tick delays the next one instead of overlapping it; missed periods
/// are skipped, not replayed.
pub async fn run(
    sync: Synchronizer,
    config: SyncConfig,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(config.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let result = match tokio::time::timeout(config.tick_timeout, sync.tick()).await {
                    Ok(result) => result,
                    Err(_) => Err(SyncError::Timeout(config.tick_timeout)),
                };
                if let Err(e) = result {
                    tracing::warn!(dependency = "stream server", "Now-playing sync skipped: {}", e);
                }
            }
            _ = shutdown_rx.recv() => {
                tracing::debug!("Synchronizer: shutdown signal received");
                return;
            }
        }
    }
}
