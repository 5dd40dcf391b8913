//! What is on air right now, and what played before it.
//!
//! The synchronizer is the only writer. It builds a new [`Station`] from the
//! previous one and swaps it in whole; handlers clone the `Arc` and read a
//! consistent snapshot without ever seeing a half-applied tick.

pub mod history;

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::catalog::CatalogRecord;
use crate::station::history::{History, HistoryEntry};
use crate::stream::StreamStatus;

/// Client-facing text metadata of a song.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SongMeta {
    pub title: String,
    pub artist: String,
    pub album: String,
}

impl From<&CatalogRecord> for SongMeta {
    fn from(record: &CatalogRecord) -> Self {
        Self {
            title: record.title.clone(),
            artist: record.artist.clone(),
            album: record.album.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NowPlaying {
    /// Title and artist exactly as the stream server reported them.
    pub reported_title: String,
    pub reported_artist: String,
    /// Catalog metadata when resolved, otherwise the reported text.
    pub song: SongMeta,
    /// `None` when the track is not in the catalog.
    pub record: Option<CatalogRecord>,
    pub host: String,
    pub mountpoint: String,
    pub listeners: u64,
    pub bitrate: u64,
}

impl NowPlaying {
    pub fn from_status(status: &StreamStatus, record: Option<CatalogRecord>) -> Self {
        let song = match &record {
            Some(record) => SongMeta::from(record),
            None => SongMeta {
                title: status.title.clone(),
                artist: status.artist.clone(),
                album: String::new(),
            },
        };
        Self {
            reported_title: status.title.clone(),
            reported_artist: status.artist.clone(),
            song,
            record,
            host: status.host.clone(),
            mountpoint: status.mountpoint.clone(),
            listeners: status.listeners,
            bitrate: status.bitrate,
        }
    }

    pub fn is_same_track(&self, status: &StreamStatus) -> bool {
        self.reported_title == status.title && self.reported_artist == status.artist
    }

    pub fn listen_url(&self) -> String {
        format!("{}/{}", self.host, self.mountpoint)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Playback {
    /// Nothing observed yet.
    #[default]
    Idle,
    Playing(NowPlaying),
}

/// Catalog lookups gathered for a track change.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// The newly reported track, if it is in the catalog.
    pub next: Option<CatalogRecord>,
    /// Full metadata of the track that just ended, if it could be looked up.
    pub ended: Option<SongMeta>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Idle → Playing.
    Started,
    /// Same track; volatile fields updated.
    Refreshed,
    /// Playing(a) → Playing(b); `a` appended to the history.
    Changed,
}

/// Immutable view of the station at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Station {
    pub playback: Playback,
    pub history: History,
}

impl Station {
    pub fn now_playing(&self) -> Option<&NowPlaying> {
        match &self.playback {
            Playback::Idle => None,
            Playback::Playing(now) => Some(now),
        }
    }

    /// Whether `status` would change the track, so the caller knows to
    /// gather a [`Resolution`] first.
    pub fn is_track_change(&self, status: &StreamStatus) -> bool {
        !self
            .now_playing()
            .is_some_and(|now| now.is_same_track(status))
    }

    /// Apply one observation of the stream server. The only transition
    /// that touches the history is a change from one playing track to
    /// another.
    pub fn observe(
        &self,
        status: &StreamStatus,
        resolution: Resolution,
        now: DateTime<Utc>,
    ) -> (Station, Transition) {
        match &self.playback {
            Playback::Playing(current) if current.is_same_track(status) => {
                let mut refreshed = current.clone();
                refreshed.listeners = status.listeners;
                refreshed.bitrate = status.bitrate;
                let next = Station {
                    playback: Playback::Playing(refreshed),
                    history: self.history.clone(),
                };
                (next, Transition::Refreshed)
            }
            Playback::Playing(current) => {
                let mut history = self.history.clone();
                history.push(HistoryEntry {
                    song: resolution.ended.unwrap_or_else(|| current.song.clone()),
                    ended_at: now,
                });
                let next = Station {
                    playback: Playback::Playing(NowPlaying::from_status(status, resolution.next)),
                    history,
                };
                (next, Transition::Changed)
            }
            Playback::Idle => {
                let next = Station {
                    playback: Playback::Playing(NowPlaying::from_status(status, resolution.next)),
                    history: self.history.clone(),
                };
                (next, Transition::Started)
            }
        }
    }
}

/// Process-wide station cell: one writer, many readers.
#[derive(Debug, Default)]
pub struct StationState {
    current: RwLock<Arc<Station>>,
}

impl StationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consistent copy of the whole station.
    pub fn snapshot(&self) -> Arc<Station> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&*guard),
            Err(poisoned) => Arc::clone(&*poisoned.into_inner()),
        }
    }

    /// Swap in a new station. Only the synchronizer calls this.
    pub fn publish(&self, station: Station) {
        let station = Arc::new(station);
        match self.current.write() {
            Ok(mut guard) => *guard = station,
            Err(poisoned) => *poisoned.into_inner() = station,
        }
    }
}
