#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use cadence::catalog::library::{Library, LibraryIndex};
use cadence::catalog::{CatalogError, CatalogIndex, CatalogRecord};
use cadence::playback::{PlaybackEngine, PlaybackError};
use cadence::ratelimit::store::{MemoryStore, StoreError, TtlStore};
use cadence::stream::{StreamError, StreamServer, StreamStatus};

pub fn record(id: u64, title: &str, artist: &str, album: &str) -> CatalogRecord {
    CatalogRecord {
        id,
        title: title.to_string(),
        artist: artist.to_string(),
        album: album.to_string(),
        path: PathBuf::from(format!("/music/{id:03}.flac")),
    }
}

pub fn sample_library() -> Library {
    let mut library = Library::new();
    library.records = vec![
        record(1, "Only My Railgun", "fripSide", "infinite synthesis"),
        record(2, "Sister's Noise", "fripSide", "infinite synthesis 2"),
        record(3, "Byoushin wo Kamu", "ZUTOMAYO", "Zutomayo"),
        record(4, "Railgun Only", "Various", "Tribute"),
    ];
    library
}

pub fn sample_catalog() -> Arc<LibraryIndex> {
    Arc::new(LibraryIndex::new(sample_library()))
}

pub fn status(title: &str, artist: &str) -> StreamStatus {
    StreamStatus {
        title: title.to_string(),
        artist: artist.to_string(),
        host: "radio.example.com".to_string(),
        mountpoint: "cadence1".to_string(),
        listeners: 3,
        bitrate: 192,
    }
}

/// Playback engine that records what it was asked to queue.
#[derive(Default)]
pub struct FakeEngine {
    pub submitted: Mutex<Vec<PathBuf>>,
    pub skips: Mutex<usize>,
    pub refuse: bool,
    /// How long `skip` takes to answer.
    pub delay: Option<Duration>,
}

impl FakeEngine {
    pub fn refusing() -> Self {
        Self {
            refuse: true,
            ..Self::default()
        }
    }

    pub fn submitted(&self) -> Vec<PathBuf> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait]
impl PlaybackEngine for FakeEngine {
    async fn submit(&self, path: &Path) -> Result<(), PlaybackError> {
        if self.refuse {
            return Err(PlaybackError::Rejected("queue full".to_string()));
        }
        self.submitted.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }

    async fn skip(&self) -> Result<(), PlaybackError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.refuse {
            return Err(PlaybackError::Timeout(Duration::from_secs(1)));
        }
        *self.skips.lock().unwrap() += 1;
        Ok(())
    }
}

/// Stream server whose report is set by the test. `None` means unreachable.
#[derive(Default)]
pub struct FakeStream {
    pub current: Mutex<Option<StreamStatus>>,
}

impl FakeStream {
    pub fn reporting(status: StreamStatus) -> Self {
        Self {
            current: Mutex::new(Some(status)),
        }
    }

    pub fn set(&self, status: Option<StreamStatus>) {
        *self.current.lock().unwrap() = status;
    }
}

#[async_trait]
impl StreamServer for FakeStream {
    async fn status(&self) -> Result<StreamStatus, StreamError> {
        self.current
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| StreamError::NoSource("cadence1".to_string()))
    }
}

/// Catalog whose every call fails.
pub struct BrokenCatalog;

#[async_trait]
impl CatalogIndex for BrokenCatalog {
    async fn search(&self, _query: &str) -> Result<Vec<CatalogRecord>, CatalogError> {
        Err(CatalogError::Unavailable("index offline".to_string()))
    }

    async fn lookup_by_id(&self, _id: u64) -> Result<Option<CatalogRecord>, CatalogError> {
        Err(CatalogError::Unavailable("index offline".to_string()))
    }

    async fn lookup_by_title_artist(
        &self,
        _title: &str,
        _artist: &str,
    ) -> Result<Vec<CatalogRecord>, CatalogError> {
        Err(CatalogError::Unavailable("index offline".to_string()))
    }
}

/// Rate-limit store that cannot be reached.
pub struct UnreachableStore;

#[async_trait]
impl TtlStore for UnreachableStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Err(StoreError::Timeout(Duration::from_secs(1)))
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), StoreError> {
        Err(StoreError::Timeout(Duration::from_secs(1)))
    }

    async fn ttl(&self, _key: &str) -> Result<Option<Duration>, StoreError> {
        Err(StoreError::Timeout(Duration::from_secs(1)))
    }

    async fn incr_with_ttl(&self, _key: &str, _window: Duration) -> Result<u64, StoreError> {
        Err(StoreError::Timeout(Duration::from_secs(1)))
    }
}

/// In-memory store that yields to the scheduler before every round-trip,
/// like a networked store would.
#[derive(Default)]
pub struct YieldingStore {
    pub inner: MemoryStore,
}

#[async_trait]
impl TtlStore for YieldingStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        tokio::task::yield_now().await;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        tokio::task::yield_now().await;
        self.inner.set(key, value, ttl).await
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>, StoreError> {
        tokio::task::yield_now().await;
        self.inner.ttl(key).await
    }

    async fn incr_with_ttl(&self, key: &str, window: Duration) -> Result<u64, StoreError> {
        tokio::task::yield_now().await;
        self.inner.incr_with_ttl(key, window).await
    }
}

// ── Audio fixtures ────────────────────────────────────────────────────────────

fn crc8(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |mut crc, &b| {
        crc ^= b;
        for _ in 0..8 {
            crc = if crc & 0x80 != 0 { (crc << 1) ^ 0x07 } else { crc << 1 };
        }
        crc
    })
}

fn crc16(bytes: &[u8]) -> u16 {
    bytes.iter().fold(0u16, |mut crc, &b| {
        crc ^= (b as u16) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 { (crc << 1) ^ 0x8005 } else { crc << 1 };
        }
        crc
    })
}

fn flac_block(out: &mut Vec<u8>, kind: u8, last: bool, body: &[u8]) {
    out.push(if last { 0x80 | kind } else { kind });
    out.extend_from_slice(&(body.len() as u32).to_be_bytes()[1..]);
    out.extend_from_slice(body);
}

/// Write a tiny valid FLAC file: 192 samples of stereo 16-bit silence, with
/// `picture` as an embedded front cover when given.
pub fn write_flac(path: &Path, picture: Option<&[u8]>) {
    const BLOCK: u16 = 192;
    let mut out = b"fLaC".to_vec();

    let mut info = Vec::new();
    info.extend_from_slice(&BLOCK.to_be_bytes());
    info.extend_from_slice(&BLOCK.to_be_bytes());
    info.extend_from_slice(&[0; 6]); // frame sizes unknown
    // 20-bit sample rate, 3-bit channels-1, 5-bit bits-per-sample-1, 36-bit total
    let packed: u64 = (44_100u64 << 44) | (1 << 41) | (15 << 36) | BLOCK as u64;
    info.extend_from_slice(&packed.to_be_bytes());
    info.extend_from_slice(&[0; 16]); // md5 unset
    flac_block(&mut out, 0, picture.is_none(), &info);

    if let Some(data) = picture {
        let mime = b"image/png";
        let mut body = Vec::new();
        body.extend_from_slice(&3u32.to_be_bytes()); // front cover
        body.extend_from_slice(&(mime.len() as u32).to_be_bytes());
        body.extend_from_slice(mime);
        body.extend_from_slice(&0u32.to_be_bytes()); // description
        for dim in [1u32, 1, 24, 0] {
            body.extend_from_slice(&dim.to_be_bytes());
        }
        body.extend_from_slice(&(data.len() as u32).to_be_bytes());
        body.extend_from_slice(data);
        flac_block(&mut out, 6, true, &body);
    }

    // One fixed-blocksize frame: 192 samples, 44.1 kHz, two independent
    // channels, 16 bits, frame number 0.
    let mut frame = vec![0xFF, 0xF8, 0x19, 0x18, 0x00];
    frame.push(crc8(&frame));
    // Two CONSTANT subframes holding sample value 0.
    frame.extend_from_slice(&[0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);
    let crc = crc16(&frame);
    frame.extend_from_slice(&crc.to_be_bytes());
    out.extend_from_slice(&frame);

    std::fs::write(path, out).unwrap();
}

/// Write a short mono 16-bit PCM WAV file with no embedded metadata.
pub fn write_wav(path: &Path) {
    let data = [0u8; 320];
    let mut out = Vec::new();
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data.len() as u32).to_le_bytes());
    out.extend_from_slice(b"WAVEfmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM
    out.extend_from_slice(&1u16.to_le_bytes()); // mono
    out.extend_from_slice(&8_000u32.to_le_bytes());
    out.extend_from_slice(&16_000u32.to_le_bytes());
    out.extend_from_slice(&2u16.to_le_bytes());
    out.extend_from_slice(&16u16.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&(data.len() as u32).to_le_bytes());
    out.extend_from_slice(&data);
    std::fs::write(path, out).unwrap();
}
