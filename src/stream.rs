//! Stream server client.
//!
//! Icecast publishes mount statistics at `/status-json.xsl`. The station cares
//! about one mount: what it is playing, where listeners connect, how many
//! there are and at what bitrate.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Deserializer};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StreamStatus {
    pub title: String,
    pub artist: String,
    pub host: String,
    pub mountpoint: String,
    pub listeners: u64,
    pub bitrate: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("stream server request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("stream server reports no source on {0}")]
    NoSource(String),
}

#[async_trait]
pub trait StreamServer: Send + Sync {
    async fn status(&self) -> Result<StreamStatus, StreamError>;
}

#[derive(Debug, Deserialize)]
struct StatusDocument {
    icestats: IceStats,
}

#[derive(Debug, Deserialize)]
struct IceStats {
    #[serde(default)]
    host: String,
    #[serde(default)]
    source: Option<Sources>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Sources {
    One(Source),
    Many(Vec<Source>),
}

#[derive(Debug, Deserialize)]
struct Source {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    artist: Option<String>,
    #[serde(default)]
    listenurl: String,
    #[serde(default, deserialize_with = "lenient_u64")]
    listeners: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    bitrate: u64,
}

/// Icecast emits some counters as numbers and others as strings depending on
/// the source type.
fn lenient_u64<'de, D: Deserializer<'de>>(de: D) -> Result<u64, D::Error> {
    Ok(match serde_json::Value::deserialize(de)? {
        serde_json::Value::Number(n) => n.as_u64().unwrap_or(0),
        serde_json::Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}

impl Source {
    fn mountpoint(&self) -> &str {
        let without_scheme = self
            .listenurl
            .split_once("://")
            .map_or(self.listenurl.as_str(), |(_, rest)| rest);
        without_scheme
            .split_once('/')
            .map_or("", |(_, mount)| mount.trim_end_matches('/'))
    }
}

#[derive(Debug, Clone)]
pub struct Icecast {
    client: Client,
    base_url: String,
    mountpoint: Option<String>,
}

impl Icecast {
    /// `mountpoint` selects one mount when the server carries several;
    /// `None` takes the first.
    pub fn new(
        base_url: impl Into<String>,
        mountpoint: Option<String>,
        timeout: Duration,
    ) -> Result<Self, StreamError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            mountpoint,
        })
    }

    fn pick<'a>(&self, sources: &'a [Source]) -> Option<&'a Source> {
        match &self.mountpoint {
            Some(mount) => sources
                .iter()
                .find(|s| s.mountpoint() == mount.trim_start_matches('/')),
            None => sources.first(),
        }
    }
}

#[async_trait]
impl StreamServer for Icecast {
    async fn status(&self) -> Result<StreamStatus, StreamError> {
        let url = format!("{}/status-json.xsl", self.base_url);
        let doc: StatusDocument = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let sources = match doc.icestats.source {
            Some(Sources::One(source)) => vec![source],
            Some(Sources::Many(sources)) => sources,
            None => Vec::new(),
        };
        let source = self.pick(&sources).ok_or_else(|| {
            StreamError::NoSource(self.mountpoint.clone().unwrap_or_else(|| url.clone()))
        })?;

        let (title, artist) = split_title(source);
        Ok(StreamStatus {
            title,
            artist,
            host: doc.icestats.host,
            mountpoint: source.mountpoint().to_string(),
            listeners: source.listeners,
            bitrate: source.bitrate,
        })
    }
}

/// Sources that only send a stream title carry "Artist - Title" in it.
fn split_title(source: &Source) -> (String, String) {
    let title = source.title.clone().unwrap_or_default();
    match &source.artist {
        Some(artist) if !artist.is_empty() => (title, artist.clone()),
        _ => match title.split_once(" - ") {
            Some((artist, title)) => (title.trim().to_string(), artist.trim().to_string()),
            None => (title, String::new()),
        },
    }
}
