//! Song catalog: the searchable library of metadata and file paths.

pub mod library;
pub mod metadata;
pub mod mime;
pub mod scanner;

use std::path::PathBuf;

use async_trait::async_trait;
use serde::Serialize;

/// One indexed song. Immutable once indexed.
///
/// `path` is internal and never serialized to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CatalogRecord {
    #[serde(rename = "ID")]
    pub id: u64,
    pub title: String,
    pub artist: String,
    pub album: String,
    #[serde(skip)]
    pub path: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog index unavailable: {0}")]
    Unavailable(String),
}

/// Full-text index over catalog metadata, keyed by song ID.
#[async_trait]
pub trait CatalogIndex: Send + Sync {
    /// Ranked free-text search. An empty result is not an error.
    async fn search(&self, query: &str) -> Result<Vec<CatalogRecord>, CatalogError>;

    async fn lookup_by_id(&self, id: u64) -> Result<Option<CatalogRecord>, CatalogError>;

    /// Every record whose title and artist match, best candidate first.
    async fn lookup_by_title_artist(
        &self,
        title: &str,
        artist: &str,
    ) -> Result<Vec<CatalogRecord>, CatalogError>;
}
