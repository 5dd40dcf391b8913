//! Song request pipeline: resolve an ID or a query to a file and hand it to
//! the playback engine.

use std::sync::Arc;

use crate::catalog::{CatalogIndex, CatalogRecord};
use crate::error::ApiError;
use crate::playback::PlaybackEngine;

/// Parse a client-supplied song ID. Only plain decimal digits denoting a
/// positive integer are accepted: no sign, no surrounding whitespace.
pub fn parse_id(raw: &str) -> Result<u64, ApiError> {
    let digits_only = !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit());
    match raw.parse::<u64>() {
        Ok(id) if digits_only && id > 0 => Ok(id),
        _ => Err(ApiError::Validation(format!("song ID {raw:?} is not a positive integer"))),
    }
}

#[derive(Clone)]
pub struct RequestPipeline {
    catalog: Arc<dyn CatalogIndex>,
    engine: Arc<dyn PlaybackEngine>,
}

impl RequestPipeline {
    pub fn new(catalog: Arc<dyn CatalogIndex>, engine: Arc<dyn PlaybackEngine>) -> Self {
        Self { catalog, engine }
    }

    /// Request a song by its catalog ID.
    pub async fn by_id(&self, raw_id: &str) -> Result<CatalogRecord, ApiError> {
        let id = parse_id(raw_id)?;
        let record = self
            .catalog
            .lookup_by_id(id)
            .await
            .map_err(|e| ApiError::dependency("catalog", e))?
            .ok_or_else(|| ApiError::NotFound(format!("no song with ID {id}")))?;
        self.dispatch(&record).await?;
        Ok(record)
    }

    /// Request the top-ranked result of a free-text search.
    pub async fn best_match(&self, query: &str) -> Result<CatalogRecord, ApiError> {
        if query.trim().is_empty() {
            return Err(ApiError::Validation("empty search query".to_string()));
        }
        let record = self
            .catalog
            .search(query)
            .await
            .map_err(|e| ApiError::dependency("catalog", e))?
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::NoMatch(query.to_string()))?;
        self.dispatch(&record).await?;
        Ok(record)
    }

    /// Submit a resolved song to the engine's request queue. Not retried.
    pub async fn dispatch(&self, record: &CatalogRecord) -> Result<(), ApiError> {
        self.engine
            .submit(&record.path)
            .await
            .map_err(|e| ApiError::dependency("playback engine", e))?;
        tracing::info!(
            "Requested #{} \"{}\" by {}",
            record.id,
            record.title,
            record.artist
        );
        Ok(())
    }
}
