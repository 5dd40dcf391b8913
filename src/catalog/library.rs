use async_trait::async_trait;

use crate::catalog::{CatalogError, CatalogIndex, CatalogRecord};

const TITLE_WEIGHT: u32 = 3;
const ARTIST_WEIGHT: u32 = 2;
const ALBUM_WEIGHT: u32 = 1;
const EXACT_TITLE_BONUS: u32 = 5;

/// Flat in-memory song library, built by the scanner.
#[derive(Debug, Default, Clone)]
pub struct Library {
    pub records: Vec<CatalogRecord>,
}

impl Library {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: u64) -> Option<&CatalogRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Every query term must appear in title, artist or album. Hits in the
    /// title outrank hits in the artist, which outrank the album. Ties keep
    /// ascending ID order.
    pub fn search(&self, query: &str) -> Vec<CatalogRecord> {
        let terms = terms(query);
        if terms.is_empty() {
            return Vec::new();
        }
        let normalized_query = normalize(query);

        let mut scored: Vec<(u32, &CatalogRecord)> = self
            .records
            .iter()
            .filter_map(|record| {
                let title = record.title.to_lowercase();
                let artist = record.artist.to_lowercase();
                let album = record.album.to_lowercase();
                let mut score = 0;
                for term in &terms {
                    let mut hit = 0;
                    if title.contains(term.as_str()) {
                        hit += TITLE_WEIGHT;
                    }
                    if artist.contains(term.as_str()) {
                        hit += ARTIST_WEIGHT;
                    }
                    if album.contains(term.as_str()) {
                        hit += ALBUM_WEIGHT;
                    }
                    if hit == 0 {
                        return None;
                    }
                    score += hit;
                }
                if normalize(&record.title) == normalized_query {
                    score += EXACT_TITLE_BONUS;
                }
                Some((score, record))
            })
            .collect();

        scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.id.cmp(&b.1.id)));
        scored.into_iter().map(|(_, r)| r.clone()).collect()
    }

    /// Case- and whitespace-insensitive title + artist match.
    pub fn find_title_artist(&self, title: &str, artist: &str) -> Vec<CatalogRecord> {
        let title = normalize(title);
        let artist = normalize(artist);
        self.records
            .iter()
            .filter(|r| normalize(&r.title) == title && normalize(&r.artist) == artist)
            .cloned()
            .collect()
    }
}

fn terms(query: &str) -> Vec<String> {
    query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn normalize(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// [`CatalogIndex`] backed by an in-process [`Library`], built once at
/// startup.
#[derive(Debug, Default)]
pub struct LibraryIndex {
    library: Library,
}

impl LibraryIndex {
    pub fn new(library: Library) -> Self {
        Self { library }
    }

    pub fn len(&self) -> usize {
        self.library.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.library.records.is_empty()
    }
}

#[async_trait]
impl CatalogIndex for LibraryIndex {
    async fn search(&self, query: &str) -> Result<Vec<CatalogRecord>, CatalogError> {
        Ok(self.library.search(query))
    }

    async fn lookup_by_id(&self, id: u64) -> Result<Option<CatalogRecord>, CatalogError> {
        Ok(self.library.get(id).cloned())
    }

    async fn lookup_by_title_artist(
        &self,
        title: &str,
        artist: &str,
    ) -> Result<Vec<CatalogRecord>, CatalogError> {
        Ok(self.library.find_title_artist(title, artist))
    }
}
