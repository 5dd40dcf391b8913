use std::path::{Path, PathBuf};
use std::time::Instant;

use walkdir::WalkDir;

use crate::catalog::library::Library;
use crate::catalog::metadata::{read_tags, Tags};
use crate::catalog::mime::classify_audio;
use crate::catalog::CatalogRecord;

/// Scan `root` recursively and build a [`Library`] of every audio file found.
///
/// Symlinks are followed. Unreadable entries log a warning and are skipped.
/// IDs are assigned 1..=N in path order so a rescan of an unchanged tree keeps
/// every ID stable.
pub fn scan(root: &Path) -> Library {
    let start = Instant::now();
    let mut library = Library::new();

    if !root.exists() {
        tracing::warn!("Music directory does not exist, skipping: {}", root.display());
        return library;
    }

    let mut files: Vec<PathBuf> = Vec::new();
    for entry in WalkDir::new(root).follow_links(true) {
        match entry {
            Err(e) => tracing::warn!("Cannot access entry: {}", e),
            Ok(entry) if entry.file_type().is_file() => {
                if classify_audio(entry.path()).is_some() {
                    files.push(entry.into_path());
                }
            }
            Ok(_) => {}
        }
    }
    files.sort();

    let mut untagged = 0usize;
    for (index, path) in files.into_iter().enumerate() {
        let tags = read_tags(&path).unwrap_or_else(|| {
            untagged += 1;
            tracing::debug!("No readable tags in {}", path.display());
            Tags::default()
        });
        let record = to_record(index as u64 + 1, path, tags);
        tracing::debug!("indexed {} -> {}", record.id, record.path.display());
        library.records.push(record);
    }

    tracing::info!(
        "Indexed {} songs ({} without tags) in {:.1}s",
        library.records.len(),
        untagged,
        start.elapsed().as_secs_f64()
    );

    library
}

/// Untitled files fall back to their file stem so they stay searchable.
fn to_record(id: u64, path: PathBuf, tags: Tags) -> CatalogRecord {
    let title = tags.title.unwrap_or_else(|| {
        path.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    });
    CatalogRecord {
        id,
        title,
        artist: tags.artist.unwrap_or_default(),
        album: tags.album.unwrap_or_default(),
        path,
    }
}
