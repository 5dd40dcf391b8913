use std::path::Path;

use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::{MetadataRevision, StandardTagKey};
use symphonia::core::probe::{Hint, ProbeResult};

/// Text tags read from a file's container headers. Any field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tags {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("cannot open {path}: {source}")]
    Open {
        path: String,
        source: std::io::Error,
    },

    #[error("cannot probe {path}: {source}")]
    Probe {
        path: String,
        source: SymphoniaError,
    },
}

/// Open and probe a media file.
fn probe(path: &Path) -> Result<ProbeResult, MetadataError> {
    let file = std::fs::File::open(path).map_err(|source| MetadataError::Open {
        path: path.display().to_string(),
        source,
    })?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    symphonia::default::get_probe()
        .format(&hint, mss, &Default::default(), &Default::default())
        .map_err(|source| MetadataError::Probe {
            path: path.display().to_string(),
            source,
        })
}

/// Read title/artist/album tags.
///
/// Tags can sit ahead of the container (ID3v2 on MP3) or inside it (Vorbis
/// comments, MP4 atoms); both are consulted, container first wins.
pub fn read_tags(path: &Path) -> Option<Tags> {
    let mut probed = probe(path).ok()?;
    let mut tags = Tags::default();

    if let Some(metadata) = probed.metadata.get() {
        if let Some(rev) = metadata.current() {
            absorb(&mut tags, rev);
        }
    }
    let mut format = probed.format;
    let metadata = format.metadata();
    if let Some(rev) = metadata.current() {
        absorb(&mut tags, rev);
    }

    Some(tags)
}

fn absorb(tags: &mut Tags, rev: &MetadataRevision) {
    for tag in rev.tags() {
        let value = tag.value.to_string();
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        let slot = match tag.std_key {
            Some(StandardTagKey::TrackTitle) => &mut tags.title,
            Some(StandardTagKey::Artist) => &mut tags.artist,
            Some(StandardTagKey::Album) => &mut tags.album,
            _ => continue,
        };
        if slot.is_none() {
            *slot = Some(value.to_string());
        }
    }
}

/// First embedded picture (cover art). `Ok(None)` when the file is readable
/// but carries no picture.
pub fn read_picture(path: &Path) -> Result<Option<Vec<u8>>, MetadataError> {
    let mut probed = probe(path)?;

    if let Some(metadata) = probed.metadata.get() {
        if let Some(rev) = metadata.current() {
            if let Some(visual) = rev.visuals().iter().find(|v| !v.data.is_empty()) {
                return Ok(Some(visual.data.to_vec()));
            }
        }
    }
    let mut format = probed.format;
    let metadata = format.metadata();
    Ok(metadata.current().and_then(|rev| {
        rev.visuals()
            .iter()
            .find(|v| !v.data.is_empty())
            .map(|v| v.data.to_vec())
    }))
}
