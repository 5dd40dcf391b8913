use std::path::Path;

/// Classify a path by extension into an audio MIME type.
///
/// Returns `None` for anything that is not a playable audio file. Extensions
/// are matched case-insensitively.
pub fn classify_audio(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();

    let mime = match ext.as_str() {
        "mp3" => "audio/mpeg",
        "flac" => "audio/flac",
        "wav" => "audio/wav",
        "m4a" => "audio/mp4",
        "aac" => "audio/aac",
        "ogg" | "oga" | "opus" => "audio/ogg",
        "aif" | "aiff" => "audio/aiff",
        _ => return None,
    };
    Some(mime)
}
