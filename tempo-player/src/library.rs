//! Media library enumeration
//!
//! Lists playable files under the root folder so clients have uris to load.
//! Files are selected by extension only; the engine validates the content
//! when a track is loaded.

use crate::error::{Error, Result};
use crate::playback::track::display_name_for;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// Extensions offered to clients (lowercase)
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "flac", "ogg", "m4a", "aac", "wav", "mp4"];

/// One playable file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LibraryEntry {
    /// Locator accepted by `load`
    pub uri: String,
    pub display_name: String,
}

/// Recursively list audio files under `root`, sorted by uri.
///
/// Hidden files and directories are skipped. Unreadable entries are logged
/// and skipped rather than failing the scan.
pub fn scan(root: &Path) -> Result<Vec<LibraryEntry>> {
    if !root.is_dir() {
        return Err(Error::Library(format!(
            "Root folder is not a directory: {}",
            root.display()
        )));
    }

    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e));

    let mut entries = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Error accessing library entry: {}", e);
                continue;
            }
        };

        if entry.file_type().is_file() && is_audio_file(entry.path()) {
            let uri = entry.path().to_string_lossy().into_owned();
            let display_name = display_name_for(&uri).to_string();
            entries.push(LibraryEntry { uri, display_name });
        }
    }

    entries.sort_by(|a, b| a.uri.cmp(&b.uri));
    debug!("Library scan of {} found {} files", root.display(), entries.len());
    Ok(entries)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| AUDIO_EXTENSIONS.contains(&ext.as_str()))
}
