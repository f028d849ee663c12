//! Track identity

use serde::Serialize;

/// One playable item, identified by its source locator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Track {
    uri: String,
    display_name: String,
}

impl Track {
    pub fn new(uri: impl Into<String>) -> Self {
        let uri = uri.into();
        let display_name = display_name_for(&uri).to_string();
        Self { uri, display_name }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Same source locator, ignoring ASCII case
    pub fn is_source(&self, uri: &str) -> bool {
        self.uri.eq_ignore_ascii_case(uri)
    }
}

/// Substring after the last path separator.
///
/// Falls back to the whole locator when nothing follows the separator.
pub fn display_name_for(uri: &str) -> &str {
    match uri.rfind(['/', '\\']) {
        Some(idx) if idx + 1 < uri.len() => &uri[idx + 1..],
        _ => uri,
    }
}
