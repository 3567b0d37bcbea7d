//! Track-page hydration payload parsing.
//!
//! A track's public page embeds its metadata in an inline hydration script:
//!
//! ```text
//! <script>window.__sc_hydration = [ ..., {"hydratable": "sound", "data": {...}}, ... ];</script>
//! ```
//!
//! Fetching the page is an external collaborator's job
//! ([`TrackMetadataFetcher`](super::command::TrackMetadataFetcher)); this
//! module is the parsing half, so a fetcher implementation only supplies
//! HTTP I/O.

// ============================================================================
// Imports
// ============================================================================

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

// ============================================================================
// Constants
// ============================================================================

/// Matches the hydration assignment and captures its JSON array.
static HYDRATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"window\.__sc_hydration\s*=\s*(\[[\s\S]*?\]);")
        .expect("hydration pattern is valid")
});

/// Hydratable kind carrying track data.
const SOUND: &str = "sound";

// ============================================================================
// Functions
// ============================================================================

/// Extracts the first sound entry's data from a track page.
///
/// Returns `None` if the page has no hydration script, the payload is not
/// valid JSON, or no entry is hydratable as a sound. Callers treat `None`
/// as "no playback command executed".
#[must_use]
pub fn extract_sound_data(html: &str) -> Option<Value> {
    let captures = HYDRATION.captures(html)?;
    let payload: Value = serde_json::from_str(captures.get(1)?.as_str()).ok()?;

    payload
        .as_array()?
        .iter()
        .find(|entry| entry.get("hydratable").and_then(Value::as_str) == Some(SOUND))
        .and_then(|entry| entry.get("data"))
        .cloned()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    const PAGE: &str = r#"<html><head>
        <script>var unrelated = 1;</script>
        <script>window.__sc_hydration = [
            {"hydratable": "user", "data": {"id": 1}},
            {"hydratable": "sound", "data": {"title": "First", "duration": 180000}},
            {"hydratable": "sound", "data": {"title": "Second"}}
        ];</script>
        </head><body></body></html>"#;

    #[test]
    fn test_extracts_first_sound_entry() {
        let data = extract_sound_data(PAGE).expect("sound data present");
        assert_eq!(data, json!({"title": "First", "duration": 180000}));
    }

    #[test]
    fn test_no_hydration_script() {
        assert!(extract_sound_data("<html><body>plain page</body></html>").is_none());
    }

    #[test]
    fn test_malformed_payload() {
        let html = r#"<script>window.__sc_hydration = [not json];</script>"#;
        assert!(extract_sound_data(html).is_none());
    }

    #[test]
    fn test_no_sound_entry() {
        let html = r#"<script>window.__sc_hydration = [{"hydratable": "user", "data": {}}];</script>"#;
        assert!(extract_sound_data(html).is_none());
    }
}
