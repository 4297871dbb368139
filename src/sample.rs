//! One polling pass over the player's rendered UI and shared store.
//!
//! The player's markup varies across versions and themes, so the title and
//! artist are looked up through an ordered chain of candidate selectors, with
//! the store's last-known keys as a fallback for moments where the UI has not
//! rendered yet. Lookups never fail; they degrade to sentinel values.

use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::store::{ARTIST_KEY, PROGRESS_KEY, Store, TITLE_KEY};

pub const UNKNOWN_TITLE: &str = "unknown";
pub const UNKNOWN_ARTIST: &str = "unknown";

/// Candidate title selectors, most specific first.
pub const TITLE_SELECTORS: &[&str] = &[
    ".song-title",
    ".track-title",
    "[class*=\"title\"]",
    ".music-title",
];
/// Candidate artist selectors, most specific first.
pub const ARTIST_SELECTORS: &[&str] = &[
    ".song-artist",
    ".track-artist",
    "[class*=\"artist\"]",
    ".music-artist",
];

/// What one tick observed: best-effort track identity plus the player's
/// reported position, stamped with wall-clock time.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSample {
    pub title: String,
    pub artist: String,
    pub position_seconds: f64,
    pub observed_at_millis: i64,
}

/// Read surface over the player's rendered UI.
pub trait Surface {
    /// Trimmed text of the first element matching `selector`, when non-empty.
    fn text_of(&self, selector: &str) -> Option<String>;
}

/// One rendered element: its class attribute and displayed text.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UiElement {
    pub class: String,
    pub text: String,
}

/// Snapshot of the player UI, elements in document order.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct UiSnapshot(Vec<UiElement>);

impl UiSnapshot {
    /// A missing or malformed snapshot file reads as an empty document.
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }
}

static ATTR_CONTAINS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^\[class\*="([^"]+)"\]$"#).unwrap());

impl Surface for UiSnapshot {
    fn text_of(&self, selector: &str) -> Option<String> {
        let matches: Box<dyn Fn(&str) -> bool> = if let Some(class) = selector.strip_prefix('.') {
            let class = class.to_string();
            Box::new(move |attr: &str| attr.split_whitespace().any(|token| token == class))
        } else if let Some(caps) = ATTR_CONTAINS.captures(selector) {
            let needle = caps[1].to_string();
            Box::new(move |attr: &str| attr.contains(&needle))
        } else {
            return None;
        };
        self.0
            .iter()
            .filter(|el| matches(&el.class))
            .map(|el| el.text.trim())
            .find(|text| !text.is_empty())
            .map(str::to_string)
    }
}

fn first_text(surface: &dyn Surface, selectors: &[&str]) -> Option<String> {
    selectors.iter().find_map(|sel| surface.text_of(sel))
}

/// Captures one `PlaybackSample` from the UI surface and shared store.
/// Never errors; absent position reads as 0, absent identity as the sentinel.
pub fn capture(surface: &dyn Surface, store: &dyn Store, now_millis: i64) -> PlaybackSample {
    let position_seconds = store
        .get(PROGRESS_KEY)
        .and_then(|raw| raw.trim().parse::<f64>().ok())
        .filter(|pos| pos.is_finite())
        .unwrap_or(0.0);

    let title = first_text(surface, TITLE_SELECTORS)
        .or_else(|| store.get(TITLE_KEY).filter(|t| !t.trim().is_empty()))
        .unwrap_or_else(|| UNKNOWN_TITLE.to_string());
    let artist = first_text(surface, ARTIST_SELECTORS)
        .or_else(|| store.get(ARTIST_KEY).filter(|a| !a.trim().is_empty()))
        .unwrap_or_else(|| UNKNOWN_ARTIST.to_string());

    PlaybackSample {
        title,
        artist,
        position_seconds,
        observed_at_millis: now_millis,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn snapshot(elements: &[(&str, &str)]) -> UiSnapshot {
        UiSnapshot(
            elements
                .iter()
                .map(|(class, text)| UiElement {
                    class: class.to_string(),
                    text: text.to_string(),
                })
                .collect(),
        )
    }

    #[test]
    fn class_selector_matches_token_not_substring() {
        let snap = snapshot(&[("song-title-bar", "wrong"), ("big song-title", "right")]);
        assert_eq!(snap.text_of(".song-title").as_deref(), Some("right"));
    }

    #[test]
    fn attr_selector_matches_substring() {
        let snap = snapshot(&[("main-title-area", "Track A")]);
        assert_eq!(snap.text_of("[class*=\"title\"]").as_deref(), Some("Track A"));
    }

    #[test]
    fn empty_text_is_a_miss() {
        let snap = snapshot(&[("song-title", "   "), ("music-title", "Track B")]);
        assert_eq!(snap.text_of(".song-title"), None);
        let sample = capture(&snap, &MemoryStore::default(), 0);
        assert_eq!(sample.title, "Track B");
    }

    #[test]
    fn selector_order_beats_document_order() {
        // `.song-title` is tried before `.music-title` even though the
        // music-title element renders first.
        let snap = snapshot(&[("music-title", "second choice"), ("song-title", "first choice")]);
        let sample = capture(&snap, &MemoryStore::default(), 0);
        assert_eq!(sample.title, "first choice");
    }

    #[test]
    fn falls_back_to_store_keys_then_sentinel() {
        let empty = UiSnapshot::default();
        let store = MemoryStore::default();
        let sample = capture(&empty, &store, 0);
        assert_eq!(sample.title, UNKNOWN_TITLE);
        assert_eq!(sample.artist, UNKNOWN_ARTIST);

        store.set(TITLE_KEY, "Stored Song").unwrap();
        store.set(ARTIST_KEY, "Stored Artist").unwrap();
        let sample = capture(&empty, &store, 0);
        assert_eq!(sample.title, "Stored Song");
        assert_eq!(sample.artist, "Stored Artist");
    }

    #[test]
    fn position_parses_or_coerces_to_zero() {
        let empty = UiSnapshot::default();
        let store = MemoryStore::default();
        assert_eq!(capture(&empty, &store, 0).position_seconds, 0.0);

        store.set(PROGRESS_KEY, "12.5").unwrap();
        assert_eq!(capture(&empty, &store, 0).position_seconds, 12.5);

        store.set(PROGRESS_KEY, "NaN").unwrap();
        assert_eq!(capture(&empty, &store, 0).position_seconds, 0.0);

        store.set(PROGRESS_KEY, "not a number").unwrap();
        assert_eq!(capture(&empty, &store, 0).position_seconds, 0.0);
    }

    #[test]
    fn sample_is_stamped_with_the_given_clock() {
        let sample = capture(&UiSnapshot::default(), &MemoryStore::default(), 1234);
        assert_eq!(sample.observed_at_millis, 1234);
    }

    #[test]
    fn snapshot_load_tolerates_missing_and_malformed_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = UiSnapshot::load(&dir.path().join("nope.json"));
        assert!(missing.0.is_empty());

        let path = dir.path().join("ui.json");
        fs::write(&path, "[{broken").unwrap();
        assert!(UiSnapshot::load(&path).0.is_empty());

        fs::write(&path, r#"[{"class": "song-title", "text": "Hello"}]"#).unwrap();
        assert_eq!(UiSnapshot::load(&path).text_of(".song-title").as_deref(), Some("Hello"));
    }
}
