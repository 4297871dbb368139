//! Shared key-value store backed by one JSON object per file.
//!
//! The MoeKoe player keeps its own keys in the same file (playback progress,
//! last-known title/artist), so every write re-reads the map from disk before
//! inserting and then replaces the file atomically. Readers always see a
//! complete map, never a half-written one.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::warn;

/// Key holding the encoded cumulative-stats blob.
pub const STATS_KEY: &str = "moekoe_playback_stats";
/// Playback position in seconds, written continuously by the player.
pub const PROGRESS_KEY: &str = "player_progress";
/// Last-known title/artist, fallbacks for when the UI has not rendered yet.
pub const TITLE_KEY: &str = "current_song_title";
pub const ARTIST_KEY: &str = "current_song_artist";

pub trait Store {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// File-backed store handle. Holds only the path; each call goes to disk, so
/// independent handles on the same path stay consistent with each other.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_map(&self) -> HashMap<String, String> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return HashMap::new(),
            Err(err) => {
                warn!(path = %self.path.display(), %err, "store unreadable, treating as empty");
                return HashMap::new();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(map) => map,
            Err(err) => {
                warn!(path = %self.path.display(), %err, "store malformed, treating as empty");
                HashMap::new()
            }
        }
    }
}

impl Store for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.read_map().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut map = self.read_map();
        map.insert(key.to_string(), value.to_string());
        let json = serde_json::to_string(&map)?;
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create store dir {}", dir.display()))?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .with_context(|| format!("failed to write store temp file {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("failed to replace store file {}", self.path.display()))?;
        Ok(())
    }
}

/// In-memory store for tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryStore(std::sync::Mutex<HashMap<String, String>>);

#[cfg(test)]
impl Store for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.0.lock().unwrap().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.0.lock().unwrap().insert(key.to_string(), value.to_string());
        Ok(())
    }
}
