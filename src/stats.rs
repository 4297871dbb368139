//! Cumulative listening-time state machine.
//!
//! Each tick diffs the player's reported position against the previous tick
//! and only counts deltas that look like genuine forward playback. Seeks,
//! rewinds and track changes re-baseline the position without counting; the
//! full state is persisted after every tick so at most one tick of listening
//! is lost on abrupt termination.

use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::codec;
use crate::sample::{PlaybackSample, UNKNOWN_TITLE};
use crate::store::{STATS_KEY, Store};

/// Most recently identified track. Display-adjacent, independent of the
/// accumulation logic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayedTrack {
    pub title: String,
    pub artist: String,
    /// Wall-clock millis of the tick that saw it.
    pub time: i64,
}

/// Persisted accumulator state. Wire field names match the blob the player
/// shipped with, so existing store entries keep decoding.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsData {
    pub total_seconds: f64,
    /// `title|artist` of the track last observed; empty when none recognized.
    pub last_track_id: String,
    pub last_position: f64,
    pub last_check_time: i64,
    pub last_played_track: Option<PlayedTrack>,
}

pub struct Accumulator {
    data: StatsData,
    /// Seconds of forward progress tolerated beyond elapsed wall-clock time,
    /// absorbing tick-timer jitter and scheduling drift.
    slack: f64,
}

impl Accumulator {
    /// Loads the persisted state, substituting the zero default when the blob
    /// is absent or unreadable.
    pub fn load(store: &dyn Store, slack: f64) -> Self {
        Self {
            data: load_data(store),
            slack,
        }
    }

    /// Folds one sample into the state and persists the result.
    pub fn tick(&mut self, sample: &PlaybackSample, store: &dyn Store) {
        let data = &mut self.data;

        // No recognizable track: drop the baseline entirely so a reappearing
        // track starts a fresh session instead of diffing a stale position.
        if sample.title.is_empty() || sample.title == UNKNOWN_TITLE {
            data.last_track_id.clear();
            data.last_check_time = sample.observed_at_millis;
            persist(store, data);
            return;
        }

        data.last_played_track = Some(PlayedTrack {
            title: sample.title.clone(),
            artist: sample.artist.clone(),
            time: sample.observed_at_millis,
        });

        let track_id = format!("{}|{}", sample.title, sample.artist);
        if track_id != data.last_track_id {
            // New listening session: the transition tick has no baseline to
            // diff against, so it never accumulates.
            data.last_track_id = track_id;
            data.last_position = sample.position_seconds;
            data.last_check_time = sample.observed_at_millis;
            persist(store, data);
            return;
        }

        let elapsed = (sample.observed_at_millis - data.last_check_time) as f64 / 1000.0;
        let delta = sample.position_seconds - data.last_position;

        if delta > 0.0 && delta <= elapsed + self.slack {
            data.total_seconds += delta;
            data.last_position = sample.position_seconds;
        } else if delta != 0.0 {
            // Seek, loop or rewind: re-baseline without counting the jump.
            data.last_position = sample.position_seconds;
        }
        // delta == 0: paused or stalled, keep total and baseline.

        data.last_check_time = sample.observed_at_millis;
        persist(store, data);
    }

    pub fn total_seconds(&self) -> f64 {
        self.data.total_seconds
    }

    pub fn formatted(&self) -> String {
        format_hm(self.data.total_seconds)
    }

    /// Zeroes every field and persists immediately.
    pub fn reset(&mut self, store: &dyn Store) {
        self.data = StatsData::default();
        persist(store, &self.data);
    }

    /// Copy of the current state for read-only consumers.
    pub fn snapshot(&self) -> StatsData {
        self.data.clone()
    }
}

/// Decodes the persisted blob, falling back to the zero default. Shared with
/// the badge, which reads the store through its own handle.
pub fn load_data(store: &dyn Store) -> StatsData {
    match store.get(STATS_KEY) {
        Some(encoded) => match codec::decode(&encoded) {
            Ok(data) => data,
            Err(err) => {
                warn!(%err, "stored stats unreadable, starting from zero");
                StatsData::default()
            }
        },
        None => StatsData::default(),
    }
}

fn persist(store: &dyn Store, data: &StatsData) {
    // The in-memory state keeps advancing on write failure; the next
    // successful write carries the correct cumulative value.
    if let Err(err) = store.set(STATS_KEY, &codec::encode(data)) {
        error!(%err, "failed to persist stats");
    }
}

/// Formats cumulative seconds as `{H}小时 {M}分钟`, hours omitted when zero.
pub fn format_hm(seconds: f64) -> String {
    let total = seconds.max(0.0) as i64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    if hours > 0 {
        format!("{hours}小时 {minutes}分钟")
    } else {
        format!("{minutes}分钟")
    }
}
