//! Stdout badge for the cumulative total, waybar-style.
//!
//! Deliberately independent of the accumulator: it decodes the persisted blob
//! through its own store handle each refresh, so it tolerates state that is up
//! to one tick stale and works even when the accumulator runs elsewhere.

use serde_json::json;

use crate::stats::{format_hm, load_data};
use crate::store::Store;

pub struct Badge {
    app_name: String,
    last_output: String,
}

impl Badge {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            last_output: String::new(),
        }
    }

    /// Human-readable badge text for the current persisted total.
    pub fn text(&self, store: &dyn Store) -> String {
        let data = load_data(store);
        format!("你已使用{}播放 {}", self.app_name, format_hm(data.total_seconds))
    }

    fn render(&self, store: &dyn Store) -> String {
        json!({ "text": self.text(store), "class": "stats" }).to_string()
    }

    /// Re-asserts the badge line, printing only when it changed.
    pub fn refresh(&mut self, store: &dyn Store) {
        let output = self.render(store);
        if output != self.last_output {
            println!("{output}");
            self.last_output = output;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::PlaybackSample;
    use crate::stats::Accumulator;
    use crate::store::MemoryStore;

    #[test]
    fn empty_store_renders_zero_minutes() {
        let badge = Badge::new("MoeKoe Music");
        assert_eq!(
            badge.text(&MemoryStore::default()),
            "你已使用MoeKoe Music播放 0分钟"
        );
    }

    #[test]
    fn badge_reads_what_the_accumulator_persisted() {
        let store = MemoryStore::default();
        let mut acc = Accumulator::load(&store, 2.0);
        let tick = |pos: f64, at: i64| PlaybackSample {
            title: "X".to_string(),
            artist: "A".to_string(),
            position_seconds: pos,
            observed_at_millis: at,
        };
        acc.tick(&tick(0.0, 0), &store);
        acc.tick(&tick(5400.0, 5_400_000), &store);

        let badge = Badge::new("MoeKoe Music");
        assert_eq!(badge.text(&store), "你已使用MoeKoe Music播放 1小时 30分钟");
    }

    #[test]
    fn render_is_stable_for_unchanged_state() {
        let store = MemoryStore::default();
        let badge = Badge::new("MoeKoe Music");
        assert_eq!(badge.render(&store), badge.render(&store));
    }
}
