use std::path::PathBuf;

use clap::Parser;

/// Configuration parsed from command-line arguments.
#[derive(Debug, Parser, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Shared key-value store file written by the player
    #[arg(long = "store", default_value = "/tmp/moekoe/store.json")]
    pub store: PathBuf,
    /// Rendered-UI snapshot file written by the player
    #[arg(long = "ui", default_value = "/tmp/moekoe/ui.json")]
    pub ui: PathBuf,
    /// Accumulator tick period in milliseconds
    #[arg(short = 'i', long = "interval", default_value_t = 1000)]
    pub interval_ms: u64,
    /// Badge refresh period in milliseconds
    #[arg(long = "badge-interval", default_value_t = 1000)]
    pub badge_interval_ms: u64,
    /// Plausibility-window slack in seconds for forward-progress deltas
    #[arg(long = "slack", default_value_t = 2.0)]
    pub slack: f64,
    /// Display name used in the badge text
    #[arg(long = "app-name", default_value = "MoeKoe Music")]
    pub app_name: String,
    /// Zero the persisted stats and exit
    #[arg(long = "reset", default_value_t = false, action = clap::ArgAction::SetTrue)]
    pub reset: bool,
    /// Print the current formatted total and exit
    #[arg(long = "once", default_value_t = false, action = clap::ArgAction::SetTrue)]
    pub once: bool,
}

impl Config {
    /// Parse arguments and normalize derived fields.
    pub fn parse() -> Self {
        let mut config = <Self as Parser>::parse();
        config.normalize();
        config
    }

    fn normalize(&mut self) {
        // Sub-100ms polling only burns CPU on a 1Hz data source.
        self.interval_ms = self.interval_ms.max(100);
        self.badge_interval_ms = self.badge_interval_ms.max(100);
        if !self.slack.is_finite() || self.slack < 0.0 {
            self.slack = 2.0;
        }
    }
}
