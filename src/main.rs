use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

mod badge;
mod codec;
mod config;
mod sample;
mod stats;
mod store;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use badge::Badge;
use config::Config;
use sample::UiSnapshot;
use stats::Accumulator;
use store::FileStore;

/// Current wall-clock time in milliseconds.
fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// One sampling-and-accumulation pass. Tick-and-persist runs inside a single
/// lock section so the persisted blob is always one complete state.
fn run_tick(config: &Config, acc: &Mutex<Accumulator>, store: &FileStore) {
    let snapshot = UiSnapshot::load(&config.ui);
    let sample = sample::capture(&snapshot, store, now_millis());
    acc.lock().unwrap().tick(&sample, store);
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = Config::parse();
    let store = FileStore::new(&config.store);

    if config.reset {
        let mut acc = Accumulator::load(&store, config.slack);
        acc.reset(&store);
        info!("stats reset to zero");
        return Ok(());
    }
    if config.once {
        let acc = Accumulator::load(&store, config.slack);
        println!("{}", acc.formatted());
        return Ok(());
    }

    let acc = Arc::new(Mutex::new(Accumulator::load(&store, config.slack)));
    {
        let acc = acc.lock().unwrap();
        info!(seconds = acc.total_seconds(), total = %acc.formatted(), "stats core loaded");
    }

    let config = Arc::new(config);

    // Accumulator tick loop.
    let acc_tick = Arc::clone(&acc);
    let config_tick = Arc::clone(&config);
    tokio::spawn(async move {
        let store = FileStore::new(&config_tick.store);
        let mut interval = tokio::time::interval(Duration::from_millis(config_tick.interval_ms));
        loop {
            interval.tick().await;
            run_tick(&config_tick, &acc_tick, &store);
        }
    });

    // Badge refresh loop. The badge reads the persisted blob through its own
    // store handle, not through the accumulator.
    let config_badge = Arc::clone(&config);
    tokio::spawn(async move {
        let store = FileStore::new(&config_badge.store);
        let mut badge = Badge::new(config_badge.app_name.clone());
        let mut interval =
            tokio::time::interval(Duration::from_millis(config_badge.badge_interval_ms));
        loop {
            interval.tick().await;
            badge.refresh(&store);
        }
    });

    tokio::signal::ctrl_c().await?;

    // Final flush tick so the last partial interval survives teardown.
    run_tick(&config, &acc, &store);
    let snap = acc.lock().unwrap().snapshot();
    info!(total = %stats::format_hm(snap.total_seconds), track = %snap.last_track_id, "shutting down");
    Ok(())
}
