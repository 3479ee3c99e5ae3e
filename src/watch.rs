use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossbeam_channel as channel;
use tracing::{debug, info, warn};

use crate::cli::Watch;
use crate::counters::read_snapshots;
use crate::sampler::{RateSampler, TickSample};
use crate::tui;

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Run the live meter: a sampler thread owns the counter source and the
/// per-adapter state, pacing at one tick per second and handing each
/// `TickSample` to the UI thread over a bounded channel. The UI thread owns
/// the series history and the projection, so no state is shared.
pub fn run_watch(watch: Watch) -> Result<()> {
    let stop_flag = Arc::new(AtomicBool::new(false));
    {
        let stop = stop_flag.clone();
        let _ = ctrlc::set_handler(move || {
            stop.store(true, Ordering::Relaxed);
        });
    }

    info!(scale = ?watch.scale, loopback = watch.all, "Starting netmeter");

    let (tick_tx, tick_rx) = channel::bounded::<TickSample>(8);
    let (event_tx, event_rx) = channel::unbounded::<String>();

    let stop_sampler = stop_flag.clone();
    let include_loopback = watch.all;
    let sampler_handle = thread::spawn(move || {
        let mut sampler = RateSampler::new();
        let mut source_down = false;
        while !stop_sampler.load(Ordering::Relaxed) {
            let started = Instant::now();

            let snapshots = match read_snapshots(include_loopback, started) {
                Ok(snaps) => {
                    if source_down {
                        source_down = false;
                        let _ = event_tx.send("counter source recovered".to_string());
                    }
                    snaps
                }
                Err(err) => {
                    // A failed read is a tick with zero adapters, not fatal.
                    if !source_down {
                        source_down = true;
                        warn!(%err, "Counter read failed");
                        let _ = event_tx.send(format!("counter source unavailable: {err}"));
                    }
                    Vec::new()
                }
            };

            let (sample, events) = sampler.sample(&snapshots, started);
            for event in events {
                let _ = event_tx.send(event.to_string());
            }
            debug!(recv_bps = sample.recv_rate, sent_bps = sample.sent_rate, "Tick");

            if tick_tx.send(sample).is_err() {
                // UI side went away
                break;
            }

            // Fixed cadence: an overrunning tick delays the next one, ticks
            // are never coalesced or replayed.
            let elapsed = started.elapsed();
            if elapsed < TICK_PERIOD {
                thread::sleep(TICK_PERIOD - elapsed);
            }
        }
    });

    let result = tui::run_tui(watch.scale.into(), tick_rx, event_rx, stop_flag.clone());

    stop_flag.store(true, Ordering::Relaxed);
    let _ = sampler_handle.join();
    info!("Shutting down");
    result
}
