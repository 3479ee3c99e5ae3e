use std::time::Instant;

use thiserror::Error;

/// Kernel counter table with one line per interface.
pub const PROC_NET_DEV: &str = "/proc/net/dev";

/// One adapter's cumulative counters as read this tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub adapter: String,
    pub recv_total: u64,
    pub sent_total: u64,
    pub stamp: Instant,
}

#[derive(Debug, Error)]
pub enum CountersError {
    #[error("cannot read /proc/net/dev: {0}")]
    Unavailable(#[source] std::io::Error),
    #[error("unrecognized counter table in /proc/net/dev")]
    Unrecognized,
}

/// Read cumulative per-adapter counters. The loopback interface is skipped
/// unless asked for, since it only mirrors local traffic.
pub fn read_snapshots(
    include_loopback: bool,
    now: Instant,
) -> Result<Vec<CounterSnapshot>, CountersError> {
    let text = std::fs::read_to_string(PROC_NET_DEV).map_err(CountersError::Unavailable)?;
    parse_counter_table(&text, include_loopback, now).ok_or(CountersError::Unrecognized)
}

// Pure parser over the table text for easier testing. Returns None when the
// text is not a counter table at all; individual malformed lines are skipped.
pub(crate) fn parse_counter_table(
    text: &str,
    include_loopback: bool,
    stamp: Instant,
) -> Option<Vec<CounterSnapshot>> {
    // Two header lines, then "iface: rx-bytes ... [8 fields] tx-bytes ...".
    if text.lines().count() < 2 {
        return None;
    }

    let mut snapshots = Vec::new();
    for line in text.lines().skip(2) {
        let Some((name_raw, stats_raw)) = line.split_once(':') else {
            continue;
        };
        let adapter = name_raw.trim();
        if adapter.is_empty() || (!include_loopback && adapter == "lo") {
            continue;
        }
        let fields: Vec<u64> = stats_raw
            .split_whitespace()
            .filter_map(|s| s.parse::<u64>().ok())
            .collect();
        if fields.len() < 16 {
            continue;
        }
        snapshots.push(CounterSnapshot {
            adapter: adapter.to_string(),
            recv_total: fields[0],
            sent_total: fields[8],
            stamp,
        });
    }
    Some(snapshots)
}
