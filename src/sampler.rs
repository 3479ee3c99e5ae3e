use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::time::Instant;

use crate::counters::CounterSnapshot;
use crate::series::MAX_SECOND_SPAN;

/// Adapters absent from the counter table for this many consecutive ticks
/// are dropped from the state map.
pub const STALE_TICKS: u64 = 600;

/// Last raw reading per adapter, diffed against on the next tick.
#[derive(Debug)]
struct AdapterState {
    last_recv: u64,
    last_sent: u64,
    last_stamp: Instant,
    last_seen_tick: u64,
}

/// One tick's aggregate output: instantaneous rates summed across adapters
/// and the timestamp anchoring the tick (the most recent reading seen).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickSample {
    pub recv_rate: u64,
    pub sent_rate: u64,
    pub stamp: Instant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SampleEvent {
    AdapterSeen(String),
    CounterReset(String),
    StalePruned(String),
}

impl fmt::Display for SampleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleEvent::AdapterSeen(name) => write!(f, "adapter {name} appeared"),
            SampleEvent::CounterReset(name) => write!(f, "adapter {name}: counters reset"),
            SampleEvent::StalePruned(name) => write!(f, "adapter {name}: dropped after inactivity"),
        }
    }
}

/// Converts cumulative per-adapter byte counters into one aggregate rate
/// pair per tick. Owns the per-adapter state map; anomalous readings
/// (counter reset, non-advancing clock, oversized gap) contribute nothing
/// for the tick but always resynchronize the stored state.
#[derive(Debug, Default)]
pub struct RateSampler {
    adapters: HashMap<String, AdapterState>,
    tick: u64,
}

impl RateSampler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sample(
        &mut self,
        snapshots: &[CounterSnapshot],
        now: Instant,
    ) -> (TickSample, Vec<SampleEvent>) {
        self.tick += 1;
        let mut events = Vec::new();
        let mut recv_rate = 0u64;
        let mut sent_rate = 0u64;
        let mut stamp: Option<Instant> = None;

        for snap in snapshots {
            match stamp {
                Some(s) if snap.stamp <= s => {}
                _ => stamp = Some(snap.stamp),
            }

            let state = match self.adapters.entry(snap.adapter.clone()) {
                Entry::Vacant(slot) => {
                    // First sighting: remember the raw reading, contribute
                    // nothing until there is a previous value to diff against.
                    events.push(SampleEvent::AdapterSeen(snap.adapter.clone()));
                    slot.insert(AdapterState {
                        last_recv: snap.recv_total,
                        last_sent: snap.sent_total,
                        last_stamp: snap.stamp,
                        last_seen_tick: self.tick,
                    });
                    continue;
                }
                Entry::Occupied(slot) => slot.into_mut(),
            };

            // An underflowing diff means the counter reset; that direction
            // contributes zero this tick.
            let diff_recv = snap.recv_total.checked_sub(state.last_recv);
            let diff_sent = snap.sent_total.checked_sub(state.last_sent);
            let dt = snap
                .stamp
                .checked_duration_since(state.last_stamp)
                .filter(|d| !d.is_zero());

            if diff_recv.is_none() || diff_sent.is_none() {
                events.push(SampleEvent::CounterReset(snap.adapter.clone()));
            }

            state.last_recv = snap.recv_total;
            state.last_sent = snap.sent_total;
            state.last_stamp = snap.stamp;
            state.last_seen_tick = self.tick;

            // Clock did not advance: state is refreshed above, nothing to add.
            let Some(dt) = dt else { continue };
            let secs = dt.as_secs_f64();
            // A gap longer than the history window (suspend/resume) would
            // average into a meaningless rate; skip it.
            if secs > MAX_SECOND_SPAN as f64 {
                continue;
            }

            recv_rate += (diff_recv.unwrap_or(0) as f64 / secs) as u64;
            sent_rate += (diff_sent.unwrap_or(0) as f64 / secs) as u64;
        }

        let tick = self.tick;
        self.adapters.retain(|name, state| {
            let keep = tick - state.last_seen_tick <= STALE_TICKS;
            if !keep {
                events.push(SampleEvent::StalePruned(name.clone()));
            }
            keep
        });

        let sample = TickSample {
            recv_rate,
            sent_rate,
            stamp: stamp.unwrap_or(now),
        };
        (sample, events)
    }

    #[cfg(test)]
    fn tracked_adapters(&self) -> usize {
        self.adapters.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn snap(adapter: &str, recv: u64, sent: u64, stamp: Instant) -> CounterSnapshot {
        CounterSnapshot {
            adapter: adapter.to_string(),
            recv_total: recv,
            sent_total: sent,
            stamp,
        }
    }

    #[test]
    fn first_sighting_contributes_nothing() {
        let t0 = Instant::now();
        let mut sampler = RateSampler::new();
        let (sample, events) = sampler.sample(&[snap("eth0", 1000, 500, t0)], t0);
        assert_eq!((sample.recv_rate, sample.sent_rate), (0, 0));
        assert_eq!(events, vec![SampleEvent::AdapterSeen("eth0".into())]);
    }

    #[test]
    fn one_second_diff_yields_bytes_per_second() {
        let t0 = Instant::now();
        let t1 = t0 + Duration::from_secs(1);
        let mut sampler = RateSampler::new();
        sampler.sample(&[snap("eth0", 1000, 500, t0)], t0);
        let (sample, _) = sampler.sample(&[snap("eth0", 2000, 1500, t1)], t1);
        assert_eq!(sample.recv_rate, 1000);
        assert_eq!(sample.sent_rate, 1000);
        assert_eq!(sample.stamp, t1);
    }

    #[test]
    fn rate_is_floored_over_longer_intervals() {
        let t0 = Instant::now();
        let t1 = t0 + Duration::from_secs(3);
        let mut sampler = RateSampler::new();
        sampler.sample(&[snap("eth0", 0, 0, t0)], t0);
        let (sample, _) = sampler.sample(&[snap("eth0", 1000, 100, t1)], t1);
        // floor(1000 / 3), floor(100 / 3)
        assert_eq!(sample.recv_rate, 333);
        assert_eq!(sample.sent_rate, 33);
    }

    #[test]
    fn aggregate_is_the_sum_over_adapters() {
        let t0 = Instant::now();
        let t1 = t0 + Duration::from_secs(1);
        let mut sampler = RateSampler::new();
        sampler.sample(&[snap("eth0", 0, 0, t0), snap("wlan0", 0, 0, t0)], t0);
        let (sample, _) =
            sampler.sample(&[snap("eth0", 300, 30, t1), snap("wlan0", 700, 70, t1)], t1);
        assert_eq!(sample.recv_rate, 1000);
        assert_eq!(sample.sent_rate, 100);
    }

    #[test]
    fn counter_reset_contributes_zero_and_resyncs() {
        let t0 = Instant::now();
        let t1 = t0 + Duration::from_secs(1);
        let t2 = t0 + Duration::from_secs(2);
        let mut sampler = RateSampler::new();
        sampler.sample(&[snap("eth0", 2000, 2000, t0)], t0);

        // Cumulative value went backwards: reset, not a wrapped diff.
        let (sample, events) = sampler.sample(&[snap("eth0", 500, 2500, t1)], t1);
        assert_eq!(sample.recv_rate, 0);
        assert_eq!(sample.sent_rate, 500);
        assert!(events.contains(&SampleEvent::CounterReset("eth0".into())));

        // State now holds the new raw reading, so the next diff is sane.
        let (sample, _) = sampler.sample(&[snap("eth0", 1500, 2600, t2)], t2);
        assert_eq!(sample.recv_rate, 1000);
        assert_eq!(sample.sent_rate, 100);
    }

    #[test]
    fn non_advancing_stamp_skips_but_refreshes_state() {
        let t0 = Instant::now();
        let t1 = t0 + Duration::from_secs(1);
        let mut sampler = RateSampler::new();
        sampler.sample(&[snap("eth0", 1000, 1000, t0)], t0);

        // Same stamp again: no contribution, but counters are taken.
        let (sample, _) = sampler.sample(&[snap("eth0", 9000, 9000, t0)], t0);
        assert_eq!((sample.recv_rate, sample.sent_rate), (0, 0));

        // The next tick diffs against 9000, not 1000.
        let (sample, _) = sampler.sample(&[snap("eth0", 9100, 9200, t1)], t1);
        assert_eq!(sample.recv_rate, 100);
        assert_eq!(sample.sent_rate, 200);
    }

    #[test]
    fn oversized_gap_is_discarded() {
        let t0 = Instant::now();
        let t1 = t0 + Duration::from_secs(MAX_SECOND_SPAN + 100);
        let mut sampler = RateSampler::new();
        sampler.sample(&[snap("eth0", 0, 0, t0)], t0);
        let (sample, _) = sampler.sample(&[snap("eth0", 1 << 30, 1 << 30, t1)], t1);
        assert_eq!((sample.recv_rate, sample.sent_rate), (0, 0));
    }

    #[test]
    fn empty_snapshot_list_anchors_on_now() {
        let t0 = Instant::now();
        let mut sampler = RateSampler::new();
        let (sample, events) = sampler.sample(&[], t0);
        assert_eq!((sample.recv_rate, sample.sent_rate), (0, 0));
        assert_eq!(sample.stamp, t0);
        assert!(events.is_empty());
    }

    #[test]
    fn effective_stamp_is_the_newest_reading() {
        let t0 = Instant::now();
        let older = t0 + Duration::from_secs(1);
        let newer = t0 + Duration::from_secs(2);
        let mut sampler = RateSampler::new();
        let (sample, _) =
            sampler.sample(&[snap("eth0", 0, 0, newer), snap("wlan0", 0, 0, older)], t0);
        assert_eq!(sample.stamp, newer);
    }

    #[test]
    fn unseen_adapters_are_pruned_after_stale_ticks() {
        let t0 = Instant::now();
        let mut sampler = RateSampler::new();
        sampler.sample(&[snap("usb0", 0, 0, t0)], t0);
        assert_eq!(sampler.tracked_adapters(), 1);

        let mut pruned = Vec::new();
        for i in 1..=STALE_TICKS + 1 {
            let now = t0 + Duration::from_secs(i);
            let (_, events) = sampler.sample(&[], now);
            pruned.extend(events);
        }
        assert_eq!(pruned, vec![SampleEvent::StalePruned("usb0".into())]);
        assert_eq!(sampler.tracked_adapters(), 0);
    }
}
