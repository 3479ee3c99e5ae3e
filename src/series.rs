use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Longest elapsed span of history retained per direction, in seconds.
/// Also bounds how large a per-adapter sampling gap may be before the
/// reading is discarded (see `sampler`).
pub const MAX_SECOND_SPAN: u64 = 3600;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatePoint {
    pub stamp: Instant,
    pub bytes_per_sec: u64,
}

/// Rate history for one direction: appended at the tail once per tick,
/// evicted from the head once the total span exceeds MAX_SECOND_SPAN.
#[derive(Debug, Default)]
pub struct RateSeries {
    points: VecDeque<RatePoint>,
}

impl RateSeries {
    pub fn push(&mut self, stamp: Instant, bytes_per_sec: u64) {
        self.points.push_back(RatePoint { stamp, bytes_per_sec });
        while self.points.len() > 1 && self.span() > Duration::from_secs(MAX_SECOND_SPAN) {
            self.points.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn oldest(&self) -> Option<&RatePoint> {
        self.points.front()
    }

    pub fn newest(&self) -> Option<&RatePoint> {
        self.points.back()
    }

    /// Elapsed time between the oldest and newest retained points.
    /// A series with fewer than two points has zero span.
    pub fn span(&self) -> Duration {
        match (self.oldest(), self.newest()) {
            (Some(first), Some(last)) => last.stamp.saturating_duration_since(first.stamp),
            _ => Duration::ZERO,
        }
    }

    pub fn span_seconds(&self) -> f64 {
        self.span().as_secs_f64()
    }

    pub fn max_value(&self) -> u64 {
        self.points.iter().map(|p| p.bytes_per_sec).max().unwrap_or(0)
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &RatePoint> {
        self.points.iter()
    }
}

/// The two per-direction series, driven by the same tick cadence.
#[derive(Debug, Default)]
pub struct SeriesStore {
    up: RateSeries,
    down: RateSeries,
}

impl SeriesStore {
    pub fn record(&mut self, stamp: Instant, recv_rate: u64, sent_rate: u64) {
        self.up.push(stamp, sent_rate);
        self.down.push(stamp, recv_rate);
    }

    pub fn up(&self) -> &RateSeries {
        &self.up
    }

    pub fn down(&self) -> &RateSeries {
        &self.down
    }

    /// Min and max over both directions' retained values, for a shared
    /// vertical scale. `max <= min` means there is not enough data to draw.
    pub fn min_max(&self) -> (u64, u64) {
        let mut values = self.up.iter().chain(self.down.iter()).map(|p| p.bytes_per_sec);
        let first = match values.next() {
            Some(v) => v,
            None => return (0, 0),
        };
        values.fold((first, first), |(min, max), v| (min.min(v), max.max(v)))
    }
}
