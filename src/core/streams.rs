//! Wall-clock pruned sample logs.
//!
//! These keep every sample of the last W seconds, pruned by arrival time.
//! They are separate from the tick-indexed [`RollingWindow`](super::window::RollingWindow):
//! the ring is precise to the tick, these logs are precise to the millisecond.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::VecDeque;

/// A value stamped with its arrival time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimedValue {
    pub at: DateTime<Utc>,
    pub value: f64,
}

/// Descriptive statistics over a pruned log.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StreamSummary {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation, 0 with fewer than two samples
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

/// Append-only log pruned from the head by age.
#[derive(Debug, Clone)]
pub struct PrunedLog {
    max_age: Duration,
    samples: VecDeque<TimedValue>,
}

impl PrunedLog {
    pub fn new(max_age: Duration) -> Self {
        Self {
            max_age,
            samples: VecDeque::new(),
        }
    }

    pub fn push(&mut self, at: DateTime<Utc>, value: f64) {
        self.samples.push_back(TimedValue { at, value });
    }

    /// Drop every sample older than `max_age` relative to `now`.
    pub fn prune(&mut self, now: DateTime<Utc>) {
        let cutoff = now - self.max_age;
        while self.samples.front().is_some_and(|s| s.at < cutoff) {
            self.samples.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimedValue> {
        self.samples.iter()
    }

    pub fn summary(&self) -> Option<StreamSummary> {
        if self.samples.is_empty() {
            return None;
        }

        let values = || self.samples.iter().map(|s| s.value);
        let std_dev = if self.samples.len() < 2 {
            0.0
        } else {
            Statistics::std_dev(values())
        };

        Some(StreamSummary {
            count: self.samples.len(),
            mean: Statistics::mean(values()),
            std_dev,
            min: Statistics::min(values()),
            max: Statistics::max(values()),
        })
    }
}

/// The three per-signal logs fed by the sample store.
#[derive(Debug, Clone)]
pub struct SampleStreams {
    pub pressure: PrunedLog,
    pub tilt: PrunedLog,
    pub motion: PrunedLog,
}

impl SampleStreams {
    pub fn new(max_age: Duration) -> Self {
        Self {
            pressure: PrunedLog::new(max_age),
            tilt: PrunedLog::new(max_age),
            motion: PrunedLog::new(max_age),
        }
    }

    pub fn prune(&mut self, now: DateTime<Utc>) {
        self.pressure.prune(now);
        self.tilt.prune(now);
        self.motion.prune(now);
    }

    pub fn summary(&self) -> StreamsSummary {
        StreamsSummary {
            pressure: self.pressure.summary(),
            tilt: self.tilt.summary(),
            motion: self.motion.summary(),
        }
    }
}

/// Summaries of all three logs, `None` where a log is empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamsSummary {
    pub pressure: Option<StreamSummary>,
    pub tilt: Option<StreamSummary>,
    pub motion: Option<StreamSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prune_drops_only_old_samples() {
        let start = Utc::now();
        let mut log = PrunedLog::new(Duration::seconds(10));

        log.push(start, 1.0);
        log.push(start + Duration::seconds(5), 2.0);
        log.push(start + Duration::seconds(12), 3.0);

        log.prune(start + Duration::seconds(12));
        assert_eq!(log.len(), 2);
        assert_eq!(log.iter().next().unwrap().value, 2.0);

        log.prune(start + Duration::seconds(30));
        assert!(log.is_empty());
    }

    #[test]
    fn test_sample_exactly_at_cutoff_is_kept() {
        let start = Utc::now();
        let mut log = PrunedLog::new(Duration::seconds(10));
        log.push(start, 1.0);
        log.prune(start + Duration::seconds(10));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_summary() {
        let start = Utc::now();
        let mut log = PrunedLog::new(Duration::seconds(10));
        assert!(log.summary().is_none());

        log.push(start, 700.0);
        let single = log.summary().unwrap();
        assert_eq!(single.count, 1);
        assert_eq!(single.std_dev, 0.0);

        for v in [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
            log.push(start, v);
        }
        log.samples.pop_front();
        let summary = log.summary().unwrap();
        assert_eq!(summary.count, 8);
        assert!((summary.mean - 5.0).abs() < 1e-9);
        assert_eq!(summary.min, 2.0);
        assert_eq!(summary.max, 9.0);
        assert!((summary.std_dev - 2.138).abs() < 0.01);
    }
}
