//! Metrics samples and the sliding window that retains them
//!
//! Wire readings ([`MetricsPoint`](crate::types::MetricsPoint)) are converted
//! to display-ready [`Sample`]s at ingest. A [`SampleWindow`] holds the recent
//! samples for one console view under a single eviction policy.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::types::MetricsPoint;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// One display-ready metrics sample.
///
/// `cpu` and `memory_mb` are rounded to two decimals here, at creation.
/// Render code plots the stored values directly and never re-rounds.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Clock label as the backend formatted it
    pub time: String,
    /// CPU load in percent
    pub cpu: f32,
    /// Resident memory in megabytes
    pub memory_mb: f64,
    /// Arrival instant, used only for age-based eviction
    pub at: Instant,
}

impl Sample {
    /// Convert a wire reading into a window sample.
    pub fn from_point(point: &MetricsPoint, at: Instant) -> Self {
        Self {
            time: point.time.clone(),
            cpu: round2_f32(point.cpu_usage),
            memory_mb: round2(point.memory_usage as f64 / BYTES_PER_MB),
            at,
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn round2_f32(value: f32) -> f32 {
    (value * 100.0).round() / 100.0
}

/// Which samples a window keeps after every push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionPolicy {
    /// Keep samples no older than this, measured against the newest sample
    MaxAge(Duration),
    /// Keep at most this many samples, dropping the oldest first
    MaxCount(usize),
}

/// Sliding window of metrics samples for one console view.
///
/// Exactly one policy applies per window. Eviction runs on every push, so the
/// window never holds more than the policy allows between reads.
#[derive(Debug, Clone)]
pub struct SampleWindow {
    samples: VecDeque<Sample>,
    policy: EvictionPolicy,
}

impl SampleWindow {
    pub fn new(policy: EvictionPolicy) -> Self {
        Self {
            samples: VecDeque::new(),
            policy,
        }
    }

    /// Append a sample and evict per the policy.
    ///
    /// Age eviction is measured against the incoming sample, so a stalled
    /// clock between pushes never drops anything on its own.
    pub fn push(&mut self, sample: Sample) {
        let newest_at = sample.at;
        self.samples.push_back(sample);

        match self.policy {
            EvictionPolicy::MaxAge(retention) => {
                while let Some(front) = self.samples.front() {
                    if newest_at.duration_since(front.at) > retention {
                        self.samples.pop_front();
                    } else {
                        break;
                    }
                }
            }
            EvictionPolicy::MaxCount(cap) => {
                while self.samples.len() > cap {
                    self.samples.pop_front();
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn policy(&self) -> EvictionPolicy {
        self.policy
    }

    /// Iterate oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }

    /// Most recent sample, if any.
    pub fn latest(&self) -> Option<&Sample> {
        self.samples.back()
    }

    /// Oldest retained sample, if any.
    pub fn oldest(&self) -> Option<&Sample> {
        self.samples.front()
    }

    /// Drop every sample, keeping the policy.
    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_at(base: Instant, offset_secs: u64, cpu: f32) -> Sample {
        Sample {
            time: format!("12:00:{:02}", offset_secs),
            cpu,
            memory_mb: 512.0,
            at: base + Duration::from_secs(offset_secs),
        }
    }

    #[test]
    fn test_sample_rounds_cpu_to_two_decimals() {
        let point = MetricsPoint {
            time: "14:02:33".to_string(),
            cpu_usage: 12.3456,
            memory_usage: 0,
        };
        let sample = Sample::from_point(&point, Instant::now());
        assert_eq!(sample.cpu, 12.35);
        assert_eq!(sample.time, "14:02:33");
    }

    #[test]
    fn test_sample_converts_bytes_to_megabytes() {
        let point = MetricsPoint {
            time: "14:02:33".to_string(),
            cpu_usage: 0.0,
            // 2.5 GiB
            memory_usage: 2_684_354_560,
        };
        let sample = Sample::from_point(&point, Instant::now());
        assert_eq!(sample.memory_mb, 2560.0);

        let point = MetricsPoint {
            time: "14:02:34".to_string(),
            cpu_usage: 0.0,
            memory_usage: 1_234_567,
        };
        let sample = Sample::from_point(&point, Instant::now());
        // 1_234_567 / 1_048_576 = 1.17739... rounds to 1.18
        assert_eq!(sample.memory_mb, 1.18);
    }

    #[test]
    fn test_count_window_drops_oldest_at_capacity() {
        let base = Instant::now();
        let mut window = SampleWindow::new(EvictionPolicy::MaxCount(3));

        for i in 0..5 {
            window.push(sample_at(base, i, i as f32));
        }

        assert_eq!(window.len(), 3);
        assert_eq!(window.oldest().map(|s| s.cpu), Some(2.0));
        assert_eq!(window.latest().map(|s| s.cpu), Some(4.0));
    }

    #[test]
    fn test_age_window_retains_relative_to_newest() {
        let base = Instant::now();
        let mut window = SampleWindow::new(EvictionPolicy::MaxAge(Duration::from_secs(30)));

        for offset in [0, 10, 20, 40] {
            window.push(sample_at(base, offset, offset as f32));
        }

        // Newest is at +40s; +0s is 40s old and gets dropped, the rest stay.
        let kept: Vec<f32> = window.iter().map(|s| s.cpu).collect();
        assert_eq!(kept, vec![10.0, 20.0, 40.0]);
    }

    #[test]
    fn test_age_window_keeps_sample_exactly_at_retention() {
        let base = Instant::now();
        let mut window = SampleWindow::new(EvictionPolicy::MaxAge(Duration::from_secs(30)));

        window.push(sample_at(base, 0, 1.0));
        window.push(sample_at(base, 30, 2.0));

        assert_eq!(window.len(), 2);
    }

    #[test]
    fn test_age_window_evicts_in_one_push() {
        let base = Instant::now();
        let mut window = SampleWindow::new(EvictionPolicy::MaxAge(Duration::from_secs(5)));

        window.push(sample_at(base, 0, 1.0));
        window.push(sample_at(base, 1, 2.0));
        window.push(sample_at(base, 2, 3.0));
        // Large gap invalidates everything before it.
        window.push(sample_at(base, 100, 4.0));

        assert_eq!(window.len(), 1);
        assert_eq!(window.latest().map(|s| s.cpu), Some(4.0));
    }

    #[test]
    fn test_iter_runs_oldest_to_newest() {
        let base = Instant::now();
        let mut window = SampleWindow::new(EvictionPolicy::MaxCount(10));
        window.push(sample_at(base, 0, 1.0));
        window.push(sample_at(base, 1, 2.0));
        window.push(sample_at(base, 2, 3.0));

        let order: Vec<f32> = window.iter().map(|s| s.cpu).collect();
        assert_eq!(order, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_clear_empties_but_keeps_policy() {
        let base = Instant::now();
        let mut window = SampleWindow::new(EvictionPolicy::MaxCount(2));
        window.push(sample_at(base, 0, 1.0));
        window.clear();

        assert!(window.is_empty());
        assert_eq!(window.policy(), EvictionPolicy::MaxCount(2));
    }
}
