//! Display side of a session
//!
//! [`DisplaySink`] is whatever consumes readings on the display cadence: the
//! console, a plot, or a test double. [`SampleHistory`] keeps the recent
//! samples a plotting sink needs.

use crate::error::BridgeLogError;
use crate::session::SessionStatus;
use crate::types::Sample;
use std::collections::VecDeque;

/// Consumer of live readings
#[cfg_attr(test, mockall::automock)]
pub trait DisplaySink {
    /// Show the most recent sample
    fn show(&mut self, sample: &Sample);

    /// Surface a failure to the user
    fn report_error(&mut self, error: &BridgeLogError) {
        tracing::warn!("{}", error);
    }

    /// Show a status snapshot
    fn show_status(&mut self, status: &SessionStatus) {
        tracing::info!("{}", status);
    }
}

/// Bounded ring of recent samples for plotting
#[derive(Debug, Clone)]
pub struct SampleHistory {
    samples: VecDeque<Sample>,
    max_points: usize,
}

impl SampleHistory {
    /// Create an empty history holding at most `max_points` samples
    pub fn new(max_points: usize) -> Self {
        let max_points = max_points.max(1);
        Self {
            samples: VecDeque::with_capacity(max_points),
            max_points,
        }
    }

    /// Add a sample, evicting the oldest when full
    ///
    /// The same sample shown twice is recorded once. A sample older than
    /// the newest one means the session clock restarted, so the history is
    /// cleared first.
    pub fn push(&mut self, sample: Sample) {
        if let Some(last) = self.samples.back() {
            if *last == sample {
                return;
            }
            if sample.elapsed_time < last.elapsed_time {
                self.samples.clear();
            }
        }
        if self.samples.len() >= self.max_points {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// Number of samples held
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Maximum number of samples held
    pub fn max_points(&self) -> usize {
        self.max_points
    }

    /// Newest sample
    pub fn last(&self) -> Option<&Sample> {
        self.samples.back()
    }

    /// Iterate oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }

    /// Samples as `[time, value]` plot points
    pub fn as_plot_points(&self) -> Vec<[f64; 2]> {
        self.samples.iter().map(Sample::as_point).collect()
    }

    /// Time span covered
    pub fn time_range(&self) -> Option<(f64, f64)> {
        let first = self.samples.front()?.elapsed_time;
        let last = self.samples.back()?.elapsed_time;
        Some((first, last))
    }

    /// Smallest and largest value held
    pub fn value_range(&self) -> Option<(f64, f64)> {
        if self.samples.is_empty() {
            return None;
        }
        let mut min = f64::MAX;
        let mut max = f64::MIN;
        for sample in &self.samples {
            min = min.min(sample.value);
            max = max.max(sample.value);
        }
        Some((min, max))
    }

    /// Drop everything
    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_is_bounded() {
        let mut history = SampleHistory::new(3);
        for i in 0..5 {
            history.push(Sample::new(i as f64, i as f64 * 10.0));
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.time_range(), Some((2.0, 4.0)));
        assert_eq!(history.value_range(), Some((20.0, 40.0)));
    }

    #[test]
    fn test_repeated_sample_recorded_once() {
        let mut history = SampleHistory::new(10);
        let sample = Sample::new(1.0, 5.0);
        history.push(sample);
        history.push(sample);
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_clock_restart_clears() {
        let mut history = SampleHistory::new(10);
        history.push(Sample::new(5.0, 1.0));
        history.push(Sample::new(6.0, 2.0));
        history.push(Sample::new(0.0, 3.0));
        assert_eq!(history.as_plot_points(), vec![[0.0, 3.0]]);
    }

    #[test]
    fn test_zero_capacity_clamped() {
        let mut history = SampleHistory::new(0);
        assert_eq!(history.max_points(), 1);
        history.push(Sample::new(0.0, 1.0));
        history.push(Sample::new(1.0, 2.0));
        assert_eq!(history.last(), Some(&Sample::new(1.0, 2.0)));
        assert_eq!(history.len(), 1);
    }
}
