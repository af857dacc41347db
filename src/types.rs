//! Core data types for bridge-logger
//!
//! This module contains the fundamental data structures shared by the
//! sampling loop, the controller and the storage layer.
//!
//! # Main Types
//!
//! - [`Sample`] - A single timestamped bridge reading
//! - [`SampleBuffer`] - Fixed-capacity live buffer with flush-on-overflow
//! - [`SamplingStats`] - Counters kept by the sampling loop
//!
//! # Buffer Discipline
//!
//! The live buffer never grows past its capacity. When the last slot is
//! filled, every sample except the newest is handed to durable storage and
//! the newest stays behind as the head of the next fill. The head is not yet
//! persisted, so a sample is written exactly once and the elapsed-time axis
//! stays continuous across flush boundaries.

use serde::{Deserialize, Serialize};

/// Default live buffer capacity
pub const DEFAULT_BUFFER_CAPACITY: usize = 100;

/// Smallest capacity that still makes progress on flush
pub const MIN_BUFFER_CAPACITY: usize = 2;

/// A single bridge reading
///
/// Field names double as the CSV header of saved files.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Seconds since the recording clock started
    pub elapsed_time: f64,
    /// Measured value (capacitance in pF for a bridge)
    pub value: f64,
}

impl Sample {
    /// Create a new sample
    pub fn new(elapsed_time: f64, value: f64) -> Self {
        Self {
            elapsed_time,
            value,
        }
    }

    /// Convert to a plot point `[x, y]`
    pub fn as_point(&self) -> [f64; 2] {
        [self.elapsed_time, self.value]
    }
}

/// Fixed-capacity live sample buffer
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    samples: Vec<Sample>,
    capacity: usize,
}

impl Default for SampleBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_CAPACITY)
    }
}

impl SampleBuffer {
    /// Create an empty buffer; capacities below [`MIN_BUFFER_CAPACITY`] are raised to it
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(MIN_BUFFER_CAPACITY);
        Self {
            samples: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Maximum number of samples held
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current fill index
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if the buffer holds no samples
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Check if the buffer reached capacity and must be flushed
    pub fn is_full(&self) -> bool {
        self.samples.len() >= self.capacity
    }

    /// Append a sample
    ///
    /// Returns `false` and drops the sample if the buffer is full; callers
    /// flush before pushing again.
    pub fn push(&mut self, sample: Sample) -> bool {
        if self.is_full() {
            return false;
        }
        self.samples.push(sample);
        true
    }

    /// Samples that the next flush would persist (all but the newest)
    pub fn flushable(&self) -> &[Sample] {
        match self.samples.len() {
            0 => &[],
            n => &self.samples[..n - 1],
        }
    }

    /// Take everything except the newest sample, which becomes the new head
    ///
    /// After this call the fill index is 1 (or 0 if the buffer was empty).
    pub fn take_flushable(&mut self) -> Vec<Sample> {
        match self.samples.pop() {
            Some(head) => {
                let fresh = Vec::with_capacity(self.capacity);
                let flushed = std::mem::replace(&mut self.samples, fresh);
                self.samples.push(head);
                flushed
            }
            None => Vec::new(),
        }
    }

    /// Newest sample, if any
    pub fn last(&self) -> Option<&Sample> {
        self.samples.last()
    }

    /// First sample, if any
    pub fn first(&self) -> Option<&Sample> {
        self.samples.first()
    }

    /// All live samples in recording order
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Empty the buffer (fill index 0)
    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

/// Counters kept by the sampling loop
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SamplingStats {
    /// Samples appended to the live buffer
    pub samples_recorded: u64,
    /// Measurement reads that failed
    pub read_failures: u64,
    /// Overflow flushes performed
    pub flushes: u64,
    /// Rows appended to the temp store
    pub rows_flushed: u64,
    /// Successful saves
    pub saves: u64,
    /// Resets serviced
    pub resets: u64,
}

impl std::fmt::Display for SamplingStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} samples ({} failed reads), {} flushes / {} rows, {} saves, {} resets",
            self.samples_recorded,
            self.read_failures,
            self.flushes,
            self.rows_flushed,
            self.saves,
            self.resets
        )
    }
}
