//! Simulated Bridge for Running Without an Instrument
//!
//! The instrument-bus driver for the capacitance bridge is not part of this
//! crate. This module provides a [`MeasurementSource`] that generates
//! plausible capacitance readings so the whole pipeline (sampling, flushing,
//! saving, display) can be exercised without hardware.
//!
//! # Data Patterns
//!
//! - [`SimulatedPattern::Constant`] - Fixed value
//! - [`SimulatedPattern::Sine`] - Sinusoid around an offset
//! - [`SimulatedPattern::Random`] - Uniform values within a range
//! - [`SimulatedPattern::Drift`] - Linear drift from a start value
//!
//! Every pattern can be overlaid with uniform noise.
//!
//! # Example
//!
//! ```ignore
//! use bridge_logger::backend::{SimulatedBridge, SimulatedPattern};
//!
//! let mut bridge = SimulatedBridge::new(SimulatedPattern::Drift { start: 100.0, rate: 0.01 })
//!     .with_noise(0.05)
//!     .with_seed(7);
//! let value = bridge.read()?;
//! ```

use crate::config::SourceConfig;
use crate::error::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::source::MeasurementSource;

/// Waveform produced by the simulated bridge
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SimulatedPattern {
    /// Constant value
    Constant { value: f64 },
    /// Sine wave: `offset + amplitude * sin(2π f t)`
    Sine {
        frequency: f64,
        amplitude: f64,
        offset: f64,
    },
    /// Uniform random values within `[min, max)`
    Random { min: f64, max: f64 },
    /// Linear drift: `start + rate * t`
    Drift { start: f64, rate: f64 },
}

impl Default for SimulatedPattern {
    fn default() -> Self {
        SimulatedPattern::Sine {
            frequency: 0.05,
            amplitude: 2.0,
            offset: 100.0,
        }
    }
}

impl SimulatedPattern {
    /// Noise-free value at `elapsed_secs`
    fn base_value(&self, elapsed_secs: f64, rng: &mut StdRng) -> f64 {
        match *self {
            SimulatedPattern::Constant { value } => value,
            SimulatedPattern::Sine {
                frequency,
                amplitude,
                offset,
            } => offset + amplitude * (2.0 * std::f64::consts::PI * frequency * elapsed_secs).sin(),
            SimulatedPattern::Random { min, max } => {
                if max > min {
                    rng.gen_range(min..max)
                } else {
                    min
                }
            }
            SimulatedPattern::Drift { start, rate } => start + rate * elapsed_secs,
        }
    }
}

/// Simulated capacitance bridge
pub struct SimulatedBridge {
    pattern: SimulatedPattern,
    noise_amplitude: f64,
    rng: StdRng,
    start_time: Instant,
    instrument_id: String,
    reads: u64,
}

impl SimulatedBridge {
    /// Create a simulator for `pattern` without noise
    pub fn new(pattern: SimulatedPattern) -> Self {
        Self {
            pattern,
            noise_amplitude: 0.0,
            rng: StdRng::from_entropy(),
            start_time: Instant::now(),
            instrument_id: String::from("SIM::BRIDGE"),
            reads: 0,
        }
    }

    /// Create a simulator from the `[source]` config section
    pub fn from_config(config: &SourceConfig) -> Self {
        Self::new(config.pattern).with_noise(config.noise_amplitude)
    }

    /// Add uniform noise of the given amplitude to every reading
    pub fn with_noise(mut self, amplitude: f64) -> Self {
        self.noise_amplitude = amplitude.abs();
        self
    }

    /// Use a deterministic random sequence
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Number of readings produced so far
    pub fn reads(&self) -> u64 {
        self.reads
    }

    /// Currently selected instrument address
    pub fn instrument_id(&self) -> &str {
        &self.instrument_id
    }
}

impl MeasurementSource for SimulatedBridge {
    fn read(&mut self) -> Result<f64> {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        let mut value = self.pattern.base_value(elapsed, &mut self.rng);
        if self.noise_amplitude > 0.0 {
            value += self.rng.gen_range(-self.noise_amplitude..=self.noise_amplitude);
        }
        self.reads += 1;
        Ok(value)
    }

    fn select_instrument(&mut self, instrument_id: &str) -> Result<()> {
        tracing::debug!("Simulated bridge now answering as '{}'", instrument_id);
        self.instrument_id = instrument_id.to_string();
        Ok(())
    }

    fn name(&self) -> String {
        format!("simulated bridge ({})", self.instrument_id)
    }
}
