//! MeasurementSource trait for a unified instrument interface
//!
//! This module provides a common trait for anything that can produce bridge
//! readings, enabling both real instrument drivers and the simulated bridge
//! (or a test double) to be plugged into the sampling loop.

use crate::error::Result;

/// Unified interface for measurement sources
///
/// Implementations must be `Send` because the sampling loop owns the source
/// on its own thread.
///
/// # Example
///
/// ```ignore
/// fn read_once(source: &mut dyn MeasurementSource) -> Result<f64> {
///     source.read()
/// }
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait MeasurementSource: Send {
    /// Read one value from the instrument
    fn read(&mut self) -> Result<f64>;

    /// Point the source at a different instrument address
    ///
    /// Sources without addressable instruments accept any id.
    fn select_instrument(&mut self, _instrument_id: &str) -> Result<()> {
        Ok(())
    }

    /// Human readable name for logs
    fn name(&self) -> String {
        String::from("measurement source")
    }
}
