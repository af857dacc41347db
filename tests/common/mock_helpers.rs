//! Test doubles for the measurement source and display sink

use bridge_logger::{BridgeLogError, DisplaySink, MeasurementSource, Result, Sample};
use std::sync::{Arc, Mutex};

/// Source returning 0, 1, 2, ... so every reading is distinguishable
#[derive(Debug, Default)]
pub struct CountingSource {
    next: u64,
    pub instruments: Arc<Mutex<Vec<String>>>,
}

impl CountingSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MeasurementSource for CountingSource {
    fn read(&mut self) -> Result<f64> {
        let value = self.next as f64;
        self.next += 1;
        Ok(value)
    }

    fn select_instrument(&mut self, instrument_id: &str) -> Result<()> {
        if let Ok(mut ids) = self.instruments.lock() {
            ids.push(instrument_id.to_string());
        }
        Ok(())
    }

    fn name(&self) -> String {
        "counting source".to_string()
    }
}

/// Source that fails every `fail_every`-th read
#[derive(Debug)]
pub struct FlakySource {
    reads: u64,
    fail_every: u64,
}

impl FlakySource {
    pub fn new(fail_every: u64) -> Self {
        Self {
            reads: 0,
            fail_every: fail_every.max(1),
        }
    }
}

impl MeasurementSource for FlakySource {
    fn read(&mut self) -> Result<f64> {
        self.reads += 1;
        if self.reads % self.fail_every == 0 {
            Err(BridgeLogError::Source("bus timeout".to_string()))
        } else {
            Ok(self.reads as f64)
        }
    }
}

/// Sink that records everything it is given
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub shown: Vec<Sample>,
    pub errors: Vec<String>,
    pub statuses: Vec<String>,
}

impl DisplaySink for RecordingSink {
    fn show(&mut self, sample: &Sample) {
        self.shown.push(*sample);
    }

    fn report_error(&mut self, error: &BridgeLogError) {
        self.errors.push(error.to_string());
    }

    fn show_status(&mut self, status: &bridge_logger::session::SessionStatus) {
        self.statuses.push(status.to_string());
    }
}
