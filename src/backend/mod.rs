//! Backend module for bridge sampling
//!
//! This module runs the sampling loop in a separate thread so the front end
//! stays responsive. The loop and the controller talk through the
//! single-slot mailboxes in [`crate::signals`] (controller -> loop) and a
//! bounded crossbeam channel of [`SessionEvent`]s (loop -> controller).
//!
//! # Components
//!
//! - [`MeasurementSource`] - Trait implemented by instrument drivers and test doubles
//! - [`SimulatedBridge`] - Source generating placeholder capacitance readings
//! - [`SamplingLoop`] - Worker loop: services signals, samples, flushes, saves
//!
//! # Example
//!
//! ```ignore
//! use bridge_logger::backend::{event_channel, SamplingLoop, SimulatedBridge};
//!
//! let (event_tx, event_rx) = event_channel();
//! let signals = SignalSet::new();
//! let sampling = SamplingLoop::new(
//!     Box::new(SimulatedBridge::new(Default::default())),
//!     TempStore::create("temp_data.txt")?,
//!     &config.storage,
//!     config.session.clone(),
//!     signals.clone(),
//!     event_tx,
//! );
//! let handle = sampling.spawn()?;
//!
//! for event in event_rx.try_iter() {
//!     // Handle loop events
//! }
//! ```

pub mod simulated;
pub mod source;
pub mod worker;

pub use simulated::{SimulatedBridge, SimulatedPattern};
pub use source::MeasurementSource;
pub use worker::SamplingLoop;

use crate::types::SamplingStats;
use crossbeam_channel::{bounded, Receiver, Sender};
use std::path::PathBuf;

/// Capacity of the loop -> controller event queue
pub const EVENT_QUEUE_CAPACITY: usize = 1024;

/// Message sent from the sampling loop to the controller
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Recording state changed inside the loop
    RecordingChanged(bool),
    /// The loop stopped recording on its own after a storage failure
    RecordingHalted,
    /// The live buffer overflowed and was flushed to the temp store
    Flushed { rows: usize },
    /// A save request finished
    SaveCompleted { destination: PathBuf, rows: usize },
    /// A save request failed; recording is halted
    SaveFailed { destination: PathBuf, error: String },
    /// A reset request finished
    ResetCompleted,
    /// Temp store IO failed; recording is halted
    StorageError(String),
    /// The loop exited
    Stopped(SamplingStats),
}

/// Create the bounded loop -> controller event channel
pub fn event_channel() -> (Sender<SessionEvent>, Receiver<SessionEvent>) {
    bounded(EVENT_QUEUE_CAPACITY)
}
