//! Sampling Loop Implementation
//!
//! This module contains the worker loop that runs in a separate thread and
//! owns the live sample buffer. It is the only writer of the buffer and the
//! temp store.
//!
//! # Iteration
//!
//! Every iteration services the control signals in a fixed order, then
//! samples once if recording, then sleeps for the rest of the sample
//! interval:
//!
//! 1. `shutdown_requested` - exit immediately, unflushed samples are dropped
//! 2. `save_requested` - write temp store + live buffer to the destination
//! 3. `record_toggled` - adopt the new recording state and config snapshot
//! 4. `reset_requested` - drop the buffer, the temp store and `data_ready`
//!
//! A pending save or reset is therefore always serviced before new data is
//! appended in the same iteration.
//!
//! # Error Handling
//!
//! Measurement read failures are logged and counted; the tick simply yields
//! no sample. Storage failures halt recording and are reported to the
//! controller as [`SessionEvent`]s.

use crate::backend::{MeasurementSource, SessionEvent};
use crate::config::{SessionConfig, StorageConfig};
use crate::error::{BridgeLogError, Result};
use crate::signals::{RecordState, SaveRequest, SignalSet};
use crate::storage::{write_destination, TempStore};
use crate::types::{Sample, SampleBuffer, SamplingStats};
use crossbeam_channel::{Sender, TrySendError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Name of the background sampling thread
pub const SAMPLING_THREAD_NAME: &str = "sampling-loop";

/// The worker that produces samples at the configured interval
pub struct SamplingLoop {
    /// Instrument being polled
    source: Box<dyn MeasurementSource>,
    /// Append-only store for flushed samples
    store: TempStore,
    /// Live buffer
    buffer: SampleBuffer,
    /// Latest config snapshot received from the controller
    config: SessionConfig,
    /// Empty the temp store and buffer after a successful save
    clear_temp_after_save: bool,
    /// Shared signals
    signals: SignalSet,
    /// Event sender to the controller
    events: Sender<SessionEvent>,
    /// Whether sampling is active
    recording: bool,
    /// Zero point of the elapsed-time axis
    clock_start: Option<Instant>,
    /// Last iteration time for rate limiting
    last_tick: Instant,
    /// Set once the controller side has gone away
    detached: bool,
    /// Statistics
    stats: SamplingStats,
}

impl SamplingLoop {
    /// Create a new sampling loop
    pub fn new(
        source: Box<dyn MeasurementSource>,
        store: TempStore,
        storage: &StorageConfig,
        config: SessionConfig,
        signals: SignalSet,
        events: Sender<SessionEvent>,
    ) -> Self {
        Self {
            source,
            store,
            buffer: SampleBuffer::new(storage.buffer_capacity),
            config,
            clear_temp_after_save: storage.clear_temp_after_save,
            signals,
            events,
            recording: false,
            clock_start: None,
            last_tick: Instant::now(),
            detached: false,
            stats: SamplingStats::default(),
        }
    }

    /// Run the loop on a dedicated named thread
    pub fn spawn(self) -> Result<JoinHandle<SamplingStats>> {
        std::thread::Builder::new()
            .name(SAMPLING_THREAD_NAME.to_string())
            .spawn(move || self.run())
            .map_err(|e| BridgeLogError::Io(e).with_context("Failed to spawn sampling thread"))
    }

    /// Run until shutdown is requested or the controller disappears
    pub fn run(mut self) -> SamplingStats {
        tracing::info!(
            "Sampling loop started ({}, capacity {}, temp store {})",
            self.source.name(),
            self.buffer.capacity(),
            self.store.path().display()
        );

        while self.step() {
            self.rate_limit();
        }

        if !self.buffer.is_empty() {
            tracing::warn!(
                "Sampling loop exiting with {} unflushed samples",
                self.buffer.len()
            );
        }
        tracing::info!("Sampling loop stopped: {}", self.stats);
        let _ = self.events.try_send(SessionEvent::Stopped(self.stats.clone()));
        self.stats
    }

    /// One iteration without the interval sleep
    ///
    /// Returns `false` once the loop should exit.
    pub fn step(&mut self) -> bool {
        if !self.service_signals() {
            return false;
        }
        if self.recording {
            self.tick();
        }
        !self.detached
    }

    /// Service pending signals in priority order
    fn service_signals(&mut self) -> bool {
        if self.signals.shutdown_requested.take().is_some() {
            tracing::info!("Shutdown requested");
            return false;
        }
        if let Some(request) = self.signals.save_requested.take() {
            self.on_save_requested(request);
        }
        if let Some(state) = self.signals.record_toggled.take() {
            self.on_record_toggled(state);
        }
        if self.signals.reset_requested.take().is_some() {
            self.on_reset_requested();
        }
        true
    }

    /// Read one value, timestamp it and append it to the buffer
    fn tick(&mut self) {
        // A failed flush leaves the buffer full; retry before appending
        if self.buffer.is_full() && self.on_overflow().is_err() {
            return;
        }

        let value = match self.source.read() {
            Ok(value) => value,
            Err(e) => {
                self.stats.read_failures += 1;
                tracing::warn!("Failed to read {}: {}", self.source.name(), e);
                return;
            }
        };

        let start = *self.clock_start.get_or_insert_with(Instant::now);
        let sample = Sample::new(start.elapsed().as_secs_f64(), value);
        self.buffer.push(sample);
        self.stats.samples_recorded += 1;
        self.signals.data_ready.replace(sample);
        tracing::trace!("Sample t={:.3}s value={}", sample.elapsed_time, sample.value);

        if self.buffer.is_full() {
            let _ = self.on_overflow();
        }
    }

    /// Persist all but the newest sample and keep it as the new head
    fn on_overflow(&mut self) -> Result<()> {
        if let Err(e) = self.store.append(self.buffer.flushable()) {
            let message = format!("Failed to flush samples to temp store: {}", e);
            tracing::error!("{}", message);
            self.halt_recording();
            self.emit(SessionEvent::StorageError(message));
            return Err(e);
        }

        let rows = self.buffer.take_flushable().len();
        self.stats.flushes += 1;
        self.stats.rows_flushed += rows as u64;
        tracing::debug!("Flushed {} samples to {}", rows, self.store.path().display());
        self.try_emit(SessionEvent::Flushed { rows });
        Ok(())
    }

    /// Write temp store contents followed by the live buffer to the destination
    fn on_save_requested(&mut self, request: SaveRequest) {
        let destination = request.destination;
        let result = self.store.read_all().and_then(|flushed| {
            write_destination(&destination, flushed.iter().chain(self.buffer.samples()))
        });

        match result {
            Ok(rows) => {
                self.stats.saves += 1;
                tracing::info!("Saved {} samples to {}", rows, destination.display());
                if self.clear_temp_after_save {
                    self.buffer.clear();
                    if let Err(e) = self.store.truncate() {
                        let message = format!("Saved, but failed to clear temp store: {}", e);
                        tracing::error!("{}", message);
                        self.halt_recording();
                        self.emit(SessionEvent::StorageError(message));
                    }
                }
                self.emit(SessionEvent::SaveCompleted { destination, rows });
            }
            Err(e) => {
                tracing::error!("Failed to save to {}: {}", destination.display(), e);
                self.halt_recording();
                self.emit(SessionEvent::SaveFailed {
                    destination,
                    error: e.to_string(),
                });
            }
        }
    }

    /// Adopt a new recording state and config snapshot
    fn on_record_toggled(&mut self, state: RecordState) {
        let RecordState { recording, config } = state;

        if config.instrument_id != self.config.instrument_id && !config.instrument_id.is_empty() {
            match self.source.select_instrument(&config.instrument_id) {
                Ok(()) => tracing::info!("Instrument set to '{}'", config.instrument_id),
                Err(e) => tracing::warn!(
                    "Failed to select instrument '{}': {}",
                    config.instrument_id,
                    e
                ),
            }
        }
        if config.sample_interval != self.config.sample_interval {
            tracing::debug!("Sample interval now {}s", config.sample_interval);
        }
        self.config = config;

        if recording == self.recording {
            return;
        }
        if recording {
            if self.buffer.is_empty() {
                self.clock_start = Some(Instant::now());
            }
            tracing::info!("Recording started");
        } else {
            tracing::info!("Recording paused");
        }
        self.recording = recording;
        self.emit(SessionEvent::RecordingChanged(recording));
    }

    /// Drop all recorded data
    fn on_reset_requested(&mut self) {
        self.signals.data_ready.clear();
        self.buffer.clear();
        self.clock_start = None;
        self.stats.resets += 1;

        if let Err(e) = self.store.truncate() {
            let message = format!("Failed to truncate temp store on reset: {}", e);
            tracing::error!("{}", message);
            self.halt_recording();
            self.emit(SessionEvent::StorageError(message));
        } else {
            tracing::info!("Session data reset");
        }
        self.emit(SessionEvent::ResetCompleted);
    }

    fn halt_recording(&mut self) {
        if self.recording {
            self.recording = false;
            tracing::warn!("Recording halted");
            self.emit(SessionEvent::RecordingHalted);
        }
    }

    /// Sleep for the remainder of the sample interval
    fn rate_limit(&mut self) {
        let target_interval = self.config.sample_period();
        if target_interval == Duration::ZERO {
            std::thread::yield_now();
        } else {
            let elapsed = self.last_tick.elapsed();
            if elapsed < target_interval {
                std::thread::sleep(target_interval - elapsed);
            }
        }
        self.last_tick = Instant::now();
    }

    /// Send an outcome event, waiting for queue space
    fn emit(&mut self, event: SessionEvent) {
        if self.events.send(event).is_err() {
            self.detached = true;
        }
    }

    /// Send an informational event, dropping it if the queue is full
    fn try_emit(&mut self, event: SessionEvent) {
        match self.events.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => tracing::trace!("Event queue full, dropping event"),
            Err(TrySendError::Disconnected(_)) => self.detached = true,
        }
    }

    /// Live buffer
    pub fn buffer(&self) -> &SampleBuffer {
        &self.buffer
    }

    /// Temp store
    pub fn store(&self) -> &TempStore {
        &self.store
    }

    /// Whether sampling is active
    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// Counters so far
    pub fn stats(&self) -> &SamplingStats {
        &self.stats
    }
}
