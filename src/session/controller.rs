//! Session controller: the foreground side of a recording session
//!
//! The controller owns the [`SessionConfig`] and the recording state, turns
//! user input into signal transitions and reads loop events back. Input
//! problems are returned as errors while the previous value is retained;
//! requests that are already pending are silently ignored.

use crate::backend::SessionEvent;
use crate::config::SessionConfig;
use crate::error::{BridgeLogError, Result};
use crate::signals::{RecordState, SaveRequest, SignalSet};
use crate::types::{Sample, SamplingStats};
use crossbeam_channel::Receiver;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static FILENAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\w+\.csv$").expect("Invalid filename regex"));

/// Check a save filename against the `word-characters.csv` pattern
pub fn is_valid_filename(filename: &str) -> bool {
    FILENAME_PATTERN.is_match(filename)
}

/// Parse a seconds value typed by the user
pub fn parse_seconds(field: &'static str, input: &str) -> Result<f64> {
    let value: f64 = input
        .trim()
        .parse()
        .map_err(|_| BridgeLogError::invalid_input(field, input, "not a number"))?;
    if !value.is_finite() || value < 0.0 {
        return Err(BridgeLogError::invalid_input(
            field,
            input,
            "must be a non-negative number of seconds",
        ));
    }
    Ok(value)
}

/// Snapshot of the controller state for status displays
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStatus {
    /// Whether recording is requested
    pub recording: bool,
    /// A save is in flight
    pub save_pending: bool,
    /// A reset is in flight
    pub reset_pending: bool,
    /// A sample is available for display
    pub data_ready: bool,
    /// Current configuration
    pub config: SessionConfig,
    /// Final loop statistics once the loop has stopped
    pub stopped: Option<SamplingStats>,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = if self.recording { "recording" } else { "paused" };
        write!(
            f,
            "{} | file '{}' | instrument '{}' | interval {}s | display {}s",
            state,
            self.config.filename,
            self.config.instrument_id,
            self.config.sample_interval,
            self.config.display_interval
        )?;
        if self.save_pending {
            write!(f, " | save pending")?;
        }
        if self.reset_pending {
            write!(f, " | reset pending")?;
        }
        Ok(())
    }
}

/// Foreground controller of a recording session
pub struct SessionController {
    /// Single source of truth for the session configuration
    config: SessionConfig,
    /// Directory save filenames are resolved against
    output_dir: PathBuf,
    /// Shared signals
    signals: SignalSet,
    /// Events from the sampling loop
    events: Receiver<SessionEvent>,
    /// Requested recording state
    recording: bool,
    /// Save requested and not yet reported back
    save_pending: bool,
    /// Recording state to restore once the pending save completes
    resume_after_save: bool,
    /// Reset requested and not yet reported back
    reset_pending: bool,
    /// Most recent sample read back from the loop
    latest: Option<Sample>,
    /// Loop-reported failures not yet shown to the user
    errors: Vec<BridgeLogError>,
    /// Final statistics once the loop has exited
    stopped: Option<SamplingStats>,
}

impl SessionController {
    /// Create a controller for an existing signal set and event channel
    pub fn new(
        config: SessionConfig,
        output_dir: impl Into<PathBuf>,
        signals: SignalSet,
        events: Receiver<SessionEvent>,
    ) -> Self {
        Self {
            config,
            output_dir: output_dir.into(),
            signals,
            events,
            recording: false,
            save_pending: false,
            resume_after_save: false,
            reset_pending: false,
            latest: None,
            errors: Vec::new(),
            stopped: None,
        }
    }

    // ==================== Configuration ====================

    /// Set the sample interval from user input
    pub fn set_sample_interval(&mut self, input: &str) -> Result<()> {
        let value = parse_seconds("sample interval", input).inspect_err(log_rejected)?;
        self.config.sample_interval = value;
        self.publish_state();
        Ok(())
    }

    /// Set the display interval from user input
    pub fn set_display_interval(&mut self, input: &str) -> Result<()> {
        let value = parse_seconds("display interval", input).inspect_err(log_rejected)?;
        self.config.display_interval = value;
        self.publish_state();
        Ok(())
    }

    /// Set the destination filename (pattern checked at save time)
    pub fn set_filename(&mut self, input: &str) -> Result<()> {
        let filename = input.trim();
        if filename.is_empty() {
            let err = BridgeLogError::invalid_input("filename", input, "must not be empty");
            log_rejected(&err);
            return Err(err);
        }
        self.config.filename = filename.to_string();
        self.publish_state();
        Ok(())
    }

    /// Set the instrument bus address
    pub fn set_instrument(&mut self, input: &str) -> Result<()> {
        let instrument = input.trim();
        let reason = if instrument.is_empty() {
            Some("must not be empty")
        } else if instrument.chars().any(char::is_whitespace) {
            Some("must not contain whitespace")
        } else {
            None
        };
        if let Some(reason) = reason {
            let err = BridgeLogError::invalid_input("instrument address", input, reason);
            log_rejected(&err);
            return Err(err);
        }
        self.config.instrument_id = instrument.to_string();
        self.publish_state();
        Ok(())
    }

    // ==================== Control Signals ====================

    /// Start or pause recording
    pub fn toggle_record(&mut self, on: bool) {
        if on && self.reset_pending {
            tracing::debug!("Record requested while a reset is pending");
        }
        self.recording = on;
        self.publish_state();
    }

    /// Ask the loop to write the session to the configured filename
    ///
    /// Returns `Ok(false)` without doing anything while a save is pending.
    /// An invalid filename is rejected before anything else changes.
    pub fn request_save(&mut self) -> Result<bool> {
        self.process_events();
        if self.save_pending {
            tracing::debug!("Save already pending");
            return Ok(false);
        }
        if !is_valid_filename(&self.config.filename) {
            let err = BridgeLogError::InvalidFilename(self.config.filename.clone());
            log_rejected(&err);
            return Err(err);
        }

        self.resume_after_save = self.recording;
        if self.recording {
            self.toggle_record(false);
        }

        let destination = self.destination();
        if !self.signals.save_requested.raise(SaveRequest {
            destination: destination.clone(),
        }) {
            return Ok(false);
        }
        self.save_pending = true;
        tracing::info!("Save requested to {}", destination.display());
        Ok(true)
    }

    /// Ask the loop to discard all recorded data
    ///
    /// Returns `false` without doing anything while a reset is pending.
    pub fn request_reset(&mut self) -> bool {
        self.process_events();
        if self.reset_pending {
            tracing::debug!("Reset already pending");
            return false;
        }

        self.resume_after_save = false;
        if self.recording {
            self.toggle_record(false);
        }
        if !self.signals.reset_requested.signal() {
            return false;
        }
        self.reset_pending = true;
        tracing::info!("Reset requested");
        true
    }

    /// Ask the loop to exit
    pub fn request_shutdown(&self) {
        self.signals.shutdown_requested.signal();
    }

    // ==================== Read Back ====================

    /// Most recent sample, or `None` if nothing was sampled since start or reset
    pub fn latest_sample(&mut self) -> Option<Sample> {
        self.process_events();
        if let Some(sample) = self.signals.data_ready.take() {
            self.latest = Some(sample);
        }
        self.latest
    }

    /// Drain pending loop events and update the pending flags
    pub fn process_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            self.handle_event(event);
        }
    }

    fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::RecordingChanged(on) => {
                tracing::debug!("Loop recording state: {}", on);
            }
            SessionEvent::RecordingHalted => {
                self.recording = false;
                self.resume_after_save = false;
            }
            SessionEvent::Flushed { rows } => {
                tracing::debug!("Loop flushed {} rows", rows);
            }
            SessionEvent::SaveCompleted { destination, rows } => {
                tracing::info!("Saved {} rows to {}", rows, destination.display());
                self.save_pending = false;
                if std::mem::take(&mut self.resume_after_save) {
                    self.toggle_record(true);
                }
            }
            SessionEvent::SaveFailed { destination, error } => {
                self.save_pending = false;
                self.resume_after_save = false;
                self.errors.push(BridgeLogError::Storage(format!(
                    "Failed to save {}: {}",
                    destination.display(),
                    error
                )));
            }
            SessionEvent::ResetCompleted => {
                self.reset_pending = false;
                self.latest = None;
            }
            SessionEvent::StorageError(message) => {
                self.errors.push(BridgeLogError::Storage(message));
            }
            SessionEvent::Stopped(stats) => {
                self.save_pending = false;
                self.reset_pending = false;
                self.stopped = Some(stats);
            }
        }
    }

    /// Take loop-reported failures for display
    pub fn take_errors(&mut self) -> Vec<BridgeLogError> {
        self.process_events();
        std::mem::take(&mut self.errors)
    }

    /// Current state snapshot
    pub fn status(&mut self) -> SessionStatus {
        self.process_events();
        let data_ready = self.latest.is_some() || self.signals.data_ready.is_pending();
        SessionStatus {
            recording: self.recording,
            save_pending: self.save_pending,
            reset_pending: self.reset_pending,
            data_ready,
            config: self.config.clone(),
            stopped: self.stopped.clone(),
        }
    }

    /// Current configuration
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Whether recording is requested
    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// Whether a save is in flight
    pub fn is_save_pending(&self) -> bool {
        self.save_pending
    }

    /// Whether a reset is in flight
    pub fn is_reset_pending(&self) -> bool {
        self.reset_pending
    }

    /// Directory save filenames are resolved against
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Full path a save would write to
    pub fn destination(&self) -> PathBuf {
        self.output_dir.join(&self.config.filename)
    }

    /// Ship the recording flag and a fresh config snapshot to the loop
    fn publish_state(&self) {
        self.signals.record_toggled.replace(RecordState {
            recording: self.recording,
            config: self.config.clone(),
        });
    }
}

fn log_rejected(err: &BridgeLogError) {
    tracing::warn!("Rejected input: {}", err);
}
