//! Recording session: construction, control and teardown
//!
//! A [`Session`] is built explicitly from an [`AppConfig`] and a
//! [`MeasurementSource`]. Starting it empties the temp store, wires the
//! [`SignalSet`] and event channel between a [`SessionController`] and a
//! [`SamplingLoop`], and spawns the loop on its own thread.
//!
//! # Example
//!
//! ```ignore
//! let source = Box::new(SimulatedBridge::from_config(&config.source));
//! let mut session = Session::start(config, source)?;
//! let mut display = ConsoleDisplay::new(std::io::stdout());
//!
//! session.apply(ControlCommand::Record, &mut display);
//! session.refresh(&mut display);
//! let stats = session.shutdown()?;
//! ```

pub mod controller;
pub mod display;

pub use controller::{is_valid_filename, SessionController, SessionStatus};
pub use display::{DisplaySink, SampleHistory};

use crate::backend::{event_channel, MeasurementSource, SamplingLoop};
use crate::config::AppConfig;
use crate::error::{BridgeLogError, Result, ResultExt};
use crate::signals::SignalSet;
use crate::storage::TempStore;
use crate::types::{Sample, SamplingStats};
use chrono::{DateTime, Local};
use std::thread::JoinHandle;

/// A front-end command routed to the controller
#[derive(Debug, Clone, PartialEq)]
pub enum ControlCommand {
    /// Start recording
    Record,
    /// Pause recording
    Pause,
    /// Save to the configured filename
    Save,
    /// Discard all recorded data
    Reset,
    /// Set the destination filename
    SetFilename(String),
    /// Set the instrument address
    SetInstrument(String),
    /// Set the sample interval (raw user text, seconds)
    SetSampleInterval(String),
    /// Set the display interval (raw user text, seconds)
    SetDisplayInterval(String),
    /// Show the status line
    Status,
    /// End the session
    Quit,
}

/// A running recording session
pub struct Session {
    controller: SessionController,
    history: SampleHistory,
    handle: Option<JoinHandle<SamplingStats>>,
    started_at: DateTime<Local>,
}

impl Session {
    /// Validate the config, start an empty temp store and spawn the sampling loop
    pub fn start(config: AppConfig, mut source: Box<dyn MeasurementSource>) -> Result<Self> {
        config.validate()?;

        let store = TempStore::create(&config.storage.temp_file)
            .context("Failed to prepare temp store")?;

        let instrument_id = &config.session.instrument_id;
        if !instrument_id.is_empty() {
            if let Err(e) = source.select_instrument(instrument_id) {
                tracing::warn!("Failed to select instrument '{}': {}", instrument_id, e);
            }
        }

        let signals = SignalSet::new();
        let (event_tx, event_rx) = event_channel();
        let sampling = SamplingLoop::new(
            source,
            store,
            &config.storage,
            config.session.clone(),
            signals.clone(),
            event_tx,
        );
        let handle = sampling.spawn()?;

        let started_at = Local::now();
        tracing::info!(
            "Session started at {}",
            started_at.format("%Y-%m-%d %H:%M:%S")
        );

        Ok(Self {
            controller: SessionController::new(
                config.session,
                config.storage.output_dir,
                signals,
                event_rx,
            ),
            history: SampleHistory::new(config.display.history_points),
            handle: Some(handle),
            started_at,
        })
    }

    /// Controller for direct access
    pub fn controller(&self) -> &SessionController {
        &self.controller
    }

    /// Mutable controller for direct access
    pub fn controller_mut(&mut self) -> &mut SessionController {
        &mut self.controller
    }

    /// Recent samples seen by [`refresh`](Self::refresh)
    pub fn history(&self) -> &SampleHistory {
        &self.history
    }

    /// Wall clock time the session started
    pub fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    /// Whether the sampling thread is still alive
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Push loop errors and the latest sample to the sink
    pub fn refresh(&mut self, sink: &mut dyn DisplaySink) -> Option<Sample> {
        for error in self.controller.take_errors() {
            sink.report_error(&error);
        }
        let sample = self.controller.latest_sample();
        match sample {
            Some(sample) => {
                self.history.push(sample);
                sink.show(&sample);
            }
            None => self.history.clear(),
        }
        sample
    }

    /// Route a command to the controller
    ///
    /// Returns `false` once the command asks the session to end.
    pub fn apply(&mut self, command: ControlCommand, sink: &mut dyn DisplaySink) -> bool {
        tracing::debug!("Applying {:?}", command);
        let controller = &mut self.controller;
        let result = match command {
            ControlCommand::Record => {
                controller.toggle_record(true);
                Ok(())
            }
            ControlCommand::Pause => {
                controller.toggle_record(false);
                Ok(())
            }
            ControlCommand::Save => controller.request_save().map(|raised| {
                if !raised {
                    tracing::info!("Save already in progress");
                }
            }),
            ControlCommand::Reset => {
                if controller.request_reset() {
                    self.history.clear();
                } else {
                    tracing::info!("Reset already in progress");
                }
                Ok(())
            }
            ControlCommand::SetFilename(name) => controller.set_filename(&name),
            ControlCommand::SetInstrument(id) => controller.set_instrument(&id),
            ControlCommand::SetSampleInterval(secs) => controller.set_sample_interval(&secs),
            ControlCommand::SetDisplayInterval(secs) => controller.set_display_interval(&secs),
            ControlCommand::Status => {
                sink.show_status(&controller.status());
                Ok(())
            }
            ControlCommand::Quit => return false,
        };

        if let Err(e) = result {
            sink.report_error(&e);
        }
        true
    }

    /// Stop the sampling loop and wait for it
    pub fn shutdown(mut self) -> Result<SamplingStats> {
        self.stop()
    }

    fn stop(&mut self) -> Result<SamplingStats> {
        let Some(handle) = self.handle.take() else {
            return Ok(SamplingStats::default());
        };
        self.controller.request_shutdown();
        let stats = handle
            .join()
            .map_err(|_| BridgeLogError::Channel("Sampling thread panicked".to_string()))?;
        self.controller.process_events();
        tracing::info!(
            "Session from {} finished: {}",
            self.started_at.format("%H:%M:%S"),
            stats
        );
        Ok(stats)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            tracing::error!("Failed to stop session: {}", e);
        }
    }
}
