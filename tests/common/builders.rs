//! Test data builders for creating test objects

use bridge_logger::backend::event_channel;
use bridge_logger::config::{AppConfig, StorageConfig};
use bridge_logger::storage::TempStore;
use bridge_logger::{
    MeasurementSource, SamplingLoop, SessionConfig, SessionController, SignalSet,
};
use tempfile::TempDir;

/// Builder for a configuration rooted in a temporary directory
pub struct ConfigBuilder {
    config: AppConfig,
}

impl ConfigBuilder {
    pub fn new(dir: &TempDir) -> Self {
        let mut config = AppConfig::default();
        config.storage.temp_file = dir.path().join("temp_data.txt");
        config.storage.output_dir = dir.path().join("out");
        config.session.sample_interval = 0.0;
        Self { config }
    }

    pub fn capacity(mut self, capacity: usize) -> Self {
        self.config.storage.buffer_capacity = capacity;
        self
    }

    pub fn sample_interval(mut self, seconds: f64) -> Self {
        self.config.session.sample_interval = seconds;
        self
    }

    pub fn filename(mut self, filename: &str) -> Self {
        self.config.session.filename = filename.to_string();
        self
    }

    pub fn clear_temp_after_save(mut self, clear: bool) -> Self {
        self.config.storage.clear_temp_after_save = clear;
        self
    }

    pub fn build(self) -> AppConfig {
        self.config
    }
}

/// A sampling loop and controller wired together but driven by hand
///
/// `step()` runs exactly one loop iteration on the test thread, so the
/// tests control tick counts precisely.
pub struct Harness {
    pub sampling: SamplingLoop,
    pub controller: SessionController,
    pub signals: SignalSet,
    pub storage: StorageConfig,
}

impl Harness {
    pub fn new(config: &AppConfig, source: Box<dyn MeasurementSource>) -> Self {
        let store = TempStore::open(&config.storage.temp_file).unwrap();
        let signals = SignalSet::new();
        let (tx, rx) = event_channel();
        let sampling = SamplingLoop::new(
            source,
            store,
            &config.storage,
            config.session.clone(),
            signals.clone(),
            tx,
        );
        let controller = SessionController::new(
            config.session.clone(),
            config.storage.output_dir.clone(),
            signals.clone(),
            rx,
        );
        Self {
            sampling,
            controller,
            signals,
            storage: config.storage.clone(),
        }
    }

    /// Run `n` loop iterations
    pub fn step(&mut self, n: usize) {
        for _ in 0..n {
            assert!(self.sampling.step(), "loop exited unexpectedly");
        }
    }

    pub fn session_config(&self) -> &SessionConfig {
        self.controller.config()
    }
}
