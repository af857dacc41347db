//! Error handling for bridge-logger
//!
//! This module defines the error type shared by the controller, the sampling
//! loop and the storage layer, plus a Result alias.

use thiserror::Error;

/// Main error type for bridge-logger operations
#[derive(Error, Debug)]
pub enum BridgeLogError {
    /// User input could not be parsed or is out of range
    #[error("Invalid {field} '{value}': {reason}")]
    InvalidInput {
        field: &'static str,
        value: String,
        reason: String,
    },

    /// Destination filename does not match the required pattern
    #[error("Invalid filename '{0}': expected word characters followed by .csv")]
    InvalidFilename(String),

    /// Errors raised by a measurement source
    #[error("Measurement source error: {0}")]
    Source(String),

    /// Temp store or destination failures reported by the sampling loop
    #[error("Storage error: {0}")]
    Storage(String),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors related to channel communication
    #[error("Channel error: {0}")]
    Channel(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV encoding/decoding errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<BridgeLogError>,
    },
}

impl BridgeLogError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        BridgeLogError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Build an input error for a named field
    pub fn invalid_input(
        field: &'static str,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        BridgeLogError::InvalidInput {
            field,
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error came from user input and is recoverable in place
    pub fn is_input_error(&self) -> bool {
        match self {
            BridgeLogError::InvalidInput { .. } | BridgeLogError::InvalidFilename(_) => true,
            BridgeLogError::WithContext { source, .. } => source.is_input_error(),
            _ => false,
        }
    }
}

/// Result type alias for bridge-logger operations
pub type Result<T> = std::result::Result<T, BridgeLogError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<BridgeLogError>,
{
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.into().with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.into().with_context(f()))
    }
}
