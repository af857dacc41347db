//! # bridge-logger: Capacitance Bridge Logger
//!
//! Polls a capacitance bridge through a pluggable measurement source, shows
//! live readings and persists them without losing data on overflow. A
//! background sampling loop is decoupled from the foreground controller
//! that handles user input and display.
//!
//! ## Architecture
//!
//! - **Backend**: The sampling loop owns the live buffer in its own thread
//! - **Session**: The controller owns the configuration and raises signals
//! - **Storage**: Overflow flushes go to an append-only temp store; saves
//!   merge the temp store with the live buffer into a CSV file
//! - **Communication**: Single-slot crossbeam mailboxes plus an event channel
//!
//! ## Configuration
//!
//! Configuration is read from a TOML file. Without one, defaults are used and
//! the temp store lives in the platform-appropriate data directory under
//! `dev.bridge-logger`:
//!
//! - **Linux**: `~/.local/share/dev.bridge-logger/`
//! - **macOS**: `~/Library/Application Support/dev.bridge-logger/`
//! - **Windows**: `%APPDATA%\dev.bridge-logger\`
//!
//! ## Example
//!
//! ```ignore
//! use bridge_logger::{
//!     backend::SimulatedBridge,
//!     config::AppConfig,
//!     console::ConsoleDisplay,
//!     session::{ControlCommand, Session},
//! };
//!
//! fn main() -> bridge_logger::Result<()> {
//!     let config = AppConfig::load_or_default("bridge.toml");
//!     let source = Box::new(SimulatedBridge::from_config(&config.source));
//!     let mut session = Session::start(config, source)?;
//!     let mut display = ConsoleDisplay::new(std::io::stdout());
//!
//!     session.apply(ControlCommand::SetFilename("run1.csv".into()), &mut display);
//!     session.apply(ControlCommand::Record, &mut display);
//!     std::thread::sleep(std::time::Duration::from_secs(5));
//!     session.refresh(&mut display);
//!     session.apply(ControlCommand::Save, &mut display);
//!
//!     let stats = session.shutdown()?;
//!     println!("{}", stats);
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod config;
pub mod console;
pub mod error;
pub mod session;
pub mod signals;
pub mod storage;
pub mod types;

// Re-export commonly used types
pub use backend::{MeasurementSource, SamplingLoop, SessionEvent, SimulatedBridge};
pub use config::{AppConfig, SessionConfig};
pub use console::ConsoleDisplay;
pub use error::{BridgeLogError, Result};
pub use session::{ControlCommand, DisplaySink, Session, SessionController};
pub use signals::SignalSet;
pub use types::{Sample, SampleBuffer, SamplingStats};
