//! Line-oriented console front end
//!
//! Parses typed commands into [`ControlCommand`]s and prints readings as a
//! [`DisplaySink`].
//!
//! | Command            | Effect                          |
//! |--------------------|---------------------------------|
//! | `record`           | start recording                 |
//! | `pause`            | pause recording                 |
//! | `save`             | save to the configured filename |
//! | `reset`            | discard all recorded data       |
//! | `file <name>`      | set the destination filename    |
//! | `instrument <id>`  | set the instrument address      |
//! | `interval <secs>`  | set the sample interval         |
//! | `display <secs>`   | set the display interval        |
//! | `status`           | print the session state         |
//! | `quit`             | end the session                 |

use crate::error::BridgeLogError;
use crate::session::{ControlCommand, DisplaySink, SessionStatus};
use crate::types::Sample;
use std::io::Write;
use std::str::FromStr;

/// Help text listing the console commands
pub const HELP: &str = "commands: record | pause | save | reset | file <name> | \
instrument <id> | interval <secs> | display <secs> | status | quit";

impl FromStr for ControlCommand {
    type Err = BridgeLogError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (keyword, argument) = match line.split_once(char::is_whitespace) {
            Some((keyword, rest)) => (keyword, rest.trim()),
            None => (line, ""),
        };

        let needs_argument = |what: &str| {
            if argument.is_empty() {
                Err(BridgeLogError::invalid_input(
                    "command",
                    line,
                    format!("missing {}", what),
                ))
            } else {
                Ok(argument.to_string())
            }
        };

        match keyword.to_ascii_lowercase().as_str() {
            "record" | "start" => Ok(ControlCommand::Record),
            "pause" | "stop" => Ok(ControlCommand::Pause),
            "save" => Ok(ControlCommand::Save),
            "reset" => Ok(ControlCommand::Reset),
            "status" => Ok(ControlCommand::Status),
            "quit" | "exit" => Ok(ControlCommand::Quit),
            "file" => needs_argument("filename").map(ControlCommand::SetFilename),
            "instrument" => needs_argument("instrument address").map(ControlCommand::SetInstrument),
            "interval" => needs_argument("seconds").map(ControlCommand::SetSampleInterval),
            "display" => needs_argument("seconds").map(ControlCommand::SetDisplayInterval),
            _ => Err(BridgeLogError::invalid_input(
                "command",
                line,
                "unknown command",
            )),
        }
    }
}

/// Prints readings and errors to a writer
pub struct ConsoleDisplay<W: Write> {
    out: W,
    shown: u64,
}

impl<W: Write> ConsoleDisplay<W> {
    /// Create a display writing to `out`
    pub fn new(out: W) -> Self {
        Self { out, shown: 0 }
    }

    /// Number of readings printed
    pub fn shown(&self) -> u64 {
        self.shown
    }

    /// Recover the writer
    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_line(&mut self, line: std::fmt::Arguments<'_>) {
        if let Err(e) = writeln!(self.out, "{}", line).and_then(|_| self.out.flush()) {
            tracing::warn!("Failed to write to console: {}", e);
        }
    }
}

impl<W: Write> DisplaySink for ConsoleDisplay<W> {
    fn show(&mut self, sample: &Sample) {
        self.shown += 1;
        self.write_line(format_args!(
            "t = {:>10.3} s   C = {:.6} pF",
            sample.elapsed_time, sample.value
        ));
    }

    fn report_error(&mut self, error: &BridgeLogError) {
        tracing::warn!("{}", error);
        self.write_line(format_args!("error: {}", error));
    }

    fn show_status(&mut self, status: &SessionStatus) {
        self.write_line(format_args!("{}", status));
        if let Some(stats) = &status.stopped {
            self.write_line(format_args!("sampling stopped: {}", stats));
        }
    }
}
