//! Single-slot mailboxes used as edge-triggered signals between tasks
//!
//! Each signal is a [`Mailbox`] backed by a `crossbeam_channel::bounded(1)`
//! channel. The raising side posts into the slot and the consuming side
//! drains it once per cycle, so a signal is observed exactly once and can
//! never be half-set.
//!
//! # Signals
//!
//! | Signal               | Raised by   | Consumed by | Payload          |
//! |----------------------|-------------|-------------|------------------|
//! | `shutdown_requested` | controller  | loop        | -                |
//! | `save_requested`     | controller  | loop        | [`SaveRequest`]  |
//! | `record_toggled`     | controller  | loop        | [`RecordState`]  |
//! | `reset_requested`    | controller  | loop        | -                |
//! | `data_ready`         | loop        | controller  | [`Sample`]       |

use crate::config::SessionConfig;
use crate::types::Sample;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::path::PathBuf;

/// A single-slot mailbox
///
/// Both halves live in one value and clones share the slot. [`raise`] is a
/// no-op while a value is pending; [`replace`] overwrites it.
///
/// [`raise`]: Mailbox::raise
/// [`replace`]: Mailbox::replace
#[derive(Debug)]
pub struct Mailbox<T> {
    tx: Sender<T>,
    rx: Receiver<T>,
}

impl<T> Clone for Mailbox<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            rx: self.rx.clone(),
        }
    }
}

impl<T> Default for Mailbox<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Mailbox<T> {
    /// Create an empty mailbox
    pub fn new() -> Self {
        let (tx, rx) = bounded(1);
        Self { tx, rx }
    }

    /// Post `value` unless one is already pending
    ///
    /// Returns `true` if the value was posted.
    pub fn raise(&self, value: T) -> bool {
        match self.tx.try_send(value) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => false,
        }
    }

    /// Post `value`, discarding any pending one
    pub fn replace(&self, value: T) {
        let mut value = value;
        loop {
            match self.tx.try_send(value) {
                Ok(()) => return,
                Err(TrySendError::Full(v)) => {
                    let _ = self.rx.try_recv();
                    value = v;
                }
                Err(TrySendError::Disconnected(_)) => return,
            }
        }
    }

    /// Consume the pending value, if any
    pub fn take(&self) -> Option<T> {
        self.rx.try_recv().ok()
    }

    /// Check whether a value is waiting
    pub fn is_pending(&self) -> bool {
        !self.rx.is_empty()
    }

    /// Drop any pending value
    pub fn clear(&self) {
        while self.rx.try_recv().is_ok() {}
    }
}

impl Mailbox<()> {
    /// Raise a payload-free signal
    pub fn signal(&self) -> bool {
        self.raise(())
    }
}

/// Payload of `save_requested`
#[derive(Debug, Clone, PartialEq)]
pub struct SaveRequest {
    /// Full destination path
    pub destination: PathBuf,
}

/// Payload of `record_toggled`: the recording flag plus a fresh config snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct RecordState {
    /// Whether the loop should sample
    pub recording: bool,
    /// Current session configuration
    pub config: SessionConfig,
}

/// The five signals shared by the sampling loop and the controller
#[derive(Debug, Clone, Default)]
pub struct SignalSet {
    /// Loop -> controller: a new sample is available
    pub data_ready: Mailbox<Sample>,
    /// Controller -> loop: write the session to a destination file
    pub save_requested: Mailbox<SaveRequest>,
    /// Controller -> loop: recording state or config changed
    pub record_toggled: Mailbox<RecordState>,
    /// Controller -> loop: discard all recorded data
    pub reset_requested: Mailbox<()>,
    /// Controller -> loop: stop the loop
    pub shutdown_requested: Mailbox<()>,
}

impl SignalSet {
    /// Create a set with every signal cleared
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raise_is_idempotent_while_pending() {
        let mailbox = Mailbox::new();
        assert!(mailbox.raise(1));
        assert!(!mailbox.raise(2));
        assert_eq!(mailbox.take(), Some(1));
        assert_eq!(mailbox.take(), None);
    }

    #[test]
    fn test_replace_keeps_latest() {
        let mailbox = Mailbox::new();
        mailbox.replace(1);
        mailbox.replace(2);
        mailbox.replace(3);
        assert_eq!(mailbox.take(), Some(3));
        assert!(!mailbox.is_pending());
    }

    #[test]
    fn test_clones_share_slot() {
        let raiser = Mailbox::new();
        let consumer = raiser.clone();
        assert!(raiser.signal());
        assert!(consumer.is_pending());
        assert_eq!(consumer.take(), Some(()));
        assert!(!raiser.is_pending());
    }

    #[test]
    fn test_clear() {
        let mailbox = Mailbox::new();
        mailbox.raise(Sample::new(0.0, 1.0));
        mailbox.clear();
        assert!(!mailbox.is_pending());
    }

    #[test]
    fn test_signal_across_threads() {
        let signals = SignalSet::new();
        let remote = signals.clone();
        let handle = std::thread::spawn(move || remote.shutdown_requested.signal());
        assert!(handle.join().unwrap());
        assert_eq!(signals.shutdown_requested.take(), Some(()));
    }
}
