//! Download and reformat sessions.
//!
//! A session is one straight-line, blocking run of a protocol exchange over a
//! borrowed [`Port`](crate::port::Port). It reports what it is doing to a
//! [`StatusSink`] synchronously, in protocol order, and returns a typed error
//! on the first failure.

pub mod download;
pub mod reformat;

use std::fmt;
use std::sync::mpsc::Sender;

pub use download::{DownloadRequest, download};
pub use reformat::{ReformatRequest, reformat};

/// Status transitions reported by a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Status {
    /// The session is sending its command.
    Starting,
    /// Payload bytes are streaming in.
    Downloading,
    /// The device is rewriting its pages.
    Reformatting,
    /// The session finished successfully.
    Complete,
    /// The session stopped on an error.
    Failed,
}

impl Status {
    /// Whether this status ends a session.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::Starting => "Starting",
            Self::Downloading => "Downloading data...",
            Self::Reformatting => "Reformatting...",
            Self::Complete => "Complete",
            Self::Failed => "Failed",
        };
        f.write_str(msg)
    }
}

/// Receiver of session progress.
///
/// Sessions call these inline with protocol I/O, so implementations must not
/// block materially.
pub trait StatusSink {
    /// A status transition.
    fn on_status(&mut self, status: Status);

    /// Progress advanced by `delta` units (payload bytes or pages).
    fn on_progress(&mut self, delta: u64);

    /// Progress restarts from zero.
    fn on_reset(&mut self);
}

impl<S: StatusSink + ?Sized> StatusSink for &mut S {
    fn on_status(&mut self, status: Status) {
        (**self).on_status(status);
    }

    fn on_progress(&mut self, delta: u64) {
        (**self).on_progress(delta);
    }

    fn on_reset(&mut self) {
        (**self).on_reset();
    }
}

/// Status sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoStatus;

impl StatusSink for NoStatus {
    fn on_status(&mut self, _status: Status) {}

    fn on_progress(&mut self, _delta: u64) {}

    fn on_reset(&mut self) {}
}

/// One status callback, as a value.
///
/// Used to move callbacks from a session's worker thread to whichever thread
/// owns the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StatusEvent {
    /// See [`StatusSink::on_status`].
    Status(Status),
    /// See [`StatusSink::on_progress`].
    Progress(u64),
    /// See [`StatusSink::on_reset`].
    Reset,
}

impl StatusEvent {
    /// Replay this event into a sink.
    pub fn apply<S: StatusSink + ?Sized>(self, sink: &mut S) {
        match self {
            Self::Status(status) => sink.on_status(status),
            Self::Progress(delta) => sink.on_progress(delta),
            Self::Reset => sink.on_reset(),
        }
    }
}

/// Channel delivery preserves order. Events sent after the receiver hung up
/// are dropped; the session itself keeps going.
impl StatusSink for Sender<StatusEvent> {
    fn on_status(&mut self, status: Status) {
        let _ = self.send(StatusEvent::Status(status));
    }

    fn on_progress(&mut self, delta: u64) {
        let _ = self.send(StatusEvent::Progress(delta));
    }

    fn on_reset(&mut self) {
        let _ = self.send(StatusEvent::Reset);
    }
}

impl StatusSink for Vec<StatusEvent> {
    fn on_status(&mut self, status: Status) {
        self.push(StatusEvent::Status(status));
    }

    fn on_progress(&mut self, delta: u64) {
        self.push(StatusEvent::Progress(delta));
    }

    fn on_reset(&mut self) {
        self.push(StatusEvent::Reset);
    }
}
