//! Structured error types for pyprobe
//!
//! Using thiserror for automatic Display implementation and error chaining.

use super::types::{Pid, RemoteAddr};
use thiserror::Error;

/// Failures raised by a [`ProcessAttachment`](crate::target::ProcessAttachment)
#[derive(Error, Debug)]
pub enum AttachmentError {
    #[error("Failed to attach to process {pid}")]
    Attach {
        pid: Pid,
        #[source]
        source: nix::Error,
    },

    #[error("Failed to resolve namespace of process {pid}: {reason}")]
    Namespace { pid: Pid, reason: String },

    #[error("Failed to locate interpreter state in process {pid}: {reason}")]
    Resolution { pid: Pid, reason: String },

    #[error("Process {pid} exited while reading {addr}")]
    ProcessExited { pid: Pid, addr: RemoteAddr },
}

impl AttachmentError {
    /// Errors that mean the target went away under us
    ///
    /// A failed re-attach in the middle of a run is the same event seen from
    /// the other side, so it counts too.
    #[must_use]
    pub fn is_target_gone(&self) -> bool {
        matches!(self, Self::ProcessExited { .. } | Self::Attach { .. })
    }
}

/// Terminal failures of a sampling run (no result to print)
#[derive(Error, Debug)]
pub enum RunFailure {
    #[error("Cannot attach to target")]
    CannotAttach(#[source] AttachmentError),

    #[error("Target vanished before any sample was taken")]
    TargetVanished(#[source] AttachmentError),

    #[error(transparent)]
    Failed(AttachmentError),
}

/// Malformed command-line input; detected before touching the target
#[derive(Error, Debug, PartialEq)]
pub enum UsageError {
    #[error("Invalid PID: {0}")]
    InvalidPid(String),

    #[error("PID {0} is out of valid PID range.")]
    PidOutOfRange(String),

    #[error("Invalid --seconds value {0}: must be a finite number >= 0")]
    InvalidDuration(f64),

    #[error("Invalid --rate value {0}: must be a finite number > 0")]
    InvalidRate(f64),
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("fatal error: empty stack reached the folded report")]
    EmptyStack,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
