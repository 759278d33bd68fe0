//! Raw ptrace primitives
//!
//! Every request here must come from the thread that performed the attach;
//! the kernel ties the tracer relationship to that thread, which is why the
//! binary runs on a current-thread runtime.

use log::debug;
use nix::errno::Errno;
use nix::sys::ptrace;
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};

use super::memory::RemoteMemory;
use crate::domain::{AttachmentError, Pid, RemoteAddr};

/// Seize the target and wait until it is stopped
///
/// # Errors
/// [`AttachmentError::Attach`] when the kernel refuses (no such process,
/// permission denied, already traced); [`AttachmentError::ProcessExited`] if
/// the target dies before reporting the stop.
pub fn attach(pid: Pid) -> Result<(), AttachmentError> {
    ptrace::attach(pid.as_nix()).map_err(|source| AttachmentError::Attach { pid, source })?;

    loop {
        match waitpid(pid.as_nix(), Some(WaitPidFlag::__WALL)) {
            Ok(WaitStatus::Stopped(_, signal)) => {
                debug!("Process {pid} stopped ({signal:?})");
                return Ok(());
            }
            Ok(WaitStatus::Exited(..) | WaitStatus::Signaled(..)) => {
                return Err(AttachmentError::ProcessExited { pid, addr: RemoteAddr(0) });
            }
            Ok(_) | Err(Errno::EINTR) => {}
            Err(source) => return Err(AttachmentError::Attach { pid, source }),
        }
    }
}

/// Release the trace-stop and let the target run again
///
/// # Errors
/// [`AttachmentError::ProcessExited`] if the target no longer exists.
pub fn detach(pid: Pid) -> Result<(), AttachmentError> {
    ptrace::detach(pid.as_nix(), None).map_err(|source| match source {
        Errno::ESRCH => AttachmentError::ProcessExited { pid, addr: RemoteAddr(0) },
        source => AttachmentError::Attach { pid, source },
    })
}

/// Target memory read with `PTRACE_PEEKDATA`; only valid while attached
#[derive(Debug, Clone, Copy)]
pub struct PtraceMemory {
    pid: Pid,
}

impl PtraceMemory {
    #[must_use]
    pub fn new(pid: Pid) -> Self {
        Self { pid }
    }
}

impl RemoteMemory for PtraceMemory {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn read_word(&self, addr: RemoteAddr) -> Result<u64, AttachmentError> {
        ptrace::read(self.pid.as_nix(), addr.0 as usize as ptrace::AddressType)
            .map(|word| word as u64)
            .map_err(|_| AttachmentError::ProcessExited { pid: self.pid, addr })
    }
}
