//! The process-attachment boundary and its ptrace implementation

use log::info;
use std::path::Path;

use super::frames::{self, Layout, PY27_LP64};
use super::namespace::NamespaceContext;
use super::ptrace::{self, PtraceMemory};
use crate::domain::{AttachmentError, FrameSequence, Pid, RemoteAddr};
use crate::symbolization::{find_interpreter_image, resolve_symbol, THREAD_STATE_SYMBOL};

/// Everything the sampling engine needs from the operating system
///
/// Calls other than `attach`/`detach`/`resolve_namespace` are only valid
/// between a successful `attach` and the matching `detach`.
pub trait ProcessAttachment {
    /// Stop the target and take the (exclusive) tracer slot
    ///
    /// # Errors
    /// [`AttachmentError::Attach`] when the target is missing, not ours to
    /// trace, or already traced.
    fn attach(&mut self, pid: Pid) -> Result<(), AttachmentError>;

    /// Let the target run again
    ///
    /// # Errors
    /// [`AttachmentError::ProcessExited`] when the target is gone.
    fn detach(&mut self, pid: Pid) -> Result<(), AttachmentError>;

    /// Work out how to see the target's files
    ///
    /// # Errors
    /// [`AttachmentError::Namespace`].
    fn resolve_namespace(&mut self, pid: Pid) -> Result<NamespaceContext, AttachmentError>;

    /// Address of the interpreter's "current thread state" slot
    ///
    /// Stable for the life of the target, so resolved once per run.
    ///
    /// # Errors
    /// [`AttachmentError::Resolution`] when the target has no recognizable
    /// interpreter.
    fn locate_interpreter_state(
        &mut self,
        pid: Pid,
        ns: &NamespaceContext,
    ) -> Result<RemoteAddr, AttachmentError>;

    /// Innermost active frame, `None` when the interpreter is idle
    ///
    /// # Errors
    /// [`AttachmentError::ProcessExited`].
    fn locate_top_frame(
        &mut self,
        pid: Pid,
        state: RemoteAddr,
    ) -> Result<Option<RemoteAddr>, AttachmentError>;

    /// Walk from `frame` outwards, innermost first
    ///
    /// # Errors
    /// [`AttachmentError::ProcessExited`] if the target vanishes mid-walk.
    fn capture_stack(&mut self, pid: Pid, frame: RemoteAddr)
        -> Result<FrameSequence, AttachmentError>;
}

/// Linux ptrace attachment to a CPython 2.7 process
#[derive(Debug, Clone, Copy)]
pub struct PtraceAttachment {
    layout: Layout,
}

impl Default for PtraceAttachment {
    fn default() -> Self {
        Self { layout: PY27_LP64 }
    }
}

impl ProcessAttachment for PtraceAttachment {
    fn attach(&mut self, pid: Pid) -> Result<(), AttachmentError> {
        ptrace::attach(pid)
    }

    fn detach(&mut self, pid: Pid) -> Result<(), AttachmentError> {
        ptrace::detach(pid)
    }

    fn resolve_namespace(&mut self, pid: Pid) -> Result<NamespaceContext, AttachmentError> {
        NamespaceContext::resolve(pid)
    }

    fn locate_interpreter_state(
        &mut self,
        pid: Pid,
        ns: &NamespaceContext,
    ) -> Result<RemoteAddr, AttachmentError> {
        let resolution_error = |e: anyhow::Error| AttachmentError::Resolution {
            pid,
            reason: format!("{e:#}"),
        };

        let image = find_interpreter_image(pid).map_err(resolution_error)?;
        let host_path = ns.host_path(Path::new(&image.path));
        let slot =
            resolve_symbol(&host_path, THREAD_STATE_SYMBOL, &image).map_err(resolution_error)?;

        info!("Thread state slot for process {pid} at {slot} ({})", host_path.display());
        Ok(slot)
    }

    fn locate_top_frame(
        &mut self,
        pid: Pid,
        state: RemoteAddr,
    ) -> Result<Option<RemoteAddr>, AttachmentError> {
        frames::top_frame(&PtraceMemory::new(pid), &self.layout, state)
    }

    fn capture_stack(
        &mut self,
        pid: Pid,
        frame: RemoteAddr,
    ) -> Result<FrameSequence, AttachmentError> {
        frames::walk_stack(&PtraceMemory::new(pid), &self.layout, frame)
    }
}
