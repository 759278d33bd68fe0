//! Target process access
//!
//! The collaborator boundary of the profiler: attaching and detaching with
//! ptrace, resolving the target's mount namespace, locating the interpreter
//! thread state, and walking the interpreter frame chain.
//!
//! The sampling engine only sees the [`ProcessAttachment`] trait;
//! [`PtraceAttachment`] is the Linux implementation used by the binary.

pub mod attachment;
pub mod frames;
pub mod memory;
pub mod namespace;
pub mod ptrace;

pub use attachment::{ProcessAttachment, PtraceAttachment};
pub use memory::RemoteMemory;
pub use namespace::NamespaceContext;
