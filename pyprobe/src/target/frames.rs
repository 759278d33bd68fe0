//! Interpreter frame walk
//!
//! Reads the CPython 2.7 thread state and frame chain out of the target and
//! renders each level as `name (file:line)`. Offsets are for LP64 builds
//! (`x86_64`, aarch64) of the stock interpreter.
//!
//! ```text
//! _PyThreadState_Current ──► PyThreadState ──frame──► PyFrameObject ──f_back──► ...
//!                                                        │
//!                                                        └─f_code──► PyCodeObject
//!                                                                     co_filename, co_name,
//!                                                                     co_firstlineno, co_lnotab
//! ```

use log::debug;

use super::memory::RemoteMemory;
use crate::domain::{AttachmentError, Frame, FrameSequence, RemoteAddr};

/// Deepest stack we will follow before assuming the chain is corrupt
pub const MAX_DEPTH: usize = 1024;

/// Longest string object we will copy out of the target
pub const MAX_STRING_LEN: usize = 4096;

/// Field offsets inside the interpreter structures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub tstate_frame: u64,
    pub frame_back: u64,
    pub frame_code: u64,
    pub frame_lasti: u64,
    pub code_filename: u64,
    pub code_name: u64,
    pub code_firstlineno: u64,
    pub code_lnotab: u64,
    pub string_size: u64,
    pub string_data: u64,
}

pub const PY27_LP64: Layout = Layout {
    tstate_frame: 16,
    frame_back: 24,
    frame_code: 32,
    frame_lasti: 120,
    code_filename: 80,
    code_name: 88,
    code_firstlineno: 96,
    code_lnotab: 104,
    string_size: 16,
    string_data: 36,
};

/// Innermost active frame, or `None` when the interpreter is idle
///
/// `tstate_slot` is the address of the global holding the current
/// thread-state pointer; a null there (GIL released) or a null frame both
/// mean nothing is running.
///
/// # Errors
/// [`AttachmentError::ProcessExited`] on a failed read.
pub fn top_frame<M: RemoteMemory + ?Sized>(
    memory: &M,
    layout: &Layout,
    tstate_slot: RemoteAddr,
) -> Result<Option<RemoteAddr>, AttachmentError> {
    let tstate = memory.read_ptr(tstate_slot)?;
    if tstate.is_null() {
        return Ok(None);
    }
    let frame = memory.read_ptr(tstate.offset(layout.tstate_frame))?;
    Ok((!frame.is_null()).then_some(frame))
}

/// Follow `f_back` from `frame` to the outermost frame
///
/// # Errors
/// [`AttachmentError::ProcessExited`] if any read along the chain fails.
pub fn walk_stack<M: RemoteMemory + ?Sized>(
    memory: &M,
    layout: &Layout,
    frame: RemoteAddr,
) -> Result<FrameSequence, AttachmentError> {
    let mut frames = Vec::new();
    let mut current = frame;
    while !current.is_null() {
        if frames.len() == MAX_DEPTH {
            debug!("Frame chain deeper than {MAX_DEPTH}, truncating at {current}");
            break;
        }
        frames.push(read_frame(memory, layout, current)?);
        current = memory.read_ptr(current.offset(layout.frame_back))?;
    }
    Ok(frames.into())
}

fn read_frame<M: RemoteMemory + ?Sized>(
    memory: &M,
    layout: &Layout,
    frame: RemoteAddr,
) -> Result<Frame, AttachmentError> {
    let code = memory.read_ptr(frame.offset(layout.frame_code))?;
    if code.is_null() {
        return Ok(Frame::new("<unknown>"));
    }

    let filename_obj = memory.read_ptr(code.offset(layout.code_filename))?;
    let filename = read_string(memory, layout, filename_obj)?;
    let name = read_string(memory, layout, memory.read_ptr(code.offset(layout.code_name))?)?;
    let firstlineno = memory.read_i32(code.offset(layout.code_firstlineno))?;
    let lasti = memory.read_i32(frame.offset(layout.frame_lasti))?;

    let lnotab_obj = memory.read_ptr(code.offset(layout.code_lnotab))?;
    let line = if lnotab_obj.is_null() {
        firstlineno
    } else {
        let lnotab = read_string_bytes(memory, layout, lnotab_obj)?;
        line_for_instruction(firstlineno, &lnotab, lasti)
    };

    Ok(Frame::new(format!("{name} ({filename}:{line})")))
}

fn read_string<M: RemoteMemory + ?Sized>(
    memory: &M,
    layout: &Layout,
    obj: RemoteAddr,
) -> Result<String, AttachmentError> {
    if obj.is_null() {
        return Ok("<unknown>".to_string());
    }
    let bytes = read_string_bytes(memory, layout, obj)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap, clippy::cast_sign_loss)]
fn read_string_bytes<M: RemoteMemory + ?Sized>(
    memory: &M,
    layout: &Layout,
    obj: RemoteAddr,
) -> Result<Vec<u8>, AttachmentError> {
    let size = memory.read_word(obj.offset(layout.string_size))? as i64;
    let len = size.clamp(0, MAX_STRING_LEN as i64) as usize;
    memory.read_bytes(obj.offset(layout.string_data), len)
}

/// Source line of bytecode offset `lasti`
///
/// `lnotab` is a run of `(bytecode increment, line increment)` byte pairs
/// starting from offset 0 at `firstlineno`.
#[must_use]
pub fn line_for_instruction(firstlineno: i32, lnotab: &[u8], lasti: i32) -> i32 {
    let mut line = firstlineno;
    let mut addr = 0i32;
    for pair in lnotab.chunks_exact(2) {
        addr += i32::from(pair[0]);
        if addr > lasti {
            break;
        }
        line += i32::from(pair[1]);
    }
    line
}
