//! Domain types providing compile-time safety and self-documentation
//!
//! These newtype wrappers keep raw integers (pids, remote addresses,
//! microsecond timestamps) from being mixed up, and give the sampled data
//! its own vocabulary: a [`Frame`] is one rendered stack level, a
//! [`FrameSequence`] is one capture, a [`Sample`] is one observation.

use std::fmt;

use super::errors::UsageError;

/// Process ID of the profiled target
///
/// Always within `1..=pid_t::MAX`; see [`Pid::parse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pid(pub libc::pid_t);

impl Pid {
    /// Parse a command-line pid, rejecting anything outside the `pid_t` range
    ///
    /// # Errors
    /// [`UsageError::InvalidPid`] for non-integers, [`UsageError::PidOutOfRange`]
    /// for integers that cannot name a process.
    pub fn parse(raw: &str) -> Result<Self, UsageError> {
        let value: i64 = raw.trim().parse().map_err(|_| UsageError::InvalidPid(raw.to_string()))?;
        match libc::pid_t::try_from(value) {
            Ok(pid) if pid > 0 => Ok(Pid(pid)),
            _ => Err(UsageError::PidOutOfRange(value.to_string())),
        }
    }

    /// Convert to the `nix` pid type used for ptrace requests
    #[must_use]
    pub fn as_nix(self) -> nix::unistd::Pid {
        nix::unistd::Pid::from_raw(self.0)
    }
}

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Address in the target's address space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RemoteAddr(pub u64);

impl RemoteAddr {
    /// Null pointers mark "nothing here" throughout the interpreter structures
    #[must_use]
    pub fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Address `bytes` past this one
    #[must_use]
    pub fn offset(self, bytes: u64) -> Self {
        RemoteAddr(self.0.wrapping_add(bytes))
    }
}

impl fmt::Display for RemoteAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

/// Microseconds since the run's reference instant (the Unix epoch, as
/// observed when the run started)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Timestamp(pub u64);

impl Timestamp {
    #[must_use]
    pub fn as_micros(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One stack level, already symbolized
///
/// Opaque to everything except the frame walk that produced it, e.g.
/// `"handle_request (server.py:42)"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Frame(String);

impl Frame {
    pub fn new(display: impl Into<String>) -> Self {
        Self(display.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Frame {
    fn from(s: &str) -> Self {
        Frame::new(s)
    }
}

/// One captured call stack, innermost frame first
///
/// An empty sequence is the idle sentinel: nothing was executing when the
/// sample was taken.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FrameSequence(Vec<Frame>);

impl FrameSequence {
    #[must_use]
    pub fn idle() -> Self {
        Self(Vec::new())
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Frames in capture order (innermost first)
    pub fn iter(&self) -> std::slice::Iter<'_, Frame> {
        self.0.iter()
    }

    /// Render outermost to innermost, `;`-separated (folded-stack order)
    #[must_use]
    pub fn folded(&self) -> String {
        let mut out = String::new();
        for (i, frame) in self.iter().rev().enumerate() {
            if i > 0 {
                out.push(';');
            }
            out.push_str(frame.as_str());
        }
        out
    }
}

impl From<Vec<Frame>> for FrameSequence {
    fn from(frames: Vec<Frame>) -> Self {
        Self(frames)
    }
}

impl<const N: usize> From<[&str; N]> for FrameSequence {
    fn from(frames: [&str; N]) -> Self {
        Self(frames.into_iter().map(Frame::from).collect())
    }
}

impl FromIterator<Frame> for FrameSequence {
    fn from_iter<I: IntoIterator<Item = Frame>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A single observation of the target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub timestamp: Timestamp,
    pub frames: FrameSequence,
}

/// Everything a run observed, in collection order
///
/// Idle ticks are summarized by `idle_count`; they only appear in `samples`
/// (as empty sequences) when the run kept timestamps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunResult {
    pub samples: Vec<Sample>,
    pub idle_count: usize,
}

impl RunResult {
    /// True when the run recorded nothing at all
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty() && self.idle_count == 0
    }
}
