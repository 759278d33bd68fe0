//! Scripted stand-in for a traced process, on virtual time
//!
//! Each call to `locate_top_frame` consumes one [`Tick`]; once the script
//! runs out the target reports idle forever. The attachment and the engine
//! share one [`ManualClock`], so sleeps cost no real time and every logged
//! event carries the virtual instant it happened at.

#![allow(dead_code)]

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::{Duration, Instant};

use pyprobe::config::SamplerConfig;
use pyprobe::domain::{AttachmentError, FrameSequence, Pid, RemoteAddr};
use pyprobe::profiling::{Clock, SamplingEngine};
use pyprobe::target::{NamespaceContext, ProcessAttachment};

/// Clock that only moves when slept on
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    elapsed: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self { origin: Instant::now(), elapsed: Rc::new(Cell::new(Duration::ZERO)) }
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed.get()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed.get()
    }

    fn sleep(&mut self, duration: Duration) {
        self.elapsed.set(self.elapsed.get() + duration);
    }
}

/// Engine driving `attachment` on the attachment's own virtual clock
pub fn engine_for(
    attachment: ScriptedAttachment,
    config: SamplerConfig,
) -> SamplingEngine<ScriptedAttachment, ManualClock> {
    let clock = attachment.clock().clone();
    SamplingEngine::with_clock(attachment, config, clock)
}

pub const STATE_SLOT: RemoteAddr = RemoteAddr(0x1000);
const TOP_FRAME: RemoteAddr = RemoteAddr(0x2000);

#[derive(Debug, Clone)]
pub enum Tick {
    Idle,
    Stack(FrameSequence),
    /// Target exits before the top frame can be read
    Exit,
    /// Top frame is found, then the target exits during the walk
    ExitMidWalk,
}

pub fn stack<const N: usize>(frames: [&str; N]) -> Tick {
    Tick::Stack(FrameSequence::from(frames))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Attach,
    Detach,
    Locate,
    Capture,
}

#[derive(Debug)]
pub struct ScriptedAttachment {
    clock: ManualClock,
    ticks: VecDeque<Tick>,
    pending: Option<FrameSequence>,
    attached: bool,
    gone: bool,
    attach_calls: usize,
    /// Refuse the n-th attach (1-based) as if the target had vanished
    pub fail_attach_at: Option<usize>,
    pub fail_resolution: bool,
    pub events: Vec<(Event, Instant)>,
}

impl ScriptedAttachment {
    pub fn new(ticks: impl IntoIterator<Item = Tick>, clock: ManualClock) -> Self {
        Self {
            clock,
            ticks: ticks.into_iter().collect(),
            pending: None,
            attached: false,
            gone: false,
            attach_calls: 0,
            fail_attach_at: None,
            fail_resolution: false,
            events: Vec::new(),
        }
    }

    /// Script on a fresh virtual clock
    pub fn script(ticks: impl IntoIterator<Item = Tick>) -> Self {
        Self::new(ticks, ManualClock::new())
    }

    pub fn clock(&self) -> &ManualClock {
        &self.clock
    }

    pub fn event_kinds(&self) -> Vec<Event> {
        self.events.iter().map(|(event, _)| *event).collect()
    }

    pub fn count(&self, kind: Event) -> usize {
        self.events.iter().filter(|(event, _)| *event == kind).count()
    }

    fn log(&mut self, event: Event) {
        let now = self.clock.now();
        self.events.push((event, now));
    }

    fn assert_attached(&self, what: &str) {
        assert!(self.attached, "{what} while the target was not stopped");
    }
}

fn gone(pid: Pid) -> AttachmentError {
    AttachmentError::ProcessExited { pid, addr: RemoteAddr(0) }
}

impl ProcessAttachment for ScriptedAttachment {
    fn attach(&mut self, pid: Pid) -> Result<(), AttachmentError> {
        assert!(!self.attached, "attach while already attached");
        self.attach_calls += 1;
        if self.gone || self.fail_attach_at == Some(self.attach_calls) {
            return Err(AttachmentError::Attach { pid, source: nix::Error::ESRCH });
        }
        self.attached = true;
        self.log(Event::Attach);
        Ok(())
    }

    fn detach(&mut self, pid: Pid) -> Result<(), AttachmentError> {
        self.assert_attached("detach");
        self.attached = false;
        self.log(Event::Detach);
        if self.gone {
            return Err(gone(pid));
        }
        Ok(())
    }

    fn resolve_namespace(&mut self, _pid: Pid) -> Result<NamespaceContext, AttachmentError> {
        self.assert_attached("namespace resolution");
        Ok(NamespaceContext::host())
    }

    fn locate_interpreter_state(
        &mut self,
        pid: Pid,
        _ns: &NamespaceContext,
    ) -> Result<RemoteAddr, AttachmentError> {
        self.assert_attached("state lookup");
        if self.fail_resolution {
            return Err(AttachmentError::Resolution {
                pid,
                reason: "_PyThreadState_Current not found".into(),
            });
        }
        Ok(STATE_SLOT)
    }

    fn locate_top_frame(
        &mut self,
        pid: Pid,
        state: RemoteAddr,
    ) -> Result<Option<RemoteAddr>, AttachmentError> {
        self.assert_attached("top frame read");
        assert_eq!(state, STATE_SLOT);
        self.log(Event::Locate);
        match self.ticks.pop_front().unwrap_or(Tick::Idle) {
            Tick::Idle => Ok(None),
            Tick::Stack(frames) => {
                self.pending = Some(frames);
                Ok(Some(TOP_FRAME))
            }
            Tick::Exit => {
                self.gone = true;
                Err(gone(pid))
            }
            Tick::ExitMidWalk => {
                self.gone = true;
                Ok(Some(TOP_FRAME))
            }
        }
    }

    fn capture_stack(
        &mut self,
        pid: Pid,
        frame: RemoteAddr,
    ) -> Result<FrameSequence, AttachmentError> {
        self.assert_attached("stack walk");
        assert_eq!(frame, TOP_FRAME);
        self.log(Event::Capture);
        if self.gone {
            return Err(AttachmentError::ProcessExited { pid, addr: frame });
        }
        Ok(self.pending.take().unwrap_or_default())
    }
}
