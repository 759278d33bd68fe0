//! # Sampling Engine
//!
//! Drives the attach → capture → detach → sleep cycle against one target.
//!
//! ## Timing
//!
//! ```text
//!  attach  capture  detach        sleep(interval)         attach  capture  detach
//!    │───────────────│ ─ ─ ─ ─ ─ ─ ─ ─ ─ ─ ─ ─ ─ ─ ─ ─ ─ ─ ─│───────────────│ ...
//!    └ target stopped ┘            target running           └ target stopped ┘
//! ```
//!
//! The target is only stopped while one stack is read. The wait is a plain
//! thread sleep of exactly `interval`, so sub-millisecond rates hold.
//!
//! Before sleeping the engine checks whether `now + interval` would reach
//! the deadline and stops instead, so a run never overshoots the requested
//! duration (it may take one sample fewer than `duration / interval`). A
//! zero duration takes exactly one sample.
//!
//! ## Failure policy
//!
//! | When                              | Nothing recorded     | Something recorded  |
//! |-----------------------------------|----------------------|---------------------|
//! | first attach fails                | `CannotAttach`       | n/a                 |
//! | target exits / re-attach fails    | `TargetVanished`     | `TerminatedEarly`   |
//! | namespace / resolution error      | `Failed`             | n/a (setup only)    |
//!
//! The tracer slot is released on every exit path; a detach that fails
//! because the target is already gone is ignored.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use log::{debug, info, warn};

use super::clock::{Clock, MonotonicClock};
use crate::config::SamplerConfig;
use crate::domain::{
    AttachmentError, FrameSequence, Pid, RemoteAddr, RunFailure, RunResult, Sample, Timestamp,
};
use crate::target::ProcessAttachment;

/// How a run that produced data ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Sampled until the deadline
    CompletedNormally(RunResult),
    /// Target went away mid-run; the result holds everything seen before that
    TerminatedEarly(RunResult),
}

impl RunOutcome {
    #[must_use]
    pub fn result(&self) -> &RunResult {
        match self {
            Self::CompletedNormally(result) | Self::TerminatedEarly(result) => result,
        }
    }

    #[must_use]
    pub fn into_result(self) -> RunResult {
        match self {
            Self::CompletedNormally(result) | Self::TerminatedEarly(result) => result,
        }
    }
}

/// Maps the monotonic clock onto microseconds since the Unix epoch
///
/// The wall clock is read once; later timestamps add monotonic elapsed time,
/// so they never go backwards even if the system clock is adjusted mid-run.
#[derive(Debug, Clone, Copy)]
struct RunClock {
    started: Instant,
    epoch_micros: u64,
}

impl RunClock {
    #[allow(clippy::cast_possible_truncation)]
    fn start(started: Instant) -> Self {
        let epoch_micros =
            SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |d| d.as_micros() as u64);
        Self { started, epoch_micros }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn timestamp(&self, now: Instant) -> Timestamp {
        let elapsed = now.saturating_duration_since(self.started).as_micros() as u64;
        Timestamp(self.epoch_micros + elapsed)
    }
}

/// Samples one process for the configured window
///
/// Blocking: every ptrace request of a run is issued from the thread that
/// calls [`run`](SamplingEngine::run).
pub struct SamplingEngine<A, C = MonotonicClock> {
    attachment: A,
    clock: C,
    config: SamplerConfig,
    attached: bool,
}

impl<A: ProcessAttachment> SamplingEngine<A> {
    #[must_use]
    pub fn new(attachment: A, config: SamplerConfig) -> Self {
        Self::with_clock(attachment, config, MonotonicClock)
    }
}

impl<A: ProcessAttachment, C: Clock> SamplingEngine<A, C> {
    #[must_use]
    pub fn with_clock(attachment: A, config: SamplerConfig, clock: C) -> Self {
        Self { attachment, clock, config, attached: false }
    }

    /// Give back the attachment (tests inspect what it recorded)
    #[must_use]
    pub fn into_attachment(self) -> A {
        self.attachment
    }

    /// Sample `pid` until the deadline or until it goes away
    ///
    /// # Errors
    /// [`RunFailure::CannotAttach`] if the first attach fails,
    /// [`RunFailure::TargetVanished`] if the target exits before anything was
    /// recorded, [`RunFailure::Failed`] for namespace/resolution errors.
    pub fn run(&mut self, pid: Pid) -> Result<RunOutcome, RunFailure> {
        let clock = RunClock::start(self.clock.now());
        let deadline = clock.started + self.config.duration;

        self.attach_target(pid).map_err(RunFailure::CannotAttach)?;
        info!("Attached to process {pid}");

        let state = match self.resolve_state(pid) {
            Ok(state) => state,
            Err(e) => {
                self.release(pid);
                return Err(if e.is_target_gone() {
                    RunFailure::TargetVanished(e)
                } else {
                    RunFailure::Failed(e)
                });
            }
        };

        let mut result = RunResult::default();
        let outcome = self.sample_until(pid, state, &clock, deadline, &mut result);
        self.release(pid);

        match outcome {
            Ok(()) => {
                info!(
                    "Run complete: {} samples, {} idle ticks",
                    result.samples.len(),
                    result.idle_count
                );
                Ok(RunOutcome::CompletedNormally(result))
            }
            Err(e) if e.is_target_gone() => {
                if result.is_empty() {
                    Err(RunFailure::TargetVanished(e))
                } else {
                    warn!(
                        "{e}; keeping {} samples and {} idle ticks",
                        result.samples.len(),
                        result.idle_count
                    );
                    Ok(RunOutcome::TerminatedEarly(result))
                }
            }
            Err(e) => Err(RunFailure::Failed(e)),
        }
    }

    /// Namespace and thread-state slot; both fixed for the life of the target
    fn resolve_state(&mut self, pid: Pid) -> Result<RemoteAddr, AttachmentError> {
        let ns = self.attachment.resolve_namespace(pid)?;
        if ns.is_foreign() {
            info!("Process {pid} is in a different mount namespace");
        }
        self.attachment.locate_interpreter_state(pid, &ns)
    }

    fn sample_until(
        &mut self,
        pid: Pid,
        state: RemoteAddr,
        clock: &RunClock,
        deadline: Instant,
        result: &mut RunResult,
    ) -> Result<(), AttachmentError> {
        let interval = self.config.interval;
        loop {
            let frame_addr = self.attachment.locate_top_frame(pid, state)?;
            let now = self.clock.now();
            let frames = match frame_addr {
                Some(addr) => self.attachment.capture_stack(pid, addr)?,
                None => FrameSequence::idle(),
            };
            self.record(result, clock.timestamp(now), frames);

            if now + interval >= deadline {
                return Ok(());
            }
            self.pause(pid, interval)?;
        }
    }

    fn record(&self, result: &mut RunResult, timestamp: Timestamp, frames: FrameSequence) {
        if frames.is_idle() {
            if self.config.include_idle {
                result.idle_count += 1;
                // Idle ticks are summarized by the counter; only a trace needs them one by one
                if self.config.include_timestamps {
                    result.samples.push(Sample { timestamp, frames });
                }
            }
            debug!("{timestamp}: idle");
        } else {
            debug!("{timestamp}: {} frames", frames.len());
            result.samples.push(Sample { timestamp, frames });
        }
    }

    /// Let the target run for `interval`, then stop it again
    fn pause(&mut self, pid: Pid, interval: Duration) -> Result<(), AttachmentError> {
        self.detach_target(pid)?;
        self.clock.sleep(interval);
        self.attach_target(pid)
    }

    fn attach_target(&mut self, pid: Pid) -> Result<(), AttachmentError> {
        self.attachment.attach(pid)?;
        self.attached = true;
        Ok(())
    }

    fn detach_target(&mut self, pid: Pid) -> Result<(), AttachmentError> {
        self.attached = false;
        self.attachment.detach(pid)
    }

    /// Best-effort detach on the way out
    fn release(&mut self, pid: Pid) {
        if self.attached {
            if let Err(e) = self.detach_target(pid) {
                debug!("Ignoring detach failure: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_is_monotonic_micros() {
        let clock = RunClock::start(Instant::now());
        let t0 = clock.timestamp(clock.started);
        let t1 = clock.timestamp(clock.started + Duration::from_micros(1500));
        assert_eq!(t1.as_micros() - t0.as_micros(), 1500);
    }

    #[test]
    fn test_clock_saturates_before_start() {
        let clock = RunClock { started: Instant::now(), epoch_micros: 10 };
        let earlier = clock.started.checked_sub(Duration::from_secs(1)).unwrap_or(clock.started);
        assert_eq!(clock.timestamp(earlier), Timestamp(10));
    }

    #[test]
    fn test_outcome_accessors() {
        let result = RunResult { samples: vec![], idle_count: 2 };
        let outcome = RunOutcome::TerminatedEarly(result.clone());
        assert_eq!(outcome.result().idle_count, 2);
        assert_eq!(outcome.into_result(), result);
    }
}
