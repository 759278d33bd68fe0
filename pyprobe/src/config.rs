use std::time::Duration;

use crate::cli::Args;
use crate::domain::{Pid, UsageError};

/// Immutable settings for one sampling run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerConfig {
    /// How long to keep sampling. Zero still takes one sample.
    pub duration: Duration,

    /// Wait between two samples, floored to whole microseconds.
    pub interval: Duration,

    /// Count idle ticks (`(idle) N` line / `(idle)` trace entries).
    pub include_idle: bool,

    /// Emit a timestamped trace instead of folded counts.
    pub include_timestamps: bool,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(1),
            interval: Duration::from_millis(1),
            include_idle: true,
            include_timestamps: false,
        }
    }
}

impl SamplerConfig {
    /// Build a config from the raw `--seconds` / `--rate` floats.
    ///
    /// # Errors
    /// Negative or non-finite durations and non-positive or non-finite rates.
    pub fn new(
        seconds: f64,
        rate: f64,
        include_idle: bool,
        include_timestamps: bool,
    ) -> Result<Self, UsageError> {
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(UsageError::InvalidDuration(seconds));
        }
        if !rate.is_finite() || rate <= 0.0 {
            return Err(UsageError::InvalidRate(rate));
        }
        Ok(Self {
            duration: seconds_to_micros(seconds),
            interval: seconds_to_micros(rate),
            include_idle,
            include_timestamps,
        })
    }
}

/// `floor(secs * 1_000_000)` microseconds
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn seconds_to_micros(secs: f64) -> Duration {
    Duration::from_micros((secs * 1_000_000.0) as u64)
}

/// Validated command line: the target and how to sample it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunConfig {
    pub pid: Pid,
    pub sampler: SamplerConfig,
}

impl TryFrom<&Args> for RunConfig {
    type Error = UsageError;

    fn try_from(args: &Args) -> Result<Self, Self::Error> {
        let pid = Pid::parse(&args.pid)?;
        let sampler =
            SamplerConfig::new(args.seconds, args.rate, !args.exclude_idle, args.timestamp)?;
        Ok(Self { pid, sampler })
    }
}
