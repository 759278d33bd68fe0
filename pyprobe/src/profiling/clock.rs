//! Time source for the sampling loop

use std::time::{Duration, Instant};

/// Monotonic time plus a blocking wait
///
/// The wait must honour microsecond intervals; a 10 kHz run sleeps 100 µs
/// between samples.
pub trait Clock {
    fn now(&self) -> Instant;

    /// Block the calling thread for `duration`
    fn sleep(&mut self, duration: Duration);
}

/// The real clock: `Instant::now` and `std::thread::sleep`
#[derive(Debug, Clone, Copy, Default)]
pub struct MonotonicClock;

impl Clock for MonotonicClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
