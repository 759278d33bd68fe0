//! Profiling core modules
//!
//! - Sampling engine (attach/capture/detach/sleep loop)
//! - Run outcome tagging (completed vs. terminated early)
//! - Clock seam for the inter-sample wait

pub mod clock;
pub mod sampler;

// Re-export common types
pub use clock::{Clock, MonotonicClock};
pub use sampler::{RunOutcome, SamplingEngine};
