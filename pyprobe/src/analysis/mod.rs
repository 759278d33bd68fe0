//! Post-processing of sampled stacks
//!
//! This module provides analysis capabilities over a finished run:
//! - Stack aggregation into frequency buckets (folded output)

pub mod stack_aggregator;

pub use stack_aggregator::{Bucket, StackAggregator};
