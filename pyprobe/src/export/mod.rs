//! Report output
//!
//! This module renders a finished run as text. Two formats:
//! - Folded stacks (`stack;frames count`) for flamegraph tooling
//! - Timestamped trace (timestamp line, stack line) for timeline tooling

pub mod folded;
pub mod timestamped;

pub use folded::FoldedExporter;
pub use timestamped::TimestampedExporter;

use std::io::Write;

use crate::domain::{ExportError, RunResult};

/// Render `result` in the format the run was configured for
///
/// # Errors
/// See [`FoldedExporter::export`] and [`TimestampedExporter::export`].
pub fn export_run<W: Write>(
    result: &RunResult,
    include_timestamps: bool,
    writer: W,
) -> Result<(), ExportError> {
    if include_timestamps {
        TimestampedExporter::new(&result.samples).export(writer)
    } else {
        FoldedExporter::new(result).export(writer)
    }
}
