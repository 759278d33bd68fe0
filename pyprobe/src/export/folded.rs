use std::io::Write;

use log::debug;

use crate::analysis::{Bucket, StackAggregator};
use crate::domain::{ExportError, RunResult};

/// Folded-stack exporter (flamegraph.pl / inferno input)
///
/// ```text
/// (idle) 12
/// main (app.py:40);handle (app.py:22);parse (json.py:7) 31
/// main (app.py:40);handle (app.py:25) 4
/// ```
pub struct FoldedExporter {
    buckets: Vec<Bucket>,
    idle_count: usize,
}

impl FoldedExporter {
    /// Aggregate a finished run
    #[must_use]
    pub fn new(result: &RunResult) -> Self {
        let aggregator = StackAggregator::from_run(result);
        debug!(
            "{} distinct stacks across {} samples, {} idle",
            aggregator.len(),
            aggregator.total(),
            result.idle_count
        );
        Self::from_buckets(aggregator.into_buckets(), result.idle_count)
    }

    #[must_use]
    pub fn from_buckets(buckets: Vec<Bucket>, idle_count: usize) -> Self {
        Self { buckets, idle_count }
    }

    /// Write the report, hottest stacks first
    ///
    /// Ties are broken by the rendered stack so output is deterministic.
    ///
    /// # Errors
    /// [`ExportError::EmptyStack`] if an idle sequence reached the buckets
    /// (nothing is written in that case), or an I/O error.
    pub fn export<W: Write>(mut self, mut writer: W) -> Result<(), ExportError> {
        if self.buckets.iter().any(|b| b.frames.is_empty()) {
            return Err(ExportError::EmptyStack);
        }

        let mut lines: Vec<(String, usize)> =
            self.buckets.drain(..).map(|b| (b.frames.folded(), b.count)).collect();
        lines.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        if self.idle_count > 0 {
            writeln!(writer, "(idle) {}", self.idle_count)?;
        }
        for (stack, count) in lines {
            writeln!(writer, "{stack} {count}")?;
        }
        writer.flush()?;
        Ok(())
    }
}
