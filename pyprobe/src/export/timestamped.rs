use std::io::Write;

use crate::domain::{ExportError, Sample};

/// Chronological trace exporter
///
/// Two lines per sample: microseconds since the Unix epoch, then the stack
/// (outermost first) or `(idle)`.
///
/// ```text
/// 1476838211250031
/// (idle)
/// 1476838211251107
/// main (app.py:40);handle (app.py:22)
/// ```
pub struct TimestampedExporter<'a> {
    samples: &'a [Sample],
}

impl<'a> TimestampedExporter<'a> {
    #[must_use]
    pub fn new(samples: &'a [Sample]) -> Self {
        Self { samples }
    }

    /// Write every sample in collection order
    ///
    /// # Errors
    /// Returns an error if writing fails
    pub fn export<W: Write>(&self, mut writer: W) -> Result<(), ExportError> {
        for sample in self.samples {
            writeln!(writer, "{}", sample.timestamp)?;
            if sample.frames.is_idle() {
                writeln!(writer, "(idle)")?;
            } else {
                writeln!(writer, "{}", sample.frames.folded())?;
            }
        }
        writer.flush()?;
        Ok(())
    }
}
