//! Encoder collaborator interface and an in-memory implementation.
//!
//! # Contract
//!
//! - [`begin()`](RowSink::begin) is called exactly once, before any row.
//! - [`pass_count()`](RowSink::pass_count) is queried right after `begin`.
//!   Every row `0..height` is then written once per pass, in order.
//! - Each line passed to [`write_row()`](RowSink::write_row) is exactly
//!   [`DestinationFormat::row_bytes`] long and only valid for that call.
//! - [`finish()`](RowSink::finish) follows the last row of the last pass.
//!   It is not called when the conversion fails.

use alloc::vec::Vec;
use core::convert::Infallible;

use crate::output::TranscodedImage;
use crate::pixel::DestinationFormat;

/// Receives destination scanlines.
pub trait RowSink {
    type Error: core::error::Error + Send + Sync + 'static;

    fn begin(&mut self, format: &DestinationFormat) -> Result<(), Self::Error>;

    /// Number of times the full row set is emitted (7 for Adam7).
    fn pass_count(&self) -> u32 {
        1
    }

    fn write_row(&mut self, pass: u32, row: u32, line: &[u8]) -> Result<(), Self::Error>;

    fn finish(&mut self) -> Result<(), Self::Error>;
}

impl<K: RowSink + ?Sized> RowSink for &mut K {
    type Error = K::Error;

    fn begin(&mut self, format: &DestinationFormat) -> Result<(), Self::Error> {
        (**self).begin(format)
    }

    fn pass_count(&self) -> u32 {
        (**self).pass_count()
    }

    fn write_row(&mut self, pass: u32, row: u32, line: &[u8]) -> Result<(), Self::Error> {
        (**self).write_row(pass, row, line)
    }

    fn finish(&mut self) -> Result<(), Self::Error> {
        (**self).finish()
    }
}

/// Collects destination rows in memory.
///
/// Pixels of the first pass are kept; later passes are counted and checked
/// for being identical to it.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    format: Option<DestinationFormat>,
    passes: u32,
    pixels: Vec<u8>,
    rows_written: u64,
    mismatched_rows: u64,
    finished: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::with_passes(1)
    }

    /// Ask the transcoder for `passes` emissions of every row.
    pub fn with_passes(passes: u32) -> Self {
        Self {
            passes,
            ..Self::default()
        }
    }

    pub fn format(&self) -> Option<&DestinationFormat> {
        self.format.as_ref()
    }

    /// Rows received across all passes.
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Rows in later passes that differed from the first pass.
    pub fn mismatched_rows(&self) -> u64 {
        self.mismatched_rows
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// The collected image, once [`RowSink::finish`] has been called.
    pub fn into_image(self) -> Option<TranscodedImage> {
        if !self.finished {
            return None;
        }
        self.format
            .map(|format| TranscodedImage::new(format, self.pixels))
    }
}

impl RowSink for MemorySink {
    type Error = Infallible;

    fn begin(&mut self, format: &DestinationFormat) -> Result<(), Self::Error> {
        self.format = Some(format.clone());
        self.pixels.clear();
        self.rows_written = 0;
        self.mismatched_rows = 0;
        self.finished = false;
        Ok(())
    }

    fn pass_count(&self) -> u32 {
        self.passes.max(1)
    }

    fn write_row(&mut self, pass: u32, row: u32, line: &[u8]) -> Result<(), Self::Error> {
        if pass == 0 {
            self.pixels.extend_from_slice(line);
        } else {
            let start = row as usize * line.len();
            if self.pixels.get(start..start + line.len()) != Some(line) {
                self.mismatched_rows += 1;
            }
        }
        self.rows_written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), Self::Error> {
        self.finished = true;
        Ok(())
    }
}
