//! Rebuild interleaved scanlines from separated color planes.

use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::error::TranscodeError;
use crate::sample::{BitCursor, units_per_sample};
use crate::source::RowSource;

/// Scratch state for one separated-plane conversion.
pub(crate) struct PlaneReconstructor {
    plane: Vec<u8>,
    plane_bytes: usize,
    width: u32,
    bits: u8,
    planes: u16,
}

impl PlaneReconstructor {
    /// `plane_bytes` is the packed size of one single-channel scanline.
    pub(crate) fn new(plane_bytes: usize, width: u32, bits: u8, planes: u16) -> Self {
        Self {
            plane: Vec::new(),
            plane_bytes,
            width,
            bits,
            planes,
        }
    }

    pub(crate) fn scratch_bytes(&self) -> usize {
        self.plane_bytes
    }

    /// Read every plane of `row` and interleave them into `out`.
    pub(crate) fn read_row<S: RowSource + ?Sized>(
        &mut self,
        source: &mut S,
        row: u32,
        out: &mut [u8],
    ) -> Result<(), TranscodeError> {
        self.plane.resize(self.plane_bytes, 0);
        out.fill(0);
        for p in 0..self.planes {
            source
                .read_scanline(row, p, &mut self.plane)
                .map_err(|e| TranscodeError::RowRead {
                    row,
                    plane: Some(p),
                    source: Box::new(e),
                })?;
            interleave_plane(&self.plane, p, self.planes, self.width, self.bits, out);
        }
        Ok(())
    }
}

/// OR plane `index` of `planes` into its slots of the contiguous line `out`.
///
/// `out` must be zeroed before the first plane is written.
pub(crate) fn interleave_plane(
    plane: &[u8],
    index: u16,
    planes: u16,
    width: u32,
    bits: u8,
    out: &mut [u8],
) {
    let units = units_per_sample(bits);
    let others = (planes as usize - 1) * units;
    let mut src = BitCursor::new();
    let mut dst = BitCursor::new();

    dst.skip(bits, index as usize * units);
    for _ in 0..width {
        for _ in 0..units {
            let v = src.read(plane, bits);
            dst.write(out, bits, v);
        }
        dst.skip(bits, others);
    }
}
