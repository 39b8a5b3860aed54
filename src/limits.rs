use crate::error::TranscodeError;

/// Resource limits checked once, while a conversion is set up.
///
/// All fields default to `None` (no limit). Nothing is read from the
/// decoder and nothing is allocated until every limit has passed.
#[derive(Clone, Debug, Default)]
pub struct Limits {
    pub max_width: Option<u64>,
    pub max_height: Option<u64>,
    /// Maximum pixel count (width * height).
    pub max_pixels: Option<u64>,
    /// Maximum combined size of the [`ScratchBuffers`] one conversion holds.
    pub max_memory_bytes: Option<u64>,
}

/// Working memory one conversion keeps for its whole lifetime, by buffer.
///
/// Sizes are computed from the header before anything is allocated. Which
/// buffers are non-zero depends on how the source stores its scanlines.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScratchBuffers {
    /// One packed source scanline (strips and separated planes).
    pub source_line: usize,
    /// One packed single-channel scanline (separated planes only).
    pub plane_line: usize,
    /// One tile plus the full-width tile-row it is copied into.
    pub tile_row: usize,
    /// One unpacked destination scanline.
    pub destination_line: usize,
}

impl ScratchBuffers {
    /// Combined size in bytes, saturating at `u64::MAX`.
    pub fn total(&self) -> u64 {
        let sizes = self.named().map(|(_, bytes)| bytes as u64);
        sizes.into_iter().fold(0, u64::saturating_add)
    }

    fn named(&self) -> [(&'static str, usize); 4] {
        [
            ("source line", self.source_line),
            ("plane line", self.plane_line),
            ("tile row", self.tile_row),
            ("destination line", self.destination_line),
        ]
    }

    /// The largest buffer and its name, for error messages.
    fn largest(&self) -> (&'static str, usize) {
        let named = self.named();
        let mut largest = named[0];
        for entry in named {
            if entry.1 > largest.1 {
                largest = entry;
            }
        }
        largest
    }
}

impl Limits {
    /// Check dimensions against limits.
    pub(crate) fn check(&self, width: u32, height: u32) -> Result<(), TranscodeError> {
        if let Some(max_w) = self.max_width {
            if u64::from(width) > max_w {
                return Err(TranscodeError::LimitExceeded(alloc::format!(
                    "width {width} exceeds limit {max_w}"
                )));
            }
        }
        if let Some(max_h) = self.max_height {
            if u64::from(height) > max_h {
                return Err(TranscodeError::LimitExceeded(alloc::format!(
                    "height {height} exceeds limit {max_h}"
                )));
            }
        }
        if let Some(max_px) = self.max_pixels {
            let pixels = u64::from(width) * u64::from(height);
            if pixels > max_px {
                return Err(TranscodeError::LimitExceeded(alloc::format!(
                    "pixel count {pixels} exceeds limit {max_px}"
                )));
            }
        }
        Ok(())
    }

    /// Check the planned scratch buffers against `max_memory_bytes`.
    ///
    /// The error reports the total and names the largest buffer.
    pub(crate) fn check_scratch(&self, scratch: &ScratchBuffers) -> Result<(), TranscodeError> {
        let Some(max_mem) = self.max_memory_bytes else {
            return Ok(());
        };
        let total = scratch.total();
        if total > max_mem {
            let (name, bytes) = scratch.largest();
            return Err(TranscodeError::LimitExceeded(alloc::format!(
                "scratch needs {total} bytes (largest {name}: {bytes}), limit is {max_mem}"
            )));
        }
        Ok(())
    }
}
