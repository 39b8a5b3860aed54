//! Bit-level sample extraction and insertion.
//!
//! Samples are packed MSB-first. A single call consumes at most 8 bits:
//! depths above 8 are handled by the caller as a sequence of 8-bit samples,
//! in whatever byte order the buffer holds them.

/// Width in bits consumed by one read or write at the given depth.
#[inline]
pub const fn unit_bits(bits_per_sample: u8) -> u8 {
    if bits_per_sample >= 8 {
        8
    } else {
        bits_per_sample
    }
}

/// Mask for one unit at the given depth (`0xFF` for 8 bits and above).
#[inline]
pub const fn unit_mask(bits_per_sample: u8) -> u8 {
    (((1u16) << unit_bits(bits_per_sample)) - 1) as u8
}

/// Number of 8-bit units a sample occupies (2 at 16 bits, otherwise 1).
#[inline]
pub const fn units_per_sample(bits_per_sample: u8) -> usize {
    if bits_per_sample > 8 { 2 } else { 1 }
}

/// Position within a packed sample buffer.
///
/// Tracks the current byte and how many of its bits are still unconsumed.
/// A fresh cursor sits on byte 0 with all 8 bits available; the byte index
/// only advances when the next access finds the current byte exhausted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BitCursor {
    byte: usize,
    bits_left: u8,
}

impl Default for BitCursor {
    fn default() -> Self {
        Self::new()
    }
}

impl BitCursor {
    pub const fn new() -> Self {
        Self {
            byte: 0,
            bits_left: 8,
        }
    }

    /// Byte currently being consumed.
    pub fn byte(&self) -> usize {
        self.byte
    }

    /// Unconsumed bits left in the current byte.
    pub fn bits_left(&self) -> u8 {
        self.bits_left
    }

    /// Step past one unit and return the shift of its low bit.
    #[inline]
    fn advance(&mut self, bits_per_sample: u8) -> u8 {
        if self.bits_left == 0 {
            self.byte += 1;
            self.bits_left = 8;
        }
        self.bits_left -= unit_bits(bits_per_sample);
        self.bits_left
    }

    /// Read one unit. Panics if the cursor has run past `buf`.
    #[inline]
    pub fn read(&mut self, buf: &[u8], bits_per_sample: u8) -> u8 {
        let shift = self.advance(bits_per_sample);
        (buf[self.byte] >> shift) & unit_mask(bits_per_sample)
    }

    /// OR one unit into `buf`. The target byte must start zeroed.
    #[inline]
    pub fn write(&mut self, buf: &mut [u8], bits_per_sample: u8, value: u8) {
        let shift = self.advance(bits_per_sample);
        buf[self.byte] |= (value & unit_mask(bits_per_sample)) << shift;
    }

    /// Advance past `count` units without touching any buffer.
    #[inline]
    pub fn skip(&mut self, bits_per_sample: u8, count: usize) {
        for _ in 0..count {
            self.advance(bits_per_sample);
        }
    }
}
