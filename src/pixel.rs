use alloc::vec::Vec;

/// Destination (PNG) color type.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColorType {
    /// Single gray channel, 1/2/4/8/16 bits.
    Grayscale,
    /// Gray plus alpha, 8 or 16 bits.
    GrayscaleAlpha,
    /// Palette indices, 1/2/4/8 bits.
    Palette,
    /// RGB, 8 or 16 bits.
    Truecolor,
    /// RGBA, 8 or 16 bits.
    TruecolorAlpha,
}

impl ColorType {
    /// Number of channels per pixel.
    pub fn channels(&self) -> usize {
        match self {
            Self::Grayscale | Self::Palette => 1,
            Self::GrayscaleAlpha => 2,
            Self::Truecolor => 3,
            Self::TruecolorAlpha => 4,
        }
    }

    /// Whether the last channel is alpha.
    pub fn has_alpha(&self) -> bool {
        matches!(self, Self::GrayscaleAlpha | Self::TruecolorAlpha)
    }

    /// The `color_type` byte of a PNG IHDR chunk.
    pub fn png_code(&self) -> u8 {
        match self {
            Self::Grayscale => 0,
            Self::Truecolor => 2,
            Self::Palette => 3,
            Self::GrayscaleAlpha => 4,
            Self::TruecolorAlpha => 6,
        }
    }
}

/// Unit of a [`PhysicalDimensions`] record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PhysicalUnit {
    /// Only the aspect ratio is meaningful.
    Unknown,
    Meter,
}

/// Pixels per unit along each axis (PNG pHYs).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhysicalDimensions {
    pub x_per_unit: u32,
    pub y_per_unit: u32,
    pub unit: PhysicalUnit,
}

/// Declaration handed to the encoder once, before any row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DestinationFormat {
    pub width: u32,
    pub height: u32,
    pub bit_depth: u8,
    pub color_type: ColorType,
    /// RGB entries, present iff `color_type` is [`ColorType::Palette`].
    pub palette: Option<Vec<[u8; 3]>>,
    pub physical: Option<PhysicalDimensions>,
    pub interlaced: bool,
}

impl DestinationFormat {
    /// Bytes per destination sample: 2 at 16 bits, otherwise 1 (unpacked).
    pub fn bytes_per_sample(&self) -> usize {
        if self.bit_depth > 8 { 2 } else { 1 }
    }

    /// Length of every scanline passed to [`RowSink::write_row`](crate::RowSink::write_row).
    pub fn row_bytes(&self) -> usize {
        self.width as usize * self.color_type.channels() * self.bytes_per_sample()
    }
}
