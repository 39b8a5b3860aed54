//! Source image description consumed from the decoder.

use crate::error::TranscodeError;

/// How the channels of one pixel are stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Planarity {
    /// Channels interleaved within each scanline.
    #[default]
    Contiguous,
    /// One full-size single-channel image per channel.
    Separated,
}

/// How scanlines are grouped on disk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum StorageLayout {
    /// Full-width horizontal strips, read one scanline at a time.
    #[default]
    Strips,
    /// Grid of independently stored tiles, numbered row-major.
    Tiles { tile_width: u32, tile_height: u32 },
}

/// Photometric interpretation of the source channels.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColorModel {
    MinIsWhite,
    MinIsBlack,
    Rgb,
    Palette,
    TransparencyMask,
    /// Ink separations (usually CMYK).
    Separated,
    YCbCr,
    CieLab,
    /// SGI logarithmic luminance.
    LogL,
    /// SGI logarithmic luminance + chroma.
    LogLuv,
    Depth,
    Unknown(u16),
}

impl ColorModel {
    /// Map a TIFF `PhotometricInterpretation` tag value.
    pub fn from_photometric(code: u16) -> Self {
        match code {
            0 => Self::MinIsWhite,
            1 => Self::MinIsBlack,
            2 => Self::Rgb,
            3 => Self::Palette,
            4 => Self::TransparencyMask,
            5 => Self::Separated,
            6 => Self::YCbCr,
            8 => Self::CieLab,
            32768 => Self::Depth,
            32844 => Self::LogL,
            32845 => Self::LogLuv,
            other => Self::Unknown(other),
        }
    }
}

/// Source compression, as far as color model resolution cares.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Compression {
    #[default]
    None,
    Jpeg,
    SgiLog,
    SgiLog24,
    Other(u16),
}

impl Compression {
    /// Map a TIFF `Compression` tag value.
    pub fn from_tiff(code: u16) -> Self {
        match code {
            1 => Self::None,
            7 => Self::Jpeg,
            34676 => Self::SgiLog,
            34677 => Self::SgiLog24,
            other => Self::Other(other),
        }
    }

    pub fn is_sgilog(&self) -> bool {
        matches!(self, Self::SgiLog | Self::SgiLog24)
    }
}

/// Unit of a [`Resolution`]. TIFF defaults to inches when the tag is absent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ResolutionUnit {
    #[default]
    Inch,
    Centimeter,
    Unspecified,
}

/// Pixels per unit along each axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Resolution {
    pub x: f32,
    pub y: f32,
    pub unit: ResolutionUnit,
}

impl Resolution {
    /// Horizontal:vertical ratio, or `None` if either axis is zero.
    pub fn aspect_ratio(&self) -> Option<f64> {
        if self.x == 0.0 || self.y == 0.0 {
            return None;
        }
        Some(f64::from(self.x) / f64::from(self.y))
    }
}

/// Meaning of channels beyond the color model's own.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExtraSamples {
    Unspecified,
    /// Premultiplied alpha.
    AssociatedAlpha,
    UnassociatedAlpha,
}

/// Header fields the transcoder reads from the decoder.
///
/// Immutable for the duration of one conversion.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageHeader {
    pub width: u32,
    pub height: u32,
    /// One of 1, 2, 4, 8, 16.
    pub bits_per_sample: u8,
    pub samples_per_pixel: u16,
    pub planarity: Planarity,
    pub color_model: ColorModel,
    pub compression: Compression,
    pub layout: StorageLayout,
    pub resolution: Option<Resolution>,
    pub extra_samples: Option<ExtraSamples>,
}

impl ImageHeader {
    /// Contiguous, strip-stored, uncompressed image with no resolution.
    pub fn new(
        width: u32,
        height: u32,
        bits_per_sample: u8,
        samples_per_pixel: u16,
        color_model: ColorModel,
    ) -> Self {
        Self {
            width,
            height,
            bits_per_sample,
            samples_per_pixel,
            planarity: Planarity::Contiguous,
            color_model,
            compression: Compression::None,
            layout: StorageLayout::Strips,
            resolution: None,
            extra_samples: None,
        }
    }

    pub fn with_planarity(mut self, planarity: Planarity) -> Self {
        self.planarity = planarity;
        self
    }

    pub fn with_tiles(mut self, tile_width: u32, tile_height: u32) -> Self {
        self.layout = StorageLayout::Tiles {
            tile_width,
            tile_height,
        };
        self
    }

    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    pub fn with_resolution(mut self, x: f32, y: f32, unit: ResolutionUnit) -> Self {
        self.resolution = Some(Resolution { x, y, unit });
        self
    }

    pub fn with_extra_samples(mut self, extra: ExtraSamples) -> Self {
        self.extra_samples = Some(extra);
        self
    }

    /// Reject geometry the transcoder cannot address.
    pub(crate) fn validate(&self) -> Result<(), TranscodeError> {
        if self.width == 0 || self.height == 0 {
            return Err(TranscodeError::InvalidHeader(alloc::format!(
                "image is {}x{}",
                self.width,
                self.height
            )));
        }
        if !matches!(self.bits_per_sample, 1 | 2 | 4 | 8 | 16) {
            return Err(TranscodeError::InvalidHeader(alloc::format!(
                "{} bits per sample",
                self.bits_per_sample
            )));
        }
        if self.samples_per_pixel == 0 {
            return Err(TranscodeError::InvalidHeader("zero samples per pixel".into()));
        }
        if let StorageLayout::Tiles {
            tile_width,
            tile_height,
        } = self.layout
        {
            if self.planarity == Planarity::Separated {
                return Err(TranscodeError::UnsupportedLayout(
                    "tiled separated-plane images".into(),
                ));
            }
            if tile_width == 0 || tile_height == 0 {
                return Err(TranscodeError::InvalidHeader(alloc::format!(
                    "tile is {tile_width}x{tile_height}"
                )));
            }
        }
        Ok(())
    }
}

/// Packed bytes for `samples` samples of `bits` each, checked.
pub(crate) fn packed_bytes(
    samples: u64,
    bits: u8,
    width: u32,
    height: u32,
) -> Result<usize, TranscodeError> {
    samples
        .checked_mul(u64::from(bits))
        .map(|b| b.div_ceil(8))
        .and_then(|b| usize::try_from(b).ok())
        .ok_or(TranscodeError::DimensionsTooLarge { width, height })
}
