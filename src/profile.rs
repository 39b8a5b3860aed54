//! Source color model → destination color type, depth, and per-sample rules.
//!
//! [`resolve`] is the only place that branches on [`ColorModel`]. Everything
//! downstream reads the flat [`ResolvedProfile`] it returns.

use crate::error::TranscodeError;
use crate::header::{ColorModel, Compression, ImageHeader, Planarity};
use crate::pixel::ColorType;
use crate::source::SourceCapabilities;
use crate::transcode::TranscodeOptions;

/// Largest palette the destination can carry.
pub const MAX_PALETTE_COLORS: usize = 256;

/// How sub-8-bit channels are stretched to 8 bits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Upsampling {
    /// ×255, ×85, ×17 for 1, 2, 4 bits. Maximum maps to 255.
    #[default]
    FullRange,
    /// ×128, ×64, ×16, as written by older converters. Maximum maps below 255.
    Legacy,
}

impl Upsampling {
    /// Multiplier for a `bits`-deep sample; 1 at 8 bits and above.
    pub const fn multiplier(self, bits: u8) -> u8 {
        match (self, bits) {
            (Self::FullRange, 1) => 255,
            (Self::FullRange, 2) => 85,
            (Self::FullRange, 4) => 17,
            (Self::Legacy, 1) => 128,
            (Self::Legacy, 2) => 64,
            (Self::Legacy, 4) => 16,
            _ => 1,
        }
    }
}

/// Conversion the decoder must perform before delivering rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecoderRequest {
    /// Deliver JPEG-compressed YCbCr as 8-bit RGB.
    YCbCrToRgb,
    /// Deliver SGI-log data as integer gray (LogL) or RGB (LogLuv).
    LogLuminance { sixteen_bit: bool },
}

/// Everything the row loop needs, derived once per conversion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedProfile {
    pub color_type: ColorType,
    pub bit_depth: u8,
    /// Depth of the samples the decoder delivers.
    pub source_bits: u8,
    /// Samples per pixel the decoder delivers.
    pub channels: u16,
    /// Leading channels that carry color (and may be inverted).
    pub color_channels: u16,
    /// Flip polarity of the color channels.
    pub invert: bool,
    /// Samples are palette indices, copied untouched.
    pub palette_index: bool,
    /// Applied to every emitted sub-8-bit sample.
    pub upsample: u8,
    /// Palette entries, 0 unless paletted.
    pub color_count: usize,
    pub decoder_request: Option<DecoderRequest>,
}

impl ResolvedProfile {
    /// Channels written per destination pixel.
    pub fn dest_channels(&self) -> u16 {
        self.color_type.channels() as u16
    }
}

fn widened(bits: u8) -> u8 {
    if bits <= 8 { 8 } else { bits }
}

/// Resolve the destination encoding for `header`.
///
/// Faxpect is not applied here; see [`crate::aspect`].
pub fn resolve(
    header: &ImageHeader,
    caps: &SourceCapabilities,
    options: &TranscodeOptions,
) -> Result<ResolvedProfile, TranscodeError> {
    let bps = header.bits_per_sample;
    let spp = header.samples_per_pixel;

    match header.color_model {
        ColorModel::MinIsBlack | ColorModel::MinIsWhite => {
            let invert =
                options.invert_polarity ^ (header.color_model == ColorModel::MinIsWhite);
            if spp == 1 {
                Ok(ResolvedProfile {
                    color_type: ColorType::Grayscale,
                    bit_depth: bps,
                    source_bits: bps,
                    channels: 1,
                    color_channels: 1,
                    invert,
                    palette_index: false,
                    upsample: 1,
                    color_count: 0,
                    decoder_request: None,
                })
            } else {
                Ok(ResolvedProfile {
                    color_type: ColorType::GrayscaleAlpha,
                    bit_depth: widened(bps),
                    source_bits: bps,
                    channels: spp,
                    color_channels: 1,
                    invert,
                    palette_index: false,
                    upsample: options.upsampling.multiplier(bps),
                    color_count: 0,
                    decoder_request: None,
                })
            }
        }
        ColorModel::Palette => {
            let colors = 1usize << bps;
            if colors > MAX_PALETTE_COLORS {
                return Err(TranscodeError::PaletteTooLarge { colors });
            }
            Ok(ResolvedProfile {
                color_type: ColorType::Palette,
                bit_depth: if bps >= 8 { 8 } else { bps },
                source_bits: bps,
                channels: spp,
                color_channels: 1,
                // polarity lives in the palette entries, never the indices
                invert: false,
                palette_index: true,
                upsample: 1,
                color_count: colors,
                decoder_request: None,
            })
        }
        ColorModel::Rgb => truecolor(bps, spp, options, None),
        ColorModel::YCbCr => {
            if header.compression == Compression::Jpeg
                && header.planarity == Planarity::Contiguous
            {
                truecolor(bps, spp, options, Some(DecoderRequest::YCbCrToRgb))
            } else {
                Err(TranscodeError::UnsupportedColorModel(alloc::format!(
                    "YCbCr with compression {:?} and {:?} planes (needs contiguous JPEG)",
                    header.compression,
                    header.planarity
                )))
            }
        }
        ColorModel::LogL | ColorModel::LogLuv => {
            if !header.compression.is_sgilog() {
                return Err(TranscodeError::UnsupportedColorModel(alloc::format!(
                    "{:?} with compression {:?} (needs SGILOG)",
                    header.color_model,
                    header.compression
                )));
            }
            let sixteen_bit = bps > 8 && caps.log_luminance_16bit;
            let bits = if sixteen_bit { 16 } else { 8 };
            let request = Some(DecoderRequest::LogLuminance { sixteen_bit });
            let (color_type, channels) = if header.color_model == ColorModel::LogL {
                (ColorType::Grayscale, 1)
            } else {
                (ColorType::Truecolor, 3)
            };
            Ok(ResolvedProfile {
                color_type,
                bit_depth: bits,
                source_bits: bits,
                channels,
                color_channels: channels,
                invert: options.invert_polarity,
                palette_index: false,
                upsample: 1,
                color_count: 0,
                decoder_request: request,
            })
        }
        other => Err(TranscodeError::UnsupportedColorModel(alloc::format!("{other:?}"))),
    }
}

fn truecolor(
    bps: u8,
    spp: u16,
    options: &TranscodeOptions,
    decoder_request: Option<DecoderRequest>,
) -> Result<ResolvedProfile, TranscodeError> {
    // the decoder always hands back 8-bit RGB from JPEG
    let (bps, spp) = match decoder_request {
        Some(DecoderRequest::YCbCrToRgb) => (8, 3),
        _ => (bps, spp),
    };
    let color_type = match spp {
        3 => ColorType::Truecolor,
        4.. => ColorType::TruecolorAlpha,
        _ => {
            return Err(TranscodeError::UnsupportedColorModel(alloc::format!(
                "RGB with {spp} samples per pixel"
            )));
        }
    };
    Ok(ResolvedProfile {
        color_type,
        bit_depth: widened(bps),
        source_bits: bps,
        channels: spp,
        color_channels: 3,
        invert: options.invert_polarity,
        palette_index: false,
        upsample: options.upsampling.multiplier(bps),
        color_count: 0,
        decoder_request,
    })
}
