//! # zentiff2png
//!
//! Pixel transcoding core for TIFF to PNG conversion.
//!
//! Takes decoded TIFF sample data (any supported bit depth, sample count,
//! photometric interpretation, strip or tile storage, contiguous or
//! separated planes) and produces PNG-ready scanlines, one row at a time.
//! Reading the TIFF file and writing PNG chunks are left to the
//! [`RowSource`] and [`RowSink`] collaborators.
//!
//! ## Supported Inputs
//!
//! | photometric | samples | destination |
//! |---|---|---|
//! | MinIsBlack / MinIsWhite | 1 | Grayscale, same depth |
//! | MinIsBlack / MinIsWhite | 2+ | Gray+alpha, 8 or 16 bits |
//! | Palette | any | Palette, up to 256 colors |
//! | RGB | 3 / 4+ | RGB / RGBA, 8 or 16 bits |
//! | YCbCr (JPEG, contiguous) | 3 | RGB, decoder converts |
//! | LogL / LogLuv (SGILOG) | 1 / 3 | Gray / RGB, 8 or 16 bits |
//!
//! Sub-byte destination samples are handed to the sink unpacked, one per
//! byte. 16-bit samples are always big-endian in the destination line.
//!
//! ## Non-Goals
//!
//! - Compression, chunk framing, file I/O
//! - CMYK, CIE Lab, masks, and other color models without a PNG mapping
//! - Converting associated alpha
//!
//! ## Usage
//!
//! ```
//! use zentiff2png::{
//!     ColorModel, ImageHeader, MemorySink, MemorySource, TranscodeOptions, transcode,
//! };
//!
//! // 8x1 bi-level MinIsWhite scanline
//! let header = ImageHeader::new(8, 1, 1, 1, ColorModel::MinIsWhite);
//! let source = MemorySource::rows(vec![0b1111_0000], 1);
//! let mut sink = MemorySink::new();
//! let report = transcode(&header, None, source, &mut sink, TranscodeOptions::default())?;
//! assert!(report.warnings.is_empty());
//!
//! let image = sink.into_image().unwrap();
//! assert_eq!(image.row(0), &[0, 0, 0, 0, 1, 1, 1, 1]);
//! # Ok::<(), zentiff2png::TranscodeError>(())
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

pub mod aspect;
mod colormap;
mod error;
mod header;
mod limits;
mod output;
mod pixel;
mod planes;
mod profile;
pub mod sample;
mod sink;
mod source;
mod tiles;
mod transcode;

// Re-exports
pub use colormap::Colormap;
pub use error::{CollaboratorError, ErrorKind, TranscodeError, Warning};
pub use header::{
    ColorModel, Compression, ExtraSamples, ImageHeader, Planarity, Resolution, ResolutionUnit,
    StorageLayout,
};
pub use limits::{Limits, ScratchBuffers};
#[cfg(feature = "imgref")]
pub use output::DestinationPixels;
pub use output::TranscodedImage;
pub use pixel::{ColorType, DestinationFormat, PhysicalDimensions, PhysicalUnit};
pub use profile::{DecoderRequest, MAX_PALETTE_COLORS, ResolvedProfile, Upsampling, resolve};
pub use sink::{MemorySink, RowSink};
pub use source::{MemorySource, MemorySourceError, RowSource, SourceCapabilities};
pub use transcode::{Conversion, TranscodeOptions, TranscodeReport, TranscodeRequest, transcode};
