use alloc::boxed::Box;
use alloc::string::String;

use crate::pixel::ColorType;
use crate::profile::DecoderRequest;

/// Boxed error from a decoder or encoder collaborator.
pub type CollaboratorError = Box<dyn core::error::Error + Send + Sync + 'static>;

/// Errors from transcode setup and row emission.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum TranscodeError {
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    #[error("unsupported color model: {0}")]
    UnsupportedColorModel(String),

    #[error("unsupported storage layout: {0}")]
    UnsupportedLayout(String),

    #[error("palette too large ({colors} colors)")]
    PaletteTooLarge { colors: usize },

    #[error("palette image has no colormap")]
    MissingColormap,

    #[error("dimensions too large: {width}x{height}")]
    DimensionsTooLarge { width: u32, height: u32 },

    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    #[error("decoder refused {request:?}: {source}")]
    DecoderSetup {
        request: DecoderRequest,
        source: CollaboratorError,
    },

    #[error("bad data read on row {row}{}: {source}", plane_suffix(.plane))]
    RowRead {
        row: u32,
        plane: Option<u16>,
        source: CollaboratorError,
    },

    #[error("bad data read on tile {tile} (row {row}): {source}")]
    TileRead {
        tile: u32,
        row: u32,
        source: CollaboratorError,
    },

    #[error("encoder error{}: {source}", row_suffix(.row))]
    Sink {
        row: Option<u32>,
        source: CollaboratorError,
    },
}

fn plane_suffix(plane: &Option<u16>) -> String {
    plane
        .map(|p| alloc::format!(" (plane {p})"))
        .unwrap_or_default()
}

fn row_suffix(row: &Option<u32>) -> String {
    row.map(|r| alloc::format!(" on row {r}"))
        .unwrap_or_default()
}

/// Coarse classification of a [`TranscodeError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected before any row was emitted. The encoder saw nothing.
    Setup,
    /// The decoder failed to deliver a row, plane, or tile mid-stream.
    RowRead,
    /// The encoder collaborator failed.
    Sink,
}

impl TranscodeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::RowRead { .. } | Self::TileRead { .. } => ErrorKind::RowRead,
            Self::Sink { .. } => ErrorKind::Sink,
            _ => ErrorKind::Setup,
        }
    }
}

/// Non-fatal conditions surfaced in the [`TranscodeReport`](crate::TranscodeReport).
#[derive(Clone, Copy, Debug, PartialEq)]
#[non_exhaustive]
pub enum Warning {
    /// Faxpect was requested but the horizontal:vertical resolution ratio is
    /// missing or outside 1.90..=2.10. The image was converted without it.
    FaxpectRatioOutOfRange { ratio: Option<f64> },

    /// Faxpect was requested but the image is not 1-bit grayscale.
    FaxpectNotBilevel {
        color_type: ColorType,
        bit_depth: u8,
    },

    /// Faxpect was requested but the image is a single column wide.
    FaxpectTooNarrow { width: u32 },

    /// Extra channels hold associated (premultiplied) alpha. Samples were
    /// passed through unchanged.
    AssociatedAlpha,
}

impl core::fmt::Display for Warning {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::FaxpectRatioOutOfRange { ratio: Some(r) } => {
                write!(f, "aspect ratio {r:.3} is out of range: skipping faxpect")
            }
            Self::FaxpectRatioOutOfRange { ratio: None } => {
                f.write_str("no resolution recorded: skipping faxpect conversion")
            }
            Self::FaxpectNotBilevel {
                color_type,
                bit_depth,
            } => write!(f, "{color_type:?} at {bit_depth} bits is not bilevel"),
            Self::FaxpectTooNarrow { width } => {
                write!(f, "image is {width} pixel wide: skipping faxpect")
            }
            Self::AssociatedAlpha => {
                f.write_str("associated alpha is written as-is; PNG expects unassociated alpha")
            }
        }
    }
}
