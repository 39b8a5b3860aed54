//! Decoder collaborator interface and an in-memory implementation.

use alloc::vec::Vec;

use crate::profile::DecoderRequest;

/// What the decoder can do and how it lays out wide samples.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SourceCapabilities {
    /// 16-bit samples arrive most-significant byte first.
    ///
    /// Decoders usually hand back machine-native order regardless of the
    /// file's own byte order, so this is normally the host's endianness.
    pub samples_big_endian: bool,
    /// The decoder can deliver SGI-log luminance as 16-bit integers.
    pub log_luminance_16bit: bool,
}

impl SourceCapabilities {
    /// Host byte order, no 16-bit log luminance.
    pub const fn native() -> Self {
        Self {
            samples_big_endian: cfg!(target_endian = "big"),
            log_luminance_16bit: false,
        }
    }
}

impl Default for SourceCapabilities {
    fn default() -> Self {
        Self::native()
    }
}

/// Supplies raw, packed sample data row by row or tile by tile.
///
/// Every call fills `buf` completely; its length is computed by the
/// transcoder from the header (and any [`DecoderRequest`] it issued).
/// Reads arrive in increasing row order, repeated from row 0 for each
/// interlace pass.
pub trait RowSource {
    type Error: core::error::Error + Send + Sync + 'static;

    fn capabilities(&self) -> SourceCapabilities {
        SourceCapabilities::native()
    }

    /// Called once before any read when the color model needs the decoder
    /// to convert samples on the way out.
    fn configure(&mut self, request: DecoderRequest) -> Result<(), Self::Error>;

    /// Read one scanline. `plane` is 0 for contiguous images.
    fn read_scanline(&mut self, row: u32, plane: u16, buf: &mut [u8]) -> Result<(), Self::Error>;

    /// Read one tile, numbered row-major from the top-left.
    fn read_tile(&mut self, tile: u32, buf: &mut [u8]) -> Result<(), Self::Error>;
}

impl<S: RowSource + ?Sized> RowSource for &mut S {
    type Error = S::Error;

    fn capabilities(&self) -> SourceCapabilities {
        (**self).capabilities()
    }

    fn configure(&mut self, request: DecoderRequest) -> Result<(), Self::Error> {
        (**self).configure(request)
    }

    fn read_scanline(&mut self, row: u32, plane: u16, buf: &mut [u8]) -> Result<(), Self::Error> {
        (**self).read_scanline(row, plane, buf)
    }

    fn read_tile(&mut self, tile: u32, buf: &mut [u8]) -> Result<(), Self::Error> {
        (**self).read_tile(tile, buf)
    }
}

/// Errors from [`MemorySource`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum MemorySourceError {
    #[error("row {row} plane {plane} is not stored")]
    RowOutOfRange { row: u32, plane: u16 },

    #[error("tile {0} is not stored")]
    TileOutOfRange(u32),

    #[error("stored data too short: need {needed} bytes, have {actual}")]
    Truncated { needed: usize, actual: usize },

    #[error("image is not stored in {0}")]
    WrongLayout(&'static str),
}

enum Stored {
    Rows { data: Vec<u8>, row_bytes: usize },
    Planes {
        planes: Vec<Vec<u8>>,
        row_bytes: usize,
    },
    Tiles(Vec<Vec<u8>>),
}

/// Already-decoded sample data held in memory.
///
/// Decoder requests are recorded but not acted on: the stored data must
/// already be in the requested form.
pub struct MemorySource {
    stored: Stored,
    capabilities: SourceCapabilities,
    requests: Vec<DecoderRequest>,
}

impl MemorySource {
    /// Contiguous scanlines of `row_bytes` each, back to back.
    pub fn rows(data: Vec<u8>, row_bytes: usize) -> Self {
        Self::with_stored(Stored::Rows { data, row_bytes })
    }

    /// One buffer per plane, each holding scanlines of `row_bytes`.
    pub fn planes(planes: Vec<Vec<u8>>, row_bytes: usize) -> Self {
        Self::with_stored(Stored::Planes { planes, row_bytes })
    }

    /// One buffer per tile, row-major tile order.
    pub fn tiles(tiles: Vec<Vec<u8>>) -> Self {
        Self::with_stored(Stored::Tiles(tiles))
    }

    fn with_stored(stored: Stored) -> Self {
        Self {
            stored,
            capabilities: SourceCapabilities::native(),
            requests: Vec::new(),
        }
    }

    pub fn with_capabilities(mut self, capabilities: SourceCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Requests received through [`RowSource::configure`], oldest first.
    pub fn requests(&self) -> &[DecoderRequest] {
        &self.requests
    }
}

fn copy_from(src: &[u8], offset: usize, buf: &mut [u8]) -> Result<(), MemorySourceError> {
    let needed = offset + buf.len();
    let data = src.get(offset..needed).ok_or(MemorySourceError::Truncated {
        needed,
        actual: src.len(),
    })?;
    buf.copy_from_slice(data);
    Ok(())
}

impl RowSource for MemorySource {
    type Error = MemorySourceError;

    fn capabilities(&self) -> SourceCapabilities {
        self.capabilities
    }

    fn configure(&mut self, request: DecoderRequest) -> Result<(), Self::Error> {
        self.requests.push(request);
        Ok(())
    }

    fn read_scanline(&mut self, row: u32, plane: u16, buf: &mut [u8]) -> Result<(), Self::Error> {
        let (data, row_bytes) = match &self.stored {
            Stored::Rows { data, row_bytes } if plane == 0 => (data, *row_bytes),
            Stored::Planes { planes, row_bytes } => {
                let data = planes
                    .get(plane as usize)
                    .ok_or(MemorySourceError::RowOutOfRange { row, plane })?;
                (data, *row_bytes)
            }
            Stored::Rows { .. } => return Err(MemorySourceError::RowOutOfRange { row, plane }),
            Stored::Tiles(_) => return Err(MemorySourceError::WrongLayout("scanlines")),
        };
        let offset = row as usize * row_bytes;
        if offset >= data.len() {
            return Err(MemorySourceError::RowOutOfRange { row, plane });
        }
        copy_from(data, offset, buf)
    }

    fn read_tile(&mut self, tile: u32, buf: &mut [u8]) -> Result<(), Self::Error> {
        let Stored::Tiles(tiles) = &self.stored else {
            return Err(MemorySourceError::WrongLayout("tiles"));
        };
        let data = tiles
            .get(tile as usize)
            .ok_or(MemorySourceError::TileOutOfRange(tile))?;
        copy_from(data, 0, buf)
    }
}
