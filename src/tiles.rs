//! Rebuild full-width scanlines from a row of tiles.
//!
//! A whole tile-row is materialized when the first scanline inside it is
//! requested; the remaining scanlines of that tile-row are slices into the
//! same buffer.

use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::error::TranscodeError;
use crate::header::packed_bytes;
use crate::source::RowSource;

pub(crate) struct TileReconstructor {
    width: u32,
    height: u32,
    tile_height: u32,
    tiles_across: u32,
    /// Packed bytes in one row of one tile.
    tile_row_bytes: usize,
    /// Packed bytes in one row of the tile-row buffer.
    stride: usize,
    tile_bytes: usize,
    strip_bytes: usize,
    tile: Vec<u8>,
    strip: Vec<u8>,
    loaded: Option<u32>,
}

impl TileReconstructor {
    pub(crate) fn new(
        width: u32,
        height: u32,
        tile_width: u32,
        tile_height: u32,
        channels: u16,
        bits: u8,
    ) -> Result<Self, TranscodeError> {
        let row_bits = u64::from(tile_width) * u64::from(channels) * u64::from(bits);
        if row_bits % 8 != 0 {
            return Err(TranscodeError::InvalidHeader(alloc::format!(
                "tile width {tile_width} gives {row_bits}-bit tile rows (not byte aligned)"
            )));
        }
        let tiles_across = width.div_ceil(tile_width);
        let tile_row_bytes = packed_bytes(
            u64::from(tile_width) * u64::from(channels),
            bits,
            width,
            height,
        )?;
        let stride = tile_row_bytes
            .checked_mul(tiles_across as usize)
            .ok_or(TranscodeError::DimensionsTooLarge { width, height })?;
        let tile_bytes = tile_row_bytes
            .checked_mul(tile_height as usize)
            .ok_or(TranscodeError::DimensionsTooLarge { width, height })?;
        let strip_bytes = stride
            .checked_mul(tile_height as usize)
            .ok_or(TranscodeError::DimensionsTooLarge { width, height })?;
        let tiles = Self {
            width,
            height,
            tile_height,
            tiles_across,
            tile_row_bytes,
            stride,
            tile_bytes,
            strip_bytes,
            tile: Vec::new(),
            strip: Vec::new(),
            loaded: None,
        };
        // the last tile must have a u32 number
        let last_col = tiles_across.saturating_sub(1);
        let last_row = height.div_ceil(tile_height).saturating_sub(1);
        tiles.tile_index(last_col, last_row)?;
        Ok(tiles)
    }

    /// Row-major number of the tile at `col` in tile-row `tile_row`.
    fn tile_index(&self, col: u32, tile_row: u32) -> Result<u32, TranscodeError> {
        tile_row
            .checked_mul(self.tiles_across)
            .and_then(|first| first.checked_add(col))
            .ok_or(TranscodeError::DimensionsTooLarge {
                width: self.width,
                height: self.height,
            })
    }

    /// Bytes the tile and tile-row buffers occupy once the first tile-row
    /// is loaded. Nothing is allocated before that.
    pub(crate) fn scratch_bytes(&self) -> usize {
        self.tile_bytes + self.strip_bytes
    }

    /// Forget the materialized tile-row so the next request reloads it.
    pub(crate) fn reset(&mut self) {
        self.loaded = None;
    }

    /// Scanline `row`, loading its tile-row first if needed.
    ///
    /// The slice is `tiles_across * tile_width` samples wide; columns past
    /// the image width are tile padding.
    pub(crate) fn row<S: RowSource + ?Sized>(
        &mut self,
        source: &mut S,
        row: u32,
    ) -> Result<&[u8], TranscodeError> {
        let tile_row = row / self.tile_height;
        if row % self.tile_height == 0 || self.loaded != Some(tile_row) {
            self.load(source, tile_row, row)?;
        }
        let offset = (row % self.tile_height) as usize * self.stride;
        Ok(&self.strip[offset..offset + self.stride])
    }

    fn load<S: RowSource + ?Sized>(
        &mut self,
        source: &mut S,
        tile_row: u32,
        row: u32,
    ) -> Result<(), TranscodeError> {
        self.loaded = None;
        self.tile.resize(self.tile_bytes, 0);
        self.strip.resize(self.strip_bytes, 0);
        for col in 0..self.tiles_across {
            let tile = self.tile_index(col, tile_row)?;
            source
                .read_tile(tile, &mut self.tile)
                .map_err(|e| TranscodeError::TileRead {
                    tile,
                    row,
                    source: Box::new(e),
                })?;
            let x = col as usize * self.tile_row_bytes;
            for (r, src) in self.tile.chunks_exact(self.tile_row_bytes).enumerate() {
                let dst = r * self.stride + x;
                self.strip[dst..dst + self.tile_row_bytes].copy_from_slice(src);
            }
        }
        self.loaded = Some(tile_row);
        log::trace!("loaded tile-row {tile_row} ({} tiles)", self.tiles_across);
        Ok(())
    }
}
