use alloc::vec::Vec;

use crate::error::TranscodeError;

/// Source palette: three parallel tables of 16-bit entries.
///
/// Some writers store 8-bit values in the 16-bit slots. [`Colormap::eight_bit_values`]
/// detects that, and palette construction picks the right byte either way.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Colormap {
    red: Vec<u16>,
    green: Vec<u16>,
    blue: Vec<u16>,
}

impl Colormap {
    /// Returns `InvalidHeader` if the tables differ in length.
    pub fn new(red: Vec<u16>, green: Vec<u16>, blue: Vec<u16>) -> Result<Self, TranscodeError> {
        if red.len() != green.len() || red.len() != blue.len() {
            return Err(TranscodeError::InvalidHeader(alloc::format!(
                "colormap tables differ in length ({}, {}, {})",
                red.len(),
                green.len(),
                blue.len()
            )));
        }
        Ok(Self { red, green, blue })
    }

    pub fn len(&self) -> usize {
        self.red.len()
    }

    pub fn is_empty(&self) -> bool {
        self.red.is_empty()
    }

    /// True iff every entry fits in 8 bits.
    pub fn eight_bit_values(&self) -> bool {
        self.eight_bit_prefix(self.len())
    }

    fn eight_bit_prefix(&self, colors: usize) -> bool {
        self.red[..colors]
            .iter()
            .chain(&self.green[..colors])
            .chain(&self.blue[..colors])
            .all(|&v| v <= 0xFF)
    }

    /// Build the 8-bit destination palette from the first `colors` entries.
    ///
    /// With `invert`, every channel of every entry becomes `255 - value`; the
    /// index stream itself is left alone.
    pub(crate) fn to_palette(
        &self,
        colors: usize,
        invert: bool,
    ) -> Result<Vec<[u8; 3]>, TranscodeError> {
        if self.len() < colors {
            return Err(TranscodeError::InvalidHeader(alloc::format!(
                "colormap has {} entries, image needs {colors}",
                self.len()
            )));
        }
        let eight_bit = self.eight_bit_prefix(colors);
        if eight_bit {
            log::info!("assuming 8-bit palette values");
        }
        let narrow = |v: u16| -> u8 {
            let b = if eight_bit { v as u8 } else { (v >> 8) as u8 };
            if invert { !b } else { b }
        };
        let entries = self.red.iter().zip(&self.green).zip(&self.blue);
        let palette = entries
            .take(colors)
            .map(|((&r, &g), &b)| [narrow(r), narrow(g), narrow(b)])
            .collect();
        Ok(palette)
    }
}
