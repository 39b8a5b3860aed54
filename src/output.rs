use alloc::vec::Vec;

use crate::pixel::DestinationFormat;

/// A fully transcoded image collected by [`MemorySink`](crate::MemorySink).
///
/// Samples are one byte each up to 8 bits (palette indices and sub-byte
/// gray levels unpacked), two big-endian bytes at 16 bits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TranscodedImage {
    format: DestinationFormat,
    pixels: Vec<u8>,
}

impl TranscodedImage {
    pub(crate) fn new(format: DestinationFormat, pixels: Vec<u8>) -> Self {
        Self { format, pixels }
    }

    pub fn format(&self) -> &DestinationFormat {
        &self.format
    }

    pub fn width(&self) -> u32 {
        self.format.width
    }

    pub fn height(&self) -> u32 {
        self.format.height
    }

    /// All rows, back to back.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Take ownership of the row data.
    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    /// One destination scanline.
    pub fn row(&self, y: u32) -> &[u8] {
        let stride = self.format.row_bytes();
        &self.pixels[y as usize * stride..][..stride]
    }

    /// Palette entries as typed RGB pixels.
    #[cfg(feature = "rgb")]
    pub fn palette_rgb(&self) -> Option<Vec<rgb::Rgb<u8>>> {
        let palette = self.format.palette.as_ref()?;
        let pixels = palette.iter().map(|&[r, g, b]| rgb::Rgb { r, g, b });
        Some(pixels.collect())
    }

    /// Convert to typed pixels.
    ///
    /// Sub-byte gray levels and palette indices come back as raw values,
    /// not scaled to the full 8-bit range.
    #[cfg(feature = "imgref")]
    pub fn to_pixels(&self) -> DestinationPixels {
        use crate::pixel::ColorType;

        let (w, h) = (self.format.width as usize, self.format.height as usize);
        let bytes = self.pixels.as_slice();
        let words: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();

        match (self.format.color_type, self.format.bit_depth > 8) {
            (ColorType::Palette, _) => DestinationPixels::Indexed(view(bytes, 1, w, h, |c| c[0])),
            (ColorType::Grayscale, false) => {
                DestinationPixels::Gray8(view(bytes, 1, w, h, |c| rgb::Gray::new(c[0])))
            }
            (ColorType::Grayscale, true) => {
                DestinationPixels::Gray16(view(&words, 1, w, h, |c| rgb::Gray::new(c[0])))
            }
            (ColorType::GrayscaleAlpha, false) => {
                DestinationPixels::GrayAlpha8(view(bytes, 2, w, h, gray_alpha))
            }
            (ColorType::GrayscaleAlpha, true) => {
                DestinationPixels::GrayAlpha16(view(&words, 2, w, h, gray_alpha))
            }
            (ColorType::Truecolor, false) => DestinationPixels::Rgb8(view(bytes, 3, w, h, rgb3)),
            (ColorType::Truecolor, true) => DestinationPixels::Rgb16(view(&words, 3, w, h, rgb3)),
            (ColorType::TruecolorAlpha, false) => {
                DestinationPixels::Rgba8(view(bytes, 4, w, h, rgba4))
            }
            (ColorType::TruecolorAlpha, true) => {
                DestinationPixels::Rgba16(view(&words, 4, w, h, rgba4))
            }
        }
    }
}

#[cfg(feature = "imgref")]
fn view<T: Copy, P>(
    samples: &[T],
    channels: usize,
    width: usize,
    height: usize,
    pixel: impl Fn(&[T]) -> P,
) -> imgref::ImgVec<P> {
    let pixels = samples.chunks_exact(channels).map(pixel).collect();
    imgref::ImgVec::new(pixels, width, height)
}

#[cfg(feature = "imgref")]
fn gray_alpha<T: Copy>(c: &[T]) -> rgb::alt::GrayAlpha<T> {
    rgb::alt::GrayAlpha(c[0], c[1])
}

#[cfg(feature = "imgref")]
fn rgb3<T: Copy>(c: &[T]) -> rgb::Rgb<T> {
    rgb::Rgb::new(c[0], c[1], c[2])
}

#[cfg(feature = "imgref")]
fn rgba4<T: Copy>(c: &[T]) -> rgb::Rgba<T> {
    rgb::Rgba::new(c[0], c[1], c[2], c[3])
}

/// Typed view of a [`TranscodedImage`], native-endian.
#[cfg(feature = "imgref")]
#[non_exhaustive]
#[derive(Clone, Debug)]
pub enum DestinationPixels {
    Indexed(imgref::ImgVec<u8>),
    Gray8(imgref::ImgVec<rgb::Gray<u8>>),
    Gray16(imgref::ImgVec<rgb::Gray<u16>>),
    GrayAlpha8(imgref::ImgVec<rgb::alt::GrayAlpha<u8>>),
    GrayAlpha16(imgref::ImgVec<rgb::alt::GrayAlpha<u16>>),
    Rgb8(imgref::ImgVec<rgb::Rgb<u8>>),
    Rgb16(imgref::ImgVec<rgb::Rgb<u16>>),
    Rgba8(imgref::ImgVec<rgb::Rgba<u8>>),
    Rgba16(imgref::ImgVec<rgb::Rgba<u16>>),
}
