//! Row transcoder: setup, per-row sample conversion, and emission.

use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::aspect::{self, FAXPECT_BIT_DEPTH, FAXPECT_PALETTE};
use crate::colormap::Colormap;
use crate::error::{TranscodeError, Warning};
use crate::header::{ExtraSamples, ImageHeader, Planarity, StorageLayout, packed_bytes};
use crate::limits::{Limits, ScratchBuffers};
use crate::pixel::{ColorType, DestinationFormat};
use crate::planes::PlaneReconstructor;
use crate::profile::{ResolvedProfile, Upsampling, resolve};
use crate::sample::{BitCursor, unit_mask};
use crate::sink::RowSink;
use crate::source::{RowSource, SourceCapabilities};
use crate::tiles::TileReconstructor;

/// User-facing switches of one conversion.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TranscodeOptions {
    /// Flip black and white (or every color channel).
    pub invert_polarity: bool,
    /// Halve the width of 2:1 bi-level scans into a 3-level palette.
    pub faxpect: bool,
    pub upsampling: Upsampling,
    /// Declared on the destination format; passes come from the sink.
    pub interlace: bool,
}

impl TranscodeOptions {
    pub fn with_invert_polarity(mut self, invert: bool) -> Self {
        self.invert_polarity = invert;
        self
    }

    pub fn with_faxpect(mut self, faxpect: bool) -> Self {
        self.faxpect = faxpect;
        self
    }

    pub fn with_upsampling(mut self, upsampling: Upsampling) -> Self {
        self.upsampling = upsampling;
        self
    }

    pub fn with_interlace(mut self, interlace: bool) -> Self {
        self.interlace = interlace;
        self
    }
}

/// Outcome of a finished conversion.
#[derive(Clone, Debug, PartialEq)]
pub struct TranscodeReport {
    /// What the sink was told in `begin`.
    pub format: DestinationFormat,
    /// Non-fatal conditions, in the order they were found.
    pub warnings: Vec<Warning>,
    /// Rows written across all passes.
    pub rows_written: u64,
}

/// Builder for a single conversion.
///
/// ```
/// use zentiff2png::{ColorModel, ImageHeader, MemorySink, MemorySource, TranscodeRequest};
///
/// let header = ImageHeader::new(4, 1, 8, 1, ColorModel::MinIsBlack);
/// let mut source = MemorySource::rows(vec![0, 64, 128, 255], 4);
/// let mut sink = MemorySink::new();
/// TranscodeRequest::new(&header).transcode(&mut source, &mut sink)?;
/// assert_eq!(sink.into_image().unwrap().pixels(), &[0, 64, 128, 255]);
/// # Ok::<(), zentiff2png::TranscodeError>(())
/// ```
#[derive(Clone, Debug)]
pub struct TranscodeRequest<'a> {
    header: &'a ImageHeader,
    colormap: Option<&'a Colormap>,
    options: TranscodeOptions,
    limits: Option<&'a Limits>,
}

impl<'a> TranscodeRequest<'a> {
    pub fn new(header: &'a ImageHeader) -> Self {
        Self {
            header,
            colormap: None,
            options: TranscodeOptions::default(),
            limits: None,
        }
    }

    /// Required when the color model is [`Palette`](crate::ColorModel::Palette).
    pub fn with_colormap(mut self, colormap: &'a Colormap) -> Self {
        self.colormap = Some(colormap);
        self
    }

    pub fn with_options(mut self, options: TranscodeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_limits(mut self, limits: &'a Limits) -> Self {
        self.limits = Some(limits);
        self
    }

    /// Validate the header and derive everything the row loop needs.
    ///
    /// No collaborator is touched; every error here is a setup error.
    pub fn setup(&self, caps: SourceCapabilities) -> Result<Conversion, TranscodeError> {
        Conversion::new(self.header, self.colormap, self.options, self.limits, caps)
    }

    /// Set up and run the conversion against `source` and `sink`.
    pub fn transcode<S: RowSource, K: RowSink>(
        &self,
        mut source: S,
        sink: K,
    ) -> Result<TranscodeReport, TranscodeError> {
        let mut conversion = self.setup(source.capabilities())?;
        conversion.run(&mut source, sink)
    }
}

/// Convert one image with default limits.
pub fn transcode<S: RowSource, K: RowSink>(
    header: &ImageHeader,
    colormap: Option<&Colormap>,
    source: S,
    sink: K,
    options: TranscodeOptions,
) -> Result<TranscodeReport, TranscodeError> {
    let mut request = TranscodeRequest::new(header).with_options(options);
    if let Some(colormap) = colormap {
        request = request.with_colormap(colormap);
    }
    request.transcode(source, sink)
}

/// How source scanlines are assembled.
enum Assembly {
    Strips,
    Planes(PlaneReconstructor),
    Tiles(TileReconstructor),
}

/// Where source scanlines come from.
struct RowInput {
    assembly: Assembly,
    /// Packed source scanline; unused for tiles.
    line: Vec<u8>,
    line_bytes: usize,
}

impl RowInput {
    fn new(header: &ImageHeader, profile: &ResolvedProfile) -> Result<Self, TranscodeError> {
        let (width, height) = (header.width, header.height);
        let bits = profile.source_bits;
        let samples = u64::from(width) * u64::from(profile.channels);
        let separated = header.planarity == Planarity::Separated && profile.channels > 1;
        match header.layout {
            StorageLayout::Tiles {
                tile_width,
                tile_height,
            } => {
                let tiles = TileReconstructor::new(
                    width,
                    height,
                    tile_width,
                    tile_height,
                    profile.channels,
                    bits,
                )?;
                Ok(Self {
                    assembly: Assembly::Tiles(tiles),
                    line: Vec::new(),
                    line_bytes: 0,
                })
            }
            StorageLayout::Strips if separated => {
                let plane_bytes = packed_bytes(u64::from(width), bits, width, height)?;
                let planes = PlaneReconstructor::new(plane_bytes, width, bits, profile.channels);
                Ok(Self {
                    assembly: Assembly::Planes(planes),
                    line: Vec::new(),
                    line_bytes: packed_bytes(samples, bits, width, height)?,
                })
            }
            StorageLayout::Strips => Ok(Self {
                assembly: Assembly::Strips,
                line: Vec::new(),
                line_bytes: packed_bytes(samples, bits, width, height)?,
            }),
        }
    }

    fn scratch(&self, destination_line: usize) -> ScratchBuffers {
        let mut scratch = ScratchBuffers {
            source_line: self.line_bytes,
            destination_line,
            ..ScratchBuffers::default()
        };
        match &self.assembly {
            Assembly::Strips => {}
            Assembly::Planes(planes) => scratch.plane_line = planes.scratch_bytes(),
            Assembly::Tiles(tiles) => scratch.tile_row = tiles.scratch_bytes(),
        }
        scratch
    }

    /// Allocate buffers and forget any cached tile-row.
    fn prepare(&mut self) {
        match &mut self.assembly {
            Assembly::Tiles(tiles) => tiles.reset(),
            _ => self.line.resize(self.line_bytes, 0),
        }
    }

    fn fetch<S: RowSource + ?Sized>(
        &mut self,
        source: &mut S,
        row: u32,
    ) -> Result<&[u8], TranscodeError> {
        match &mut self.assembly {
            Assembly::Strips => {
                source
                    .read_scanline(row, 0, &mut self.line)
                    .map_err(|e| TranscodeError::RowRead {
                        row,
                        plane: None,
                        source: Box::new(e),
                    })?;
                Ok(self.line.as_slice())
            }
            Assembly::Planes(planes) => {
                planes.read_row(source, row, &mut self.line)?;
                Ok(self.line.as_slice())
            }
            Assembly::Tiles(tiles) => tiles.row(source, row),
        }
    }
}

/// State owned by one conversion: resolved profile, destination
/// declaration, and every scratch buffer.
///
/// Independent conversions share nothing and may run on separate threads.
/// A conversion can be [`run`](Self::run) more than once; each run replays
/// the whole image.
pub struct Conversion {
    profile: ResolvedProfile,
    format: DestinationFormat,
    warnings: Vec<Warning>,
    width: u32,
    height: u32,
    samples_big_endian: bool,
    faxpect: bool,
    input: RowInput,
    scratch: ScratchBuffers,
    line: Vec<u8>,
    line_bytes: usize,
}

impl Conversion {
    fn new(
        header: &ImageHeader,
        colormap: Option<&Colormap>,
        options: TranscodeOptions,
        limits: Option<&Limits>,
        caps: SourceCapabilities,
    ) -> Result<Self, TranscodeError> {
        header.validate()?;
        let (width, height) = (header.width, header.height);
        if let Some(limits) = limits {
            limits.check(width, height)?;
        }

        let profile = resolve(header, &caps, &options)?;
        log::debug!(
            "{width}x{height}, {} bits/sample, {} samples/pixel -> {:?} at {} bits",
            header.bits_per_sample,
            header.samples_per_pixel,
            profile.color_type,
            profile.bit_depth
        );

        let mut warnings = Vec::new();
        let mut palette = None;
        if profile.palette_index {
            let colormap = colormap.ok_or(TranscodeError::MissingColormap)?;
            palette = Some(colormap.to_palette(profile.color_count, options.invert_polarity)?);
        }
        if header.extra_samples == Some(ExtraSamples::AssociatedAlpha)
            && profile.color_type.has_alpha()
        {
            warnings.push(Warning::AssociatedAlpha);
        }

        if let Some(resolution) = &header.resolution {
            aspect::log_aspect(resolution);
        }
        let mut faxpect = false;
        if options.faxpect {
            match aspect::faxpect_applies(
                header.resolution.as_ref(),
                profile.color_type,
                profile.bit_depth,
            ) {
                Ok(()) if width < 2 => warnings.push(Warning::FaxpectTooNarrow { width }),
                Ok(()) => faxpect = true,
                Err(warning) => warnings.push(warning),
            }
        }
        for warning in &warnings {
            log::warn!("{warning}");
        }

        let physical = header
            .resolution
            .as_ref()
            .and_then(|r| aspect::physical_dimensions(r, faxpect));
        let format = if faxpect {
            log::debug!("faxpect: new width {}, 2-bit palette", width / 2);
            DestinationFormat {
                width: width / 2,
                height,
                bit_depth: FAXPECT_BIT_DEPTH,
                color_type: ColorType::Palette,
                palette: Some(FAXPECT_PALETTE.to_vec()),
                physical,
                interlaced: options.interlace,
            }
        } else {
            DestinationFormat {
                width,
                height,
                bit_depth: profile.bit_depth,
                color_type: profile.color_type,
                palette,
                physical,
                interlaced: options.interlace,
            }
        };

        let input = RowInput::new(header, &profile)?;
        let line_bytes = (width as usize)
            .checked_mul(usize::from(profile.dest_channels()))
            .and_then(|n| n.checked_mul(if profile.bit_depth > 8 { 2 } else { 1 }))
            .ok_or(TranscodeError::DimensionsTooLarge { width, height })?;
        let scratch = input.scratch(line_bytes);
        if let Some(limits) = limits {
            limits.check_scratch(&scratch)?;
        }

        Ok(Self {
            profile,
            format,
            warnings,
            width,
            height,
            samples_big_endian: caps.samples_big_endian,
            faxpect,
            input,
            scratch,
            line: Vec::new(),
            line_bytes,
        })
    }

    pub fn profile(&self) -> &ResolvedProfile {
        &self.profile
    }

    /// The declaration handed to [`RowSink::begin`].
    pub fn format(&self) -> &DestinationFormat {
        &self.format
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Working memory this conversion holds while it runs.
    pub fn scratch(&self) -> ScratchBuffers {
        self.scratch
    }

    /// Emit every row of every pass the sink asks for.
    pub fn run<S: RowSource + ?Sized, K: RowSink>(
        &mut self,
        source: &mut S,
        mut sink: K,
    ) -> Result<TranscodeReport, TranscodeError> {
        if let Some(request) = self.profile.decoder_request {
            source
                .configure(request)
                .map_err(|e| TranscodeError::DecoderSetup {
                    request,
                    source: Box::new(e),
                })?;
        }
        self.input.prepare();
        self.line.resize(self.line_bytes, 0);

        sink.begin(&self.format).map_err(sink_error(None))?;
        let passes = sink.pass_count();
        let out_bytes = self.format.row_bytes();
        let mut rows_written = 0u64;

        for pass in 0..passes {
            // every pass re-reads from row 0
            self.input.prepare();
            for row in 0..self.height {
                let src = self.input.fetch(source, row)?;
                encode_row(
                    &self.profile,
                    self.width,
                    self.samples_big_endian,
                    src,
                    &mut self.line,
                );
                if self.faxpect {
                    aspect::collapse_pairs(&mut self.line, self.format.width as usize);
                }
                let line = &self.line[..out_bytes];
                sink.write_row(pass, row, line)
                    .map_err(sink_error(Some(row)))?;
                rows_written += 1;
            }
        }

        sink.finish().map_err(sink_error(None))?;
        log::debug!("wrote {rows_written} rows in {passes} pass(es)");

        Ok(TranscodeReport {
            format: self.format.clone(),
            warnings: self.warnings.clone(),
            rows_written,
        })
    }
}

fn sink_error<E>(row: Option<u32>) -> impl FnOnce(E) -> TranscodeError
where
    E: core::error::Error + Send + Sync + 'static,
{
    move |e| TranscodeError::Sink {
        row,
        source: Box::new(e),
    }
}

/// Convert one packed source scanline into an unpacked destination line.
///
/// Channels past the destination's channel count are read and dropped.
/// Wide samples are reassembled into big-endian byte pairs.
fn encode_row(
    profile: &ResolvedProfile,
    width: u32,
    samples_big_endian: bool,
    src: &[u8],
    dst: &mut [u8],
) {
    dst.fill(0);
    let bits = profile.source_bits;
    let mask = unit_mask(bits);
    let emitted = profile.dest_channels();
    let mut read = BitCursor::new();
    let mut write = BitCursor::new();

    for _ in 0..width {
        for ch in 0..profile.channels {
            let invert = profile.invert && ch < profile.color_channels;
            let emit = ch < emitted;
            if bits > 8 {
                let first = read.read(src, bits);
                let second = read.read(src, bits);
                let (hi, lo) = if samples_big_endian {
                    (first, second)
                } else {
                    (second, first)
                };
                let (hi, lo) = if invert { (!hi, !lo) } else { (hi, lo) };
                if emit {
                    write.write(dst, 8, hi);
                    write.write(dst, 8, lo);
                }
            } else {
                let mut sample = read.read(src, bits);
                if invert {
                    sample = !sample & mask;
                }
                if emit {
                    write.write(dst, 8, sample * profile.upsample);
                }
            }
        }
    }
}
