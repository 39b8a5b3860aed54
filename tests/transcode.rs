//! End-to-end conversions through the in-memory collaborators.

use zentiff2png::*;

#[derive(Debug, thiserror::Error)]
#[error("decoder gave up")]
struct DecoderFailed;

/// Counts reads and can refuse `configure`.
struct CountingSource {
    inner: MemorySource,
    reads: u32,
    refuse_configure: bool,
}

impl CountingSource {
    fn new(inner: MemorySource) -> Self {
        Self {
            inner,
            reads: 0,
            refuse_configure: false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum CountingError {
    #[error(transparent)]
    Memory(#[from] MemorySourceError),
    #[error(transparent)]
    Refused(#[from] DecoderFailed),
}

impl RowSource for CountingSource {
    type Error = CountingError;

    fn capabilities(&self) -> SourceCapabilities {
        self.inner.capabilities()
    }

    fn configure(&mut self, request: DecoderRequest) -> Result<(), Self::Error> {
        if self.refuse_configure {
            return Err(DecoderFailed.into());
        }
        Ok(self.inner.configure(request)?)
    }

    fn read_scanline(&mut self, row: u32, plane: u16, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.reads += 1;
        Ok(self.inner.read_scanline(row, plane, buf)?)
    }

    fn read_tile(&mut self, tile: u32, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.reads += 1;
        Ok(self.inner.read_tile(tile, buf)?)
    }
}

/// Sink that fails on a given row.
struct FailingSink {
    fail_row: u32,
}

#[derive(Debug, thiserror::Error)]
#[error("disk full")]
struct DiskFull;

impl RowSink for FailingSink {
    type Error = DiskFull;

    fn begin(&mut self, _format: &DestinationFormat) -> Result<(), Self::Error> {
        Ok(())
    }

    fn write_row(&mut self, _pass: u32, row: u32, _line: &[u8]) -> Result<(), Self::Error> {
        if row == self.fail_row {
            return Err(DiskFull);
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

fn gray8(width: u32, height: u32) -> (ImageHeader, Vec<u8>) {
    let header = ImageHeader::new(width, height, 8, 1, ColorModel::MinIsBlack);
    let data = (0..width * height).map(|i| (i * 7) as u8).collect();
    (header, data)
}

/// Convert with default options and no colormap.
fn convert<S: RowSource, K: RowSink>(
    header: &ImageHeader,
    source: S,
    sink: K,
) -> Result<TranscodeReport, TranscodeError> {
    transcode(header, None, source, sink, TranscodeOptions::default())
}

fn collect(
    request: &TranscodeRequest<'_>,
    source: &mut MemorySource,
) -> (TranscodeReport, TranscodedImage) {
    let mut sink = MemorySink::new();
    let report = request.transcode(source, &mut sink).unwrap();
    (report, sink.into_image().unwrap())
}

// ── Whole-conversion behaviour ───────────────────────────────────────

#[test]
fn transcoding_twice_is_identical() {
    let (header, data) = gray8(9, 5);
    let request = TranscodeRequest::new(&header);
    let (_, first) = collect(&request, &mut MemorySource::rows(data.clone(), 9));
    let (_, second) = collect(&request, &mut MemorySource::rows(data.clone(), 9));
    assert_eq!(first, second);

    // reusing one conversion replays the image as well
    let mut source = MemorySource::rows(data, 9);
    let mut conversion = request.setup(source.capabilities()).unwrap();
    let mut a = MemorySink::new();
    let mut b = MemorySink::new();
    conversion.run(&mut source, &mut a).unwrap();
    conversion.run(&mut source, &mut b).unwrap();
    assert_eq!(a.into_image(), b.into_image());
}

#[test]
fn seven_passes_repeat_every_row() {
    let (header, data) = gray8(6, 4);
    let options = TranscodeOptions::default().with_interlace(true);
    let mut sink = MemorySink::with_passes(7);
    let report = TranscodeRequest::new(&header)
        .with_options(options)
        .transcode(MemorySource::rows(data.clone(), 6), &mut sink)
        .unwrap();
    assert_eq!(report.rows_written, 28);
    assert!(report.format.interlaced);
    assert_eq!(sink.rows_written(), 28);
    assert_eq!(sink.mismatched_rows(), 0);
    assert_eq!(sink.into_image().unwrap().pixels(), &data[..]);
}

#[test]
fn row_read_failure_names_the_row() {
    let (header, data) = gray8(4, 4);
    // only three rows stored
    let source = MemorySource::rows(data[..12].to_vec(), 4);
    let mut sink = MemorySink::new();
    let err = convert(&header, source, &mut sink).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RowRead);
    let TranscodeError::RowRead { row, plane, .. } = &err else {
        panic!("expected RowRead, got {err:?}");
    };
    assert_eq!((*row, *plane), (3, None));
    assert!(err.to_string().contains("row 3"));
    assert!(sink.format().is_some());
    assert!(!sink.is_finished());
}

#[test]
fn plane_read_failure_names_the_plane() {
    let header = ImageHeader::new(2, 1, 8, 3, ColorModel::Rgb);
    let header = header.with_planarity(Planarity::Separated);
    let source = MemorySource::planes(vec![vec![1, 2], vec![3, 4]], 2);
    let err = convert(&header, source, MemorySink::new()).unwrap_err();
    assert!(matches!(
        err,
        TranscodeError::RowRead {
            row: 0,
            plane: Some(2),
            ..
        }
    ));
}

#[test]
fn tile_read_failure_names_the_tile() {
    let header = ImageHeader::new(4, 4, 8, 1, ColorModel::MinIsBlack).with_tiles(2, 2);
    let source = MemorySource::tiles(vec![vec![0; 4]; 3]);
    let err = convert(&header, source, MemorySink::new()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RowRead);
    let TranscodeError::TileRead { tile, row, .. } = &err else {
        panic!("expected TileRead, got {err:?}");
    };
    assert_eq!((*tile, *row), (3, 2));
}

#[test]
fn setup_errors_come_before_begin() {
    let header = ImageHeader::new(4, 4, 8, 4, ColorModel::Separated);
    let mut counting = CountingSource::new(MemorySource::rows(vec![0; 64], 16));
    let mut sink = MemorySink::new();
    let err = convert(&header, &mut counting, &mut sink).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Setup);
    assert!(matches!(err, TranscodeError::UnsupportedColorModel(_)));
    assert!(sink.format().is_none());
    assert_eq!(counting.reads, 0);
}

#[test]
fn limits_reject_before_any_read() {
    let (header, data) = gray8(64, 2);
    let limits = Limits {
        max_width: Some(32),
        ..Limits::default()
    };
    let mut counting = CountingSource::new(MemorySource::rows(data, 64));
    let mut sink = MemorySink::new();
    let err = TranscodeRequest::new(&header)
        .with_limits(&limits)
        .transcode(&mut counting, &mut sink)
        .unwrap_err();
    assert!(matches!(err, TranscodeError::LimitExceeded(_)));
    assert_eq!(counting.reads, 0);
    assert!(sink.format().is_none());
}

#[test]
fn refused_decoder_request_is_a_setup_error() {
    let header = ImageHeader::new(2, 1, 8, 3, ColorModel::YCbCr)
        .with_compression(Compression::Jpeg);
    let mut counting = CountingSource::new(MemorySource::rows(vec![0; 6], 6));
    counting.refuse_configure = true;
    let mut sink = MemorySink::new();
    let err = convert(&header, &mut counting, &mut sink).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Setup);
    assert!(matches!(
        err,
        TranscodeError::DecoderSetup {
            request: DecoderRequest::YCbCrToRgb,
            ..
        }
    ));
    assert!(sink.format().is_none());
}

#[test]
fn sink_failure_is_reported() {
    let (header, data) = gray8(3, 3);
    let source = MemorySource::rows(data, 3);
    let sink = FailingSink { fail_row: 1 };
    let err = convert(&header, source, sink).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Sink);
    assert!(matches!(err, TranscodeError::Sink { row: Some(1), .. }));
}

// ── Color models ─────────────────────────────────────────────────────

#[test]
fn sixteen_bit_byte_order_does_not_leak() {
    let header = ImageHeader::new(2, 1, 16, 1, ColorModel::MinIsBlack);
    let big = SourceCapabilities {
        samples_big_endian: true,
        ..SourceCapabilities::native()
    };
    let little = SourceCapabilities {
        samples_big_endian: false,
        ..SourceCapabilities::native()
    };
    let request = TranscodeRequest::new(&header);
    let big_source = MemorySource::rows(vec![0x01, 0x02, 0xA0, 0xB0], 4);
    let little_source = MemorySource::rows(vec![0x02, 0x01, 0xB0, 0xA0], 4);
    let (_, from_big) = collect(&request, &mut big_source.with_capabilities(big));
    let (_, from_little) = collect(&request, &mut little_source.with_capabilities(little));
    assert_eq!(from_big.pixels(), &[0x01, 0x02, 0xA0, 0xB0]);
    assert_eq!(from_big, from_little);
}

#[test]
fn palette_invert_touches_entries_not_indices() {
    let header = ImageHeader::new(4, 1, 2, 1, ColorModel::Palette);
    let colormap = Colormap::new(
        vec![0, 10, 200, 255],
        vec![0, 20, 100, 255],
        vec![0, 30, 50, 255],
    )
    .unwrap();
    assert!(colormap.eight_bit_values());
    let options = TranscodeOptions::default().with_invert_polarity(true);
    let request = TranscodeRequest::new(&header)
        .with_colormap(&colormap)
        .with_options(options);
    let (report, image) = collect(&request, &mut MemorySource::rows(vec![0b00_01_10_11], 1));
    assert_eq!(report.format.bit_depth, 2);
    assert_eq!(
        report.format.palette.as_deref(),
        Some(&[[255, 255, 255], [245, 235, 225], [55, 155, 205], [0, 0, 0]][..])
    );
    assert_eq!(image.pixels(), &[0, 1, 2, 3]);
}

#[test]
fn sixteen_bit_colormap_keeps_high_byte() {
    let header = ImageHeader::new(2, 1, 1, 1, ColorModel::Palette);
    let red = vec![0x0000, 0xFFFF];
    let green = vec![0x1234, 0x8000];
    let blue = vec![0x00FF, 0x0100];
    let colormap = Colormap::new(red, green, blue).unwrap();
    let request = TranscodeRequest::new(&header).with_colormap(&colormap);
    let (report, image) = collect(&request, &mut MemorySource::rows(vec![0b0100_0000], 1));
    assert_eq!(
        report.format.palette.as_deref(),
        Some(&[[0x00, 0x12, 0x00], [0xFF, 0x80, 0x01]][..])
    );
    assert_eq!(image.pixels(), &[0, 1]);
}

#[test]
fn palette_without_colormap_fails() {
    let header = ImageHeader::new(2, 1, 8, 1, ColorModel::Palette);
    let source = MemorySource::rows(vec![0, 1], 2);
    let err = convert(&header, source, MemorySink::new()).unwrap_err();
    assert!(matches!(err, TranscodeError::MissingColormap));
}

#[test]
fn min_is_white_with_invert_cancels_out() {
    let header = ImageHeader::new(3, 1, 8, 1, ColorModel::MinIsWhite);
    let options = TranscodeOptions::default().with_invert_polarity(true);
    let request = TranscodeRequest::new(&header).with_options(options);
    let (_, image) = collect(&request, &mut MemorySource::rows(vec![0, 100, 255], 3));
    assert_eq!(image.pixels(), &[0, 100, 255]);
}

#[test]
fn ycbcr_jpeg_asks_decoder_for_rgb() {
    let header = ImageHeader::new(2, 1, 8, 3, ColorModel::YCbCr)
        .with_compression(Compression::Jpeg);
    let mut source = MemorySource::rows(vec![1, 2, 3, 4, 5, 6], 6);
    let (report, image) = collect(&TranscodeRequest::new(&header), &mut source);
    assert_eq!(source.requests(), &[DecoderRequest::YCbCrToRgb]);
    assert_eq!(report.format.color_type, ColorType::Truecolor);
    assert_eq!(image.pixels(), &[1, 2, 3, 4, 5, 6]);

    let uncompressed = ImageHeader::new(2, 1, 8, 3, ColorModel::YCbCr);
    let err = TranscodeRequest::new(&uncompressed)
        .setup(SourceCapabilities::native())
        .err()
        .unwrap();
    assert!(matches!(err, TranscodeError::UnsupportedColorModel(_)));
}

#[test]
fn logl_uses_sixteen_bits_when_decoder_can() {
    let header = ImageHeader::new(1, 1, 16, 1, ColorModel::LogL)
        .with_compression(Compression::SgiLog);
    let caps = SourceCapabilities {
        samples_big_endian: true,
        log_luminance_16bit: true,
    };
    let mut source = MemorySource::rows(vec![0xAB, 0xCD], 2).with_capabilities(caps);
    let (report, image) = collect(&TranscodeRequest::new(&header), &mut source);
    assert_eq!(
        source.requests(),
        &[DecoderRequest::LogLuminance { sixteen_bit: true }]
    );
    assert_eq!(report.format.bit_depth, 16);
    assert_eq!(image.pixels(), &[0xAB, 0xCD]);
}

#[test]
fn separated_sixteen_bit_planes() {
    let header = ImageHeader::new(2, 1, 16, 3, ColorModel::Rgb)
        .with_planarity(Planarity::Separated);
    let caps = SourceCapabilities {
        samples_big_endian: false,
        ..SourceCapabilities::native()
    };
    let planes = vec![
        vec![0x01, 0x00, 0x02, 0x00],
        vec![0x03, 0x00, 0x04, 0x00],
        vec![0x05, 0x00, 0x06, 0x00],
    ];
    let mut source = MemorySource::planes(planes, 4).with_capabilities(caps);
    let (report, image) = collect(&TranscodeRequest::new(&header), &mut source);
    assert_eq!(report.format.bit_depth, 16);
    assert_eq!(image.row(0), &[0, 1, 0, 3, 0, 5, 0, 2, 0, 4, 0, 6]);
}

// ── Faxpect ──────────────────────────────────────────────────────────

#[test]
fn faxpect_end_to_end() {
    let header = ImageHeader::new(8, 2, 1, 1, ColorModel::MinIsWhite)
        .with_resolution(204.0, 98.0, ResolutionUnit::Inch);
    let options = TranscodeOptions::default().with_faxpect(true);
    // MinIsWhite: set bits are black, so 0 -> 1 after inversion
    let data = vec![0b0000_1111, 0b1100_0011];
    let request = TranscodeRequest::new(&header).with_options(options);
    let (report, image) = collect(&request, &mut MemorySource::rows(data, 1));
    assert!(report.warnings.is_empty());
    assert_eq!(report.format.width, 4);
    assert_eq!(report.format.color_type, ColorType::Palette);
    assert_eq!(report.format.bit_depth, 2);
    let phys = report.format.physical.unwrap();
    assert_eq!(phys.unit, PhysicalUnit::Meter);
    assert_eq!(phys.x_per_unit, 4016);
    assert_eq!(image.row(0), &[2, 2, 0, 0]);
    assert_eq!(image.row(1), &[0, 2, 2, 0]);
}

#[test]
fn faxpect_on_gray8_warns_and_keeps_width() {
    let (header, data) = gray8(4, 1);
    let header = header.with_resolution(200.0, 100.0, ResolutionUnit::Centimeter);
    let options = TranscodeOptions::default().with_faxpect(true);
    let request = TranscodeRequest::new(&header).with_options(options);
    let (report, image) = collect(&request, &mut MemorySource::rows(data.clone(), 4));
    let expected = Warning::FaxpectNotBilevel {
        color_type: ColorType::Grayscale,
        bit_depth: 8,
    };
    assert_eq!(report.warnings, vec![expected]);
    assert_eq!(report.format.width, 4);
    assert_eq!(report.format.physical.unwrap().x_per_unit, 20000);
    assert_eq!(image.pixels(), &data[..]);
}

// ── Typed views ──────────────────────────────────────────────────────

#[cfg(feature = "imgref")]
#[test]
fn typed_view_of_rgba16() {
    let header = ImageHeader::new(1, 1, 16, 4, ColorModel::Rgb);
    let caps = SourceCapabilities {
        samples_big_endian: true,
        ..SourceCapabilities::native()
    };
    let data = vec![0x00, 0x01, 0x00, 0x02, 0x00, 0x03, 0xFF, 0xFF];
    let (_, image) = collect(
        &TranscodeRequest::new(&header),
        &mut MemorySource::rows(data, 8).with_capabilities(caps),
    );
    match image.to_pixels() {
        DestinationPixels::Rgba16(img) => {
            assert_eq!(img.buf()[0], rgb::Rgba::new(1, 2, 3, 0xFFFF));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[cfg(feature = "rgb")]
#[test]
fn palette_as_rgb() {
    let header = ImageHeader::new(1, 1, 1, 1, ColorModel::Palette);
    let colormap = Colormap::new(vec![0, 255], vec![0, 128], vec![0, 1]).unwrap();
    let request = TranscodeRequest::new(&header).with_colormap(&colormap);
    let (_, image) = collect(&request, &mut MemorySource::rows(vec![0x80], 1));
    let palette = image.palette_rgb().unwrap();
    assert_eq!(palette[1], rgb::Rgb::new(255, 128, 1));
}
