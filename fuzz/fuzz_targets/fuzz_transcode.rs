#![no_main]
use libfuzzer_sys::fuzz_target;
use zentiff2png::*;

const DEPTHS: [u8; 6] = [1, 2, 4, 8, 16, 3];

fuzz_target!(|data: &[u8]| {
    // 10 header bytes, then sample data
    if data.len() < 10 {
        return;
    }
    let (head, body) = data.split_at(10);
    let width = u32::from(head[0] % 64);
    let height = u32::from(head[1] % 64);
    let bits = DEPTHS[usize::from(head[2]) % DEPTHS.len()];
    let spp = u16::from(head[3] % 6);
    let model = ColorModel::from_photometric(u16::from(head[4] % 8));
    let flags = head[5];

    let mut header = ImageHeader::new(width, height, bits, spp, model)
        .with_resolution(f32::from(head[6]), f32::from(head[7]), ResolutionUnit::Inch);
    if flags & 1 != 0 {
        header = header.with_planarity(Planarity::Separated);
    }
    let tiled = flags & 2 != 0;
    if tiled {
        header = header.with_tiles(u32::from(head[8] % 32), u32::from(head[9] % 32));
    }
    if flags & 4 != 0 {
        header = header.with_compression(Compression::Jpeg);
    }

    let options = TranscodeOptions::default()
        .with_invert_polarity(flags & 8 != 0)
        .with_faxpect(flags & 16 != 0);
    let caps = SourceCapabilities {
        samples_big_endian: flags & 32 != 0,
        log_luminance_16bit: false,
    };

    let ramp: Vec<u16> = (0..256u16).map(|i| i * 257).collect();
    let colormap = Colormap::new(ramp.clone(), ramp.clone(), ramp).unwrap();
    let limits = Limits {
        max_memory_bytes: Some(1 << 20),
        ..Limits::default()
    };

    // Whatever the stored data looks like, the transcode must return an
    // error rather than panic.
    let source = if tiled {
        let tile_bytes = (body.len() / 4).max(1);
        MemorySource::tiles(body.chunks(tile_bytes).map(<[u8]>::to_vec).collect())
    } else if flags & 1 != 0 {
        let planes = usize::from(spp.max(1));
        let plane_len = body.len() / planes;
        let row_bytes = (plane_len / height.max(1) as usize).max(1);
        MemorySource::planes(
            (0..planes)
                .map(|p| body[p * plane_len..(p + 1) * plane_len].to_vec())
                .collect(),
            row_bytes,
        )
    } else {
        let row_bytes = (body.len() / height.max(1) as usize).max(1);
        MemorySource::rows(body.to_vec(), row_bytes)
    };

    let mut sink = MemorySink::with_passes(u32::from(flags >> 6) + 1);
    let _ = TranscodeRequest::new(&header)
        .with_colormap(&colormap)
        .with_options(options)
        .with_limits(&limits)
        .transcode(source.with_capabilities(caps), &mut sink);
});
