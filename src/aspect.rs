//! Faxpect aspect correction and physical resolution records.
//!
//! Faxpect turns a 1-bit scan with 2:1 non-square pixels into a square-pixel
//! image of half the width by summing each horizontal pair into a 3-level
//! palette index.

use crate::error::Warning;
use crate::header::{Resolution, ResolutionUnit};
use crate::pixel::{ColorType, PhysicalDimensions, PhysicalUnit};

/// Palette written for faxpect output: black, mid-gray, white.
pub const FAXPECT_PALETTE: [[u8; 3]; 3] = [[0, 0, 0], [127, 127, 127], [255, 255, 255]];

/// Depth of faxpect palette indices.
pub const FAXPECT_BIT_DEPTH: u8 = 2;

/// Inclusive band of horizontal:vertical ratios faxpect accepts.
const FAXPECT_MIN_RATIO: f64 = 1.90;
const FAXPECT_MAX_RATIO: f64 = 2.10;

const METERS_PER_INCH_FACTOR: f64 = 39.37;
const CENTIMETER_FACTOR: f64 = 100.0;

/// Decide whether faxpect can run, or which warning explains why not.
///
/// The ratio is checked before the pixel format.
pub fn faxpect_applies(
    resolution: Option<&Resolution>,
    color_type: ColorType,
    bit_depth: u8,
) -> Result<(), Warning> {
    let ratio = resolution.and_then(Resolution::aspect_ratio);
    match ratio {
        Some(r) if (FAXPECT_MIN_RATIO..=FAXPECT_MAX_RATIO).contains(&r) => {}
        _ => return Err(Warning::FaxpectRatioOutOfRange { ratio }),
    }
    if color_type != ColorType::Grayscale || bit_depth != 1 {
        return Err(Warning::FaxpectNotBilevel {
            color_type,
            bit_depth,
        });
    }
    Ok(())
}

/// Collapse a line of unpacked 0/1 samples into `half_width` pair sums.
///
/// Works in place: index `i` receives `line[2i] + line[2i + 1]`. A trailing
/// odd column is dropped.
pub fn collapse_pairs(line: &mut [u8], half_width: usize) {
    for i in 0..half_width {
        line[i] = line[2 * i] + line[2 * i + 1];
    }
}

fn to_per_unit(value: f32, factor: f64) -> u32 {
    (factor * f64::from(value) + 0.5) as u32
}

/// Convert a source resolution to a destination pHYs record.
///
/// Returns `None` when either axis is zero. With `halve_x`, the horizontal
/// value is computed at half scale for faxpect output.
pub fn physical_dimensions(resolution: &Resolution, halve_x: bool) -> Option<PhysicalDimensions> {
    resolution.aspect_ratio()?;
    let (factor, unit) = match resolution.unit {
        ResolutionUnit::Inch => (METERS_PER_INCH_FACTOR, PhysicalUnit::Meter),
        ResolutionUnit::Centimeter => (CENTIMETER_FACTOR, PhysicalUnit::Meter),
        ResolutionUnit::Unspecified => (CENTIMETER_FACTOR, PhysicalUnit::Unknown),
    };
    let x_factor = if halve_x { 0.5 * factor } else { factor };
    Some(PhysicalDimensions {
        x_per_unit: to_per_unit(resolution.x, x_factor),
        y_per_unit: to_per_unit(resolution.y, factor),
        unit,
    })
}

/// Log the aspect ratio and how close it is to square or 2:1.
pub(crate) fn log_aspect(resolution: &Resolution) {
    let Some(ratio) = resolution.aspect_ratio() else {
        return;
    };
    let class = if 0.95 < ratio && ratio < 1.05 {
        "near-unity"
    } else if 1.90 < ratio && ratio < 2.10 {
        "near-2X"
    } else {
        "non-square"
    };
    log::debug!(
        "aspect ratio (hor/vert) = {ratio} ({} / {}), {class}",
        resolution.x,
        resolution.y
    );
}
