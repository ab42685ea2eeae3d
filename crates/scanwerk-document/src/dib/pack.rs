// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pack an image into the packed-DIB layout a TWAIN native transfer delivers.
// Used to synthesise device pages for replayed sessions.

use image::DynamicImage;
use scanwerk_core::error::{Result, ScanError};

use super::header::{BI_RGB, INFO_HEADER_LEN};

/// Luma at or above this becomes white in a 1-bit page.
const MONO_THRESHOLD: u8 = 128;

/// Encode `image` as a bottom-up packed DIB with a `BITMAPINFOHEADER`.
///
/// Supported bit counts: 1 (black/white palette), 8 (256-step gray palette)
/// and 24 (BGR).
pub fn pack_dib(image: &DynamicImage, bit_count: u16, resolution_dpi: u32) -> Result<Vec<u8>> {
    let (width, height) = (image.width(), image.height());
    if width == 0 || height == 0 {
        return Err(ScanError::ImageError("cannot pack an empty image".into()));
    }

    let palette: Vec<[u8; 4]> = match bit_count {
        1 => vec![[0, 0, 0, 0], [255, 255, 255, 0]],
        8 => (0..=255u8).map(|v| [v, v, v, 0]).collect(),
        24 => Vec::new(),
        other => {
            return Err(ScanError::ImageError(format!(
                "packing {other}-bit bitmaps is not supported"
            )));
        }
    };

    let stride = (width as usize * bit_count as usize).div_ceil(32) * 4;
    let pixels_len = stride * height as usize;
    let too_large = || ScanError::ImageError(format!("{width}x{height} is too large for a DIB"));
    let raw_width = i32::try_from(width).map_err(|_| too_large())?;
    let raw_height = i32::try_from(height).map_err(|_| too_large())?;
    let image_size = u32::try_from(pixels_len).map_err(|_| too_large())?;
    let pels_per_meter = (f64::from(resolution_dpi) / 0.0254).round() as i32;

    let mut out = Vec::with_capacity(INFO_HEADER_LEN + palette.len() * 4 + pixels_len);
    out.extend_from_slice(&(INFO_HEADER_LEN as u32).to_le_bytes());
    out.extend_from_slice(&raw_width.to_le_bytes());
    out.extend_from_slice(&raw_height.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&bit_count.to_le_bytes());
    out.extend_from_slice(&BI_RGB.to_le_bytes());
    out.extend_from_slice(&image_size.to_le_bytes());
    out.extend_from_slice(&pels_per_meter.to_le_bytes());
    out.extend_from_slice(&pels_per_meter.to_le_bytes());
    out.extend_from_slice(&(palette.len() as u32).to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    for entry in &palette {
        out.extend_from_slice(entry);
    }

    // Bottom-up: the last image row is stored first.
    match bit_count {
        1 => {
            let luma = image.to_luma8();
            for y in (0..height).rev() {
                let mut row = vec![0u8; stride];
                for x in 0..width {
                    if luma.get_pixel(x, y).0[0] >= MONO_THRESHOLD {
                        row[x as usize / 8] |= 0x80 >> (x % 8);
                    }
                }
                out.extend_from_slice(&row);
            }
        }
        8 => {
            let luma = image.to_luma8();
            for y in (0..height).rev() {
                let mut row = vec![0u8; stride];
                for x in 0..width {
                    row[x as usize] = luma.get_pixel(x, y).0[0];
                }
                out.extend_from_slice(&row);
            }
        }
        _ => {
            let rgb = image.to_rgb8();
            for y in (0..height).rev() {
                let mut row = vec![0u8; stride];
                for x in 0..width {
                    let [r, g, b] = rgb.get_pixel(x, y).0;
                    let at = x as usize * 3;
                    row[at..at + 3].copy_from_slice(&[b, g, r]);
                }
                out.extend_from_slice(&row);
            }
        }
    }

    Ok(out)
}
