// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bitmap extractor. Turns a device-owned packed DIB into an owned image.
//
// The extractor consumes the `RawImageHandle`: pixels are copied into an
// `image::DynamicImage` and the device memory is released before `extract`
// returns, whether or not decoding succeeded.

use image::{DynamicImage, GrayImage, RgbImage};
use scanwerk_core::error::{Result, ScanError};
use scanwerk_core::handle::RawImageHandle;
use scanwerk_core::types::ColorDepth;
use tracing::{debug, instrument};

use super::header::{ChannelMasks, DibHeader, read_u16, read_u32};

/// An acquired page, owned by the application.
#[derive(Debug, Clone)]
pub struct OwnedImage {
    pub image: DynamicImage,
    pub color_depth: ColorDepth,
    /// Bit count stored in the DIB header.
    pub source_bit_count: u16,
    /// Resolution from the DIB header, when the device recorded one.
    pub resolution_dpi: Option<u32>,
}

impl OwnedImage {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Converts raw device bitmaps into [`OwnedImage`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct BitmapExtractor;

impl BitmapExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Copy the bitmap behind `handle` into an owned image.
    ///
    /// `declared_bit_depth` is the depth the device reported for the page;
    /// when it reported none the header's bit count is used. The page is
    /// black-and-white exactly when that depth is 1.
    #[instrument(skip(self, handle))]
    pub fn extract(
        &self,
        handle: RawImageHandle,
        declared_bit_depth: Option<u16>,
    ) -> Result<OwnedImage> {
        let mut memory = handle
            .into_memory()
            .ok_or_else(|| ScanError::Extraction("image handle is null".into()))?;

        let bytes = memory.bytes().map_err(|err| {
            ScanError::Extraction(format!("device memory could not be mapped: {err}"))
        })?;

        let header = DibHeader::parse(bytes)?;
        let image = decode(bytes, &header)?;
        let bit_depth = declared_bit_depth.unwrap_or(header.bit_count);

        debug!(
            width = header.width,
            height = header.height,
            bit_count = header.bit_count,
            bit_depth,
            "Bitmap extracted"
        );

        Ok(OwnedImage {
            image,
            color_depth: ColorDepth::from_bit_count(bit_depth),
            source_bit_count: header.bit_count,
            resolution_dpi: header.resolution_dpi(),
        })
    }
}

/// Decode the pixel rows described by `header`.
fn decode(bytes: &[u8], header: &DibHeader) -> Result<DynamicImage> {
    match header.bit_count {
        1 | 4 | 8 => decode_indexed(bytes, header),
        16 | 32 => {
            let masks = header
                .masks
                .ok_or_else(|| ScanError::Extraction("missing color masks".into()))?;
            decode_masked(bytes, header, masks)
        }
        24 => decode_bgr(bytes, header),
        other => Err(ScanError::Extraction(format!("unsupported bit count {other}"))),
    }
}

/// Palette images. An all-gray palette (every B/W scan) decodes to luma so
/// later encoding stays single-channel.
fn decode_indexed(bytes: &[u8], header: &DibHeader) -> Result<DynamicImage> {
    let palette: Vec<[u8; 3]> = (0..header.palette_len)
        .map(|i| {
            let at = header.palette_offset + i * 4;
            // RGBQUAD is stored blue, green, red, reserved.
            [bytes[at + 2], bytes[at + 1], bytes[at]]
        })
        .collect();
    let is_gray = palette.iter().all(|[r, g, b]| r == g && g == b);

    let bits = header.bit_count as usize;
    let per_byte = 8 / bits;
    let mask = ((1u16 << bits) - 1) as u8;
    let index_at = |row: &[u8], x: usize| -> usize {
        let byte = row[x / per_byte];
        let shift = 8 - bits * (x % per_byte + 1);
        ((byte >> shift) & mask) as usize
    };
    // Indices beyond the palette come from sloppy drivers; render them black.
    let color = |index: usize| palette.get(index).copied().unwrap_or([0, 0, 0]);

    let (width, height) = (header.width, header.height);
    if is_gray {
        let mut out = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            let row = header.row(bytes, y);
            out.extend((0..width as usize).map(|x| color(index_at(row, x))[0]));
        }
        gray_image(width, height, out)
    } else {
        let mut out = Vec::with_capacity(width as usize * height as usize * 3);
        for y in 0..height {
            let row = header.row(bytes, y);
            for x in 0..width as usize {
                out.extend_from_slice(&color(index_at(row, x)));
            }
        }
        rgb_image(width, height, out)
    }
}

fn decode_bgr(bytes: &[u8], header: &DibHeader) -> Result<DynamicImage> {
    let (width, height) = (header.width, header.height);
    let mut out = Vec::with_capacity(width as usize * height as usize * 3);
    for y in 0..height {
        let row = header.row(bytes, y);
        for px in row[..width as usize * 3].chunks_exact(3) {
            out.extend_from_slice(&[px[2], px[1], px[0]]);
        }
    }
    rgb_image(width, height, out)
}

/// 16- and 32-bit pixels. Alpha is dropped: scanners never set it and the
/// reserved byte is often garbage.
fn decode_masked(bytes: &[u8], header: &DibHeader, masks: ChannelMasks) -> Result<DynamicImage> {
    let (width, height) = (header.width, header.height);
    let bytes_per_pixel = header.bit_count as usize / 8;
    let mut out = Vec::with_capacity(width as usize * height as usize * 3);
    for y in 0..height {
        let row = header.row(bytes, y);
        for x in 0..width as usize {
            let at = x * bytes_per_pixel;
            let px = if bytes_per_pixel == 2 {
                u32::from(read_u16(row, at))
            } else {
                read_u32(row, at)
            };
            out.extend_from_slice(&[
                scale_channel(px, masks.red),
                scale_channel(px, masks.green),
                scale_channel(px, masks.blue),
            ]);
        }
    }
    rgb_image(width, height, out)
}

/// Pull the bits selected by `mask` out of `px` and scale them to 0..=255.
fn scale_channel(px: u32, mask: u32) -> u8 {
    if mask == 0 {
        return 0;
    }
    let shift = mask.trailing_zeros();
    let width = (mask >> shift).count_ones();
    let value = u64::from((px & mask) >> shift);
    let scaled = if width >= 8 {
        value >> (width - 8)
    } else {
        let max = (1u64 << width) - 1;
        (value * 255 + max / 2) / max
    };
    u8::try_from(scaled).unwrap_or(u8::MAX)
}

fn gray_image(width: u32, height: u32, data: Vec<u8>) -> Result<DynamicImage> {
    GrayImage::from_raw(width, height, data)
        .map(DynamicImage::ImageLuma8)
        .ok_or_else(|| ScanError::Extraction("decoded buffer has wrong size".into()))
}

fn rgb_image(width: u32, height: u32, data: Vec<u8>) -> Result<DynamicImage> {
    RgbImage::from_raw(width, height, data)
        .map(DynamicImage::ImageRgb8)
        .ok_or_else(|| ScanError::Extraction("decoded buffer has wrong size".into()))
}
