// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Packed DIB header parsing.
//
// Layout of a packed DIB as handed over by a TWAIN native transfer:
//
//   BITMAPINFOHEADER (40 bytes) or V4/V5 header (108/124 bytes)
//   [3 DWORD color masks, only for BI_BITFIELDS with a 40-byte header]
//   [RGBQUAD palette]
//   pixel rows, each padded to a DWORD boundary, bottom-up unless the
//   height is negative

use scanwerk_core::error::{Result, ScanError};

pub const BI_RGB: u32 = 0;
pub const BI_RLE8: u32 = 1;
pub const BI_RLE4: u32 = 2;
pub const BI_BITFIELDS: u32 = 3;
pub const BI_JPEG: u32 = 4;
pub const BI_PNG: u32 = 5;

/// Size of a `BITMAPINFOHEADER`.
pub const INFO_HEADER_LEN: usize = 40;

/// Largest width or height accepted from a device. Generous for A0 at
/// 1200 DPI; anything above is a corrupt header.
const MAX_DIMENSION: u32 = 1 << 16;

/// Red, green and blue bit masks for 16- and 32-bit pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelMasks {
    pub red: u32,
    pub green: u32,
    pub blue: u32,
}

impl ChannelMasks {
    const RGB555: Self = Self {
        red: 0x7C00,
        green: 0x03E0,
        blue: 0x001F,
    };
    const XRGB8888: Self = Self {
        red: 0x00FF_0000,
        green: 0x0000_FF00,
        blue: 0x0000_00FF,
    };

    /// Every channel must select a single non-empty run of bits.
    fn validate(&self) -> Result<()> {
        for (name, mask) in [("red", self.red), ("green", self.green), ("blue", self.blue)] {
            if mask == 0 {
                return Err(extraction(format!("{name} mask is empty")));
            }
            let run = mask >> mask.trailing_zeros();
            if run & run.wrapping_add(1) != 0 {
                return Err(extraction(format!(
                    "{name} mask {mask:#010x} is not contiguous"
                )));
            }
        }
        Ok(())
    }
}

/// Parsed and validated packed-DIB header.
///
/// Construction checks that every offset below lies inside the buffer, so
/// the decoders can index without further bounds bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DibHeader {
    pub header_size: usize,
    pub width: u32,
    pub height: u32,
    /// Rows are stored top row first (negative height in the header).
    pub top_down: bool,
    pub bit_count: u16,
    pub compression: u32,
    pub x_pels_per_meter: i32,
    pub y_pels_per_meter: i32,
    /// Masks for 16/32-bit pixels, `None` for palette and 24-bit images.
    pub masks: Option<ChannelMasks>,
    pub palette_offset: usize,
    pub palette_len: usize,
    pub pixel_offset: usize,
    /// Bytes per pixel row including padding.
    pub stride: usize,
}

impl DibHeader {
    /// Parse the header at the start of `bytes` and validate it against the
    /// buffer length.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < INFO_HEADER_LEN {
            return Err(extraction(format!(
                "buffer of {} bytes is too short for a bitmap header",
                bytes.len()
            )));
        }

        let header_size = read_u32(bytes, 0) as usize;
        if header_size < INFO_HEADER_LEN {
            // 12-byte BITMAPCOREHEADER is an OS/2 relic no TWAIN source sends.
            return Err(extraction(format!("unsupported header size {header_size}")));
        }
        if header_size > bytes.len() {
            return Err(extraction(format!(
                "header size {header_size} exceeds buffer of {} bytes",
                bytes.len()
            )));
        }

        let raw_width = read_i32(bytes, 4);
        let raw_height = read_i32(bytes, 8);
        let planes = read_u16(bytes, 12);
        let bit_count = read_u16(bytes, 14);
        let compression = read_u32(bytes, 16);
        let x_pels_per_meter = read_i32(bytes, 24);
        let y_pels_per_meter = read_i32(bytes, 28);
        let colors_used = read_u32(bytes, 32);

        if raw_width <= 0 || raw_height == 0 {
            return Err(extraction(format!(
                "invalid dimensions {raw_width}x{raw_height}"
            )));
        }
        let width = raw_width as u32;
        let height = raw_height.unsigned_abs();
        if width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(extraction(format!("dimensions {width}x{height} out of range")));
        }
        if planes != 1 {
            return Err(extraction(format!("expected 1 plane, got {planes}")));
        }
        if !matches!(bit_count, 1 | 4 | 8 | 16 | 24 | 32) {
            return Err(extraction(format!("unsupported bit count {bit_count}")));
        }

        let mut masks_len = 0usize;
        let masks = match (compression, bit_count) {
            (BI_RGB, 16) => Some(ChannelMasks::RGB555),
            (BI_RGB, 32) => Some(ChannelMasks::XRGB8888),
            (BI_RGB, _) => None,
            (BI_BITFIELDS, 16 | 32) => {
                // V4/V5 headers carry the masks inline; a plain info header
                // is followed by them.
                let at = if header_size >= INFO_HEADER_LEN + 12 {
                    INFO_HEADER_LEN
                } else {
                    masks_len = 12;
                    header_size
                };
                if bytes.len() < at + 12 {
                    return Err(extraction("buffer too short for color masks".into()));
                }
                let masks = ChannelMasks {
                    red: read_u32(bytes, at),
                    green: read_u32(bytes, at + 4),
                    blue: read_u32(bytes, at + 8),
                };
                masks.validate()?;
                Some(masks)
            }
            (other, bits) => {
                return Err(extraction(format!(
                    "unsupported compression {} for {bits}-bit bitmap",
                    compression_name(other)
                )));
            }
        };

        let palette_len = if bit_count <= 8 {
            let max = 1usize << bit_count;
            match colors_used as usize {
                0 => max,
                n if n <= max => n,
                n => {
                    return Err(extraction(format!(
                        "palette of {n} entries for a {bit_count}-bit bitmap"
                    )));
                }
            }
        } else {
            // Deep bitmaps may still carry an optimisation palette; it only
            // shifts the pixel data.
            colors_used as usize
        };

        let palette_offset = header_size + masks_len;
        let pixel_offset = (palette_len as u64)
            .checked_mul(4)
            .and_then(|p| p.checked_add(palette_offset as u64))
            .ok_or_else(|| extraction("palette size overflow".into()))?;

        let stride = (u64::from(width) * u64::from(bit_count)).div_ceil(32) * 4;
        let required = stride
            .checked_mul(u64::from(height))
            .and_then(|pixels| pixels.checked_add(pixel_offset))
            .ok_or_else(|| extraction("pixel data size overflow".into()))?;
        if required > bytes.len() as u64 {
            return Err(extraction(format!(
                "bitmap needs {required} bytes but buffer holds {}",
                bytes.len()
            )));
        }

        Ok(Self {
            header_size,
            width,
            height,
            top_down: raw_height < 0,
            bit_count,
            compression,
            x_pels_per_meter,
            y_pels_per_meter,
            masks,
            palette_offset,
            palette_len,
            pixel_offset: pixel_offset as usize,
            stride: stride as usize,
        })
    }

    /// Horizontal resolution in DPI, if the device filled it in.
    pub fn resolution_dpi(&self) -> Option<u32> {
        (self.x_pels_per_meter > 0)
            .then(|| (f64::from(self.x_pels_per_meter) * 0.0254).round() as u32)
    }

    /// Pixel bytes of image row `y`, where row 0 is the top of the image.
    pub fn row<'a>(&self, bytes: &'a [u8], y: u32) -> &'a [u8] {
        let stored = if self.top_down { y } else { self.height - 1 - y };
        let start = self.pixel_offset + stored as usize * self.stride;
        &bytes[start..start + self.stride]
    }
}

fn compression_name(compression: u32) -> String {
    match compression {
        BI_RLE8 => "BI_RLE8".into(),
        BI_RLE4 => "BI_RLE4".into(),
        BI_BITFIELDS => "BI_BITFIELDS".into(),
        BI_JPEG => "BI_JPEG".into(),
        BI_PNG => "BI_PNG".into(),
        other => format!("{other}"),
    }
}

fn extraction(detail: String) -> ScanError {
    ScanError::Extraction(detail)
}

pub(crate) fn read_u16(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

pub(crate) fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

fn read_i32(bytes: &[u8], at: usize) -> i32 {
    read_u32(bytes, at) as i32
}
