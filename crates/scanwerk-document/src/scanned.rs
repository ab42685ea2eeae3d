// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanned pages ready for storage.
//
// Black-and-white pages compress far better losslessly and lose legibility
// under JPEG, so they are always stored as PNG. Other pages are JPEG unless
// the scan asked for maximum quality.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use image::{DynamicImage, ImageFormat};
use scanwerk_core::error::{Result, ScanError};
use scanwerk_core::types::{ColorDepth, ScanSettings};
use tracing::{debug, instrument};

use crate::dib::extract::OwnedImage;

/// Storage format of an encoded page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageFormat {
    Png,
    Jpeg,
}

impl PageFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }

    /// Format a page is stored in given its depth and the scan settings.
    pub fn for_page(color_depth: ColorDepth, max_quality: bool) -> Self {
        if color_depth == ColorDepth::BlackAndWhite || max_quality {
            Self::Png
        } else {
            Self::Jpeg
        }
    }
}

/// An acquired page encoded for storage.
#[derive(Debug, Clone)]
pub struct ScannedImage {
    pub bytes: Vec<u8>,
    pub format: PageFormat,
    pub color_depth: ColorDepth,
    pub width: u32,
    pub height: u32,
    pub resolution_dpi: Option<u32>,
    pub scanned_at: DateTime<Utc>,
}

impl ScannedImage {
    /// Encode an acquired page according to `settings`.
    #[instrument(skip_all, fields(width = page.width(), height = page.height()))]
    pub fn encode(page: &OwnedImage, settings: &ScanSettings) -> Result<Self> {
        let format = PageFormat::for_page(page.color_depth, settings.max_quality);
        let bytes = match format {
            PageFormat::Png => {
                let image = if page.color_depth == ColorDepth::BlackAndWhite {
                    DynamicImage::ImageLuma8(page.image.to_luma8())
                } else {
                    page.image.clone()
                };
                encode_png(&image)?
            }
            PageFormat::Jpeg => encode_jpeg(&page.image, settings.jpeg_quality)?,
        };
        debug!(format = ?format, bytes = bytes.len(), "Page encoded");

        Ok(Self {
            bytes,
            format,
            color_depth: page.color_depth,
            width: page.width(),
            height: page.height(),
            resolution_dpi: page.resolution_dpi.or(Some(settings.resolution_dpi)),
            scanned_at: Utc::now(),
        })
    }

    /// Decode the stored bytes back into an image.
    pub fn decode(&self) -> Result<DynamicImage> {
        let format = match self.format {
            PageFormat::Png => ImageFormat::Png,
            PageFormat::Jpeg => ImageFormat::Jpeg,
        };
        image::load_from_memory_with_format(&self.bytes, format)
            .map_err(|err| ScanError::ImageError(format!("failed to decode page: {err}")))
    }

    /// File name for page `index` (zero-based) of a session.
    pub fn file_name(&self, index: usize) -> String {
        format!("page-{:03}.{}", index + 1, self.format.extension())
    }

    /// Write the page into `dir`, returning the path written.
    pub fn save(&self, dir: impl AsRef<Path>, index: usize) -> Result<PathBuf> {
        let path = dir.as_ref().join(self.file_name(index));
        std::fs::write(&path, &self.bytes)?;
        Ok(path)
    }
}

fn encode_png(image: &DynamicImage) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);
    image
        .write_to(&mut cursor, ImageFormat::Png)
        .map_err(|err| ScanError::ImageError(format!("PNG encoding failed: {err}")))?;
    Ok(buffer)
}

fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let rgb = image.to_rgb8();
    let encoder =
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
    rgb.write_with_encoder(encoder)
        .map_err(|err| ScanError::ImageError(format!("JPEG encoding failed: {err}")))?;
    Ok(buffer)
}
