// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Writing acquired pages to disk.

use std::path::{Path, PathBuf};

use scanwerk_acquire::ScanOutcome;
use scanwerk_core::error::Result;
use scanwerk_document::ScannedImage;
use tracing::info;

/// Encode every page of `outcome` and write it under `dir`.
///
/// Pages go into a subdirectory named after the session; nothing is created
/// when there are no pages.
pub fn export_pages(outcome: &ScanOutcome, dir: &Path) -> Result<Vec<PathBuf>> {
    if outcome.images.is_empty() {
        return Ok(Vec::new());
    }
    let dir = dir.join(outcome.session.to_string());
    std::fs::create_dir_all(&dir)?;

    let mut written = Vec::with_capacity(outcome.images.len());
    for (index, page) in outcome.images.iter().enumerate() {
        let scanned = ScannedImage::encode(page, &outcome.settings)?;
        written.push(scanned.save(&dir, index)?);
    }
    info!(session = %outcome.session, pages = written.len(), dir = %dir.display(), "pages exported");
    Ok(written)
}
