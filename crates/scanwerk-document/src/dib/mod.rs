// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Packed device-independent bitmaps: header parsing, extraction into owned
// images, and packing.

pub mod extract;
pub mod header;
pub mod pack;

pub use extract::{BitmapExtractor, OwnedImage};
pub use header::DibHeader;
