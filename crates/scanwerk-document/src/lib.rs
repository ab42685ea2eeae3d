// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// scanwerk-document — Image handling for the Scanwerk acquisition engine.
//
// Converts device-owned packed DIBs into owned images (`BitmapExtractor`),
// packs images back into DIBs for replayed sessions, and encodes acquired
// pages for storage (`ScannedImage`).

pub mod dib;
pub mod scanned;

pub use dib::extract::{BitmapExtractor, OwnedImage};
pub use dib::pack::pack_dib;
pub use scanned::{PageFormat, ScannedImage};
