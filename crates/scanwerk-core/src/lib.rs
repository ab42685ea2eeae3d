// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanwerk — Core types and error definitions shared across all crates.

pub mod config;
pub mod error;
pub mod handle;
pub mod human_errors;
pub mod operation;
pub mod types;

pub use config::AcquireConfig;
pub use error::ScanError;
pub use handle::{DibMemory, InMemoryDib, RawImageHandle};
pub use types::*;
