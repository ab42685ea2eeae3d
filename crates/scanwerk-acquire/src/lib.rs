// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanwerk — TWAIN acquisition: protocol state, message interception and the
// scan session that ties them to bitmap extraction.

pub mod driver;
pub mod interceptor;
pub mod session;
pub mod state;

pub use driver::{TransferBatch, TwainDriver};
pub use interceptor::{Interception, MessageInterceptor};
pub use session::{ScanOutcome, ScanSession};
pub use state::AcquireState;

#[cfg(test)]
pub(crate) mod testing;
