// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Progress notifications for long-running operations.
//
// The host's operation framework (progress dialogs, cancel buttons) lives
// outside this workspace. Acquisition only raises events into it.

/// Snapshot of an operation's progress.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationStatus {
    pub status_text: String,
    pub current_progress: u32,
    pub max_progress: u32,
}

impl OperationStatus {
    pub fn new(status_text: impl Into<String>, current_progress: u32, max_progress: u32) -> Self {
        Self {
            status_text: status_text.into(),
            current_progress,
            max_progress,
        }
    }
}

/// Receiver of operation events.
///
/// Methods take `&self`; observers that record events use interior
/// mutability. Every notification arrives on the thread driving the
/// operation.
pub trait OperationObserver {
    fn status_changed(&self, status: &OperationStatus);

    fn error(&self, message: &str);

    /// Raised exactly once, after the last `status_changed` or `error`.
    fn finished(&self);
}
