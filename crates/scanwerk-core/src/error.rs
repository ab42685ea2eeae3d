// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Scanwerk.

use thiserror::Error;

/// Top-level error type for all Scanwerk operations.
#[derive(Debug, Error)]
pub enum ScanError {
    // -- Device protocol --
    /// The TWAIN source failed while acquiring or closing. Recovered by
    /// forcing the session into its closed state.
    #[error("device communication failed ({device}, state {state}): {detail}")]
    DeviceCommunication {
        device: String,
        state: String,
        detail: String,
    },

    /// An operation was invoked in a state that does not allow it. This is a
    /// programming error, never a device condition.
    #[error("protocol misuse: {0}")]
    ProtocolMisuse(String),

    /// The session ended without producing a usable result.
    #[error("acquisition failed: {0}")]
    AcquisitionFailed(String),

    // -- Image errors --
    /// A single device bitmap could not be converted. The session skips it.
    #[error("bitmap extraction failed: {0}")]
    Extraction(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    // -- Configuration / persistence --
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // -- Platform bridge --
    #[error("platform bridge error: {0}")]
    Bridge(String),

    #[error("feature not available on this platform")]
    PlatformUnavailable,
}

impl ScanError {
    /// Whether the session can carry on after this error. Only a failed
    /// extraction is scoped to a single page.
    pub fn is_per_image(&self) -> bool {
        matches!(self, Self::Extraction(_))
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ScanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_extraction_is_per_image() {
        assert!(ScanError::Extraction("truncated".into()).is_per_image());
        assert!(!ScanError::PlatformUnavailable.is_per_image());
        assert!(!ScanError::ProtocolMisuse("transfer while idle".into()).is_per_image());
    }
}
