// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Acquisition configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScanError};
use crate::types::ScanSettings;

/// Which close commands also terminate the window hosting the acquisition.
///
/// A `CloseRequest` comes from the source asking to end the session; a
/// `CloseAcknowledged` confirms a close the application started. Hosts differ
/// on whether either should take the acquisition window down with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosePolicy {
    pub terminate_on_close_request: bool,
    pub terminate_on_close_acknowledged: bool,
}

impl Default for ClosePolicy {
    fn default() -> Self {
        Self {
            terminate_on_close_request: true,
            terminate_on_close_acknowledged: false,
        }
    }
}

/// Persistent acquisition settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquireConfig {
    /// Settings used when the caller does not supply its own.
    pub default_settings: ScanSettings,
    /// UI termination behaviour for close commands.
    pub close_policy: ClosePolicy,
    /// Subdirectory of the data directory that exported pages go to.
    pub output_dir_name: String,
}

impl Default for AcquireConfig {
    fn default() -> Self {
        Self {
            default_settings: ScanSettings::default(),
            close_policy: ClosePolicy::default(),
            output_dir_name: "scans".into(),
        }
    }
}

impl AcquireConfig {
    /// Reject values that would make an export fail later.
    pub fn validate(&self) -> Result<()> {
        let quality = self.default_settings.jpeg_quality;
        if !(1..=100).contains(&quality) {
            return Err(ScanError::Config(format!(
                "jpeg_quality must be 1-100, got {quality}"
            )));
        }
        if self.default_settings.resolution_dpi == 0 {
            return Err(ScanError::Config("resolution_dpi must be positive".into()));
        }
        if self.output_dir_name.trim().is_empty() {
            return Err(ScanError::Config("output_dir_name is empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        AcquireConfig::default().validate().expect("valid defaults");
    }

    #[test]
    fn default_policy_only_terminates_on_request() {
        let policy = ClosePolicy::default();
        assert!(policy.terminate_on_close_request);
        assert!(!policy.terminate_on_close_acknowledged);
    }

    #[test]
    fn zero_quality_is_rejected() {
        let mut config = AcquireConfig::default();
        config.default_settings.jpeg_quality = 0;
        assert!(matches!(config.validate(), Err(ScanError::Config(_))));
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: AcquireConfig =
            serde_json::from_str(r#"{ "output_dir_name": "pages" }"#).expect("parse");
        assert_eq!(config.output_dir_name, "pages");
        assert_eq!(config.close_policy, ClosePolicy::default());
    }
}
