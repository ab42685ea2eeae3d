// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for the people standing at the scanner.
//
// Every technical error is mapped to plain English with a clear suggestion.
// Severity drives how the host presents it.

use crate::error::ScanError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Cable wobble, busy driver; trying again usually works.
    Transient,
    /// User must do something (power on, load paper, pick another device).
    ActionRequired,
    /// Cannot be fixed by retrying: unsupported format, missing platform.
    Permanent,
    /// A bug in Scanwerk rather than anything the user did.
    Internal,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether scanning again has a reasonable chance of working.
    pub retriable: bool,
    pub severity: Severity,
}

/// Convert a `ScanError` into a `HumanError`.
pub fn humanize_error(err: &ScanError) -> HumanError {
    match err {
        ScanError::DeviceCommunication { device, detail, .. } => {
            humanize_device_error(device, detail)
        }

        ScanError::ProtocolMisuse(detail) => HumanError {
            message: "Scanwerk got confused talking to the scanner.".into(),
            suggestion: format!("Close the scan window and start again. Please report this. ({detail})"),
            retriable: true,
            severity: Severity::Internal,
        },

        ScanError::AcquisitionFailed(_) => HumanError {
            message: "The scan didn't finish.".into(),
            suggestion: "Check the scanner is switched on and connected, then scan again.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        ScanError::Extraction(_) => HumanError {
            message: "One page couldn't be read from the scanner.".into(),
            suggestion: "The other pages were kept. Scan the missing page again.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        ScanError::ImageError(detail) => HumanError {
            message: "A scanned page couldn't be saved.".into(),
            suggestion: format!("Check there is free disk space and try again. ({detail})"),
            retriable: true,
            severity: Severity::Transient,
        },

        ScanError::Config(detail) => HumanError {
            message: "The scan settings aren't valid.".into(),
            suggestion: format!("Fix the setting and try again: {detail}"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        ScanError::Io(io_err) => match io_err.kind() {
            std::io::ErrorKind::PermissionDenied => HumanError {
                message: "Scanwerk isn't allowed to save there.".into(),
                suggestion: "Choose a different output folder.".into(),
                retriable: false,
                severity: Severity::ActionRequired,
            },
            _ => HumanError {
                message: "A file couldn't be read or written.".into(),
                suggestion: format!("Try again. ({io_err})"),
                retriable: true,
                severity: Severity::Transient,
            },
        },

        ScanError::Serialization(_) => HumanError {
            message: "A saved settings file is damaged.".into(),
            suggestion: "Delete the settings file; Scanwerk will recreate it with defaults.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        ScanError::Bridge(detail) => HumanError {
            message: "The scanner driver reported a problem.".into(),
            suggestion: format!("Reinstall or update the scanner's TWAIN driver. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        ScanError::PlatformUnavailable => HumanError {
            message: "TWAIN scanning isn't available on this computer.".into(),
            suggestion: "TWAIN needs a Windows scanner driver. Use a replay script to try Scanwerk without one.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },
    }
}

/// Device failures carry whatever text the driver gave us; pick out the
/// handful of conditions a user can act on.
fn humanize_device_error(device: &str, detail: &str) -> HumanError {
    let lower = detail.to_ascii_lowercase();

    if lower.contains("not available on this platform") {
        humanize_error(&ScanError::PlatformUnavailable)
    } else if lower.contains("not found") || lower.contains("no source") || lower.contains("disconnected") {
        HumanError {
            message: format!("Scanwerk can't find the scanner \"{device}\"."),
            suggestion: "Make sure the scanner is switched on and its cable is plugged in, then scan again.".into(),
            retriable: true,
            severity: Severity::ActionRequired,
        }
    } else if lower.contains("paper") || lower.contains("feeder") {
        HumanError {
            message: "The scanner's document feeder is empty or jammed.".into(),
            suggestion: "Load the pages into the feeder (or clear the jam) and scan again.".into(),
            retriable: true,
            severity: Severity::ActionRequired,
        }
    } else if lower.contains("busy") || lower.contains("in use") {
        HumanError {
            message: format!("\"{device}\" is being used by another program."),
            suggestion: "Close the other scanning program and try again.".into(),
            retriable: true,
            severity: Severity::Transient,
        }
    } else if lower.contains("refused") || lower.contains("cancel") {
        HumanError {
            message: "The scan was cancelled.".into(),
            suggestion: "Start the scan again when you're ready.".into(),
            retriable: true,
            severity: Severity::Transient,
        }
    } else {
        HumanError {
            message: format!("\"{device}\" stopped responding."),
            suggestion: format!("Switch the scanner off and on again, then retry. (Detail: {detail})"),
            retriable: true,
            severity: Severity::Transient,
        }
    }
}
