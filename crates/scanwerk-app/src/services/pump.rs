// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Headless message loop.
//
// A GUI host feeds `pre_filter_message` from its own loop. The command line
// has no window system, so it drives the session from the list of messages
// the source will post and "dispatches" whatever the session leaves alone by
// logging it.

use scanwerk_acquire::{ScanOutcome, ScanSession};
use scanwerk_bridge::{HeadlessWindow, ScriptedSource, SessionScript, TwainSource};
use scanwerk_core::config::AcquireConfig;
use scanwerk_core::operation::{OperationObserver, OperationStatus};
use scanwerk_core::types::{RawMessage, ScanSettings};
use tracing::{debug, error, info};

/// Observer that turns operation events into log records.
pub struct LogObserver;

impl OperationObserver for LogObserver {
    fn status_changed(&self, status: &OperationStatus) {
        info!(
            current = status.current_progress,
            max = status.max_progress,
            "{}",
            status.status_text
        );
    }

    fn error(&self, message: &str) {
        error!("{message}");
    }

    fn finished(&self) {
        debug!("operation finished");
    }
}

/// Run one session against `source`, delivering `messages` in order until
/// the session closes.
pub fn run_session<S: TwainSource>(
    source: S,
    messages: impl IntoIterator<Item = RawMessage>,
    settings: ScanSettings,
    config: &AcquireConfig,
) -> ScanOutcome {
    let mut session = ScanSession::new(source, HeadlessWindow::new(), settings)
        .with_close_policy(config.close_policy)
        .with_observer(Box::new(LogObserver));
    info!(session = %session.id(), device = %session.source().device_name(), "session started");

    if session.on_activated() {
        for msg in messages {
            if !session.pre_filter_message(&msg) {
                debug!(message = msg.message, "dispatched to host");
            }
            if session.is_closed() {
                break;
            }
        }
        if !session.is_closed() {
            info!(session = %session.id(), "source went quiet, closing");
        }
    }
    session.finish()
}

/// Replay a recorded session.
pub fn run_script(script: SessionScript, settings: ScanSettings, config: &AcquireConfig) -> ScanOutcome {
    let source = ScriptedSource::new(script);
    let messages = source.messages();
    run_session(source, messages, settings, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanwerk_core::ScanError;
    use scanwerk_core::types::ColorDepth;

    const SCRIPT: &str = r#"{
        "device_name": "Replay Flatbed",
        "events": [
            { "command": "DeviceEvent" },
            { "command": "TransferReady",
              "pages": [ { "width": 64, "height": 48, "bit_count": 1 },
                         { "width": 64, "height": 48, "bit_count": 24, "corrupt": true },
                         { "width": 64, "height": 48, "bit_count": 24 } ] },
            { "command": "CloseAcknowledged" }
        ]
    }"#;

    #[test]
    fn replay_collects_readable_pages() {
        let script = SessionScript::from_json(SCRIPT).expect("script");
        let outcome = run_script(script, ScanSettings::default(), &AcquireConfig::default());

        assert!(outcome.is_success());
        let depths: Vec<_> = outcome.images.iter().map(|i| i.color_depth).collect();
        assert_eq!(depths, vec![ColorDepth::BlackAndWhite, ColorDepth::FullColor]);
        assert_eq!(outcome.images[0].resolution_dpi, Some(100));
    }

    #[test]
    fn refused_acquire_yields_failure() {
        let script = SessionScript::from_json(
            r#"{ "device_name": "Busy", "acquire": "refuse", "events": [] }"#,
        )
        .expect("script");
        let outcome = run_script(script, ScanSettings::default(), &AcquireConfig::default());
        assert!(outcome.images.is_empty());
        assert!(matches!(
            outcome.failure,
            Some(ScanError::DeviceCommunication { .. })
        ));
    }

    #[test]
    fn close_request_ends_without_pages() {
        let script = SessionScript::from_json(
            r#"{ "device_name": "x", "events": [ { "command": "CloseRequest" },
                 { "command": "TransferReady", "pages": [ { "width": 4, "height": 4, "bit_count": 8 } ] } ] }"#,
        )
        .expect("script");
        let outcome = run_script(script, ScanSettings::default(), &AcquireConfig::default());
        assert!(outcome.is_success());
        assert!(outcome.images.is_empty());
    }

    #[test]
    fn platform_stub_is_unavailable() {
        let source = scanwerk_bridge::platform_source(None);
        let outcome = run_session(source, Vec::new(), ScanSettings::default(), &AcquireConfig::default());
        assert!(matches!(
            outcome.failure,
            Some(ScanError::DeviceCommunication { ref detail, .. }) if detail.contains("not available")
        ));
    }
}
