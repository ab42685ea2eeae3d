// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// One scan session: activation, message handling and teardown.
//
// The host calls `on_activated` once its acquisition window is shown and
// routes every message of its loop through `pre_filter_message` until the
// session is closed. All of it runs on the thread that owns the loop.

use scanwerk_bridge::{HostWindow, TwainSource};
use scanwerk_core::config::{AcquireConfig, ClosePolicy};
use scanwerk_core::error::{Result, ScanError};
use scanwerk_core::operation::{OperationObserver, OperationStatus};
use scanwerk_core::types::{ProtocolCommand, RawMessage, ScanSettings, SessionId};
use scanwerk_document::{BitmapExtractor, OwnedImage};
use tracing::{debug, error, info, instrument, warn};

use crate::driver::TwainDriver;
use crate::interceptor::MessageInterceptor;
use crate::state::AcquireState;

/// What a finished session hands back to its caller.
#[derive(Debug)]
pub struct ScanOutcome {
    pub session: SessionId,
    pub settings: ScanSettings,
    pub images: Vec<OwnedImage>,
    /// Why the session failed, if it did. A session closed by the device or
    /// the user without transferring anything is not a failure.
    pub failure: Option<ScanError>,
}

impl ScanOutcome {
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    pub fn into_result(self) -> Result<Vec<OwnedImage>> {
        match self.failure {
            Some(err) => Err(err),
            None => Ok(self.images),
        }
    }
}

/// One acquisition from activation to close.
pub struct ScanSession<S: TwainSource, W: HostWindow> {
    id: SessionId,
    settings: ScanSettings,
    close_policy: ClosePolicy,
    driver: TwainDriver<S>,
    interceptor: MessageInterceptor<W>,
    extractor: BitmapExtractor,
    images: Vec<OwnedImage>,
    failure: Option<ScanError>,
    ui_terminated: bool,
    finished: bool,
    observer: Option<Box<dyn OperationObserver>>,
}

impl<S: TwainSource, W: HostWindow> ScanSession<S, W> {
    pub fn new(source: S, window: W, settings: ScanSettings) -> Self {
        let id = SessionId::new();
        Self {
            id,
            settings,
            close_policy: ClosePolicy::default(),
            driver: TwainDriver::new(source, id),
            interceptor: MessageInterceptor::new(window),
            extractor: BitmapExtractor::new(),
            images: Vec::new(),
            failure: None,
            ui_terminated: false,
            finished: false,
            observer: None,
        }
    }

    /// A session using the configured default settings and close policy.
    pub fn from_config(source: S, window: W, config: &AcquireConfig) -> Self {
        Self::new(source, window, config.default_settings.clone())
            .with_close_policy(config.close_policy)
    }

    pub fn with_close_policy(mut self, policy: ClosePolicy) -> Self {
        self.close_policy = policy;
        self
    }

    pub fn with_observer(mut self, observer: Box<dyn OperationObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn state(&self) -> AcquireState {
        self.driver.state()
    }

    pub fn settings(&self) -> &ScanSettings {
        &self.settings
    }

    pub fn images(&self) -> &[OwnedImage] {
        &self.images
    }

    pub fn failure(&self) -> Option<&ScanError> {
        self.failure.as_ref()
    }

    pub fn is_interceptor_installed(&self) -> bool {
        self.interceptor.is_installed()
    }

    pub fn is_closed(&self) -> bool {
        self.driver.state().is_closed()
    }

    pub fn source(&self) -> &S {
        self.driver.source()
    }

    pub fn window(&self) -> &W {
        self.interceptor.window()
    }

    /// Start the acquisition. Runs once; later calls return `false`.
    ///
    /// Installs the interceptor, then blocks in the source's acquire
    /// handshake. Returns `true` if the source is now enabled. On refusal or
    /// failure the session is closed, the window terminated and the error
    /// kept for [`ScanSession::finish`].
    #[instrument(skip(self), fields(session = %self.id))]
    pub fn on_activated(&mut self) -> bool {
        if !self.driver.begin_activation() {
            return false;
        }

        self.interceptor.install();
        self.notify_status(OperationStatus::new(
            format!("Waiting for {}", self.driver.device_name()),
            0,
            0,
        ));

        let err = match self.driver.acquire() {
            Ok(true) => return true,
            Ok(false) => self.driver.device_error("source declined to enable"),
            Err(err) => err,
        };
        self.fail(err);
        self.shutdown(true);
        false
    }

    /// Alias of [`ScanSession::on_activated`] for callers without a window
    /// activation event.
    pub fn start(&mut self) -> bool {
        self.on_activated()
    }

    /// Pre-dispatch hook. Returns `true` when the host must not dispatch
    /// `msg` itself.
    pub fn pre_filter_message(&mut self, msg: &RawMessage) -> bool {
        let interception = self.interceptor.dispatch(&mut self.driver, msg);
        match interception.command {
            ProtocolCommand::None => {}
            ProtocolCommand::DeviceEvent => {
                debug!(session = %self.id, "device event");
            }
            ProtocolCommand::TransferReady => self.collect_transfer(),
            ProtocolCommand::CloseRequest => {
                self.close_from_device(self.close_policy.terminate_on_close_request)
            }
            ProtocolCommand::CloseAcknowledged => {
                self.close_from_device(self.close_policy.terminate_on_close_acknowledged)
            }
        }
        interception.consumed
    }

    /// The host's window was closed. Closes the source and removes the
    /// interceptor if that has not happened yet.
    pub fn close(&mut self) {
        self.ui_terminated = true;
        self.shutdown(false);
    }

    /// Close the session and return what it produced. A session that was
    /// never activated reports `AcquisitionFailed`.
    pub fn finish(mut self) -> ScanOutcome {
        if self.driver.state() == AcquireState::Idle {
            self.failure
                .get_or_insert(ScanError::AcquisitionFailed("session was never activated".into()));
        }
        self.close();
        ScanOutcome {
            session: self.id,
            settings: self.settings.clone(),
            images: std::mem::take(&mut self.images),
            failure: self.failure.take(),
        }
    }

    #[instrument(skip(self), fields(session = %self.id))]
    fn collect_transfer(&mut self) {
        match self.driver.transfer_pictures() {
            Ok(batch) => {
                let total = u32::try_from(batch.len()).unwrap_or(u32::MAX);
                for (index, handle) in batch.enumerate() {
                    let declared = handle.declared_bit_depth();
                    match self.extractor.extract(handle, declared) {
                        Ok(image) => {
                            self.images.push(image);
                            self.notify_status(OperationStatus::new(
                                format!("Acquired page {} of {total}", index + 1),
                                u32::try_from(index + 1).unwrap_or(u32::MAX),
                                total,
                            ));
                        }
                        Err(err) if err.is_per_image() => {
                            warn!(
                                session = %self.id,
                                device = %self.driver.device_name(),
                                page = index + 1,
                                error = %err,
                                "page skipped"
                            );
                        }
                        Err(err) => self.fail(err),
                    }
                }
                info!(session = %self.id, acquired = self.images.len(), total, "transfer complete");
            }
            Err(err) => self.fail(err),
        }
        self.shutdown(true);
    }

    fn close_from_device(&mut self, terminate_ui: bool) {
        info!(session = %self.id, state = %self.driver.state(), terminate_ui, "source asked to close");
        self.shutdown(terminate_ui);
    }

    /// Close the source, remove the interceptor and optionally take the
    /// window down. Safe to call repeatedly.
    fn shutdown(&mut self, terminate_ui: bool) {
        let activated = self.driver.state() != AcquireState::Idle;
        if let Err(err) = self.driver.close_source() {
            warn!(session = %self.id, error = %err, "source did not close cleanly");
        }
        self.interceptor.uninstall();

        if terminate_ui && !self.ui_terminated {
            self.ui_terminated = true;
            self.interceptor.window_mut().close();
        }
        if activated && !self.finished {
            self.finished = true;
            if let Some(observer) = &self.observer {
                observer.finished();
            }
        }
    }

    fn fail(&mut self, err: ScanError) {
        error!(
            session = %self.id,
            device = %self.driver.device_name(),
            state = %self.driver.state(),
            error = %err,
            "acquisition failed"
        );
        if let Some(observer) = &self.observer {
            observer.error(&err.to_string());
        }
        self.failure.get_or_insert(err);
    }

    fn notify_status(&self, status: OperationStatus) {
        if let Some(observer) = &self.observer {
            observer.status_changed(&status);
        }
    }
}

impl<S: TwainSource, W: HostWindow> Drop for ScanSession<S, W> {
    fn drop(&mut self) {
        self.shutdown(false);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use scanwerk_core::types::ColorDepth;

    use super::*;
    use crate::testing::*;

    type Session = ScanSession<FakeSource, FakeWindow>;

    fn session(source: FakeSource) -> (Session, Rc<RefCell<SourceLog>>, Rc<RefCell<WindowLog>>) {
        let window = FakeWindow::default();
        let window_log = window.log.clone();
        let source_log = source.log.clone();
        (
            ScanSession::new(source, window, ScanSettings::default()),
            source_log,
            window_log,
        )
    }

    #[derive(Default)]
    struct Events {
        statuses: Vec<OperationStatus>,
        errors: Vec<String>,
        finished: u32,
    }

    struct Recorder(Rc<RefCell<Events>>);

    impl OperationObserver for Recorder {
        fn status_changed(&self, status: &OperationStatus) {
            self.0.borrow_mut().statuses.push(status.clone());
        }

        fn error(&self, message: &str) {
            self.0.borrow_mut().errors.push(message.to_string());
        }

        fn finished(&self) {
            self.0.borrow_mut().finished += 1;
        }
    }

    #[test]
    fn two_pages_then_close_acknowledged() {
        let source = FakeSource::new(AcquireBehaviour::Enable).with_page(1).with_page(24);
        let (mut session, source_log, window_log) = session(source);

        assert!(session.on_activated());
        assert!(session.is_interceptor_installed());
        assert!(session.pre_filter_message(&msg(TRANSFER_READY)));
        assert!(!session.pre_filter_message(&msg(CLOSE_ACKNOWLEDGED)));

        assert!(session.is_closed());
        assert!(!session.is_interceptor_installed());
        assert_eq!(source_log.borrow().close_calls, 1);
        assert_eq!(window_log.borrow().filters, 0);
        assert_eq!(window_log.borrow().closes, 1);

        let outcome = session.finish();
        assert!(outcome.is_success());
        let depths: Vec<_> = outcome.images.iter().map(|i| i.color_depth).collect();
        assert_eq!(depths, vec![ColorDepth::BlackAndWhite, ColorDepth::FullColor]);
    }

    #[test]
    fn acquire_failure_cleans_up() {
        let (mut session, source_log, window_log) = session(FakeSource::new(AcquireBehaviour::Fail));

        assert!(!session.on_activated());
        assert!(session.is_closed());
        assert!(!session.is_interceptor_installed());
        assert_eq!(source_log.borrow().close_calls, 1);
        assert_eq!(window_log.borrow().filters, 0);
        assert!(window_log.borrow().input_enabled);
        assert_eq!(window_log.borrow().closes, 1);

        let outcome = session.finish();
        assert!(outcome.images.is_empty());
        assert!(matches!(
            outcome.failure,
            Some(ScanError::DeviceCommunication { .. })
        ));
    }

    #[test]
    fn declined_acquire_is_a_failure() {
        let (mut session, _, _) = session(FakeSource::new(AcquireBehaviour::Decline));
        assert!(!session.on_activated());
        match session.failure() {
            Some(ScanError::DeviceCommunication { detail, .. }) => {
                assert!(detail.contains("declined"));
            }
            other => panic!("unexpected failure: {other:?}"),
        }
    }

    #[test]
    fn close_request_while_acquiring() {
        let source = FakeSource::new(AcquireBehaviour::Enable).with_page(24);
        let (mut session, source_log, window_log) = session(source);
        session.on_activated();

        assert!(session.pre_filter_message(&msg(CLOSE_REQUEST)));
        assert!(session.is_closed());
        assert!(!session.is_interceptor_installed());
        assert_eq!(window_log.borrow().closes, 1);
        assert_eq!(source_log.borrow().transfer_calls, 0);

        let outcome = session.finish();
        assert!(outcome.is_success());
        assert!(outcome.images.is_empty());
    }

    #[test]
    fn close_acknowledged_keeps_window_by_default() {
        let (mut session, _, window_log) = session(FakeSource::new(AcquireBehaviour::Enable));
        session.on_activated();

        assert!(session.pre_filter_message(&msg(CLOSE_ACKNOWLEDGED)));
        assert!(session.is_closed());
        assert_eq!(window_log.borrow().closes, 0);
    }

    #[test]
    fn close_policy_is_honoured() {
        let window = FakeWindow::default();
        let window_log = window.log.clone();
        let mut session = ScanSession::new(
            FakeSource::new(AcquireBehaviour::Enable),
            window,
            ScanSettings::default(),
        )
        .with_close_policy(ClosePolicy {
            terminate_on_close_request: false,
            terminate_on_close_acknowledged: true,
        });
        session.on_activated();

        session.pre_filter_message(&msg(CLOSE_REQUEST));
        assert!(session.is_closed());
        assert_eq!(window_log.borrow().closes, 0);
    }

    #[test]
    fn broken_page_is_skipped() {
        let source = FakeSource::new(AcquireBehaviour::Enable)
            .with_page(8)
            .with_broken_page()
            .with_page(1);
        let (mut session, _, _) = session(source);
        session.on_activated();
        session.pre_filter_message(&msg(TRANSFER_READY));

        let outcome = session.finish();
        assert!(outcome.is_success());
        assert_eq!(outcome.images.len(), 2);
    }

    #[test]
    fn failed_transfer_reports_failure() {
        let mut source = FakeSource::new(AcquireBehaviour::Enable).with_page(8);
        source.fail_transfer = true;
        let (mut session, source_log, _) = session(source);
        session.on_activated();
        session.pre_filter_message(&msg(TRANSFER_READY));

        assert!(session.is_closed());
        assert_eq!(source_log.borrow().close_calls, 1);
        let outcome = session.finish();
        assert!(outcome.images.is_empty());
        assert!(outcome.into_result().is_err());
    }

    #[test]
    fn device_event_is_consumed_without_effect() {
        let (mut session, _, _) = session(FakeSource::new(AcquireBehaviour::Enable));
        session.on_activated();

        assert!(session.pre_filter_message(&msg(DEVICE_EVENT)));
        assert!(!session.pre_filter_message(&msg(PAINT)));
        assert_eq!(session.state(), AcquireState::Acquiring);
        assert!(session.is_interceptor_installed());
    }

    #[test]
    fn messages_before_activation_pass_through() {
        let (mut session, source_log, _) = session(FakeSource::new(AcquireBehaviour::Enable));
        assert!(!session.pre_filter_message(&msg(TRANSFER_READY)));
        assert_eq!(source_log.borrow().pass_calls, 0);
        assert_eq!(session.state(), AcquireState::Idle);
    }

    #[test]
    fn activation_runs_once() {
        let (mut session, source_log, window_log) = session(FakeSource::new(AcquireBehaviour::Enable));
        assert!(session.on_activated());
        assert!(!session.start());
        assert_eq!(source_log.borrow().acquire_calls, 1);
        assert_eq!(window_log.borrow().filter_adds, 1);
    }

    #[test]
    fn dropping_mid_acquisition_cleans_up() {
        let source = FakeSource::new(AcquireBehaviour::Enable);
        let (mut session, source_log, window_log) = session(source);
        session.on_activated();
        drop(session);

        assert_eq!(source_log.borrow().close_calls, 1);
        assert_eq!(window_log.borrow().filters, 0);
        assert_eq!(window_log.borrow().closes, 0);
    }

    #[test]
    fn unactivated_session_never_touches_source() {
        let events = Rc::new(RefCell::new(Events::default()));
        let source = FakeSource::new(AcquireBehaviour::Enable);
        let source_log = source.log.clone();
        let window = FakeWindow::default();
        let window_log = window.log.clone();
        let session = ScanSession::new(source, window, ScanSettings::default())
            .with_observer(Box::new(Recorder(events.clone())));

        let outcome = session.finish();
        assert_eq!(source_log.borrow().close_calls, 0);
        assert_eq!(window_log.borrow().filter_removes, 0);
        assert_eq!(events.borrow().finished, 0);
        assert!(outcome.images.is_empty());
        assert!(matches!(outcome.failure, Some(ScanError::AcquisitionFailed(_))));
    }

    #[test]
    fn dropping_unactivated_session_is_silent() {
        let source = FakeSource::new(AcquireBehaviour::Enable);
        let source_log = source.log.clone();
        drop(ScanSession::new(source, FakeWindow::default(), ScanSettings::default()));
        assert_eq!(source_log.borrow().close_calls, 0);
    }

    #[test]
    fn caller_close_is_idempotent() {
        let (mut session, source_log, window_log) = session(FakeSource::new(AcquireBehaviour::Enable));
        session.on_activated();
        session.close();
        session.close();

        assert!(session.is_closed());
        assert_eq!(source_log.borrow().close_calls, 1);
        assert_eq!(window_log.borrow().filter_removes, 1);
        assert!(!session.pre_filter_message(&msg(TRANSFER_READY)));
    }

    #[test]
    fn observer_sees_progress_and_one_finish() {
        let events = Rc::new(RefCell::new(Events::default()));
        let source = FakeSource::new(AcquireBehaviour::Enable).with_page(1).with_page(1);
        let mut session = ScanSession::new(source, FakeWindow::default(), ScanSettings::default())
            .with_observer(Box::new(Recorder(events.clone())));
        session.on_activated();
        session.pre_filter_message(&msg(TRANSFER_READY));
        let _ = session.finish();

        let events = events.borrow();
        assert_eq!(events.finished, 1);
        assert!(events.errors.is_empty());
        let last = events.statuses.last().expect("status");
        assert_eq!((last.current_progress, last.max_progress), (2, 2));
    }

    #[test]
    fn observer_sees_failure() {
        let events = Rc::new(RefCell::new(Events::default()));
        let mut session = ScanSession::new(
            FakeSource::new(AcquireBehaviour::Fail),
            FakeWindow::default(),
            ScanSettings::default(),
        )
        .with_observer(Box::new(Recorder(events.clone())));
        session.on_activated();
        drop(session);

        let events = events.borrow();
        assert_eq!(events.errors.len(), 1);
        assert!(events.errors[0].contains("Fake Flatbed"));
        assert_eq!(events.finished, 1);
    }

    #[test]
    fn config_supplies_settings_and_policy() {
        let mut config = AcquireConfig::default();
        config.default_settings.resolution_dpi = 600;
        config.close_policy.terminate_on_close_acknowledged = true;

        let window = FakeWindow::default();
        let window_log = window.log.clone();
        let mut session =
            ScanSession::from_config(FakeSource::new(AcquireBehaviour::Enable), window, &config);
        assert_eq!(session.settings().resolution_dpi, 600);

        session.on_activated();
        session.pre_filter_message(&msg(CLOSE_ACKNOWLEDGED));
        assert_eq!(window_log.borrow().closes, 1);
    }
}
