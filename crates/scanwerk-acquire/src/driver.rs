// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// TWAIN protocol driver.
//
// Owns the connection to one data source and the acquisition state. Every
// call into the source goes through here, so device failures are turned into
// `DeviceCommunication` errors at a single boundary and the state can never
// disagree with what was actually asked of the device.

use scanwerk_bridge::TwainSource;
use scanwerk_core::error::{Result, ScanError};
use scanwerk_core::handle::RawImageHandle;
use scanwerk_core::types::{ProtocolCommand, RawMessage, SessionId};
use tracing::{debug, info, warn};

use crate::state::AcquireState;

/// Handles of one announced batch.
///
/// Yields each handle once; there is no way to restart it.
#[derive(Debug)]
pub struct TransferBatch {
    handles: std::vec::IntoIter<RawImageHandle>,
}

impl Iterator for TransferBatch {
    type Item = RawImageHandle;

    fn next(&mut self) -> Option<RawImageHandle> {
        self.handles.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.handles.size_hint()
    }
}

impl ExactSizeIterator for TransferBatch {}

/// State machine around one [`TwainSource`].
pub struct TwainDriver<S: TwainSource> {
    source: S,
    state: AcquireState,
    session: SessionId,
}

impl<S: TwainSource> TwainDriver<S> {
    pub fn new(source: S, session: SessionId) -> Self {
        Self {
            source,
            state: AcquireState::Idle,
            session,
        }
    }

    pub fn state(&self) -> AcquireState {
        self.state
    }

    pub fn device_name(&self) -> &str {
        self.source.device_name()
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Mark activation as started. Returns `false` when the driver has
    /// already been activated, in which case nothing happens.
    pub fn begin_activation(&mut self) -> bool {
        match self.state.begin_activation() {
            Ok(()) => true,
            Err(err) => {
                debug!(session = %self.session, state = %self.state, error = %err, "activation ignored");
                false
            }
        }
    }

    /// Open and enable the source.
    ///
    /// `Ok(false)` means the source declined to enable; the state stays
    /// `Activating` until the caller closes it.
    pub fn acquire(&mut self) -> Result<bool> {
        if self.state != AcquireState::Activating {
            return Err(ScanError::ProtocolMisuse(format!(
                "cannot acquire in state {}",
                self.state
            )));
        }

        match self.source.acquire() {
            Ok(true) => {
                self.state.source_enabled()?;
                info!(
                    session = %self.session,
                    device = %self.device_name(),
                    "source enabled"
                );
                Ok(true)
            }
            Ok(false) => Ok(false),
            Err(err) => Err(self.device_error(err.to_string())),
        }
    }

    /// Classify one intercepted message.
    ///
    /// Outside an active acquisition the source is not consulted and every
    /// message is `None`. A `TransferReady` moves the driver to
    /// `AwaitingTransfer`; nothing else changes state here.
    pub fn classify(&mut self, msg: &RawMessage) -> ProtocolCommand {
        if !self.state.accepts_messages() {
            return ProtocolCommand::None;
        }

        let command = self.source.pass_message(msg);
        if command == ProtocolCommand::TransferReady {
            if let Err(err) = self.state.transfer_ready() {
                warn!(session = %self.session, error = %err, "transfer announcement rejected");
                return ProtocolCommand::None;
            }
        }
        if command != ProtocolCommand::None {
            debug!(
                session = %self.session,
                message = msg.message,
                command = %command,
                state = %self.state,
                "message classified"
            );
        }
        command
    }

    /// Pull the announced batch. Only valid after a `TransferReady`.
    pub fn transfer_pictures(&mut self) -> Result<TransferBatch> {
        self.state.begin_draining()?;
        let handles = self
            .source
            .transfer_pictures()
            .map_err(|err| self.device_error(err.to_string()))?;
        info!(session = %self.session, count = handles.len(), "batch transferred");
        Ok(TransferBatch {
            handles: handles.into_iter(),
        })
    }

    /// Disable and close the source.
    ///
    /// Idempotent. The driver is `Closed` afterwards even when the source
    /// reports a failure, which is still returned. A source that was never
    /// opened is not contacted.
    pub fn close_source(&mut self) -> Result<()> {
        match self.state {
            AcquireState::Closed => return Ok(()),
            AcquireState::Idle => {
                self.state.close();
                debug!(session = %self.session, "closed before activation");
                return Ok(());
            }
            _ => {}
        }
        let result = self.source.close_source();
        let err = result.err().map(|err| self.device_error(err.to_string()));
        self.state.close();
        debug!(session = %self.session, "source closed");
        match err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// A `DeviceCommunication` error for the current device and state.
    pub fn device_error(&self, detail: impl Into<String>) -> ScanError {
        ScanError::DeviceCommunication {
            device: self.device_name().to_string(),
            state: self.state.to_string(),
            detail: detail.into(),
        }
    }
}
