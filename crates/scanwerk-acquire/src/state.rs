// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Acquisition state machine with validated transitions.

use scanwerk_core::error::{Result, ScanError};

/// Where a TWAIN acquisition stands.
///
/// ```text
///  Idle ──► Activating ──► Acquiring ──► AwaitingTransfer ──► Draining
///               │              │                │                 │
///               └──────────────┴───────► Closed ◄─────────────────┘
/// ```
///
/// `Closed` is terminal: a session is never reactivated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AcquireState {
    /// Created, not yet activated.
    #[default]
    Idle,
    /// Activation started; the source is being opened and enabled.
    Activating,
    /// The source is enabled and may post messages at any time.
    Acquiring,
    /// The source announced images; nothing has been pulled yet.
    AwaitingTransfer,
    /// Images of the announced batch are being pulled.
    Draining,
    /// The source is closed.
    Closed,
}

impl std::fmt::Display for AcquireState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "Idle",
            Self::Activating => "Activating",
            Self::Acquiring => "Acquiring",
            Self::AwaitingTransfer => "AwaitingTransfer",
            Self::Draining => "Draining",
            Self::Closed => "Closed",
        };
        f.write_str(name)
    }
}

impl AcquireState {
    /// Whether the source may be asked to classify messages.
    ///
    /// Messages can arrive while `acquire` is still blocked in the source's
    /// own UI, so `Activating` counts.
    pub fn accepts_messages(&self) -> bool {
        matches!(
            self,
            Self::Activating | Self::Acquiring | Self::AwaitingTransfer
        )
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }

    // ── Transitions ──────────────────────────────────────────────

    /// Transition to `Activating`.
    ///
    /// Valid from: `Idle`.
    pub fn begin_activation(&mut self) -> Result<()> {
        match self {
            Self::Idle => {
                *self = Self::Activating;
                Ok(())
            }
            other => Err(misuse("activate", other)),
        }
    }

    /// Transition to `Acquiring`.
    ///
    /// Valid from: `Activating`.
    pub fn source_enabled(&mut self) -> Result<()> {
        match self {
            Self::Activating => {
                *self = Self::Acquiring;
                Ok(())
            }
            other => Err(misuse("enable source", other)),
        }
    }

    /// Transition to `AwaitingTransfer`.
    ///
    /// Valid from: `Activating`, `Acquiring`; a repeated announcement in
    /// `AwaitingTransfer` keeps the state.
    pub fn transfer_ready(&mut self) -> Result<()> {
        match self {
            Self::Activating | Self::Acquiring | Self::AwaitingTransfer => {
                *self = Self::AwaitingTransfer;
                Ok(())
            }
            other => Err(misuse("announce transfer", other)),
        }
    }

    /// Transition to `Draining`.
    ///
    /// Valid from: `AwaitingTransfer`.
    pub fn begin_draining(&mut self) -> Result<()> {
        match self {
            Self::AwaitingTransfer => {
                *self = Self::Draining;
                Ok(())
            }
            other => Err(misuse("transfer pictures", other)),
        }
    }

    /// Force the terminal state regardless of the current one.
    pub fn close(&mut self) {
        *self = Self::Closed;
    }
}

fn misuse(action: &str, state: &AcquireState) -> ScanError {
    ScanError::ProtocolMisuse(format!("cannot {action} in state {state}"))
}
