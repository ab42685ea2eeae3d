// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pre-dispatch message interception.
//
// While a source is enabled it talks to the application by posting messages
// to the application's own loop. The interceptor sits in front of normal
// dispatch, hands each message to the driver and tells the host whether to
// swallow it. It also owns the hosting window's modal state: installing
// blocks input to the window, uninstalling gives it back.

use scanwerk_bridge::{HostWindow, TwainSource};
use scanwerk_core::types::{ProtocolCommand, RawMessage};
use tracing::debug;

use crate::driver::TwainDriver;

/// Result of offering one message to the interceptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interception {
    pub command: ProtocolCommand,
    /// When `true` the host must not dispatch the message itself.
    pub consumed: bool,
}

impl Interception {
    fn pass_through() -> Self {
        Self {
            command: ProtocolCommand::None,
            consumed: false,
        }
    }
}

/// The message filter registration of one session.
///
/// Registered at most once at a time; dropping an installed interceptor
/// removes the registration.
pub struct MessageInterceptor<W: HostWindow> {
    window: W,
    installed: bool,
}

impl<W: HostWindow> MessageInterceptor<W> {
    pub fn new(window: W) -> Self {
        Self {
            window,
            installed: false,
        }
    }

    pub fn is_installed(&self) -> bool {
        self.installed
    }

    pub fn window(&self) -> &W {
        &self.window
    }

    pub fn window_mut(&mut self) -> &mut W {
        &mut self.window
    }

    /// Register the filter and block input to the window. Returns `false`
    /// if it was already installed.
    pub fn install(&mut self) -> bool {
        if self.installed {
            return false;
        }
        self.window.add_message_filter();
        self.window.set_input_enabled(false);
        self.installed = true;
        debug!("message interceptor installed");
        true
    }

    /// Remove the filter, unblock the window and give it focus back.
    /// Returns `false` if it was not installed.
    pub fn uninstall(&mut self) -> bool {
        if !self.installed {
            return false;
        }
        self.window.remove_message_filter();
        self.window.set_input_enabled(true);
        self.window.activate();
        self.installed = false;
        debug!("message interceptor removed");
        true
    }

    /// Offer `msg` to the driver.
    pub fn dispatch<S: TwainSource>(
        &self,
        driver: &mut TwainDriver<S>,
        msg: &RawMessage,
    ) -> Interception {
        if !self.installed {
            return Interception::pass_through();
        }
        let command = driver.classify(msg);
        Interception {
            command,
            consumed: command.consumes_message(),
        }
    }
}

impl<W: HostWindow> Drop for MessageInterceptor<W> {
    fn drop(&mut self) {
        self.uninstall();
    }
}
