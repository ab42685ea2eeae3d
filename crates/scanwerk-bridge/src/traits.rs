// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic trait definitions for the device and window boundaries.

use scanwerk_core::error::Result;
use scanwerk_core::handle::RawImageHandle;
use scanwerk_core::types::{ProtocolCommand, RawMessage};

/// One TWAIN data source as exposed by the data source manager.
///
/// Implementations translate the manager's return codes into `Result`s;
/// the acquisition driver wraps any error they return as a device
/// communication failure.
pub trait TwainSource {
    /// Product name of the source, used in logs and error messages.
    fn device_name(&self) -> &str;

    /// Open the source and enable it (showing its own UI if it has one).
    ///
    /// Blocks for the whole device handshake. `Ok(false)` means the source
    /// declined; `Err` means talking to it failed.
    fn acquire(&mut self) -> Result<bool>;

    /// Offer a window-system message to the source and report what it
    /// meant. Messages the source does not recognise yield
    /// `ProtocolCommand::None`.
    fn pass_message(&mut self, msg: &RawMessage) -> ProtocolCommand;

    /// Pull every pending image of the current batch.
    fn transfer_pictures(&mut self) -> Result<Vec<RawImageHandle>>;

    /// Disable and close the source.
    fn close_source(&mut self) -> Result<()>;
}

impl<T: TwainSource + ?Sized> TwainSource for Box<T> {
    fn device_name(&self) -> &str {
        (**self).device_name()
    }

    fn acquire(&mut self) -> Result<bool> {
        (**self).acquire()
    }

    fn pass_message(&mut self, msg: &RawMessage) -> ProtocolCommand {
        (**self).pass_message(msg)
    }

    fn transfer_pictures(&mut self) -> Result<Vec<RawImageHandle>> {
        (**self).transfer_pictures()
    }

    fn close_source(&mut self) -> Result<()> {
        (**self).close_source()
    }
}

/// The window that hosts an acquisition, as seen by the message filter.
pub trait HostWindow {
    /// Allow or block user input to the window.
    fn set_input_enabled(&mut self, enabled: bool);

    /// Start routing every message of the application's loop through the
    /// acquisition's pre-dispatch filter.
    fn add_message_filter(&mut self);

    /// Stop routing messages through the filter.
    fn remove_message_filter(&mut self);

    /// Bring the window to the foreground and give it focus.
    fn activate(&mut self);

    /// Close the window, ending the acquisition UI.
    fn close(&mut self);
}
