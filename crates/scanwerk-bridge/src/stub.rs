// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stub boundaries for builds without a TWAIN data source manager or a real
// window.

use scanwerk_core::error::{Result, ScanError};
use scanwerk_core::handle::RawImageHandle;
use scanwerk_core::types::{ProtocolCommand, RawMessage};
use tracing::{debug, warn};

use crate::traits::{HostWindow, TwainSource};

/// Source returned when no data source manager is available.
pub struct StubSource {
    name: String,
}

impl StubSource {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl TwainSource for StubSource {
    fn device_name(&self) -> &str {
        &self.name
    }

    fn acquire(&mut self) -> Result<bool> {
        warn!(device = %self.name, "TwainSource::acquire called on stub source");
        Err(ScanError::PlatformUnavailable)
    }

    fn pass_message(&mut self, _msg: &RawMessage) -> ProtocolCommand {
        ProtocolCommand::None
    }

    fn transfer_pictures(&mut self) -> Result<Vec<RawImageHandle>> {
        Err(ScanError::PlatformUnavailable)
    }

    fn close_source(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Window stand-in for the command line: there is nothing to disable or
/// focus, so it only remembers what was asked of it.
#[derive(Debug)]
pub struct HeadlessWindow {
    input_enabled: bool,
    filter_registered: bool,
    closed: bool,
}

impl Default for HeadlessWindow {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessWindow {
    pub fn new() -> Self {
        Self {
            input_enabled: true,
            filter_registered: false,
            closed: false,
        }
    }

    pub fn input_enabled(&self) -> bool {
        self.input_enabled
    }

    pub fn filter_registered(&self) -> bool {
        self.filter_registered
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl HostWindow for HeadlessWindow {
    fn set_input_enabled(&mut self, enabled: bool) {
        debug!(enabled, "headless window input");
        self.input_enabled = enabled;
    }

    fn add_message_filter(&mut self) {
        debug!("headless window message filter added");
        self.filter_registered = true;
    }

    fn remove_message_filter(&mut self) {
        debug!("headless window message filter removed");
        self.filter_registered = false;
    }

    fn activate(&mut self) {}

    fn close(&mut self) {
        debug!("headless window closed");
        self.closed = true;
    }
}
