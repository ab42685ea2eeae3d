// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! Scanwerk — boundaries to the TWAIN data source manager and the host window.
//!
//! The acquisition engine only talks to a device through [`traits::TwainSource`]
//! and to the window hosting the scan through [`traits::HostWindow`]. This
//! crate defines both and ships two implementations that need no scanner:
//! a headless stub and a replay of scripted sessions.

pub mod script;
pub mod stub;
pub mod traits;

pub use script::{ScriptedSource, SessionScript};
pub use stub::{HeadlessWindow, StubSource};
pub use traits::{HostWindow, TwainSource};

use scanwerk_core::types::DeviceRef;

/// The TWAIN source for `device` on this platform.
///
/// The native data source manager binding is provided by the host
/// application; without it every platform gets the stub, whose `acquire`
/// reports `PlatformUnavailable`.
pub fn platform_source(device: Option<&DeviceRef>) -> Box<dyn TwainSource> {
    let name = device.map_or("default source", |d| d.name.as_str());
    Box::new(StubSource::new(name))
}
