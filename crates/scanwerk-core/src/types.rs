// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Scanwerk acquisition engine.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for one acquisition attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reference to a TWAIN data source. The device itself is owned by the data
/// source manager; this is only what we need to address and describe it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRef {
    /// Identifier the data source manager knows the source by.
    pub id: String,
    /// Product name shown to the user and written to logs.
    pub name: String,
}

impl DeviceRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Color mode requested from the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorMode {
    BlackAndWhite,
    Grayscale,
    Color,
}

/// Color depth of an acquired page, derived from the bit depth the device
/// reported for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorDepth {
    /// One bit per pixel.
    BlackAndWhite,
    /// Anything deeper than one bit (grayscale, palette, 24-bit color).
    FullColor,
}

impl ColorDepth {
    /// Classify a DIB bit count. Only a depth of exactly 1 is monochrome.
    pub fn from_bit_count(bit_count: u16) -> Self {
        if bit_count == 1 {
            Self::BlackAndWhite
        } else {
            Self::FullColor
        }
    }
}

/// Settings a session was configured with. Opaque to the state machine;
/// carried through so the caller knows how the pages were produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanSettings {
    pub device: Option<DeviceRef>,
    pub resolution_dpi: u32,
    pub color_mode: ColorMode,
    /// Store pages losslessly regardless of color depth.
    pub max_quality: bool,
    /// JPEG quality (1-100) for lossy pages.
    pub jpeg_quality: u8,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            device: None,
            resolution_dpi: 200,
            color_mode: ColorMode::Color,
            max_quality: false,
            jpeg_quality: 75,
        }
    }
}

/// Classification of one intercepted window-system message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProtocolCommand {
    /// Not a TWAIN message; the window system must process it normally.
    None,
    /// The source asks the application to close it.
    CloseRequest,
    /// The source confirms an orderly close.
    CloseAcknowledged,
    /// Device-level notification with no effect on the session.
    DeviceEvent,
    /// One or more images are ready to be transferred.
    TransferReady,
}

impl ProtocolCommand {
    /// Whether the message that produced this command is fully handled and
    /// must not reach the window system's own dispatch.
    pub fn consumes_message(self) -> bool {
        !matches!(self, Self::None)
    }
}

impl std::fmt::Display for ProtocolCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::None => "None",
            Self::CloseRequest => "CloseRequest",
            Self::CloseAcknowledged => "CloseAcknowledged",
            Self::DeviceEvent => "DeviceEvent",
            Self::TransferReady => "TransferReady",
        };
        f.write_str(name)
    }
}

/// Screen coordinates attached to a message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

/// A window-system message copied out of the host's message loop.
///
/// Field layout mirrors a Win32 `MSG` so a native host can convert without
/// loss, but nothing here depends on a particular window system.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMessage {
    /// Native window handle the message was posted to.
    pub window: usize,
    pub message: u32,
    pub wparam: usize,
    pub lparam: isize,
    pub time: u32,
    pub point: Point,
}

impl RawMessage {
    pub fn new(window: usize, message: u32) -> Self {
        Self {
            window,
            message,
            ..Self::default()
        }
    }
}
