// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scripted TWAIN source that replays a recorded session without a scanner.
//
// A script lists what the device does once enabled: each event becomes one
// window message, which the source later classifies as the scripted command.
// Pages of a `TransferReady` event are synthesised as packed DIBs.
//
// ```json
// {
//   "device_name": "Replay Flatbed",
//   "acquire": "accept",
//   "events": [
//     { "command": "DeviceEvent" },
//     { "command": "TransferReady",
//       "pages": [ { "width": 850, "height": 1100, "bit_count": 1 },
//                  { "width": 850, "height": 1100, "bit_count": 24 } ] },
//     { "command": "CloseAcknowledged" }
//   ]
// }
// ```

use std::path::Path;

use image::{DynamicImage, Rgb, RgbImage};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use scanwerk_core::error::{Result, ScanError};
use scanwerk_core::handle::{InMemoryDib, RawImageHandle};
use scanwerk_core::types::{ProtocolCommand, RawMessage};
use scanwerk_document::pack_dib;

/// Window handle scripted messages are addressed to.
pub const SCRIPT_WINDOW: usize = 0x5C_A11;

/// First message id used for scripted events (`WM_APP`).
pub const SCRIPT_MESSAGE_BASE: u32 = 0x8000;

/// How the scripted device answers `acquire`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcquireResponse {
    #[default]
    Accept,
    Refuse,
    Fail { detail: String },
}

/// A synthesised page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptPage {
    pub width: u32,
    pub height: u32,
    /// 1, 8 or 24.
    pub bit_count: u16,
    #[serde(default = "default_dpi")]
    pub resolution_dpi: u32,
    /// Deliver a truncated bitmap, as a failing driver would.
    #[serde(default)]
    pub corrupt: bool,
}

fn default_dpi() -> u32 {
    100
}

/// One device-side event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptEvent {
    pub command: ProtocolCommand,
    #[serde(default)]
    pub pages: Vec<ScriptPage>,
}

/// A full session recording.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionScript {
    pub device_name: String,
    #[serde(default)]
    pub acquire: AcquireResponse,
    pub events: Vec<ScriptEvent>,
}

impl SessionScript {
    pub fn from_json(json: &str) -> Result<Self> {
        let script: Self = serde_json::from_str(json)?;
        script.validate()?;
        Ok(script)
    }

    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&json)
    }

    fn validate(&self) -> Result<()> {
        for (index, event) in self.events.iter().enumerate() {
            if !event.pages.is_empty() && event.command != ProtocolCommand::TransferReady {
                return Err(ScanError::Config(format!(
                    "event {index}: only TransferReady events carry pages"
                )));
            }
            for page in &event.pages {
                if !matches!(page.bit_count, 1 | 8 | 24) {
                    return Err(ScanError::Config(format!(
                        "event {index}: bit_count {} not one of 1, 8, 24",
                        page.bit_count
                    )));
                }
                if page.width == 0 || page.height == 0 {
                    return Err(ScanError::Config(format!("event {index}: empty page")));
                }
            }
        }
        Ok(())
    }
}

/// `TwainSource` that replays a [`SessionScript`].
pub struct ScriptedSource {
    script: SessionScript,
    pending: Vec<ScriptPage>,
    enabled: bool,
    close_calls: u32,
}

impl ScriptedSource {
    pub fn new(script: SessionScript) -> Self {
        Self {
            script,
            pending: Vec::new(),
            enabled: false,
            close_calls: 0,
        }
    }

    /// The window messages the device would post, in order.
    pub fn messages(&self) -> Vec<RawMessage> {
        (0..self.script.events.len())
            .map_while(|index| {
                let offset = u32::try_from(index).ok()?;
                Some(RawMessage::new(SCRIPT_WINDOW, SCRIPT_MESSAGE_BASE.checked_add(offset)?))
            })
            .collect()
    }

    /// How many times `close_source` was called.
    pub fn close_calls(&self) -> u32 {
        self.close_calls
    }

    fn event_for(&self, msg: &RawMessage) -> Option<&ScriptEvent> {
        if msg.window != SCRIPT_WINDOW {
            return None;
        }
        let index = usize::try_from(msg.message.checked_sub(SCRIPT_MESSAGE_BASE)?).ok()?;
        self.script.events.get(index)
    }
}

impl super::traits::TwainSource for ScriptedSource {
    fn device_name(&self) -> &str {
        &self.script.device_name
    }

    fn acquire(&mut self) -> Result<bool> {
        match &self.script.acquire {
            AcquireResponse::Accept => {
                info!(device = %self.script.device_name, "scripted source enabled");
                self.enabled = true;
                Ok(true)
            }
            AcquireResponse::Refuse => Ok(false),
            AcquireResponse::Fail { detail } => Err(ScanError::Bridge(detail.clone())),
        }
    }

    fn pass_message(&mut self, msg: &RawMessage) -> ProtocolCommand {
        if !self.enabled {
            return ProtocolCommand::None;
        }
        let Some(event) = self.event_for(msg).cloned() else {
            return ProtocolCommand::None;
        };
        if event.command == ProtocolCommand::TransferReady {
            self.pending.extend(event.pages);
        }
        debug!(message = msg.message, command = %event.command, "scripted message classified");
        event.command
    }

    fn transfer_pictures(&mut self) -> Result<Vec<RawImageHandle>> {
        if self.pending.is_empty() {
            return Err(ScanError::Bridge("no transfer pending".into()));
        }
        std::mem::take(&mut self.pending)
            .into_iter()
            .map(synthesise_page)
            .collect()
    }

    fn close_source(&mut self) -> Result<()> {
        self.enabled = false;
        self.close_calls += 1;
        Ok(())
    }
}

/// Render a striped test page and pack it the way the device would.
fn synthesise_page(page: ScriptPage) -> Result<RawImageHandle> {
    let image = RgbImage::from_fn(page.width, page.height, |x, y| {
        if (y / 16) % 4 == 0 {
            Rgb([20, 20, 20])
        } else {
            Rgb([255, (x % 256) as u8, 240])
        }
    });
    let mut dib = pack_dib(&DynamicImage::ImageRgb8(image), page.bit_count, page.resolution_dpi)?;
    if page.corrupt {
        dib.truncate(dib.len() / 2);
    }
    Ok(RawImageHandle::new(InMemoryDib::new(dib)).with_declared_bit_depth(page.bit_count))
}
