// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Recording fakes of the bridge traits shared by the unit tests.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use image::{DynamicImage, GrayImage, Luma};
use scanwerk_bridge::{HostWindow, TwainSource};
use scanwerk_core::error::{Result, ScanError};
use scanwerk_core::handle::{InMemoryDib, RawImageHandle};
use scanwerk_core::types::{ProtocolCommand, RawMessage};
use scanwerk_document::pack_dib;

pub const WINDOW: usize = 7;
pub const TRANSFER_READY: u32 = 0x8001;
pub const CLOSE_REQUEST: u32 = 0x8002;
pub const CLOSE_ACKNOWLEDGED: u32 = 0x8003;
pub const DEVICE_EVENT: u32 = 0x8004;
pub const PAINT: u32 = 0x000F;

pub fn msg(message: u32) -> RawMessage {
    RawMessage::new(WINDOW, message)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireBehaviour {
    Enable,
    Decline,
    Fail,
}

#[derive(Debug, Default)]
pub struct SourceLog {
    pub acquire_calls: u32,
    pub pass_calls: u32,
    pub transfer_calls: u32,
    pub close_calls: u32,
}

/// Source that classifies the message ids above and hands out a fixed batch.
pub struct FakeSource {
    pub behaviour: AcquireBehaviour,
    pub pages: Vec<(Vec<u8>, Option<u16>)>,
    pub fail_transfer: bool,
    pub fail_close: bool,
    pub log: Rc<RefCell<SourceLog>>,
    commands: HashMap<u32, ProtocolCommand>,
}

impl FakeSource {
    pub fn new(behaviour: AcquireBehaviour) -> Self {
        let commands = HashMap::from([
            (TRANSFER_READY, ProtocolCommand::TransferReady),
            (CLOSE_REQUEST, ProtocolCommand::CloseRequest),
            (CLOSE_ACKNOWLEDGED, ProtocolCommand::CloseAcknowledged),
            (DEVICE_EVENT, ProtocolCommand::DeviceEvent),
        ]);
        Self {
            behaviour,
            pages: Vec::new(),
            fail_transfer: false,
            fail_close: false,
            log: Rc::default(),
            commands,
        }
    }

    /// Add a well-formed page of the given depth.
    pub fn with_page(mut self, bit_count: u16) -> Self {
        self.pages.push((page(bit_count), Some(bit_count)));
        self
    }

    /// Add a page whose bitmap is cut short.
    pub fn with_broken_page(mut self) -> Self {
        let mut dib = page(24);
        dib.truncate(20);
        self.pages.push((dib, Some(24)));
        self
    }
}

fn page(bit_count: u16) -> Vec<u8> {
    let image = DynamicImage::ImageLuma8(GrayImage::from_fn(12, 8, |x, _| {
        Luma([if x % 2 == 0 { 0 } else { 255 }])
    }));
    pack_dib(&image, bit_count, 200).expect("pack test page")
}

impl TwainSource for FakeSource {
    fn device_name(&self) -> &str {
        "Fake Flatbed"
    }

    fn acquire(&mut self) -> Result<bool> {
        self.log.borrow_mut().acquire_calls += 1;
        match self.behaviour {
            AcquireBehaviour::Enable => Ok(true),
            AcquireBehaviour::Decline => Ok(false),
            AcquireBehaviour::Fail => Err(ScanError::Bridge("DSM returned TWRC_FAILURE".into())),
        }
    }

    fn pass_message(&mut self, msg: &RawMessage) -> ProtocolCommand {
        self.log.borrow_mut().pass_calls += 1;
        self.commands
            .get(&msg.message)
            .copied()
            .unwrap_or(ProtocolCommand::None)
    }

    fn transfer_pictures(&mut self) -> Result<Vec<RawImageHandle>> {
        self.log.borrow_mut().transfer_calls += 1;
        if self.fail_transfer {
            return Err(ScanError::Bridge("transfer aborted".into()));
        }
        Ok(std::mem::take(&mut self.pages)
            .into_iter()
            .map(|(dib, depth)| {
                let handle = RawImageHandle::new(InMemoryDib::new(dib));
                match depth {
                    Some(depth) => handle.with_declared_bit_depth(depth),
                    None => handle,
                }
            })
            .collect())
    }

    fn close_source(&mut self) -> Result<()> {
        self.log.borrow_mut().close_calls += 1;
        if self.fail_close {
            return Err(ScanError::Bridge("close refused".into()));
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct WindowLog {
    pub filters: i32,
    pub filter_adds: u32,
    pub filter_removes: u32,
    pub input_enabled: bool,
    pub activations: u32,
    pub closes: u32,
}

impl Default for WindowLog {
    fn default() -> Self {
        Self {
            filters: 0,
            filter_adds: 0,
            filter_removes: 0,
            input_enabled: true,
            activations: 0,
            closes: 0,
        }
    }
}

/// Window that records every call into a shared log.
#[derive(Default)]
pub struct FakeWindow {
    pub log: Rc<RefCell<WindowLog>>,
}

impl HostWindow for FakeWindow {
    fn set_input_enabled(&mut self, enabled: bool) {
        self.log.borrow_mut().input_enabled = enabled;
    }

    fn add_message_filter(&mut self) {
        let mut log = self.log.borrow_mut();
        log.filters += 1;
        log.filter_adds += 1;
    }

    fn remove_message_filter(&mut self) {
        let mut log = self.log.borrow_mut();
        log.filters -= 1;
        log.filter_removes += 1;
    }

    fn activate(&mut self) {
        self.log.borrow_mut().activations += 1;
    }

    fn close(&mut self) {
        self.log.borrow_mut().closes += 1;
    }
}
