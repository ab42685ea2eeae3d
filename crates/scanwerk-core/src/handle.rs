// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Ownership contract for device bitmap memory.
//
// A data source hands the application a packed device-independent bitmap in
// memory it allocated. `RawImageHandle` wraps that memory until the bitmap
// extractor consumes it; dropping the backing `DibMemory` releases it.

use crate::error::Result;

/// Device-allocated memory holding one packed DIB (header, optional color
/// masks and palette, then pixel rows).
///
/// Implementations release the memory in `Drop`.
pub trait DibMemory {
    /// Map the memory and return its contents.
    fn bytes(&mut self) -> Result<&[u8]>;
}

/// Opaque handle to one transferred page.
///
/// Deliberately not `Clone`: the only way to read the pixels is to consume
/// the handle, so a bitmap cannot be extracted twice.
pub struct RawImageHandle {
    memory: Option<Box<dyn DibMemory>>,
    declared_bit_depth: Option<u16>,
}

impl RawImageHandle {
    pub fn new(memory: impl DibMemory + 'static) -> Self {
        Self {
            memory: Some(Box::new(memory)),
            declared_bit_depth: None,
        }
    }

    /// A handle the device returned without memory behind it.
    pub fn null() -> Self {
        Self {
            memory: None,
            declared_bit_depth: None,
        }
    }

    /// Record the bit depth the device reported in its image info.
    pub fn with_declared_bit_depth(mut self, bits: u16) -> Self {
        self.declared_bit_depth = Some(bits);
        self
    }

    pub fn is_null(&self) -> bool {
        self.memory.is_none()
    }

    pub fn declared_bit_depth(&self) -> Option<u16> {
        self.declared_bit_depth
    }

    /// Give up the handle and take the memory behind it.
    pub fn into_memory(self) -> Option<Box<dyn DibMemory>> {
        self.memory
    }
}

impl std::fmt::Debug for RawImageHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawImageHandle")
            .field("null", &self.is_null())
            .field("declared_bit_depth", &self.declared_bit_depth)
            .finish()
    }
}

/// Packed DIB held in a heap buffer. Used by replayed sessions and tests.
#[derive(Debug, Clone)]
pub struct InMemoryDib {
    data: Vec<u8>,
}

impl InMemoryDib {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }
}

impl DibMemory for InMemoryDib {
    fn bytes(&mut self) -> Result<&[u8]> {
        Ok(&self.data)
    }
}
