// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! In-memory byte source.

use std::sync::Arc;

use super::{requested_len, to_usize, ByteSource};
use crate::Result;

/// Byte source over a buffer already held in memory.
///
/// Cloning is cheap; clones share the same bytes.
#[derive(Debug, Clone)]
pub struct BlobSource {
    data: Arc<[u8]>,
}

impl BlobSource {
    /// Create a source over the given bytes.
    pub fn new(data: impl Into<Arc<[u8]>>) -> Self {
        Self { data: data.into() }
    }

    /// Borrow the underlying bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

impl From<Vec<u8>> for BlobSource {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

impl ByteSource for BlobSource {
    fn read(&mut self, offset: u64, length: Option<u64>) -> Result<Vec<u8>> {
        let size = self.data.len() as u64;
        let start = offset.min(size);
        let len = requested_len(size, offset, length).min(size - start);
        let start = to_usize(start)?;
        let end = start + to_usize(len)?;
        Ok(self.data[start..end].to_vec())
    }

    fn size(&mut self) -> Result<u64> {
        Ok(self.data.len() as u64)
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}
