// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Handle-backed byte source.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use super::{requested_len, to_usize, ByteSource};
use crate::Result;

/// Byte source reading from a file through an explicit handle.
///
/// The handle is opened on first use and released by [`close`](ByteSource::close).
/// Every read seeks, then fills a scratch buffer that only ever grows to the
/// largest request seen so far.
#[derive(Debug)]
pub struct FileSource {
    path: PathBuf,
    handle: Option<File>,
    scratch: Vec<u8>,
}

impl FileSource {
    /// Create a source for the file at `path`. Nothing is opened yet.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            handle: None,
            scratch: Vec::new(),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the file handle is currently held.
    pub fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    /// Current scratch buffer capacity in bytes.
    pub fn scratch_len(&self) -> usize {
        self.scratch.len()
    }

    fn handle(&mut self) -> Result<&mut File> {
        let file = match self.handle.take() {
            Some(file) => file,
            None => {
                debug!(path = %self.path.display(), "Opening file source");
                File::open(&self.path)?
            }
        };
        Ok(self.handle.insert(file))
    }
}

impl ByteSource for FileSource {
    fn read(&mut self, offset: u64, length: Option<u64>) -> Result<Vec<u8>> {
        let size = self.size()?;
        let remaining = size.saturating_sub(offset);
        let requested = requested_len(size, offset, length);
        if requested > remaining {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!("read of {requested} bytes at offset {offset} exceeds file size {size}"),
            )
            .into());
        }
        let len = to_usize(requested)?;
        if len == 0 {
            return Ok(Vec::new());
        }

        if self.scratch.len() < len {
            trace!(from = self.scratch.len(), to = len, "Growing scratch buffer");
            self.scratch.resize(len, 0);
        }

        let mut scratch = std::mem::take(&mut self.scratch);
        let filled: Result<()> = self.handle().and_then(|file| {
            file.seek(SeekFrom::Start(offset))?;
            file.read_exact(&mut scratch[..len])?;
            Ok(())
        });
        let bytes = filled.map(|()| scratch[..len].to_vec());
        self.scratch = scratch;
        bytes
    }

    fn size(&mut self) -> Result<u64> {
        Ok(self.handle()?.metadata()?.len())
    }

    fn close(&mut self) -> Result<()> {
        if self.handle.take().is_some() {
            debug!(path = %self.path.display(), "Closed file source");
        }
        Ok(())
    }
}
