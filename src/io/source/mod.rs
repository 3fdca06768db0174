// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Byte sources backing a storage accessor.
//!
//! A [`ByteSource`] is anything that can hand out byte ranges of a single
//! container. The storage layer only ever talks to this trait, so the same
//! read logic works whether the container lives in memory or on disk.
//!
//! Two variants are provided:
//! - [`BlobSource`] - an in-memory buffer
//! - [`FileSource`] - a file handle opened lazily, read through a reusable
//!   scratch buffer
//!
//! # Example
//!
//! ```rust,no_run
//! use rosbag2_sqlite::io::source::{ByteSource, FileSource};
//!
//! let mut source = FileSource::new("talker.db3");
//! let header = source.read(0, Some(16))?;
//! println!("{} of {} bytes", header.len(), source.size()?);
//! source.close()?;
//! # Ok::<(), rosbag2_sqlite::StorageError>(())
//! ```

mod blob;
mod file;

pub use blob::BlobSource;
pub use file::FileSource;

use crate::Result;

/// Random-access view of a binary container.
///
/// Reads never modify the underlying bytes. Failures of the medium are
/// reported as [`StorageError::Io`](crate::StorageError::Io); a read is
/// never silently shortened.
pub trait ByteSource: Send {
    /// Read `length` bytes starting at `offset`.
    ///
    /// `None` reads everything from `offset` to the end.
    fn read(&mut self, offset: u64, length: Option<u64>) -> Result<Vec<u8>>;

    /// Read the whole source.
    fn read_all(&mut self) -> Result<Vec<u8>> {
        self.read(0, None)
    }

    /// Read the whole source decoded as UTF-8.
    ///
    /// Invalid sequences are replaced with U+FFFD.
    fn read_as_text(&mut self) -> Result<String> {
        let bytes = self.read_all()?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Total length in bytes.
    fn size(&mut self) -> Result<u64>;

    /// Release any held resources.
    ///
    /// Safe to call on a source that was never read and on one that is
    /// already closed.
    fn close(&mut self) -> Result<()>;
}

impl<S: ByteSource + ?Sized> ByteSource for Box<S> {
    fn read(&mut self, offset: u64, length: Option<u64>) -> Result<Vec<u8>> {
        (**self).read(offset, length)
    }

    fn read_all(&mut self) -> Result<Vec<u8>> {
        (**self).read_all()
    }

    fn read_as_text(&mut self) -> Result<String> {
        (**self).read_as_text()
    }

    fn size(&mut self) -> Result<u64> {
        (**self).size()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

/// Resolve an `(offset, length)` request against a source of `size` bytes.
///
/// Returns the number of bytes to read, with `None` meaning "to the end".
fn requested_len(size: u64, offset: u64, length: Option<u64>) -> u64 {
    length.unwrap_or_else(|| size.saturating_sub(offset))
}

fn to_usize(len: u64) -> Result<usize> {
    usize::try_from(len).map_err(|_| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("read length {len} does not fit in memory"),
        )
        .into()
    })
}
