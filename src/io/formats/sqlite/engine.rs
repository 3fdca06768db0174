// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Process-wide SQLite engine handle.
//!
//! The engine is initialized once, on first use, and shared by every
//! storage accessor afterwards.

use std::ptr::NonNull;
use std::sync::OnceLock;

use rusqlite::serialize::OwnedData;
use rusqlite::{ffi, Connection, DatabaseName};
use tracing::{debug, info};

use crate::io::detection::{is_sqlite_container, WAL_FORMAT_VERSION};
use crate::{Result, StorageError};

/// Offsets of the write/read format version bytes in the SQLite header.
const HEADER_FORMAT_VERSION_OFFSETS: [usize; 2] = [18, 19];
const LEGACY_FORMAT_VERSION: u8 = 1;

/// The embedded SQLite library.
#[derive(Debug)]
pub struct Engine {
    version: &'static str,
    version_number: i32,
}

static ENGINE: OnceLock<Engine> = OnceLock::new();

fn init_engine() -> Engine {
    let engine = Engine {
        version: rusqlite::version(),
        version_number: rusqlite::version_number(),
    };
    info!(version = engine.version, "Initialized SQLite engine");
    engine
}

/// Get the shared engine, initializing it on first call.
pub fn engine() -> &'static Engine {
    ENGINE.get_or_init(init_engine)
}

impl Engine {
    /// SQLite library version string (e.g., "3.46.0").
    pub fn version(&self) -> &'static str {
        self.version
    }

    /// SQLite library version as a number (e.g., 3046000).
    pub fn version_number(&self) -> i32 {
        self.version_number
    }

    /// Open a read-only in-memory database over a copy of `bytes`.
    ///
    /// Containers recorded in WAL mode are switched to the rollback journal
    /// format in the copy, since a deserialized database has no WAL file.
    pub fn open_buffer(&self, bytes: &[u8]) -> Result<Connection> {
        let mut conn = Connection::open_in_memory()?;
        let len = bytes.len();

        // SAFETY: sqlite3_malloc64 returns either null or a block of `len` bytes.
        let raw = unsafe { ffi::sqlite3_malloc64(len as u64) } as *mut u8;
        let ptr = NonNull::new(raw).ok_or_else(|| {
            StorageError::Engine(rusqlite::Error::SqliteFailure(
                ffi::Error::new(ffi::SQLITE_NOMEM),
                Some(format!("could not allocate {len} bytes for the database image")),
            ))
        })?;

        // SAFETY: `ptr` is a fresh allocation of `len` bytes that cannot
        // overlap `bytes`.
        let image = unsafe {
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), ptr.as_ptr(), len);
            std::slice::from_raw_parts_mut(ptr.as_ptr(), len)
        };
        if is_sqlite_container(image)
            && HEADER_FORMAT_VERSION_OFFSETS
                .iter()
                .any(|&i| image.get(i) == Some(&WAL_FORMAT_VERSION))
        {
            debug!("Switching WAL container image to rollback journal mode");
            for i in HEADER_FORMAT_VERSION_OFFSETS {
                if let Some(byte) = image.get_mut(i) {
                    *byte = LEGACY_FORMAT_VERSION;
                }
            }
        }

        // SAFETY: the block was allocated by sqlite3_malloc64 and is fully
        // initialized; ownership passes to SQLite, which frees it on close.
        let data = unsafe { OwnedData::from_raw_nonnull(ptr, len) };
        conn.deserialize(DatabaseName::Main, data, true)
            .map_err(StorageError::from_engine)?;
        Ok(conn)
    }
}
