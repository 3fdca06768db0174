// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Forward-only cursor over the messages table.
//!
//! The cursor owns one prepared statement from the moment it is created.
//! The statement is finalized exactly once: either when stepping reports
//! the end of the rows (or a failure), or when the cursor is dropped while
//! still live.
//!
//! `rusqlite` ties a row iterator to a borrowed `Statement`, which cannot
//! be stored alongside it in one value, so this cursor drives the
//! statement through the C API directly.

use std::ffi::{CStr, CString};
use std::marker::PhantomData;
use std::os::raw::c_int;
use std::ptr::{self, NonNull};

use rusqlite::{ffi, Connection};
use tracing::trace;

use crate::io::filter::RenderedQuery;
use crate::io::metadata::MessageRow;
use crate::{Result, StorageError};

/// A live prepared statement bound to a borrowed connection.
pub(crate) struct Cursor<'conn> {
    db: *mut ffi::sqlite3,
    stmt: Option<NonNull<ffi::sqlite3_stmt>>,
    rows: u64,
    _conn: PhantomData<&'conn Connection>,
}

impl<'conn> Cursor<'conn> {
    /// Prepare `query` on `conn` and bind its parameters.
    pub fn prepare(conn: &'conn Connection, query: &RenderedQuery) -> Result<Self> {
        let sql = CString::new(query.sql.as_str()).map_err(rusqlite::Error::from)?;

        // SAFETY: the handle stays valid for 'conn, which outlives the cursor.
        let db = unsafe { conn.handle() };
        let mut raw = ptr::null_mut();
        // SAFETY: `sql` is NUL-terminated and `raw` is a valid out pointer.
        let rc = unsafe { ffi::sqlite3_prepare_v2(db, sql.as_ptr(), -1, &mut raw, ptr::null_mut()) };
        if rc != ffi::SQLITE_OK {
            return Err(engine_error(db, rc));
        }
        let stmt = NonNull::new(raw).ok_or(StorageError::Engine(rusqlite::Error::InvalidQuery))?;

        let cursor = Cursor {
            db,
            stmt: Some(stmt),
            rows: 0,
            _conn: PhantomData,
        };
        for (i, value) in query.params.iter().enumerate() {
            // SAFETY: `stmt` is live; parameter indexes are 1-based.
            let rc = unsafe { ffi::sqlite3_bind_int64(stmt.as_ptr(), (i + 1) as c_int, *value) };
            if rc != ffi::SQLITE_OK {
                return Err(engine_error(db, rc));
            }
        }
        Ok(cursor)
    }

    /// Advance to the next row.
    ///
    /// Returns `Ok(None)` once the rows are exhausted, releasing the
    /// statement on that same call.
    pub fn step(&mut self) -> Result<Option<MessageRow>> {
        let Some(stmt) = self.stmt else {
            return Ok(None);
        };

        // SAFETY: `stmt` is live until `release` takes it.
        match unsafe { ffi::sqlite3_step(stmt.as_ptr()) } {
            ffi::SQLITE_ROW => {
                self.rows += 1;
                // SAFETY: the statement is positioned on a row.
                unsafe { decode_row(stmt) }.map(Some)
            }
            ffi::SQLITE_DONE => {
                self.release();
                Ok(None)
            }
            rc => {
                let err = engine_error(self.db, rc);
                self.release();
                Err(err)
            }
        }
    }

    /// Whether the statement has been finalized.
    pub fn is_released(&self) -> bool {
        self.stmt.is_none()
    }

    fn release(&mut self) {
        if let Some(stmt) = self.stmt.take() {
            // SAFETY: `take` guarantees the statement is finalized only once.
            unsafe { ffi::sqlite3_finalize(stmt.as_ptr()) };
            trace!(rows = self.rows, "Released message cursor");
        }
    }
}

impl Drop for Cursor<'_> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Decode `(topic_id, timestamp, data)` from the current row.
///
/// # Safety
///
/// `stmt` must be live and positioned on a row with at least three columns.
unsafe fn decode_row(stmt: NonNull<ffi::sqlite3_stmt>) -> Result<MessageRow> {
    let stmt = stmt.as_ptr();
    let topic_id = ffi::sqlite3_column_int64(stmt, 0);
    let raw_timestamp = ffi::sqlite3_column_int64(stmt, 1);
    let timestamp =
        u64::try_from(raw_timestamp).map_err(|_| StorageError::InvalidTimestamp {
            value: raw_timestamp,
        })?;

    // The blob pointer must be fetched before its length.
    let blob = ffi::sqlite3_column_blob(stmt, 2) as *const u8;
    let len = ffi::sqlite3_column_bytes(stmt, 2);
    let data = if blob.is_null() || len <= 0 {
        Vec::new()
    } else {
        std::slice::from_raw_parts(blob, len as usize).to_vec()
    };

    Ok(MessageRow {
        topic_id,
        timestamp,
        data,
    })
}

fn engine_error(db: *mut ffi::sqlite3, rc: c_int) -> StorageError {
    // SAFETY: `db` is a live connection handle; the message is copied
    // before any further call on it.
    let message = unsafe { CStr::from_ptr(ffi::sqlite3_errmsg(db)) }
        .to_string_lossy()
        .into_owned();
    StorageError::from_engine(rusqlite::Error::SqliteFailure(
        ffi::Error::new(rc),
        Some(message),
    ))
}

/// Count the statements currently prepared on `conn`.
pub(crate) fn live_statements(conn: &Connection) -> usize {
    let mut count = 0;
    // SAFETY: walking the statement list of a live connection is read-only.
    unsafe {
        let db = conn.handle();
        let mut stmt = ffi::sqlite3_next_stmt(db, ptr::null_mut());
        while !stmt.is_null() {
            count += 1;
            stmt = ffi::sqlite3_next_stmt(db, stmt);
        }
    }
    count
}
