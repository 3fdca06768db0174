// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Core types used throughout rosbag2-sqlite.
//!
//! This module provides the foundational types for the library:
//! - [`StorageError`] - Error handling with classified [`ErrorKind`]s
//! - [`Time`] - Exact `(sec, nsec)` timestamps

pub mod error;
pub mod time;

pub use error::{ErrorKind, Result, StorageError};
pub use time::Time;
